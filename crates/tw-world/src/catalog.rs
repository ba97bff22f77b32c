//! Static per-kind structure specifications.
//!
//! The catalog is an immutable external data table: the economy and planner
//! read it, nothing in the simulation writes it.  [`StructureCatalog::default`]
//! carries the built-in table; [`StructureCatalog::from_toml_str`] loads a
//! replacement:
//!
//! ```toml
//! [[structures]]
//! kind = "Farm"
//! capacity = 3
//! footprint = { x = 48.0, y = 48.0 }
//! baseline = 32.0
//! production_interval_ms = 8000
//! max_effective_workers = 3
//! build_cost = { Wood = 8 }
//! produces = { Grain = 2 }
//! inventory_capacity = { Grain = 20 }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tw_core::Vec2;

use crate::{WorldError, WorldResult};

/// Tradeable goods.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Wood,
    Stone,
    Grain,
    Bread,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] =
        [ResourceKind::Wood, ResourceKind::Stone, ResourceKind::Grain, ResourceKind::Bread];
}

/// Resource quantities keyed by kind.  `BTreeMap` keeps iteration order
/// stable across runs.
pub type Inventory = BTreeMap<ResourceKind, u32>;

/// Every placeable structure type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureKind {
    House,
    Farm,
    Woodcutter,
    Quarry,
    Bakery,
    Depot,
    Tavern,
    Plaza,
    Store,
}

impl StructureKind {
    #[inline]
    pub fn is_residence(self) -> bool {
        matches!(self, StructureKind::House)
    }

    /// Depot workers haul and build instead of working in place.
    #[inline]
    pub fn is_logistics(self) -> bool {
        matches!(self, StructureKind::Depot)
    }
}

/// Type-derived, immutable data for one structure kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureSpec {
    pub kind: StructureKind,
    /// Residents for a House, worker slots otherwise.
    pub capacity: u32,
    /// World-space footprint `(width, height)`.
    pub footprint: Vec2,
    /// Height (from the anchor upwards) of the part of the footprint that
    /// blocks movement.  The rest is visual overhang.
    pub baseline: f32,
    #[serde(default)]
    pub build_cost: Inventory,
    #[serde(default)]
    pub produces: Inventory,
    #[serde(default)]
    pub consumes: Inventory,
    #[serde(default)]
    pub inventory_capacity: Inventory,
    #[serde(default)]
    pub production_interval_ms: u64,
    #[serde(default)]
    pub max_effective_workers: u32,
    /// Visitor cap for hotspots (tavern, plaza, store).
    #[serde(default)]
    pub hotspot_capacity: Option<u32>,
}

impl StructureSpec {
    /// Outputs only: accumulates production over time.
    #[inline]
    pub fn is_producer(&self) -> bool {
        !self.produces.is_empty() && self.consumes.is_empty()
    }

    /// Inputs and outputs: transforms one batch per tick while worked.
    #[inline]
    pub fn is_transformer(&self) -> bool {
        !self.produces.is_empty() && !self.consumes.is_empty()
    }

    /// Accepts workers (anything but a residence with nonzero capacity).
    #[inline]
    pub fn is_workplace(&self) -> bool {
        !self.kind.is_residence() && self.capacity > 0
    }

    #[inline]
    pub fn is_hotspot(&self) -> bool {
        self.hotspot_capacity.is_some()
    }

    /// Inventory cap for `resource` (0 when the kind cannot hold it).
    #[inline]
    pub fn cap_for(&self, resource: ResourceKind) -> u32 {
        self.inventory_capacity.get(&resource).copied().unwrap_or(0)
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    structures: Vec<StructureSpec>,
}

/// Lookup table from [`StructureKind`] to [`StructureSpec`].
#[derive(Clone, Debug, PartialEq)]
pub struct StructureCatalog {
    specs: BTreeMap<StructureKind, StructureSpec>,
}

impl StructureCatalog {
    pub fn from_specs(specs: impl IntoIterator<Item = StructureSpec>) -> Self {
        Self { specs: specs.into_iter().map(|s| (s.kind, s)).collect() }
    }

    /// Parse a catalog from TOML.  Kinds missing from the file are absent
    /// from the catalog (placement of them fails with `UnknownKind`).
    pub fn from_toml_str(text: &str) -> WorldResult<Self> {
        let file: CatalogFile =
            toml::from_str(text).map_err(|e| WorldError::Catalog(e.to_string()))?;
        for spec in &file.structures {
            if spec.is_producer() && spec.production_interval_ms == 0 {
                return Err(WorldError::Catalog(format!(
                    "{:?} produces goods but has no production interval",
                    spec.kind
                )));
            }
            if spec.footprint.x <= 0.0 || spec.footprint.y <= 0.0 || spec.baseline <= 0.0 {
                return Err(WorldError::Catalog(format!("{:?} has an empty footprint", spec.kind)));
            }
        }
        Ok(Self::from_specs(file.structures))
    }

    pub fn get(&self, kind: StructureKind) -> Option<&StructureSpec> {
        self.specs.get(&kind)
    }

    pub fn spec(&self, kind: StructureKind) -> WorldResult<&StructureSpec> {
        self.get(kind).ok_or(WorldError::UnknownKind(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StructureSpec> {
        self.specs.values()
    }
}

fn inv(items: &[(ResourceKind, u32)]) -> Inventory {
    items.iter().copied().collect()
}

impl Default for StructureCatalog {
    fn default() -> Self {
        use ResourceKind::*;

        let base = |kind, capacity, w: f32, h: f32, baseline: f32| StructureSpec {
            kind,
            capacity,
            footprint: Vec2::new(w, h),
            baseline,
            build_cost: Inventory::new(),
            produces: Inventory::new(),
            consumes: Inventory::new(),
            inventory_capacity: Inventory::new(),
            production_interval_ms: 0,
            max_effective_workers: 0,
            hotspot_capacity: None,
        };

        let specs = vec![
            StructureSpec {
                build_cost: inv(&[(Wood, 10)]),
                ..base(StructureKind::House, 4, 32.0, 48.0, 32.0)
            },
            StructureSpec {
                build_cost: inv(&[(Wood, 8)]),
                produces: inv(&[(Grain, 2)]),
                inventory_capacity: inv(&[(Grain, 20)]),
                production_interval_ms: 8_000,
                max_effective_workers: 3,
                ..base(StructureKind::Farm, 3, 48.0, 48.0, 48.0)
            },
            StructureSpec {
                produces: inv(&[(Wood, 2)]),
                inventory_capacity: inv(&[(Wood, 20)]),
                production_interval_ms: 6_000,
                max_effective_workers: 2,
                ..base(StructureKind::Woodcutter, 2, 32.0, 32.0, 32.0)
            },
            StructureSpec {
                build_cost: inv(&[(Wood, 5)]),
                produces: inv(&[(Stone, 2)]),
                inventory_capacity: inv(&[(Stone, 20)]),
                production_interval_ms: 8_000,
                max_effective_workers: 2,
                ..base(StructureKind::Quarry, 2, 32.0, 32.0, 32.0)
            },
            StructureSpec {
                build_cost: inv(&[(Wood, 10), (Stone, 5)]),
                produces: inv(&[(Bread, 1)]),
                consumes: inv(&[(Grain, 2)]),
                inventory_capacity: inv(&[(Grain, 10), (Bread, 10)]),
                max_effective_workers: 2,
                ..base(StructureKind::Bakery, 2, 32.0, 48.0, 32.0)
            },
            base(StructureKind::Depot, 3, 32.0, 32.0, 32.0),
            StructureSpec {
                build_cost: inv(&[(Wood, 15), (Stone, 5)]),
                consumes: inv(&[(Bread, 1)]),
                inventory_capacity: inv(&[(Bread, 10)]),
                hotspot_capacity: Some(6),
                ..base(StructureKind::Tavern, 2, 48.0, 48.0, 32.0)
            },
            StructureSpec {
                build_cost: inv(&[(Stone, 10)]),
                hotspot_capacity: Some(10),
                ..base(StructureKind::Plaza, 0, 48.0, 48.0, 16.0)
            },
            StructureSpec {
                build_cost: inv(&[(Wood, 10)]),
                consumes: inv(&[(Bread, 1)]),
                inventory_capacity: inv(&[(Bread, 15)]),
                hotspot_capacity: Some(4),
                ..base(StructureKind::Store, 1, 32.0, 32.0, 32.0)
            },
        ];
        Self::from_specs(specs)
    }
}
