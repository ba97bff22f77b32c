//! Point-of-Interest Index: structures cross-referenced by resource role.
//!
//! The index is valid only while its stored [`PoiKey`] equals the snapshot's
//! current `(structure_revision, inventory_revision)` pair.  Callers compare
//! explicitly and rebuild on mismatch; nothing is recomputed lazily.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tw_core::StructureId;

use crate::catalog::{ResourceKind, StructureCatalog};
use crate::structure::Structure;

/// Revision pair an index was built against.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PoiKey {
    pub structure_revision: u64,
    pub inventory_revision: u64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PoiIndex {
    key: Option<PoiKey>,
    /// Complete structures holding positive stock of something they produce.
    sources: BTreeMap<ResourceKind, Vec<StructureId>>,
    /// Complete structures with spare capacity for something they consume.
    sinks: BTreeMap<ResourceKind, Vec<StructureId>>,
    /// Unstarted construction sites still short of a resource.
    construction_needs: BTreeMap<ResourceKind, Vec<StructureId>>,
    /// Incomplete sites whose full build cost is present or already consumed.
    ready_sites: Vec<StructureId>,
}

impl PoiIndex {
    /// An index that matches no key.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(structures: &[Structure], catalog: &StructureCatalog, key: PoiKey) -> Self {
        let mut idx = PoiIndex { key: Some(key), ..Self::default() };

        for s in structures {
            let Some(spec) = catalog.get(s.kind) else { continue };

            if s.complete {
                for &r in spec.produces.keys() {
                    if s.stock(r) > 0 {
                        idx.sources.entry(r).or_default().push(s.id);
                    }
                }
                for &r in spec.consumes.keys() {
                    if s.spare_capacity(spec, r) > 0 {
                        idx.sinks.entry(r).or_default().push(s.id);
                    }
                }
                continue;
            }

            if s.cost_met(spec) {
                idx.ready_sites.push(s.id);
            } else {
                for &r in spec.build_cost.keys() {
                    if s.remaining_need(spec, r) > 0 {
                        idx.construction_needs.entry(r).or_default().push(s.id);
                    }
                }
            }
        }
        idx
    }

    #[inline]
    pub fn key(&self) -> Option<PoiKey> {
        self.key
    }

    #[inline]
    pub fn is_valid_for(&self, key: PoiKey) -> bool {
        self.key == Some(key)
    }

    pub fn sources(&self, r: ResourceKind) -> &[StructureId] {
        self.sources.get(&r).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sinks(&self, r: ResourceKind) -> &[StructureId] {
        self.sinks.get(&r).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn construction_needs(&self, r: ResourceKind) -> &[StructureId] {
        self.construction_needs.get(&r).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resources any construction site is still waiting for, in kind order.
    pub fn needed_resources(&self) -> impl Iterator<Item = ResourceKind> + '_ {
        self.construction_needs.iter().filter(|(_, v)| !v.is_empty()).map(|(&r, _)| r)
    }

    pub fn ready_sites(&self) -> &[StructureId] {
        &self.ready_sites
    }
}
