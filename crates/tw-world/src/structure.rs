//! Placed structures and their dynamic state.

use serde::{Deserialize, Serialize};

use tw_core::{AgentId, StructureId, TilePos, TileRect, Vec2};

use crate::catalog::{Inventory, ResourceKind, StructureKind, StructureSpec};

/// A placed structure.
///
/// Invariants (maintained by every mutation site):
/// - `workers.len() <= spec.capacity`
/// - `inventory[r] <= spec.inventory_capacity[r]` for every `r`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    pub id: StructureId,
    pub kind: StructureKind,
    /// Bottom-left corner of the footprint, world units.
    pub anchor: Vec2,
    pub inventory: Inventory,
    /// Milliseconds of worker-time accumulated towards the next batch.
    pub production_acc_ms: u64,
    /// Build progress in percent `[0, 100]`.
    pub build_progress: f32,
    pub build_started: bool,
    pub complete: bool,
    pub residents: Vec<AgentId>,
    pub workers: Vec<AgentId>,
    /// Visitors currently inside (hotspots only).
    pub occupants: u32,
    /// Visitors on their way who hold a slot.
    pub reserved: u32,
}

impl Structure {
    /// A freshly placed structure.  Kinds with no build cost start complete.
    pub fn new(id: StructureId, spec: &StructureSpec, anchor: Vec2) -> Self {
        let complete = spec.build_cost.is_empty();
        Self {
            id,
            kind: spec.kind,
            anchor,
            inventory: Inventory::new(),
            production_acc_ms: 0,
            build_progress: if complete { 100.0 } else { 0.0 },
            build_started: complete,
            complete,
            residents: Vec::new(),
            workers: Vec::new(),
            occupants: 0,
            reserved: 0,
        }
    }

    /// Tiles that block movement: the footprint width times the baseline
    /// depth, measured up from the anchor.
    pub fn blocked_rect(&self, spec: &StructureSpec, tile_size: f32) -> TileRect {
        let x0 = (self.anchor.x / tile_size).floor() as i32;
        let y0 = (self.anchor.y / tile_size).floor() as i32;
        let x1 = ((self.anchor.x + spec.footprint.x) / tile_size).ceil() as i32;
        let y1 = ((self.anchor.y + spec.baseline) / tile_size).ceil() as i32;
        TileRect::new(x0, y0, x1.max(x0 + 1), y1.max(y0 + 1))
    }

    /// Blocked footprint grown by `margin` tiles: the "close enough to
    /// interact" test area.
    pub fn influence_rect(&self, spec: &StructureSpec, tile_size: f32, margin: i32) -> TileRect {
        self.blocked_rect(spec, tile_size).expand(margin)
    }

    /// `true` if a world point lies inside the influence area.
    pub fn in_influence(&self, spec: &StructureSpec, tile_size: f32, margin: i32, pos: Vec2) -> bool {
        self.influence_rect(spec, tile_size, margin).contains(pos.to_tile(tile_size))
    }

    /// World-space centre of the blocked footprint.
    pub fn center(&self, spec: &StructureSpec) -> Vec2 {
        Vec2::new(self.anchor.x + spec.footprint.x * 0.5, self.anchor.y + spec.baseline * 0.5)
    }

    /// Tile just below the middle of the footprint: where residents spawn.
    pub fn door_tile(&self, spec: &StructureSpec, tile_size: f32) -> TilePos {
        let r = self.blocked_rect(spec, tile_size);
        TilePos::new((r.x0 + r.x1 - 1) / 2, r.y0 - 1)
    }

    #[inline]
    pub fn stock(&self, resource: ResourceKind) -> u32 {
        self.inventory.get(&resource).copied().unwrap_or(0)
    }

    /// How much more of `resource` this structure will accept.
    ///
    /// Incomplete sites accept what their build cost still lacks; complete
    /// structures accept up to their inventory cap.
    pub fn spare_capacity(&self, spec: &StructureSpec, resource: ResourceKind) -> u32 {
        if !self.complete {
            return self.remaining_need(spec, resource);
        }
        spec.cap_for(resource).saturating_sub(self.stock(resource))
    }

    /// Build-cost shortfall for `resource`; zero once construction started.
    pub fn remaining_need(&self, spec: &StructureSpec, resource: ResourceKind) -> u32 {
        if self.complete || self.build_started {
            return 0;
        }
        spec.build_cost
            .get(&resource)
            .copied()
            .unwrap_or(0)
            .saturating_sub(self.stock(resource))
    }

    /// All build-cost resources present in inventory (or already consumed).
    pub fn cost_met(&self, spec: &StructureSpec) -> bool {
        self.build_started
            || spec.build_cost.iter().all(|(&r, &need)| self.stock(r) >= need)
    }

    /// Add `amount`, clamped at the cap.  Returns the quantity accepted.
    pub fn deposit(&mut self, spec: &StructureSpec, resource: ResourceKind, amount: u32) -> u32 {
        let accepted = amount.min(self.spare_capacity(spec, resource));
        if accepted > 0 {
            *self.inventory.entry(resource).or_insert(0) += accepted;
        }
        accepted
    }

    /// Remove up to `amount`.  Returns the quantity removed.
    pub fn withdraw(&mut self, resource: ResourceKind, amount: u32) -> u32 {
        let Some(stock) = self.inventory.get_mut(&resource) else {
            return 0;
        };
        let taken = amount.min(*stock);
        *stock -= taken;
        if *stock == 0 {
            self.inventory.remove(&resource);
        }
        taken
    }

    /// Free visitor slots for a hotspot: capacity minus occupants and
    /// reservations.  Zero for non-hotspots.
    pub fn hotspot_free(&self, spec: &StructureSpec) -> u32 {
        spec.hotspot_capacity
            .map(|cap| cap.saturating_sub(self.occupants + self.reserved))
            .unwrap_or(0)
    }

    /// Open worker slots (zero for incomplete structures).
    pub fn open_worker_slots(&self, spec: &StructureSpec) -> u32 {
        if !self.complete || !spec.is_workplace() {
            return 0;
        }
        spec.capacity.saturating_sub(self.workers.len() as u32)
    }
}
