//! Derived per-tick indices over the agent and structure lists.
//!
//! Both are rebuilt from scratch (cheap at town scale) whenever the lists
//! they cover change shape, and never persisted.

use rustc_hash::FxHashMap;

use tw_core::{AgentId, StructureId, Vec2};

use crate::agent::Agent;
use crate::structure::Structure;

// ── AgentIndex ────────────────────────────────────────────────────────────────

/// Uniform-grid spatial hash plus a short-id → slot table.
#[derive(Clone, Debug, Default)]
pub struct AgentIndex {
    cell_size: f32,
    cells: FxHashMap<(i32, i32), Vec<u32>>,
    /// `slot_of[short_id]` is the agent's position in the agent list.
    slot_of: Vec<u32>,
}

impl AgentIndex {
    const NO_SLOT: u32 = u32::MAX;

    pub fn build(agents: &[Agent], cell_size: f32) -> Self {
        let cell_size = if cell_size > 0.0 { cell_size } else { 32.0 };
        let mut cells: FxHashMap<(i32, i32), Vec<u32>> = FxHashMap::default();
        let max_id = agents.iter().map(|a| a.id.index() + 1).max().unwrap_or(0);
        let mut slot_of = vec![Self::NO_SLOT; max_id];

        for (slot, a) in agents.iter().enumerate() {
            cells.entry(Self::cell_of(a.pos, cell_size)).or_default().push(slot as u32);
            if a.id.is_valid() {
                slot_of[a.id.index()] = slot as u32;
            }
        }
        Self { cell_size, cells, slot_of }
    }

    #[inline]
    fn cell_of(p: Vec2, cell_size: f32) -> (i32, i32) {
        ((p.x / cell_size).floor() as i32, (p.y / cell_size).floor() as i32)
    }

    /// Slot of the agent with short id `id`, if present.
    #[inline]
    pub fn slot(&self, id: AgentId) -> Option<usize> {
        match self.slot_of.get(id.index()) {
            Some(&s) if s != Self::NO_SLOT => Some(s as usize),
            _ => None,
        }
    }

    /// Slots of agents within `radius` of `center`, ascending.  Positions are
    /// read from `agents`, which must be the list the index was built from.
    pub fn query_radius(&self, agents: &[Agent], center: Vec2, radius: f32) -> Vec<usize> {
        let r2 = radius * radius;
        let (cx0, cy0) = Self::cell_of(Vec2::new(center.x - radius, center.y - radius), self.cell_size);
        let (cx1, cy1) = Self::cell_of(Vec2::new(center.x + radius, center.y + radius), self.cell_size);

        let mut out = Vec::new();
        for cy in cy0..=cy1 {
            for cx in cx0..=cx1 {
                let Some(bucket) = self.cells.get(&(cx, cy)) else { continue };
                for &slot in bucket {
                    let slot = slot as usize;
                    if agents.get(slot).is_some_and(|a| a.pos.distance_sq(center) <= r2) {
                        out.push(slot);
                    }
                }
            }
        }
        out.sort_unstable();
        out
    }
}

// ── StructureLookup ───────────────────────────────────────────────────────────

/// `StructureId` → slot in the structure list.
#[derive(Clone, Debug, Default)]
pub struct StructureLookup {
    slots: FxHashMap<StructureId, u32>,
}

impl StructureLookup {
    pub fn build(structures: &[Structure]) -> Self {
        Self {
            slots: structures.iter().enumerate().map(|(i, s)| (s.id, i as u32)).collect(),
        }
    }

    #[inline]
    pub fn slot(&self, id: StructureId) -> Option<usize> {
        self.slots.get(&id).map(|&s| s as usize)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
