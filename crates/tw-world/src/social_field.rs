//! Ephemeral social groupings.

use serde::{Deserialize, Serialize};

use tw_core::{AgentId, FieldId, Vec2};

/// Initial energy of a freshly formed field.
pub const FIELD_ENERGY: f32 = 100.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SocialField {
    pub id: FieldId,
    pub center: Vec2,
    pub radius: f32,
    pub energy: f32,
    /// Milliseconds since formation.  Energy is derived from it, so the
    /// lifetime does not depend on how the time was sliced into ticks.
    #[serde(default)]
    pub age_ms: u64,
    /// Sorted ascending.
    pub participants: Vec<AgentId>,
}

impl SocialField {
    pub fn new(id: FieldId, center: Vec2, mut participants: Vec<AgentId>, base: f32, k: f32) -> Self {
        participants.sort_unstable();
        participants.dedup();
        let radius = field_radius(participants.len(), base, k);
        Self { id, center, radius, energy: FIELD_ENERGY, age_ms: 0, participants }
    }

    /// Linear decay: `rate` energy per second of age.
    pub fn decay(&mut self, dt_ms: u64, rate: f32) {
        self.age_ms = self.age_ms.saturating_add(dt_ms);
        self.energy = FIELD_ENERGY - rate * (self.age_ms as f32 / 1000.0);
    }

    /// Milliseconds of life left at `rate`.
    pub fn remaining_ms(&self, rate: f32) -> u64 {
        if rate <= 0.0 {
            return u64::MAX;
        }
        let total = (FIELD_ENERGY / rate * 1000.0).ceil() as u64;
        total.saturating_sub(self.age_ms)
    }

    /// Drop `agent` and resize.
    pub fn remove(&mut self, agent: AgentId, base: f32, k: f32) {
        self.participants.retain(|&a| a != agent);
        self.radius = field_radius(self.participants.len(), base, k);
    }

    #[inline]
    pub fn contains(&self, agent: AgentId) -> bool {
        self.participants.binary_search(&agent).is_ok()
    }

    /// Out of energy or too small to be a conversation.
    #[inline]
    pub fn is_dissolved(&self) -> bool {
        self.energy <= 0.0 || self.participants.len() < 2
    }
}

/// `base + k · log2(n)`; `base` for fields of zero or one.
pub fn field_radius(n: usize, base: f32, k: f32) -> f32 {
    if n <= 1 {
        return base;
    }
    base + k * (n as f32).log2()
}

/// A field that dissolved this tick, queued for relationship resolution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EncounterEnd {
    pub field: FieldId,
    pub participants: Vec<AgentId>,
}
