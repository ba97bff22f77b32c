//! Third-party reputation spillover.
//!
//! Within a field, each listener has a small chance per AI tick of hearing
//! another member talk about someone outside the field.  The listener's
//! opinion of that third party shifts by
//!
//!   speaker_opinion × trust(listener → speaker) / 100 × spillover
//!
//! so gossip from a distrusted speaker pushes the other way.

use std::sync::Arc;

use tracing::trace;

use tw_core::{AgentId, SimRng};
use tw_world::WorldSnapshot;

use crate::SocialEngine;

/// One pending opinion change.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rumor {
    pub listener: AgentId,
    pub speaker: AgentId,
    pub about: AgentId,
    pub delta: f32,
}

impl SocialEngine {
    /// Collect rumors for this tick without applying them.
    pub fn collect_rumors(&self, world: &WorldSnapshot, rng: &mut SimRng) -> Vec<Rumor> {
        let fields = Arc::clone(&world.fields);
        let mut out = Vec::new();

        for field in fields.iter().filter(|f| f.participants.len() >= 2) {
            for &listener in &field.participants {
                if !rng.gen_bool(self.cfg.gossip_chance) {
                    continue;
                }
                let others: Vec<AgentId> =
                    field.participants.iter().copied().filter(|&id| id != listener).collect();
                let Some(&speaker) = rng.choose(&others) else { continue };
                let (Some(l), Some(s)) = (world.agent(listener), world.agent(speaker)) else {
                    continue;
                };

                let topics: Vec<(AgentId, f32)> = s
                    .social_memory
                    .iter()
                    .filter(|&(&id, &v)| v != 0.0 && id != listener && !field.contains(id))
                    .map(|(&id, &v)| (id, v))
                    .collect();
                let Some(&(about, opinion)) = rng.choose(&topics) else { continue };

                let trust = l.affinity(speaker);
                let delta = opinion * trust / 100.0 * self.cfg.spillover;
                if delta != 0.0 {
                    out.push(Rumor { listener, speaker, about, delta });
                }
            }
        }
        out
    }

    /// Run one gossip round.  Returns the number of opinions that moved.
    pub fn gossip(&self, world: &mut WorldSnapshot, rng: &mut SimRng) -> usize {
        let rumors = self.collect_rumors(world, rng);
        for r in &rumors {
            if let Some(a) = world.agent_mut(r.listener) {
                a.adjust_affinity(r.about, r.delta);
            }
            trace!(listener = %r.listener, speaker = %r.speaker, about = %r.about, delta = r.delta, "gossip");
        }
        rumors.len()
    }
}
