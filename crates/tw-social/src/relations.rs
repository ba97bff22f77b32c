//! Relationship resolution at the end of an encounter, and affinity decay.

use std::sync::Arc;

use tracing::debug;

use tw_core::AgentId;
use tw_world::{Activity, WorldSnapshot};

use crate::{SocialEngine, SocialError, SocialResult};

/// Scale `delta` down when it pushes `current` further from zero: at
/// `|current| = 100` only `1 - saturation` of it survives.  Deltas towards
/// zero pass unchanged.
pub fn saturated_delta(delta: f32, current: f32, saturation: f32) -> f32 {
    if delta * current > 0.0 {
        let s = saturation.clamp(0.0, 1.0) * (current.abs() / 100.0).min(1.0);
        delta * (1.0 - s)
    } else {
        delta
    }
}

/// The single entry point for relationship changes: updates the ledger and
/// both agents' memories.  Returns whether the ledger changed.
pub fn apply_relationship_delta(
    world: &mut WorldSnapshot,
    a: AgentId,
    b: AgentId,
    delta: f32,
) -> SocialResult<bool> {
    if a == b {
        return Err(SocialError::SelfPair(a));
    }
    for id in [a, b] {
        if world.agent(id).is_none() {
            return Err(SocialError::UnknownAgent(id));
        }
    }
    if delta == 0.0 || !delta.is_finite() {
        return Ok(false);
    }
    let changed = Arc::make_mut(&mut world.ledger).apply_delta(a, b, delta);
    if let Some(x) = world.agent_mut(a) {
        x.adjust_affinity(b, delta);
    }
    if let Some(y) = world.agent_mut(b) {
        y.adjust_affinity(a, delta);
    }
    Ok(changed)
}

impl SocialEngine {
    /// Drain the queued encounter ends.  For every pair in an encounter the
    /// summed emoji valence decides the sign of a fixed-size delta; a neutral
    /// encounter changes nothing.  Returns the number of ledger updates.
    pub fn resolve_encounters(&self, world: &mut WorldSnapshot) -> usize {
        if world.encounters.is_empty() {
            return 0;
        }
        let ended = std::mem::take(Arc::make_mut(&mut world.encounters));
        let mut updates = 0;

        for e in &ended {
            let tallies: Vec<(AgentId, i32)> = e
                .participants
                .iter()
                .filter_map(|&id| world.agent(id).map(|a| (id, a.social.encounter_valence)))
                .collect();

            for (i, &(a, va)) in tallies.iter().enumerate() {
                for &(b, vb) in &tallies[i + 1..] {
                    let valence = va + vb;
                    if valence == 0 {
                        continue;
                    }
                    let sign = if valence > 0 { 1.0 } else { -1.0 };
                    let current = world.ledger.score(a, b);
                    let delta = saturated_delta(sign * self.cfg.interaction_delta, current, self.cfg.saturation);
                    match apply_relationship_delta(world, a, b, delta) {
                        Ok(true) => updates += 1,
                        Ok(false) => {}
                        Err(err) => debug!(%err, "relationship update skipped"),
                    }
                }
            }
            for &(id, _) in &tallies {
                if let Some(a) = world.agent_mut(id) {
                    a.social.encounter_valence = 0;
                }
            }
        }
        updates
    }

    /// Let opinions fade towards zero while nobody involved is in a
    /// conversation.  Both sides fade at the same rate: each agent's memory,
    /// and the ledger score of every pair where neither agent is
    /// socializing.  Memory entries that reach zero are forgotten.  Returns
    /// `true` if anything changed.
    pub fn decay_affinity(&self, world: &mut WorldSnapshot, dt_ms: u64) -> bool {
        let step = self.cfg.affinity_decay_per_sec * dt_ms as f32 / 1000.0;
        if step <= 0.0 {
            return false;
        }
        let fading = |activity: Activity| activity != Activity::Socializing;
        let mut changed = false;

        if world.agents.iter().any(|a| fading(a.activity) && !a.social_memory.is_empty()) {
            for a in Arc::make_mut(&mut world.agents).iter_mut() {
                if !fading(a.activity) {
                    continue;
                }
                for v in a.social_memory.values_mut() {
                    *v = toward_zero(*v, step);
                }
                a.social_memory.retain(|_, v| *v != 0.0);
            }
            changed = true;
        }

        let quiet = |id: AgentId| world.agent(id).is_none_or(|a| fading(a.activity));
        let fades: Vec<(AgentId, AgentId, f32)> = world
            .ledger
            .iter()
            .filter(|&(lo, hi, score)| score != 0.0 && quiet(lo) && quiet(hi))
            .map(|(lo, hi, score)| (lo, hi, toward_zero(score, step) - score))
            .collect();
        if !fades.is_empty() {
            let ledger = Arc::make_mut(&mut world.ledger);
            for (lo, hi, delta) in fades {
                changed |= ledger.apply_delta(lo, hi, delta);
            }
        }
        changed
    }
}

fn toward_zero(v: f32, step: f32) -> f32 {
    if v > 0.0 { (v - step).max(0.0) } else { (v + step).min(0.0) }
}
