//! Social-field formation, decay and dissolution.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use tw_core::{AgentId, SimTime, SocialConfig, Vec2};
use tw_world::{Activity, Agent, EncounterEnd, GoalIntent, IntentKind, SocialField, WorldSnapshot};

/// Tunables and entry points of the social engine.
#[derive(Clone, Debug)]
pub struct SocialEngine {
    pub(crate) cfg: SocialConfig,
}

impl SocialEngine {
    pub fn new(cfg: &SocialConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    #[inline]
    pub fn config(&self) -> &SocialConfig {
        &self.cfg
    }

    /// Free to start a conversation: wandering, standing still, holding no
    /// hotspot slot, and past the post-conversation cooldown.
    pub fn can_join(&self, agent: &Agent, now: SimTime) -> bool {
        let rested = agent.social.last_social == SimTime::ZERO
            || now.since(agent.social.last_social) >= self.cfg.social_cooldown_ms;
        agent.social.field.is_none()
            && agent.activity == Activity::Idle
            && agent.intent.kind() == IntentKind::Wandering
            && matches!(agent.goal, GoalIntent::Idle | GoalIntent::WanderNearHome)
            && agent.reserved_hotspot.is_none()
            && agent.visiting.is_none()
            && rested
    }

    /// Cluster eligible agents by single linkage within the formation radius
    /// and turn every cluster of two or more into a field.  Returns the number
    /// of fields formed.
    pub fn form_fields(&self, world: &mut WorldSnapshot, now: SimTime) -> usize {
        let mut cand_of: Vec<Option<usize>> = vec![None; world.agents.len()];
        let mut slots = Vec::new();
        for (slot, a) in world.agents.iter().enumerate() {
            if self.can_join(a, now) {
                cand_of[slot] = Some(slots.len());
                slots.push(slot);
            }
        }
        if slots.len() < 2 {
            return 0;
        }

        let mut parent: Vec<usize> = (0..slots.len()).collect();
        for (ci, &slot) in slots.iter().enumerate() {
            let pos = world.agents[slot].pos;
            for other in world.agents_near(pos, self.cfg.formation_radius) {
                if let Some(Some(cj)) = cand_of.get(other) {
                    union(&mut parent, ci, *cj);
                }
            }
        }

        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for ci in 0..slots.len() {
            let root = find(&mut parent, ci);
            groups.entry(root).or_default().push(slots[ci]);
        }

        let mut formed = 0;
        for members in groups.into_values().filter(|g| g.len() >= 2) {
            let sum = members.iter().fold(Vec2::ZERO, |acc, &s| acc + world.agents[s].pos);
            let center = sum * (1.0 / members.len() as f32);
            let ids: Vec<AgentId> = members.iter().map(|&s| world.agents[s].id).collect();

            let id = world.next_field_id();
            let field =
                SocialField::new(id, center, ids, self.cfg.field_base_radius, self.cfg.field_radius_k);
            let ends = now.after_ms(field.remaining_ms(self.cfg.energy_decay_per_sec));

            for &slot in &members {
                let mut a = world.agents[slot].clone();
                let partner = nearest_other(&field.participants, a.id, a.pos, world);
                join(&mut a, &field, partner, now, ends);
                world.patch_agent(slot, a);
            }
            debug!(field = %field.id, members = field.participants.len(), "social field formed");
            Arc::make_mut(&mut world.fields).push(field);
            formed += 1;
        }
        formed
    }

    /// Decay every field by `dt_ms`, drop members who were pulled away, and
    /// dissolve fields that ran out of energy or people.  Each dissolved
    /// field queues an [`EncounterEnd`].  Returns the number dissolved.
    pub fn update_fields(&self, world: &mut WorldSnapshot, dt_ms: u64, now: SimTime) -> usize {
        if world.fields.is_empty() {
            return 0;
        }
        let (base, k) = (self.cfg.field_base_radius, self.cfg.field_radius_k);
        let mut fields: Vec<SocialField> = world.fields.as_ref().clone();
        let mut strays = Vec::new();

        for f in fields.iter_mut() {
            f.decay(dt_ms, self.cfg.energy_decay_per_sec);
            let gone: Vec<AgentId> = f
                .participants
                .iter()
                .copied()
                .filter(|&id| {
                    world
                        .agent(id)
                        .is_none_or(|a| a.social.field != Some(f.id) || a.activity != Activity::Socializing)
                })
                .collect();
            for id in gone {
                f.remove(id, base, k);
                strays.push((id, f.id));
            }
        }

        let mut ended = Vec::new();
        fields.retain(|f| {
            if f.is_dissolved() {
                ended.push(EncounterEnd { field: f.id, participants: f.participants.clone() });
                false
            } else {
                true
            }
        });

        for (id, field) in strays {
            if let Some(a) = world.agent_mut(id) {
                if a.social.field == Some(field) {
                    leave(a, now);
                }
                a.social.encounter_valence = 0;
            }
        }
        for e in &ended {
            for &id in &e.participants {
                if let Some(a) = world.agent_mut(id) {
                    leave(a, now);
                }
            }
            debug!(field = %e.field, members = e.participants.len(), "social field dissolved");
        }

        let dissolved = ended.len();
        world.fields = Arc::new(fields);
        if dissolved > 0 {
            Arc::make_mut(&mut world.encounters).extend(ended);
        }
        dissolved
    }
}

fn join(agent: &mut Agent, field: &SocialField, partner: Option<AgentId>, now: SimTime, ends: SimTime) {
    agent.goal = GoalIntent::Idle;
    agent.goal_target = None;
    agent.goal_expires = None;
    agent.nav.clear();
    agent.vel = Vec2::ZERO;
    agent.activity = Activity::Socializing;
    agent.social.field = Some(field.id);
    agent.social.partner = partner;
    agent.social.started = now;
    agent.social.ends = ends;
    agent.social.encounter_valence = 0;
}

fn leave(agent: &mut Agent, now: SimTime) {
    agent.social.field = None;
    agent.social.partner = None;
    agent.social.last_social = now;
    if agent.activity == Activity::Socializing {
        agent.activity = Activity::Idle;
    }
}

fn nearest_other(ids: &[AgentId], me: AgentId, pos: Vec2, world: &WorldSnapshot) -> Option<AgentId> {
    ids.iter()
        .filter(|&&id| id != me)
        .filter_map(|&id| world.agent(id).map(|a| (a.pos.distance_sq(pos), id)))
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|(_, id)| id)
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        // Lower root wins so grouping is independent of visit order.
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}
