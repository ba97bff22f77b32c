//! Turn-taking conversational emission and bump greetings.
//!
//! A field has at most one speaker at a time: while any participant still
//! shows an emoji, nobody else in that field may emit.

use tracing::trace;

use tw_core::{AgentId, SimRng, SimTime};
use tw_world::{Activity, Agent, Emoji, WorldSnapshot};

use crate::SocialEngine;

/// Mood at or above which the cheerful pool is used.
pub const HAPPY_MOOD: f32 = 65.0;
/// Mood below which the grumpy pool is used.
pub const GLOOMY_MOOD: f32 = 35.0;

/// Weighted emoji pool for this agent's mood and personality.
pub fn emoji_pool(agent: &Agent) -> Vec<(Emoji, f32)> {
    let p = &agent.personality;
    let mood = agent.needs.mood();
    if mood >= HAPPY_MOOD {
        vec![
            (Emoji::Smile, 1.0 + p.agreeableness),
            (Emoji::Laugh, 0.5 + p.extraversion),
            (Emoji::Heart, p.agreeableness),
            (Emoji::Music, p.openness),
        ]
    } else if mood >= GLOOMY_MOOD {
        vec![
            (Emoji::Smile, 0.5 + p.agreeableness),
            (Emoji::Thinking, 0.5 + p.openness),
            (Emoji::Wave, p.extraversion),
            (Emoji::Yawn, 0.5 * p.neuroticism),
        ]
    } else {
        vec![
            (Emoji::Yawn, 1.0),
            (Emoji::Grumble, 0.5 + p.neuroticism),
            (Emoji::Angry, p.neuroticism),
            (Emoji::Thinking, 0.25),
        ]
    }
}

fn pick_emoji(agent: &Agent, rng: &mut SimRng) -> Emoji {
    let pool = emoji_pool(agent);
    let weights: Vec<u32> = pool.iter().map(|&(_, w)| (w.max(0.0) * 100.0).round() as u32 + 1).collect();
    rng.weighted_index(&weights).map(|i| pool[i].0).unwrap_or(Emoji::Smile)
}

impl SocialEngine {
    /// Probability that `agent` speaks this AI tick in a field of `energy`.
    pub fn emission_probability(&self, agent: &Agent, energy: f32) -> f64 {
        let e = (energy / tw_world::FIELD_ENERGY).clamp(0.0, 1.0);
        (self.cfg.emission_chance * (agent.personality.expressiveness() * e) as f64).clamp(0.0, 1.0)
    }

    /// At most one emission per field.  Every participant (speaker included)
    /// adds the emoji's valence to its encounter tally.  Returns the number
    /// of emissions.
    pub fn emit(&self, world: &mut WorldSnapshot, now: SimTime, rng: &mut SimRng) -> usize {
        let mut emitted = 0;
        for fi in 0..world.fields.len() {
            let (participants, energy) = {
                let f = &world.fields[fi];
                (f.participants.clone(), f.energy)
            };
            let busy = participants
                .iter()
                .any(|&id| world.agent(id).is_some_and(|a| a.social.has_active_emoji(now)));
            if busy {
                continue;
            }

            let mut willing: Vec<AgentId> = Vec::new();
            for &id in &participants {
                let Some(a) = world.agent(id) else { continue };
                if rng.gen_bool(self.emission_probability(a, energy)) {
                    willing.push(id);
                }
            }
            let Some(&speaker) = rng.choose(&willing) else { continue };
            let Some(emoji) = world.agent(speaker).map(|a| pick_emoji(a, rng)) else { continue };

            if let Some(a) = world.agent_mut(speaker) {
                a.social.emoji = Some(emoji);
                a.social.emoji_until = now.after_ms(self.cfg.emoji_duration_ms);
            }
            for &id in &participants {
                if let Some(a) = world.agent_mut(id) {
                    a.social.encounter_valence += emoji.valence();
                }
            }
            trace!(agent = %speaker, ?emoji, "emitted");
            emitted += 1;
        }
        emitted
    }

    /// Two agents passing each other within the bump radius wave, provided
    /// both are past their bump cooldown.  Returns the number of pairs.
    pub fn bump_greetings(&self, world: &mut WorldSnapshot, now: SimTime) -> usize {
        let cooldown = self.cfg.bump_cooldown_ms;
        let ready = |a: &Agent| {
            a.social.field.is_none()
                && !matches!(a.activity, Activity::Sleeping | Activity::Socializing)
                && !a.social.has_active_emoji(now)
                && (a.social.last_bump == SimTime::ZERO || now.since(a.social.last_bump) >= cooldown)
        };

        let n = world.agents.len();
        let mut taken = vec![false; n];
        let mut pairs = Vec::new();
        for slot in 0..n {
            let a = &world.agents[slot];
            if taken[slot] || !ready(a) {
                continue;
            }
            for other in world.agents_near(a.pos, self.cfg.bump_radius) {
                if other == slot || taken.get(other).copied().unwrap_or(true) {
                    continue;
                }
                let b = &world.agents[other];
                let passing = a.activity == Activity::Traveling || b.activity == Activity::Traveling;
                if passing && ready(b) {
                    taken[slot] = true;
                    taken[other] = true;
                    pairs.push((slot, other));
                    break;
                }
            }
        }

        let until = now.after_ms(self.cfg.emoji_duration_ms);
        for &(a, b) in &pairs {
            for slot in [a, b] {
                let mut agent = world.agents[slot].clone();
                agent.social.emoji = Some(Emoji::Wave);
                agent.social.emoji_until = until;
                agent.social.last_bump = now;
                world.patch_agent(slot, agent);
            }
        }
        pairs.len()
    }
}
