//! Seeded random streams.
//!
//! Two kinds exist:
//!
//! - [`SimRng`]: one per simulation, seeded from `SimConfig::seed`, drawn in
//!   phase order (gossip rolls, emission gates, nav sampling).
//! - [`AgentRng`]: derived from `(world seed, short id, salt)` whenever an
//!   agent needs randomness.  The planner salts with the tick number, so an
//!   agent's draws never depend on how many other agents drew before it.
//!
//! Short ids are spread over the seed space by the golden-ratio constant;
//! houses placed later add new streams without shifting existing ones.

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::AgentId;

const GOLDEN: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-agent stream.  Cheap to build; create it where it is needed and drop
/// it at the end of the agent's update.
pub struct AgentRng(SmallRng);

/// Tick-wide stream owned by the runner.
pub struct SimRng(SmallRng);

impl AgentRng {
    pub fn new(world_seed: u64, agent: AgentId) -> Self {
        let seed = world_seed ^ (agent.0 as u64).wrapping_mul(GOLDEN);
        AgentRng(SmallRng::seed_from_u64(seed))
    }

    /// A separate stream for the same agent, e.g. one per tick or per
    /// purpose (`tick ^ MOVE_SALT`).
    pub fn salted(world_seed: u64, agent: AgentId, salt: u64) -> Self {
        Self::new(world_seed ^ salt.wrapping_mul(GOLDEN).rotate_left(17), agent)
    }
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }
}

macro_rules! draws {
    ($ty:ty) => {
        impl $ty {
            #[inline]
            pub fn random<T>(&mut self) -> T
            where
                rand::distributions::Standard: rand::distributions::Distribution<T>,
            {
                self.0.r#gen()
            }

            #[inline]
            pub fn gen_range<T, R>(&mut self, range: R) -> T
            where
                T: rand::distributions::uniform::SampleUniform,
                R: rand::distributions::uniform::SampleRange<T>,
            {
                self.0.gen_range(range)
            }

            /// `p` outside `[0, 1]` is clamped rather than rejected.
            #[inline]
            pub fn gen_bool(&mut self, p: f64) -> bool {
                self.0.gen_bool(p.clamp(0.0, 1.0))
            }

            #[inline]
            pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
                items.choose(&mut self.0)
            }

            /// Index drawn proportionally to `weights`; `None` when they sum
            /// to zero.
            pub fn weighted_index(&mut self, weights: &[u32]) -> Option<usize> {
                let total: u32 = weights.iter().sum();
                if total == 0 {
                    return None;
                }
                let mut roll = self.0.gen_range(0..total);
                weights.iter().position(|&w| {
                    if roll < w {
                        return true;
                    }
                    roll -= w;
                    false
                })
            }
        }
    };
}

draws!(AgentRng);
draws!(SimRng);
