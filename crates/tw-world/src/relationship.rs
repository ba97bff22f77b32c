//! Pairwise relationship ledger.
//!
//! Scores live under one 64-bit key per unordered pair, low id in the high
//! bits, so `(a, b)` and `(b, a)` always address the same entry.  The only
//! mutation path is [`RelationshipLedger::apply_delta`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tw_core::AgentId;

/// Relationship scores are clamped to `[-SCORE_MAX, SCORE_MAX]`.
pub const SCORE_MAX: f32 = 100.0;

/// Canonical key for an unordered pair.
#[inline]
pub fn pair_key(a: AgentId, b: AgentId) -> u64 {
    let (lo, hi) = if a.0 <= b.0 { (a.0, b.0) } else { (b.0, a.0) };
    ((lo as u64) << 32) | hi as u64
}

/// Inverse of [`pair_key`]: `(low, high)`.
#[inline]
pub fn unpack_pair(key: u64) -> (AgentId, AgentId) {
    (AgentId((key >> 32) as u32), AgentId(key as u32))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipLedger {
    scores: BTreeMap<u64, f32>,
    revision: u64,
}

impl RelationshipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score between `a` and `b`; zero for strangers.
    pub fn score(&self, a: AgentId, b: AgentId) -> f32 {
        self.scores.get(&pair_key(a, b)).copied().unwrap_or(0.0)
    }

    /// Shift the pair's score by `delta`, clamped.
    ///
    /// Returns `true` when the stored score changed.  A zero (or non-finite)
    /// delta, a self-pair, or a delta absorbed entirely by the clamp leaves
    /// the ledger and its revision untouched.
    pub fn apply_delta(&mut self, a: AgentId, b: AgentId, delta: f32) -> bool {
        if a == b || delta == 0.0 || !delta.is_finite() {
            return false;
        }
        let key = pair_key(a, b);
        let old = self.scores.get(&key).copied().unwrap_or(0.0);
        let new = (old + delta).clamp(-SCORE_MAX, SCORE_MAX);
        if new == old {
            return false;
        }
        self.scores.insert(key, new);
        self.revision += 1;
        true
    }

    /// Bumped on every effective mutation.
    #[inline]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Every `(low, high, score)` triple in key order.
    pub fn iter(&self) -> impl Iterator<Item = (AgentId, AgentId, f32)> + '_ {
        self.scores.iter().map(|(&k, &s)| {
            let (lo, hi) = unpack_pair(k);
            (lo, hi, s)
        })
    }

    /// Drop every entry mentioning `agent`.
    pub(crate) fn forget(&mut self, agent: AgentId) {
        let before = self.scores.len();
        self.scores.retain(|&k, _| {
            let (lo, hi) = unpack_pair(k);
            lo != agent && hi != agent
        });
        if self.scores.len() != before {
            self.revision += 1;
        }
    }
}
