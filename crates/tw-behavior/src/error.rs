//! Behavior-layer error type.

use thiserror::Error;

use tw_core::Tick;

/// Errors produced by `tw-behavior`.  None of them escape a tick: the
/// planner falls back to default behaviour and logs.
#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("world analysis from {computed_at:?} is stale at {now}")]
    StaleAnalysis { computed_at: Option<Tick>, now: Tick },
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
