//! Simulation observer trait for progress reporting and diagnostics.

use std::sync::Arc;

use tw_core::{Tick, TileRect};
use tw_world::WorldSnapshot;

use crate::{PhaseTag, TickStats};

/// Callbacks invoked by [`Sim::tick`][crate::Sim::tick] at key points.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: fields counter
///
/// ```rust,ignore
/// struct FieldCounter { peak: usize }
///
/// impl SimObserver for FieldCounter {
///     fn on_publish(&mut self, _tick: Tick, world: &Arc<WorldSnapshot>) {
///         self.peak = self.peak.max(world.fields.len());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before the grid rebuild.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// Called after each phase.
    fn on_phase_end(&mut self, _tick: Tick, _phase: PhaseTag, _changed: bool) {}

    /// Called once the finished snapshot has been published.  Readers may
    /// keep the `Arc`; it is never mutated afterwards.
    fn on_publish(&mut self, _tick: Tick, _world: &Arc<WorldSnapshot>) {}

    /// An incremental grid rebuild disagreed with a reference rebuild.
    /// The simulation carries on.
    fn on_nav_consistency_error(&mut self, _tick: Tick, _region: TileRect) {}

    /// Called at the end of each tick.
    fn on_tick_end(&mut self, _tick: Tick, _stats: &TickStats) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
