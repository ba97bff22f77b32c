//! The `Sim` struct and its tick loop.

use std::sync::Arc;

use tracing::{debug, warn};

use tw_core::{SimClock, SimConfig, SimRng, StructureId, Tick, Vec2};
use tw_mobility::MobilityEngine;
use tw_nav::{GridRouter, NavGrid, NavSources, Router};
use tw_world::{PersistedWorld, StructureCatalog, StructureKind, WorldSnapshot};

use crate::{Pipeline, SimBuilder, SimObserver, SimResult, TickContext};

/// What one tick did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    pub tick: Tick,
    pub ai_tick: bool,
    /// The navigation grid was rebuilt from a drained dirty rectangle.
    pub nav_rebuilt: bool,
    /// Phases that reported a change.
    pub phases_changed: usize,
    pub agents: usize,
    pub fields: usize,
}

/// The simulation runner.
///
/// Each tick:
///
/// 1. Drain the world's dirty rectangle into an incremental [`NavGrid`]
///    rebuild and clear the router's road cache.
/// 2. Refresh the spatial hash and the POI Index.
/// 3. Run the [`Pipeline`] on a private copy of the snapshot.
/// 4. Publish the result by swapping the shared `Arc`.
///
/// Readers holding an earlier [`Sim::snapshot`] never see a half-updated
/// world: phases only write to the private copy, and the copy-on-write
/// lists inside the snapshot keep older `Arc`s intact.
///
/// Create via [`SimBuilder`].
pub struct Sim<R: Router = GridRouter> {
    pub config: SimConfig,
    pub clock: SimClock,
    pub grid: NavGrid,
    pub mobility: MobilityEngine<R>,
    pub(crate) pipeline: Pipeline<R>,
    pub(crate) rng: SimRng,
    pub(crate) world: Arc<WorldSnapshot>,
}

impl Sim<GridRouter> {
    /// Rebuild a runnable simulation from persisted state.
    pub fn from_persisted(config: SimConfig, saved: PersistedWorld, catalog: StructureCatalog) -> SimResult<Self> {
        let world = WorldSnapshot::from_persisted(saved, catalog);
        SimBuilder::new(config, world).build()
    }
}

impl<R: Router> Sim<R> {
    // ── Read side ─────────────────────────────────────────────────────────

    /// The most recently published snapshot.
    #[inline]
    pub fn snapshot(&self) -> Arc<WorldSnapshot> {
        Arc::clone(&self.world)
    }

    #[inline]
    pub fn world(&self) -> &WorldSnapshot {
        &self.world
    }

    pub fn pipeline(&self) -> &Pipeline<R> {
        &self.pipeline
    }

    pub fn to_persisted(&self) -> PersistedWorld {
        self.world.to_persisted()
    }

    // ── Commands between ticks ────────────────────────────────────────────

    /// Apply an external mutation (placement, selection tooling) to the
    /// live world.  Already published snapshots are unaffected.
    pub fn apply<T>(&mut self, f: impl FnOnce(&mut WorldSnapshot) -> T) -> T {
        f(Arc::make_mut(&mut self.world))
    }

    pub fn place_structure(&mut self, kind: StructureKind, anchor: Vec2) -> SimResult<StructureId> {
        Ok(self.apply(|w| w.place_structure(kind, anchor))?)
    }

    pub fn remove_structure(&mut self, id: StructureId) -> SimResult<()> {
        self.apply(|w| w.remove_structure(id))?;
        Ok(())
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Run `n` ticks.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) {
        for _ in 0..n {
            self.tick(observer);
        }
    }

    /// Run one tick and advance the clock.
    pub fn tick<O: SimObserver>(&mut self, observer: &mut O) -> TickStats {
        let tick = self.clock.current_tick;
        observer.on_tick_start(tick);

        let mut world = WorldSnapshot::clone(&self.world);

        let mut nav_rebuilt = false;
        if let Some(rect) = world.take_dirty() {
            let report = self.grid.update(&NavSources::from_world(&world), Some(rect));
            self.mobility.router.clear_cache();
            nav_rebuilt = true;
            if report.mismatch {
                warn!(%tick, region = ?report.region, "navigation grid consistency mismatch");
                observer.on_nav_consistency_error(tick, report.region);
            }
        }
        world.refresh_indices();
        world.refresh_poi_index();

        let ai_tick = self.clock.is_ai_tick();
        let mut ctx = TickContext {
            grid: &self.grid,
            mobility: &mut self.mobility,
            clock: &self.clock,
            rng: &mut self.rng,
            dt_ms: self.config.tick_ms,
        };
        let (world, phases_changed) = self.pipeline.run(world, &mut ctx, observer);

        let stats = TickStats {
            tick,
            ai_tick,
            nav_rebuilt,
            phases_changed,
            agents: world.agents.len(),
            fields: world.fields.len(),
        };
        self.world = Arc::new(world);
        observer.on_publish(tick, &self.world);
        observer.on_tick_end(tick, &stats);
        if ai_tick {
            debug!(%tick, clock = %self.clock, phases_changed, "ai tick");
        }
        self.clock.advance();
        stats
    }
}
