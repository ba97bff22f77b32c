//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use tracing::info;

use tw_core::{SimConfig, SimRng};
use tw_mobility::MobilityEngine;
use tw_nav::{GridRouter, NavGrid, NavSources, Router};
use tw_world::WorldSnapshot;

use crate::{Phase, Pipeline, Sim, SimError, SimResult};

/// Fluent builder for [`Sim<R>`].
///
/// # Required inputs
///
/// - [`SimConfig`], validated on `build`
/// - a [`WorldSnapshot`] whose tile size matches the config
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                 |
/// |-----------------|-----------------------------------------|
/// | `.router(r)`    | `GridRouter::new(&config.nav)`          |
/// | `.phases(v)`    | [`standard_phases`][crate::standard_phases] |
///
/// # Example
///
/// ```rust,ignore
/// let world = WorldSnapshot::new(tiles, StructureCatalog::default(), 16.0, 7);
/// let mut sim = SimBuilder::new(config, world).build()?;
/// sim.run_ticks(200, &mut NoopObserver);
/// ```
pub struct SimBuilder<R: Router = GridRouter> {
    config: SimConfig,
    world: WorldSnapshot,
    router: R,
    phases: Option<Vec<Box<dyn Phase<R>>>>,
}

impl SimBuilder<GridRouter> {
    pub fn new(config: SimConfig, world: WorldSnapshot) -> Self {
        let router = GridRouter::new(&config.nav);
        Self { config, world, router, phases: None }
    }
}

impl<R: Router> SimBuilder<R> {
    /// Swap the routing algorithm.  Any custom phase list is dropped, since
    /// phases are typed by router; set it again afterwards.
    pub fn router<R2: Router>(self, router: R2) -> SimBuilder<R2> {
        SimBuilder { config: self.config, world: self.world, router, phases: None }
    }

    /// Replace the standard phase list.  Ordering is validated on `build`.
    pub fn phases(mut self, phases: Vec<Box<dyn Phase<R>>>) -> Self {
        self.phases = Some(phases);
        self
    }

    /// Validate inputs, build the navigation grid and pipeline, and return a
    /// ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<R>> {
        self.config.validate()?;
        if (self.world.tile_size - self.config.tile_size).abs() > f32::EPSILON {
            return Err(SimError::TileSizeMismatch { config: self.config.tile_size, world: self.world.tile_size });
        }

        let pipeline = match self.phases {
            Some(p) => Pipeline::new(p)?,
            None => Pipeline::standard(&self.config)?,
        };

        let mut world = self.world;
        let grid = NavGrid::build(&NavSources::from_world(&world), &self.config.nav);
        // The full build covers anything still pending.
        world.take_dirty();
        world.refresh_indices();
        world.refresh_poi_index();

        let mobility = MobilityEngine::new(self.router, &self.config.planner, &self.config.nav);
        info!(
            agents = world.agents.len(),
            structures = world.structures.len(),
            width = grid.width(),
            height = grid.height(),
            "simulation built"
        );

        Ok(Sim {
            clock: self.config.make_clock(),
            rng: SimRng::new(self.config.seed),
            config: self.config,
            grid,
            mobility,
            pipeline,
            world: Arc::new(world),
        })
    }
}
