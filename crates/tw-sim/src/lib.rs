//! `tw-sim` — the ordered tick pipeline for the rust_town simulation core.
//!
//! # Tick
//!
//! ```text
//! drain dirty rect → NavGrid::update, router cache cleared
//! refresh spatial hash + POI Index
//! Needs → SocialField → Gossip → Emission → Relationship
//!       → WorldAnalysis → AgentIntent → Economy → Cleanup
//! publish Arc<WorldSnapshot>
//! ```
//!
//! Each phase takes the snapshot by value and hands back the next one.
//! Planning and social triggers only fire on AI ticks
//! (`tick % ai_tick_every == 0`); movement, decay and the economy run every
//! tick.
//!
//! # Crate layout
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`pipeline`] | `PhaseTag`, `Phase`, `TickContext`, `Pipeline`, ordering validation |
//! | [`phases`]   | the concrete phases and `standard_phases`              |
//! | [`sim`]      | `Sim`, `TickStats`                                     |
//! | [`builder`]  | `SimBuilder`                                           |
//! | [`observer`] | `SimObserver`, `NoopObserver`                          |
//! | [`error`]    | `SimError`, `SimResult<T>`                             |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use tw_core::SimConfig;
//! use tw_sim::{NoopObserver, SimBuilder};
//! use tw_world::{StructureCatalog, TileKind, TileMap, WorldSnapshot};
//!
//! let config = SimConfig::default();
//! let tiles = TileMap::new(64, 64, TileKind::Grass);
//! let world = WorldSnapshot::new(tiles, StructureCatalog::default(), config.tile_size, config.seed);
//! let mut sim = SimBuilder::new(config, world).build()?;
//! sim.run_ticks(1_000, &mut NoopObserver);
//! ```

pub mod builder;
pub mod error;
pub mod observer;
pub mod phases;
pub mod pipeline;
pub mod sim;


pub use builder::SimBuilder;
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use phases::{
    standard_phases, AgentIntentPhase, CleanupPhase, EconomyPhase, EmissionPhase, GossipPhase, NeedsPhase,
    RelationshipPhase, SocialFieldPhase, WorldAnalysisPhase,
};
pub use pipeline::{validate, Phase, PhaseOutput, PhaseTag, Pipeline, TickContext};
pub use sim::{Sim, TickStats};
