//! `tw-core` — foundational types for the `rust_town` simulation core.
//!
//! This crate is a dependency of every other `tw-*` crate.  It has no `tw-*`
//! dependencies and only a handful of external ones (`rand`, `thiserror`,
//! `serde`, `toml`).
//!
//! # What lives here
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`ids`]      | `AgentId` (short id), `StructureId`, `PropId`, `FieldId`  |
//! | [`geo`]      | `Vec2`, `TilePos`, `TileRect`, packed tile coordinates    |
//! | [`time`]     | `SimTime`, `Tick`, `SimClock`, `DayPhase`                 |
//! | [`rng`]      | `AgentRng` (per-agent), `SimRng` (global)                 |
//! | [`config`]   | `SimConfig` and its per-subsystem sections                |
//! | [`error`]    | `CoreError`, `CoreResult`                                 |

pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{EconomyConfig, NavConfig, NeedsConfig, PlannerConfig, SimConfig, SocialConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{TilePos, TileRect, Vec2};
pub use ids::{AgentId, FieldId, PropId, StructureId};
pub use rng::{AgentRng, SimRng};
pub use time::{DayPhase, SimClock, SimTime, Tick};
