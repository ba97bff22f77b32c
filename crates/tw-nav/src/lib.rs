//! `tw-nav` — navigation grid and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`grid`]    | `NavGrid` (walkability + clearance, full/partial rebuild, self-check), `NavSources` |
//! | [`router`]  | `Router` trait, `GridRouter`, `RoutePlan`, `RouteMode`        |
//! | [`error`]   | `NavError`, `NavResult<T>`                                   |

pub mod error;
pub mod grid;
pub mod router;


pub use error::{NavError, NavResult};
pub use grid::{required_tiles, NavGrid, NavSources, RebuildReport, BLOCKED, ROAD, WALKABLE};
pub use router::{simplify, CacheStats, GridRouter, RouteMode, RoutePlan, RouteRequest, Router};
