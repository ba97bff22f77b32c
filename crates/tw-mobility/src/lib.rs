//! `tw-mobility` — navigation requests, path following and arrival.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                      |
//! |---------------|---------------------------------------------------------------|
//! | [`engine`]    | `MobilityEngine<R>`: `request_navigation`, `step_agent`, `advance` |
//! | [`movement`]  | waypoint jitter and straight-line stepping                    |
//! | [`error`]     | `MobilityError`, `MobilityResult<T>`                          |
//!
//! # Movement model
//!
//! 1. `request_navigation` clears the agent's path and asks the router for a
//!    new one.  A failed request sets a randomised cooldown.
//! 2. Each tick `advance` walks the agent straight towards the centre of its
//!    current waypoint (offset by a small per-agent jitter) at `walk_speed`.
//! 3. Within `arrival_radius` the path index advances; passing the last
//!    waypoint returns [`StepOutcome::Arrived`] and the caller runs its
//!    arrival transition.
//! 4. An agent that makes no progress for `stuck_threshold_ms` replans
//!    towards its original goal.

pub mod engine;
pub mod error;
pub mod movement;


pub use engine::{MobilityEngine, NavTarget, StepOutcome};
pub use error::{MobilityError, MobilityResult};
pub use movement::{jitter_offset, step_towards};
