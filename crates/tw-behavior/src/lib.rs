//! `tw-behavior` — needs, intent selection and the goal-intent state machine.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                          |
//! |---------------|-------------------------------------------------------------------|
//! | [`needs`]     | `update_needs`: per-second decay and activity restoration         |
//! | [`pressure`]  | pressure map, commitment hysteresis, `select_intent`              |
//! | [`planner`]   | `Planner`: primary goal, goal transitions, arrival and completion |
//! | [`hotspot`]   | slot reservation and nearest-biased hotspot choice                |
//! | [`tasks`]     | economy task selection for logistics workers                      |
//! | [`cleanup`]   | stale-reference cleanup pass                                      |
//! | [`error`]     | `BehaviorError`, `BehaviorResult<T>`                              |
//!
//! # Two state machines
//!
//! The *current intent* is need-driven and re-selected on every AI tick.
//! The *goal intent* (GoHome, GoWork, BusyAtWork, visits, WanderNearHome)
//! drives navigation and changes only when the agent is free to act: not
//! socializing, sleeping or travelling, and with no dwell timer running.
//! Above both sits the primary goal (`OffDuty` or `WorkShift`), whose
//! expiry overrides everything else.

pub mod cleanup;
pub mod error;
pub mod hotspot;
pub mod needs;
pub mod planner;
pub mod pressure;
pub mod tasks;

#[cfg(test)]
mod tests;

pub use cleanup::cleanup_stale_refs;
pub use error::{BehaviorError, BehaviorResult};
pub use hotspot::{choose_hotspot, occupy, release_reservation, reserve};
pub use needs::update_needs;
pub use planner::{PlanContext, Planner, FRIEND_AFFINITY, STORE_STABILITY, WAKE_SLEEP};
pub use pressure::{is_committed, pressures, select_intent, PressureMap};
pub use tasks::{refresh_economy_task, select_economy_task, task_still_valid};
