//! `tw-economy` — goods moving through the town.
//!
//! # Crate layout
//!
//! | Module           | Contents                                            |
//! |------------------|-----------------------------------------------------|
//! | [`engine`]       | `EconomyEngine`, `EconomyReport`, the ordered pass  |
//! | [`hauling`]      | pickup, delivery, partial-deposit retargeting       |
//! | [`production`]   | worker-scaled production, transformation            |
//! | [`construction`] | atomic cost consumption, builder progress           |
//! | [`error`]        | `EconomyError`, `EconomyResult<T>`                  |
//!
//! The pass runs hauling, production, transformation and construction in
//! that order.  Later steps see the inventory earlier steps left behind.
//! The inventory revision is bumped once at the end when anything moved,
//! which invalidates the POI Index for the next tick.

pub mod construction;
pub mod engine;
pub mod error;
pub mod hauling;
pub mod production;

#[cfg(test)]
mod tests;

pub use engine::{EconomyEngine, EconomyReport};
pub use error::{EconomyError, EconomyResult};
pub use production::{batch_fits, inputs_ready};
