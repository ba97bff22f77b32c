//! `tw-social` — social fields, conversation, gossip and relationships.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`fields`]      | `SocialEngine`, field formation, decay and dissolution    |
//! | [`emission`]    | one-speaker-per-field emoji emission, bump greetings      |
//! | [`gossip`]      | third-party opinion spillover                             |
//! | [`relations`]   | encounter resolution, `apply_relationship_delta`, decay   |
//! | [`error`]       | `SocialError`, `SocialResult<T>`                          |
//!
//! # Encounter lifecycle
//!
//! 1. `form_fields` groups wandering idle agents that stand close together.
//! 2. While the field lives, `emit` lets one member at a time show an emoji
//!    and every member tallies its valence.
//! 3. `update_fields` decays energy by elapsed time; a dissolved field
//!    releases its members and queues an `EncounterEnd`.
//! 4. `resolve_encounters` turns each pair's summed valence into a
//!    relationship delta on the ledger.

pub mod emission;
pub mod error;
pub mod fields;
pub mod gossip;
pub mod relations;

#[cfg(test)]
mod tests;

pub use emission::{emoji_pool, GLOOMY_MOOD, HAPPY_MOOD};
pub use error::{SocialError, SocialResult};
pub use fields::SocialEngine;
pub use gossip::Rumor;
pub use relations::{apply_relationship_delta, saturated_delta};
