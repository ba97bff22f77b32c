//! `tw-world` — the Agent Record Store and World Snapshot.
//!
//! # Crate layout
//!
//! | Module             | Contents                                                   |
//! |--------------------|------------------------------------------------------------|
//! | [`agent`]          | `Agent`, `Needs`, `Personality`, `Intent`, `GoalIntent`, `PrimaryGoal`, `NavState`, `SocialState` |
//! | [`catalog`]        | `StructureCatalog`, `StructureSpec`, `ResourceKind`, `StructureKind` |
//! | [`structure`]      | `Structure` and its inventory/footprint helpers            |
//! | [`tiles`]          | `TileMap`, `TileKind`, `Prop`                              |
//! | [`relationship`]   | `RelationshipLedger`, symmetric pair keys                  |
//! | [`poi`]            | `PoiIndex`, revision-keyed                                 |
//! | [`index`]          | `AgentIndex` (spatial hash, short-id table), `StructureLookup` |
//! | [`social_field`]   | `SocialField`, `EncounterEnd`                              |
//! | [`analysis`]       | `WorldAnalysis`: open workplaces, hotspots, POI list       |
//! | [`snapshot`]       | `WorldSnapshot`, revisions, placement commands, dirty rect |
//! | [`persist`]        | `PersistedWorld` projection (serde_json)                   |
//! | [`error`]          | `WorldError`, `WorldResult`                                |

pub mod agent;
pub mod analysis;
pub mod catalog;
pub mod error;
pub mod index;
pub mod persist;
pub mod poi;
pub mod relationship;
pub mod snapshot;
pub mod social_field;
pub mod structure;
pub mod tiles;


pub use agent::{
    Activity, Agent, CarriedItem, Emoji, GoalIntent, GoalTarget, Intent, IntentKind, NavState, NeedKind,
    Needs, Personality, PrimaryGoal, SocialState, NEED_MAX,
};
pub use analysis::{Hotspot, Poi, WorldAnalysis, Workplace};
pub use catalog::{Inventory, ResourceKind, StructureCatalog, StructureKind, StructureSpec};
pub use error::{WorldError, WorldResult};
pub use index::{AgentIndex, StructureLookup};
pub use persist::{PersistedWorld, PERSIST_VERSION};
pub use poi::{PoiIndex, PoiKey};
pub use relationship::{pair_key, RelationshipLedger, SCORE_MAX};
pub use snapshot::{IdCounters, Revisions, WorldSnapshot};
pub use social_field::{field_radius, EncounterEnd, SocialField, FIELD_ENERGY};
pub use structure::Structure;
pub use tiles::{Prop, PropKind, TileKind, TileMap};
