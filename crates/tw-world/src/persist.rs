//! Persistence projection.
//!
//! [`PersistedWorld`] is the serialisable subset of a [`WorldSnapshot`]:
//! terrain, structures, props, agents without their navigation and
//! conversation scratch, the relationship ledger and the counters.  Loading
//! rebuilds every derived index and marks the whole map dirty so the owner
//! rebuilds its navigation grid.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::agent::{Activity, Agent, NavState};
use crate::catalog::StructureCatalog;
use crate::relationship::RelationshipLedger;
use crate::snapshot::{IdCounters, Revisions, WorldSnapshot};
use crate::structure::Structure;
use crate::tiles::{Prop, TileMap};
use crate::WorldResult;

/// Format marker written into every file.
pub const PERSIST_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedWorld {
    pub version: u32,
    pub tile_size: f32,
    pub seed: u64,
    pub tiles: TileMap,
    pub structures: Vec<Structure>,
    pub agents: Vec<Agent>,
    pub props: Vec<Prop>,
    pub ledger: RelationshipLedger,
    pub revisions: Revisions,
    pub ids: IdCounters,
}

/// Strip runtime-only state from an agent.
fn scrub(agent: &Agent) -> Agent {
    let mut a = agent.clone();
    a.nav = NavState::default();
    a.social.field = None;
    a.social.partner = None;
    a.social.emoji = None;
    a.social.encounter_valence = 0;
    if matches!(a.activity, Activity::Traveling | Activity::Socializing) {
        a.activity = Activity::Idle;
    }
    a.vel = tw_core::Vec2::ZERO;
    a
}

impl PersistedWorld {
    pub fn to_json(&self) -> WorldResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> WorldResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl WorldSnapshot {
    /// Project the persistable subset.
    pub fn to_persisted(&self) -> PersistedWorld {
        PersistedWorld {
            version: PERSIST_VERSION,
            tile_size: self.tile_size,
            seed: self.seed,
            tiles: (*self.tiles).clone(),
            structures: (*self.structures).clone(),
            agents: self.agents.iter().map(scrub).collect(),
            props: (*self.props).clone(),
            ledger: (*self.ledger).clone(),
            revisions: self.revisions,
            ids: self.ids,
        }
    }

    /// Rebuild a runtime snapshot from a persisted one.
    pub fn from_persisted(p: PersistedWorld, catalog: StructureCatalog) -> Self {
        let mut snap = WorldSnapshot::new(p.tiles, catalog, p.tile_size, p.seed);
        snap.structures = Arc::new(p.structures);
        snap.agents = Arc::new(p.agents.iter().map(scrub).collect());
        snap.props = Arc::new(p.props);
        snap.ledger = Arc::new(p.ledger);
        snap.revisions = p.revisions;
        snap.ids = p.ids;
        snap.set_dirty(Some(snap.tiles.bounds()));
        snap.refresh_indices();
        snap.refresh_poi_index();
        info!(
            agents = snap.agents.len(),
            structures = snap.structures.len(),
            "world snapshot loaded"
        );
        snap
    }
}
