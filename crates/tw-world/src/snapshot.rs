//! The World Snapshot: one value holding every piece of simulation state.
//!
//! # Update discipline
//!
//! Every collection sits behind an `Arc`, so cloning a snapshot is a handful
//! of reference-count bumps.  A phase takes the snapshot by value, patches
//! only what it changes (`Arc::make_mut` clones a list the first time it is
//! written while a reader still holds the old one) and returns it.  Readers
//! holding a previously published snapshot never observe a half-updated
//! tick.
//!
//! `patch_agent` / `patch_structure` compare before writing and report
//! whether anything changed, which is what decides revision bumps.

use std::sync::Arc;

use tracing::{debug, warn};

use tw_core::{AgentId, AgentRng, FieldId, PropId, StructureId, Tick, TilePos, TileRect, Vec2};

use crate::agent::{Agent, Needs, Personality};
use crate::analysis::WorldAnalysis;
use crate::catalog::{StructureCatalog, StructureKind};
use crate::index::{AgentIndex, StructureLookup};
use crate::poi::{PoiIndex, PoiKey};
use crate::relationship::RelationshipLedger;
use crate::social_field::{EncounterEnd, SocialField};
use crate::structure::Structure;
use crate::tiles::{Prop, PropKind, TileKind, TileMap};
use crate::{WorldError, WorldResult};

/// Monotonic cache-invalidation counters.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Revisions {
    /// Structures placed, removed or completed.
    pub structure: u64,
    /// Any inventory moved.
    pub inventory: u64,
    /// Road tiles changed.
    pub road: u64,
}

/// Monotonic id allocators.  Ids are never reused.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdCounters {
    pub next_agent: u32,
    pub next_structure: u32,
    pub next_prop: u32,
    pub next_field: u32,
}

/// Spatial-hash cell edge in world units.
const AGENT_CELL: f32 = 32.0;

#[derive(Clone, Debug)]
pub struct WorldSnapshot {
    pub tile_size: f32,
    /// Seed for spawn-time randomisation.
    pub seed: u64,
    pub tiles: Arc<TileMap>,
    pub structures: Arc<Vec<Structure>>,
    pub agents: Arc<Vec<Agent>>,
    pub props: Arc<Vec<Prop>>,
    pub fields: Arc<Vec<SocialField>>,
    /// Fields dissolved this tick, drained by relationship resolution.
    pub encounters: Arc<Vec<EncounterEnd>>,
    pub ledger: Arc<RelationshipLedger>,
    pub analysis: Arc<WorldAnalysis>,
    pub catalog: Arc<StructureCatalog>,
    pub revisions: Revisions,
    pub ids: IdCounters,

    poi: Arc<PoiIndex>,
    agent_index: Arc<AgentIndex>,
    structure_lookup: Arc<StructureLookup>,
    dirty: Option<TileRect>,
}

impl WorldSnapshot {
    pub fn new(tiles: TileMap, catalog: StructureCatalog, tile_size: f32, seed: u64) -> Self {
        let full = tiles.bounds();
        Self {
            tile_size,
            seed,
            tiles: Arc::new(tiles),
            structures: Arc::new(Vec::new()),
            agents: Arc::new(Vec::new()),
            props: Arc::new(Vec::new()),
            fields: Arc::new(Vec::new()),
            encounters: Arc::new(Vec::new()),
            ledger: Arc::new(RelationshipLedger::new()),
            analysis: Arc::new(WorldAnalysis::default()),
            catalog: Arc::new(catalog),
            revisions: Revisions::default(),
            ids: IdCounters::default(),
            poi: Arc::new(PoiIndex::empty()),
            agent_index: Arc::new(AgentIndex::default()),
            structure_lookup: Arc::new(StructureLookup::default()),
            dirty: Some(full),
        }
    }

    // ── Lookups ───────────────────────────────────────────────────────────

    #[inline]
    pub fn agent_slot(&self, id: AgentId) -> Option<usize> {
        self.agent_index
            .slot(id)
            .filter(|&s| self.agents.get(s).is_some_and(|a| a.id == id))
            .or_else(|| self.agents.iter().position(|a| a.id == id))
    }

    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agent_slot(id).map(|s| &self.agents[s])
    }

    #[inline]
    pub fn structure_slot(&self, id: StructureId) -> Option<usize> {
        self.structure_lookup
            .slot(id)
            .filter(|&s| self.structures.get(s).is_some_and(|st| st.id == id))
            .or_else(|| self.structures.iter().position(|st| st.id == id))
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structure_slot(id).map(|s| &self.structures[s])
    }

    /// Mutable access to one structure (copy-on-write on the list).
    pub fn structure_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        let slot = self.structure_slot(id)?;
        Arc::make_mut(&mut self.structures).get_mut(slot)
    }

    /// Mutable access to one agent (copy-on-write on the list).
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let slot = self.agent_slot(id)?;
        Arc::make_mut(&mut self.agents).get_mut(slot)
    }

    /// Of `candidates`, the existing structure whose centre is closest to
    /// `pos`, skipping `exclude`.  Ties go to the lower id.
    pub fn nearest_of(&self, candidates: &[StructureId], pos: Vec2, exclude: Option<StructureId>) -> Option<StructureId> {
        candidates
            .iter()
            .filter(|&&id| Some(id) != exclude)
            .filter_map(|&id| {
                let s = self.structure(id)?;
                let spec = self.catalog.get(s.kind)?;
                Some((s.center(spec).distance_sq(pos), id))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
            .map(|(_, id)| id)
    }

    /// World-space centre of a structure's footprint.
    pub fn structure_center(&self, id: StructureId) -> Option<Vec2> {
        let s = self.structure(id)?;
        Some(s.center(self.catalog.get(s.kind)?))
    }

    /// `true` if `pos` lies in the structure's influence area.
    pub fn in_influence(&self, id: StructureId, pos: Vec2, margin: i32) -> bool {
        self.structure(id)
            .and_then(|s| self.catalog.get(s.kind).map(|spec| s.in_influence(spec, self.tile_size, margin, pos)))
            .unwrap_or(false)
    }

    #[inline]
    pub fn agent_index(&self) -> &AgentIndex {
        &self.agent_index
    }

    /// Agents (slots) within `radius` of `center`, per the last index build.
    pub fn agents_near(&self, center: Vec2, radius: f32) -> Vec<usize> {
        self.agent_index.query_radius(&self.agents, center, radius)
    }

    // ── Copy-on-write patching ────────────────────────────────────────────

    /// Replace the agent at `slot` if it differs.  Returns `true` on change.
    pub fn patch_agent(&mut self, slot: usize, agent: Agent) -> bool {
        match self.agents.get(slot) {
            Some(current) if *current != agent => {
                Arc::make_mut(&mut self.agents)[slot] = agent;
                true
            }
            _ => false,
        }
    }

    /// Replace the structure at `slot` if it differs.  Returns `true` on change.
    pub fn patch_structure(&mut self, slot: usize, structure: Structure) -> bool {
        match self.structures.get(slot) {
            Some(current) if *current != structure => {
                Arc::make_mut(&mut self.structures)[slot] = structure;
                true
            }
            _ => false,
        }
    }

    pub fn bump_structure_revision(&mut self) {
        self.revisions.structure += 1;
    }

    pub fn bump_inventory_revision(&mut self) {
        self.revisions.inventory += 1;
    }

    pub fn next_field_id(&mut self) -> FieldId {
        let id = FieldId(self.ids.next_field);
        self.ids.next_field += 1;
        id
    }

    // ── Derived state ─────────────────────────────────────────────────────

    /// Rebuild the spatial hash and the id → slot tables.
    pub fn refresh_indices(&mut self) {
        self.agent_index = Arc::new(AgentIndex::build(&self.agents, AGENT_CELL));
        self.structure_lookup = Arc::new(StructureLookup::build(&self.structures));
    }

    #[inline]
    pub fn poi_key(&self) -> PoiKey {
        PoiKey {
            structure_revision: self.revisions.structure,
            inventory_revision: self.revisions.inventory,
        }
    }

    /// The POI Index if it matches the current revisions.
    pub fn poi_index(&self) -> Option<&PoiIndex> {
        self.poi.is_valid_for(self.poi_key()).then_some(&*self.poi)
    }

    /// Rebuild the POI Index when its key is stale.  Returns `true` if it
    /// was rebuilt.
    pub fn refresh_poi_index(&mut self) -> bool {
        let key = self.poi_key();
        if self.poi.is_valid_for(key) {
            return false;
        }
        self.poi = Arc::new(PoiIndex::build(&self.structures, &self.catalog, key));
        true
    }

    /// Recompute the world analysis for `tick`.
    pub fn refresh_analysis(&mut self, tick: Tick) {
        self.analysis = Arc::new(WorldAnalysis::compute(&self.structures, &self.catalog, tick));
    }

    // ── Dirty-rect accumulator ────────────────────────────────────────────

    pub fn mark_dirty(&mut self, rect: TileRect) {
        let rect = rect.clamp_to(self.tiles.width, self.tiles.height);
        if rect.is_empty() {
            return;
        }
        self.dirty = Some(match self.dirty {
            Some(d) => d.union(&rect),
            None => rect,
        });
    }

    /// Drain the accumulated dirty rectangle.
    pub fn take_dirty(&mut self) -> Option<TileRect> {
        self.dirty.take()
    }

    #[inline]
    pub fn has_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    // ── Placement commands ────────────────────────────────────────────────

    fn check_free(&self, rect: TileRect) -> WorldResult<()> {
        for corner in [TilePos::new(rect.x0, rect.y0), TilePos::new(rect.x1 - 1, rect.y1 - 1)] {
            if !self.tiles.in_bounds(corner) {
                return Err(WorldError::OutOfBounds(corner));
            }
        }
        for p in rect.iter() {
            if self.tiles.get(p).is_some_and(TileKind::is_blocking) {
                return Err(WorldError::Occupied(p));
            }
        }
        for s in self.structures.iter() {
            let spec = self.catalog.spec(s.kind)?;
            if s.blocked_rect(spec, self.tile_size).intersects(&rect) {
                return Err(WorldError::Occupied(TilePos::new(rect.x0, rect.y0)));
            }
        }
        if self.props.iter().any(|p| p.footprint().intersects(&rect)) {
            return Err(WorldError::Occupied(TilePos::new(rect.x0, rect.y0)));
        }
        Ok(())
    }

    /// Place a structure with its footprint's bottom-left at `anchor`.
    ///
    /// A House spawns `capacity` residents at its door.
    pub fn place_structure(&mut self, kind: StructureKind, anchor: Vec2) -> WorldResult<StructureId> {
        let spec = self.catalog.spec(kind)?.clone();
        let id = StructureId(self.ids.next_structure);
        let mut structure = Structure::new(id, &spec, anchor);
        let rect = structure.blocked_rect(&spec, self.tile_size);

        if let Err(e) = self.check_free(rect) {
            warn!(?kind, %e, "structure placement rejected");
            return Err(e);
        }
        self.ids.next_structure += 1;

        if kind.is_residence() {
            let door = structure.door_tile(&spec, self.tile_size);
            let door = if self.tiles.in_bounds(door) { door } else { TilePos::new(rect.x0, rect.y1) };
            for _ in 0..spec.capacity {
                let agent = self.spawn_agent(door.center(self.tile_size), Some(id));
                structure.residents.push(agent);
            }
        }

        Arc::make_mut(&mut self.structures).push(structure);
        self.mark_dirty(rect);
        self.bump_structure_revision();
        self.refresh_indices();
        debug!(%id, ?kind, "structure placed");
        Ok(id)
    }

    /// Remove a structure.  References held by agents are left dangling for
    /// the cleanup phase.
    pub fn remove_structure(&mut self, id: StructureId) -> WorldResult<Structure> {
        let slot = self.structure_slot(id).ok_or(WorldError::StructureNotFound(id))?;
        let removed = Arc::make_mut(&mut self.structures).remove(slot);
        if let Ok(spec) = self.catalog.spec(removed.kind) {
            let rect = removed.blocked_rect(spec, self.tile_size);
            self.mark_dirty(rect);
        }
        self.bump_structure_revision();
        self.refresh_indices();
        debug!(%id, kind = ?removed.kind, "structure removed");
        Ok(removed)
    }

    /// Overwrite one terrain tile.
    pub fn set_tile(&mut self, p: TilePos, kind: TileKind) -> WorldResult<()> {
        let prev = Arc::make_mut(&mut self.tiles).set(p, kind).ok_or(WorldError::OutOfBounds(p))?;
        if prev == kind {
            return Ok(());
        }
        if prev.is_road() != kind.is_road() {
            self.revisions.road += 1;
        }
        self.mark_dirty(TileRect::from_origin(p, 1, 1));
        Ok(())
    }

    pub fn place_road(&mut self, p: TilePos) -> WorldResult<()> {
        self.set_tile(p, TileKind::Road)
    }

    pub fn place_prop(&mut self, kind: PropKind, origin: TilePos) -> WorldResult<PropId> {
        let id = PropId(self.ids.next_prop);
        let prop = Prop { id, kind, origin };
        let rect = prop.footprint();
        self.check_free(rect)?;
        self.ids.next_prop += 1;
        Arc::make_mut(&mut self.props).push(prop);
        self.mark_dirty(rect);
        Ok(id)
    }

    pub fn remove_prop(&mut self, id: PropId) -> WorldResult<Prop> {
        let slot = self.props.iter().position(|p| p.id == id).ok_or(WorldError::PropNotFound(id))?;
        let removed = Arc::make_mut(&mut self.props).remove(slot);
        self.mark_dirty(removed.footprint());
        Ok(removed)
    }

    /// Append a new agent and return its short id.
    pub fn spawn_agent(&mut self, pos: Vec2, home: Option<StructureId>) -> AgentId {
        let id = AgentId(self.ids.next_agent);
        self.ids.next_agent += 1;

        let mut rng = AgentRng::new(self.seed, id);
        let mut agent = Agent::new(id, format!("agent-{:04}", id.0), pos);
        agent.personality = Personality::random(&mut rng);
        agent.needs = Needs {
            sleep: rng.gen_range(60.0..=95.0),
            stability: rng.gen_range(50.0..=90.0),
            social: rng.gen_range(40.0..=90.0),
            fun: rng.gen_range(40.0..=90.0),
            stimulation: rng.gen_range(40.0..=90.0),
        };
        agent.home = home;
        Arc::make_mut(&mut self.agents).push(agent);
        id
    }

    /// Remove an agent and everything that refers to it.  Never called by the
    /// simulation itself; population only grows there.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        let slot = self.agent_slot(id)?;
        let removed = Arc::make_mut(&mut self.agents).remove(slot);

        for s in Arc::make_mut(&mut self.structures).iter_mut() {
            s.residents.retain(|&a| a != id);
            s.workers.retain(|&a| a != id);
        }
        for a in Arc::make_mut(&mut self.agents).iter_mut() {
            a.social_memory.remove(&id);
            if a.social.partner == Some(id) {
                a.social.partner = None;
            }
        }
        for f in Arc::make_mut(&mut self.fields).iter_mut() {
            f.participants.retain(|&a| a != id);
        }
        Arc::make_mut(&mut self.ledger).forget(id);
        self.bump_structure_revision();
        self.refresh_indices();
        Some(removed)
    }

    pub(crate) fn set_dirty(&mut self, dirty: Option<TileRect>) {
        self.dirty = dirty;
    }
}
