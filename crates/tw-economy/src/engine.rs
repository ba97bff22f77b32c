//! The economy pass: four sub-phases in a fixed order.

use std::sync::Arc;

use tracing::debug;

use tw_core::{EconomyConfig, SimTime, StructureId};
use tw_world::{Intent, WorldSnapshot};

use crate::{EconomyError, EconomyResult};

/// What one economy pass did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EconomyReport {
    /// Units moved from a source into agents' hands.
    pub picked_up: u32,
    /// Units moved from agents' hands into a sink or site.
    pub delivered: u32,
    /// Haulers sent on to another sink after a partial deposit.
    pub retargeted: u32,
    pub batches_produced: u32,
    pub batches_transformed: u32,
    pub sites_started: u32,
    pub sites_completed: u32,
}

impl EconomyReport {
    /// Any structure inventory changed during the pass.
    pub fn inventory_changed(&self) -> bool {
        self.picked_up > 0
            || self.delivered > 0
            || self.batches_produced > 0
            || self.batches_transformed > 0
            || self.sites_started > 0
            || self.sites_completed > 0
    }
}

#[derive(Clone, Debug)]
pub struct EconomyEngine {
    pub(crate) cfg: EconomyConfig,
}

impl EconomyEngine {
    pub fn new(cfg: &EconomyConfig) -> Self {
        Self { cfg: cfg.clone() }
    }

    #[inline]
    pub fn config(&self) -> &EconomyConfig {
        &self.cfg
    }

    /// Run hauling, production, transformation and construction in that
    /// order, then bump the inventory revision once if anything moved.
    pub fn step(&self, world: &mut WorldSnapshot, dt_ms: u64, now: SimTime) -> EconomyReport {
        let mut report = EconomyReport::default();

        // Sites funded before this pass's deliveries; only these may
        // free-complete this tick.
        let funded = self.funded_sites(world);

        self.haul(world, now, &mut report);
        self.produce(world, dt_ms, &mut report);
        self.transform(world, &mut report);
        self.construct(world, dt_ms, &funded, &mut report);

        if report.inventory_changed() {
            world.bump_inventory_revision();
            debug!(?report, inventory_revision = world.revisions.inventory, "economy pass");
        }
        report
    }

    /// Agents assigned to build `site` who are standing in its influence
    /// area.
    pub fn builders_at(&self, world: &WorldSnapshot, site: StructureId) -> EconomyResult<u32> {
        if world.structure(site).is_none() {
            return Err(EconomyError::UnknownStructure(site));
        }
        let margin = self.cfg.influence_margin;
        let n = world
            .agents
            .iter()
            .filter(|a| a.intent == Intent::Construct { target: site })
            .filter(|a| world.in_influence(site, a.pos, margin))
            .count();
        Ok(n as u32)
    }

    fn funded_sites(&self, world: &WorldSnapshot) -> Vec<StructureId> {
        let catalog = Arc::clone(&world.catalog);
        world
            .structures
            .iter()
            .filter(|s| !s.complete)
            .filter(|s| catalog.get(s.kind).is_some_and(|spec| s.cost_met(spec)))
            .map(|s| s.id)
            .collect()
    }
}
