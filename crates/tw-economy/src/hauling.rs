//! Pickup and delivery for agents on a `GetResource` / `StoreResource`
//! task.
//!
//! Candidates come from the POI Index built at the start of the tick and
//! are re-checked against live inventory, since earlier haulers in the same
//! pass may already have emptied a source or filled a sink.

use std::sync::Arc;

use tracing::trace;

use tw_core::{SimTime, StructureId, Vec2};
use tw_world::{Agent, CarriedItem, GoalTarget, Intent, ResourceKind, WorldSnapshot};

use crate::{EconomyEngine, EconomyReport};

impl EconomyEngine {
    pub(crate) fn haul(&self, world: &mut WorldSnapshot, now: SimTime, report: &mut EconomyReport) {
        let margin = self.cfg.influence_margin;
        for slot in 0..world.agents.len() {
            let current = &world.agents[slot];
            let (target, pickup) = match current.intent {
                Intent::GetResource { target, resource } => (target, Some(resource)),
                Intent::StoreResource { target } => (target, None),
                _ => continue,
            };
            if !world.in_influence(target, current.pos, margin) {
                continue;
            }

            let mut agent = current.clone();
            match pickup {
                Some(resource) => report.picked_up += self.pick_up(&mut agent, target, resource, world),
                None => {
                    let (delivered, retargeted) = self.deliver(&mut agent, target, world, now);
                    report.delivered += delivered;
                    report.retargeted += u32::from(retargeted);
                }
            }
            world.patch_agent(slot, agent);
        }
    }

    /// Fill the agent's hands from `source`.  A successful pickup turns the
    /// task into a delivery when a destination exists.
    fn pick_up(&self, agent: &mut Agent, source: StructureId, resource: ResourceKind, world: &mut WorldSnapshot) -> u32 {
        let room = match agent.carrying {
            None => self.cfg.carry_capacity,
            Some(item) if item.resource == resource => self.cfg.carry_capacity.saturating_sub(item.quantity),
            Some(_) => 0,
        };
        if room == 0 {
            return 0;
        }
        let taken = world.structure_mut(source).map(|s| s.withdraw(resource, room)).unwrap_or(0);
        if taken == 0 {
            return 0;
        }
        agent.carrying = Some(CarriedItem { resource, quantity: agent.carried_qty() + taken });
        if let Some(dest) = delivery_target(world, resource, agent.pos, Some(source)) {
            agent.intent = Intent::StoreResource { target: dest };
            agent.goal_target = Some(GoalTarget::Structure(dest));
        }
        trace!(agent = %agent.id, %source, ?resource, taken, "picked up");
        taken
    }

    /// Unload into `sink`.  Returns the quantity accepted and whether the
    /// agent was sent on to another sink with the remainder.
    fn deliver(&self, agent: &mut Agent, sink: StructureId, world: &mut WorldSnapshot, now: SimTime) -> (u32, bool) {
        let Some(item) = agent.carrying else {
            return (0, false);
        };
        let catalog = Arc::clone(&world.catalog);
        let accepted = world
            .structure_mut(sink)
            .and_then(|s| catalog.get(s.kind).map(|spec| s.deposit(spec, item.resource, item.quantity)))
            .unwrap_or(0);

        let left = item.quantity - accepted;
        if left == 0 {
            agent.carrying = None;
            agent.intent = Intent::Work;
            agent.goal_target = None;
            trace!(agent = %agent.id, %sink, resource = ?item.resource, accepted, "delivered");
            return (accepted, false);
        }
        agent.carrying = Some(CarriedItem { resource: item.resource, quantity: left });

        if now < agent.retarget_cooldown_until {
            return (accepted, false);
        }
        let Some(next) = delivery_target(world, item.resource, agent.pos, Some(sink)) else {
            return (accepted, false);
        };
        agent.intent = Intent::StoreResource { target: next };
        agent.goal_target = Some(GoalTarget::Structure(next));
        agent.retarget_cooldown_until = now.after_ms(self.cfg.retarget_cooldown_ms);
        trace!(agent = %agent.id, from = %sink, to = %next, left, "partial delivery, retargeted");
        (accepted, true)
    }
}

/// Nearest place that will take `resource`: construction sites short of it
/// first, then complete consumers with spare capacity.
pub(crate) fn delivery_target(
    world: &WorldSnapshot,
    resource: ResourceKind,
    from: Vec2,
    exclude: Option<StructureId>,
) -> Option<StructureId> {
    let catalog = &world.catalog;
    let accepts = |id: &StructureId| {
        Some(*id) != exclude
            && world
                .structure(*id)
                .and_then(|s| catalog.get(s.kind).map(|spec| s.spare_capacity(spec, resource) > 0))
                .unwrap_or(false)
    };

    let (sites, sinks): (Vec<StructureId>, Vec<StructureId>) = match world.poi_index() {
        Some(poi) => (
            poi.construction_needs(resource).iter().copied().filter(accepts).collect(),
            poi.sinks(resource).iter().copied().filter(accepts).collect(),
        ),
        None => {
            // Stale index: fall back to a live scan.
            let (mut sites, mut sinks) = (Vec::new(), Vec::new());
            for s in world.structures.iter().filter(|s| accepts(&s.id)) {
                if !s.complete {
                    sites.push(s.id);
                } else if catalog.get(s.kind).is_some_and(|spec| spec.consumes.contains_key(&resource)) {
                    sinks.push(s.id);
                }
            }
            (sites, sinks)
        }
    };
    world.nearest_of(&sites, from, exclude).or_else(|| world.nearest_of(&sinks, from, exclude))
}
