//! Economy task selection for logistics (Depot) workers.
//!
//! Priority, highest first:
//!
//! 1. Carrying something: deliver it to the nearest construction site that
//!    still needs it, else to the nearest sink.
//! 2. A construction site has its full cost on hand: go build it.
//! 3. A site is short of a resource: fetch it from the nearest source.
//! 4. Any resource some structure consumes: fetch it from a source.
//!
//! With no valid POI index (stale this tick) the worker stays on plain
//! `Intent::Work` and wanders around the depot.

use tw_core::SimTime;
use tw_world::{Agent, Intent, ResourceKind, WorldSnapshot};

/// `true` while a previously chosen task can still be carried out.
pub fn task_still_valid(intent: Intent, agent: &Agent, world: &WorldSnapshot) -> bool {
    let spec_of = |id| world.structure(id).and_then(|s| world.catalog.get(s.kind).map(|spec| (s, spec)));
    match intent {
        Intent::GetResource { target, resource } => {
            agent.carrying.is_none() && world.structure(target).is_some_and(|s| s.stock(resource) > 0)
        }
        Intent::StoreResource { target } => match (agent.carrying, spec_of(target)) {
            (Some(item), Some((s, spec))) => s.spare_capacity(spec, item.resource) > 0,
            _ => false,
        },
        Intent::Construct { target } => {
            spec_of(target).is_some_and(|(s, spec)| !s.complete && s.cost_met(spec))
        }
        _ => false,
    }
}

/// Choose the next economy task for `agent`.
pub fn select_economy_task(agent: &Agent, world: &WorldSnapshot) -> Intent {
    let Some(poi) = world.poi_index() else {
        return Intent::Work;
    };
    let pos = agent.pos;

    if let Some(item) = agent.carrying {
        let r = item.resource;
        return world
            .nearest_of(poi.construction_needs(r), pos, None)
            .or_else(|| world.nearest_of(poi.sinks(r), pos, None))
            .map(|target| Intent::StoreResource { target })
            .unwrap_or(Intent::Work);
    }

    if let Some(target) = world.nearest_of(poi.ready_sites(), pos, None) {
        return Intent::Construct { target };
    }

    for resource in poi.needed_resources() {
        if let Some(target) = world.nearest_of(poi.sources(resource), pos, None) {
            return Intent::GetResource { target, resource };
        }
    }

    for resource in ResourceKind::ALL {
        if poi.sinks(resource).is_empty() {
            continue;
        }
        if let Some(target) = world.nearest_of(poi.sources(resource), pos, None) {
            return Intent::GetResource { target, resource };
        }
    }
    Intent::Work
}

/// Keep the current economy task while it is valid (or while a retarget
/// cooldown set by the economy is running), otherwise choose afresh.
pub fn refresh_economy_task(agent: &Agent, world: &WorldSnapshot, now: SimTime) -> Intent {
    let current = agent.intent;
    if current.is_economy_task()
        && (now < agent.retarget_cooldown_until || task_still_valid(current, agent, world))
    {
        return current;
    }
    select_economy_task(agent, world)
}
