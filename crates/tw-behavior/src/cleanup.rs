//! Stale-reference cleanup.
//!
//! Structures can be removed between ticks by the placement layer.  This
//! pass nulls out every agent reference to a structure or agent that no
//! longer exists, and drops worker/resident entries that point at missing
//! agents, so the next tick's planner falls back to defaults instead of
//! chasing ghosts.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use tw_core::{AgentId, StructureId};
use tw_world::{Activity, Agent, GoalIntent, GoalTarget, Intent, PrimaryGoal, WorldSnapshot};

/// Clear dangling references.  The flag reports whether anything changed.
pub fn cleanup_stale_refs(mut world: WorldSnapshot) -> (WorldSnapshot, bool) {
    let structures: BTreeSet<StructureId> = world.structures.iter().map(|s| s.id).collect();
    let agents: BTreeSet<AgentId> = world.agents.iter().map(|a| a.id).collect();
    let mut changed = false;

    for slot in 0..world.agents.len() {
        let mut agent = world.agents[slot].clone();
        if scrub_agent(&mut agent, &structures, &agents) {
            changed |= world.patch_agent(slot, agent);
        }
    }

    let needs_scrub = world.structures.iter().any(|s| {
        s.workers.iter().chain(s.residents.iter()).any(|a| !agents.contains(a))
            || s.workers.iter().any(|&a| world.agent(a).is_some_and(|ag| ag.workplace != Some(s.id)))
    });
    if needs_scrub {
        let snapshot_agents = Arc::clone(&world.agents);
        for s in Arc::make_mut(&mut world.structures).iter_mut() {
            let id = s.id;
            s.workers.retain(|&a| {
                snapshot_agents.iter().any(|ag| ag.id == a && ag.workplace == Some(id))
            });
            s.residents.retain(|a| agents.contains(a));
        }
        changed = true;
    }

    if changed {
        debug!("stale references cleared");
    }
    (world, changed)
}

fn scrub_agent(agent: &mut Agent, structures: &BTreeSet<StructureId>, agents: &BTreeSet<AgentId>) -> bool {
    let gone = |id: Option<StructureId>| id.is_some_and(|s| !structures.contains(&s));
    let mut dirty = false;

    if gone(agent.home) {
        agent.home = None;
        dirty = true;
    }
    if gone(agent.workplace) {
        agent.workplace = None;
        agent.primary_goal = PrimaryGoal::OffDuty;
        agent.suspended_goal = None;
        dirty = true;
    }
    if gone(agent.reserved_hotspot) {
        agent.reserved_hotspot = None;
        dirty = true;
    }
    if gone(agent.visiting) {
        agent.visiting = None;
        dirty = true;
    }
    if gone(agent.intent.target()) {
        agent.intent = Intent::Idle;
        dirty = true;
    }
    if gone(agent.nav.goal_structure) {
        agent.nav.clear();
        dirty = true;
    }

    let target_gone = match agent.goal_target {
        Some(GoalTarget::Structure(s)) => !structures.contains(&s),
        Some(GoalTarget::Agent(a)) => !agents.contains(&a),
        Some(GoalTarget::Tile(_)) | None => false,
    };
    if target_gone {
        agent.goal = GoalIntent::Idle;
        agent.goal_target = None;
        agent.goal_expires = None;
        agent.nav.clear();
        if matches!(agent.activity, Activity::Traveling | Activity::Visiting | Activity::Working) {
            agent.activity = Activity::Idle;
        }
        dirty = true;
    }

    if agent.social.partner.is_some_and(|p| !agents.contains(&p)) {
        agent.social.partner = None;
        dirty = true;
    }
    let before = agent.social_memory.len();
    agent.social_memory.retain(|id, _| agents.contains(id));
    dirty |= agent.social_memory.len() != before;
    dirty
}
