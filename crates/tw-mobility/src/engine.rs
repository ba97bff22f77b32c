//! Navigation requests and per-tick path following.

use tracing::{debug, trace};

use tw_core::{AgentRng, NavConfig, PlannerConfig, SimTime, StructureId, Vec2};
use tw_nav::{NavGrid, RouteMode, RouteRequest, Router};
use tw_world::{Activity, Agent, WorldSnapshot};

use crate::movement::{current_waypoint, step_towards};
use crate::{MobilityError, MobilityResult};

/// Where a navigation request is headed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NavTarget {
    pub pos: Vec2,
    /// Route to this structure's door rather than `pos`'s tile.
    pub structure: Option<StructureId>,
}

impl NavTarget {
    pub fn point(pos: Vec2) -> Self {
        Self { pos, structure: None }
    }

    pub fn structure(id: StructureId, pos: Vec2) -> Self {
        Self { pos, structure: Some(id) }
    }
}

/// Result of one movement step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// No goal.
    Idle,
    /// Goal recorded but no path yet (repath cooldown running).
    Waiting,
    Moving,
    /// Reached the final waypoint this step; navigation state is cleared.
    Arrived,
    /// No progress for too long; a fresh route was requested.
    Replanned,
}

/// Movement tuning pulled out of the planner config.
#[derive(Copy, Clone, Debug)]
struct Kinematics {
    walk_speed: f32,
    arrival_radius: f32,
    jitter: f32,
    stuck_threshold_ms: u64,
    stuck_epsilon: f32,
    repath_min_ms: u64,
    repath_max_ms: u64,
    agent_radius: f32,
}

/// Wraps a [`Router`] and drives agents along the paths it returns.
///
/// # Type parameter
///
/// `R` must implement [`Router`] (e.g. [`tw_nav::GridRouter`]).
pub struct MobilityEngine<R: Router> {
    pub router: R,
    k: Kinematics,
}

impl<R: Router> MobilityEngine<R> {
    pub fn new(router: R, planner: &PlannerConfig, nav: &NavConfig) -> Self {
        Self {
            router,
            k: Kinematics {
                walk_speed: planner.walk_speed,
                arrival_radius: planner.arrival_radius,
                jitter: planner.jitter,
                stuck_threshold_ms: planner.stuck_threshold_ms,
                stuck_epsilon: planner.stuck_epsilon,
                repath_min_ms: planner.repath_cooldown_min_ms,
                repath_max_ms: planner.repath_cooldown_max_ms.max(planner.repath_cooldown_min_ms),
                agent_radius: nav.agent_radius,
            },
        }
    }

    /// Clear the agent's path and, if `target` is given, route to it.
    ///
    /// On success the agent is marked `Traveling` and the route mode is
    /// returned.  On failure a randomised repath cooldown is set; the goal is
    /// kept so [`MobilityEngine::advance`] retries once it expires.
    pub fn request_navigation(
        &mut self,
        agent: &mut Agent,
        target: Option<NavTarget>,
        grid: &NavGrid,
        world: &WorldSnapshot,
        now: SimTime,
        rng: &mut AgentRng,
    ) -> MobilityResult<Option<RouteMode>> {
        agent.nav.clear();
        let Some(target) = target else {
            agent.vel = Vec2::ZERO;
            return Ok(None);
        };
        agent.nav.goal = Some(target.pos);
        agent.nav.goal_structure = target.structure;

        if now < agent.nav.repath_at {
            return Err(MobilityError::CoolingDown { agent: agent.id, until: agent.nav.repath_at });
        }

        let req = RouteRequest {
            start: agent.pos,
            target: target.pos,
            target_structure: target.structure,
            clearance: self.k.agent_radius,
        };
        match self.router.route(grid, world, &req) {
            Ok(plan) => {
                trace!(agent = %agent.id, mode = ?plan.mode, len = plan.waypoints.len(), "route planned");
                agent.nav.path = plan.waypoints;
                agent.activity = Activity::Traveling;
                Ok(Some(plan.mode))
            }
            Err(e) => {
                let wait = rng.gen_range(self.k.repath_min_ms..=self.k.repath_max_ms);
                agent.nav.repath_at = now.after_ms(wait);
                trace!(agent = %agent.id, wait, "route failed; backing off");
                Err(e.into())
            }
        }
    }

    /// Move one step along the current path.  Never routes.
    ///
    /// Steps that would enter a blocked tile are refused (the grid may have
    /// changed under the path); the no-progress timer then runs until the
    /// stuck threshold.
    pub fn step_agent(&self, agent: &mut Agent, dt_ms: u64, grid: &NavGrid) -> StepOutcome {
        let ts = grid.tile_size();
        let Some(wp) = current_waypoint(agent, ts, self.k.jitter) else {
            agent.vel = Vec2::ZERO;
            return if agent.nav.goal.is_some() { StepOutcome::Waiting } else { StepOutcome::Idle };
        };

        let dt_s = dt_ms as f32 / 1000.0;
        let before = agent.pos.distance(wp);
        let mut next = step_towards(agent.pos, wp, self.k.walk_speed * dt_s);

        let here = agent.pos.to_tile(ts);
        let there = next.to_tile(ts);
        if there != here && grid.is_walkable(here.x, here.y) && !grid.is_walkable(there.x, there.y) {
            next = agent.pos;
        }

        agent.vel = if dt_s > 0.0 { (next - agent.pos) * (1.0 / dt_s) } else { Vec2::ZERO };
        agent.pos = next;
        let after = next.distance(wp);

        if after <= self.k.arrival_radius {
            agent.nav.index += 1;
            agent.nav.no_progress_ms = 0;
            if agent.nav.index >= agent.nav.path.len() {
                agent.nav.clear();
                agent.vel = Vec2::ZERO;
                return StepOutcome::Arrived;
            }
            return StepOutcome::Moving;
        }

        if before - after < self.k.stuck_epsilon {
            agent.nav.no_progress_ms += dt_ms;
        } else {
            agent.nav.no_progress_ms = 0;
        }
        StepOutcome::Moving
    }

    /// `true` once the no-progress timer has run past the threshold.
    #[inline]
    pub fn is_stuck(&self, agent: &Agent) -> bool {
        agent.nav.no_progress_ms > self.k.stuck_threshold_ms
    }

    /// One tick of movement: retry a pending request whose cooldown has
    /// expired, step, and replan from scratch if stuck.
    pub fn advance(
        &mut self,
        agent: &mut Agent,
        dt_ms: u64,
        grid: &NavGrid,
        world: &WorldSnapshot,
        now: SimTime,
        rng: &mut AgentRng,
    ) -> StepOutcome {
        if !agent.nav.has_path() && now >= agent.nav.repath_at {
            if let Some(pos) = agent.nav.goal {
                let target = NavTarget { pos, structure: agent.nav.goal_structure };
                if let Err(err) = self.request_navigation(agent, Some(target), grid, world, now, rng) {
                    debug!(agent = %agent.id, %err, "retry failed");
                }
            }
        }

        let outcome = self.step_agent(agent, dt_ms, grid);
        if outcome == StepOutcome::Moving && self.is_stuck(agent) {
            if let Some(pos) = agent.nav.goal {
                trace!(agent = %agent.id, "stuck; replanning");
                let target = NavTarget { pos, structure: agent.nav.goal_structure };
                agent.nav.repath_at = SimTime::ZERO;
                if let Err(err) = self.request_navigation(agent, Some(target), grid, world, now, rng) {
                    debug!(agent = %agent.id, %err, "replan failed");
                }
                return StepOutcome::Replanned;
            }
        }
        outcome
    }
}
