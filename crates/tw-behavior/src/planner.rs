//! The per-agent planner: primary goal, intent selection and the goal-intent
//! state machine.
//!
//! # Cadence
//!
//! [`Planner::advance_agent`] runs every tick (needs, movement, arrival).
//! [`Planner::plan_agent`] runs on AI ticks only and makes every decision.
//!
//! # Order inside `plan_agent`
//!
//! 1. Shift expiry: a hard override that drops work and excursions without
//!    running completion side effects.
//! 2. Waking up, and the morning shift reassignment.
//! 3. Intent selection from the pressure map (with commitment bonus).
//! 4. Goal transitions, only while not socializing, sleeping or
//!    travelling and once the dwell timer has run out.
//!
//! The planner works on a clone of the agent and patches it back, so other
//! agents planned later in the same tick see this agent's new state while
//! structure counters (workers, hotspot slots) are written through the
//! snapshot immediately.

use tracing::{debug, trace};

use tw_core::{AgentRng, DayPhase, NeedsConfig, PlannerConfig, SimClock, SimConfig, SimTime, StructureId, Vec2};
use tw_mobility::{MobilityEngine, NavTarget, StepOutcome};
use tw_nav::{NavGrid, Router};
use tw_world::{
    Activity, Agent, GoalIntent, GoalTarget, Intent, IntentKind, NeedKind, PrimaryGoal, ResourceKind, StructureKind,
    WorldSnapshot, Workplace,
};

use crate::hotspot::{choose_hotspot, leave, occupy, release_reservation, reserve};
use crate::needs::update_needs;
use crate::pressure::{pressures, select_intent};
use crate::tasks::refresh_economy_task;
use crate::{BehaviorError, BehaviorResult};

/// A sleeper wakes on their own once rested this well (outside the night).
pub const WAKE_SLEEP: f32 = 95.0;
/// Affinity above which another agent counts as a friend worth visiting.
pub const FRIEND_AFFINITY: f32 = 10.0;
/// Stability gained from buying a loaf at the store.
pub const STORE_STABILITY: f32 = 20.0;

const WANDER_ATTEMPTS: usize = 8;
const MOVE_SALT: u64 = 0x6d6f_7665;

/// Everything outside the snapshot the planner needs for one tick.
pub struct PlanContext<'a, R: Router> {
    pub grid: &'a NavGrid,
    pub mobility: &'a mut MobilityEngine<R>,
    pub clock: &'a SimClock,
}

/// Stateless apart from its configuration.
#[derive(Clone, Debug)]
pub struct Planner {
    cfg: PlannerConfig,
    needs: NeedsConfig,
    agent_radius: f32,
    margin: i32,
}

impl Planner {
    pub fn new(cfg: &SimConfig) -> Self {
        Self {
            cfg: cfg.planner.clone(),
            needs: cfg.needs.clone(),
            agent_radius: cfg.nav.agent_radius,
            margin: cfg.economy.influence_margin,
        }
    }

    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.cfg
    }

    // ── Per tick ──────────────────────────────────────────────────────────

    /// Needs, one movement step and the arrival transition.  Returns `true`
    /// if the agent changed.
    pub fn advance_agent<R: Router>(
        &self,
        slot: usize,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        dt_ms: u64,
    ) -> bool {
        let Some(mut agent) = world.agents.get(slot).cloned() else {
            return false;
        };
        let now = ctx.clock.now;
        update_needs(&mut agent, dt_ms, &self.needs);

        if agent.activity != Activity::Socializing && agent.nav.goal.is_some() {
            let mut rng = AgentRng::salted(world.seed, agent.id, ctx.clock.current_tick.0 ^ MOVE_SALT);
            let outcome = ctx.mobility.advance(&mut agent, dt_ms, ctx.grid, world, now, &mut rng);
            if outcome == StepOutcome::Arrived {
                self.handle_arrival(&mut agent, world, now);
            }
        }
        world.patch_agent(slot, agent)
    }

    // ── Per AI tick ───────────────────────────────────────────────────────

    /// Re-plan one agent.  Returns `true` if the agent changed.
    pub fn plan_agent<R: Router>(
        &self,
        slot: usize,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
    ) -> bool {
        let Some(mut agent) = world.agents.get(slot).cloned() else {
            return false;
        };
        let now = ctx.clock.now;
        let phase = ctx.clock.day_phase();
        let mut rng = AgentRng::salted(world.seed, agent.id, ctx.clock.current_tick.0);

        self.expire_shift(&mut agent, world, now);
        self.wake(&mut agent, world, now, phase);
        self.update_intent(&mut agent, world, now, phase);
        self.step_goal(&mut agent, world, ctx, &mut rng, phase);

        world.patch_agent(slot, agent)
    }

    fn expire_shift(&self, agent: &mut Agent, world: &mut WorldSnapshot, now: SimTime) {
        let PrimaryGoal::WorkShift { ends_at } = agent.primary_goal else {
            return;
        };
        if now < ends_at {
            return;
        }
        agent.primary_goal = PrimaryGoal::OffDuty;
        let on_excursion = agent.suspended_goal.take().is_some();
        if on_excursion || matches!(agent.goal, GoalIntent::GoWork | GoalIntent::BusyAtWork) {
            self.abandon_goal(agent, world);
        }
        debug!(agent = %agent.id, %now, on_excursion, "shift over");
    }

    fn wake(&self, agent: &mut Agent, world: &mut WorldSnapshot, now: SimTime, phase: DayPhase) {
        let morning = phase == DayPhase::Morning;
        if agent.activity == Activity::Sleeping {
            let rested = agent.needs.sleep >= WAKE_SLEEP && !phase.is_night();
            if !morning && !rested {
                return;
            }
            agent.activity = Activity::Idle;
            self.complete_goal(agent, world, now);
            trace!(agent = %agent.id, morning, "woke up");
        }
        if morning && agent.workplace.is_some() && agent.primary_goal == PrimaryGoal::OffDuty {
            self.start_shift(agent, now);
        }
    }

    fn start_shift(&self, agent: &mut Agent, now: SimTime) {
        agent.primary_goal = PrimaryGoal::WorkShift { ends_at: now.after_ms(self.cfg.shift_length_ms) };
        trace!(agent = %agent.id, "shift started");
    }

    fn is_hauler(&self, agent: &Agent, world: &WorldSnapshot) -> bool {
        agent
            .workplace
            .and_then(|id| world.structure(id))
            .is_some_and(|s| s.kind.is_logistics())
    }

    fn update_intent(&self, agent: &mut Agent, world: &WorldSnapshot, now: SimTime, phase: DayPhase) {
        let map = pressures(agent, now, phase);
        let kind = select_intent(&map, agent.intent.kind(), agent.intent_started, now, &self.cfg);
        let next = match kind {
            IntentKind::Work if self.is_hauler(agent, world) => refresh_economy_task(agent, world, now),
            IntentKind::SeekSleep => Intent::SeekSleep,
            IntentKind::SeekFun => Intent::SeekFun,
            IntentKind::SeekStability => Intent::SeekStability,
            IntentKind::Work => Intent::Work,
            IntentKind::Wandering => Intent::Wandering,
            IntentKind::Idle => Intent::Idle,
        };
        if next.kind() != agent.intent.kind() {
            trace!(agent = %agent.id, from = ?agent.intent, to = ?next, "intent changed");
            agent.intent_started = now;
        }
        agent.intent = next;
    }

    fn step_goal<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
        phase: DayPhase,
    ) {
        let now = ctx.clock.now;
        if matches!(agent.activity, Activity::Socializing | Activity::Sleeping | Activity::Traveling) {
            return;
        }
        if agent.goal.is_visit() && agent.goal_expires.is_some_and(|t| now >= t) {
            self.complete_goal(agent, world, now);
            return;
        }
        if now < agent.dwell_until {
            return;
        }

        if phase.is_night() {
            if agent.goal != GoalIntent::GoHome {
                agent.suspended_goal = None;
                self.go_home(agent, world, ctx, rng);
            }
            return;
        }

        if agent.workplace.is_some() && agent.is_on_shift(now) {
            self.step_work(agent, world, ctx, rng);
            return;
        }

        if matches!(agent.goal, GoalIntent::GoWork | GoalIntent::BusyAtWork) {
            self.abandon_goal(agent, world);
        }
        // A trip still waiting on its route, or a visit still running.
        if agent.goal != GoalIntent::Idle && (agent.nav.goal.is_some() || agent.goal.is_visit()) {
            return;
        }
        if agent.goal != GoalIntent::Idle {
            self.complete_goal(agent, world, now);
        }
        self.choose_leisure(agent, world, ctx, rng);
    }

    fn step_work<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) {
        match agent.goal {
            GoalIntent::GoWork if agent.nav.goal.is_some() => {}
            GoalIntent::BusyAtWork => self.busy_at_work(agent, world, ctx, rng),
            g if g.is_visit() && agent.suspended_goal.is_some() => {}
            _ => {
                if agent.goal != GoalIntent::Idle {
                    self.complete_goal(agent, world, ctx.clock.now);
                }
                self.go_work(agent, world, ctx, rng);
            }
        }
    }

    fn busy_at_work<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) {
        let now = ctx.clock.now;
        if rng.gen_bool(self.cfg.excursion_chance) && self.start_excursion(agent, world, ctx, rng) {
            return;
        }

        if self.is_hauler(agent, world) {
            if let Some(target) = agent.intent.target() {
                agent.goal_target = Some(GoalTarget::Structure(target));
                if world.in_influence(target, agent.pos, self.margin) {
                    agent.activity = Activity::Working;
                    agent.dwell_until = now.after_ms(self.cfg.settle_dwell_ms);
                } else if let Some(pos) = world.structure_center(target) {
                    self.travel(agent, NavTarget::structure(target, pos), world, ctx, rng);
                }
                return;
            }
        }

        let Some(workplace) = agent.workplace else { return };
        if !self.wander_around(agent, workplace, self.cfg.work_wander_tiles, world, ctx, rng) {
            agent.activity = Activity::Working;
            agent.dwell_until = now.after_ms(self.cfg.wander_dwell_ms);
        }
    }

    fn start_excursion<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) -> bool {
        let started = match rng.gen_range(0..3u8) {
            0 => self.start_visit(agent, &[StructureKind::Tavern], world, ctx, rng),
            1 => self.start_visit(agent, &[StructureKind::Plaza], world, ctx, rng),
            _ => self.visit_friend(agent, world, ctx, rng),
        };
        if started {
            agent.suspended_goal = Some(GoalIntent::BusyAtWork);
            debug!(agent = %agent.id, goal = ?agent.goal, "excursion from work");
        }
        started
    }

    fn choose_leisure<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) {
        let now = ctx.clock.now;
        if agent.workplace.is_none() && now >= agent.next_job_search {
            agent.next_job_search = now.after_ms(self.cfg.job_search_cooldown_ms);
            if self.search_job(agent, world, ctx, rng) {
                return;
            }
        }

        let kind = agent.intent.kind();
        let started = match kind {
            IntentKind::SeekSleep => {
                self.go_home(agent, world, ctx, rng);
                return;
            }
            IntentKind::SeekFun => {
                self.start_visit(agent, &[StructureKind::Tavern, StructureKind::Plaza], world, ctx, rng)
            }
            IntentKind::SeekStability => self.start_visit(agent, &[StructureKind::Store], world, ctx, rng),
            IntentKind::Wandering => {
                rng.gen_bool(self.cfg.leisure_chance) && self.visit_friend(agent, world, ctx, rng)
            }
            IntentKind::Work | IntentKind::Idle => false,
        };
        if started {
            return;
        }

        let restless = kind != IntentKind::Idle || rng.gen_bool(self.cfg.leisure_chance);
        let wandered = match agent.home {
            Some(home) if restless => {
                self.wander_around(agent, home, self.cfg.home_wander_tiles, world, ctx, rng)
            }
            _ => false,
        };
        if wandered {
            agent.goal = GoalIntent::WanderNearHome;
        } else {
            agent.activity = Activity::Idle;
            agent.dwell_until = now.after_ms(self.cfg.wander_dwell_ms);
        }
    }

    // ── Jobs ──────────────────────────────────────────────────────────────

    fn open_jobs<'w>(&self, world: &'w WorldSnapshot, clock: &SimClock) -> BehaviorResult<&'w [Workplace]> {
        let now = clock.current_tick;
        if !world.analysis.is_current(now) {
            return Err(BehaviorError::StaleAnalysis { computed_at: world.analysis.computed_at, now });
        }
        Ok(world.analysis.open_workplaces(now))
    }

    /// Take the nearest workplace that still has a free slot.
    fn search_job<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) -> bool {
        let mut ranked: Vec<(f32, StructureId)> = match self.open_jobs(world, ctx.clock) {
            Ok(jobs) => jobs.iter().map(|w| (w.pos.distance_sq(agent.pos), w.structure)).collect(),
            Err(e) => {
                debug!(agent = %agent.id, %e, "job search skipped");
                return false;
            }
        };
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        for (_, id) in ranked {
            let open = world
                .structure(id)
                .and_then(|s| world.catalog.get(s.kind).map(|spec| s.open_worker_slots(spec)))
                .unwrap_or(0);
            if open == 0 {
                continue;
            }
            let Some(s) = world.structure_mut(id) else { continue };
            s.workers.push(agent.id);
            agent.workplace = Some(id);
            self.start_shift(agent, ctx.clock.now);
            debug!(agent = %agent.id, workplace = %id, "hired");
            self.go_work(agent, world, ctx, rng);
            return true;
        }
        false
    }

    // ── Trips ─────────────────────────────────────────────────────────────

    /// Route towards `target`.  A structure target the agent already stands
    /// next to counts as an immediate arrival.
    fn travel<R: Router>(
        &self,
        agent: &mut Agent,
        target: NavTarget,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) {
        let now = ctx.clock.now;
        if target.structure.is_some_and(|id| world.in_influence(id, agent.pos, self.margin)) {
            agent.nav.clear();
            self.handle_arrival(agent, world, now);
            return;
        }
        if let Err(e) = ctx.mobility.request_navigation(agent, Some(target), ctx.grid, world, now, rng) {
            trace!(agent = %agent.id, %e, "trip deferred");
        }
    }

    fn go_home<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) {
        if agent.goal != GoalIntent::Idle {
            self.complete_goal(agent, world, ctx.clock.now);
        }
        let Some((home, pos)) = agent.home.and_then(|h| world.structure_center(h).map(|p| (h, p))) else {
            agent.activity = Activity::Idle;
            agent.dwell_until = ctx.clock.now.after_ms(self.cfg.wander_dwell_ms);
            return;
        };
        agent.goal = GoalIntent::GoHome;
        agent.goal_target = Some(GoalTarget::Structure(home));
        self.travel(agent, NavTarget::structure(home, pos), world, ctx, rng);
    }

    fn go_work<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) {
        let Some((wp, pos)) = agent.workplace.and_then(|w| world.structure_center(w).map(|p| (w, p))) else {
            return;
        };
        agent.goal = GoalIntent::GoWork;
        agent.goal_target = Some(GoalTarget::Structure(wp));
        self.travel(agent, NavTarget::structure(wp, pos), world, ctx, rng);
    }

    /// Reserve a hotspot slot and head there.
    fn start_visit<R: Router>(
        &self,
        agent: &mut Agent,
        kinds: &[StructureKind],
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) -> bool {
        let Some(id) = choose_hotspot(world, kinds, agent.pos, rng) else {
            return false;
        };
        let (Some(kind), Some(pos)) = (world.structure(id).map(|s| s.kind), world.structure_center(id)) else {
            return false;
        };
        if !reserve(world, id) {
            return false;
        }
        release_hotspot(agent, world);
        agent.reserved_hotspot = Some(id);
        agent.goal = match kind {
            StructureKind::Tavern => GoalIntent::VisitTavern,
            StructureKind::Store => GoalIntent::VisitStore,
            _ => GoalIntent::VisitPlaza,
        };
        agent.goal_target = Some(GoalTarget::Structure(id));
        // Until arrival this is the deadline for getting there.
        agent.goal_expires = Some(ctx.clock.now.after_ms(self.cfg.visit_duration_ms));
        trace!(agent = %agent.id, hotspot = %id, goal = ?agent.goal, "visit planned");
        self.travel(agent, NavTarget::structure(id, pos), world, ctx, rng);
        true
    }

    fn visit_friend<R: Router>(
        &self,
        agent: &mut Agent,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) -> bool {
        let friend = agent
            .social_memory
            .iter()
            .filter(|&(_, &v)| v > FRIEND_AFFINITY)
            .filter_map(|(&id, &v)| world.agent(id).map(|a| (id, v, a.pos)))
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)));
        let Some((id, _, pos)) = friend else {
            return false;
        };
        agent.goal = GoalIntent::VisitFriend;
        agent.goal_target = Some(GoalTarget::Agent(id));
        agent.goal_expires = Some(ctx.clock.now.after_ms(self.cfg.visit_duration_ms));
        self.travel(agent, NavTarget::point(pos), world, ctx, rng);
        true
    }

    /// Walk to a random clear tile within `radius` tiles of `anchor`'s door.
    /// Returns `false` when no such tile was found.
    fn wander_around<R: Router>(
        &self,
        agent: &mut Agent,
        anchor: StructureId,
        radius: i32,
        world: &mut WorldSnapshot,
        ctx: &mut PlanContext<'_, R>,
        rng: &mut AgentRng,
    ) -> bool {
        let ts = world.tile_size;
        let Some(origin) = world
            .structure(anchor)
            .and_then(|s| world.catalog.get(s.kind).map(|spec| s.door_tile(spec, ts)))
        else {
            return false;
        };
        let r = radius.max(1);
        let pick = (0..WANDER_ATTEMPTS)
            .map(|_| origin.offset(rng.gen_range(-r..=r), rng.gen_range(-r..=r)))
            .find(|p| ctx.grid.in_bounds(*p) && ctx.grid.has_clearance(p.x, p.y, self.agent_radius));
        let Some(tile) = pick else {
            return false;
        };
        agent.goal_target = Some(GoalTarget::Tile(tile));
        self.travel(agent, NavTarget::point(tile.center(ts)), world, ctx, rng);
        true
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Arrival transition, keyed by the goal intent.
    pub fn handle_arrival(&self, agent: &mut Agent, world: &mut WorldSnapshot, now: SimTime) {
        agent.vel = Vec2::ZERO;
        match agent.goal {
            GoalIntent::GoHome => {
                agent.activity = Activity::Sleeping;
            }
            GoalIntent::GoWork => {
                agent.goal = GoalIntent::BusyAtWork;
                agent.activity = Activity::Working;
                agent.dwell_until = now.after_ms(self.cfg.settle_dwell_ms);
            }
            GoalIntent::VisitTavern | GoalIntent::VisitPlaza | GoalIntent::VisitStore | GoalIntent::VisitFriend => {
                agent.activity = Activity::Visiting;
                agent.goal_expires = Some(now.after_ms(self.cfg.visit_duration_ms));
                if let Some(id) = agent.reserved_hotspot.take() {
                    occupy(world, id);
                    agent.visiting = Some(id);
                }
            }
            GoalIntent::BusyAtWork => {
                agent.goal_target = None;
                agent.activity = Activity::Working;
                agent.dwell_until = now.after_ms(self.cfg.wander_dwell_ms);
            }
            GoalIntent::WanderNearHome | GoalIntent::Idle => {
                agent.goal_target = None;
                agent.activity = Activity::Idle;
                agent.dwell_until = now.after_ms(self.cfg.wander_dwell_ms);
            }
        }
        trace!(agent = %agent.id, goal = ?agent.goal, "arrived");
    }

    /// Finish the current goal: visit side effects, slot release, reset to
    /// Idle.  A suspended work excursion is resumed as `GoWork`; the route is
    /// left for the movement step to request.
    pub fn complete_goal(&self, agent: &mut Agent, world: &mut WorldSnapshot, now: SimTime) {
        if agent.goal == GoalIntent::VisitStore {
            if let Some(store) = agent.visiting {
                let bought = world.structure_mut(store).map(|s| s.withdraw(ResourceKind::Bread, 1)).unwrap_or(0);
                if bought > 0 {
                    agent.needs.adjust(NeedKind::Stability, STORE_STABILITY);
                    world.bump_inventory_revision();
                }
            }
        }
        let resume = agent.suspended_goal.take();
        self.abandon_goal(agent, world);

        if resume.is_some() {
            if let Some((wp, pos)) = agent.workplace.and_then(|w| world.structure_center(w).map(|p| (w, p))) {
                agent.goal = GoalIntent::GoWork;
                agent.goal_target = Some(GoalTarget::Structure(wp));
                agent.nav.goal = Some(pos);
                agent.nav.goal_structure = Some(wp);
            }
        }
        trace!(agent = %agent.id, %now, resumed = resume.is_some(), "goal complete");
    }

    /// Drop the current goal with no side effects beyond giving back any
    /// hotspot slot.
    fn abandon_goal(&self, agent: &mut Agent, world: &mut WorldSnapshot) {
        release_hotspot(agent, world);
        agent.goal = GoalIntent::Idle;
        agent.goal_target = None;
        agent.goal_expires = None;
        agent.nav.clear();
        if matches!(agent.activity, Activity::Traveling | Activity::Visiting | Activity::Working) {
            agent.activity = Activity::Idle;
        }
    }
}

fn release_hotspot(agent: &mut Agent, world: &mut WorldSnapshot) {
    if let Some(id) = agent.reserved_hotspot.take() {
        release_reservation(world, id);
    }
    if let Some(id) = agent.visiting.take() {
        leave(world, id);
    }
}
