//! The concrete phases and the standard pipeline.
//!
//! | Tag             | Every tick                     | AI ticks only                  |
//! |-----------------|--------------------------------|--------------------------------|
//! | `Needs`         | needs, movement, arrival       |                                |
//! | `SocialField`   | field decay and dissolution    | formation, bump greetings      |
//! | `Gossip`        |                                | opinion spillover              |
//! | `Emission`      |                                | one emoji per field            |
//! | `Relationship`  | encounter resolution, decay    |                                |
//! | `WorldAnalysis` | POI Index refresh              | workplace/hotspot analysis     |
//! | `AgentIntent`   |                                | intent and goal planning       |
//! | `Economy`       | hauling, production, building  |                                |
//! | `Cleanup`       | stale-reference cleanup        |                                |

use tracing::debug;

use tw_behavior::{cleanup_stale_refs, PlanContext, Planner};
use tw_core::SimConfig;
use tw_economy::EconomyEngine;
use tw_nav::Router;
use tw_social::SocialEngine;
use tw_world::WorldSnapshot;

use crate::{Phase, PhaseOutput, PhaseTag, Pipeline, SimResult, TickContext};

fn plan_context<'a, R: Router>(ctx: &'a mut TickContext<'_, R>) -> PlanContext<'a, R> {
    PlanContext { grid: ctx.grid, mobility: &mut *ctx.mobility, clock: ctx.clock }
}

// ── Needs and movement ────────────────────────────────────────────────────────

pub struct NeedsPhase {
    planner: Planner,
}

impl NeedsPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { planner: Planner::new(cfg) }
    }
}

impl<R: Router> Phase<R> for NeedsPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::Needs
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        let dt = ctx.dt_ms;
        let mut plan = plan_context(ctx);
        let mut changed = false;
        for slot in 0..world.agents.len() {
            changed |= self.planner.advance_agent(slot, &mut world, &mut plan, dt);
        }
        if changed {
            // Positions moved: the spatial hash must follow before social
            // proximity queries.
            world.refresh_indices();
        }
        PhaseOutput::new(world, changed)
    }
}

// ── Social ────────────────────────────────────────────────────────────────────

pub struct SocialFieldPhase {
    engine: SocialEngine,
}

impl SocialFieldPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { engine: SocialEngine::new(&cfg.social) }
    }
}

impl<R: Router> Phase<R> for SocialFieldPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::SocialField
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        let now = ctx.clock.now;
        let dissolved = self.engine.update_fields(&mut world, ctx.dt_ms, now);
        let (mut formed, mut bumps) = (0, 0);
        if ctx.is_ai_tick() {
            formed = self.engine.form_fields(&mut world, now);
            bumps = self.engine.bump_greetings(&mut world, now);
        }
        let changed = !world.fields.is_empty() || dissolved + formed + bumps > 0;
        if formed + dissolved > 0 {
            debug!(formed, dissolved, live = world.fields.len(), "social fields");
        }
        PhaseOutput::new(world, changed)
    }
}

pub struct GossipPhase {
    engine: SocialEngine,
}

impl GossipPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { engine: SocialEngine::new(&cfg.social) }
    }
}

impl<R: Router> Phase<R> for GossipPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::Gossip
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        if !ctx.is_ai_tick() || world.fields.is_empty() {
            return PhaseOutput::unchanged(world);
        }
        let moved = self.engine.gossip(&mut world, ctx.rng);
        PhaseOutput::new(world, moved > 0)
    }
}

pub struct EmissionPhase {
    engine: SocialEngine,
}

impl EmissionPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { engine: SocialEngine::new(&cfg.social) }
    }
}

impl<R: Router> Phase<R> for EmissionPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::Emission
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        if !ctx.is_ai_tick() || world.fields.is_empty() {
            return PhaseOutput::unchanged(world);
        }
        let emitted = self.engine.emit(&mut world, ctx.clock.now, ctx.rng);
        PhaseOutput::new(world, emitted > 0)
    }
}

pub struct RelationshipPhase {
    engine: SocialEngine,
}

impl RelationshipPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { engine: SocialEngine::new(&cfg.social) }
    }
}

impl<R: Router> Phase<R> for RelationshipPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::Relationship
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        let resolved = self.engine.resolve_encounters(&mut world);
        let decayed = self.engine.decay_affinity(&mut world, ctx.dt_ms);
        PhaseOutput::new(world, resolved > 0 || decayed)
    }
}

// ── Analysis and planning ─────────────────────────────────────────────────────

/// Recomputes the workplace/hotspot analysis on AI ticks so the planner
/// sees one stamped with the current tick, and keeps the POI Index in step
/// with the revisions.
#[derive(Default)]
pub struct WorldAnalysisPhase;

impl<R: Router> Phase<R> for WorldAnalysisPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::WorldAnalysis
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        let mut changed = world.refresh_poi_index();
        if ctx.is_ai_tick() {
            world.refresh_analysis(ctx.clock.current_tick);
            changed = true;
        }
        PhaseOutput::new(world, changed)
    }
}

pub struct AgentIntentPhase {
    planner: Planner,
}

impl AgentIntentPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { planner: Planner::new(cfg) }
    }
}

impl<R: Router> Phase<R> for AgentIntentPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::AgentIntent
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        if !ctx.is_ai_tick() {
            return PhaseOutput::unchanged(world);
        }
        let mut plan = plan_context(ctx);
        let mut changed = false;
        for slot in 0..world.agents.len() {
            changed |= self.planner.plan_agent(slot, &mut world, &mut plan);
        }
        PhaseOutput::new(world, changed)
    }
}

// ── Economy and cleanup ───────────────────────────────────────────────────────

pub struct EconomyPhase {
    engine: EconomyEngine,
}

impl EconomyPhase {
    pub fn new(cfg: &SimConfig) -> Self {
        Self { engine: EconomyEngine::new(&cfg.economy) }
    }
}

impl<R: Router> Phase<R> for EconomyPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::Economy
    }

    fn run(&mut self, mut world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        let before = world.revisions;
        let report = self.engine.step(&mut world, ctx.dt_ms, ctx.clock.now);
        let changed = report.inventory_changed() || report.retargeted > 0 || world.revisions != before;
        PhaseOutput::new(world, changed)
    }
}

#[derive(Default)]
pub struct CleanupPhase;

impl<R: Router> Phase<R> for CleanupPhase {
    fn tag(&self) -> PhaseTag {
        PhaseTag::Cleanup
    }

    fn run(&mut self, world: WorldSnapshot, _ctx: &mut TickContext<'_, R>) -> PhaseOutput {
        let (world, changed) = cleanup_stale_refs(world);
        PhaseOutput::new(world, changed)
    }
}

// ── Standard pipeline ─────────────────────────────────────────────────────────

/// Every phase, in [`PhaseTag`] order.
pub fn standard_phases<R: Router>(cfg: &SimConfig) -> Vec<Box<dyn Phase<R>>> {
    vec![
        Box::new(NeedsPhase::new(cfg)),
        Box::new(SocialFieldPhase::new(cfg)),
        Box::new(GossipPhase::new(cfg)),
        Box::new(EmissionPhase::new(cfg)),
        Box::new(RelationshipPhase::new(cfg)),
        Box::new(WorldAnalysisPhase),
        Box::new(AgentIntentPhase::new(cfg)),
        Box::new(EconomyPhase::new(cfg)),
        Box::new(CleanupPhase),
    ]
}

impl<R: Router> Pipeline<R> {
    pub fn standard(cfg: &SimConfig) -> SimResult<Self> {
        Pipeline::new(standard_phases(cfg))
    }
}
