//! Tagged phases and the ordered pipeline that runs them.
//!
//! Ordering rules are data, not file order: every [`PhaseTag`] names the
//! tags it must follow (when both are present) and the tags it cannot run
//! without.  [`Pipeline::new`] rejects any list that breaks a rule.

use tracing::{info, trace};

use tw_core::{SimClock, SimRng};
use tw_mobility::MobilityEngine;
use tw_nav::{NavGrid, Router};
use tw_world::WorldSnapshot;

use crate::{SimError, SimObserver, SimResult};

/// Identity of a phase kind.  Declaration order is the standard order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PhaseTag {
    /// Needs decay, movement and arrival.
    Needs,
    SocialField,
    Gossip,
    Emission,
    Relationship,
    /// Workplace availability and the POI Index.
    WorldAnalysis,
    AgentIntent,
    Economy,
    Cleanup,
}

impl PhaseTag {
    /// Tags that must come earlier whenever both are in the pipeline.
    pub fn must_follow(self) -> &'static [PhaseTag] {
        use PhaseTag::*;
        match self {
            Needs | SocialField | WorldAnalysis => &[],
            Gossip | Emission => &[SocialField],
            Relationship => &[SocialField, Gossip, Emission],
            AgentIntent => &[WorldAnalysis, Needs],
            Economy => &[AgentIntent, WorldAnalysis],
            Cleanup => &[Needs, SocialField, Gossip, Emission, Relationship, WorldAnalysis, AgentIntent, Economy],
        }
    }

    /// Tags that must be present at all.
    pub fn requires(self) -> &'static [PhaseTag] {
        match self {
            PhaseTag::AgentIntent => &[PhaseTag::WorldAnalysis],
            _ => &[],
        }
    }
}

/// Everything outside the snapshot a phase may touch.
pub struct TickContext<'a, R: Router> {
    pub grid: &'a NavGrid,
    pub mobility: &'a mut MobilityEngine<R>,
    pub clock: &'a SimClock,
    pub rng: &'a mut SimRng,
    pub dt_ms: u64,
}

impl<R: Router> TickContext<'_, R> {
    /// Planning and social triggers fire on this tick.
    #[inline]
    pub fn is_ai_tick(&self) -> bool {
        self.clock.is_ai_tick()
    }
}

/// Result of running one phase.
pub struct PhaseOutput {
    pub world: WorldSnapshot,
    pub changed: bool,
}

impl PhaseOutput {
    pub fn new(world: WorldSnapshot, changed: bool) -> Self {
        Self { world, changed }
    }

    pub fn unchanged(world: WorldSnapshot) -> Self {
        Self { world, changed: false }
    }
}

/// One step of a tick: takes the snapshot the previous phase produced and
/// returns the next one.
pub trait Phase<R: Router> {
    fn tag(&self) -> PhaseTag;

    fn run(&mut self, world: WorldSnapshot, ctx: &mut TickContext<'_, R>) -> PhaseOutput;
}

/// A validated, ordered list of phases.
pub struct Pipeline<R: Router> {
    phases: Vec<Box<dyn Phase<R>>>,
}

impl<R: Router> Pipeline<R> {
    pub fn new(phases: Vec<Box<dyn Phase<R>>>) -> SimResult<Self> {
        let tags: Vec<PhaseTag> = phases.iter().map(|p| p.tag()).collect();
        validate(&tags)?;
        info!(phases = ?tags, "pipeline constructed");
        Ok(Self { phases })
    }

    pub fn tags(&self) -> Vec<PhaseTag> {
        self.phases.iter().map(|p| p.tag()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.phases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Run every phase in order.  Returns the final snapshot and how many
    /// phases changed it.
    pub fn run<O: SimObserver>(
        &mut self,
        mut world: WorldSnapshot,
        ctx: &mut TickContext<'_, R>,
        observer: &mut O,
    ) -> (WorldSnapshot, usize) {
        let tick = ctx.clock.current_tick;
        let mut changed = 0;
        for phase in &mut self.phases {
            let tag = phase.tag();
            let out = phase.run(world, ctx);
            world = out.world;
            if out.changed {
                changed += 1;
            }
            trace!(%tick, ?tag, changed = out.changed, "phase done");
            observer.on_phase_end(tick, tag, out.changed);
        }
        (world, changed)
    }
}

/// Check a tag sequence against the ordering rules.
pub fn validate(tags: &[PhaseTag]) -> SimResult<()> {
    for (i, &tag) in tags.iter().enumerate() {
        if tags[..i].contains(&tag) {
            return Err(SimError::DuplicatePhase(tag));
        }
        for &req in tag.requires() {
            if !tags.contains(&req) {
                return Err(SimError::MissingPhase { phase: tag, requires: req });
            }
        }
        for &after in tag.must_follow() {
            if tags[i + 1..].contains(&after) {
                return Err(SimError::PhaseOrder { phase: tag, after });
            }
        }
    }
    Ok(())
}
