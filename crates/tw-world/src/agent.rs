//! Agent records: needs, personality, intents and per-agent bookkeeping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use tw_core::{AgentId, AgentRng, FieldId, SimTime, StructureId, TilePos, Vec2};

use crate::catalog::ResourceKind;

// ── Needs ─────────────────────────────────────────────────────────────────────

/// Upper bound of every need and of every affinity magnitude.
pub const NEED_MAX: f32 = 100.0;

/// The five homeostatic needs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NeedKind {
    Sleep,
    Stability,
    Social,
    Fun,
    Stimulation,
}

impl NeedKind {
    pub const ALL: [NeedKind; 5] = [
        NeedKind::Sleep,
        NeedKind::Stability,
        NeedKind::Social,
        NeedKind::Fun,
        NeedKind::Stimulation,
    ];
}

/// Need levels; 100 is fully satisfied.  Every field stays in `[0, 100]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    pub sleep: f32,
    pub stability: f32,
    pub social: f32,
    pub fun: f32,
    pub stimulation: f32,
}

impl Default for Needs {
    fn default() -> Self {
        Self { sleep: 80.0, stability: 70.0, social: 60.0, fun: 60.0, stimulation: 60.0 }
    }
}

impl Needs {
    pub fn get(&self, kind: NeedKind) -> f32 {
        match kind {
            NeedKind::Sleep => self.sleep,
            NeedKind::Stability => self.stability,
            NeedKind::Social => self.social,
            NeedKind::Fun => self.fun,
            NeedKind::Stimulation => self.stimulation,
        }
    }

    fn slot(&mut self, kind: NeedKind) -> &mut f32 {
        match kind {
            NeedKind::Sleep => &mut self.sleep,
            NeedKind::Stability => &mut self.stability,
            NeedKind::Social => &mut self.social,
            NeedKind::Fun => &mut self.fun,
            NeedKind::Stimulation => &mut self.stimulation,
        }
    }

    /// Add `delta` and clamp to `[0, 100]`.  Non-finite deltas are ignored.
    pub fn adjust(&mut self, kind: NeedKind, delta: f32) {
        if !delta.is_finite() {
            return;
        }
        let v = self.slot(kind);
        *v = (*v + delta).clamp(0.0, NEED_MAX);
    }

    /// Mean of sleep, stability, social and fun.
    pub fn mood(&self) -> f32 {
        (self.sleep + self.stability + self.social + self.fun) / 4.0
    }
}

// ── Personality ───────────────────────────────────────────────────────────────

/// Five bounded traits in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Personality {
    pub openness: f32,
    pub conscientiousness: f32,
    pub extraversion: f32,
    pub agreeableness: f32,
    pub neuroticism: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }
}

impl Personality {
    pub fn random(rng: &mut AgentRng) -> Self {
        Self {
            openness: rng.gen_range(0.0..=1.0),
            conscientiousness: rng.gen_range(0.0..=1.0),
            extraversion: rng.gen_range(0.0..=1.0),
            agreeableness: rng.gen_range(0.0..=1.0),
            neuroticism: rng.gen_range(0.0..=1.0),
        }
    }

    /// Scales the chance of speaking in a social field.
    #[inline]
    pub fn expressiveness(&self) -> f32 {
        (0.3 + 0.7 * self.extraversion).clamp(0.0, 1.0)
    }
}

// ── Intents ───────────────────────────────────────────────────────────────────

/// The need-driven current intent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    SeekSleep,
    SeekFun,
    SeekStability,
    Work,
    GetResource { target: StructureId, resource: ResourceKind },
    StoreResource { target: StructureId },
    Construct { target: StructureId },
    #[default]
    Idle,
    Wandering,
}

impl Intent {
    /// Pressure-map key.  Economy tasks are refinements of `Work`.
    pub fn kind(self) -> IntentKind {
        match self {
            Intent::SeekSleep => IntentKind::SeekSleep,
            Intent::SeekFun => IntentKind::SeekFun,
            Intent::SeekStability => IntentKind::SeekStability,
            Intent::Work
            | Intent::GetResource { .. }
            | Intent::StoreResource { .. }
            | Intent::Construct { .. } => IntentKind::Work,
            Intent::Wandering => IntentKind::Wandering,
            Intent::Idle => IntentKind::Idle,
        }
    }

    /// Structure this intent walks to, if any.
    pub fn target(self) -> Option<StructureId> {
        match self {
            Intent::GetResource { target, .. }
            | Intent::StoreResource { target }
            | Intent::Construct { target } => Some(target),
            _ => None,
        }
    }

    #[inline]
    pub fn is_economy_task(self) -> bool {
        self.target().is_some()
    }
}

/// Keys of the transient pressure map.  Declaration order is the explicit
/// tie-break: on an exact tie the earlier variant wins.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntentKind {
    SeekSleep,
    SeekFun,
    SeekStability,
    Work,
    Wandering,
    Idle,
}

/// Primary goal: on or off the clock.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimaryGoal {
    #[default]
    OffDuty,
    WorkShift { ends_at: SimTime },
}

/// The navigation-driving goal intent.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalIntent {
    #[default]
    Idle,
    GoHome,
    GoWork,
    BusyAtWork,
    VisitTavern,
    VisitPlaza,
    VisitStore,
    VisitFriend,
    WanderNearHome,
}

impl GoalIntent {
    #[inline]
    pub fn is_visit(self) -> bool {
        matches!(
            self,
            GoalIntent::VisitTavern | GoalIntent::VisitPlaza | GoalIntent::VisitStore | GoalIntent::VisitFriend
        )
    }
}

/// What a goal intent points at.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalTarget {
    Structure(StructureId),
    Agent(AgentId),
    Tile(TilePos),
}

/// What the agent is physically doing right now.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Activity {
    #[default]
    Idle,
    Traveling,
    Sleeping,
    Socializing,
    Visiting,
    Working,
}

// ── Scratch state ─────────────────────────────────────────────────────────────

/// Path-following scratch state.  Not persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NavState {
    /// Packed tile coordinates (see [`TilePos::pack`]).
    pub path: Vec<u32>,
    pub index: usize,
    /// Where the current request is headed, world units.
    pub goal: Option<Vec2>,
    /// Structure the current request is headed for, if any.
    pub goal_structure: Option<StructureId>,
    pub no_progress_ms: u64,
    /// No new request before this time (set after a failed plan).
    pub repath_at: SimTime,
}

impl NavState {
    #[inline]
    pub fn has_path(&self) -> bool {
        self.index < self.path.len()
    }

    pub fn clear(&mut self) {
        self.path.clear();
        self.index = 0;
        self.goal = None;
        self.goal_structure = None;
        self.no_progress_ms = 0;
    }
}

/// Short conversational signals.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Emoji {
    Smile,
    Laugh,
    Heart,
    Music,
    Thinking,
    Wave,
    Yawn,
    Grumble,
    Angry,
}

impl Emoji {
    /// Contribution to an encounter's valence.
    pub fn valence(self) -> i32 {
        match self {
            Emoji::Laugh | Emoji::Heart => 2,
            Emoji::Smile | Emoji::Music | Emoji::Wave => 1,
            Emoji::Thinking => 0,
            Emoji::Yawn => -1,
            Emoji::Grumble | Emoji::Angry => -2,
        }
    }
}

/// Social bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialState {
    pub field: Option<FieldId>,
    pub partner: Option<AgentId>,
    pub started: SimTime,
    pub ends: SimTime,
    pub last_social: SimTime,
    pub last_bump: SimTime,
    pub emoji: Option<Emoji>,
    pub emoji_until: SimTime,
    /// Sum of emoji valences seen during the current encounter.
    pub encounter_valence: i32,
}

impl SocialState {
    #[inline]
    pub fn has_active_emoji(&self, now: SimTime) -> bool {
        self.emoji.is_some() && now < self.emoji_until
    }
}

/// Goods in hand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarriedItem {
    pub resource: ResourceKind,
    pub quantity: u32,
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// One townsperson.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Short id: dense index, stable for the agent's lifetime.
    pub id: AgentId,
    /// Stable identity string.
    pub uid: String,
    pub pos: Vec2,
    pub vel: Vec2,
    pub personality: Personality,
    pub needs: Needs,

    pub intent: Intent,
    pub intent_started: SimTime,

    pub primary_goal: PrimaryGoal,
    pub goal: GoalIntent,
    pub goal_target: Option<GoalTarget>,
    pub goal_expires: Option<SimTime>,
    pub activity: Activity,
    /// Goal transitions wait until this time.
    pub dwell_until: SimTime,
    /// Goal to resume when a work excursion completes.
    pub suspended_goal: Option<GoalIntent>,
    /// Hotspot slot held while travelling to it.
    pub reserved_hotspot: Option<StructureId>,
    /// Hotspot currently occupied.
    pub visiting: Option<StructureId>,

    pub nav: NavState,
    pub social: SocialState,

    pub carrying: Option<CarriedItem>,
    pub workplace: Option<StructureId>,
    pub home: Option<StructureId>,
    pub next_job_search: SimTime,
    pub retarget_cooldown_until: SimTime,

    /// Opinion of other agents in `[-100, 100]`.
    pub social_memory: BTreeMap<AgentId, f32>,
}

impl Agent {
    pub fn new(id: AgentId, uid: impl Into<String>, pos: Vec2) -> Self {
        Self {
            id,
            uid: uid.into(),
            pos,
            vel: Vec2::ZERO,
            personality: Personality::default(),
            needs: Needs::default(),
            intent: Intent::Idle,
            intent_started: SimTime::ZERO,
            primary_goal: PrimaryGoal::OffDuty,
            goal: GoalIntent::Idle,
            goal_target: None,
            goal_expires: None,
            activity: Activity::Idle,
            dwell_until: SimTime::ZERO,
            suspended_goal: None,
            reserved_hotspot: None,
            visiting: None,
            nav: NavState::default(),
            social: SocialState::default(),
            carrying: None,
            workplace: None,
            home: None,
            next_job_search: SimTime::ZERO,
            retarget_cooldown_until: SimTime::ZERO,
            social_memory: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn is_on_shift(&self, now: SimTime) -> bool {
        matches!(self.primary_goal, PrimaryGoal::WorkShift { ends_at } if now < ends_at)
    }

    /// Opinion of `other`, zero when unknown.
    #[inline]
    pub fn affinity(&self, other: AgentId) -> f32 {
        self.social_memory.get(&other).copied().unwrap_or(0.0)
    }

    /// Shift the opinion of `other` by `delta`, clamped to `[-100, 100]`.
    pub fn adjust_affinity(&mut self, other: AgentId, delta: f32) {
        if other == self.id || delta == 0.0 || !delta.is_finite() {
            return;
        }
        let v = self.social_memory.entry(other).or_insert(0.0);
        *v = (*v + delta).clamp(-NEED_MAX, NEED_MAX);
    }

    /// Quantity in hand (zero when empty-handed).
    #[inline]
    pub fn carried_qty(&self) -> u32 {
        self.carrying.map(|c| c.quantity).unwrap_or(0)
    }
}
