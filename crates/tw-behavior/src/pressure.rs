//! Transient pressure map and winner-take-all intent selection.
//!
//! Pressures live in `[0, 1]`.  The current intent's entry gets a fixed
//! bonus while it is younger than the commitment window, so two
//! similarly-scored intents do not alternate tick by tick.  Exact ties go to
//! the earlier `IntentKind` variant.

use std::collections::BTreeMap;

use tw_core::{DayPhase, PlannerConfig, SimTime};
use tw_world::{Agent, IntentKind, Needs};

pub type PressureMap = BTreeMap<IntentKind, f32>;

#[inline]
fn deficit(v: f32) -> f32 {
    ((100.0 - v) / 100.0).clamp(0.0, 1.0)
}

/// Pressures derived from needs, shift status and time of day.
pub fn pressures(agent: &Agent, now: SimTime, phase: DayPhase) -> PressureMap {
    let n: &Needs = &agent.needs;
    let night = if phase.is_night() { 0.3 } else { 0.0 };
    let work = if agent.is_on_shift(now) { 0.5 + 0.3 * agent.personality.conscientiousness } else { 0.0 };

    let mut map = PressureMap::new();
    map.insert(IntentKind::SeekSleep, (deficit(n.sleep) + night).min(1.0));
    map.insert(IntentKind::SeekFun, deficit(n.fun));
    map.insert(IntentKind::SeekStability, deficit(n.stability));
    map.insert(IntentKind::Work, work);
    map.insert(IntentKind::Wandering, 0.9 * deficit(n.social).max(deficit(n.stimulation)));
    map.insert(IntentKind::Idle, 0.1);
    map
}

/// `true` while `current` is still inside its commitment window.
#[inline]
pub fn is_committed(started: SimTime, now: SimTime, window_ms: u64) -> bool {
    now.since(started) < window_ms
}

/// Pick the winning intent kind.
pub fn select_intent(
    map: &PressureMap,
    current: IntentKind,
    started: SimTime,
    now: SimTime,
    cfg: &PlannerConfig,
) -> IntentKind {
    let committed = is_committed(started, now, cfg.commitment_window_ms);
    let mut best: Option<(IntentKind, f32)> = None;
    for (&kind, &p) in map {
        let score = if committed && kind == current { p + cfg.commitment_bonus } else { p };
        match best {
            Some((_, b)) if score <= b => {}
            _ => best = Some((kind, score)),
        }
    }
    best.map(|(k, _)| k).unwrap_or(current)
}
