//! Need decay and restoration.

use tw_core::NeedsConfig;
use tw_world::{Activity, Agent, NeedKind};

/// Needs the current activity restores, with a weight.
fn restoring(activity: Activity) -> &'static [(NeedKind, f32)] {
    match activity {
        Activity::Sleeping => &[(NeedKind::Sleep, 1.0)],
        Activity::Socializing => &[(NeedKind::Social, 1.0), (NeedKind::Fun, 0.5)],
        Activity::Visiting => &[(NeedKind::Fun, 1.0), (NeedKind::Social, 0.5)],
        Activity::Working => &[(NeedKind::Stability, 0.5), (NeedKind::Stimulation, 0.5)],
        Activity::Traveling => &[(NeedKind::Stimulation, 0.25)],
        Activity::Idle => &[],
    }
}

fn decay_rate(cfg: &NeedsConfig, kind: NeedKind) -> f32 {
    match kind {
        NeedKind::Sleep => cfg.sleep_decay,
        NeedKind::Stability => cfg.stability_decay,
        NeedKind::Social => cfg.social_decay,
        NeedKind::Fun => cfg.fun_decay,
        NeedKind::Stimulation => cfg.stimulation_decay,
    }
}

/// Integrate needs over `dt_ms`: each need decays at its rate unless the
/// current activity restores it.  Every value stays in `[0, 100]`.
///
/// Returns `true` if any need changed.
pub fn update_needs(agent: &mut Agent, dt_ms: u64, cfg: &NeedsConfig) -> bool {
    let dt_s = dt_ms as f32 / 1000.0;
    let before = agent.needs;
    let restore = restoring(agent.activity);

    for kind in NeedKind::ALL {
        let delta = match restore.iter().find(|(k, _)| *k == kind) {
            Some(&(_, w)) => cfg.restore_rate * w * dt_s,
            None => -decay_rate(cfg, kind) * dt_s,
        };
        agent.needs.adjust(kind, delta);
    }
    agent.needs != before
}
