//! Pure path-following kinematics.

use tw_core::{AgentId, TilePos, Vec2};
use tw_world::Agent;

/// Per-agent, per-waypoint offset in `[-jitter, jitter]²` so agents on the
/// same path do not walk single file.  Deterministic in `(agent, index)`.
pub fn jitter_offset(agent: AgentId, index: usize, jitter: f32) -> Vec2 {
    if jitter <= 0.0 {
        return Vec2::ZERO;
    }
    let mut h = (agent.0 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15) ^ (index as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f);
    h ^= h >> 29;
    h = h.wrapping_mul(0xbf58_476d_1ce4_e5b9);
    h ^= h >> 32;
    let ux = (h & 0xffff) as f32 / 65_535.0;
    let uy = ((h >> 16) & 0xffff) as f32 / 65_535.0;
    Vec2::new((ux * 2.0 - 1.0) * jitter, (uy * 2.0 - 1.0) * jitter)
}

/// Where the agent is heading right now, if it has a path.
pub fn current_waypoint(agent: &Agent, tile_size: f32, jitter: f32) -> Option<Vec2> {
    let packed = *agent.nav.path.get(agent.nav.index)?;
    let center = TilePos::unpack(packed).center(tile_size);
    let last = agent.nav.index + 1 == agent.nav.path.len();
    if last {
        // The final waypoint is exact so arrival lands inside the target's
        // influence area.
        Some(center)
    } else {
        Some(center + jitter_offset(agent.id, agent.nav.index, jitter))
    }
}

/// Move `pos` towards `to` by at most `max_step`.  Returns the new position.
pub fn step_towards(pos: Vec2, to: Vec2, max_step: f32) -> Vec2 {
    let d = to - pos;
    let len = d.length();
    if len <= max_step || len == 0.0 {
        to
    } else {
        pos + d * (max_step / len)
    }
}
