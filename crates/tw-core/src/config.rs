//! Simulation configuration.
//!
//! Every section carries `#[serde(default)]`, so a TOML file only needs the
//! values it wants to override:
//!
//! ```toml
//! seed = 7
//! tick_ms = 50
//!
//! [planner]
//! commitment_window_ms = 4000
//! ```

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult, SimClock};

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    /// Planning and social triggers run every N ticks.
    pub ai_tick_every: u64,
    /// Length of one simulated day.
    pub day_length_ms: u64,
    /// World units per tile edge.
    pub tile_size: f32,

    pub nav: NavConfig,
    pub needs: NeedsConfig,
    pub planner: PlannerConfig,
    pub social: SocialConfig,
    pub economy: EconomyConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_ms: 50,
            ai_tick_every: 4,
            day_length_ms: 600_000,
            tile_size: 16.0,
            nav: NavConfig::default(),
            needs: NeedsConfig::default(),
            planner: PlannerConfig::default(),
            social: SocialConfig::default(),
            economy: EconomyConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let cfg: SimConfig = toml::from_str(text).map_err(|e| CoreError::Parse(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_ms == 0 {
            return Err(CoreError::Config("tick_ms must be positive".into()));
        }
        if self.ai_tick_every == 0 {
            return Err(CoreError::Config("ai_tick_every must be at least 1".into()));
        }
        if self.day_length_ms == 0 {
            return Err(CoreError::Config("day_length_ms must be positive".into()));
        }
        if !(self.tile_size > 0.0) {
            return Err(CoreError::Config("tile_size must be positive".into()));
        }
        if self.nav.max_clearance == 0 {
            return Err(CoreError::Config("nav.max_clearance must be at least 1".into()));
        }
        if self.nav.dirty_margin < self.nav.max_clearance {
            return Err(CoreError::Config(format!(
                "nav.dirty_margin ({}) must cover nav.max_clearance ({})",
                self.nav.dirty_margin, self.nav.max_clearance
            )));
        }
        if self.planner.repath_cooldown_min_ms > self.planner.repath_cooldown_max_ms {
            return Err(CoreError::Config("planner repath cooldown range is inverted".into()));
        }
        if self.economy.carry_capacity == 0 {
            return Err(CoreError::Config("economy.carry_capacity must be positive".into()));
        }
        Ok(())
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.tick_ms, self.ai_tick_every, self.day_length_ms)
    }
}

// ── Navigation ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Clearance values are capped at this many tiles.
    pub max_clearance: u8,
    /// Tiles added around a dirty rectangle before an incremental rebuild.
    pub dirty_margin: u8,
    /// Ring-search cap for the nearest road tile.
    pub road_search_radius: i32,
    /// Trips with a Chebyshev tile distance at or below this go direct.
    pub direct_route_tiles: i32,
    /// A* cost added whenever the move direction changes.
    pub turn_penalty: u32,
    /// Agent body radius in world units; the required clearance.
    pub agent_radius: f32,
    /// Rebuild a reference grid after every incremental update and compare.
    pub self_check: bool,
    /// Random cells compared between the BFS and brute-force clearance
    /// formulas after each rebuild (0 disables).
    pub clearance_samples: u32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_clearance: 8,
            dirty_margin: 8,
            road_search_radius: 12,
            direct_route_tiles: 6,
            turn_penalty: 4,
            agent_radius: 4.0,
            self_check: false,
            clearance_samples: 0,
        }
    }
}

// ── Needs ─────────────────────────────────────────────────────────────────────

/// Per-second decay and restoration rates for the five needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    pub sleep_decay: f32,
    pub stability_decay: f32,
    pub social_decay: f32,
    pub fun_decay: f32,
    pub stimulation_decay: f32,
    /// Restoration per second while the matching activity runs.
    pub restore_rate: f32,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            sleep_decay: 0.8,
            stability_decay: 0.5,
            social_decay: 1.0,
            fun_decay: 0.9,
            stimulation_decay: 1.1,
            restore_rate: 4.0,
        }
    }
}

// ── Planner ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub commitment_window_ms: u64,
    pub commitment_bonus: f32,
    pub shift_length_ms: u64,
    pub job_search_cooldown_ms: u64,
    /// Chance per AI tick that an on-shift worker takes an excursion.
    pub excursion_chance: f64,
    /// Chance per AI tick that an idle off-duty agent starts a leisure trip
    /// instead of wandering near home.
    pub leisure_chance: f64,
    pub visit_duration_ms: u64,
    pub settle_dwell_ms: u64,
    pub wander_dwell_ms: u64,
    pub repath_cooldown_min_ms: u64,
    pub repath_cooldown_max_ms: u64,
    pub stuck_threshold_ms: u64,
    /// World units per tick below which movement counts as "no progress".
    pub stuck_epsilon: f32,
    pub arrival_radius: f32,
    /// World units per second.
    pub walk_speed: f32,
    /// Maximum per-agent waypoint offset, world units.
    pub jitter: f32,
    pub work_wander_tiles: i32,
    pub home_wander_tiles: i32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            commitment_window_ms: 5_000,
            commitment_bonus: 0.15,
            shift_length_ms: 240_000,
            job_search_cooldown_ms: 20_000,
            excursion_chance: 0.01,
            leisure_chance: 0.3,
            visit_duration_ms: 20_000,
            settle_dwell_ms: 1_500,
            wander_dwell_ms: 3_000,
            repath_cooldown_min_ms: 1_000,
            repath_cooldown_max_ms: 3_000,
            stuck_threshold_ms: 3_000,
            stuck_epsilon: 0.05,
            arrival_radius: 3.0,
            walk_speed: 40.0,
            jitter: 3.0,
            work_wander_tiles: 2,
            home_wander_tiles: 4,
        }
    }
}

// ── Social ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialConfig {
    pub formation_radius: f32,
    pub field_base_radius: f32,
    pub field_radius_k: f32,
    pub energy_decay_per_sec: f32,
    pub emission_chance: f64,
    pub emoji_duration_ms: u64,
    pub gossip_chance: f64,
    pub spillover: f32,
    pub interaction_delta: f32,
    pub saturation: f32,
    pub affinity_decay_per_sec: f32,
    pub bump_radius: f32,
    pub bump_cooldown_ms: u64,
    /// Agents may not rejoin a field for this long after leaving one.
    pub social_cooldown_ms: u64,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            formation_radius: 24.0,
            field_base_radius: 20.0,
            field_radius_k: 8.0,
            energy_decay_per_sec: 5.0,
            emission_chance: 0.35,
            emoji_duration_ms: 1_500,
            gossip_chance: 0.05,
            spillover: 0.3,
            interaction_delta: 5.0,
            saturation: 0.8,
            affinity_decay_per_sec: 0.05,
            bump_radius: 6.0,
            bump_cooldown_ms: 10_000,
            social_cooldown_ms: 30_000,
        }
    }
}

// ── Economy ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    pub carry_capacity: u32,
    pub retarget_cooldown_ms: u64,
    /// Build progress percent per second contributed by each builder.
    pub build_rate_per_builder: f32,
    /// Tiles added around a footprint to form its influence area.
    pub influence_margin: i32,
    /// Complete a funded site immediately when no builder is present.
    pub free_complete: bool,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            carry_capacity: 5,
            retarget_cooldown_ms: 2_000,
            build_rate_per_builder: 10.0,
            influence_margin: 1,
            free_complete: true,
        }
    }
}
