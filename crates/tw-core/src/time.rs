//! Simulation time model.
//!
//! # Design
//!
//! Two clocks advance together:
//!
//! - `Tick`: the integer count of pumped ticks.  Used for cadence decisions
//!   (the coarser *AI tick* runs every `ai_tick_every` ticks).
//! - `SimTime`: simulated milliseconds since start.  All timestamps stored on
//!   agents and structures (`intent_started`, `social.ends`, cooldowns)
//!   are `SimTime`, so rates integrate over `Δt` rather than tick counts.
//!
//!   now = current_tick * tick_ms

use std::fmt;

use serde::{Deserialize, Serialize};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Simulated milliseconds since the start of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    /// The timestamp `ms` milliseconds after `self`.
    #[inline]
    pub fn after_ms(self, ms: u64) -> SimTime {
        SimTime(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: SimTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1000.0
    }
}

impl std::ops::Add<u64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: u64) -> SimTime {
        self.after_ms(rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute tick counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }
}

impl std::ops::Add<u64> for Tick {
    type Output = Tick;
    #[inline]
    fn add(self, rhs: u64) -> Tick {
        Tick(self.0 + rhs)
    }
}

impl std::ops::Sub for Tick {
    type Output = u64;
    #[inline]
    fn sub(self, rhs: Tick) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── DayPhase ──────────────────────────────────────────────────────────────────

/// Coarse time-of-day bucket.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum DayPhase {
    /// `[0.25, 0.35)` of the day: agents wake and shifts are reassigned.
    Morning,
    /// `[0.35, 0.70)`.
    Day,
    /// `[0.70, 0.85)`.
    Evening,
    /// `[0.85, 1.0) ∪ [0.0, 0.25)`: everybody heads home.
    Night,
}

impl DayPhase {
    /// Phase for a time-of-day fraction in `[0, 1)`.
    pub fn from_fraction(f: f32) -> DayPhase {
        match f {
            f if f < 0.25 => DayPhase::Night,
            f if f < 0.35 => DayPhase::Morning,
            f if f < 0.70 => DayPhase::Day,
            f if f < 0.85 => DayPhase::Evening,
            _ => DayPhase::Night,
        }
    }

    #[inline]
    pub fn is_night(self) -> bool {
        matches!(self, DayPhase::Night)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Tracks the current tick and simulated time, and answers cadence and
/// time-of-day questions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimClock {
    /// Simulated milliseconds per tick.
    pub tick_ms: u64,
    /// Planning runs on ticks where `tick % ai_tick_every == 0`.
    pub ai_tick_every: u64,
    /// Length of one simulated day in milliseconds.
    pub day_length_ms: u64,
    /// The current tick, advanced by [`SimClock::advance`].
    pub current_tick: Tick,
    /// Simulated time of `current_tick`.
    pub now: SimTime,
}

impl SimClock {
    pub fn new(tick_ms: u64, ai_tick_every: u64, day_length_ms: u64) -> Self {
        Self {
            tick_ms,
            ai_tick_every: ai_tick_every.max(1),
            day_length_ms: day_length_ms.max(1),
            current_tick: Tick::ZERO,
            now: SimTime::ZERO,
        }
    }

    /// Advance the clock by one tick.
    #[inline]
    pub fn advance(&mut self) {
        self.current_tick = self.current_tick + 1;
        self.now = self.now.after_ms(self.tick_ms);
    }

    /// `true` on ticks where the coarse planning cadence fires.
    #[inline]
    pub fn is_ai_tick(&self) -> bool {
        self.current_tick.0.is_multiple_of(self.ai_tick_every)
    }

    /// Fraction of the current day elapsed, in `[0, 1)`.
    pub fn time_of_day(&self) -> f32 {
        time_of_day(self.now, self.day_length_ms)
    }

    pub fn day_phase(&self) -> DayPhase {
        DayPhase::from_fraction(self.time_of_day())
    }

    /// Zero-based index of the current day.
    #[inline]
    pub fn day_index(&self) -> u64 {
        self.now.0 / self.day_length_ms
    }
}

/// Fraction of the day elapsed at `now`, in `[0, 1)`.
pub fn time_of_day(now: SimTime, day_length_ms: u64) -> f32 {
    let day = day_length_ms.max(1);
    (now.0 % day) as f32 / day as f32
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tod = self.time_of_day();
        let minutes = (tod * 24.0 * 60.0) as u32;
        write!(
            f,
            "{} (day {} {:02}:{:02})",
            self.current_tick,
            self.day_index(),
            minutes / 60,
            minutes % 60
        )
    }
}
