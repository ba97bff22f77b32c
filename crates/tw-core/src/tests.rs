//! Unit tests for tw-core primitives.

#[cfg(test)]
mod ids {
    use crate::{AgentId, StructureId};

    #[test]
    fn index_roundtrip() {
        let id = AgentId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(vec![0u8; 50][id.index()], 0);
    }

    #[test]
    fn invalid_sentinels() {
        assert_eq!(AgentId::INVALID.0, u32::MAX);
        assert!(!StructureId::default().is_valid());
        assert!(StructureId(0).is_valid());
    }

    #[test]
    fn display() {
        assert_eq!(AgentId(7).to_string(), "a7");
        assert_eq!(StructureId(12).to_string(), "s12");
        assert_eq!(StructureId::INVALID.to_string(), "s-");
    }
}

#[cfg(test)]
mod geo {
    use crate::{TilePos, TileRect, Vec2};

    #[test]
    fn pack_unpack() {
        let p = TilePos::new(123, 4567);
        assert_eq!(TilePos::unpack(p.pack()), p);
        assert_eq!(TilePos::unpack(TilePos::new(0, 0).pack()), TilePos::new(0, 0));
    }

    #[test]
    fn world_to_tile_floors() {
        assert_eq!(Vec2::new(15.9, 16.0).to_tile(16.0), TilePos::new(0, 1));
        assert_eq!(Vec2::new(-0.5, 0.0).to_tile(16.0), TilePos::new(-1, 0));
    }

    #[test]
    fn tile_center() {
        let c = TilePos::new(2, 3).center(10.0);
        assert_eq!(c, Vec2::new(25.0, 35.0));
    }

    #[test]
    fn chebyshev_and_manhattan() {
        let a = TilePos::new(0, 0);
        let b = TilePos::new(3, -5);
        assert_eq!(a.chebyshev(b), 5);
        assert_eq!(a.manhattan(b), 8);
    }

    #[test]
    fn rect_union_expand_clamp() {
        let a = TileRect::new(0, 0, 2, 2);
        let b = TileRect::new(5, 5, 6, 7);
        assert_eq!(a.union(&b), TileRect::new(0, 0, 6, 7));
        assert_eq!(a.expand(3), TileRect::new(-3, -3, 5, 5));
        assert_eq!(a.expand(3).clamp_to(4, 4), TileRect::new(0, 0, 4, 4));
        let empty = TileRect::new(0, 0, 0, 0);
        assert_eq!(empty.union(&b), b);
    }

    #[test]
    fn rect_iter_and_contains() {
        let r = TileRect::new(1, 1, 3, 2);
        let tiles: Vec<_> = r.iter().collect();
        assert_eq!(tiles, vec![TilePos::new(1, 1), TilePos::new(2, 1)]);
        assert!(r.contains(TilePos::new(2, 1)));
        assert!(!r.contains(TilePos::new(3, 1)));
    }

    #[test]
    fn rect_chebyshev_to() {
        let r = TileRect::new(2, 2, 4, 4);
        assert_eq!(r.chebyshev_to(TilePos::new(3, 3)), 0);
        assert_eq!(r.chebyshev_to(TilePos::new(0, 3)), 2);
        assert_eq!(r.chebyshev_to(TilePos::new(6, 7)), 4);
    }

    #[test]
    fn normalized_zero_is_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < 1e-6);
    }
}

#[cfg(test)]
mod time {
    use crate::{DayPhase, SimClock, SimTime, Tick};

    #[test]
    fn clock_advances_tick_and_time() {
        let mut clock = SimClock::new(50, 4, 1_000);
        clock.advance();
        clock.advance();
        assert_eq!(clock.current_tick, Tick(2));
        assert_eq!(clock.now, SimTime(100));
    }

    #[test]
    fn ai_tick_cadence() {
        let mut clock = SimClock::new(50, 4, 1_000);
        let mut fired = 0;
        for _ in 0..8 {
            if clock.is_ai_tick() {
                fired += 1;
            }
            clock.advance();
        }
        assert_eq!(fired, 2);
    }

    #[test]
    fn day_phases() {
        assert_eq!(DayPhase::from_fraction(0.1), DayPhase::Night);
        assert_eq!(DayPhase::from_fraction(0.3), DayPhase::Morning);
        assert_eq!(DayPhase::from_fraction(0.5), DayPhase::Day);
        assert_eq!(DayPhase::from_fraction(0.8), DayPhase::Evening);
        assert_eq!(DayPhase::from_fraction(0.9), DayPhase::Night);
    }

    #[test]
    fn time_of_day_wraps() {
        let mut clock = SimClock::new(250, 1, 1_000);
        for _ in 0..5 {
            clock.advance();
        }
        assert!((clock.time_of_day() - 0.25).abs() < 1e-6);
        assert_eq!(clock.day_index(), 1);
    }

    #[test]
    fn since_saturates() {
        assert_eq!(SimTime(5).since(SimTime(10)), 0);
        assert_eq!(SimTime(10).since(SimTime(5)), 5);
    }
}

#[cfg(test)]
mod rng {
    use crate::{AgentId, AgentRng, SimRng};

    #[test]
    fn deterministic_same_seed() {
        let mut r1 = AgentRng::new(12345, AgentId(0));
        let mut r2 = AgentRng::new(12345, AgentId(0));
        for _ in 0..100 {
            let a: f32 = r1.random();
            let b: f32 = r2.random();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn different_agents_differ() {
        let mut r0 = AgentRng::new(1, AgentId(0));
        let mut r1 = AgentRng::new(1, AgentId(1));
        let a: u64 = r0.random();
        let b: u64 = r1.random();
        assert_ne!(a, b, "seeds for adjacent agents should diverge");
    }

    #[test]
    fn weighted_index_skips_zero_weights() {
        let mut rng = SimRng::new(3);
        for _ in 0..200 {
            let i = rng.weighted_index(&[0, 5, 0]).unwrap();
            assert_eq!(i, 1);
        }
        assert_eq!(rng.weighted_index(&[0, 0]), None);
        assert_eq!(rng.weighted_index(&[]), None);
    }

    #[test]
    fn gen_bool_extremes() {
        let mut rng = SimRng::new(0);
        assert!(!rng.gen_bool(0.0));
        assert!(rng.gen_bool(1.0));
        assert!(rng.gen_bool(7.0));
    }
}

#[cfg(test)]
mod config {
    use crate::SimConfig;

    #[test]
    fn defaults_validate() {
        SimConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = SimConfig::from_toml_str(
            r#"
            seed = 9
            [planner]
            commitment_window_ms = 1234
            "#,
        )
        .unwrap();
        assert_eq!(cfg.seed, 9);
        assert_eq!(cfg.planner.commitment_window_ms, 1234);
        assert_eq!(cfg.tick_ms, SimConfig::default().tick_ms);
        assert_eq!(cfg.social, SimConfig::default().social);
    }

    #[test]
    fn zero_tick_rejected() {
        assert!(SimConfig::from_toml_str("tick_ms = 0").is_err());
    }

    #[test]
    fn margin_must_cover_clearance() {
        let err = SimConfig::from_toml_str("[nav]\nmax_clearance = 9\ndirty_margin = 4").unwrap_err();
        assert!(err.to_string().contains("dirty_margin"));
    }

    #[test]
    fn garbage_is_parse_error() {
        assert!(SimConfig::from_toml_str("seed = [").is_err());
    }
}
