//! Unit tests for tw-social.

#[cfg(test)]
mod helpers {
    use tw_core::{AgentId, SimTime, SocialConfig, Vec2};
    use tw_world::{Activity, Intent, StructureCatalog, TileKind, TileMap, WorldSnapshot};

    use crate::SocialEngine;

    pub const NOW: SimTime = SimTime(60_000);

    pub fn world() -> WorldSnapshot {
        WorldSnapshot::new(TileMap::new(64, 64, TileKind::Grass), StructureCatalog::default(), 16.0, 21)
    }

    /// Spawn an idle wanderer at `(x, y)` world units.
    pub fn wanderer(w: &mut WorldSnapshot, x: f32, y: f32) -> AgentId {
        let id = w.spawn_agent(Vec2::new(x, y), None);
        let a = w.agent_mut(id).unwrap();
        a.intent = Intent::Wandering;
        a.activity = Activity::Idle;
        a.personality.extraversion = 1.0;
        id
    }

    pub fn engine() -> SocialEngine {
        SocialEngine::new(&SocialConfig::default())
    }

    pub fn engine_with(f: impl FnOnce(&mut SocialConfig)) -> SocialEngine {
        let mut cfg = SocialConfig::default();
        f(&mut cfg);
        SocialEngine::new(&cfg)
    }
}

#[cfg(test)]
mod fields {
    use tw_core::SimTime;
    use tw_world::Activity;

    use super::helpers::{engine, wanderer, world, NOW};

    #[test]
    fn single_linkage_chains_into_one_field() {
        let mut w = world();
        let a = wanderer(&mut w, 100.0, 100.0);
        let b = wanderer(&mut w, 110.0, 100.0);
        let c = wanderer(&mut w, 130.0, 100.0);
        let loner = wanderer(&mut w, 600.0, 600.0);
        w.refresh_indices();

        assert_eq!(engine().form_fields(&mut w, NOW), 1);
        assert_eq!(w.fields.len(), 1);
        assert_eq!(w.fields[0].participants, vec![a, b, c]);
        for id in [a, b, c] {
            let ag = w.agent(id).unwrap();
            assert_eq!(ag.activity, Activity::Socializing);
            assert_eq!(ag.social.field, Some(w.fields[0].id));
            assert!(ag.social.partner.is_some());
        }
        assert_eq!(w.agent(loner).unwrap().activity, Activity::Idle);
    }

    #[test]
    fn busy_or_recently_social_agents_stay_out() {
        let mut w = world();
        let a = wanderer(&mut w, 100.0, 100.0);
        let b = wanderer(&mut w, 105.0, 100.0);
        let c = wanderer(&mut w, 110.0, 100.0);
        w.agent_mut(b).unwrap().activity = Activity::Traveling;
        w.agent_mut(c).unwrap().social.last_social = SimTime(NOW.0 - 1_000);
        w.refresh_indices();

        assert_eq!(engine().form_fields(&mut w, NOW), 0);
        assert!(w.fields.is_empty());
        assert_eq!(w.agent(a).unwrap().activity, Activity::Idle);
    }

    #[test]
    fn dissolution_time_is_independent_of_tick_size() {
        for dt in [50, 400] {
            let mut w = world();
            let a = wanderer(&mut w, 100.0, 100.0);
            wanderer(&mut w, 108.0, 100.0);
            w.refresh_indices();
            let eng = engine();
            eng.form_fields(&mut w, NOW);

            let mut now = NOW;
            let mut elapsed = 0;
            while w.fields.len() == 1 {
                now = now.after_ms(dt);
                elapsed += dt;
                eng.update_fields(&mut w, dt, now);
                assert!(elapsed <= 30_000, "field never dissolved");
            }
            assert!((20_000..20_000 + dt).contains(&elapsed), "dt {dt}: dissolved after {elapsed}");
            assert_eq!(w.encounters.len(), 1);
            let ag = w.agent(a).unwrap();
            assert_eq!(ag.activity, Activity::Idle);
            assert_eq!(ag.social.field, None);
            assert_eq!(ag.social.last_social, now);
        }
    }

    #[test]
    fn member_pulled_away_dissolves_a_pair() {
        let mut w = world();
        let a = wanderer(&mut w, 100.0, 100.0);
        let b = wanderer(&mut w, 108.0, 100.0);
        w.refresh_indices();
        let eng = engine();
        eng.form_fields(&mut w, NOW);

        w.agent_mut(b).unwrap().activity = Activity::Traveling;
        assert_eq!(eng.update_fields(&mut w, 50, NOW.after_ms(50)), 1);
        assert!(w.fields.is_empty());
        assert_eq!(w.agent(a).unwrap().activity, Activity::Idle);
    }
}

#[cfg(test)]
mod emission {
    use tw_core::SimRng;
    use tw_world::Emoji;

    use super::helpers::{engine_with, wanderer, world, NOW};

    #[test]
    fn one_speaker_per_field_at_a_time() {
        let mut w = world();
        let ids: Vec<_> = (0..3).map(|i| wanderer(&mut w, 100.0 + i as f32 * 5.0, 100.0)).collect();
        w.refresh_indices();
        let eng = engine_with(|c| c.emission_chance = 1.0);
        eng.form_fields(&mut w, NOW);
        let mut rng = SimRng::new(4);

        assert_eq!(eng.emit(&mut w, NOW, &mut rng), 1);
        let speakers = ids.iter().filter(|&&id| w.agent(id).unwrap().social.has_active_emoji(NOW)).count();
        assert_eq!(speakers, 1);

        // Still showing: nobody else may speak.
        assert_eq!(eng.emit(&mut w, NOW.after_ms(100), &mut rng), 0);

        let tallies: Vec<i32> = ids.iter().map(|&id| w.agent(id).unwrap().social.encounter_valence).collect();
        assert!(tallies.iter().all(|&t| t == tallies[0]));

        let later = NOW.after_ms(eng.config().emoji_duration_ms + 1);
        assert_eq!(eng.emit(&mut w, later, &mut rng), 1);
    }

    #[test]
    fn mood_selects_the_pool() {
        let mut w = world();
        let id = wanderer(&mut w, 0.0, 0.0);
        let a = w.agent_mut(id).unwrap();
        a.needs.sleep = 100.0;
        a.needs.stability = 100.0;
        a.needs.social = 100.0;
        a.needs.fun = 100.0;
        let happy = crate::emoji_pool(a);
        assert!(happy.iter().all(|(e, _)| e.valence() > 0));

        a.needs.sleep = 0.0;
        a.needs.stability = 0.0;
        a.needs.social = 0.0;
        a.needs.fun = 0.0;
        let gloomy = crate::emoji_pool(a);
        assert!(gloomy.iter().all(|(e, _)| e.valence() <= 0));
        assert!(gloomy.iter().any(|(e, _)| *e == Emoji::Angry));
    }
}

#[cfg(test)]
mod bump {
    use tw_world::{Activity, Emoji};

    use super::helpers::{engine, wanderer, world, NOW};

    #[test]
    fn passing_agents_wave_once_per_cooldown() {
        let mut w = world();
        let a = wanderer(&mut w, 100.0, 100.0);
        let b = wanderer(&mut w, 104.0, 100.0);
        w.agent_mut(a).unwrap().activity = Activity::Traveling;
        w.refresh_indices();
        let eng = engine();

        assert_eq!(eng.bump_greetings(&mut w, NOW), 1);
        for id in [a, b] {
            let ag = w.agent(id).unwrap();
            assert_eq!(ag.social.emoji, Some(Emoji::Wave));
            assert_eq!(ag.social.last_bump, NOW);
        }

        let soon = NOW.after_ms(eng.config().emoji_duration_ms + 1);
        assert_eq!(eng.bump_greetings(&mut w, soon), 0);
        let later = NOW.after_ms(eng.config().bump_cooldown_ms);
        assert_eq!(eng.bump_greetings(&mut w, later), 1);
    }

    #[test]
    fn standing_agents_do_not_bump() {
        let mut w = world();
        wanderer(&mut w, 100.0, 100.0);
        wanderer(&mut w, 104.0, 100.0);
        w.refresh_indices();
        assert_eq!(engine().bump_greetings(&mut w, NOW), 0);
    }
}

#[cfg(test)]
mod gossip {
    use tw_core::SimRng;

    use super::helpers::{engine_with, wanderer, world, NOW};

    #[test]
    fn opinion_spills_over_scaled_by_trust() {
        let mut w = world();
        let listener = wanderer(&mut w, 100.0, 100.0);
        let speaker = wanderer(&mut w, 106.0, 100.0);
        let third = wanderer(&mut w, 900.0, 900.0);
        w.agent_mut(listener).unwrap().social_memory.insert(speaker, 80.0);
        w.agent_mut(speaker).unwrap().social_memory.insert(third, 50.0);
        w.refresh_indices();

        let eng = engine_with(|c| c.gossip_chance = 1.0);
        eng.form_fields(&mut w, NOW);
        let mut rng = SimRng::new(8);
        assert_eq!(eng.gossip(&mut w, &mut rng), 1);

        let got = w.agent(listener).unwrap().affinity(third);
        assert!((got - 50.0 * 0.8 * 0.3).abs() < 1e-4, "{got}");
    }

    #[test]
    fn distrusted_speaker_pushes_the_other_way() {
        let mut w = world();
        let listener = wanderer(&mut w, 100.0, 100.0);
        let speaker = wanderer(&mut w, 106.0, 100.0);
        let third = wanderer(&mut w, 900.0, 900.0);
        w.agent_mut(listener).unwrap().social_memory.insert(speaker, -50.0);
        w.agent_mut(speaker).unwrap().social_memory.insert(third, 60.0);
        w.refresh_indices();

        let eng = engine_with(|c| c.gossip_chance = 1.0);
        eng.form_fields(&mut w, NOW);
        eng.gossip(&mut w, &mut SimRng::new(8));
        assert!(w.agent(listener).unwrap().affinity(third) < 0.0);
    }

    #[test]
    fn members_of_the_same_field_are_not_gossiped_about() {
        let mut w = world();
        let a = wanderer(&mut w, 100.0, 100.0);
        let b = wanderer(&mut w, 106.0, 100.0);
        let c = wanderer(&mut w, 112.0, 100.0);
        w.agent_mut(a).unwrap().social_memory.insert(b, 90.0);
        w.agent_mut(b).unwrap().social_memory.insert(c, 90.0);
        w.agent_mut(c).unwrap().social_memory.insert(a, 90.0);
        w.refresh_indices();

        let eng = engine_with(|c| c.gossip_chance = 1.0);
        eng.form_fields(&mut w, NOW);
        assert_eq!(eng.gossip(&mut w, &mut SimRng::new(1)), 0);
    }
}

#[cfg(test)]
mod relations {
    use tw_world::EncounterEnd;

    use super::helpers::{engine, wanderer, world};
    use crate::{apply_relationship_delta, saturated_delta, SocialError};

    #[test]
    fn positive_encounter_raises_both_sides() {
        let mut w = world();
        let a = wanderer(&mut w, 0.0, 0.0);
        let b = wanderer(&mut w, 5.0, 0.0);
        w.agent_mut(a).unwrap().social.encounter_valence = 2;
        w.agent_mut(b).unwrap().social.encounter_valence = 1;
        std::sync::Arc::make_mut(&mut w.encounters)
            .push(EncounterEnd { field: tw_core::FieldId(0), participants: vec![a, b] });

        assert_eq!(engine().resolve_encounters(&mut w), 1);
        assert_eq!(w.ledger.score(a, b), 5.0);
        assert_eq!(w.ledger.score(b, a), 5.0);
        assert_eq!(w.agent(a).unwrap().affinity(b), 5.0);
        assert_eq!(w.agent(b).unwrap().affinity(a), 5.0);
        assert_eq!(w.agent(a).unwrap().social.encounter_valence, 0);
        assert!(w.encounters.is_empty());
    }

    #[test]
    fn neutral_encounter_changes_nothing() {
        let mut w = world();
        let a = wanderer(&mut w, 0.0, 0.0);
        let b = wanderer(&mut w, 5.0, 0.0);
        w.agent_mut(a).unwrap().social.encounter_valence = 2;
        w.agent_mut(b).unwrap().social.encounter_valence = -2;
        std::sync::Arc::make_mut(&mut w.encounters)
            .push(EncounterEnd { field: tw_core::FieldId(0), participants: vec![a, b] });
        let rev = w.ledger.revision();

        assert_eq!(engine().resolve_encounters(&mut w), 0);
        assert_eq!(w.ledger.revision(), rev);
    }

    #[test]
    fn saturation_slows_polarisation_only() {
        assert_eq!(saturated_delta(5.0, 0.0, 0.8), 5.0);
        assert!((saturated_delta(5.0, 90.0, 0.8) - 5.0 * (1.0 - 0.72)).abs() < 1e-5);
        assert_eq!(saturated_delta(-5.0, 90.0, 0.8), -5.0);
        assert!(saturated_delta(-5.0, -100.0, 0.8).abs() < 5.0);
    }

    #[test]
    fn scores_stay_bounded_and_symmetric() {
        let mut w = world();
        let a = wanderer(&mut w, 0.0, 0.0);
        let b = wanderer(&mut w, 5.0, 0.0);
        for _ in 0..50 {
            apply_relationship_delta(&mut w, b, a, 7.0).unwrap();
        }
        assert_eq!(w.ledger.score(a, b), 100.0);
        assert_eq!(w.ledger.len(), 1);
        assert_eq!(w.agent(a).unwrap().affinity(b), 100.0);
    }

    #[test]
    fn zero_delta_and_bad_pairs() {
        let mut w = world();
        let a = wanderer(&mut w, 0.0, 0.0);
        let b = wanderer(&mut w, 5.0, 0.0);
        let rev = w.ledger.revision();
        assert_eq!(apply_relationship_delta(&mut w, a, b, 0.0), Ok(false));
        assert_eq!(w.ledger.revision(), rev);
        assert_eq!(apply_relationship_delta(&mut w, a, a, 1.0), Err(SocialError::SelfPair(a)));
        let ghost = tw_core::AgentId(999);
        assert_eq!(apply_relationship_delta(&mut w, a, ghost, 1.0), Err(SocialError::UnknownAgent(ghost)));
    }

    #[test]
    fn affinity_fades_outside_conversation() {
        let mut w = world();
        let a = wanderer(&mut w, 0.0, 0.0);
        let b = wanderer(&mut w, 5.0, 0.0);
        w.agent_mut(a).unwrap().social_memory.insert(b, 1.0);
        w.agent_mut(b).unwrap().social_memory.insert(a, -1.0);
        w.agent_mut(b).unwrap().activity = tw_world::Activity::Socializing;

        let eng = engine();
        assert!(eng.decay_affinity(&mut w, 10_000));
        assert!((w.agent(a).unwrap().affinity(b) - 0.5).abs() < 1e-5);
        assert_eq!(w.agent(b).unwrap().affinity(a), -1.0);

        eng.decay_affinity(&mut w, 60_000);
        assert!(w.agent(a).unwrap().social_memory.is_empty());
    }

    #[test]
    fn ledger_fades_with_memory() {
        let mut w = world();
        let a = wanderer(&mut w, 0.0, 0.0);
        let b = wanderer(&mut w, 5.0, 0.0);
        let c = wanderer(&mut w, 9.0, 0.0);
        apply_relationship_delta(&mut w, a, b, 10.0).unwrap();
        apply_relationship_delta(&mut w, b, c, -10.0).unwrap();
        w.agent_mut(c).unwrap().activity = tw_world::Activity::Socializing;

        // 0.05 per second over 20 s.
        assert!(engine().decay_affinity(&mut w, 20_000));
        assert!((w.ledger.score(a, b) - 9.0).abs() < 1e-4);
        assert!((w.agent(a).unwrap().affinity(b) - 9.0).abs() < 1e-4);
        assert_eq!(w.ledger.score(b, c), -10.0);
        assert_eq!(w.agent(c).unwrap().affinity(b), -10.0);

        engine().decay_affinity(&mut w, 600_000);
        assert_eq!(w.ledger.score(a, b), 0.0);
        assert!(w.agent(a).unwrap().social_memory.is_empty());
        let rev = w.ledger.revision();
        engine().decay_affinity(&mut w, 1_000);
        assert_eq!(w.ledger.score(b, c), -10.0);
        assert_eq!(w.ledger.revision(), rev);
    }
}
