//! Unit tests for tw-behavior.

#[cfg(test)]
mod helpers {
    use tw_core::{NavConfig, PlannerConfig, SimClock, SimConfig, SimTime, StructureId, Tick, Vec2};
    use tw_mobility::MobilityEngine;
    use tw_nav::{GridRouter, NavGrid, NavSources};
    use tw_world::{Agent, Needs, StructureCatalog, StructureKind, TileKind, TileMap, WorldSnapshot};

    use crate::Planner;

    pub const TS: f32 = 16.0;
    pub const DAY: u64 = 600_000;

    pub fn world() -> WorldSnapshot {
        WorldSnapshot::new(TileMap::new(48, 48, TileKind::Grass), StructureCatalog::default(), TS, 5)
    }

    pub fn at(x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32 * TS, y as f32 * TS)
    }

    /// Place a structure and mark it built.
    pub fn built(w: &mut WorldSnapshot, kind: StructureKind, x: i32, y: i32) -> StructureId {
        let id = w.place_structure(kind, at(x, y)).unwrap();
        let s = w.structure_mut(id).unwrap();
        s.complete = true;
        s.build_started = true;
        s.build_progress = 100.0;
        id
    }

    pub fn grid(w: &WorldSnapshot) -> NavGrid {
        NavGrid::build(&NavSources::from_world(w), &NavConfig::default())
    }

    pub fn engine() -> MobilityEngine<GridRouter> {
        let nav = NavConfig::default();
        MobilityEngine::new(GridRouter::new(&nav), &PlannerConfig::default(), &nav)
    }

    pub fn planner() -> Planner {
        Planner::new(&SimConfig::default())
    }

    /// A clock stopped at `ms`.
    pub fn clock_at(ms: u64) -> SimClock {
        let mut c = SimConfig::default().make_clock();
        c.now = SimTime(ms);
        c.current_tick = Tick(ms / c.tick_ms);
        c
    }

    pub fn midday() -> SimClock {
        clock_at(DAY / 2)
    }

    pub fn content() -> Needs {
        Needs { sleep: 100.0, stability: 100.0, social: 100.0, fun: 100.0, stimulation: 100.0 }
    }

    /// Spawn a content agent at tile `(x, y)` and return its slot.
    pub fn spawn(w: &mut WorldSnapshot, x: i32, y: i32) -> usize {
        let id = w.spawn_agent(at(x, y) + Vec2::new(TS * 0.5, TS * 0.5), None);
        let slot = w.agent_slot(id).unwrap();
        let mut a: Agent = w.agents[slot].clone();
        a.needs = content();
        w.patch_agent(slot, a);
        slot
    }
}

#[cfg(test)]
mod needs {
    use tw_core::{AgentId, NeedsConfig, Vec2};
    use tw_world::{Activity, Agent, NeedKind};

    use crate::update_needs;

    #[test]
    fn needs_stay_clamped_for_any_dt() {
        let cfg = NeedsConfig::default();
        let mut a = Agent::new(AgentId(0), "a", Vec2::ZERO);
        for dt in [0, 50, 10_000, 1_000_000, u32::MAX as u64] {
            for activity in [Activity::Idle, Activity::Sleeping, Activity::Working, Activity::Visiting] {
                a.activity = activity;
                update_needs(&mut a, dt, &cfg);
                for kind in NeedKind::ALL {
                    let v = a.needs.get(kind);
                    assert!((0.0..=100.0).contains(&v), "{kind:?} = {v}");
                }
            }
        }
    }

    #[test]
    fn sleeping_restores_sleep_and_decays_the_rest() {
        let cfg = NeedsConfig::default();
        let mut a = Agent::new(AgentId(0), "a", Vec2::ZERO);
        a.activity = Activity::Sleeping;
        let before = a.needs;
        assert!(update_needs(&mut a, 1_000, &cfg));
        assert!(a.needs.sleep > before.sleep);
        assert!(a.needs.fun < before.fun);
        assert!((a.needs.sleep - (before.sleep + cfg.restore_rate)).abs() < 1e-4);
    }

    #[test]
    fn zero_dt_changes_nothing() {
        let mut a = Agent::new(AgentId(0), "a", Vec2::ZERO);
        assert!(!update_needs(&mut a, 0, &NeedsConfig::default()));
    }
}

#[cfg(test)]
mod pressure {
    use tw_core::{AgentId, DayPhase, PlannerConfig, SimTime, Vec2};
    use tw_world::{Agent, IntentKind, Needs};

    use crate::{pressures, select_intent, PressureMap};

    fn map(entries: &[(IntentKind, f32)]) -> PressureMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn commitment_holds_inside_the_window_only() {
        let cfg = PlannerConfig::default();
        let t0 = SimTime(1_000);
        let m = map(&[(IntentKind::SeekFun, 0.4), (IntentKind::SeekSleep, 0.5)]);
        let window = cfg.commitment_window_ms;

        let inside = t0.after_ms(window - 1);
        assert_eq!(select_intent(&m, IntentKind::SeekFun, t0, inside, &cfg), IntentKind::SeekFun);

        let outside = t0.after_ms(window + 1);
        assert_eq!(select_intent(&m, IntentKind::SeekFun, t0, outside, &cfg), IntentKind::SeekSleep);
    }

    #[test]
    fn exact_tie_goes_to_the_earlier_kind() {
        let cfg = PlannerConfig::default();
        let m = map(&[(IntentKind::Wandering, 0.5), (IntentKind::SeekFun, 0.5), (IntentKind::SeekSleep, 0.5)]);
        let pick = select_intent(&m, IntentKind::Idle, SimTime::ZERO, SimTime(60_000), &cfg);
        assert_eq!(pick, IntentKind::SeekSleep);
    }

    #[test]
    fn night_pushes_sleep_and_shift_pushes_work() {
        let mut a = Agent::new(AgentId(0), "a", Vec2::ZERO);
        a.needs = Needs { sleep: 100.0, stability: 100.0, social: 100.0, fun: 100.0, stimulation: 100.0 };
        let day = pressures(&a, SimTime::ZERO, DayPhase::Day);
        let night = pressures(&a, SimTime::ZERO, DayPhase::Night);
        assert!(night[&IntentKind::SeekSleep] > day[&IntentKind::SeekSleep]);
        assert_eq!(day[&IntentKind::Work], 0.0);
        for p in night.values() {
            assert!((0.0..=1.0).contains(p));
        }

        a.primary_goal = tw_world::PrimaryGoal::WorkShift { ends_at: SimTime(10_000) };
        let on_shift = pressures(&a, SimTime(5_000), DayPhase::Day);
        assert!(on_shift[&IntentKind::Work] >= 0.5);
    }
}

#[cfg(test)]
mod hotspot {
    use tw_core::{AgentId, AgentRng, Tick};
    use tw_world::StructureKind;

    use super::helpers::{at, built, world};
    use crate::{choose_hotspot, occupy, release_reservation, reserve};

    #[test]
    fn reservations_never_overbook() {
        let mut w = world();
        let t = built(&mut w, StructureKind::Store, 10, 10);
        // Store capacity is 4.
        let granted = (0..10).filter(|_| reserve(&mut w, t)).count();
        assert_eq!(granted, 4);
        assert_eq!(w.structure(t).unwrap().reserved, 4);

        occupy(&mut w, t);
        let s = w.structure(t).unwrap();
        assert_eq!((s.reserved, s.occupants), (3, 1));

        release_reservation(&mut w, t);
        assert!(reserve(&mut w, t));
        assert!(!reserve(&mut w, t));
    }

    #[test]
    fn full_or_unbuilt_hotspots_are_never_chosen() {
        let mut w = world();
        let full = built(&mut w, StructureKind::Store, 10, 10);
        w.place_structure(StructureKind::Tavern, at(20, 20)).unwrap();
        for _ in 0..4 {
            reserve(&mut w, full);
        }
        w.refresh_analysis(Tick(0));
        let mut rng = AgentRng::new(1, AgentId(0));
        let kinds = [StructureKind::Store, StructureKind::Tavern];
        assert_eq!(choose_hotspot(&w, &kinds, at(0, 0), &mut rng), None);
    }

    #[test]
    fn nearer_hotspots_are_preferred() {
        let mut w = world();
        let near = built(&mut w, StructureKind::Plaza, 4, 4);
        let far = built(&mut w, StructureKind::Plaza, 40, 40);
        w.refresh_analysis(Tick(0));
        let mut rng = AgentRng::new(9, AgentId(3));
        let picks: Vec<_> = (0..400)
            .filter_map(|_| choose_hotspot(&w, &[StructureKind::Plaza], at(2, 2), &mut rng))
            .collect();
        let n_near = picks.iter().filter(|&&p| p == near).count();
        let n_far = picks.iter().filter(|&&p| p == far).count();
        assert_eq!(n_near + n_far, 400);
        assert!(n_near > n_far);
    }
}

#[cfg(test)]
mod tasks {
    use tw_core::StructureId;
    use tw_world::{Agent, CarriedItem, Intent, ResourceKind, StructureKind, WorldSnapshot};

    use super::helpers::{at, built, spawn, world};
    use crate::{select_economy_task, task_still_valid};

    fn hauler(w: &mut WorldSnapshot) -> Agent {
        let slot = spawn(w, 2, 2);
        w.agents[slot].clone()
    }

    fn stock(w: &mut WorldSnapshot, id: StructureId, r: ResourceKind, n: u32) {
        w.structure_mut(id).unwrap().inventory.insert(r, n);
        w.bump_inventory_revision();
        w.refresh_poi_index();
    }

    #[test]
    fn carried_goods_go_to_the_site_that_needs_them() {
        let mut w = world();
        let site = w.place_structure(StructureKind::Farm, at(10, 10)).unwrap();
        w.refresh_poi_index();
        let mut a = hauler(&mut w);
        a.carrying = Some(CarriedItem { resource: ResourceKind::Wood, quantity: 5 });
        assert_eq!(select_economy_task(&a, &w), Intent::StoreResource { target: site });
    }

    #[test]
    fn funded_site_is_built_before_fetching() {
        let mut w = world();
        let site = w.place_structure(StructureKind::Farm, at(10, 10)).unwrap();
        let cutter = built(&mut w, StructureKind::Woodcutter, 30, 30);
        stock(&mut w, cutter, ResourceKind::Wood, 4);
        let a = hauler(&mut w);
        assert_eq!(
            select_economy_task(&a, &w),
            Intent::GetResource { target: cutter, resource: ResourceKind::Wood }
        );

        stock(&mut w, site, ResourceKind::Wood, 8);
        assert_eq!(select_economy_task(&a, &w), Intent::Construct { target: site });
    }

    #[test]
    fn stale_index_falls_back_to_plain_work() {
        let mut w = world();
        w.place_structure(StructureKind::Farm, at(10, 10)).unwrap();
        w.refresh_poi_index();
        w.bump_inventory_revision();
        let a = hauler(&mut w);
        assert!(w.poi_index().is_none());
        assert_eq!(select_economy_task(&a, &w), Intent::Work);
    }

    #[test]
    fn emptied_source_invalidates_fetch() {
        let mut w = world();
        let cutter = built(&mut w, StructureKind::Woodcutter, 30, 30);
        stock(&mut w, cutter, ResourceKind::Wood, 2);
        let a = hauler(&mut w);
        let task = Intent::GetResource { target: cutter, resource: ResourceKind::Wood };
        assert!(task_still_valid(task, &a, &w));
        w.structure_mut(cutter).unwrap().inventory.clear();
        assert!(!task_still_valid(task, &a, &w));
    }
}

#[cfg(test)]
mod planner {
    use tw_core::{SimTime, Tick};
    use tw_world::{Activity, GoalIntent, GoalTarget, NeedKind, PrimaryGoal, ResourceKind, StructureKind};

    use super::helpers::{built, clock_at, engine, grid, midday, planner, spawn, world, DAY};
    use crate::{PlanContext, STORE_STABILITY};

    #[test]
    fn shift_expiry_drops_an_excursion_without_side_effects() {
        let mut w = world();
        let farm = built(&mut w, StructureKind::Farm, 5, 5);
        let tavern = built(&mut w, StructureKind::Tavern, 30, 30);
        let slot = spawn(&mut w, 20, 5);
        let clock = midday();

        w.structure_mut(tavern).unwrap().reserved = 1;
        let mut a = w.agents[slot].clone();
        a.workplace = Some(farm);
        a.primary_goal = PrimaryGoal::WorkShift { ends_at: clock.now };
        a.goal = GoalIntent::VisitTavern;
        a.goal_target = Some(GoalTarget::Structure(tavern));
        a.reserved_hotspot = Some(tavern);
        a.suspended_goal = Some(GoalIntent::BusyAtWork);
        a.activity = Activity::Traveling;
        w.patch_agent(slot, a);

        let g = grid(&w);
        let mut eng = engine();
        let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
        planner().plan_agent(slot, &mut w, &mut ctx);

        let a = &w.agents[slot];
        assert_eq!(a.primary_goal, PrimaryGoal::OffDuty);
        assert_eq!(a.suspended_goal, None);
        assert_eq!(a.reserved_hotspot, None);
        assert_ne!(a.goal, GoalIntent::VisitTavern);
        assert_eq!(w.structure(tavern).unwrap().reserved, 0);
    }

    #[test]
    fn visit_arrival_turns_reservation_into_occupancy() {
        let mut w = world();
        let tavern = built(&mut w, StructureKind::Tavern, 30, 30);
        let slot = spawn(&mut w, 20, 5);
        w.structure_mut(tavern).unwrap().reserved = 1;
        let mut a = w.agents[slot].clone();
        a.goal = GoalIntent::VisitTavern;
        a.reserved_hotspot = Some(tavern);

        let now = SimTime(10_000);
        let p = planner();
        p.handle_arrival(&mut a, &mut w, now);

        assert_eq!(a.activity, Activity::Visiting);
        assert_eq!(a.visiting, Some(tavern));
        assert_eq!(a.goal_expires, Some(now.after_ms(p.config().visit_duration_ms)));
        let s = w.structure(tavern).unwrap();
        assert_eq!((s.reserved, s.occupants), (0, 1));
    }

    #[test]
    fn arrival_at_work_settles_in() {
        let mut w = world();
        let slot = spawn(&mut w, 20, 5);
        let mut a = w.agents[slot].clone();
        a.goal = GoalIntent::GoWork;
        let p = planner();
        p.handle_arrival(&mut a, &mut w, SimTime(1_000));
        assert_eq!(a.goal, GoalIntent::BusyAtWork);
        assert_eq!(a.activity, Activity::Working);
        assert_eq!(a.dwell_until, SimTime(1_000 + p.config().settle_dwell_ms));
    }

    #[test]
    fn store_visit_completion_buys_bread() {
        let mut w = world();
        let store = built(&mut w, StructureKind::Store, 30, 30);
        {
            let s = w.structure_mut(store).unwrap();
            s.inventory.insert(ResourceKind::Bread, 3);
            s.occupants = 1;
        }
        let slot = spawn(&mut w, 20, 5);
        let mut a = w.agents[slot].clone();
        a.needs.adjust(NeedKind::Stability, -50.0);
        let before = a.needs.stability;
        a.goal = GoalIntent::VisitStore;
        a.visiting = Some(store);
        a.activity = Activity::Visiting;
        let rev = w.revisions.inventory;

        planner().complete_goal(&mut a, &mut w, SimTime(1_000));

        assert_eq!(a.goal, GoalIntent::Idle);
        assert_eq!(a.activity, Activity::Idle);
        assert_eq!(a.visiting, None);
        assert_eq!(a.needs.stability, before + STORE_STABILITY);
        let s = w.structure(store).unwrap();
        assert_eq!(s.stock(ResourceKind::Bread), 2);
        assert_eq!(s.occupants, 0);
        assert_eq!(w.revisions.inventory, rev + 1);
    }

    #[test]
    fn completing_an_excursion_heads_back_to_work() {
        let mut w = world();
        let farm = built(&mut w, StructureKind::Farm, 5, 5);
        let slot = spawn(&mut w, 20, 5);
        let mut a = w.agents[slot].clone();
        a.workplace = Some(farm);
        a.goal = GoalIntent::VisitPlaza;
        a.suspended_goal = Some(GoalIntent::BusyAtWork);

        planner().complete_goal(&mut a, &mut w, SimTime(1_000));

        assert_eq!(a.goal, GoalIntent::GoWork);
        assert_eq!(a.goal_target, Some(GoalTarget::Structure(farm)));
        assert_eq!(a.nav.goal_structure, Some(farm));
        assert_eq!(a.suspended_goal, None);
    }

    #[test]
    fn job_search_hires_into_nearest_open_workplace() {
        let mut w = world();
        let near = built(&mut w, StructureKind::Farm, 5, 5);
        let _far = built(&mut w, StructureKind::Farm, 40, 40);
        let slot = spawn(&mut w, 10, 5);
        let clock = midday();
        w.refresh_analysis(clock.current_tick);

        let g = grid(&w);
        let mut eng = engine();
        let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
        planner().plan_agent(slot, &mut w, &mut ctx);

        let a = &w.agents[slot];
        assert_eq!(a.workplace, Some(near));
        assert!(w.structure(near).unwrap().workers.contains(&a.id));
        assert!(matches!(a.primary_goal, PrimaryGoal::WorkShift { .. }));
        assert!(matches!(a.goal, GoalIntent::GoWork | GoalIntent::BusyAtWork));
    }

    #[test]
    fn stale_analysis_means_no_jobs_this_tick() {
        let mut w = world();
        let farm = built(&mut w, StructureKind::Farm, 5, 5);
        let slot = spawn(&mut w, 10, 5);
        let clock = midday();
        w.refresh_analysis(Tick(0));

        let g = grid(&w);
        let mut eng = engine();
        let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
        let p = planner();
        p.plan_agent(slot, &mut w, &mut ctx);

        let a = &w.agents[slot];
        assert_eq!(a.workplace, None);
        assert!(w.structure(farm).unwrap().workers.is_empty());
        assert_eq!(a.next_job_search, clock.now.after_ms(p.config().job_search_cooldown_ms));
    }

    #[test]
    fn full_workplace_is_skipped() {
        let mut w = world();
        let farm = built(&mut w, StructureKind::Farm, 5, 5);
        let clock = midday();
        w.refresh_analysis(clock.current_tick);
        let p = planner();
        let g = grid(&w);
        let mut eng = engine();

        let slots: Vec<usize> = (0..5).map(|i| spawn(&mut w, 12 + i, 12)).collect();
        for &slot in &slots {
            let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
            p.plan_agent(slot, &mut w, &mut ctx);
        }
        // Farm capacity is 3.
        assert_eq!(w.structure(farm).unwrap().workers.len(), 3);
        let hired = w.agents.iter().filter(|a| a.workplace == Some(farm)).count();
        assert_eq!(hired, 3);
    }

    #[test]
    fn night_sends_everyone_home_to_sleep() {
        let mut w = world();
        let house = w.place_structure(StructureKind::House, super::helpers::at(20, 20)).unwrap();
        let resident = w.structure(house).unwrap().residents[0];
        let slot = w.agent_slot(resident).unwrap();
        let clock = clock_at(0);
        assert!(clock.day_phase().is_night());

        let g = grid(&w);
        let mut eng = engine();
        let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
        planner().plan_agent(slot, &mut w, &mut ctx);

        let a = &w.agents[slot];
        assert_eq!(a.goal, GoalIntent::GoHome);
        assert_eq!(a.activity, Activity::Sleeping);
    }

    #[test]
    fn morning_wakes_sleepers_and_starts_their_shift() {
        let mut w = world();
        let farm = built(&mut w, StructureKind::Farm, 5, 5);
        let slot = spawn(&mut w, 20, 20);
        let clock = clock_at(DAY * 3 / 10);
        let mut a = w.agents[slot].clone();
        a.workplace = Some(farm);
        a.activity = Activity::Sleeping;
        a.goal = GoalIntent::GoHome;
        a.needs.sleep = 50.0;
        w.patch_agent(slot, a);
        let aid = w.agents[slot].id;
        w.structure_mut(farm).unwrap().workers.push(aid);

        let g = grid(&w);
        let mut eng = engine();
        let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
        let p = planner();
        p.plan_agent(slot, &mut w, &mut ctx);

        let a = &w.agents[slot];
        assert_ne!(a.activity, Activity::Sleeping);
        assert_eq!(
            a.primary_goal,
            PrimaryGoal::WorkShift { ends_at: clock.now.after_ms(p.config().shift_length_ms) }
        );
    }

    #[test]
    fn tired_sleeper_keeps_sleeping_during_the_day() {
        let mut w = world();
        let slot = spawn(&mut w, 20, 20);
        let mut a = w.agents[slot].clone();
        a.activity = Activity::Sleeping;
        a.goal = GoalIntent::GoHome;
        a.needs.sleep = 40.0;
        w.patch_agent(slot, a);

        let clock = midday();
        let g = grid(&w);
        let mut eng = engine();
        let mut ctx = PlanContext { grid: &g, mobility: &mut eng, clock: &clock };
        planner().plan_agent(slot, &mut w, &mut ctx);
        assert_eq!(w.agents[slot].activity, Activity::Sleeping);
    }
}

#[cfg(test)]
mod cleanup {
    use tw_world::{GoalIntent, GoalTarget, Intent, PrimaryGoal, ResourceKind, StructureKind};
    use tw_core::SimTime;

    use super::helpers::{at, built, spawn, world};
    use crate::cleanup_stale_refs;

    #[test]
    fn removed_structures_leave_no_dangling_refs() {
        let mut w = world();
        let farm = built(&mut w, StructureKind::Farm, 5, 5);
        let house = w.place_structure(StructureKind::House, at(20, 20)).unwrap();
        let resident = w.structure(house).unwrap().residents[0];

        let slot = w.agent_slot(resident).unwrap();
        let mut a = w.agents[slot].clone();
        a.workplace = Some(farm);
        a.primary_goal = PrimaryGoal::WorkShift { ends_at: SimTime(99_000) };
        a.goal = GoalIntent::GoWork;
        a.goal_target = Some(GoalTarget::Structure(farm));
        a.intent = Intent::GetResource { target: farm, resource: ResourceKind::Grain };
        w.patch_agent(slot, a);
        w.structure_mut(farm).unwrap().workers.push(resident);

        w.remove_structure(farm).unwrap();
        w.remove_structure(house).unwrap();
        let (w, changed) = cleanup_stale_refs(w);
        assert!(changed);

        let a = w.agent(resident).unwrap();
        assert_eq!(a.workplace, None);
        assert_eq!(a.home, None);
        assert_eq!(a.primary_goal, PrimaryGoal::OffDuty);
        assert_eq!(a.goal, GoalIntent::Idle);
        assert_eq!(a.goal_target, None);
        assert_eq!(a.intent, Intent::Idle);
    }

    #[test]
    fn clean_world_reports_no_change() {
        let mut w = world();
        built(&mut w, StructureKind::Farm, 5, 5);
        spawn(&mut w, 20, 20);
        let (_, changed) = cleanup_stale_refs(w);
        assert!(!changed);
    }
}
