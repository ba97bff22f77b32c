//! Unit tests for tw-economy.

#[cfg(test)]
mod helpers {
    use tw_core::{AgentId, EconomyConfig, SimTime, StructureId, Vec2};
    use tw_world::{Agent, Intent, StructureCatalog, StructureKind, TileKind, TileMap, WorldSnapshot};

    use crate::EconomyEngine;

    pub const TS: f32 = 16.0;
    pub const NOW: SimTime = SimTime(10_000);

    pub fn world() -> WorldSnapshot {
        WorldSnapshot::new(TileMap::new(48, 48, TileKind::Grass), StructureCatalog::default(), TS, 3)
    }

    pub fn at(x: i32, y: i32) -> Vec2 {
        Vec2::new(x as f32 * TS, y as f32 * TS)
    }

    /// Placed and left unbuilt (kinds with a build cost start incomplete).
    pub fn site(w: &mut WorldSnapshot, kind: StructureKind, x: i32, y: i32) -> StructureId {
        w.place_structure(kind, at(x, y)).unwrap()
    }

    pub fn built(w: &mut WorldSnapshot, kind: StructureKind, x: i32, y: i32) -> StructureId {
        let id = site(w, kind, x, y);
        let s = w.structure_mut(id).unwrap();
        s.complete = true;
        s.build_started = true;
        s.build_progress = 100.0;
        id
    }

    pub fn stock(w: &mut WorldSnapshot, id: StructureId, r: tw_world::ResourceKind, qty: u32) {
        w.structure_mut(id).unwrap().inventory.insert(r, qty);
    }

    /// Centre of the tile in front of the door: inside the influence area.
    pub fn beside(w: &WorldSnapshot, id: StructureId) -> Vec2 {
        let s = w.structure(id).unwrap();
        let spec = w.catalog.get(s.kind).unwrap();
        s.door_tile(spec, TS).center(TS)
    }

    pub fn worker(w: &mut WorldSnapshot, pos: Vec2, intent: Intent) -> AgentId {
        let id = w.spawn_agent(pos, None);
        w.agent_mut(id).unwrap().intent = intent;
        w.refresh_indices();
        id
    }

    pub fn agent(w: &WorldSnapshot, id: AgentId) -> &Agent {
        w.agent(id).unwrap()
    }

    pub fn engine() -> EconomyEngine {
        EconomyEngine::new(&EconomyConfig::default())
    }

    pub fn engine_with(f: impl FnOnce(&mut EconomyConfig)) -> EconomyEngine {
        let mut cfg = EconomyConfig::default();
        f(&mut cfg);
        EconomyEngine::new(&cfg)
    }
}

#[cfg(test)]
mod construction {
    use tw_core::Vec2;
    use tw_world::{Intent, ResourceKind::Wood, StructureKind};

    use super::helpers::{beside, engine, engine_with, site, stock, worker, world, NOW};

    #[test]
    fn cost_is_consumed_in_the_tick_a_builder_arrives() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        stock(&mut w, store, Wood, 10);
        let pos = beside(&w, store);
        let b = worker(&mut w, pos, Intent::Construct { target: store });
        let inv_rev = w.revisions.inventory;

        let report = engine().step(&mut w, 50, NOW);
        let s = w.structure(store).unwrap();
        assert!(s.build_started);
        assert_eq!(s.stock(Wood), 0);
        assert!(!s.complete);
        assert!((s.build_progress - 0.5).abs() < 1e-4);
        assert_eq!(report.sites_started, 1);
        assert_eq!(w.revisions.inventory, inv_rev + 1);

        // Builder walks off: the started site completes on the next tick.
        w.agent_mut(b).unwrap().intent = Intent::Work;
        let struct_rev = w.revisions.structure;
        let report = engine().step(&mut w, 50, NOW.after_ms(50));
        assert_eq!(report.sites_completed, 1);
        let s = w.structure(store).unwrap();
        assert!(s.complete);
        assert_eq!(s.build_progress, 100.0);
        assert_eq!(w.revisions.structure, struct_rev + 1);
    }

    #[test]
    fn delivered_site_without_builder_completes_next_tick() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        stock(&mut w, store, Wood, 5);
        let pos = beside(&w, store);
        let h = worker(&mut w, pos, Intent::StoreResource { target: store });
        w.agent_mut(h).unwrap().carrying = Some(tw_world::CarriedItem { resource: Wood, quantity: 5 });

        let report = engine().step(&mut w, 50, NOW);
        assert_eq!(report.delivered, 5);
        let s = w.structure(store).unwrap();
        assert_eq!(s.stock(Wood), 10);
        assert!(!s.complete);

        engine().step(&mut w, 50, NOW.after_ms(50));
        let s = w.structure(store).unwrap();
        assert!(s.complete);
        assert!(s.build_started);
        assert_eq!(s.stock(Wood), 0);
    }

    #[test]
    fn free_complete_can_be_switched_off() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        stock(&mut w, store, Wood, 10);
        let eng = engine_with(|c| c.free_complete = false);
        for i in 0..3 {
            eng.step(&mut w, 50, NOW.after_ms(i * 50));
        }
        let s = w.structure(store).unwrap();
        assert!(!s.complete);
        assert!(!s.build_started);
        assert_eq!(s.stock(Wood), 10);
    }

    #[test]
    fn progress_scales_with_builders_and_releases_them() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        stock(&mut w, store, Wood, 10);
        let pos = beside(&w, store);
        let a = worker(&mut w, pos, Intent::Construct { target: store });
        let b = worker(&mut w, pos + Vec2::new(2.0, 0.0), Intent::Construct { target: store });
        assert_eq!(engine().builders_at(&w, store).unwrap(), 2);

        engine().step(&mut w, 1_000, NOW);
        assert!((w.structure(store).unwrap().build_progress - 20.0).abs() < 1e-3);

        for i in 1..5 {
            engine().step(&mut w, 1_000, NOW.after_ms(i * 1_000));
        }
        assert!(w.structure(store).unwrap().complete);
        assert_eq!(w.agent(a).unwrap().intent, Intent::Work);
        assert_eq!(w.agent(b).unwrap().intent, Intent::Work);
    }

    #[test]
    fn short_site_does_not_start() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        stock(&mut w, store, Wood, 9);
        let pos = beside(&w, store);
        worker(&mut w, pos, Intent::Construct { target: store });
        let report = engine().step(&mut w, 1_000, NOW);
        assert_eq!(report, crate::EconomyReport::default());
        let s = w.structure(store).unwrap();
        assert!(!s.build_started);
        assert_eq!(s.build_progress, 0.0);
    }

    #[test]
    fn distant_builder_does_not_count() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        worker(&mut w, super::helpers::at(40, 40), Intent::Construct { target: store });
        assert_eq!(engine().builders_at(&w, store).unwrap(), 0);
        assert!(engine().builders_at(&w, tw_core::StructureId(99)).is_err());
    }
}

#[cfg(test)]
mod production {
    use tw_core::AgentId;
    use tw_world::{ResourceKind::Wood, StructureKind};

    use super::helpers::{built, engine, stock, world, NOW};

    #[test]
    fn accumulates_worker_time() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        w.structure_mut(wc).unwrap().workers = vec![AgentId(100), AgentId(101)];

        let report = engine().step(&mut w, 2_000, NOW);
        assert_eq!(report.batches_produced, 0);
        assert_eq!(w.structure(wc).unwrap().production_acc_ms, 4_000);

        let report = engine().step(&mut w, 1_000, NOW);
        assert_eq!(report.batches_produced, 1);
        let s = w.structure(wc).unwrap();
        assert_eq!(s.stock(Wood), 2);
        assert_eq!(s.production_acc_ms, 0);
    }

    #[test]
    fn extra_workers_past_the_cap_do_nothing() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        w.structure_mut(wc).unwrap().workers = (0..5).map(AgentId).collect();
        engine().step(&mut w, 1_000, NOW);
        assert_eq!(w.structure(wc).unwrap().production_acc_ms, 2_000);
    }

    #[test]
    fn blocked_output_keeps_progress() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        w.structure_mut(wc).unwrap().workers = vec![AgentId(100)];
        stock(&mut w, wc, Wood, 19);
        let rev = w.revisions.inventory;

        let report = engine().step(&mut w, 9_000, NOW);
        assert_eq!(report.batches_produced, 0);
        assert_eq!(w.revisions.inventory, rev);
        let s = w.structure(wc).unwrap();
        assert_eq!(s.stock(Wood), 19);
        assert_eq!(s.production_acc_ms, 9_000);

        w.structure_mut(wc).unwrap().withdraw(Wood, 1);
        let report = engine().step(&mut w, 0, NOW);
        assert_eq!(report.batches_produced, 1);
        let s = w.structure(wc).unwrap();
        assert_eq!(s.stock(Wood), 20);
        assert_eq!(s.production_acc_ms, 3_000);
    }

    #[test]
    fn long_block_loses_no_time() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        w.structure_mut(wc).unwrap().workers = vec![AgentId(100)];
        stock(&mut w, wc, Wood, 20);

        let eng = engine();
        for _ in 0..30 {
            eng.step(&mut w, 1_000, NOW);
        }
        assert_eq!(w.structure(wc).unwrap().production_acc_ms, 30_000);

        // Room for two batches: both fire at once, the rest stays banked.
        w.structure_mut(wc).unwrap().withdraw(Wood, 4);
        let report = eng.step(&mut w, 0, NOW);
        assert_eq!(report.batches_produced, 2);
        assert_eq!(w.structure(wc).unwrap().production_acc_ms, 18_000);
    }

    #[test]
    fn idle_producer_stands_still() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        engine().step(&mut w, 60_000, NOW);
        let s = w.structure(wc).unwrap();
        assert_eq!(s.production_acc_ms, 0);
        assert_eq!(s.stock(Wood), 0);
    }
}

#[cfg(test)]
mod transformation {
    use tw_world::{Activity, Intent, ResourceKind::{Bread, Grain}, StructureKind};

    use super::helpers::{beside, built, engine, stock, worker, world, NOW};

    fn staffed_bakery(w: &mut tw_world::WorldSnapshot) -> (tw_core::StructureId, tw_core::AgentId) {
        let bakery = built(w, StructureKind::Bakery, 10, 10);
        let pos = beside(w, bakery);
        let baker = worker(w, pos, Intent::Work);
        let a = w.agent_mut(baker).unwrap();
        a.workplace = Some(bakery);
        a.activity = Activity::Working;
        w.structure_mut(bakery).unwrap().workers.push(baker);
        (bakery, baker)
    }

    #[test]
    fn one_batch_per_tick_while_worked() {
        let mut w = world();
        let (bakery, _) = staffed_bakery(&mut w);
        stock(&mut w, bakery, Grain, 5);

        let report = engine().step(&mut w, 50, NOW);
        assert_eq!(report.batches_transformed, 1);
        let s = w.structure(bakery).unwrap();
        assert_eq!(s.stock(Grain), 3);
        assert_eq!(s.stock(Bread), 1);
    }

    #[test]
    fn full_output_keeps_inputs() {
        let mut w = world();
        let (bakery, _) = staffed_bakery(&mut w);
        stock(&mut w, bakery, Grain, 4);
        stock(&mut w, bakery, Bread, 10);

        assert_eq!(engine().step(&mut w, 50, NOW).batches_transformed, 0);
        assert_eq!(w.structure(bakery).unwrap().stock(Grain), 4);
    }

    #[test]
    fn absent_worker_means_no_batch() {
        let mut w = world();
        let (bakery, baker) = staffed_bakery(&mut w);
        stock(&mut w, bakery, Grain, 4);
        w.agent_mut(baker).unwrap().activity = Activity::Visiting;

        assert_eq!(engine().step(&mut w, 50, NOW).batches_transformed, 0);
        assert_eq!(w.structure(bakery).unwrap().stock(Grain), 4);
    }
}

#[cfg(test)]
mod hauling {
    use tw_world::{CarriedItem, Intent, ResourceKind::Wood, StructureKind};

    use super::helpers::{agent, at, beside, built, engine, site, stock, worker, world, NOW};

    #[test]
    fn pickup_fills_hands_and_turns_into_delivery() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        let store = site(&mut w, StructureKind::Store, 20, 20);
        stock(&mut w, wc, Wood, 8);
        w.refresh_poi_index();
        let pos = beside(&w, wc);
        let h = worker(&mut w, pos, Intent::GetResource { target: wc, resource: Wood });

        let report = engine().step(&mut w, 50, NOW);
        assert_eq!(report.picked_up, 5);
        assert_eq!(w.structure(wc).unwrap().stock(Wood), 3);
        let a = agent(&w, h);
        assert_eq!(a.carrying, Some(CarriedItem { resource: Wood, quantity: 5 }));
        assert_eq!(a.intent, Intent::StoreResource { target: store });
        // Inventory moved: the index built before the pass is stale now.
        assert!(w.poi_index().is_none());
    }

    #[test]
    fn partial_deposit_retargets_with_cooldown() {
        let mut w = world();
        let near = site(&mut w, StructureKind::Store, 10, 10);
        let far = site(&mut w, StructureKind::Store, 30, 30);
        stock(&mut w, near, Wood, 8);
        w.refresh_poi_index();
        let pos = beside(&w, near);
        let h = worker(&mut w, pos, Intent::StoreResource { target: near });
        w.agent_mut(h).unwrap().carrying = Some(CarriedItem { resource: Wood, quantity: 5 });

        let eng = engine();
        let report = eng.step(&mut w, 50, NOW);
        assert_eq!(report.delivered, 2);
        assert_eq!(report.retargeted, 1);
        let a = agent(&w, h);
        assert_eq!(a.carrying, Some(CarriedItem { resource: Wood, quantity: 3 }));
        assert_eq!(a.intent, Intent::StoreResource { target: far });
        assert_eq!(a.retarget_cooldown_until, NOW.after_ms(eng.config().retarget_cooldown_ms));
    }

    #[test]
    fn full_deposit_frees_the_hauler() {
        let mut w = world();
        let store = site(&mut w, StructureKind::Store, 10, 10);
        let pos = beside(&w, store);
        let h = worker(&mut w, pos, Intent::StoreResource { target: store });
        w.agent_mut(h).unwrap().carrying = Some(CarriedItem { resource: Wood, quantity: 4 });

        engine().step(&mut w, 50, NOW);
        let a = agent(&w, h);
        assert_eq!(a.carrying, None);
        assert_eq!(a.intent, Intent::Work);
        assert_eq!(w.structure(store).unwrap().stock(Wood), 4);
    }

    #[test]
    fn out_of_reach_hauler_waits() {
        let mut w = world();
        let wc = built(&mut w, StructureKind::Woodcutter, 5, 5);
        stock(&mut w, wc, Wood, 8);
        let h = worker(&mut w, at(30, 30), Intent::GetResource { target: wc, resource: Wood });
        let rev = w.revisions.inventory;

        engine().step(&mut w, 50, NOW);
        assert_eq!(agent(&w, h).carrying, None);
        assert_eq!(w.structure(wc).unwrap().stock(Wood), 8);
        assert_eq!(w.revisions.inventory, rev);
    }
}
