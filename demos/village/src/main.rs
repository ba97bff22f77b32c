//! village — one simulated day of a small town.
//!
//! Lays out a road-crossed 64×48 map with three houses, a woodcutter, a
//! farm, a depot and a tavern, runs a full day through the standard
//! pipeline and prints what happened.  Pass a path to a TOML config to
//! override the defaults; set `RUST_LOG=debug` for per-structure logging.
//!
//! With `--save <file>` the final world is written as JSON.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tw_core::{SimConfig, Tick, TilePos, TileRect, Vec2};
use tw_nav::GridRouter;
use tw_sim::{PhaseTag, Sim, SimBuilder, SimObserver, TickStats};
use tw_world::{StructureCatalog, StructureKind, TileKind, TileMap, WorldSnapshot};

// ── Constants ─────────────────────────────────────────────────────────────────

const MAP_W: i32 = 64;
const MAP_H: i32 = 48;
const ROAD_ROW: i32 = 24;
const ROAD_COL: i32 = 32;

// ── Observer ──────────────────────────────────────────────────────────────────

/// Counts what the run did, phase by phase.
#[derive(Default)]
struct TownObserver {
    ticks: u64,
    ai_ticks: u64,
    nav_rebuilds: u64,
    economy_changes: u64,
    peak_fields: usize,
    nav_errors: u64,
}

impl SimObserver for TownObserver {
    fn on_phase_end(&mut self, _tick: Tick, phase: PhaseTag, changed: bool) {
        if changed && phase == PhaseTag::Economy {
            self.economy_changes += 1;
        }
    }

    fn on_publish(&mut self, _tick: Tick, world: &Arc<WorldSnapshot>) {
        self.peak_fields = self.peak_fields.max(world.fields.len());
    }

    fn on_nav_consistency_error(&mut self, tick: Tick, region: TileRect) {
        tracing::warn!(tick = tick.0, ?region, "navigation grid mismatch");
        self.nav_errors += 1;
    }

    fn on_tick_end(&mut self, _tick: Tick, stats: &TickStats) {
        self.ticks += 1;
        self.ai_ticks += stats.ai_tick as u64;
        self.nav_rebuilds += stats.nav_rebuilt as u64;
    }
}

// ── World ─────────────────────────────────────────────────────────────────────

fn tile(x: i32, y: i32, ts: f32) -> Vec2 {
    Vec2::new(x as f32 * ts, y as f32 * ts)
}

fn build_world(config: &SimConfig) -> Result<WorldSnapshot> {
    let ts = config.tile_size;
    let mut world =
        WorldSnapshot::new(TileMap::new(MAP_W, MAP_H, TileKind::Grass), StructureCatalog::default(), ts, config.seed);

    for x in 0..MAP_W {
        world.set_tile(TilePos::new(x, ROAD_ROW), TileKind::Road)?;
    }
    for y in 0..MAP_H {
        world.set_tile(TilePos::new(ROAD_COL, y), TileKind::Road)?;
    }
    for y in 36..42 {
        for x in 4..12 {
            world.set_tile(TilePos::new(x, y), TileKind::Water)?;
        }
    }

    let layout = [
        (StructureKind::House, 6, 28),
        (StructureKind::House, 12, 28),
        (StructureKind::House, 18, 28),
        (StructureKind::Woodcutter, 48, 30),
        (StructureKind::Farm, 44, 10),
        (StructureKind::Depot, 26, 18),
        (StructureKind::Tavern, 36, 28),
    ];
    for (kind, x, y) in layout {
        world.place_structure(kind, tile(x, y, ts)).with_context(|| format!("placing {kind:?} at ({x}, {y})"))?;
    }
    Ok(world)
}

fn load_config(path: Option<&str>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    Ok(SimConfig::from_toml_str(&text)?)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let save = args.iter().position(|a| a == "--save").and_then(|i| args.get(i + 1)).cloned();
    let config_path = args.iter().find(|a| !a.starts_with("--") && Some(*a) != save.as_ref());
    let config = load_config(config_path.map(String::as_str))?;

    let ticks = config.day_length_ms / config.tick_ms;
    println!("=== village — rust_town ===");
    println!("Map: {MAP_W}×{MAP_H}  |  Seed: {}  |  Ticks: {ticks} ({} ms each)", config.seed, config.tick_ms);

    let world = build_world(&config)?;
    println!("Structures: {}  |  Agents: {}", world.structures.len(), world.agents.len());
    println!();

    let mut sim: Sim<GridRouter> = SimBuilder::new(config, world).build()?;
    let mut obs = TownObserver::default();

    let t0 = Instant::now();
    sim.run_ticks(ticks, &mut obs);
    let elapsed = t0.elapsed();
    info!(ticks = obs.ticks, elapsed_ms = elapsed.as_millis() as u64, "day complete");

    println!("Simulation complete in {:.3} s", elapsed.as_secs_f64());
    println!("  ticks            : {} ({} AI)", obs.ticks, obs.ai_ticks);
    println!("  nav rebuilds     : {}", obs.nav_rebuilds);
    println!("  economy changes  : {}", obs.economy_changes);
    println!("  peak fields      : {}", obs.peak_fields);
    println!("  nav mismatches   : {}", obs.nav_errors);
    println!("  relationships    : {}", sim.world().ledger.iter().count());
    println!();

    let world = sim.snapshot();
    println!("{:<6} {:<12} {:<14} {:>6} {:>6} {:>6}", "Agent", "Activity", "Carrying", "Sleep", "Social", "Fun");
    println!("{}", "-".repeat(56));
    for a in world.agents.iter() {
        let carrying = a.carrying.as_ref().map(|c| format!("{:?}×{}", c.resource, c.quantity)).unwrap_or_else(|| "-".into());
        println!(
            "{:<6} {:<12} {:<14} {:>6.1} {:>6.1} {:>6.1}",
            a.id.to_string(),
            format!("{:?}", a.activity),
            carrying,
            a.needs.sleep,
            a.needs.social,
            a.needs.fun,
        );
    }
    println!();

    println!("{:<6} {:<12} {:<10} {:<24}", "Id", "Kind", "Complete", "Inventory");
    println!("{}", "-".repeat(56));
    for s in world.structures.iter() {
        let stock: Vec<String> = s.inventory.iter().map(|(r, n)| format!("{r:?}:{n}")).collect();
        println!("{:<6} {:<12} {:<10} {:<24}", s.id.to_string(), format!("{:?}", s.kind), s.complete, stock.join(" "));
    }

    if let Some(path) = save {
        let json = sim.to_persisted().to_json()?;
        std::fs::write(&path, json).with_context(|| format!("writing {path}"))?;
        println!();
        println!("Saved world to {path}");
    }

    Ok(())
}
