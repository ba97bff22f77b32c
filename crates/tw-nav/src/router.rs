//! Routing trait and the default two-phase grid router.
//!
//! # Pluggability
//!
//! Mobility calls routing through the [`Router`] trait, so a caller can swap
//! in a different search without touching the planner.  [`GridRouter`] is
//! the default:
//!
//! 1. Resolve a structure target to the nearest walkable tile adjacent to
//!    its footprint.
//! 2. Short trips (`direct_route_tiles`) go off-road directly.
//! 3. Otherwise find the nearest road tile to both ends (ring search), join
//!    them with a road-only 4-directional A* (memoised by tile pair), and
//!    stitch off-road 8-directional segments onto each end.
//! 4. With no road route, fall back to a single off-road segment.
//!
//! # Cost units
//!
//! Integer step costs: 10 straight, 14 diagonal, scaled by the destination
//! tile's terrain percentage, plus a flat turn penalty when the move
//! direction changes.  The heuristic is Chebyshev distance times the
//! cheapest possible step, so it stays consistent with the cost model.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;
use tracing::trace;

use tw_core::{NavConfig, StructureId, TilePos, TileRect, Vec2};
use tw_world::WorldSnapshot;

use crate::grid::{required_tiles, NavGrid, NEIGHBORS_8};
use crate::{NavError, NavResult};

const STRAIGHT: u32 = 10;
const DIAGONAL: u32 = 14;
/// Cheapest step: straight onto road (10 × 60 %).
const MIN_STEP: u32 = 6;
/// How far a blocked start or goal tile may be nudged to a passable one.
const SNAP_RADIUS: i32 = 3;

// ── Route types ───────────────────────────────────────────────────────────────

/// How a route was produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum RouteMode {
    /// Start and goal resolve to the same tile.
    Trivial,
    /// Short trip, off-road only.
    Direct,
    /// Off-road → road network → off-road.
    RoadNetwork,
    /// Road tiles exist near both ends but the road graph does not join
    /// them; off-road fallback.
    Disconnected,
    /// No road within the search radius of one end; off-road fallback.
    NoRoadNearby,
    /// Nothing found.  `waypoints` is empty.
    Failed,
}

/// Result of a routing query.
#[derive(Clone, Debug)]
pub struct RoutePlan {
    /// Simplified waypoints as packed tile coordinates.
    pub waypoints: Vec<u32>,
    pub mode: RouteMode,
    pub elapsed: Duration,
}

impl RoutePlan {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        self.waypoints.iter().map(|&p| TilePos::unpack(p))
    }
}

/// One routing query.
#[derive(Copy, Clone, Debug)]
pub struct RouteRequest {
    pub start: Vec2,
    pub target: Vec2,
    /// Route to the door of this structure instead of `target`'s tile.
    pub target_structure: Option<StructureId>,
    /// World-space agent radius every visited tile must clear.
    pub clearance: f32,
}

// ── Router trait ──────────────────────────────────────────────────────────────

/// Pluggable routing engine.
pub trait Router {
    /// Plan a route.  An empty waypoint list means "no route"; callers back
    /// off before asking again.
    fn plan_route(&mut self, grid: &NavGrid, world: &WorldSnapshot, req: &RouteRequest) -> RoutePlan;

    /// Drop memoised segments.  Must be called after every grid rebuild.
    fn clear_cache(&mut self);

    /// [`Router::plan_route`], with "no route" as an error.
    fn route(&mut self, grid: &NavGrid, world: &WorldSnapshot, req: &RouteRequest) -> NavResult<RoutePlan> {
        let plan = self.plan_route(grid, world, req);
        if plan.is_empty() {
            let ts = grid.tile_size();
            return Err(NavError::NoRoute { from: req.start.to_tile(ts), to: req.target.to_tile(ts) });
        }
        Ok(plan)
    }
}

// ── GridRouter ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub struct GridRouter {
    road_search_radius: i32,
    direct_route_tiles: i32,
    turn_penalty: u32,
    /// Road-only segments keyed by `(start, end, clearance tiles)`.  `None`
    /// memoises "not connected".
    road_cache: FxHashMap<(u32, u32, u8), Option<Arc<[u32]>>>,
    hits: u64,
    misses: u64,
}

impl GridRouter {
    pub fn new(cfg: &NavConfig) -> Self {
        Self {
            road_search_radius: cfg.road_search_radius.max(0),
            direct_route_tiles: cfg.direct_route_tiles.max(0),
            turn_penalty: cfg.turn_penalty,
            road_cache: FxHashMap::default(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        CacheStats { hits: self.hits, misses: self.misses, entries: self.road_cache.len() }
    }

    /// Nearest road tile to `from` within the search radius, by expanding
    /// Chebyshev rings.  Ties go to the smaller Euclidean offset, then to the
    /// smaller packed coordinate.
    pub fn nearest_road(&self, grid: &NavGrid, from: TilePos, clearance: f32) -> Option<TilePos> {
        nearest_matching(from, self.road_search_radius, |p| {
            grid.is_road(p.x, p.y) && grid.has_clearance(p.x, p.y, clearance)
        })
    }

    fn road_segment(&mut self, grid: &NavGrid, from: TilePos, to: TilePos, clearance: f32) -> Option<Arc<[u32]>> {
        let key = (from.pack(), to.pack(), required_tiles(clearance, grid.tile_size()).max(1));
        if let Some(hit) = self.road_cache.get(&key) {
            self.hits += 1;
            return hit.clone();
        }
        self.misses += 1;
        let found = astar(grid, from, to, &SearchRules::road(clearance)).map(Arc::from);
        self.road_cache.insert(key, found.clone());
        found
    }

    fn off_road(&self, grid: &NavGrid, from: TilePos, to: TilePos, clearance: f32) -> Option<Vec<u32>> {
        astar(grid, from, to, &SearchRules::off_road(clearance, self.turn_penalty))
    }

    /// Tile the route should end on.
    fn resolve_goal(&self, grid: &NavGrid, world: &WorldSnapshot, req: &RouteRequest, start: TilePos) -> Option<TilePos> {
        let ts = grid.tile_size();
        let passable = |p: TilePos| grid.has_clearance(p.x, p.y, req.clearance);

        let footprint = req
            .target_structure
            .and_then(|id| world.structure(id))
            .and_then(|s| world.catalog.get(s.kind).map(|spec| s.blocked_rect(spec, ts)));

        match footprint {
            Some(rect) => door_tile(rect, start, SNAP_RADIUS, passable),
            None => nearest_matching(req.target.to_tile(ts), SNAP_RADIUS, passable),
        }
    }
}

impl Router for GridRouter {
    fn plan_route(&mut self, grid: &NavGrid, world: &WorldSnapshot, req: &RouteRequest) -> RoutePlan {
        let t0 = Instant::now();
        let ts = grid.tile_size();
        let done = |waypoints: Vec<u32>, mode: RouteMode| RoutePlan { waypoints, mode, elapsed: t0.elapsed() };

        let passable = |p: TilePos| grid.has_clearance(p.x, p.y, req.clearance);
        let Some(start) = nearest_matching(req.start.to_tile(ts), SNAP_RADIUS, passable) else {
            return done(Vec::new(), RouteMode::Failed);
        };
        let Some(goal) = self.resolve_goal(grid, world, req, start) else {
            return done(Vec::new(), RouteMode::Failed);
        };

        if start == goal {
            return done(vec![goal.pack()], RouteMode::Trivial);
        }

        if start.chebyshev(goal) <= self.direct_route_tiles {
            let mode = RouteMode::Direct;
            return match self.off_road(grid, start, goal, req.clearance) {
                Some(path) => done(simplify(&path), mode),
                None => done(Vec::new(), RouteMode::Failed),
            };
        }

        let road_start = self.nearest_road(grid, start, req.clearance);
        let road_goal = self.nearest_road(grid, goal, req.clearance);

        let fallback_mode = match (road_start, road_goal) {
            (Some(rs), Some(rg)) => {
                if let Some(road) = self.road_segment(grid, rs, rg, req.clearance) {
                    let head = self.off_road(grid, start, rs, req.clearance);
                    let tail = self.off_road(grid, rg, goal, req.clearance);
                    if let (Some(head), Some(tail)) = (head, tail) {
                        let mut path = head;
                        path.extend(road.iter().skip(1).copied());
                        path.extend(tail.into_iter().skip(1));
                        trace!(%start, %goal, len = path.len(), "road route");
                        return done(simplify(&path), RouteMode::RoadNetwork);
                    }
                }
                RouteMode::Disconnected
            }
            _ => RouteMode::NoRoadNearby,
        };

        match self.off_road(grid, start, goal, req.clearance) {
            Some(path) => done(simplify(&path), fallback_mode),
            None => {
                trace!(%start, %goal, "no route");
                done(Vec::new(), RouteMode::Failed)
            }
        }
    }

    fn clear_cache(&mut self) {
        self.road_cache.clear();
    }
}

// ── Search helpers ────────────────────────────────────────────────────────────

/// First tile within `radius` rings of `from` satisfying `pred`.
fn nearest_matching(from: TilePos, radius: i32, pred: impl Fn(TilePos) -> bool) -> Option<TilePos> {
    if pred(from) {
        return Some(from);
    }
    for r in 1..=radius {
        let ring = TileRect::new(from.x - r, from.y - r, from.x + r + 1, from.y + r + 1);
        let best = ring
            .iter()
            .filter(|p| p.chebyshev(from) == r && pred(*p))
            .min_by_key(|p| {
                let dx = p.x - from.x;
                let dy = p.y - from.y;
                (dx * dx + dy * dy, p.pack())
            });
        if best.is_some() {
            return best;
        }
    }
    None
}

/// Nearest passable tile hugging `footprint`, measured from `start`.
/// Widens outward from the footprint up to `max_ring` tiles.
fn door_tile(footprint: TileRect, start: TilePos, max_ring: i32, pred: impl Fn(TilePos) -> bool) -> Option<TilePos> {
    for r in 1..=max_ring {
        let best = footprint
            .expand(r)
            .iter()
            .filter(|p| footprint.chebyshev_to(*p) == r && pred(*p))
            .min_by_key(|p| {
                let dx = p.x - start.x;
                let dy = p.y - start.y;
                (dx * dx + dy * dy, p.pack())
            });
        if best.is_some() {
            return best;
        }
    }
    None
}

struct SearchRules {
    road_only: bool,
    diagonal: bool,
    turn_penalty: u32,
    clearance: f32,
}

impl SearchRules {
    fn road(clearance: f32) -> Self {
        Self { road_only: true, diagonal: false, turn_penalty: 0, clearance }
    }

    fn off_road(clearance: f32, turn_penalty: u32) -> Self {
        Self { road_only: false, diagonal: true, turn_penalty, clearance }
    }

    #[inline]
    fn allows(&self, grid: &NavGrid, p: TilePos) -> bool {
        grid.has_clearance(p.x, p.y, self.clearance) && (!self.road_only || grid.is_road(p.x, p.y))
    }
}

/// Direction index used for the turn penalty; `8` = no previous move.
const NO_DIR: usize = 8;

/// A* over the grid.  State = (tile, incoming direction) so the turn
/// penalty stays exact.  Returns the tile sequence from `from` to `to`
/// inclusive.
fn astar(grid: &NavGrid, from: TilePos, to: TilePos, rules: &SearchRules) -> Option<Vec<u32>> {
    if !grid.in_bounds(from) || !grid.in_bounds(to) || !rules.allows(grid, from) || !rules.allows(grid, to) {
        return None;
    }
    if from == to {
        return Some(vec![from.pack()]);
    }

    let w = grid.width() as usize;
    let cells = w * grid.height() as usize;
    let dirs = if rules.diagonal { 8 } else { 4 };
    let state = |p: TilePos, d: usize| (p.y as usize * w + p.x as usize) * 9 + d;

    let mut best = vec![u32::MAX; cells * 9];
    let mut prev = vec![u32::MAX; cells * 9];
    let h = |p: TilePos| p.chebyshev(to) as u32 * MIN_STEP;

    let s0 = state(from, NO_DIR);
    best[s0] = 0;
    // (f, state id): the state id makes the ordering total.
    let mut heap: BinaryHeap<Reverse<(u32, u32)>> = BinaryHeap::new();
    heap.push(Reverse((h(from), s0 as u32)));

    while let Some(Reverse((f, sid))) = heap.pop() {
        let sid = sid as usize;
        let cell = sid / 9;
        let dir = sid % 9;
        let p = TilePos::new((cell % w) as i32, (cell / w) as i32);
        let g = best[sid];
        if f > g.saturating_add(h(p)) {
            continue;
        }

        if p == to {
            return Some(reconstruct(&prev, sid, w));
        }

        for (nd, &(dx, dy)) in NEIGHBORS_8.iter().enumerate().take(dirs) {
            let n = p.offset(dx, dy);
            if !grid.in_bounds(n) || !rules.allows(grid, n) {
                continue;
            }
            let diagonal = dx != 0 && dy != 0;
            // No corner cutting: both orthogonal neighbours must be clear.
            if diagonal && !(rules.allows(grid, p.offset(dx, 0)) && rules.allows(grid, p.offset(0, dy))) {
                continue;
            }
            let base = if diagonal { DIAGONAL } else { STRAIGHT };
            let mut step = (base * grid.cost_pct(n.x, n.y) + 50) / 100;
            if dir != NO_DIR && dir != nd {
                step += rules.turn_penalty;
            }
            let ng = g.saturating_add(step.max(1));
            let nsid = state(n, nd);
            if ng < best[nsid] {
                best[nsid] = ng;
                prev[nsid] = sid as u32;
                heap.push(Reverse((ng + h(n), nsid as u32)));
            }
        }
    }
    None
}

fn reconstruct(prev: &[u32], end: usize, w: usize) -> Vec<u32> {
    let mut out = Vec::new();
    let mut cur = end;
    loop {
        let cell = cur / 9;
        out.push(TilePos::new((cell % w) as i32, (cell / w) as i32).pack());
        let p = prev[cur];
        if p == u32::MAX {
            break;
        }
        cur = p as usize;
    }
    out.reverse();
    out
}

/// Drop interior waypoints that lie on a straight continuation of their
/// neighbours (zero cross product, same heading).
pub fn simplify(path: &[u32]) -> Vec<u32> {
    if path.len() <= 2 {
        return path.to_vec();
    }
    let mut out = vec![path[0]];
    for i in 1..path.len() - 1 {
        let a = TilePos::unpack(*out.last().unwrap_or(&path[0]));
        let b = TilePos::unpack(path[i]);
        let c = TilePos::unpack(path[i + 1]);
        let (ux, uy) = (b.x - a.x, b.y - a.y);
        let (vx, vy) = (c.x - b.x, c.y - b.y);
        let cross = ux * vy - uy * vx;
        let dot = ux * vx + uy * vy;
        if cross != 0 || dot <= 0 {
            out.push(path[i]);
        }
    }
    out.push(path[path.len() - 1]);
    out
}
