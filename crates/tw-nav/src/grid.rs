//! Navigation Grid: walkability bytes plus a capped clearance field.
//!
//! # Layout
//!
//! Three parallel row-major arrays over the map tiles (row 0 at the bottom):
//!
//! | Array       | Values                                                     |
//! |-------------|------------------------------------------------------------|
//! | `cells`     | `0` blocked, `1` walkable, `2` road                        |
//! | `cost_pct`  | terrain step cost in percent of a grass step               |
//! | `clearance` | Chebyshev distance in tiles to the nearest blocked cell    |
//!
//! The map edge counts as blocked, and clearance is capped at
//! `max_clearance`.  With both rules the field is 1-Lipschitz and bounded,
//! which is what lets a partial rebuild seed its window from the ring of
//! untouched cells around it and still match a full rebuild exactly, as long
//! as the rebuild margin is at least the cap.
//!
//! # Invariant
//!
//! `clearance(x, y) == 0 ⇔ cells(x, y) == 0` for every cell, after every
//! rebuild.

use tracing::{debug, warn};

use tw_core::{NavConfig, SimRng, TilePos, TileRect};
use tw_world::{Prop, Structure, StructureCatalog, TileKind, TileMap, WorldSnapshot};

use crate::{NavError, NavResult};

pub const BLOCKED: u8 = 0;
pub const WALKABLE: u8 = 1;
pub const ROAD: u8 = 2;

/// Everything that rasterizes into the grid.
#[derive(Copy, Clone)]
pub struct NavSources<'a> {
    pub tiles: &'a TileMap,
    pub structures: &'a [Structure],
    pub props: &'a [Prop],
    pub catalog: &'a StructureCatalog,
    pub tile_size: f32,
}

impl<'a> NavSources<'a> {
    pub fn from_world(world: &'a WorldSnapshot) -> Self {
        Self {
            tiles: &world.tiles,
            structures: &world.structures,
            props: &world.props,
            catalog: &world.catalog,
            tile_size: world.tile_size,
        }
    }
}

/// What one `update` call did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RebuildReport {
    /// Region whose cells were re-rasterized and whose clearance was
    /// recomputed.
    pub region: TileRect,
    pub full: bool,
    /// A self-check or sample comparison found a mismatch on this rebuild.
    pub mismatch: bool,
}

#[derive(Clone, Debug)]
pub struct NavGrid {
    width: i32,
    height: i32,
    tile_size: f32,
    max_clearance: u8,
    dirty_margin: i32,
    self_check: bool,
    clearance_samples: u32,

    cells: Vec<u8>,
    cost_pct: Vec<u8>,
    clearance: Vec<u8>,

    generation: u64,
    consistency_error: bool,
}

impl NavGrid {
    /// An empty (all-blocked) grid.  Call [`NavGrid::rebuild_full`] before use.
    pub fn new(width: i32, height: i32, tile_size: f32, cfg: &NavConfig) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        let n = (width * height) as usize;
        Self {
            width,
            height,
            tile_size,
            max_clearance: cfg.max_clearance.max(1),
            dirty_margin: cfg.dirty_margin.max(cfg.max_clearance) as i32,
            self_check: cfg.self_check,
            clearance_samples: cfg.clearance_samples,
            cells: vec![BLOCKED; n],
            cost_pct: vec![100; n],
            clearance: vec![0; n],
            generation: 0,
            consistency_error: false,
        }
    }

    /// Build a grid for `src` from scratch.
    pub fn build(src: &NavSources<'_>, cfg: &NavConfig) -> Self {
        let mut grid = NavGrid::new(src.tiles.width, src.tiles.height, src.tile_size, cfg);
        grid.rebuild_full(src);
        grid
    }

    // ── Queries ───────────────────────────────────────────────────────────

    #[inline]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline]
    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    #[inline]
    pub fn bounds(&self) -> TileRect {
        TileRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    pub fn in_bounds(&self, p: TilePos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    fn slot(&self, x: i32, y: i32) -> usize {
        (y * self.width + x) as usize
    }

    /// Raw cell byte; out-of-bounds reads as blocked.
    #[inline]
    pub fn cell(&self, x: i32, y: i32) -> u8 {
        if self.in_bounds(TilePos::new(x, y)) { self.cells[self.slot(x, y)] } else { BLOCKED }
    }

    #[inline]
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) != BLOCKED
    }

    #[inline]
    pub fn is_road(&self, x: i32, y: i32) -> bool {
        self.cell(x, y) == ROAD
    }

    /// Clearance in tiles; zero out of bounds.
    #[inline]
    pub fn clearance(&self, x: i32, y: i32) -> u8 {
        if self.in_bounds(TilePos::new(x, y)) { self.clearance[self.slot(x, y)] } else { 0 }
    }

    pub fn clearance_at(&self, p: TilePos) -> NavResult<u8> {
        if !self.in_bounds(p) {
            return Err(NavError::OutOfBounds(p));
        }
        Ok(self.clearance[self.slot(p.x, p.y)])
    }

    /// Terrain cost of stepping onto `(x, y)`, percent of grass.
    #[inline]
    pub fn cost_pct(&self, x: i32, y: i32) -> u32 {
        if self.in_bounds(TilePos::new(x, y)) { self.cost_pct[self.slot(x, y)] as u32 } else { 100 }
    }

    /// `true` if an agent of world-space radius `radius` fits at `(x, y)`.
    ///
    /// The radius is converted to tiles by ceiling division, so clearance is
    /// never overestimated.
    #[inline]
    pub fn has_clearance(&self, x: i32, y: i32, radius: f32) -> bool {
        let required = required_tiles(radius, self.tile_size).max(1);
        self.clearance(x, y) >= required
    }

    /// Bumped on every rebuild.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Sticky: set by the first consistency mismatch, cleared only by
    /// [`NavGrid::clear_consistency_error`].
    #[inline]
    pub fn consistency_error(&self) -> bool {
        self.consistency_error
    }

    pub fn clear_consistency_error(&mut self) {
        self.consistency_error = false;
    }

    // ── Rebuild ───────────────────────────────────────────────────────────

    /// Full rebuild when `dirty` is `None` or the map was resized, partial
    /// otherwise.
    pub fn update(&mut self, src: &NavSources<'_>, dirty: Option<TileRect>) -> RebuildReport {
        let resized = src.tiles.width != self.width || src.tiles.height != self.height;
        match dirty {
            Some(rect) if !resized => self.rebuild_region(src, rect),
            _ => self.rebuild_full(src),
        }
    }

    pub fn rebuild_full(&mut self, src: &NavSources<'_>) -> RebuildReport {
        if src.tiles.width != self.width || src.tiles.height != self.height {
            let n = (src.tiles.width.max(0) * src.tiles.height.max(0)) as usize;
            self.width = src.tiles.width.max(0);
            self.height = src.tiles.height.max(0);
            self.cells = vec![BLOCKED; n];
            self.cost_pct = vec![100; n];
            self.clearance = vec![0; n];
        }
        self.tile_size = src.tile_size;

        let region = self.bounds();
        self.rasterize(src, region);
        self.compute_clearance(region);
        self.generation += 1;

        let mismatch = self.sample_check();
        debug!(generation = self.generation, "navigation grid rebuilt (full)");
        RebuildReport { region, full: true, mismatch }
    }

    /// Re-rasterize `dirty` grown by the safety margin and recompute
    /// clearance inside that window only.
    pub fn rebuild_region(&mut self, src: &NavSources<'_>, dirty: TileRect) -> RebuildReport {
        let region = dirty.expand(self.dirty_margin).clamp_to(self.width, self.height);
        if region.is_empty() {
            return RebuildReport { region, full: false, mismatch: false };
        }
        self.rasterize(src, region);
        self.compute_clearance(region);
        self.generation += 1;

        let mut mismatch = self.sample_check();
        if self.self_check {
            mismatch |= self.reference_check(src);
        }
        debug!(generation = self.generation, ?region, "navigation grid rebuilt (partial)");
        RebuildReport { region, full: false, mismatch }
    }

    /// Terrain, then structure footprints, then props; later layers
    /// overwrite earlier ones.
    fn rasterize(&mut self, src: &NavSources<'_>, region: TileRect) {
        for p in region.iter() {
            let kind = src.tiles.get(p).unwrap_or(TileKind::Rock);
            let slot = self.slot(p.x, p.y);
            self.cells[slot] = match kind {
                k if k.is_blocking() => BLOCKED,
                TileKind::Road => ROAD,
                _ => WALKABLE,
            };
            self.cost_pct[slot] = kind.cost_pct().min(u8::MAX as u32) as u8;
        }

        for s in src.structures {
            let Some(spec) = src.catalog.get(s.kind) else { continue };
            self.block(s.blocked_rect(spec, src.tile_size), region);
        }
        for prop in src.props {
            self.block(prop.footprint(), region);
        }
    }

    fn block(&mut self, footprint: TileRect, region: TileRect) {
        if !footprint.intersects(&region) {
            return;
        }
        let r = TileRect::new(
            footprint.x0.max(region.x0),
            footprint.y0.max(region.y0),
            footprint.x1.min(region.x1),
            footprint.y1.min(region.y1),
        );
        for p in r.iter() {
            let slot = self.slot(p.x, p.y);
            self.cells[slot] = BLOCKED;
        }
    }

    /// Multi-source expansion over `region` with a bucket queue.
    ///
    /// Seeds: every blocked cell at 0, every cell at its distance to the map
    /// edge, and (for a partial window) every cell adjacent to the ring just
    /// outside `region` at that ring cell's value plus one.
    fn compute_clearance(&mut self, region: TileRect) {
        let cap = self.max_clearance;
        let mut buckets: Vec<Vec<u32>> = vec![Vec::new(); cap as usize + 1];

        for p in region.iter() {
            let slot = self.slot(p.x, p.y);
            let v = if self.cells[slot] == BLOCKED { 0 } else { self.edge_distance(p).min(cap) };
            self.clearance[slot] = v;
        }

        // Ring seeds: values outside the window are exact and unchanged.
        let full = self.bounds();
        let ring = region.expand(1).clamp_to(self.width, self.height);
        if ring != region {
            for p in ring.iter().filter(|p| !region.contains(*p)) {
                let outside = self.clearance[self.slot(p.x, p.y)];
                if outside >= cap {
                    continue;
                }
                for (dx, dy) in NEIGHBORS_8 {
                    let n = p.offset(dx, dy);
                    if region.contains(n) && full.contains(n) {
                        let slot = self.slot(n.x, n.y);
                        if outside + 1 < self.clearance[slot] {
                            self.clearance[slot] = outside + 1;
                        }
                    }
                }
            }
        }

        for p in region.iter() {
            let v = self.clearance[self.slot(p.x, p.y)];
            if v < cap {
                buckets[v as usize].push(p.pack());
            }
        }

        for d in 0..cap {
            let mut i = 0;
            while i < buckets[d as usize].len() {
                let p = TilePos::unpack(buckets[d as usize][i]);
                i += 1;
                if self.clearance[self.slot(p.x, p.y)] != d {
                    continue;
                }
                for (dx, dy) in NEIGHBORS_8 {
                    let n = p.offset(dx, dy);
                    if !region.contains(n) {
                        continue;
                    }
                    let slot = self.slot(n.x, n.y);
                    if d + 1 < self.clearance[slot] {
                        self.clearance[slot] = d + 1;
                        if d + 1 < cap {
                            buckets[(d + 1) as usize].push(n.pack());
                        }
                    }
                }
            }
        }
    }

    /// Distance to the nearest out-of-map cell.
    #[inline]
    fn edge_distance(&self, p: TilePos) -> u8 {
        let d = (p.x + 1).min(p.y + 1).min(self.width - p.x).min(self.height - p.y);
        d.clamp(0, u8::MAX as i32) as u8
    }

    /// Brute-force clearance for one cell: scan the `cap` window.
    fn brute_clearance(&self, p: TilePos) -> u8 {
        if self.cell(p.x, p.y) == BLOCKED {
            return 0;
        }
        let cap = self.max_clearance as i32;
        let mut best = (self.edge_distance(p) as i32).min(cap);
        for dy in -cap..=cap {
            for dx in -cap..=cap {
                let q = p.offset(dx, dy);
                if self.in_bounds(q) && self.cell(q.x, q.y) == BLOCKED {
                    best = best.min(dx.abs().max(dy.abs()));
                }
            }
        }
        best as u8
    }

    /// Compare `clearance_samples` random cells against a brute-force scan.
    fn sample_check(&mut self) -> bool {
        if self.clearance_samples == 0 || self.cells.is_empty() {
            return false;
        }
        let mut rng = SimRng::new(self.generation);
        for _ in 0..self.clearance_samples {
            let p = TilePos::new(rng.gen_range(0..self.width), rng.gen_range(0..self.height));
            let live = self.clearance(p.x, p.y);
            let expected = self.brute_clearance(p);
            if live != expected {
                warn!(%p, live, expected, "clearance sample mismatch");
                self.consistency_error = true;
                return true;
            }
        }
        false
    }

    /// Rebuild a reference grid from scratch and compare cell by cell.
    fn reference_check(&mut self, src: &NavSources<'_>) -> bool {
        let mut reference = self.clone();
        reference.self_check = false;
        reference.clearance_samples = 0;
        reference.rebuild_full(src);

        let first = (0..self.cells.len()).find(|&i| {
            self.cells[i] != reference.cells[i] || self.clearance[i] != reference.clearance[i]
        });
        match first {
            Some(i) => {
                let p = TilePos::new(i as i32 % self.width, i as i32 / self.width);
                warn!(
                    %p,
                    live = self.clearance[i],
                    reference = reference.clearance[i],
                    "navigation grid diverged from full rebuild"
                );
                self.consistency_error = true;
                true
            }
            None => false,
        }
    }

    /// First cell that violates `clearance == 0 ⇔ blocked`, if any.
    pub fn find_invariant_violation(&self) -> Option<TilePos> {
        (0..self.cells.len())
            .find(|&i| (self.clearance[i] == 0) != (self.cells[i] == BLOCKED))
            .map(|i| TilePos::new(i as i32 % self.width, i as i32 / self.width))
    }

    /// Raw clearance array (row-major).
    pub fn clearance_field(&self) -> &[u8] {
        &self.clearance
    }

    /// Raw cell array (row-major).
    pub fn cell_field(&self) -> &[u8] {
        &self.cells
    }
}

/// World radius → whole tiles, rounded up.
#[inline]
pub fn required_tiles(radius: f32, tile_size: f32) -> u8 {
    if radius <= 0.0 || tile_size <= 0.0 {
        return 0;
    }
    (radius / tile_size).ceil().min(u8::MAX as f32) as u8
}

pub(crate) const NEIGHBORS_8: [(i32, i32); 8] =
    [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (1, -1), (-1, 1), (-1, -1)];
