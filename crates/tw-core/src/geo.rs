//! World-space and tile-space geometry.
//!
//! World positions are `f32` world units with the origin at the bottom-left
//! of the map and `y` growing upwards.  The map is divided into square tiles
//! of `tile_size` world units; tile `(x, y)` covers
//! `[x·ts, (x+1)·ts) × [y·ts, (y+1)·ts)`.
//!
//! Paths are stored as *packed* tile coordinates (`u32`, `y` in the high 16
//! bits, `x` in the low 16) so a route is a flat `Vec<u32>`.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

// ── Vec2 ──────────────────────────────────────────────────────────────────────

/// A point or displacement in world units.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Vec2) -> f32 {
        (other - self).length()
    }

    #[inline]
    pub fn distance_sq(self, other: Vec2) -> f32 {
        let d = other - self;
        d.x * d.x + d.y * d.y
    }

    /// Unit vector in the same direction, or `ZERO` for a zero-length input.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len <= f32::EPSILON {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Tile containing this world point.
    #[inline]
    pub fn to_tile(self, tile_size: f32) -> TilePos {
        TilePos::new(
            (self.x / tile_size).floor() as i32,
            (self.y / tile_size).floor() as i32,
        )
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    #[inline]
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    #[inline]
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    #[inline]
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

// ── TilePos ───────────────────────────────────────────────────────────────────

/// Integer tile coordinate.  May be negative or out of bounds; callers check
/// against the map before indexing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

impl TilePos {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Pack into one `u32`.  Only meaningful for in-bounds coordinates
    /// (`0 ≤ x, y < 65 536`).
    #[inline]
    pub fn pack(self) -> u32 {
        ((self.y as u32) << 16) | (self.x as u32 & 0xFFFF)
    }

    #[inline]
    pub fn unpack(packed: u32) -> TilePos {
        TilePos::new((packed & 0xFFFF) as i32, (packed >> 16) as i32)
    }

    /// Chebyshev (king-move) distance.
    #[inline]
    pub fn chebyshev(self, other: TilePos) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    #[inline]
    pub fn manhattan(self, other: TilePos) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32) -> TilePos {
        TilePos::new(self.x + dx, self.y + dy)
    }

    /// World-space centre of the tile.
    #[inline]
    pub fn center(self, tile_size: f32) -> Vec2 {
        Vec2::new(
            (self.x as f32 + 0.5) * tile_size,
            (self.y as f32 + 0.5) * tile_size,
        )
    }
}

impl std::fmt::Display for TilePos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ── TileRect ──────────────────────────────────────────────────────────────────

/// Half-open tile rectangle `[x0, x1) × [y0, y1)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl TileRect {
    #[inline]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Rectangle of `w × h` tiles whose bottom-left tile is `origin`.
    #[inline]
    pub fn from_origin(origin: TilePos, w: i32, h: i32) -> Self {
        Self::new(origin.x, origin.y, origin.x + w, origin.y + h)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    #[inline]
    pub fn height(&self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    #[inline]
    pub fn contains(&self, p: TilePos) -> bool {
        p.x >= self.x0 && p.x < self.x1 && p.y >= self.y0 && p.y < self.y1
    }

    pub fn intersects(&self, other: &TileRect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &TileRect) -> TileRect {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        TileRect::new(
            self.x0.min(other.x0),
            self.y0.min(other.y0),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Grow by `margin` tiles on every side.
    #[inline]
    pub fn expand(&self, margin: i32) -> TileRect {
        TileRect::new(self.x0 - margin, self.y0 - margin, self.x1 + margin, self.y1 + margin)
    }

    /// Clamp to `[0, width) × [0, height)`.
    pub fn clamp_to(&self, width: i32, height: i32) -> TileRect {
        TileRect::new(
            self.x0.clamp(0, width),
            self.y0.clamp(0, height),
            self.x1.clamp(0, width),
            self.y1.clamp(0, height),
        )
    }

    /// Iterate every tile, row by row from the bottom.
    pub fn iter(&self) -> impl Iterator<Item = TilePos> + '_ {
        (self.y0..self.y1).flat_map(move |y| (self.x0..self.x1).map(move |x| TilePos::new(x, y)))
    }

    /// Chebyshev distance from `p` to the nearest tile of the rectangle
    /// (0 when inside).
    pub fn chebyshev_to(&self, p: TilePos) -> i32 {
        let dx = (self.x0 - p.x).max(p.x - (self.x1 - 1)).max(0);
        let dy = (self.y0 - p.y).max(p.y - (self.y1 - 1)).max(0);
        dx.max(dy)
    }
}
