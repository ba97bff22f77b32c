//! Terrain tiles and props.

use serde::{Deserialize, Serialize};

use tw_core::{PropId, TilePos, TileRect};

/// Terrain type of one map tile.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    #[default]
    Grass,
    Road,
    Sand,
    Water,
    Rock,
}

impl TileKind {
    /// Authoritative "inherently impassable" rule for terrain.
    #[inline]
    pub fn is_blocking(self) -> bool {
        matches!(self, TileKind::Water | TileKind::Rock)
    }

    #[inline]
    pub fn is_road(self) -> bool {
        matches!(self, TileKind::Road)
    }

    /// Movement cost multiplier in percent of a grass step.
    #[inline]
    pub fn cost_pct(self) -> u32 {
        match self {
            TileKind::Road => 60,
            TileKind::Grass => 100,
            TileKind::Sand => 130,
            TileKind::Water | TileKind::Rock => 100,
        }
    }
}

/// Row-major terrain grid, row 0 at the bottom of the map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub width: i32,
    pub height: i32,
    tiles: Vec<TileKind>,
}

impl TileMap {
    /// A `width × height` map filled with `fill`.
    pub fn new(width: i32, height: i32, fill: TileKind) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self { width, height, tiles: vec![fill; (width * height) as usize] }
    }

    #[inline]
    pub fn in_bounds(&self, p: TilePos) -> bool {
        p.x >= 0 && p.y >= 0 && p.x < self.width && p.y < self.height
    }

    #[inline]
    pub fn bounds(&self) -> TileRect {
        TileRect::new(0, 0, self.width, self.height)
    }

    #[inline]
    fn slot(&self, p: TilePos) -> usize {
        (p.y * self.width + p.x) as usize
    }

    pub fn get(&self, p: TilePos) -> Option<TileKind> {
        self.in_bounds(p).then(|| self.tiles[self.slot(p)])
    }

    /// Overwrite a tile.  Returns the previous kind, or `None` out of bounds.
    pub fn set(&mut self, p: TilePos, kind: TileKind) -> Option<TileKind> {
        if !self.in_bounds(p) {
            return None;
        }
        let slot = self.slot(p);
        Some(std::mem::replace(&mut self.tiles[slot], kind))
    }

    /// Paint a rectangle (clamped to the map).
    pub fn fill_rect(&mut self, rect: TileRect, kind: TileKind) {
        let r = rect.clamp_to(self.width, self.height);
        for p in r.iter() {
            let slot = self.slot(p);
            self.tiles[slot] = kind;
        }
    }
}

/// Kind of decorative obstacle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropKind {
    Tree,
    Boulder,
    Fence,
    Well,
}

impl PropKind {
    /// Footprint in tiles `(w, h)`.
    pub fn footprint(self) -> (i32, i32) {
        match self {
            PropKind::Tree | PropKind::Fence => (1, 1),
            PropKind::Boulder | PropKind::Well => (2, 2),
        }
    }
}

/// A placed prop.  Props always fully block their footprint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Prop {
    pub id: PropId,
    pub kind: PropKind,
    /// Bottom-left tile of the footprint.
    pub origin: TilePos,
}

impl Prop {
    pub fn footprint(&self) -> TileRect {
        let (w, h) = self.kind.footprint();
        TileRect::from_origin(self.origin, w, h)
    }
}
