use std::fmt;

use serde::{Deserialize, Serialize};

/// Edge length of one tile in pixels.
pub const TILE_SIZE: i32 = 64;

/// Integer tile coordinate.
///
/// Ordering is row-major-ish by `(x, y)` field order; it only needs to be
/// stable so position-keyed collections iterate deterministically.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TilePos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TilePos {
    /// Create a tile coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The tile containing the given pixel.
    pub fn from_pixel(px: i32, py: i32) -> Self {
        Self {
            x: px.div_euclid(TILE_SIZE),
            y: py.div_euclid(TILE_SIZE),
        }
    }

    /// The pixel rectangle covered by this tile.
    pub fn pixel_rect(self) -> PixelRect {
        PixelRect::new(self.x * TILE_SIZE, self.y * TILE_SIZE, TILE_SIZE, TILE_SIZE)
    }

    /// This tile shifted by the given offset.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The four orthogonal neighbours (up, right, down, left).
    pub fn neighbors(self) -> [TilePos; 4] {
        [
            self.offset(0, -1),
            self.offset(1, 0),
            self.offset(0, 1),
            self.offset(-1, 0),
        ]
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A pixel-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPos {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel.
    pub y: i32,
}

impl PixelPos {
    /// Create a pixel position.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Top-left pixel of a tile.
    pub fn of_tile(tile: TilePos) -> Self {
        Self::new(tile.x * TILE_SIZE, tile.y * TILE_SIZE)
    }

    /// The tile containing this pixel.
    pub fn tile(self) -> TilePos {
        TilePos::from_pixel(self.x, self.y)
    }

    /// This position moved by a velocity.
    pub fn moved(self, velocity: Velocity) -> Self {
        Self::new(self.x + velocity.dx, self.y + velocity.dy)
    }
}

/// Per-frame pixel displacement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Velocity {
    /// Horizontal displacement.
    pub dx: i32,
    /// Vertical displacement.
    pub dy: i32,
}

impl Velocity {
    /// Zero velocity.
    pub const ZERO: Velocity = Velocity { dx: 0, dy: 0 };

    /// Create a velocity.
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// `true` if this velocity does not move anything.
    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }

    /// The same velocity pointing the other way.
    pub fn reversed(self) -> Self {
        Self::new(-self.dx, -self.dy)
    }
}

/// Axis-aligned pixel rectangle. `right()`/`bottom()` are exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl PixelRect {
    /// Create a rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The rectangle covering a block of whole tiles.
    pub fn from_tiles(origin: TilePos, tiles_wide: i32, tiles_high: i32) -> Self {
        Self::new(
            origin.x * TILE_SIZE,
            origin.y * TILE_SIZE,
            tiles_wide * TILE_SIZE,
            tiles_high * TILE_SIZE,
        )
    }

    /// A rectangle of the given size with its top-left at `pos`.
    pub fn at(pos: PixelPos, width: i32, height: i32) -> Self {
        Self::new(pos.x, pos.y, width, height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// `true` if the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// `true` if the two rectangles share at least one pixel.
    pub fn intersects(&self, other: &PixelRect) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// `true` if the pixel lies inside the rectangle.
    pub fn contains_point(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// `true` if `other` lies entirely within this rectangle.
    pub fn contains_rect(&self, other: &PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// The rectangle shifted by a velocity.
    pub fn translated(&self, velocity: Velocity) -> Self {
        Self::new(
            self.x + velocity.dx,
            self.y + velocity.dy,
            self.width,
            self.height,
        )
    }

    /// Horizontal centre pixel.
    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }

    /// Every tile the rectangle overlaps, row by row.
    pub fn covered_tiles(&self) -> Vec<TilePos> {
        if self.is_empty() {
            return Vec::new();
        }
        let first = TilePos::from_pixel(self.x, self.y);
        let last = TilePos::from_pixel(self.right() - 1, self.bottom() - 1);
        let mut tiles = Vec::new();
        for y in first.y..=last.y {
            for x in first.x..=last.x {
                tiles.push(TilePos::new(x, y));
            }
        }
        tiles
    }

    /// Sample tiles used by movement tests: the four corners plus the top and
    /// bottom midpoints when the box is wider than one tile. Duplicates are
    /// removed, order is stable.
    pub fn sample_tiles(&self) -> Vec<TilePos> {
        if self.is_empty() {
            return Vec::new();
        }
        let right = self.right() - 1;
        let bottom = self.bottom() - 1;
        let mut points = vec![
            (self.x, self.y),
            (right, self.y),
            (self.x, bottom),
            (right, bottom),
        ];
        if self.width > TILE_SIZE {
            points.push((self.center_x(), self.y));
            points.push((self.center_x(), bottom));
        }
        let mut tiles: Vec<TilePos> = Vec::with_capacity(points.len());
        for (px, py) in points {
            let tile = TilePos::from_pixel(px, py);
            if !tiles.contains(&tile) {
                tiles.push(tile);
            }
        }
        tiles
    }
}

/// Rectangle in tile units, used by map patches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    /// Left column.
    pub x: i32,
    /// Top row.
    pub y: i32,
    /// Width in tiles.
    pub width: i32,
    /// Height in tiles.
    pub height: i32,
}

impl TileRect {
    /// Create a tile rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// `true` if the tile lies inside the rectangle.
    pub fn contains(&self, tile: TilePos) -> bool {
        tile.x >= self.x
            && tile.x < self.x + self.width
            && tile.y >= self.y
            && tile.y < self.y + self.height
    }

    /// Every tile in the rectangle, row by row.
    pub fn tiles(&self) -> impl Iterator<Item = TilePos> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| TilePos::new(x, y)))
    }

    /// The matching pixel rectangle.
    pub fn to_pixels(&self) -> PixelRect {
        PixelRect::from_tiles(TilePos::new(self.x, self.y), self.width, self.height)
    }
}
