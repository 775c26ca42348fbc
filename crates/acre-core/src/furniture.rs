use serde::{Deserialize, Serialize};

use crate::geometry::{PixelRect, TilePos};
use crate::occupant::OccupantId;

/// Furniture category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FurnitureKind {
    /// Single seat.
    Chair,
    /// Seat spanning its width.
    Bench,
    /// Table.
    Table,
    /// Walkable floor covering.
    Rug,
    /// Bed.
    Bed,
    /// Light-emitting lamp.
    Lamp,
    /// Anything else.
    Decor,
}

/// A placed piece of multi-tile furniture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Furniture {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Display name.
    pub name: String,
    /// Category.
    pub kind: FurnitureKind,
    /// Top-left tile.
    pub tile: TilePos,
    /// Footprint in tiles as `(width, height)`.
    #[serde(default = "single_tile")]
    pub size: (i32, i32),
    /// Whole days since placement.
    #[serde(default)]
    pub days_placed: u32,
    /// Idle animation timer.
    #[serde(default)]
    pub animation_ms: u32,
    /// Name of the owning location, set when added.
    #[serde(skip)]
    pub location: Option<String>,
}

fn single_tile() -> (i32, i32) {
    (1, 1)
}

impl Furniture {
    /// A new piece. Sizes below one tile are clamped to one.
    pub fn new(name: impl Into<String>, kind: FurnitureKind, tile: TilePos, size: (i32, i32)) -> Self {
        Self {
            id: OccupantId::new(),
            name: name.into(),
            kind,
            tile,
            size: (size.0.max(1), size.1.max(1)),
            days_placed: 0,
            animation_ms: 0,
            location: None,
        }
    }

    /// Footprint in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::from_tiles(self.tile, self.size.0, self.size.1)
    }

    /// Whether walkers ignore it.
    pub fn is_passable(&self) -> bool {
        matches!(self.kind, FurnitureKind::Rug)
    }

    /// Whether farmers can sit on it.
    pub fn is_seat(&self) -> bool {
        matches!(self.kind, FurnitureKind::Chair | FurnitureKind::Bench)
    }

    /// Tiles a farmer can sit on.
    pub fn seat_tiles(&self) -> Vec<TilePos> {
        match self.kind {
            FurnitureKind::Chair => vec![self.tile],
            FurnitureKind::Bench => (0..self.size.0).map(|dx| self.tile.offset(dx, 0)).collect(),
            _ => Vec::new(),
        }
    }

    /// Light radius in tiles for lamps.
    pub fn light_radius(&self) -> Option<u32> {
        match self.kind {
            FurnitureKind::Lamp => Some(4),
            _ => None,
        }
    }

    /// Advance idle animation. Only lamps flicker.
    pub fn update_when_current(&mut self, elapsed_ms: u32) {
        if self.kind == FurnitureKind::Lamp {
            self.animation_ms = (self.animation_ms + elapsed_ms) % 1_000;
        }
    }

    /// Age by a day and reset the animation.
    pub fn day_update(&mut self) {
        self.days_placed += 1;
        self.animation_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bench_seats_span_width() {
        let bench = Furniture::new("bench", FurnitureKind::Bench, TilePos::new(2, 3), (3, 1));
        assert_eq!(
            bench.seat_tiles(),
            vec![TilePos::new(2, 3), TilePos::new(3, 3), TilePos::new(4, 3)]
        );
        assert!(bench.is_seat());
        assert!(!bench.is_passable());
    }

    #[test]
    fn size_is_at_least_one_tile() {
        let rug = Furniture::new("rug", FurnitureKind::Rug, TilePos::new(0, 0), (0, -2));
        assert_eq!(rug.size, (1, 1));
        assert!(rug.is_passable());
    }

    #[test]
    fn lamp_flickers_and_lights() {
        let mut lamp = Furniture::new("lamp", FurnitureKind::Lamp, TilePos::new(0, 0), (1, 2));
        lamp.update_when_current(1_250);
        assert_eq!(lamp.animation_ms, 250);
        assert_eq!(lamp.light_radius(), Some(4));
        lamp.day_update();
        assert_eq!(lamp.days_placed, 1);
    }
}
