use serde::{Deserialize, Serialize};

use crate::geometry::{PixelRect, TilePos};
use crate::location::Location;
use crate::occupant::OccupantId;

const DOOR_SWING_MS: u32 = 500;
const SMOKE_CYCLE_MS: u32 = 2_000;

/// Progress reported by a building's overnight update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildingProgress {
    /// Nothing finished.
    Unchanged,
    /// Construction finished tonight.
    Constructed,
    /// An upgrade finished tonight, reaching this level.
    Upgraded(u32),
}

/// A constructed building on a location's map.
#[derive(Debug, Serialize, Deserialize)]
pub struct Building {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Building type, e.g. `coop` or `shed`.
    pub kind: String,
    /// Top-left tile of the footprint.
    pub tile: TilePos,
    /// Footprint in tiles as `(width, height)`.
    pub size: (i32, i32),
    /// Offset of the walk-in door inside the footprint.
    #[serde(default)]
    pub human_door: Option<(i32, i32)>,
    /// Offset of the animal door inside the footprint.
    #[serde(default)]
    pub animal_door: Option<(i32, i32)>,
    /// Whether animals may pass the animal door.
    #[serde(default)]
    pub animal_door_open: bool,
    /// Nights until construction completes.
    #[serde(default)]
    pub days_of_construction_left: u32,
    /// Nights until the pending upgrade completes.
    #[serde(default)]
    pub days_until_upgrade: u32,
    /// Completed upgrades.
    #[serde(default)]
    pub upgrade_level: u32,
    /// Passable items such as flooring may be placed on the footprint.
    #[serde(default)]
    pub allows_flooring: bool,
    /// Remaining animal-door swing.
    #[serde(default)]
    pub door_swing_ms: u32,
    /// Chimney smoke cycle, visual only.
    #[serde(default)]
    pub smoke_ms: u32,
    /// The location inside the building, owned by it.
    #[serde(skip)]
    pub interior: Option<Box<Location>>,
    /// Name of the location the building stands in.
    #[serde(skip)]
    pub parent_location: Option<String>,
}

impl Building {
    /// A finished building. Sizes below one tile are clamped to one.
    pub fn new(kind: impl Into<String>, tile: TilePos, size: (i32, i32)) -> Self {
        Self {
            id: OccupantId::new(),
            kind: kind.into(),
            tile,
            size: (size.0.max(1), size.1.max(1)),
            human_door: None,
            animal_door: None,
            animal_door_open: false,
            days_of_construction_left: 0,
            days_until_upgrade: 0,
            upgrade_level: 0,
            allows_flooring: false,
            door_swing_ms: 0,
            smoke_ms: 0,
            interior: None,
            parent_location: None,
        }
    }

    /// Set the walk-in door offset.
    pub fn with_human_door(mut self, dx: i32, dy: i32) -> Self {
        self.human_door = Some((dx, dy));
        self
    }

    /// Set the animal door offset.
    pub fn with_animal_door(mut self, dx: i32, dy: i32) -> Self {
        self.animal_door = Some((dx, dy));
        self
    }

    /// Give the building an interior.
    pub fn with_interior(mut self, interior: Location) -> Self {
        self.interior = Some(Box::new(interior));
        self
    }

    /// Start construction lasting `days` nights.
    pub fn under_construction(mut self, days: u32) -> Self {
        self.days_of_construction_left = days;
        self
    }

    /// Footprint in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::from_tiles(self.tile, self.size.0, self.size.1)
    }

    /// Whether `tile` falls inside the footprint.
    pub fn occupies_tile(&self, tile: TilePos) -> bool {
        tile.x >= self.tile.x
            && tile.y >= self.tile.y
            && tile.x < self.tile.x + self.size.0
            && tile.y < self.tile.y + self.size.1
    }

    /// Absolute tile of the walk-in door.
    pub fn human_door_tile(&self) -> Option<TilePos> {
        self.human_door.map(|(dx, dy)| self.tile.offset(dx, dy))
    }

    /// Absolute tile of the animal door.
    pub fn animal_door_tile(&self) -> Option<TilePos> {
        self.animal_door.map(|(dx, dy)| self.tile.offset(dx, dy))
    }

    /// Whether construction is still running.
    pub fn is_under_construction(&self) -> bool {
        self.days_of_construction_left > 0
    }

    /// Walkability of a single tile: outside the footprint is open, the
    /// human door is open once built, the animal door only while open.
    pub fn is_tile_passable(&self, tile: TilePos) -> bool {
        if !self.occupies_tile(tile) {
            return true;
        }
        if !self.is_under_construction() && self.human_door_tile() == Some(tile) {
            return true;
        }
        self.animal_door_open && self.animal_door_tile() == Some(tile)
    }

    /// `true` if any tile of `rect` inside the footprint is closed.
    pub fn blocks_rect(&self, rect: &PixelRect) -> bool {
        if !self.bounding_box().intersects(rect) {
            return false;
        }
        rect.covered_tiles()
            .into_iter()
            .any(|tile| !self.is_tile_passable(tile))
    }

    /// Open or close the animal door.
    pub fn toggle_animal_door(&mut self) {
        if self.animal_door.is_none() {
            return;
        }
        self.animal_door_open = !self.animal_door_open;
        self.door_swing_ms = DOOR_SWING_MS;
    }

    /// Copy of the building without its interior or parent link.
    pub fn shell(&self) -> Building {
        Building {
            id: self.id,
            kind: self.kind.clone(),
            tile: self.tile,
            size: self.size,
            human_door: self.human_door,
            animal_door: self.animal_door,
            animal_door_open: self.animal_door_open,
            days_of_construction_left: self.days_of_construction_left,
            days_until_upgrade: self.days_until_upgrade,
            upgrade_level: self.upgrade_level,
            allows_flooring: self.allows_flooring,
            door_swing_ms: self.door_swing_ms,
            smoke_ms: self.smoke_ms,
            interior: None,
            parent_location: None,
        }
    }

    /// Take the interior out of the building.
    pub fn take_interior(&mut self) -> Option<Location> {
        self.interior.take().map(|boxed| *boxed)
    }

    /// The interior, if any.
    pub fn interior(&self) -> Option<&Location> {
        self.interior.as_deref()
    }

    /// The interior, mutably.
    pub fn interior_mut(&mut self) -> Option<&mut Location> {
        self.interior.as_deref_mut()
    }

    /// Advance construction and upgrade counters.
    pub fn day_update(&mut self) -> BuildingProgress {
        self.door_swing_ms = 0;
        self.smoke_ms = 0;
        if self.days_of_construction_left > 0 {
            self.days_of_construction_left -= 1;
            if self.days_of_construction_left == 0 {
                return BuildingProgress::Constructed;
            }
            return BuildingProgress::Unchanged;
        }
        if self.days_until_upgrade > 0 {
            self.days_until_upgrade -= 1;
            if self.days_until_upgrade == 0 {
                self.upgrade_level += 1;
                return BuildingProgress::Upgraded(self.upgrade_level);
            }
        }
        BuildingProgress::Unchanged
    }

    /// Timers that run whether or not anyone is watching.
    pub fn update_background(&mut self, elapsed_ms: u32) {
        self.door_swing_ms = self.door_swing_ms.saturating_sub(elapsed_ms);
    }

    /// Visual-only work while the parent location is active.
    pub fn update_when_current(&mut self, elapsed_ms: u32) {
        if !self.is_under_construction() {
            self.smoke_ms = (self.smoke_ms + elapsed_ms) % SMOKE_CYCLE_MS;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coop() -> Building {
        Building::new("coop", TilePos::new(2, 2), (4, 3))
            .with_human_door(1, 2)
            .with_animal_door(3, 2)
    }

    #[test]
    fn footprint_blocks_except_doors() {
        let mut b = coop();
        assert!(!b.is_tile_passable(TilePos::new(2, 2)));
        assert!(b.is_tile_passable(TilePos::new(3, 4)));
        assert!(!b.is_tile_passable(TilePos::new(5, 4)));
        b.toggle_animal_door();
        assert!(b.is_tile_passable(TilePos::new(5, 4)));
        assert!(b.is_tile_passable(TilePos::new(9, 9)));
    }

    #[test]
    fn door_closed_while_under_construction() {
        let b = coop().under_construction(2);
        assert!(!b.is_tile_passable(TilePos::new(3, 4)));
    }

    #[test]
    fn rect_through_door_is_not_blocked() {
        let b = coop();
        let door = TilePos::new(3, 4).pixel_rect();
        assert!(!b.blocks_rect(&PixelRect::new(door.x + 8, door.y + 8, 40, 40)));
        assert!(b.blocks_rect(&PixelRect::new(door.x - 8, door.y + 8, 40, 40)));
    }

    #[test]
    fn counters_advance_overnight() {
        let mut b = coop().under_construction(2);
        assert_eq!(b.day_update(), BuildingProgress::Unchanged);
        assert_eq!(b.day_update(), BuildingProgress::Constructed);
        b.days_until_upgrade = 1;
        assert_eq!(b.day_update(), BuildingProgress::Upgraded(1));
        assert_eq!(b.day_update(), BuildingProgress::Unchanged);
    }

    #[test]
    fn door_swing_runs_in_background() {
        let mut b = coop();
        b.toggle_animal_door();
        b.update_background(200);
        assert_eq!(b.door_swing_ms, 300);
        b.update_when_current(2_500);
        assert_eq!(b.smoke_ms, 500);
        assert_eq!(b.door_swing_ms, 300);
    }
}
