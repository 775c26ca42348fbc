use serde::{Deserialize, Serialize};

use crate::calendar::Season;
use crate::geometry::{PixelRect, TilePos};
use crate::occupant::OccupantId;
use crate::terrain::{DayConditions, HoeDirt};

/// Days a spawned forage item lingers before it rots away overnight.
pub const FORAGE_LIFETIME_DAYS: u32 = 7;

/// What a placed object is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Any other item. Passability is authored.
    Generic {
        /// Walkers may step onto it.
        #[serde(default)]
        passable: bool,
    },
    /// Wild forage spawned by the day pass.
    Forage,
    /// Debris stone.
    Stone,
    /// Debris weed.
    Weed,
    /// Debris twig.
    Twig,
    /// Storage container.
    Chest {
        /// Stored item names.
        #[serde(default)]
        items: Vec<String>,
    },
    /// Impassable fence post.
    Fence,
    /// Light source.
    Torch,
    /// Processing machine counting down to its output.
    Machine {
        /// Game minutes left.
        #[serde(default)]
        minutes_until_ready: u32,
    },
    /// A pot holding its own tilled soil.
    GardenPot {
        /// Soil inside the pot.
        #[serde(default)]
        dirt: HoeDirt,
    },
    /// Waters the surrounding tiles each morning.
    Sprinkler {
        /// Reach in tiles.
        radius: i32,
    },
    /// Lit explosive.
    Bomb {
        /// Milliseconds left before it goes off.
        fuse_ms: u32,
        /// Blast radius in tiles.
        radius: i32,
    },
}

/// Result of a per-frame object update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectTick {
    /// Nothing happened.
    Idle,
    /// The object is done and must leave the collection.
    Remove,
    /// The object went off; everything within `radius` tiles is cleared.
    Explode {
        /// Blast radius in tiles.
        radius: i32,
    },
}

/// An item sitting on exactly one tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedObject {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Item name, also the dropped item on harvest.
    pub name: String,
    /// Behavior variant.
    pub kind: ObjectKind,
    /// Tile key in the owning collection, kept in sync by the location.
    #[serde(default)]
    pub tile: TilePos,
    /// Whole days since placement.
    #[serde(default)]
    pub days_placed: u32,
    /// Name of the owning location, set when added.
    #[serde(skip)]
    pub location: Option<String>,
}

impl PlacedObject {
    /// Builds an object with a fresh id.
    pub fn new(name: impl Into<String>, kind: ObjectKind, tile: TilePos) -> Self {
        Self {
            id: OccupantId::new(),
            name: name.into(),
            kind,
            tile,
            days_placed: 0,
            location: None,
        }
    }

    /// A generic impassable item.
    pub fn solid(name: impl Into<String>, tile: TilePos) -> Self {
        Self::new(name, ObjectKind::Generic { passable: false }, tile)
    }

    /// A forage item.
    pub fn forage(name: impl Into<String>, tile: TilePos) -> Self {
        Self::new(name, ObjectKind::Forage, tile)
    }

    /// The single tile it covers, in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        self.tile.pixel_rect()
    }

    /// Whether walkers ignore it.
    pub fn is_passable(&self) -> bool {
        matches!(self.kind, ObjectKind::Generic { passable: true })
    }

    /// Whether this is wild forage.
    pub fn is_forage(&self) -> bool {
        matches!(self.kind, ObjectKind::Forage)
    }

    /// Light radius in tiles for light-emitting objects.
    pub fn light_radius(&self) -> Option<u32> {
        match self.kind {
            ObjectKind::Torch => Some(3),
            ObjectKind::Bomb { .. } => Some(1),
            _ => None,
        }
    }

    /// Soil of a garden pot.
    pub fn garden_dirt(&self) -> Option<&HoeDirt> {
        match &self.kind {
            ObjectKind::GardenPot { dirt } => Some(dirt),
            _ => None,
        }
    }

    /// Mutable soil of a garden pot.
    pub fn garden_dirt_mut(&mut self) -> Option<&mut HoeDirt> {
        match &mut self.kind {
            ObjectKind::GardenPot { dirt } => Some(dirt),
            _ => None,
        }
    }

    /// Tiles a sprinkler waters each morning.
    pub fn sprinkler_tiles(&self) -> Vec<TilePos> {
        let ObjectKind::Sprinkler { radius } = self.kind else {
            return Vec::new();
        };
        if radius <= 1 {
            return self.tile.neighbors().to_vec();
        }
        let mut tiles = Vec::new();
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx != 0 || dy != 0 {
                    tiles.push(self.tile.offset(dx, dy));
                }
            }
        }
        tiles
    }

    /// `true` if the object should vanish tonight.
    pub fn destroy_overnight(&self, conditions: &DayConditions) -> bool {
        match self.kind {
            ObjectKind::Forage => self.days_placed >= FORAGE_LIFETIME_DAYS,
            ObjectKind::Weed => conditions.season == Season::Winter && !conditions.ignores_seasons,
            _ => false,
        }
    }

    /// Overnight aging.
    pub fn day_update(&mut self, conditions: &DayConditions) {
        self.days_placed += 1;
        match &mut self.kind {
            ObjectKind::Machine { minutes_until_ready } => *minutes_until_ready = 0,
            ObjectKind::GardenPot { dirt } => {
                let sheltered = DayConditions {
                    ignores_seasons: true,
                    ..*conditions
                };
                dirt.day_update(&sheltered);
            }
            _ => {}
        }
    }

    /// In-game minutes passing while the location is loaded.
    pub fn minutes_elapsed(&mut self, minutes: u32) {
        if let ObjectKind::Machine { minutes_until_ready } = &mut self.kind {
            *minutes_until_ready = minutes_until_ready.saturating_sub(minutes);
        }
    }

    /// Per-frame update while the location is active.
    pub fn update_when_current(&mut self, elapsed_ms: u32) -> ObjectTick {
        match &mut self.kind {
            ObjectKind::Bomb { fuse_ms, radius } => {
                *fuse_ms = fuse_ms.saturating_sub(elapsed_ms);
                if *fuse_ms == 0 {
                    ObjectTick::Explode { radius: *radius }
                } else {
                    ObjectTick::Idle
                }
            }
            _ => ObjectTick::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conditions(season: Season) -> DayConditions {
        DayConditions {
            season,
            ignores_seasons: false,
            tree_growth_chance: 0.0,
        }
    }

    #[test]
    fn only_authored_generic_items_are_passable() {
        let tile = TilePos::new(1, 1);
        assert!(PlacedObject::new("rug", ObjectKind::Generic { passable: true }, tile).is_passable());
        assert!(!PlacedObject::solid("crate", tile).is_passable());
        assert!(!PlacedObject::forage("leek", tile).is_passable());
    }

    #[test]
    fn bomb_counts_down_then_explodes() {
        let mut bomb = PlacedObject::new(
            "cherry_bomb",
            ObjectKind::Bomb {
                fuse_ms: 100,
                radius: 2,
            },
            TilePos::new(0, 0),
        );
        assert_eq!(bomb.update_when_current(60), ObjectTick::Idle);
        assert_eq!(bomb.update_when_current(60), ObjectTick::Explode { radius: 2 });
    }

    #[test]
    fn forage_rots_after_lifetime() {
        let mut leek = PlacedObject::forage("leek", TilePos::new(0, 0));
        let spring = conditions(Season::Spring);
        for _ in 0..FORAGE_LIFETIME_DAYS {
            assert!(!leek.destroy_overnight(&spring));
            leek.day_update(&spring);
        }
        assert!(leek.destroy_overnight(&spring));
    }

    #[test]
    fn weeds_die_in_winter() {
        let weed = PlacedObject::new("weeds", ObjectKind::Weed, TilePos::new(0, 0));
        assert!(weed.destroy_overnight(&conditions(Season::Winter)));
        assert!(!weed.destroy_overnight(&conditions(Season::Summer)));
    }

    #[test]
    fn sprinkler_coverage() {
        let tile = TilePos::new(5, 5);
        let basic = PlacedObject::new("sprinkler", ObjectKind::Sprinkler { radius: 1 }, tile);
        assert_eq!(basic.sprinkler_tiles().len(), 4);
        let iridium = PlacedObject::new("iridium_sprinkler", ObjectKind::Sprinkler { radius: 2 }, tile);
        assert_eq!(iridium.sprinkler_tiles().len(), 24);
    }

    #[test]
    fn machine_finishes_with_time_or_overnight() {
        let mut keg = PlacedObject::new(
            "keg",
            ObjectKind::Machine {
                minutes_until_ready: 30,
            },
            TilePos::new(0, 0),
        );
        keg.minutes_elapsed(10);
        assert_eq!(keg.kind, ObjectKind::Machine { minutes_until_ready: 20 });
        keg.day_update(&conditions(Season::Fall));
        assert_eq!(keg.kind, ObjectKind::Machine { minutes_until_ready: 0 });
    }
}
