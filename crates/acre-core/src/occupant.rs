use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::actor::{Character, FarmAnimal, Farmer};
use crate::building::Building;
use crate::furniture::Furniture;
use crate::geometry::{PixelRect, TilePos};
use crate::mask::CollisionMask;
use crate::object::PlacedObject;
use crate::terrain::{LargeTerrainFeature, ResourceClump, TerrainFeature};
use crate::transient::{Critter, Debris, Fixture};

/// Unique identifier for every occupant in a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OccupantId(pub Uuid);

impl OccupantId {
    /// Generate a new random occupant ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OccupantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OccupantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.0.to_string()[..8])
    }
}

/// The fixed set of occupant categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupantKind {
    /// Single-tile placed object.
    PointObject,
    /// Multi-tile furniture.
    Furniture,
    /// Tile-keyed terrain feature.
    TerrainFeature,
    /// Bush-like feature with a pixel box.
    LargeTerrainFeature,
    /// Stumps, boulders and logs.
    ResourceClump,
    /// Constructed building.
    Building,
    /// Villager or monster.
    Character,
    /// Player character.
    Farmer,
    /// Farm animal.
    Animal,
    /// Static interactive prop.
    Fixture,
    /// Ambient creature.
    Critter,
    /// Dropped item on the ground.
    Debris,
}

impl OccupantKind {
    /// Collision category of the kind. Flooring is decided per value, see
    /// [`Occupant::category`].
    pub fn category(self) -> CollisionMask {
        match self {
            OccupantKind::PointObject => CollisionMask::OBJECTS,
            OccupantKind::Furniture => CollisionMask::FURNITURE,
            OccupantKind::TerrainFeature
            | OccupantKind::LargeTerrainFeature
            | OccupantKind::ResourceClump => CollisionMask::TERRAIN_FEATURES,
            OccupantKind::Building => CollisionMask::BUILDINGS,
            OccupantKind::Character | OccupantKind::Animal => CollisionMask::CHARACTERS,
            OccupantKind::Farmer => CollisionMask::FARMERS,
            OccupantKind::Fixture => CollisionMask::LOCATION_SPECIFIC,
            OccupantKind::Critter | OccupantKind::Debris => CollisionMask::NONE,
        }
    }

    /// `true` for kinds that can occupy tiles. Critters and debris have
    /// bounding boxes but never claim a tile.
    pub fn occupies_tiles(self) -> bool {
        !matches!(self, OccupantKind::Critter | OccupantKind::Debris)
    }

    /// Short lowercase label.
    pub fn label(self) -> &'static str {
        match self {
            OccupantKind::PointObject => "object",
            OccupantKind::Furniture => "furniture",
            OccupantKind::TerrainFeature => "terrain_feature",
            OccupantKind::LargeTerrainFeature => "large_terrain_feature",
            OccupantKind::ResourceClump => "resource_clump",
            OccupantKind::Building => "building",
            OccupantKind::Character => "character",
            OccupantKind::Farmer => "farmer",
            OccupantKind::Animal => "animal",
            OccupantKind::Fixture => "fixture",
            OccupantKind::Critter => "critter",
            OccupantKind::Debris => "debris",
        }
    }
}

impl fmt::Display for OccupantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A borrowed view of any occupant, tagged by category.
///
/// The occupancy engine dispatches on this tag instead of calling through a
/// trait object per entity type.
#[derive(Debug, Clone, Copy)]
pub enum Occupant<'a> {
    /// A placed object.
    Object(&'a PlacedObject),
    /// A furniture piece.
    Furniture(&'a Furniture),
    /// A terrain feature and its tile.
    TerrainFeature(TilePos, &'a TerrainFeature),
    /// A large terrain feature.
    LargeTerrainFeature(&'a LargeTerrainFeature),
    /// A resource clump.
    ResourceClump(&'a ResourceClump),
    /// A building.
    Building(&'a Building),
    /// A villager or monster.
    Character(&'a Character),
    /// A farmer.
    Farmer(&'a Farmer),
    /// A farm animal.
    Animal(&'a FarmAnimal),
    /// A fixture.
    Fixture(&'a Fixture),
    /// A critter.
    Critter(&'a Critter),
    /// A debris item.
    Debris(&'a Debris),
}

impl Occupant<'_> {
    /// Category of the wrapped occupant.
    pub fn kind(&self) -> OccupantKind {
        match self {
            Occupant::Object(_) => OccupantKind::PointObject,
            Occupant::Furniture(_) => OccupantKind::Furniture,
            Occupant::TerrainFeature(..) => OccupantKind::TerrainFeature,
            Occupant::LargeTerrainFeature(_) => OccupantKind::LargeTerrainFeature,
            Occupant::ResourceClump(_) => OccupantKind::ResourceClump,
            Occupant::Building(_) => OccupantKind::Building,
            Occupant::Character(_) => OccupantKind::Character,
            Occupant::Farmer(_) => OccupantKind::Farmer,
            Occupant::Animal(_) => OccupantKind::Animal,
            Occupant::Fixture(_) => OccupantKind::Fixture,
            Occupant::Critter(_) => OccupantKind::Critter,
            Occupant::Debris(_) => OccupantKind::Debris,
        }
    }

    /// Identity of the occupant. Terrain features are keyed by tile and carry
    /// no id of their own.
    pub fn id(&self) -> Option<OccupantId> {
        Some(match self {
            Occupant::Object(o) => o.id,
            Occupant::Furniture(f) => f.id,
            Occupant::TerrainFeature(..) => return None,
            Occupant::LargeTerrainFeature(l) => l.id,
            Occupant::ResourceClump(r) => r.id,
            Occupant::Building(b) => b.id,
            Occupant::Character(c) => c.id,
            Occupant::Farmer(f) => f.id,
            Occupant::Animal(a) => a.id,
            Occupant::Fixture(f) => f.id,
            Occupant::Critter(c) => c.id,
            Occupant::Debris(d) => d.id,
        })
    }

    /// Pixel-space footprint.
    pub fn bounding_box(&self) -> PixelRect {
        match self {
            Occupant::Object(o) => o.bounding_box(),
            Occupant::Furniture(f) => f.bounding_box(),
            Occupant::TerrainFeature(tile, _) => tile.pixel_rect(),
            Occupant::LargeTerrainFeature(l) => l.bounding_box(),
            Occupant::ResourceClump(r) => r.bounding_box(),
            Occupant::Building(b) => b.bounding_box(),
            Occupant::Character(c) => c.bounding_box(),
            Occupant::Farmer(f) => f.bounding_box(),
            Occupant::Animal(a) => a.bounding_box(),
            Occupant::Fixture(f) => f.bounding_box(),
            Occupant::Critter(c) => c.bounding_box(),
            Occupant::Debris(d) => d.bounding_box(),
        }
    }

    /// `true` if actors may walk through the occupant.
    pub fn is_passable(&self) -> bool {
        match self {
            Occupant::Object(o) => o.is_passable(),
            Occupant::Furniture(f) => f.is_passable(),
            Occupant::TerrainFeature(_, t) => t.is_passable(),
            Occupant::LargeTerrainFeature(_) | Occupant::ResourceClump(_) => false,
            Occupant::Building(_) => false,
            Occupant::Character(_) | Occupant::Farmer(_) | Occupant::Animal(_) => false,
            Occupant::Fixture(f) => f.passable,
            Occupant::Critter(_) | Occupant::Debris(_) => true,
        }
    }

    /// Passability at one tile. Buildings open up at their doors.
    pub fn is_passable_at(&self, tile: TilePos) -> bool {
        match self {
            Occupant::Building(b) => b.is_tile_passable(tile),
            _ => self.is_passable(),
        }
    }

    /// Collision category. Flooring gets its own category so it can be
    /// ignored separately from other terrain features.
    pub fn category(&self) -> CollisionMask {
        match self {
            Occupant::TerrainFeature(_, t) if t.is_flooring() => CollisionMask::FLOORING,
            _ => self.kind().category(),
        }
    }

    /// Display name for diagnostics.
    pub fn label(&self) -> String {
        match self {
            Occupant::Object(o) => o.name.clone(),
            Occupant::Furniture(f) => f.name.clone(),
            Occupant::TerrainFeature(_, t) => t.label().to_string(),
            Occupant::LargeTerrainFeature(_) => "bush".to_string(),
            Occupant::ResourceClump(r) => r.kind.to_string(),
            Occupant::Building(b) => b.kind.clone(),
            Occupant::Character(c) => c.name.clone(),
            Occupant::Farmer(f) => f.name.clone(),
            Occupant::Animal(a) => a.name.clone(),
            Occupant::Fixture(f) => f.name.clone(),
            Occupant::Critter(c) => c.kind.to_string(),
            Occupant::Debris(d) => d.item.clone(),
        }
    }
}
