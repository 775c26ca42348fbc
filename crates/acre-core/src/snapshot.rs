use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::{Character, FarmAnimal, Farmer};
use crate::building::Building;
use crate::error::CoreResult;
use crate::furniture::Furniture;
use crate::geometry::TilePos;
use crate::grid::Grid;
use crate::location::Location;
use crate::object::PlacedObject;
use crate::occupant::OccupantId;
use crate::rules::LocationRules;
use crate::terrain::{LargeTerrainFeature, ResourceClump, TerrainFeature};
use crate::transient::{Bridge, EventState, Fixture};

/// A terrain feature and the tile it is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainEntry {
    /// Key tile.
    pub tile: TilePos,
    /// The feature.
    pub feature: TerrainFeature,
}

/// Snapshot of a building's interior.
#[derive(Debug, Serialize, Deserialize)]
pub struct InteriorSnapshot {
    /// Building owning the interior.
    pub building: OccupantId,
    /// Interior state.
    pub location: LocationSnapshot,
    /// Size of the interior map, used when no asset can be loaded.
    #[serde(default)]
    pub map_size: (u32, u32),
}

/// Opaque persistent state of a location: every entity collection and the
/// applied patch keys.
///
/// The grid is not included; it is reloaded from the map asset and patches
/// are re-applied by whoever owns the keys. Transient occupants (critters,
/// debris, projectiles, sprites) are not saved.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationSnapshot {
    /// Location name.
    pub name: String,
    /// Capture time.
    pub taken_at: DateTime<Utc>,
    /// Map asset to reload from.
    pub map_asset: Option<String>,
    /// Tuning.
    pub rules: LocationRules,
    /// Applied patch keys.
    pub applied_patches: Vec<String>,
    /// Placed objects.
    pub objects: Vec<PlacedObject>,
    /// Tile-keyed terrain features.
    pub terrain_features: Vec<TerrainEntry>,
    /// Bushes.
    pub large_terrain_features: Vec<LargeTerrainFeature>,
    /// Stumps, boulders and logs.
    pub resource_clumps: Vec<ResourceClump>,
    /// Furniture.
    pub furniture: Vec<Furniture>,
    /// Buildings, without interiors.
    pub buildings: Vec<Building>,
    /// Building interiors.
    pub interiors: Vec<InteriorSnapshot>,
    /// Villagers and monsters.
    pub characters: Vec<Character>,
    /// Farmers.
    pub farmers: Vec<Farmer>,
    /// Farm animals.
    pub animals: Vec<FarmAnimal>,
    /// Fixtures.
    pub fixtures: Vec<Fixture>,
    /// Bridges.
    pub bridges: Vec<Bridge>,
    /// Festival and script flags.
    pub event_state: EventState,
}

impl LocationSnapshot {
    /// Capture the persistent state of a location and its interiors.
    pub fn capture(location: &Location) -> Self {
        let interiors = location
            .buildings()
            .iter()
            .filter_map(|b| {
                b.interior().map(|inside| InteriorSnapshot {
                    building: b.id,
                    location: Self::capture(inside),
                    map_size: (inside.grid().width(), inside.grid().height()),
                })
            })
            .collect();
        Self {
            name: location.name().to_string(),
            taken_at: Utc::now(),
            map_asset: location.map_asset().map(str::to_string),
            rules: location.rules.clone(),
            applied_patches: location.applied_patches().map(str::to_string).collect(),
            objects: location.objects().values().cloned().collect(),
            terrain_features: location
                .terrain_features()
                .iter()
                .map(|(tile, feature)| TerrainEntry {
                    tile,
                    feature: feature.clone(),
                })
                .collect(),
            large_terrain_features: location.large_terrain_features().to_vec(),
            resource_clumps: location.resource_clumps().to_vec(),
            furniture: location.furniture().iter().cloned().collect(),
            buildings: location.buildings().iter().map(Building::shell).collect(),
            interiors,
            characters: location.characters().to_vec(),
            farmers: location.farmers().to_vec(),
            animals: location.animals().to_vec(),
            fixtures: location.fixtures().to_vec(),
            bridges: location.bridges().to_vec(),
            event_state: location.event_state.clone(),
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from JSON.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Rebuild a location on top of `grid`, going through the normal add
    /// hooks. Lifecycle events from the rebuild are discarded.
    ///
    /// Interiors get blank grids of their recorded size. An interior with a
    /// map asset is marked dirty so the next current pass reloads it; one
    /// without keeps no patch keys, since its patched tiles are gone.
    pub fn restore(self, grid: Grid) -> Location {
        let mut location = Location::new(self.name, grid).with_rules(self.rules);
        if let Some(asset) = self.map_asset {
            location = location.with_map_asset(asset);
        }
        location.applied_patches.extend(self.applied_patches);
        location.event_state = self.event_state;

        let mut interiors = self.interiors;
        for object in self.objects {
            location.add_object(object);
        }
        for entry in self.terrain_features {
            location.add_terrain_feature(entry.tile, entry.feature);
        }
        for feature in self.large_terrain_features {
            location.add_large_terrain_feature(feature);
        }
        for clump in self.resource_clumps {
            location.add_resource_clump(clump);
        }
        for furniture in self.furniture {
            location.add_furniture(furniture);
        }
        for mut building in self.buildings {
            if let Some(idx) = interiors.iter().position(|i| i.building == building.id) {
                let inside = interiors.swap_remove(idx);
                let (w, h) = inside.map_size;
                building = building.with_interior(inside.location.restore_placeholder(w, h));
            }
            location.add_building(building);
        }
        for character in self.characters {
            location.add_character(character);
        }
        for farmer in self.farmers {
            location.add_farmer(farmer);
        }
        for animal in self.animals {
            location.add_animal(animal);
        }
        for fixture in self.fixtures {
            location.add_fixture(fixture);
        }
        for bridge in self.bridges {
            location.add_bridge(bridge);
        }
        location.drain_events();
        location
    }

    fn restore_placeholder(self, width: u32, height: u32) -> Location {
        let mut location = self.restore(Grid::new(width, height));
        if location.map_asset().is_some() {
            location.mark_map_dirty();
        } else {
            location.applied_patches.clear();
        }
        location
    }
}
