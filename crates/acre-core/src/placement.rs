//! Placement and farming operations.
//!
//! Everything that puts a new occupant on a tile goes through here, so the
//! occupancy rules and grid placeability are checked in one place. Failures
//! are plain `false`.

use crate::building::Building;
use crate::event::LocationEvent;
use crate::furniture::Furniture;
use crate::geometry::TilePos;
use crate::location::Location;
use crate::mask::CollisionMask;
use crate::object::PlacedObject;
use crate::terrain::{Crop, HoeDirt, TerrainFeature};

impl Location {
    /// Whether an item with the given passability may be placed on a tile.
    pub fn can_item_be_placed_here(
        &self,
        tile: TilePos,
        item_passable: bool,
        mask: CollisionMask,
        ignore: CollisionMask,
    ) -> bool {
        self.is_tile_on_map(tile)
            && self
                .occupancy()
                .can_place_at(tile, item_passable, mask, ignore)
    }

    /// Place an object at its tile. Objects may sit on flooring.
    pub fn try_place_object(&mut self, object: PlacedObject) -> bool {
        if !self.can_item_be_placed_here(
            object.tile,
            object.is_passable(),
            CollisionMask::ALL,
            CollisionMask::FLOORING,
        ) {
            tracing::debug!(location = %self.name(), tile = %object.tile, item = %object.name, "placement_refused");
            return false;
        }
        self.add_object(object)
    }

    /// Place a terrain feature, ignoring the categories in `ignore`.
    pub fn try_place_terrain_feature(
        &mut self,
        tile: TilePos,
        feature: TerrainFeature,
        ignore: CollisionMask,
    ) -> bool {
        if self.terrain_feature_at(tile).is_some()
            || !self.can_item_be_placed_here(tile, feature.is_passable(), CollisionMask::ALL, ignore)
        {
            return false;
        }
        self.add_terrain_feature(tile, feature)
    }

    /// Place furniture if every covered tile accepts it.
    pub fn try_place_furniture(&mut self, furniture: Furniture) -> bool {
        let passable = furniture.is_passable();
        let fits = furniture.bounding_box().covered_tiles().into_iter().all(|tile| {
            self.can_item_be_placed_here(tile, passable, CollisionMask::ALL, CollisionMask::FLOORING)
        });
        if fits {
            self.add_furniture(furniture);
        }
        fits
    }

    /// Construct a building on buildable or diggable ground with nothing in
    /// the way but flooring.
    pub fn try_place_building(&mut self, building: Building) -> bool {
        let fits = building.bounding_box().covered_tiles().into_iter().all(|tile| {
            let grid = self.grid();
            (grid.is_buildable(tile) || grid.is_diggable(tile))
                && self.can_item_be_placed_here(
                    tile,
                    false,
                    CollisionMask::ALL,
                    CollisionMask::FLOORING,
                )
        });
        if fits {
            self.add_building(building);
        }
        fits
    }

    /// Till a diggable, empty tile.
    pub fn till(&mut self, tile: TilePos) -> bool {
        if !self.grid().is_diggable(tile)
            || self.object_at(tile).is_some()
            || self.terrain_feature_at(tile).is_some()
        {
            return false;
        }
        self.add_terrain_feature(tile, TerrainFeature::HoeDirt(HoeDirt::default()))
    }

    /// Dirt at a tile for farming. A garden pot's dirt wins over the ground.
    pub fn hoe_dirt_at(&self, tile: TilePos) -> Option<&HoeDirt> {
        if let Some(dirt) = self.object_at(tile).and_then(PlacedObject::garden_dirt) {
            return Some(dirt);
        }
        self.terrain_feature_at(tile)
            .and_then(TerrainFeature::as_hoe_dirt)
    }

    fn hoe_dirt_mut(&mut self, tile: TilePos) -> Option<&mut HoeDirt> {
        let in_pot = self
            .object_at(tile)
            .is_some_and(|o| o.garden_dirt().is_some());
        if in_pot {
            return self.object_mut(tile).and_then(PlacedObject::garden_dirt_mut);
        }
        self.terrain_feature_mut(tile)
            .and_then(TerrainFeature::as_hoe_dirt_mut)
    }

    /// Plant a crop in the dirt at a tile.
    pub fn plant_crop(&mut self, tile: TilePos, crop: Crop) -> bool {
        self.hoe_dirt_mut(tile).is_some_and(|dirt| dirt.plant(crop))
    }

    /// Water the tilled dirt at a tile.
    pub fn water(&mut self, tile: TilePos) -> bool {
        match self.hoe_dirt_mut(tile) {
            Some(dirt) => {
                dirt.watered = true;
                true
            }
            None => false,
        }
    }

    /// Harvest a ready crop, dropping the produce. Returns the crop name.
    pub fn harvest_at(&mut self, tile: TilePos) -> Option<String> {
        let dirt = self.hoe_dirt_mut(tile)?;
        let crop = dirt.crop.as_mut().filter(|c| c.is_ready())?;
        let name = crop.seed.clone();
        if !crop.harvest() {
            dirt.crop = None;
        }
        self.drop_item(name.clone(), tile);
        self.push_event(LocationEvent::Harvested {
            tile,
            crop: name.clone(),
        });
        Some(name)
    }
}
