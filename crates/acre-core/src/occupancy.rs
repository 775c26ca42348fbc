//! Occupancy and collision queries.
//!
//! [`Occupancy`] is a read-only view over a [`Location`]: it consults every
//! entity collection plus the grid to classify a tile or a pixel rectangle.
//! Collision *reactions* (grass shaking, villagers halting when bumped) need
//! mutable access and live on [`Location::is_colliding_position`].

use crate::actor::Character;
use crate::geometry::{PixelRect, TilePos};
use crate::location::Location;
use crate::mask::{CollisionFlags, CollisionMask};
use crate::occupant::{Occupant, OccupantId};
use crate::properties::{layer, name};

/// What kind of actor is asking to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverKind {
    /// The player.
    Farmer,
    /// A named townsperson.
    Villager,
    /// A hostile creature.
    Monster,
    /// A farm animal.
    Animal,
    /// A ridden mount.
    Mount,
    /// A thrown or fired object.
    Projectile,
}

/// The actor behind a rectangle collision test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mover {
    /// Skipped when testing against actors, so nothing collides with itself.
    pub id: Option<OccupantId>,
    /// Broad category.
    pub kind: MoverKind,
    /// Where the actor is now. Tiles sampled from this box are left out of
    /// the tile checks so an actor can always step off a blocked tile.
    pub current_box: Option<PixelRect>,
    /// Monsters walk through other monsters.
    pub ignores_monsters: bool,
}

impl Mover {
    /// A mover with no identity or current box.
    pub fn new(kind: MoverKind) -> Self {
        Self {
            id: None,
            kind,
            current_box: None,
            ignores_monsters: false,
        }
    }

    /// Set the id to skip among actors.
    pub fn with_id(mut self, id: OccupantId) -> Self {
        self.id = Some(id);
        self
    }

    /// Set the box the mover occupies now.
    pub fn from_box(mut self, current: PixelRect) -> Self {
        self.current_box = Some(current);
        self
    }

    /// Let the mover pass through monsters.
    pub fn ignoring_monsters(mut self, ignores: bool) -> Self {
        self.ignores_monsters = ignores;
        self
    }

    /// Mover for a character, picking the kind from its role.
    pub fn for_character(character: &Character) -> Self {
        let kind = if character.is_monster() {
            MoverKind::Monster
        } else if character.is_mount() {
            MoverKind::Mount
        } else {
            MoverKind::Villager
        };
        Self::new(kind)
            .with_id(character.id)
            .from_box(character.bounding_box())
    }

    fn is(&self, id: Option<OccupantId>) -> bool {
        self.id.is_some() && self.id == id
    }
}

/// Read-only occupancy view of one location.
#[derive(Debug, Clone, Copy)]
pub struct Occupancy<'l> {
    location: &'l Location,
}

impl Location {
    /// Query view over this location's occupants.
    pub fn occupancy(&self) -> Occupancy<'_> {
        Occupancy { location: self }
    }

    /// Test a rectangle for collision and apply collision reactions on the
    /// way. Read-only flags (glider, projectile, pathfinding) skip the
    /// reactions.
    ///
    /// Reactions only fire once the bounds and large-occupant checks have
    /// passed; a move rejected there leaves every occupant untouched.
    pub fn is_colliding_position(
        &mut self,
        rect: &PixelRect,
        mover: &Mover,
        flags: CollisionFlags,
    ) -> bool {
        if self.occupancy().blocked_before_tiles(rect, mover, flags) {
            return true;
        }
        if !flags.is_read_only() {
            self.apply_collision_reactions(rect, mover);
        }
        self.occupancy().blocked_from_tiles(rect, mover, flags)
    }

    fn apply_collision_reactions(&mut self, rect: &PixelRect, mover: &Mover) {
        for tile in moving_samples(rect, mover) {
            let reacted = self
                .terrain_feature_mut(tile)
                .is_some_and(|feature| feature.on_collision());
            if reacted {
                self.refresh_terrain_subscription(tile);
            }
        }
        if mover.kind == MoverKind::Farmer {
            for character in self.characters_mut() {
                if character.is_villager() && character.bounding_box().intersects(rect) {
                    character.on_bumped();
                }
            }
        }
    }
}

impl<'l> Occupancy<'l> {
    /// Every tile-occupying occupant whose category is in `mask`.
    pub fn all_occupants(&self, mask: CollisionMask) -> Vec<Occupant<'l>> {
        let loc = self.location;
        let mut out = Vec::new();
        out.extend(loc.objects().values().map(Occupant::Object));
        out.extend(
            loc.terrain_features()
                .iter()
                .map(|(tile, f)| Occupant::TerrainFeature(tile, f)),
        );
        out.extend(loc.large_terrain_features().iter().map(Occupant::LargeTerrainFeature));
        out.extend(loc.resource_clumps().iter().map(Occupant::ResourceClump));
        out.extend(loc.furniture().iter().map(Occupant::Furniture));
        out.extend(loc.buildings().iter().map(Occupant::Building));
        out.extend(loc.characters().iter().map(Occupant::Character));
        out.extend(loc.farmers().iter().map(Occupant::Farmer));
        out.extend(loc.animals().iter().map(Occupant::Animal));
        out.extend(loc.fixtures().iter().map(Occupant::Fixture));
        out.retain(|o| o.kind().occupies_tiles() && mask.intersects(o.category()));
        out
    }

    /// Occupants in `mask` whose bounding box intersects the tile.
    ///
    /// Point objects and terrain features are found by direct lookup; the
    /// free-roaming and multi-tile collections are scanned.
    pub fn occupants_at(&self, tile: TilePos, mask: CollisionMask) -> Vec<Occupant<'l>> {
        let loc = self.location;
        let area = tile.pixel_rect();
        let mut out = Vec::new();
        if let Some(object) = loc.object_at(tile) {
            out.push(Occupant::Object(object));
        }
        if let Some(feature) = loc.terrain_feature_at(tile) {
            out.push(Occupant::TerrainFeature(tile, feature));
        }
        let hits = |rect: PixelRect| rect.intersects(&area);
        out.extend(
            loc.large_terrain_features()
                .iter()
                .filter(|f| hits(f.bounding_box()))
                .map(Occupant::LargeTerrainFeature),
        );
        out.extend(
            loc.resource_clumps()
                .iter()
                .filter(|c| hits(c.bounding_box()))
                .map(Occupant::ResourceClump),
        );
        out.extend(
            loc.furniture()
                .iter()
                .filter(|f| hits(f.bounding_box()))
                .map(Occupant::Furniture),
        );
        out.extend(
            loc.buildings()
                .iter()
                .filter(|b| b.occupies_tile(tile))
                .map(Occupant::Building),
        );
        out.extend(
            loc.characters()
                .iter()
                .filter(|c| hits(c.bounding_box()))
                .map(Occupant::Character),
        );
        out.extend(
            loc.farmers()
                .iter()
                .filter(|f| hits(f.bounding_box()))
                .map(Occupant::Farmer),
        );
        out.extend(
            loc.animals()
                .iter()
                .filter(|a| hits(a.bounding_box()))
                .map(Occupant::Animal),
        );
        out.extend(
            loc.fixtures()
                .iter()
                .filter(|f| hits(f.bounding_box()))
                .map(Occupant::Fixture),
        );
        out.retain(|o| mask.intersects(o.category()));
        out
    }

    /// `true` if anything in `mask` sits on the tile. Passable occupants whose
    /// category is in `ignore` do not count.
    pub fn is_tile_occupied_by(
        &self,
        tile: TilePos,
        mask: CollisionMask,
        ignore: CollisionMask,
    ) -> bool {
        self.occupants_at(tile, mask)
            .iter()
            .any(|o| !(ignore.intersects(o.category()) && o.is_passable_at(tile)))
    }

    /// `true` if the tile itself is impassable, or a non-passable occupant in
    /// `mask` whose category is not in `ignore` sits on it.
    pub fn is_tile_blocked_by(
        &self,
        tile: TilePos,
        mask: CollisionMask,
        ignore: CollisionMask,
    ) -> bool {
        if !self.location.grid().is_tile_passable(tile) {
            return true;
        }
        self.occupants_at(tile, mask)
            .iter()
            .any(|o| !o.is_passable_at(tile) && !ignore.intersects(o.category()))
    }

    /// Walkable ground with nothing blocking on it.
    pub fn is_tile_passable(&self, tile: TilePos) -> bool {
        !self.is_tile_blocked_by(tile, CollisionMask::ALL, CollisionMask::NONE)
    }

    /// Grid placeability plus "no building that refuses flooring on top".
    pub fn is_tile_placeable(&self, tile: TilePos, item_passable: bool) -> bool {
        let loc = self.location;
        if !loc.grid().is_tile_placeable(tile) {
            return false;
        }
        !(item_passable
            && loc
                .buildings()
                .iter()
                .any(|b| !b.allows_flooring && b.occupies_tile(tile)))
    }

    /// Whether an item may be placed: a passable item only needs the tile not
    /// to be blocked, a solid one needs it unoccupied.
    pub fn can_place_at(
        &self,
        tile: TilePos,
        item_passable: bool,
        mask: CollisionMask,
        ignore: CollisionMask,
    ) -> bool {
        if !self.is_tile_placeable(tile, item_passable) {
            return false;
        }
        if item_passable {
            !self.is_tile_blocked_by(tile, mask, ignore)
        } else {
            !self.is_tile_occupied_by(tile, mask, ignore)
        }
    }

    /// Resolve a rectangle collision in fixed precedence, returning at the
    /// first blocking condition.
    pub fn is_colliding_position(
        &self,
        rect: &PixelRect,
        mover: &Mover,
        flags: CollisionFlags,
    ) -> bool {
        self.blocked_before_tiles(rect, mover, flags) || self.blocked_from_tiles(rect, mover, flags)
    }

    /// Map bounds, then animals, buildings, clumps, furniture, large terrain
    /// features and fixtures.
    fn blocked_before_tiles(&self, rect: &PixelRect, mover: &Mover, flags: CollisionFlags) -> bool {
        let loc = self.location;
        if !loc.grid().pixel_bounds().contains_rect(rect) && !loc.event_state.festival_active {
            return true;
        }
        !flags.contains(CollisionFlags::GLIDER) && self.blocked_by_large_occupants(rect, mover)
    }

    /// Point objects and terrain features, actors, ground properties, then
    /// the raft redirect.
    fn blocked_from_tiles(&self, rect: &PixelRect, mover: &Mover, flags: CollisionFlags) -> bool {
        let loc = self.location;
        let festival = loc.event_state.festival_active;
        let on_bridge = loc.bridges().iter().any(|b| b.carries(rect));
        let glider = flags.contains(CollisionFlags::GLIDER);
        let raft = flags.contains(CollisionFlags::RAFT);
        let samples = moving_samples(rect, mover);

        if !glider && !on_bridge {
            for &tile in &samples {
                let object_blocks = loc.object_at(tile).is_some_and(|o| !o.is_passable());
                let feature_blocks = loc
                    .terrain_feature_at(tile)
                    .is_some_and(|f| !f.is_passable());
                if object_blocks || feature_blocks {
                    return true;
                }
            }
        }

        let skip_actors = flags.intersects(CollisionFlags::PROJECTILE | CollisionFlags::PATHFINDING)
            || mover.kind == MoverKind::Projectile;
        if !skip_actors && self.blocked_by_actors(rect, mover) {
            return true;
        }

        if !on_bridge && !glider {
            for &tile in &samples {
                // A raft judges water tiles by the redirect below.
                if self.has_override(mover, tile) || (raft && loc.grid().is_water(tile)) {
                    continue;
                }
                if self.ground_blocks(tile, mover, festival) {
                    return true;
                }
            }
        }

        raft && samples
            .iter()
            .any(|&tile| !loc.grid().is_water(tile) && !self.has_override(mover, tile))
    }

    fn has_override(&self, mover: &Mover, tile: TilePos) -> bool {
        mover
            .id
            .is_some_and(|id| self.location.has_passable_override(id, tile))
    }

    fn blocked_by_large_occupants(&self, rect: &PixelRect, mover: &Mover) -> bool {
        let loc = self.location;
        loc.animals()
            .iter()
            .any(|a| !mover.is(Some(a.id)) && a.bounding_box().intersects(rect))
            || loc.buildings().iter().any(|b| b.blocks_rect(rect))
            || loc
                .resource_clumps()
                .iter()
                .any(|c| c.bounding_box().intersects(rect))
            || loc
                .furniture()
                .iter()
                .any(|f| !f.is_passable() && f.bounding_box().intersects(rect))
            || loc
                .large_terrain_features()
                .iter()
                .any(|f| f.bounding_box().intersects(rect))
            || loc
                .fixtures()
                .iter()
                .any(|f| !f.passable && f.bounding_box().intersects(rect))
    }

    /// Asymmetric actor rules. A farmer walks into villagers (bumping them)
    /// and through monsters; villagers wait for farmers; monsters may ignore
    /// each other; animals and mounts give way to everyone.
    fn blocked_by_actors(&self, rect: &PixelRect, mover: &Mover) -> bool {
        let loc = self.location;
        let farmer_hit = || {
            loc.farmers()
                .iter()
                .any(|f| !mover.is(Some(f.id)) && f.bounding_box().intersects(rect))
        };
        let mut characters = loc
            .characters()
            .iter()
            .filter(|c| !mover.is(Some(c.id)) && c.bounding_box().intersects(rect));
        match mover.kind {
            MoverKind::Farmer => characters.any(Character::is_mount),
            MoverKind::Villager => farmer_hit() || characters.any(|c| c.is_monster() || c.is_mount()),
            MoverKind::Monster => {
                farmer_hit()
                    || characters.any(|c| !(c.is_monster() && mover.ignores_monsters))
            }
            MoverKind::Animal | MoverKind::Mount => farmer_hit() || characters.next().is_some(),
            MoverKind::Projectile => false,
        }
    }

    fn ground_blocks(&self, tile: TilePos, mover: &Mover, festival: bool) -> bool {
        let grid = self.location.grid();
        if !grid.is_tile_on_map(tile) {
            return !festival;
        }
        if !grid.is_tile_passable(tile) {
            return true;
        }
        if mover.kind != MoverKind::Farmer && grid.has_property(tile, name::NPC_BARRIER, layer::BACK) {
            return true;
        }
        grid.has_property(tile, name::TEMPORARY_BARRIER, layer::BACK)
    }
}

/// Sample tiles of the target box that the mover's current box does not
/// already cover.
fn moving_samples(rect: &PixelRect, mover: &Mover) -> Vec<TilePos> {
    let current = mover
        .current_box
        .map(|b| b.sample_tiles())
        .unwrap_or_default();
    rect.sample_tiles()
        .into_iter()
        .filter(|t| !current.contains(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{Character, CharacterKind, FarmAnimal, Farmer};
    use crate::building::Building;
    use crate::furniture::{Furniture, FurnitureKind};
    use crate::geometry::{PixelPos, TILE_SIZE, TileRect};
    use crate::grid::{Grid, Tile};
    use crate::object::PlacedObject;
    use crate::terrain::{
        ClumpKind, Flooring, Grass, HoeDirt, LargeTerrainFeature, ResourceClump, TerrainFeature,
    };
    use crate::transient::{Bridge, Critter, CritterKind, Debris};
    use crate::geometry::Velocity;
    use proptest::prelude::*;

    const ALL: CollisionMask = CollisionMask::ALL;
    const NONE: CollisionMask = CollisionMask::NONE;

    fn location() -> Location {
        Location::new("Town", Grid::new(10, 10))
    }

    fn tile_box(x: i32, y: i32) -> PixelRect {
        PixelRect::new(x * TILE_SIZE + 8, y * TILE_SIZE + 16, 48, 32)
    }

    #[test]
    fn solid_object_blocks_only_its_tile() {
        let mut loc = location();
        loc.add_object(PlacedObject::solid("stone", TilePos::new(3, 3)));
        let occ = loc.occupancy();
        assert!(occ.is_tile_blocked_by(TilePos::new(3, 3), ALL, NONE));
        assert!(!occ.is_tile_blocked_by(TilePos::new(3, 4), ALL, NONE));
    }

    #[test]
    fn ignore_mask_excludes_category() {
        let mut loc = location();
        loc.add_object(PlacedObject::solid("stone", TilePos::new(3, 3)));
        let occ = loc.occupancy();
        assert!(!occ.is_tile_blocked_by(TilePos::new(3, 3), ALL, CollisionMask::OBJECTS));
        assert!(!occ.is_tile_blocked_by(
            TilePos::new(3, 3),
            CollisionMask::FURNITURE,
            NONE
        ));
    }

    #[test]
    fn tilled_dirt_occupies_but_does_not_block() {
        let mut loc = location();
        let tile = TilePos::new(2, 2);
        loc.add_terrain_feature(tile, TerrainFeature::HoeDirt(HoeDirt::default()));
        let occ = loc.occupancy();
        assert!(occ.is_tile_occupied_by(tile, ALL, NONE));
        assert!(!occ.is_tile_occupied_by(tile, ALL, CollisionMask::TERRAIN_FEATURES));
        assert!(!occ.is_tile_blocked_by(tile, ALL, NONE));
    }

    #[test]
    fn critters_and_debris_never_occupy() {
        let mut loc = location();
        loc.add_critter(Critter::new(
            CritterKind::Frog,
            PixelPos::new(64, 64),
            Velocity::ZERO,
            1_000,
        ));
        loc.add_debris(Debris::at_tile("wood", TilePos::new(1, 1)));
        let occ = loc.occupancy();
        assert!(!occ.is_tile_occupied_by(TilePos::new(1, 1), ALL, NONE));
        assert!(occ.all_occupants(ALL).is_empty());
    }

    #[test]
    fn impassable_ground_blocks() {
        let mut grid = Grid::new(4, 4);
        grid.set_tile(
            layer::BACK,
            TilePos::new(1, 1),
            Some(Tile::new("outdoors", 3).with_property(name::PASSABLE, "F")),
        );
        grid.set_tile(layer::BUILDINGS, TilePos::new(2, 1), Some(Tile::new("outdoors", 9)));
        let loc = Location::new("Cliff", grid);
        let occ = loc.occupancy();
        assert!(occ.is_tile_blocked_by(TilePos::new(1, 1), NONE, NONE));
        assert!(occ.is_tile_blocked_by(TilePos::new(2, 1), NONE, NONE));
        assert!(occ.is_tile_blocked_by(TilePos::new(-1, 0), NONE, NONE));
        assert!(!occ.is_tile_blocked_by(TilePos::new(0, 0), NONE, NONE));
    }

    #[test]
    fn malformed_passable_value_is_ignored() {
        let mut grid = Grid::new(4, 4);
        grid.set_tile(
            layer::BACK,
            TilePos::new(1, 1),
            Some(Tile::new("outdoors", 3).with_property(name::PASSABLE, "maybe")),
        );
        let loc = Location::new("Lenient", grid);
        assert!(loc.occupancy().is_tile_passable(TilePos::new(1, 1)));
    }

    #[test]
    fn passable_item_goes_over_ignored_object() {
        let mut loc = location();
        let tile = TilePos::new(3, 3);
        loc.add_object(PlacedObject::solid("stone", tile));
        let occ = loc.occupancy();
        assert!(!occ.can_place_at(tile, false, ALL, NONE));
        assert!(!occ.can_place_at(tile, true, ALL, NONE));
        assert!(occ.can_place_at(tile, true, ALL, CollisionMask::OBJECTS));
    }

    #[test]
    fn building_door_is_a_passable_cutout() {
        let mut loc = location();
        loc.add_building(Building::new("shed", TilePos::new(2, 2), (3, 2)).with_human_door(1, 1));
        let occ = loc.occupancy();
        assert!(occ.is_tile_blocked_by(TilePos::new(2, 3), ALL, NONE));
        assert!(!occ.is_tile_blocked_by(TilePos::new(3, 3), ALL, NONE));
        assert!(occ.is_tile_occupied_by(TilePos::new(3, 3), ALL, NONE));
    }

    #[test]
    fn flooring_refused_by_building() {
        let mut loc = location();
        let mut shed = Building::new("shed", TilePos::new(2, 2), (2, 2)).with_human_door(0, 1);
        shed.allows_flooring = false;
        loc.add_building(shed);
        let occ = loc.occupancy();
        assert!(!occ.can_place_at(TilePos::new(2, 3), true, ALL, CollisionMask::BUILDINGS));
    }

    #[test]
    fn out_of_bounds_blocks_unless_festival() {
        let mut loc = location();
        let rect = PixelRect::new(-10, 10, 48, 32);
        let farmer = Mover::new(MoverKind::Farmer);
        assert!(loc.occupancy().is_colliding_position(&rect, &farmer, CollisionFlags::empty()));
        loc.event_state.festival_active = true;
        assert!(!loc.occupancy().is_colliding_position(&rect, &farmer, CollisionFlags::empty()));
    }

    #[test]
    fn bridge_suppresses_ground_blocking() {
        let mut grid = Grid::new(6, 3);
        for x in 0..6 {
            grid.set_tile(
                layer::BACK,
                TilePos::new(x, 1),
                Some(Tile::new("outdoors", 1).with_property(name::PASSABLE, "F")),
            );
        }
        let mut loc = Location::new("River", grid);
        let rect = tile_box(2, 1);
        let farmer = Mover::new(MoverKind::Farmer);
        assert!(loc.occupancy().is_colliding_position(&rect, &farmer, CollisionFlags::empty()));
        loc.add_bridge(Bridge::new("plank", TileRect::new(1, 1, 4, 1)));
        assert!(!loc.occupancy().is_colliding_position(&rect, &farmer, CollisionFlags::empty()));
    }

    #[test]
    fn current_tiles_are_not_retested() {
        let mut loc = location();
        loc.add_object(PlacedObject::solid("stone", TilePos::new(2, 2)));
        let here = tile_box(2, 2);
        let step = here.translated(Velocity::new(4, 0));
        let stuck = Mover::new(MoverKind::Farmer);
        let leaving = Mover::new(MoverKind::Farmer).from_box(here);
        assert!(loc.occupancy().is_colliding_position(&step, &stuck, CollisionFlags::empty()));
        assert!(!loc.occupancy().is_colliding_position(&step, &leaving, CollisionFlags::empty()));
    }

    #[test]
    fn glider_ignores_ground_occupants() {
        let mut loc = location();
        loc.add_object(PlacedObject::solid("stone", TilePos::new(2, 2)));
        loc.add_furniture(Furniture::new("table", FurnitureKind::Table, TilePos::new(4, 4), (2, 1)));
        let bat = Mover::new(MoverKind::Monster);
        assert!(!loc.occupancy().is_colliding_position(&tile_box(2, 2), &bat, CollisionFlags::GLIDER));
        assert!(!loc.occupancy().is_colliding_position(&tile_box(4, 4), &bat, CollisionFlags::GLIDER));
        assert!(loc.occupancy().is_colliding_position(&tile_box(4, 4), &bat, CollisionFlags::empty()));
    }

    #[test]
    fn farmer_bumps_villager_without_being_blocked() {
        let mut loc = location();
        let robin = Character::villager("Robin", PixelPos::new(3 * TILE_SIZE, 3 * TILE_SIZE));
        let rect = robin.bounding_box();
        loc.add_character(robin);
        let farmer = Mover::new(MoverKind::Farmer);
        assert!(!loc.is_colliding_position(&rect, &farmer, CollisionFlags::empty()));
        assert!(loc.characters()[0].halt_frames > 0);

        let villager = Mover::new(MoverKind::Villager);
        let mut second = location();
        second.add_farmer(Farmer::new("Ada", PixelPos::new(3 * TILE_SIZE, 3 * TILE_SIZE)));
        assert!(second.occupancy().is_colliding_position(&rect, &villager, CollisionFlags::empty()));
    }

    #[test]
    fn monsters_may_pass_through_monsters() {
        let mut loc = location();
        let slime = Character::new(
            "slime",
            CharacterKind::Monster { flying: false },
            PixelPos::new(128, 128),
        );
        let rect = slime.bounding_box();
        loc.add_character(slime);
        let strict = Mover::new(MoverKind::Monster);
        let lenient = Mover::new(MoverKind::Monster).ignoring_monsters(true);
        assert!(loc.occupancy().is_colliding_position(&rect, &strict, CollisionFlags::empty()));
        assert!(!loc.occupancy().is_colliding_position(&rect, &lenient, CollisionFlags::empty()));
        let farmer = Mover::new(MoverKind::Farmer);
        assert!(!loc.occupancy().is_colliding_position(&rect, &farmer, CollisionFlags::empty()));
    }

    #[test]
    fn passable_override_lets_actor_through_barrier() {
        let mut grid = Grid::new(5, 5);
        grid.set_tile(
            layer::BACK,
            TilePos::new(2, 2),
            Some(Tile::new("town", 1).with_property(name::NPC_BARRIER, "T")),
        );
        let mut loc = Location::new("Town", grid);
        let robin = Character::villager("Robin", PixelPos::new(64, 136));
        let mover = Mover::for_character(&robin);
        let target = tile_box(2, 2);
        assert!(loc.occupancy().is_colliding_position(&target, &mover, CollisionFlags::empty()));
        let farmer = Mover::new(MoverKind::Farmer);
        assert!(!loc.occupancy().is_colliding_position(&target, &farmer, CollisionFlags::empty()));
        loc.allow_passable_tiles(robin.id, [TilePos::new(2, 2)]);
        assert!(!loc.occupancy().is_colliding_position(&target, &mover, CollisionFlags::empty()));
    }

    #[test]
    fn raft_only_floats_on_water() {
        let mut grid = Grid::new(5, 5);
        grid.set_tile(
            layer::BACK,
            TilePos::new(1, 1),
            Some(
                Tile::new("outdoors", 2)
                    .with_property(name::WATER, "T")
                    .with_property(name::PASSABLE, "F"),
            ),
        );
        let loc = Location::new("Lake", grid);
        let raft = Mover::new(MoverKind::Farmer);
        let on_water = tile_box(1, 1);
        let on_land = tile_box(3, 3);
        assert!(!loc.occupancy().is_colliding_position(&on_water, &raft, CollisionFlags::RAFT));
        assert!(loc.occupancy().is_colliding_position(&on_land, &raft, CollisionFlags::RAFT));
        assert!(loc.occupancy().is_colliding_position(&on_water, &raft, CollisionFlags::empty()));
    }

    #[test]
    fn walking_through_grass_shakes_it_unless_read_only() {
        let mut loc = location();
        let tile = TilePos::new(2, 2);
        loc.add_terrain_feature(tile, TerrainFeature::Grass(Grass::default()));
        let farmer = Mover::new(MoverKind::Farmer);
        assert!(!loc.is_colliding_position(&tile_box(2, 2), &farmer, CollisionFlags::PATHFINDING));
        assert!(!loc.is_terrain_active(tile));
        assert!(!loc.is_colliding_position(&tile_box(2, 2), &farmer, CollisionFlags::empty()));
        assert!(loc.is_terrain_active(tile));
    }

    #[test]
    fn grass_is_left_alone_when_a_building_blocks_the_move() {
        let mut loc = location();
        let tile = TilePos::new(2, 2);
        loc.add_terrain_feature(tile, TerrainFeature::Grass(Grass::default()));
        loc.add_building(Building::new("coop", TilePos::new(3, 1), (2, 3)));
        let farmer = Mover::new(MoverKind::Farmer);
        let straddle = PixelRect::new(2 * TILE_SIZE + 40, 2 * TILE_SIZE + 16, 48, 32);
        assert!(loc.is_colliding_position(&straddle, &farmer, CollisionFlags::empty()));
        assert!(!loc.is_terrain_active(tile));

        let edge = TilePos::new(0, 2);
        loc.add_terrain_feature(edge, TerrainFeature::Grass(Grass::default()));
        let outside = PixelRect::new(-8, 2 * TILE_SIZE + 16, 48, 32);
        assert!(loc.is_colliding_position(&outside, &farmer, CollisionFlags::empty()));
        assert!(!loc.is_terrain_active(edge));

        let clear = tile_box(2, 2);
        assert!(!loc.is_colliding_position(&clear, &farmer, CollisionFlags::empty()));
        assert!(loc.is_terrain_active(tile));
    }

    #[test]
    fn raft_skips_barriers_on_water_only() {
        let mut grid = Grid::new(5, 5);
        grid.set_tile(
            layer::BACK,
            TilePos::new(1, 1),
            Some(
                Tile::new("outdoors", 2)
                    .with_property(name::WATER, "T")
                    .with_property(name::TEMPORARY_BARRIER, "T"),
            ),
        );
        grid.set_tile(
            layer::BACK,
            TilePos::new(3, 3),
            Some(Tile::new("outdoors", 4).with_property(name::TEMPORARY_BARRIER, "T")),
        );
        let loc = Location::new("Lake", grid);
        let raft = Mover::new(MoverKind::Farmer);
        assert!(!loc.occupancy().is_colliding_position(&tile_box(1, 1), &raft, CollisionFlags::RAFT));
        assert!(loc.occupancy().is_colliding_position(&tile_box(1, 1), &raft, CollisionFlags::empty()));
        assert!(loc.occupancy().is_colliding_position(&tile_box(3, 3), &raft, CollisionFlags::RAFT));
    }

    #[test]
    fn flooring_under_object_is_two_occupants() {
        let mut loc = location();
        let tile = TilePos::new(4, 4);
        loc.add_object(PlacedObject::solid("keg", tile));
        loc.add_terrain_feature(tile, TerrainFeature::Flooring(Flooring::new("stone")));
        let occ = loc.occupancy();
        assert_eq!(occ.occupants_at(tile, ALL).len(), 2);
        assert_eq!(occ.occupants_at(tile, CollisionMask::FLOORING).len(), 1);
    }

    fn arb_mask() -> impl Strategy<Value = CollisionMask> {
        any::<u8>().prop_map(CollisionMask::from_bits_truncate)
    }

    fn arb_location() -> impl Strategy<Value = Location> {
        let objects = proptest::collection::vec((0i32..8, 0i32..8, any::<bool>()), 0..12);
        let furniture = proptest::collection::vec((0i32..8, 0i32..8, 1i32..3, 1i32..3), 0..4);
        let dirt = proptest::collection::vec((0i32..8, 0i32..8), 0..6);
        let buildings = proptest::collection::vec((0i32..7, 0i32..7, 1i32..4, 1i32..3), 0..2);
        let walkers = proptest::collection::vec((0i32..480, 0i32..480, 0u8..3), 0..5);
        let bushes = proptest::collection::vec((0i32..8, 0i32..8, 1i32..4), 0..3);
        let clumps = proptest::collection::vec((0i32..7, 0i32..7), 0..2);
        (
            (objects, furniture, dirt),
            (buildings, walkers, bushes, clumps),
        )
            .prop_map(|((objects, furniture, dirt), (buildings, walkers, bushes, clumps))| {
                let mut loc = Location::new("Prop", Grid::new(8, 8));
                for (x, y, solid) in objects {
                    let tile = TilePos::new(x, y);
                    let object = if solid {
                        PlacedObject::solid("crate", tile)
                    } else {
                        PlacedObject::new(
                            "mat",
                            crate::object::ObjectKind::Generic { passable: true },
                            tile,
                        )
                    };
                    loc.add_object(object);
                }
                for (x, y, w, h) in furniture {
                    loc.add_furniture(Furniture::new("rug", FurnitureKind::Rug, TilePos::new(x, y), (w, h)));
                }
                for (x, y) in dirt {
                    loc.add_terrain_feature(TilePos::new(x, y), TerrainFeature::HoeDirt(HoeDirt::default()));
                }
                for (x, y, w, h) in buildings {
                    loc.add_building(Building::new("shed", TilePos::new(x, y), (w, h)).with_human_door(0, h - 1));
                }
                for (px, py, who) in walkers {
                    let at = PixelPos::new(px, py);
                    match who {
                        0 => loc.add_character(Character::villager("Robin", at)),
                        1 => loc.add_farmer(Farmer::new("Ada", at)),
                        _ => loc.add_animal(FarmAnimal::new("Clucky", "chicken", at)),
                    }
                }
                for (x, y, w) in bushes {
                    loc.add_large_terrain_feature(LargeTerrainFeature::bush(TilePos::new(x, y), w));
                }
                for (x, y) in clumps {
                    loc.add_resource_clump(ResourceClump::new(ClumpKind::Boulder, TilePos::new(x, y)));
                }
                loc
            })
    }

    proptest! {
        #[test]
        fn occupancy_matches_bounding_boxes(loc in arb_location()) {
            let occ = loc.occupancy();
            let all = occ.all_occupants(ALL);
            for tile in loc.grid().positions() {
                let expected = all.iter().any(|o| o.bounding_box().intersects(&tile.pixel_rect()));
                prop_assert_eq!(occ.is_tile_occupied_by(tile, ALL, NONE), expected);
            }
        }

        #[test]
        fn widening_ignore_never_adds_blocked_tiles(
            loc in arb_location(),
            narrow in arb_mask(),
            extra in arb_mask(),
        ) {
            let occ = loc.occupancy();
            let wide = narrow | extra;
            for tile in loc.grid().positions() {
                if occ.is_tile_blocked_by(tile, ALL, wide) {
                    prop_assert!(occ.is_tile_blocked_by(tile, ALL, narrow));
                }
            }
        }
    }
}
