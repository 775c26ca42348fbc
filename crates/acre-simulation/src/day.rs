//! The once-per-day pass.
//!
//! A [`DayUpdatePass`] is an ordered list of [`DayStep`]s run against one
//! location and then, recursively, against each building interior. The
//! standard order is load-bearing: terrain ages before objects are checked
//! for overnight destruction, and destruction happens before forage respawns,
//! so nothing decays and respawns into the same slot twice in one night.

use std::fmt;

use acre_core::building::BuildingProgress;
use acre_core::calendar::Season;
use acre_core::object::{ObjectKind, PlacedObject};
use acre_core::properties::{layer, name};
use acre_core::rules::LocationKind;
use acre_core::terrain::{DayConditions, Grass, TerrainFeature};
use acre_core::{CollisionMask, Location, LocationEvent, TilePos};
use rand::Rng;

use crate::clock::DAY_START;
use crate::context::SimContext;
use crate::error::SimResult;
use crate::event::SimEventKind;

/// One stage of the day pass.
pub trait DayStep: fmt::Debug {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Apply the step to one location.
    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()>;
}

/// Ordered day-update steps.
#[derive(Debug)]
pub struct DayUpdatePass {
    steps: Vec<Box<dyn DayStep>>,
}

impl Default for DayUpdatePass {
    fn default() -> Self {
        Self::standard()
    }
}

impl DayUpdatePass {
    /// The standard step order.
    pub fn standard() -> Self {
        Self::with_steps(vec![
            Box::new(ClearTransient),
            Box::new(TerrainFeatures),
            Box::new(FurnitureAging),
            Box::new(ObjectsOvernight),
            Box::new(ForageSpawn),
            Box::new(GrassRegrowth),
            Box::new(DirtDecay),
            Box::new(BuildingCounters),
            Box::new(AnimalRest),
            Box::new(LightingCaches),
        ])
    }

    /// A pass running exactly these steps, in order.
    pub fn with_steps(steps: Vec<Box<dyn DayStep>>) -> Self {
        Self { steps }
    }

    /// Step names in run order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run the pass for the clock's current day. Returns `false` if the
    /// location already ran it today.
    pub fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<bool> {
        if !location.begin_day_update(ctx.clock.absolute_day()) {
            return Ok(false);
        }
        for step in &self.steps {
            tracing::trace!(location = %location.name(), step = step.name(), "day_step");
            step.run(location, ctx)?;
        }
        for building in location.buildings_mut() {
            if let Some(interior) = building.interior_mut() {
                self.run(interior, ctx)?;
            }
        }
        tracing::debug!(
            location = %location.name(),
            day = ctx.clock.absolute_day(),
            objects = location.objects().len(),
            terrain = location.terrain_features().len(),
            "day_update_complete"
        );
        Ok(true)
    }
}

/// Overnight conditions for a location on the clock's current date.
pub fn day_conditions(location: &Location, ctx: &SimContext<'_>) -> DayConditions {
    DayConditions {
        season: ctx.clock.season(),
        ignores_seasons: location.rules.kind.ignores_seasons(),
        tree_growth_chance: location.rules.tree_growth_chance,
    }
}

/// Critters, sprites and the splash point do not survive the night.
#[derive(Debug)]
pub struct ClearTransient;

impl DayStep for ClearTransient {
    fn name(&self) -> &str {
        "clear_transient"
    }

    fn run(&self, location: &mut Location, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        location.clear_critters();
        location.clear_temporary_sprites();
        location.clear_splash_point();
        Ok(())
    }
}

/// Drops off-map features, then ages the rest.
#[derive(Debug)]
pub struct TerrainFeatures;

impl DayStep for TerrainFeatures {
    fn name(&self) -> &str {
        "terrain_features"
    }

    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let off_map: Vec<TilePos> = location
            .terrain_features()
            .keys()
            .into_iter()
            .filter(|tile| !location.is_tile_on_map(*tile))
            .collect();
        for tile in off_map {
            tracing::debug!(location = %location.name(), %tile, "off_map_terrain_removed");
            location.remove_terrain_feature(tile);
        }

        let conditions = day_conditions(location, ctx);
        let mut dead = Vec::new();
        for tile in location.terrain_features().keys() {
            let remove = location
                .terrain_feature_mut(tile)
                .is_some_and(|feature| feature.day_update(&conditions, &mut *ctx.rng));
            if remove {
                dead.push(tile);
            }
            location.refresh_terrain_subscription(tile);
        }
        for tile in dead {
            location.remove_terrain_feature(tile);
        }
        for bush in location.large_terrain_features_mut() {
            bush.day_update(&conditions);
        }
        Ok(())
    }
}

/// Ages furniture by a day.
#[derive(Debug)]
pub struct FurnitureAging;

impl DayStep for FurnitureAging {
    fn name(&self) -> &str {
        "furniture_aging"
    }

    fn run(&self, location: &mut Location, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        for furniture in location.furniture_mut() {
            furniture.day_update();
        }
        location.process_furniture_removals();
        Ok(())
    }
}

/// Removes objects that do not survive the night, ages the rest and runs
/// sprinklers.
#[derive(Debug)]
pub struct ObjectsOvernight;

impl DayStep for ObjectsOvernight {
    fn name(&self) -> &str {
        "objects_overnight"
    }

    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let conditions = day_conditions(location, ctx);
        let sprinkled: Vec<TilePos> = location
            .objects()
            .values()
            .flat_map(PlacedObject::sprinkler_tiles)
            .collect();
        let destroyed = location.remove_objects_where(|object| object.destroy_overnight(&conditions));
        if destroyed > 0 {
            tracing::debug!(location = %location.name(), destroyed, "objects_destroyed_overnight");
        }
        for tile in location.objects().keys() {
            if let Some(object) = location.object_mut(tile) {
                object.day_update(&conditions);
            }
        }
        for tile in sprinkled {
            location.water(tile);
        }
        Ok(())
    }
}

/// Spawns forage, or weeds, stones and twigs on farms, up to the cap.
#[derive(Debug)]
pub struct ForageSpawn;

impl DayStep for ForageSpawn {
    fn name(&self) -> &str {
        "forage_spawn"
    }

    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let cap = location.rules.forage_cap;
        let attempts = location.rules.daily_spawn_attempts;
        let farm = location.rules.kind == LocationKind::Farm;
        let (width, height) = (location.grid().width() as i32, location.grid().height() as i32);
        if cap == 0 || attempts == 0 || width == 0 || height == 0 {
            return Ok(());
        }

        let counts = |object: &PlacedObject| {
            if farm {
                matches!(object.kind, ObjectKind::Weed | ObjectKind::Stone | ObjectKind::Twig)
            } else {
                object.is_forage()
            }
        };
        let mut count = location.objects().values().filter(|o| counts(*o)).count();
        let season = ctx.clock.season();
        for _ in 0..attempts {
            if count >= cap {
                break;
            }
            let tile = TilePos::new(ctx.rng.random_range(0..width), ctx.rng.random_range(0..height));
            if !can_spawn_at(location, tile, farm) {
                continue;
            }
            let object = if farm {
                farm_debris(&mut *ctx.rng, tile)
            } else {
                let options = forage_for(season);
                let item = options[ctx.rng.random_range(0..options.len())];
                PlacedObject::forage(item, tile)
            };
            let item = object.name.clone();
            if location.add_object(object) {
                count += 1;
                tracing::debug!(location = %location.name(), %tile, item = %item, "spawned");
            }
        }
        Ok(())
    }
}

fn can_spawn_at(location: &Location, tile: TilePos, farm: bool) -> bool {
    let grid = location.grid();
    let marked = grid.has_property(tile, name::SPAWNABLE, layer::BACK)
        || (farm && grid.is_diggable(tile));
    let forbidden = grid
        .no_spawn(tile)
        .is_some_and(|value| !matches!(value, "Grass" | "Tree"));
    marked
        && !forbidden
        && location.terrain_feature_at(tile).is_none()
        && location.can_item_be_placed_here(tile, false, CollisionMask::ALL, CollisionMask::NONE)
}

fn farm_debris<R: Rng + ?Sized>(rng: &mut R, tile: TilePos) -> PlacedObject {
    match rng.random_range(0..3) {
        0 => PlacedObject::new("weeds", ObjectKind::Weed, tile),
        1 => PlacedObject::new("stone", ObjectKind::Stone, tile),
        _ => PlacedObject::new("twig", ObjectKind::Twig, tile),
    }
}

fn forage_for(season: Season) -> &'static [&'static str] {
    match season {
        Season::Spring => &["wild_horseradish", "daffodil", "leek", "dandelion"],
        Season::Summer => &["grape", "spice_berry", "sweet_pea"],
        Season::Fall => &["common_mushroom", "wild_plum", "hazelnut", "blackberry"],
        Season::Winter => &["winter_root", "crystal_fruit", "snow_yam", "crocus"],
    }
}

/// Grass patches seed neighbouring diggable tiles outside of winter.
#[derive(Debug)]
pub struct GrassRegrowth;

impl DayStep for GrassRegrowth {
    fn name(&self) -> &str {
        "grass_regrowth"
    }

    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let chance = location.rules.grass_spread_chance.clamp(0.0, 1.0);
        let conditions = day_conditions(location, ctx);
        if chance <= 0.0 || (conditions.season == Season::Winter && !conditions.ignores_seasons) {
            return Ok(());
        }
        let patches: Vec<TilePos> = location
            .terrain_features()
            .iter()
            .filter(|(_, feature)| matches!(feature, TerrainFeature::Grass(_)))
            .map(|(tile, _)| tile)
            .collect();
        for tile in patches {
            if !ctx.rng.random_bool(chance) {
                continue;
            }
            let neighbours = tile.neighbors();
            let target = neighbours[ctx.rng.random_range(0..neighbours.len())];
            if grass_can_spread_to(location, target) {
                location.add_terrain_feature(target, TerrainFeature::Grass(Grass { blades: 1, shake_ms: 0 }));
            }
        }
        Ok(())
    }
}

fn grass_can_spread_to(location: &Location, tile: TilePos) -> bool {
    let grid = location.grid();
    let forbidden = grid
        .no_spawn(tile)
        .is_some_and(|value| value != "Tree");
    grid.is_diggable(tile)
        && !forbidden
        && location.terrain_feature_at(tile).is_none()
        && location.can_item_be_placed_here(tile, true, CollisionMask::ALL, CollisionMask::NONE)
}

/// Unplanted tilled dirt reverts with the location's decay chance.
#[derive(Debug)]
pub struct DirtDecay;

impl DayStep for DirtDecay {
    fn name(&self) -> &str {
        "dirt_decay"
    }

    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let chance = location.rules.dirt_decay();
        if chance <= 0.0 {
            return Ok(());
        }
        let bare: Vec<TilePos> = location
            .terrain_features()
            .iter()
            .filter(|(_, feature)| feature.as_hoe_dirt().is_some_and(|dirt| !dirt.has_crop()))
            .map(|(tile, _)| tile)
            .collect();
        let mut decayed = 0;
        for tile in bare {
            if ctx.rng.random_bool(chance) {
                location.remove_terrain_feature(tile);
                decayed += 1;
            }
        }
        if decayed > 0 {
            tracing::debug!(location = %location.name(), decayed, chance, "dirt_decayed");
        }
        Ok(())
    }
}

/// Construction and upgrade counters.
#[derive(Debug)]
pub struct BuildingCounters;

impl DayStep for BuildingCounters {
    fn name(&self) -> &str {
        "building_counters"
    }

    fn run(&self, location: &mut Location, ctx: &mut SimContext<'_>) -> SimResult<()> {
        let mut reports = Vec::new();
        for building in location.buildings_mut() {
            match building.day_update() {
                BuildingProgress::Unchanged => {}
                BuildingProgress::Constructed => reports.push(LocationEvent::BuildingConstructed {
                    kind: building.kind.clone(),
                }),
                BuildingProgress::Upgraded(level) => reports.push(LocationEvent::BuildingUpgraded {
                    kind: building.kind.clone(),
                    level,
                }),
            }
        }
        for event in reports {
            let description = event.to_string();
            ctx.emit(
                SimEventKind::Location {
                    location: location.name().to_string(),
                    event,
                },
                description,
            );
        }
        Ok(())
    }
}

/// Refills farm animals overnight.
#[derive(Debug)]
pub struct AnimalRest;

impl DayStep for AnimalRest {
    fn name(&self) -> &str {
        "animal_rest"
    }

    fn run(&self, location: &mut Location, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        for animal in location.animals_mut() {
            animal.day_update();
        }
        Ok(())
    }
}

/// Re-derives lights, seats and morning ambient light.
#[derive(Debug)]
pub struct LightingCaches;

impl DayStep for LightingCaches {
    fn name(&self) -> &str {
        "lighting_caches"
    }

    fn run(&self, location: &mut Location, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        location.rebuild_light_sources();
        location.mark_seats_dirty();
        location.refresh_lighting(DAY_START);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use crate::error::SimError;
    use acre_core::building::Building;
    use acre_core::object::FORAGE_LIFETIME_DAYS;
    use acre_core::rules::LocationRules;
    use acre_core::terrain::{Crop, HoeDirt};
    use acre_core::transient::{Critter, SplashPoint};
    use acre_core::{Grid, PixelPos, Tile, Velocity};

    fn ground(width: u32, height: u32, property: &str) -> Grid {
        let mut grid = Grid::new(width, height);
        for tile in grid.positions() {
            grid.set_tile(
                layer::BACK,
                tile,
                Some(Tile::new("ground", 0).with_property(property, "T")),
            );
        }
        grid
    }

    fn quiet_rules() -> LocationRules {
        LocationRules::for_kind(LocationKind::Outdoors)
            .with_forage(0, 0)
            .with_grass_spread_chance(0.0)
    }

    #[test]
    fn unplanted_dirt_decays_and_planted_dirt_stays() {
        let mut loc = Location::new("Field", ground(5, 5, name::DIGGABLE))
            .with_rules(quiet_rules().with_dirt_decay_chance(1.0));
        let planted = TilePos::new(1, 1);
        let bare = TilePos::new(3, 3);
        loc.add_terrain_feature(
            planted,
            TerrainFeature::HoeDirt(HoeDirt::with_crop(Crop::new("parsnip", 4, Vec::new()))),
        );
        loc.add_terrain_feature(bare, TerrainFeature::HoeDirt(HoeDirt::default()));

        let mut harness = Harness::new();
        assert!(DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap());
        assert!(loc.terrain_feature_at(bare).is_none());
        assert!(loc.terrain_feature_at(planted).is_some());
    }

    fn stale_forage_field() -> Location {
        let mut loc = Location::new("Meadow", ground(5, 5, name::SPAWNABLE))
            .with_rules(quiet_rules().with_forage(1, 50));
        let mut old = PlacedObject::forage("leek", TilePos::new(2, 2));
        old.days_placed = FORAGE_LIFETIME_DAYS;
        loc.add_object(old);
        loc
    }

    fn forage_tiles(loc: &Location) -> Vec<(TilePos, u32)> {
        loc.objects()
            .values()
            .filter(|o| o.is_forage())
            .map(|o| (o.tile, o.days_placed))
            .collect()
    }

    #[test]
    fn destruction_runs_before_respawn() {
        let mut standard = stale_forage_field();
        let mut harness = Harness::new();
        DayUpdatePass::standard().run(&mut standard, &mut harness.ctx()).unwrap();
        let after = forage_tiles(&standard);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].1, 0);

        let reordered = DayUpdatePass::with_steps(vec![
            Box::new(ClearTransient),
            Box::new(TerrainFeatures),
            Box::new(ForageSpawn),
            Box::new(ObjectsOvernight),
        ]);
        let mut swapped = stale_forage_field();
        let mut harness = Harness::new();
        reordered.run(&mut swapped, &mut harness.ctx()).unwrap();
        assert!(forage_tiles(&swapped).is_empty());
    }

    #[test]
    fn same_seed_same_spawns() {
        let run = || {
            let mut loc = stale_forage_field();
            let mut harness = Harness::new();
            DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap();
            forage_tiles(&loc)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn sprinklers_water_after_the_soil_dries() {
        let mut loc = Location::new("Farm", ground(5, 5, name::DIGGABLE))
            .with_rules(quiet_rules().with_dirt_decay_chance(0.0));
        let dirt = TilePos::new(2, 1);
        loc.add_terrain_feature(
            dirt,
            TerrainFeature::HoeDirt(HoeDirt::with_crop(Crop::new("parsnip", 4, Vec::new()))),
        );
        loc.add_object(PlacedObject::new(
            "sprinkler",
            ObjectKind::Sprinkler { radius: 1 },
            TilePos::new(2, 2),
        ));

        let pass = DayUpdatePass::standard();
        let mut harness = Harness::new();
        pass.run(&mut loc, &mut harness.ctx()).unwrap();
        let soil = loc.hoe_dirt_at(dirt).unwrap();
        assert!(soil.watered);
        assert_eq!(soil.crop.as_ref().unwrap().days_grown, 0);

        harness.clock.advance_day();
        pass.run(&mut loc, &mut harness.ctx()).unwrap();
        let soil = loc.hoe_dirt_at(dirt).unwrap();
        assert!(soil.watered);
        assert_eq!(soil.crop.as_ref().unwrap().days_grown, 1);
    }

    #[test]
    fn off_map_features_are_dropped() {
        let mut loc = Location::new("Farm", Grid::new(5, 5)).with_rules(quiet_rules());
        loc.add_terrain_feature(TilePos::new(8, 8), TerrainFeature::Grass(Grass::default()));
        loc.add_terrain_feature(TilePos::new(1, 1), TerrainFeature::Grass(Grass::default()));
        let mut harness = Harness::new();
        DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap();
        assert!(loc.terrain_feature_at(TilePos::new(8, 8)).is_none());
        assert!(loc.terrain_feature_at(TilePos::new(1, 1)).is_some());
    }

    #[test]
    fn grass_spreads_to_a_neighbour() {
        let mut loc = Location::new("Farm", ground(3, 3, name::DIGGABLE))
            .with_rules(quiet_rules().with_grass_spread_chance(1.0));
        loc.add_terrain_feature(TilePos::new(1, 1), TerrainFeature::Grass(Grass::default()));
        let mut harness = Harness::new();
        DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap();
        assert_eq!(loc.terrain_features().len(), 2);
    }

    #[test]
    fn transients_are_cleared() {
        let mut loc = Location::new("Farm", Grid::new(5, 5)).with_rules(quiet_rules());
        loc.add_critter(Critter::new(
            acre_core::transient::CritterKind::Frog,
            PixelPos::new(0, 0),
            Velocity::ZERO,
            1_000,
        ));
        loc.set_splash_point(SplashPoint {
            tile: TilePos::new(1, 1),
            remaining_ms: 5_000,
        });
        let mut harness = Harness::new();
        DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap();
        assert!(loc.critters().is_empty());
        assert!(loc.splash_point().is_none());
    }

    #[test]
    fn construction_finishing_is_reported() {
        let mut loc = Location::new("Farm", Grid::new(8, 8)).with_rules(quiet_rules());
        loc.add_building(Building::new("barn", TilePos::new(1, 1), (3, 2)).under_construction(1));
        let mut harness = Harness::new();
        DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap();
        assert!(harness.events.events().iter().any(|e| matches!(
            &e.kind,
            SimEventKind::Location { event: LocationEvent::BuildingConstructed { kind }, .. } if kind == "barn"
        )));
    }

    #[test]
    fn interiors_run_after_their_building() {
        let mut inside = Location::new("Shed", ground(4, 4, name::DIGGABLE))
            .with_rules(LocationRules::for_kind(LocationKind::Indoors));
        inside.add_terrain_feature(TilePos::new(1, 1), TerrainFeature::HoeDirt(HoeDirt::default()));
        let mut loc = Location::new("Farm", Grid::new(8, 8)).with_rules(quiet_rules());
        loc.add_building(Building::new("shed", TilePos::new(1, 1), (2, 2)).with_interior(inside));
        let mut harness = Harness::new();
        DayUpdatePass::standard().run(&mut loc, &mut harness.ctx()).unwrap();
        let shed = loc.interiors().next().unwrap();
        assert!(shed.terrain_features().is_empty());
    }

    #[test]
    fn runs_once_per_day() {
        let mut loc = Location::new("Farm", Grid::new(4, 4)).with_rules(quiet_rules());
        let pass = DayUpdatePass::standard();
        let mut harness = Harness::new();
        assert!(pass.run(&mut loc, &mut harness.ctx()).unwrap());
        assert!(!pass.run(&mut loc, &mut harness.ctx()).unwrap());
        harness.clock.advance_day();
        assert!(pass.run(&mut loc, &mut harness.ctx()).unwrap());
    }

    #[test]
    fn failing_step_stops_the_pass() {
        #[derive(Debug)]
        struct Broken;
        impl DayStep for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn run(&self, _location: &mut Location, _ctx: &mut SimContext<'_>) -> SimResult<()> {
                Err(SimError::StepFailed {
                    step: "broken".into(),
                    reason: "no soil".into(),
                })
            }
        }

        let pass = DayUpdatePass::with_steps(vec![Box::new(Broken), Box::new(LightingCaches)]);
        assert_eq!(pass.step_names(), vec!["broken", "lighting_caches"]);
        let mut loc = Location::new("Farm", Grid::new(4, 4));
        let mut harness = Harness::new();
        let err = pass.run(&mut loc, &mut harness.ctx()).unwrap_err();
        assert!(matches!(err, SimError::StepFailed { step, .. } if step == "broken"));
        assert_eq!(loc.lighting_refreshes(), 0);
    }
}
