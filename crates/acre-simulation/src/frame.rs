//! Per-frame passes.
//!
//! [`update_when_current`] runs only for the viewer's location, with full
//! fidelity. [`update_background`] runs for every loaded location and skips
//! visual-only work. Both are guarded so a location advances at most once per
//! frame however many call sites ask.

use acre_core::mask::CollisionFlags;
use acre_core::object::ObjectTick;
use acre_core::transient::{Critter, CritterKind};
use acre_core::{Location, Mover, MoverKind, PixelPos, TilePos, Velocity};
use rand::Rng;

use crate::context::SimContext;

const CRITTER_LIFETIME_MS: u32 = 20_000;
const CRITTER_KINDS: [CritterKind; 4] = [
    CritterKind::Butterfly,
    CritterKind::Bird,
    CritterKind::Frog,
    CritterKind::Rabbit,
];

/// Full update for the location being viewed. Returns `false` if the
/// location already ran this frame.
pub fn update_when_current(location: &mut Location, ctx: &mut SimContext<'_>) -> bool {
    if !location.begin_current_update(ctx.frame()) {
        return false;
    }
    let elapsed = ctx.elapsed_ms();

    if let Some(content) = ctx.content.filter(|_| location.is_map_dirty()) {
        location.reload_map(content);
    }
    location.refresh_lighting(ctx.clock.time_of_day());

    location.process_furniture_removals();
    for furniture in location.furniture_mut() {
        furniture.update_when_current(elapsed);
    }
    update_critters(location, elapsed);
    location.retain_debris(|debris| debris.update(elapsed));
    location.retain_temporary_sprites(|sprite| sprite.update(elapsed));
    location.update_splash_point(elapsed);
    update_projectiles(location);
    for tile in location.active_terrain_tiles() {
        location.tick_terrain_feature(tile, elapsed);
    }
    update_objects(location, elapsed, ctx.clock.minutes_this_frame());

    location.step_script(ctx.config.max_script_steps_per_frame);

    for building in location.buildings_mut() {
        building.update_when_current(elapsed);
    }
    update_animals(location, elapsed);
    spawn_critter(location, ctx);
    true
}

/// Reduced-fidelity update run for every loaded location, interiors
/// included. Buildings run before their interiors.
pub fn update_background(location: &mut Location, ctx: &mut SimContext<'_>) -> bool {
    if !location.begin_background_update(ctx.frame()) {
        return false;
    }
    let elapsed = ctx.elapsed_ms();

    update_characters(location, ctx);
    for building in location.buildings_mut() {
        building.update_background(elapsed);
        if let Some(interior) = building.interior_mut() {
            update_background(interior, ctx);
        }
    }
    if !ctx.is_active(location.name()) {
        for animal in location.animals_mut() {
            animal.update_when_not_current(elapsed);
        }
    }
    true
}

/// Objects are locked for the scan; anything they remove or add is
/// replayed when the lock is released.
fn update_objects(location: &mut Location, elapsed_ms: u32, minutes: u32) {
    location.lock_objects();
    for tile in location.objects().keys() {
        let Some(object) = location.object_mut(tile) else {
            continue;
        };
        if minutes > 0 {
            object.minutes_elapsed(minutes);
        }
        match object.update_when_current(elapsed_ms) {
            ObjectTick::Idle => {}
            ObjectTick::Remove => {
                location.remove_object(tile);
            }
            ObjectTick::Explode { radius } => location.explode(tile, radius),
        }
    }
    location.unlock_objects();
}

fn update_critters(location: &mut Location, elapsed_ms: u32) {
    let bounds = location.grid().pixel_bounds();
    for idx in (0..location.critters().len()).rev() {
        if !location.critters_mut()[idx].update(elapsed_ms, &bounds) {
            location.remove_critter_at(idx);
        }
    }
}

fn update_projectiles(location: &mut Location) {
    for idx in (0..location.projectiles().len()).rev() {
        let projectile = &location.projectiles()[idx];
        let next = projectile.next_box();
        let mut flags = CollisionFlags::PROJECTILE;
        if projectile.glider {
            flags |= CollisionFlags::GLIDER;
        }
        let mover = Mover::new(MoverKind::Projectile)
            .with_id(projectile.id)
            .from_box(projectile.bounding_box());
        let hit = location.is_colliding_position(&next, &mover, flags);
        if hit || !location.projectiles_mut()[idx].advance() {
            location.remove_projectile_at(idx);
        }
    }
}

fn update_animals(location: &mut Location, elapsed_ms: u32) {
    for idx in 0..location.animals().len() {
        location.animals_mut()[idx].update_when_current(elapsed_ms);
        let animal = &location.animals()[idx];
        if animal.velocity.is_zero() {
            continue;
        }
        let current = animal.bounding_box();
        let next = current.translated(animal.velocity);
        let mover = Mover::new(MoverKind::Animal)
            .with_id(animal.id)
            .from_box(current);
        let blocked = location.is_colliding_position(&next, &mover, CollisionFlags::empty());
        let animal = &mut location.animals_mut()[idx];
        if blocked {
            animal.velocity = animal.velocity.reversed();
        } else {
            animal.position = animal.position.moved(animal.velocity);
        }
    }
}

/// Characters walk only while time passes; mounts keep going regardless.
fn update_characters(location: &mut Location, ctx: &SimContext<'_>) {
    let time_passes = ctx.clock.should_time_pass();
    for idx in 0..location.characters().len() {
        let character = &mut location.characters_mut()[idx];
        if !time_passes && !character.is_mount() {
            continue;
        }
        if character.tick_halt() || character.velocity.is_zero() {
            continue;
        }
        let next = character.bounding_box().translated(character.velocity);
        let mover =
            Mover::for_character(character).ignoring_monsters(ctx.config.monsters_pass_through);
        let flags = if character.is_glider() {
            CollisionFlags::GLIDER
        } else {
            CollisionFlags::empty()
        };
        let blocked = location.is_colliding_position(&next, &mover, flags);
        let character = &mut location.characters_mut()[idx];
        if blocked {
            character.velocity = character.velocity.reversed();
        } else {
            character.position = character.position.moved(character.velocity);
        }
    }
}

fn spawn_critter(location: &mut Location, ctx: &mut SimContext<'_>) {
    let chance = location.rules.critter_spawn_chance.clamp(0.0, 1.0);
    if chance <= 0.0 || location.critters().len() >= location.rules.critter_cap {
        return;
    }
    let (width, height) = (location.grid().width() as i32, location.grid().height() as i32);
    if width == 0 || height == 0 || !ctx.rng.random_bool(chance) {
        return;
    }
    let tile = TilePos::new(ctx.rng.random_range(0..width), ctx.rng.random_range(0..height));
    let kind = CRITTER_KINDS[ctx.rng.random_range(0..CRITTER_KINDS.len())];
    let velocity = Velocity::new(ctx.rng.random_range(-2..=2), ctx.rng.random_range(-2..=2));
    location.add_critter(Critter::new(
        kind,
        PixelPos::of_tile(tile),
        velocity,
        CRITTER_LIFETIME_MS,
    ));
    tracing::trace!(location = %location.name(), %kind, %tile, "critter_spawned");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::testing::Harness;
    use acre_core::actor::{Character, CharacterKind, FarmAnimal};
    use acre_core::object::{ObjectKind, PlacedObject};
    use acre_core::rules::LocationRules;
    use acre_core::transient::Debris;
    use acre_core::{Grid, InMemoryContent, LocationEvent};

    fn farm() -> Location {
        Location::new("Farm", Grid::new(10, 10))
    }

    #[test]
    fn current_pass_runs_once_per_frame() {
        let mut harness = Harness::new();
        harness.clock.advance_frame(16);
        let mut loc = farm();
        assert!(update_when_current(&mut loc, &mut harness.ctx()));
        assert!(!update_when_current(&mut loc, &mut harness.ctx()));
        assert_eq!(loc.lighting_refreshes(), 1);

        harness.clock.advance_frame(16);
        assert!(update_when_current(&mut loc, &mut harness.ctx()));
        assert_eq!(loc.lighting_refreshes(), 2);
    }

    #[test]
    fn bomb_removal_is_replayed_after_the_scan() {
        let mut harness = Harness::new();
        harness.clock.advance_frame(16);
        let mut loc = farm();
        loc.add_object(PlacedObject::new(
            "cherry_bomb",
            ObjectKind::Bomb {
                fuse_ms: 10,
                radius: 1,
            },
            TilePos::new(5, 5),
        ));
        loc.add_object(PlacedObject::solid("crate", TilePos::new(5, 6)));
        loc.add_object(PlacedObject::solid("far", TilePos::new(0, 0)));
        update_when_current(&mut loc, &mut harness.ctx());
        assert!(!loc.objects_locked());
        assert!(loc.object_at(TilePos::new(5, 5)).is_none());
        assert!(loc.object_at(TilePos::new(5, 6)).is_none());
        assert!(loc.object_at(TilePos::new(0, 0)).is_some());
        assert!(loc
            .events()
            .iter()
            .any(|e| matches!(e, LocationEvent::Explosion { radius: 1, .. })));
    }

    #[test]
    fn dirty_map_reloads_from_content() {
        let content = InMemoryContent::new().with_map("Farm", Grid::new(20, 15));
        let mut harness = Harness::new();
        harness.clock.advance_frame(16);
        let mut loc = farm().with_map_asset("Farm");
        loc.mark_map_dirty();
        let mut ctx = harness.ctx();
        ctx.content = Some(&content);
        update_when_current(&mut loc, &mut ctx);
        assert!(!loc.is_map_dirty());
        assert_eq!(loc.grid().width(), 20);
    }

    #[test]
    fn switching_map_asset_reloads_on_next_current_pass() {
        let content = InMemoryContent::new()
            .with_map("Farm", Grid::new(10, 10))
            .with_map("FarmWinter", Grid::new(12, 8));
        let mut harness = Harness::new();
        let mut loc = farm().with_map_asset("Farm");
        loc.apply_map_override(&Grid::new(1, 1), "greenhouse", None, None, None);

        loc.set_map_asset("Farm");
        assert!(!loc.is_map_dirty());
        loc.set_map_asset("FarmWinter");
        assert!(loc.is_map_dirty());
        assert_eq!(loc.grid().width(), 10);

        harness.clock.advance_frame(16);
        let mut ctx = harness.ctx();
        ctx.content = Some(&content);
        update_when_current(&mut loc, &mut ctx);
        assert!(!loc.is_map_dirty());
        assert_eq!((loc.grid().width(), loc.grid().height()), (12, 8));
        assert!(!loc.is_patch_applied("greenhouse"));
    }

    #[test]
    fn debris_ages_out() {
        let mut harness = Harness::new();
        harness.config.frame_ms = 6_000;
        let mut loc = farm();
        loc.add_debris(Debris::at_tile("wood", TilePos::new(1, 1)));
        harness.clock.advance_frame(0);
        update_when_current(&mut loc, &mut harness.ctx());
        assert_eq!(loc.debris().len(), 1);
        harness.clock.advance_frame(0);
        update_when_current(&mut loc, &mut harness.ctx());
        assert!(loc.debris().is_empty());
    }

    #[test]
    fn animal_turns_around_at_the_map_edge() {
        let mut harness = Harness::new();
        harness.clock.advance_frame(16);
        let mut loc = farm();
        loc.add_animal(
            FarmAnimal::new("Daisy", "cow", PixelPos::new(0, 0)).with_velocity(Velocity::new(-4, 0)),
        );
        update_when_current(&mut loc, &mut harness.ctx());
        let cow = &loc.animals()[0];
        assert_eq!(cow.position, PixelPos::new(0, 0));
        assert_eq!(cow.velocity, Velocity::new(4, 0));
    }

    #[test]
    fn paused_clock_stops_villagers_but_not_mounts() {
        let mut harness = Harness::new();
        harness.clock.pause();
        harness.clock.advance_frame(16);
        let mut loc = farm();
        loc.add_character(
            Character::villager("Lewis", PixelPos::new(200, 200)).with_velocity(Velocity::new(2, 0)),
        );
        loc.add_character(
            Character::new("horse", CharacterKind::Mount, PixelPos::new(400, 400))
                .with_velocity(Velocity::new(2, 0)),
        );
        update_background(&mut loc, &mut harness.ctx());
        assert_eq!(loc.characters()[0].position, PixelPos::new(200, 200));
        assert_eq!(loc.characters()[1].position, PixelPos::new(402, 400));
    }

    #[test]
    fn animals_elsewhere_skip_visual_work() {
        let mut harness = Harness::new();
        harness.active = Some("Town".into());
        harness.config.frame_ms = 100;
        harness.clock.advance_frame(100);
        let mut loc = farm();
        loc.add_animal(
            FarmAnimal::new("Daisy", "cow", PixelPos::new(64, 64)).with_velocity(Velocity::new(1, 0)),
        );
        update_background(&mut loc, &mut harness.ctx());
        let cow = &loc.animals()[0];
        assert_eq!(cow.hunger_ms, 100);
        assert_eq!(cow.frame_ms, 0);
        assert_eq!(cow.position, PixelPos::new(64, 64));
    }

    #[test]
    fn background_pass_reaches_interiors() {
        let mut harness = Harness::new();
        harness.clock.advance_frame(16);
        let mut loc = farm();
        let coop = acre_core::building::Building::new("coop", TilePos::new(1, 1), (3, 2))
            .with_interior(Location::new("Coop", Grid::new(4, 4)));
        loc.add_building(coop);
        update_background(&mut loc, &mut harness.ctx());
        let frame = harness.clock.frame();
        let interior = loc.buildings_mut()[0].interior_mut().unwrap();
        assert!(!interior.begin_background_update(frame));
    }

    #[test]
    fn critters_spawn_up_to_the_cap() {
        let mut harness = Harness::new();
        let mut loc = farm().with_rules(LocationRules::default().with_critters(1.0, 2));
        for _ in 0..5 {
            harness.clock.advance_frame(16);
            update_when_current(&mut loc, &mut harness.ctx());
        }
        assert!(loc.critters().len() <= 2);
        assert!(!loc.critters().is_empty());
    }
}
