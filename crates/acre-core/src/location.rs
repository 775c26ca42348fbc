use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::actor::{Character, FarmAnimal, Farmer};
use crate::building::Building;
use crate::collections::{FurnitureCollection, PendingEdit, PointCollection};
use crate::event::LocationEvent;
use crate::furniture::Furniture;
use crate::geometry::TilePos;
use crate::grid::Grid;
use crate::object::PlacedObject;
use crate::occupant::{OccupantId, OccupantKind};
use crate::properties::{layer, name};
use crate::rules::LocationRules;
use crate::script::{ScriptedSequence, StepOutcome};
use crate::terrain::{LargeTerrainFeature, ResourceClump, TerrainFeature, TerrainTick};
use crate::transient::{
    Bridge, Critter, Debris, EventState, Fixture, LightSource, Projectile, SplashPoint,
    TemporarySprite,
};

/// One map instance and everything on it.
///
/// The location exclusively owns its grid and every entity collection.
/// Structural edits go through the `add_*`/`remove_*` methods so that
/// back-references, light sources, the active-terrain list and the event
/// queue stay in sync. Slice accessors only allow in-place mutation.
#[derive(Debug)]
pub struct Location {
    name: String,
    /// Spawn, decay and growth tuning.
    pub rules: LocationRules,
    pub(crate) grid: Grid,
    pub(crate) map_asset: Option<String>,
    pub(crate) map_dirty: bool,
    pub(crate) applied_patches: BTreeSet<String>,

    objects: PointCollection<PlacedObject>,
    terrain_features: PointCollection<TerrainFeature>,
    active_terrain: BTreeSet<TilePos>,
    large_terrain_features: Vec<LargeTerrainFeature>,
    resource_clumps: Vec<ResourceClump>,
    furniture: FurnitureCollection,
    buildings: Vec<Building>,
    characters: Vec<Character>,
    farmers: Vec<Farmer>,
    animals: Vec<FarmAnimal>,
    critters: Vec<Critter>,
    debris: Vec<Debris>,
    projectiles: Vec<Projectile>,
    temporary_sprites: Vec<TemporarySprite>,
    fixtures: Vec<Fixture>,
    bridges: Vec<Bridge>,

    light_sources: BTreeMap<String, LightSource>,
    seats: Vec<TilePos>,
    seats_dirty: bool,
    splash_point: Option<SplashPoint>,
    passable_overrides: HashMap<OccupantId, HashSet<TilePos>>,
    /// Flags owned by the scripted-event collaborator.
    pub event_state: EventState,
    script: Option<Box<dyn ScriptedSequence>>,
    events: Vec<LocationEvent>,

    last_current_frame: Option<u64>,
    last_background_frame: Option<u64>,
    last_day: Option<u32>,
    ambient_light: u8,
    lighting_refreshes: u64,

    parent_building: Option<OccupantId>,
    parent_location: Option<String>,
}

impl Location {
    /// Create a location over a loaded grid.
    pub fn new(name: impl Into<String>, grid: Grid) -> Self {
        Self {
            name: name.into(),
            rules: LocationRules::default(),
            grid,
            map_asset: None,
            map_dirty: false,
            applied_patches: BTreeSet::new(),
            objects: PointCollection::new(),
            terrain_features: PointCollection::new(),
            active_terrain: BTreeSet::new(),
            large_terrain_features: Vec::new(),
            resource_clumps: Vec::new(),
            furniture: FurnitureCollection::new(),
            buildings: Vec::new(),
            characters: Vec::new(),
            farmers: Vec::new(),
            animals: Vec::new(),
            critters: Vec::new(),
            debris: Vec::new(),
            projectiles: Vec::new(),
            temporary_sprites: Vec::new(),
            fixtures: Vec::new(),
            bridges: Vec::new(),
            light_sources: BTreeMap::new(),
            seats: Vec::new(),
            seats_dirty: true,
            splash_point: None,
            passable_overrides: HashMap::new(),
            event_state: EventState::default(),
            script: None,
            events: Vec::new(),
            last_current_frame: None,
            last_background_frame: None,
            last_day: None,
            ambient_light: u8::MAX,
            lighting_refreshes: 0,
            parent_building: None,
            parent_location: None,
        }
    }

    /// Replace the tuning.
    pub fn with_rules(mut self, rules: LocationRules) -> Self {
        self.rules = rules;
        self
    }

    /// Record the map asset this location loads from.
    pub fn with_map_asset(mut self, asset: impl Into<String>) -> Self {
        self.map_asset = Some(asset.into());
        self
    }

    /// Location name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The loaded tile grid.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Asset the grid is loaded from.
    pub fn map_asset(&self) -> Option<&str> {
        self.map_asset.as_deref()
    }

    /// Point the location at a different map. The grid is reloaded by the
    /// next current-frame pass.
    pub fn set_map_asset(&mut self, asset: impl Into<String>) {
        let asset = asset.into();
        if self.map_asset.as_deref() != Some(asset.as_str()) {
            self.map_asset = Some(asset);
            self.map_dirty = true;
        }
    }

    /// Force a reload on the next current frame.
    pub fn mark_map_dirty(&mut self) {
        self.map_dirty = true;
    }

    /// Whether the grid awaits a reload.
    pub fn is_map_dirty(&self) -> bool {
        self.map_dirty
    }

    /// Whether `tile` lies inside the map.
    pub fn is_tile_on_map(&self, tile: TilePos) -> bool {
        self.grid.is_tile_on_map(tile)
    }

    /// Building this location is the interior of.
    pub fn parent_building(&self) -> Option<OccupantId> {
        self.parent_building
    }

    /// Location the parent building stands in.
    pub fn parent_location(&self) -> Option<&str> {
        self.parent_location.as_deref()
    }

    pub(crate) fn push_event(&mut self, event: LocationEvent) {
        self.events.push(event);
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[LocationEvent] {
        &self.events
    }

    /// Take the lifecycle events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<LocationEvent> {
        std::mem::take(&mut self.events)
    }

    // --- point objects ---------------------------------------------------

    /// Placed objects by tile.
    pub fn objects(&self) -> &PointCollection<PlacedObject> {
        &self.objects
    }

    /// Object on a tile.
    pub fn object_at(&self, tile: TilePos) -> Option<&PlacedObject> {
        self.objects.get(tile)
    }

    /// In-place access. The object's tile must not change.
    pub fn object_mut(&mut self, tile: TilePos) -> Option<&mut PlacedObject> {
        self.objects.get_mut(tile)
    }

    /// Add an object at its own tile. Returns `false` if the tile already
    /// holds one. While the collection is locked the insert is queued and
    /// `true` is returned; a conflict at replay time is reported as an event.
    pub fn add_object(&mut self, object: PlacedObject) -> bool {
        if self.objects.is_locked() {
            self.objects.defer(PendingEdit::Insert(object.tile, object));
            return true;
        }
        self.insert_object(object)
    }

    fn insert_object(&mut self, mut object: PlacedObject) -> bool {
        let tile = object.tile;
        object.location = Some(self.name.clone());
        if let Some(radius) = object.light_radius() {
            self.light_sources.insert(
                object_light_key(object.id),
                LightSource::new(object_light_key(object.id), tile, radius),
            );
        }
        let label = object.name.clone();
        match self.objects.insert_new(tile, object) {
            Ok(()) => {
                self.push_event(LocationEvent::Added {
                    kind: OccupantKind::PointObject,
                    label,
                    tile: Some(tile),
                });
                true
            }
            Err(rejected) => {
                if rejected.light_radius().is_some() {
                    self.light_sources.remove(&object_light_key(rejected.id));
                }
                false
            }
        }
    }

    /// Remove the object at a tile. Absent keys are a no-op. While locked the
    /// removal is queued and `None` is returned.
    pub fn remove_object(&mut self, tile: TilePos) -> Option<PlacedObject> {
        if self.objects.is_locked() {
            if self.objects.contains(tile) || self.objects.has_pending_insert(tile) {
                self.objects.defer(PendingEdit::Remove(tile));
            }
            return None;
        }
        let mut object = self.objects.remove(tile)?;
        self.on_object_removed(&mut object);
        Some(object)
    }

    fn on_object_removed(&mut self, object: &mut PlacedObject) {
        object.location = None;
        self.light_sources.remove(&object_light_key(object.id));
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::PointObject,
            label: object.name.clone(),
            tile: Some(object.tile),
        });
    }

    /// Remove every object matching the predicate, through the removal hook.
    pub fn remove_objects_where(&mut self, mut pred: impl FnMut(&PlacedObject) -> bool) -> usize {
        let removed = self.objects.drain_where(|_, o| pred(o));
        let count = removed.len();
        for (_, mut object) in removed {
            self.on_object_removed(&mut object);
        }
        count
    }

    /// Defer structural edits to the object collection.
    pub fn lock_objects(&mut self) {
        self.objects.lock();
    }

    /// Stop deferring and replay queued edits through the normal hooks.
    pub fn unlock_objects(&mut self) {
        for edit in self.objects.unlock() {
            match edit {
                PendingEdit::Insert(tile, object) => {
                    let label = object.name.clone();
                    if !self.insert_object(object) {
                        tracing::debug!(location = %self.name, %tile, "deferred_insert_rejected");
                        self.push_event(LocationEvent::InsertRejected { tile, label });
                    }
                }
                PendingEdit::Remove(tile) => {
                    self.remove_object(tile);
                }
            }
        }
    }

    /// Whether object edits are being deferred.
    pub fn objects_locked(&self) -> bool {
        self.objects.is_locked()
    }

    // --- terrain features ------------------------------------------------

    /// Terrain features by tile.
    pub fn terrain_features(&self) -> &PointCollection<TerrainFeature> {
        &self.terrain_features
    }

    /// Terrain feature on a tile.
    pub fn terrain_feature_at(&self, tile: TilePos) -> Option<&TerrainFeature> {
        self.terrain_features.get(tile)
    }

    /// In-place access. Call [`Location::refresh_terrain_subscription`] after
    /// a change that may start or stop per-frame animation.
    pub fn terrain_feature_mut(&mut self, tile: TilePos) -> Option<&mut TerrainFeature> {
        self.terrain_features.get_mut(tile)
    }

    /// Add a terrain feature. Returns `false` if the tile already holds one.
    pub fn add_terrain_feature(&mut self, tile: TilePos, feature: TerrainFeature) -> bool {
        let label = feature.label().to_string();
        let needs_tick = feature.needs_tick();
        if self.terrain_features.insert_new(tile, feature).is_err() {
            return false;
        }
        if needs_tick {
            self.active_terrain.insert(tile);
        }
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::TerrainFeature,
            label,
            tile: Some(tile),
        });
        true
    }

    /// Remove a terrain feature without side effects beyond bookkeeping.
    pub fn remove_terrain_feature(&mut self, tile: TilePos) -> Option<TerrainFeature> {
        let feature = self.terrain_features.remove(tile)?;
        self.active_terrain.remove(&tile);
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::TerrainFeature,
            label: feature.label().to_string(),
            tile: Some(tile),
        });
        Some(feature)
    }

    /// Destroy a terrain feature: remove it and spawn whatever it drops.
    pub fn destroy_terrain_feature(&mut self, tile: TilePos) -> Option<TerrainFeature> {
        let feature = self.terrain_features.remove(tile)?;
        self.active_terrain.remove(&tile);
        if let Some(item) = feature.destroyed_drop() {
            self.drop_item(item, tile);
        }
        self.push_event(LocationEvent::Destroyed {
            kind: OccupantKind::TerrainFeature,
            label: feature.label().to_string(),
            tile: Some(tile),
        });
        Some(feature)
    }

    /// Re-check whether a feature wants per-frame updates.
    pub fn refresh_terrain_subscription(&mut self, tile: TilePos) {
        match self.terrain_features.get(tile) {
            Some(f) if f.needs_tick() => {
                self.active_terrain.insert(tile);
            }
            _ => {
                self.active_terrain.remove(&tile);
            }
        }
    }

    /// Tiles whose features currently want per-frame updates.
    pub fn active_terrain_tiles(&self) -> Vec<TilePos> {
        self.active_terrain.iter().copied().collect()
    }

    /// Whether the feature on `tile` gets per-frame updates.
    pub fn is_terrain_active(&self, tile: TilePos) -> bool {
        self.active_terrain.contains(&tile)
    }

    /// Advance one subscribed feature and apply the outcome.
    pub fn tick_terrain_feature(&mut self, tile: TilePos, elapsed_ms: u32) -> TerrainTick {
        let Some(feature) = self.terrain_features.get_mut(tile) else {
            self.active_terrain.remove(&tile);
            return TerrainTick::Idle;
        };
        let outcome = feature.tick(elapsed_ms);
        match outcome {
            TerrainTick::Idle => {
                self.active_terrain.remove(&tile);
            }
            TerrainTick::Active => {}
            TerrainTick::Destroyed => {
                self.destroy_terrain_feature(tile);
            }
        }
        outcome
    }

    /// Remove every terrain feature matching the predicate.
    pub fn remove_terrain_features_where(
        &mut self,
        mut pred: impl FnMut(TilePos, &TerrainFeature) -> bool,
    ) -> usize {
        let removed = self.terrain_features.drain_where(|t, f| pred(t, f));
        let count = removed.len();
        for (tile, feature) in removed {
            self.active_terrain.remove(&tile);
            self.push_event(LocationEvent::Removed {
                kind: OccupantKind::TerrainFeature,
                label: feature.label().to_string(),
                tile: Some(tile),
            });
        }
        count
    }

    // --- large terrain features and resource clumps ----------------------

    /// Bushes.
    pub fn large_terrain_features(&self) -> &[LargeTerrainFeature] {
        &self.large_terrain_features
    }

    /// Bushes, mutably.
    pub fn large_terrain_features_mut(&mut self) -> &mut [LargeTerrainFeature] {
        &mut self.large_terrain_features
    }

    /// Add a bush.
    pub fn add_large_terrain_feature(&mut self, feature: LargeTerrainFeature) {
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::LargeTerrainFeature,
            label: "bush".into(),
            tile: Some(feature.tile),
        });
        self.large_terrain_features.push(feature);
    }

    /// Remove a bush by id.
    pub fn remove_large_terrain_feature(&mut self, id: OccupantId) -> Option<LargeTerrainFeature> {
        let idx = self.large_terrain_features.iter().position(|f| f.id == id)?;
        let feature = self.large_terrain_features.remove(idx);
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::LargeTerrainFeature,
            label: "bush".into(),
            tile: Some(feature.tile),
        });
        Some(feature)
    }

    /// Stumps, boulders and logs.
    pub fn resource_clumps(&self) -> &[ResourceClump] {
        &self.resource_clumps
    }

    /// Add a resource clump.
    pub fn add_resource_clump(&mut self, clump: ResourceClump) {
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::ResourceClump,
            label: clump.kind.to_string(),
            tile: Some(clump.tile),
        });
        self.resource_clumps.push(clump);
    }

    /// Remove a resource clump by id.
    pub fn remove_resource_clump(&mut self, id: OccupantId) -> Option<ResourceClump> {
        let idx = self.resource_clumps.iter().position(|c| c.id == id)?;
        let clump = self.resource_clumps.remove(idx);
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::ResourceClump,
            label: clump.kind.to_string(),
            tile: Some(clump.tile),
        });
        Some(clump)
    }

    /// Hit a clump. When it breaks it is destroyed and drops its resource.
    /// Returns `true` if it broke.
    pub fn damage_resource_clump(&mut self, id: OccupantId, damage: i32) -> bool {
        let Some(idx) = self.resource_clumps.iter().position(|c| c.id == id) else {
            return false;
        };
        if !self.resource_clumps[idx].hit(damage) {
            return false;
        }
        let clump = self.resource_clumps.remove(idx);
        self.drop_item(clump.kind.yield_item(), clump.tile);
        self.push_event(LocationEvent::Destroyed {
            kind: OccupantKind::ResourceClump,
            label: clump.kind.to_string(),
            tile: Some(clump.tile),
        });
        true
    }

    // --- furniture --------------------------------------------------------

    /// Placed furniture.
    pub fn furniture(&self) -> &FurnitureCollection {
        &self.furniture
    }

    /// Furniture, mutably.
    pub fn furniture_mut(&mut self) -> &mut [Furniture] {
        self.furniture.as_mut_slice()
    }

    /// Place furniture, registering its light and seats.
    pub fn add_furniture(&mut self, mut furniture: Furniture) {
        furniture.location = Some(self.name.clone());
        if let Some(radius) = furniture.light_radius() {
            let key = furniture_light_key(furniture.id);
            self.light_sources
                .insert(key.clone(), LightSource::new(key, furniture.tile, radius));
        }
        if furniture.is_seat() {
            self.seats_dirty = true;
        }
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::Furniture,
            label: furniture.name.clone(),
            tile: Some(furniture.tile),
        });
        self.furniture.push(furniture);
    }

    /// Queue furniture for removal at the next processing point.
    pub fn mark_furniture_for_removal(&mut self, id: OccupantId) {
        self.furniture.mark_for_removal(id);
    }

    /// Apply queued furniture removals through the removal hook.
    pub fn process_furniture_removals(&mut self) -> usize {
        let removed = self.furniture.process_removals();
        let count = removed.len();
        for mut furniture in removed {
            self.on_furniture_removed(&mut furniture);
        }
        count
    }

    /// Remove furniture immediately. Only safe outside of iteration.
    pub fn remove_furniture(&mut self, id: OccupantId) -> Option<Furniture> {
        let mut furniture = self.furniture.remove_now(id)?;
        self.on_furniture_removed(&mut furniture);
        Some(furniture)
    }

    fn on_furniture_removed(&mut self, furniture: &mut Furniture) {
        furniture.location = None;
        self.light_sources.remove(&furniture_light_key(furniture.id));
        if furniture.is_seat() {
            self.seats_dirty = true;
        }
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::Furniture,
            label: furniture.name.clone(),
            tile: Some(furniture.tile),
        });
    }

    // --- buildings ---------------------------------------------------------

    /// Buildings.
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Buildings, mutably.
    pub fn buildings_mut(&mut self) -> &mut [Building] {
        &mut self.buildings
    }

    /// Building by id.
    pub fn building(&self, id: OccupantId) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == id)
    }

    /// Add a building and wire its interior back to this location.
    pub fn add_building(&mut self, mut building: Building) {
        building.parent_location = Some(self.name.clone());
        let id = building.id;
        let parent = self.name.clone();
        if let Some(interior) = building.interior_mut() {
            interior.parent_building = Some(id);
            interior.parent_location = Some(parent);
        }
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::Building,
            label: building.kind.clone(),
            tile: Some(building.tile),
        });
        self.buildings.push(building);
    }

    /// Remove a building, detaching its interior.
    pub fn remove_building(&mut self, id: OccupantId) -> Option<Building> {
        let idx = self.buildings.iter().position(|b| b.id == id)?;
        let mut building = self.buildings.remove(idx);
        building.parent_location = None;
        if let Some(interior) = building.interior_mut() {
            interior.parent_building = None;
            interior.parent_location = None;
        }
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::Building,
            label: building.kind.clone(),
            tile: Some(building.tile),
        });
        Some(building)
    }

    /// Interiors of buildings on this map.
    pub fn interiors(&self) -> impl Iterator<Item = &Location> {
        self.buildings.iter().filter_map(Building::interior)
    }

    // --- actors --------------------------------------------------------------

    /// Villagers and monsters.
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Characters, mutably.
    pub fn characters_mut(&mut self) -> &mut [Character] {
        &mut self.characters
    }

    /// Add a character.
    pub fn add_character(&mut self, character: Character) {
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::Character,
            label: character.name.clone(),
            tile: None,
        });
        self.characters.push(character);
    }

    /// Remove a character and its passable overrides.
    pub fn remove_character(&mut self, id: OccupantId) -> Option<Character> {
        let idx = self.characters.iter().position(|c| c.id == id)?;
        let character = self.characters.remove(idx);
        self.passable_overrides.remove(&id);
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::Character,
            label: character.name.clone(),
            tile: None,
        });
        Some(character)
    }

    /// Farmers present.
    pub fn farmers(&self) -> &[Farmer] {
        &self.farmers
    }

    /// Farmers, mutably.
    pub fn farmers_mut(&mut self) -> &mut [Farmer] {
        &mut self.farmers
    }

    /// Add a farmer.
    pub fn add_farmer(&mut self, farmer: Farmer) {
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::Farmer,
            label: farmer.name.clone(),
            tile: None,
        });
        self.farmers.push(farmer);
    }

    /// Remove a farmer and its passable overrides.
    pub fn remove_farmer(&mut self, id: OccupantId) -> Option<Farmer> {
        let idx = self.farmers.iter().position(|f| f.id == id)?;
        let farmer = self.farmers.remove(idx);
        self.passable_overrides.remove(&id);
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::Farmer,
            label: farmer.name.clone(),
            tile: None,
        });
        Some(farmer)
    }

    /// Farm animals.
    pub fn animals(&self) -> &[FarmAnimal] {
        &self.animals
    }

    /// Farm animals, mutably.
    pub fn animals_mut(&mut self) -> &mut [FarmAnimal] {
        &mut self.animals
    }

    /// Add a farm animal.
    pub fn add_animal(&mut self, animal: FarmAnimal) {
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::Animal,
            label: animal.name.clone(),
            tile: None,
        });
        self.animals.push(animal);
    }

    /// Remove a farm animal by id.
    pub fn remove_animal(&mut self, id: OccupantId) -> Option<FarmAnimal> {
        let idx = self.animals.iter().position(|a| a.id == id)?;
        let animal = self.animals.remove(idx);
        self.push_event(LocationEvent::Removed {
            kind: OccupantKind::Animal,
            label: animal.name.clone(),
            tile: None,
        });
        Some(animal)
    }

    // --- transient occupants ---------------------------------------------

    /// Ambient critters.
    pub fn critters(&self) -> &[Critter] {
        &self.critters
    }

    /// Critters, mutably.
    pub fn critters_mut(&mut self) -> &mut [Critter] {
        &mut self.critters
    }

    /// Add a critter.
    pub fn add_critter(&mut self, critter: Critter) {
        self.critters.push(critter);
    }

    /// Remove by index. Iterate in reverse when removing during a scan.
    pub fn remove_critter_at(&mut self, idx: usize) -> Option<Critter> {
        (idx < self.critters.len()).then(|| self.critters.remove(idx))
    }

    /// Drop every critter.
    pub fn clear_critters(&mut self) {
        self.critters.clear();
    }

    /// Dropped items.
    pub fn debris(&self) -> &[Debris] {
        &self.debris
    }

    /// Drop an item on the ground.
    pub fn add_debris(&mut self, debris: Debris) {
        self.debris.push(debris);
    }

    /// Update debris in place, dropping entries the closure rejects.
    pub fn retain_debris(&mut self, keep: impl FnMut(&mut Debris) -> bool) {
        self.debris.retain_mut(keep);
    }

    /// Projectiles in flight.
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Projectiles, mutably.
    pub fn projectiles_mut(&mut self) -> &mut [Projectile] {
        &mut self.projectiles
    }

    /// Fire a projectile.
    pub fn add_projectile(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    /// Remove a projectile by index.
    pub fn remove_projectile_at(&mut self, idx: usize) -> Option<Projectile> {
        (idx < self.projectiles.len()).then(|| self.projectiles.remove(idx))
    }

    /// Visual effects.
    pub fn temporary_sprites(&self) -> &[TemporarySprite] {
        &self.temporary_sprites
    }

    /// Show a visual effect.
    pub fn add_temporary_sprite(&mut self, sprite: TemporarySprite) {
        self.temporary_sprites.push(sprite);
    }

    /// Update sprites in place, dropping those `keep` rejects.
    pub fn retain_temporary_sprites(&mut self, keep: impl FnMut(&mut TemporarySprite) -> bool) {
        self.temporary_sprites.retain_mut(keep);
    }

    /// Drop every visual effect.
    pub fn clear_temporary_sprites(&mut self) {
        self.temporary_sprites.clear();
    }

    /// Fixed obstacles.
    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Add a fixture.
    pub fn add_fixture(&mut self, fixture: Fixture) {
        self.push_event(LocationEvent::Added {
            kind: OccupantKind::Fixture,
            label: fixture.name.clone(),
            tile: Some(fixture.tile),
        });
        self.fixtures.push(fixture);
    }

    /// Bridges.
    pub fn bridges(&self) -> &[Bridge] {
        &self.bridges
    }

    /// Bridges, mutably.
    pub fn bridges_mut(&mut self) -> &mut [Bridge] {
        &mut self.bridges
    }

    /// Add a bridge.
    pub fn add_bridge(&mut self, bridge: Bridge) {
        self.bridges.push(bridge);
    }

    /// The fishing spot, if any.
    pub fn splash_point(&self) -> Option<&SplashPoint> {
        self.splash_point.as_ref()
    }

    /// Set the fishing spot.
    pub fn set_splash_point(&mut self, point: SplashPoint) {
        self.splash_point = Some(point);
    }

    /// Count down the splash point, clearing it when done.
    pub fn update_splash_point(&mut self, elapsed_ms: u32) {
        if let Some(point) = &mut self.splash_point {
            point.remaining_ms = point.remaining_ms.saturating_sub(elapsed_ms);
            if point.remaining_ms == 0 {
                self.splash_point = None;
            }
        }
    }

    /// Remove the fishing spot.
    pub fn clear_splash_point(&mut self) {
        self.splash_point = None;
    }

    /// Spawn a debris item at a tile.
    pub fn drop_item(&mut self, item: impl Into<String>, tile: TilePos) {
        self.add_debris(Debris::at_tile(item, tile));
    }

    /// Clear objects and break weak terrain within `radius` tiles.
    pub fn explode(&mut self, center: TilePos, radius: i32) {
        self.push_event(LocationEvent::Explosion {
            tile: center,
            radius,
        });
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let tile = center.offset(dx, dy);
                self.remove_object(tile);
                let breaks = matches!(
                    self.terrain_features.get(tile),
                    Some(TerrainFeature::Grass(_) | TerrainFeature::Tree(_))
                );
                if breaks {
                    self.destroy_terrain_feature(tile);
                }
            }
        }
    }

    // --- lights and seats ----------------------------------------------------

    /// Registered lights.
    pub fn light_sources(&self) -> impl Iterator<Item = &LightSource> {
        self.light_sources.values()
    }

    /// Register a light, replacing any with the same key.
    pub fn add_light_source(&mut self, light: LightSource) {
        self.light_sources.insert(light.key.clone(), light);
    }

    /// Remove a light by key.
    pub fn remove_light_source(&mut self, key: &str) -> Option<LightSource> {
        self.light_sources.remove(key)
    }

    /// Re-derive every light from objects, furniture and `Light` tiles.
    pub fn rebuild_light_sources(&mut self) {
        self.light_sources.clear();
        let mut lights = Vec::new();
        for object in self.objects.values() {
            if let Some(radius) = object.light_radius() {
                lights.push(LightSource::new(object_light_key(object.id), object.tile, radius));
            }
        }
        for furniture in self.furniture.iter() {
            if let Some(radius) = furniture.light_radius() {
                lights.push(LightSource::new(
                    furniture_light_key(furniture.id),
                    furniture.tile,
                    radius,
                ));
            }
        }
        for tile in self.grid.positions() {
            if let Some(light) = tile_light(&self.grid, tile) {
                lights.push(light);
            }
        }
        for light in lights {
            self.light_sources.insert(light.key.clone(), light);
        }
    }

    /// Register the light authored on a tile, if any.
    pub fn register_tile_light(&mut self, tile: TilePos) {
        if let Some(light) = tile_light(&self.grid, tile) {
            self.add_light_source(light);
        }
    }

    /// Rebuild seats on next use.
    pub fn mark_seats_dirty(&mut self) {
        self.seats_dirty = true;
    }

    /// Whether seats await a rebuild.
    pub fn seats_dirty(&self) -> bool {
        self.seats_dirty
    }

    /// Seat tiles from furniture and `Seat` tiles, rebuilt when dirty.
    pub fn seats(&mut self) -> &[TilePos] {
        if self.seats_dirty {
            let mut seats: Vec<TilePos> = self
                .furniture
                .iter()
                .flat_map(Furniture::seat_tiles)
                .collect();
            seats.extend(
                self.grid
                    .positions()
                    .filter(|t| self.grid.has_property(*t, name::SEAT, layer::BUILDINGS)),
            );
            seats.sort();
            seats.dedup();
            self.seats = seats;
            self.seats_dirty = false;
        }
        &self.seats
    }

    // --- scripted overrides ----------------------------------------------

    /// Let an actor walk on tiles that are normally blocked.
    pub fn allow_passable_tiles(&mut self, actor: OccupantId, tiles: impl IntoIterator<Item = TilePos>) {
        self.passable_overrides.entry(actor).or_default().extend(tiles);
    }

    /// Drop every override for `actor`.
    pub fn clear_passable_overrides(&mut self, actor: OccupantId) {
        self.passable_overrides.remove(&actor);
    }

    /// Whether `actor` may walk on `tile` regardless of blockers.
    pub fn has_passable_override(&self, actor: OccupantId, tile: TilePos) -> bool {
        self.passable_overrides
            .get(&actor)
            .is_some_and(|tiles| tiles.contains(&tile))
    }

    /// Hand a scripted sequence to the location. Replaces any running one.
    pub fn start_script(&mut self, script: Box<dyn ScriptedSequence>) {
        if let Some(old) = &self.script {
            tracing::debug!(location = %self.name, script = old.name(), "script_replaced");
        }
        self.script = Some(script);
    }

    /// Running scripted sequence.
    pub fn script(&self) -> Option<&dyn ScriptedSequence> {
        self.script.as_deref()
    }

    /// Run the scripted sequence: one step, more only while it asks to
    /// continue, never more than `max_steps`. Returns the steps run.
    pub fn step_script(&mut self, max_steps: usize) -> usize {
        let Some(mut script) = self.script.take() else {
            return 0;
        };
        let limit = max_steps.max(1);
        let mut steps = 0;
        while steps < limit {
            let outcome = script.step(self);
            steps += 1;
            match outcome {
                StepOutcome::Continue => {}
                StepOutcome::Yield => break,
                StepOutcome::Finished => {
                    self.push_event(LocationEvent::ScriptFinished {
                        name: script.name().to_string(),
                    });
                    return steps;
                }
            }
        }
        if self.script.is_none() {
            self.script = Some(script);
        }
        steps
    }

    // --- pass guards and lighting ----------------------------------------

    /// Claim the current-frame update for `frame`. Returns `false` if it
    /// already ran this frame.
    pub fn begin_current_update(&mut self, frame: u64) -> bool {
        if self.last_current_frame == Some(frame) {
            return false;
        }
        self.last_current_frame = Some(frame);
        true
    }

    /// Claim the background update for `frame`.
    pub fn begin_background_update(&mut self, frame: u64) -> bool {
        if self.last_background_frame == Some(frame) {
            return false;
        }
        self.last_background_frame = Some(frame);
        true
    }

    /// Claim the day update for an absolute day number.
    pub fn begin_day_update(&mut self, day: u32) -> bool {
        if self.last_day == Some(day) {
            return false;
        }
        self.last_day = Some(day);
        true
    }

    /// Recompute ambient light for a time of day (`600`..`2600`).
    pub fn refresh_lighting(&mut self, time_of_day: u32) {
        self.lighting_refreshes += 1;
        self.ambient_light = if !self.rules.kind.is_outdoors() || time_of_day < 1800 {
            u8::MAX
        } else {
            let dusk = (time_of_day.min(2600) - 1800) / 100;
            (u32::from(u8::MAX) - dusk * 20).clamp(60, u32::from(u8::MAX)) as u8
        };
    }

    /// Morning ambient light level.
    pub fn ambient_light(&self) -> u8 {
        self.ambient_light
    }

    /// Times lighting was refreshed since the location was created.
    pub fn lighting_refreshes(&self) -> u64 {
        self.lighting_refreshes
    }
}

fn object_light_key(id: OccupantId) -> String {
    format!("object:{id}")
}

fn furniture_light_key(id: OccupantId) -> String {
    format!("furniture:{id}")
}

fn tile_light(grid: &Grid, tile: TilePos) -> Option<LightSource> {
    let raw = grid
        .tile_property(tile, name::LIGHT, layer::FRONT)
        .or_else(|| grid.tile_property(tile, name::LIGHT, layer::BUILDINGS))?;
    match raw.trim().parse::<u32>() {
        Ok(radius) => Some(LightSource::new(
            format!("tile:{},{}", tile.x, tile.y),
            tile,
            radius,
        )),
        Err(_) => {
            tracing::debug!(%tile, value = raw, "malformed_light_property");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::furniture::FurnitureKind;
    use crate::object::ObjectKind;
    use crate::geometry::PixelPos;
    use crate::terrain::{ClumpKind, Grass, HoeDirt, Tree, TREE_MATURE_STAGE};

    fn location() -> Location {
        Location::new("Farm", Grid::new(10, 10))
    }

    #[test]
    fn add_object_sets_back_reference_and_light() {
        let mut loc = location();
        assert!(loc.add_object(PlacedObject::new("torch", ObjectKind::Torch, TilePos::new(2, 2))));
        let torch = loc.object_at(TilePos::new(2, 2)).unwrap();
        assert_eq!(torch.location.as_deref(), Some("Farm"));
        assert_eq!(loc.light_sources().count(), 1);

        let removed = loc.remove_object(TilePos::new(2, 2)).unwrap();
        assert!(removed.location.is_none());
        assert_eq!(loc.light_sources().count(), 0);
    }

    #[test]
    fn duplicate_tile_rejected_and_absent_remove_is_noop() {
        let mut loc = location();
        let tile = TilePos::new(1, 1);
        assert!(loc.add_object(PlacedObject::solid("crate", tile)));
        assert!(!loc.add_object(PlacedObject::solid("barrel", tile)));
        assert_eq!(loc.object_at(tile).unwrap().name, "crate");
        assert!(loc.remove_object(TilePos::new(5, 5)).is_none());
    }

    #[test]
    fn locked_edits_apply_on_unlock() {
        let mut loc = location();
        let a = TilePos::new(1, 1);
        let b = TilePos::new(2, 2);
        loc.add_object(PlacedObject::solid("crate", a));
        loc.lock_objects();
        assert!(loc.remove_object(a).is_none());
        assert!(loc.add_object(PlacedObject::solid("barrel", b)));
        assert!(loc.object_at(a).is_some());
        assert!(loc.object_at(b).is_none());
        loc.unlock_objects();
        assert!(loc.object_at(a).is_none());
        assert!(loc.object_at(b).is_some());
    }

    #[test]
    fn locked_insert_then_remove_leaves_tile_empty() {
        let mut loc = location();
        let tile = TilePos::new(4, 1);
        loc.lock_objects();
        assert!(loc.add_object(PlacedObject::solid("crate", tile)));
        assert!(loc.remove_object(tile).is_none());
        assert_eq!(loc.objects().pending_len(), 2);
        loc.unlock_objects();
        assert!(loc.object_at(tile).is_none());
        let kinds: Vec<_> = loc
            .events()
            .iter()
            .filter_map(|e| match e {
                LocationEvent::Added { tile: Some(t), .. } if *t == tile => Some("added"),
                LocationEvent::Removed { tile: Some(t), .. } if *t == tile => Some("removed"),
                _ => None,
            })
            .collect();
        assert_eq!(kinds, vec!["added", "removed"]);
    }

    #[test]
    fn locked_remove_of_empty_tile_is_dropped() {
        let mut loc = location();
        loc.lock_objects();
        assert!(loc.remove_object(TilePos::new(6, 6)).is_none());
        assert_eq!(loc.objects().pending_len(), 0);
        loc.unlock_objects();
    }

    #[test]
    fn deferred_conflict_is_reported() {
        let mut loc = location();
        let tile = TilePos::new(3, 3);
        loc.lock_objects();
        loc.add_object(PlacedObject::solid("one", tile));
        loc.add_object(PlacedObject::solid("two", tile));
        loc.unlock_objects();
        assert_eq!(loc.object_at(tile).unwrap().name, "one");
        assert!(loc
            .events()
            .iter()
            .any(|e| matches!(e, LocationEvent::InsertRejected { label, .. } if label == "two")));
    }

    #[test]
    fn terrain_subscription_follows_needs_tick() {
        let mut loc = location();
        let tile = TilePos::new(4, 4);
        loc.add_terrain_feature(tile, TerrainFeature::Grass(Grass::default()));
        assert!(!loc.is_terrain_active(tile));
        loc.terrain_feature_mut(tile).unwrap().on_collision();
        loc.refresh_terrain_subscription(tile);
        assert!(loc.is_terrain_active(tile));
        assert_eq!(loc.tick_terrain_feature(tile, 5_000), TerrainTick::Idle);
        assert!(!loc.is_terrain_active(tile));
    }

    #[test]
    fn destroyed_differs_from_removed() {
        let mut loc = location();
        let a = TilePos::new(1, 1);
        let b = TilePos::new(2, 1);
        loc.add_terrain_feature(a, TerrainFeature::Tree(Tree::new("oak", TREE_MATURE_STAGE)));
        loc.add_terrain_feature(b, TerrainFeature::Tree(Tree::new("oak", TREE_MATURE_STAGE)));
        loc.remove_terrain_feature(a);
        assert!(loc.debris().is_empty());
        loc.destroy_terrain_feature(b);
        assert_eq!(loc.debris().len(), 1);
        assert_eq!(loc.debris()[0].item, "wood");
        assert!(matches!(
            loc.events().last(),
            Some(LocationEvent::Destroyed { .. })
        ));
    }

    #[test]
    fn building_interior_points_back() {
        let mut loc = location();
        let interior = Location::new("Coop", Grid::new(6, 6));
        let coop = Building::new("coop", TilePos::new(2, 2), (3, 2)).with_interior(interior);
        let id = coop.id;
        loc.add_building(coop);
        let inside = loc.building(id).unwrap().interior().unwrap();
        assert_eq!(inside.parent_building(), Some(id));
        assert_eq!(inside.parent_location(), Some("Farm"));
        assert_eq!(loc.interiors().count(), 1);

        let removed = loc.remove_building(id).unwrap();
        assert!(removed.interior().unwrap().parent_building().is_none());
    }

    #[test]
    fn furniture_removal_is_deferred() {
        let mut loc = location();
        let chair = Furniture::new("chair", FurnitureKind::Chair, TilePos::new(1, 1), (1, 1));
        let id = chair.id;
        loc.add_furniture(chair);
        assert_eq!(loc.seats(), &[TilePos::new(1, 1)]);
        loc.mark_furniture_for_removal(id);
        assert_eq!(loc.furniture().len(), 1);
        assert_eq!(loc.process_furniture_removals(), 1);
        assert!(loc.furniture().is_empty());
        assert!(loc.seats().is_empty());
        assert_eq!(loc.process_furniture_removals(), 0);
    }

    #[test]
    fn frame_guard_runs_once_per_frame() {
        let mut loc = location();
        assert!(loc.begin_current_update(7));
        assert!(!loc.begin_current_update(7));
        assert!(loc.begin_current_update(8));
        assert!(loc.begin_background_update(8));
        assert!(loc.begin_day_update(1));
        assert!(!loc.begin_day_update(1));
    }

    #[test]
    fn explosion_clears_objects_and_grass() {
        let mut loc = location();
        let center = TilePos::new(5, 5);
        loc.add_object(PlacedObject::solid("crate", TilePos::new(5, 6)));
        loc.add_object(PlacedObject::solid("far", TilePos::new(9, 9)));
        loc.add_terrain_feature(TilePos::new(4, 5), TerrainFeature::Grass(Grass::default()));
        loc.add_terrain_feature(TilePos::new(6, 5), TerrainFeature::HoeDirt(HoeDirt::default()));
        loc.explode(center, 1);
        assert!(loc.object_at(TilePos::new(5, 6)).is_none());
        assert!(loc.object_at(TilePos::new(9, 9)).is_some());
        assert!(loc.terrain_feature_at(TilePos::new(4, 5)).is_none());
        assert!(loc.terrain_feature_at(TilePos::new(6, 5)).is_some());
    }

    #[test]
    fn dusk_dims_outdoor_light() {
        let mut loc = location();
        loc.refresh_lighting(1200);
        assert_eq!(loc.ambient_light(), u8::MAX);
        loc.refresh_lighting(2400);
        assert!(loc.ambient_light() < u8::MAX);
        assert_eq!(loc.lighting_refreshes(), 2);
    }

    fn removed_kinds(loc: &Location) -> Vec<OccupantKind> {
        loc.events()
            .iter()
            .filter_map(|e| match e {
                LocationEvent::Removed { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn actor_removal_hooks_drop_overrides_and_report() {
        let mut loc = location();
        let robin = Character::villager("Robin", PixelPos::new(64, 64));
        let ada = Farmer::new("Ada", PixelPos::new(128, 64));
        let daisy = FarmAnimal::new("Daisy", "cow", PixelPos::new(192, 64));
        let (robin_id, ada_id, daisy_id) = (robin.id, ada.id, daisy.id);
        loc.add_character(robin);
        loc.add_farmer(ada);
        loc.add_animal(daisy);
        loc.allow_passable_tiles(robin_id, [TilePos::new(2, 2)]);
        loc.allow_passable_tiles(ada_id, [TilePos::new(3, 3)]);
        loc.drain_events();

        assert_eq!(loc.remove_character(robin_id).map(|c| c.name), Some("Robin".into()));
        assert_eq!(loc.remove_farmer(ada_id).map(|f| f.name), Some("Ada".into()));
        assert_eq!(loc.remove_animal(daisy_id).map(|a| a.name), Some("Daisy".into()));
        assert!(loc.remove_character(robin_id).is_none());
        assert!(loc.remove_animal(OccupantId::new()).is_none());

        assert!(loc.characters().is_empty() && loc.farmers().is_empty() && loc.animals().is_empty());
        assert!(!loc.has_passable_override(robin_id, TilePos::new(2, 2)));
        assert!(!loc.has_passable_override(ada_id, TilePos::new(3, 3)));
        assert_eq!(
            removed_kinds(&loc),
            vec![OccupantKind::Character, OccupantKind::Farmer, OccupantKind::Animal]
        );
    }

    #[test]
    fn bush_and_clump_removal_report_their_tiles() {
        let mut loc = location();
        let bush = LargeTerrainFeature::bush(TilePos::new(1, 1), 2);
        let stump = ResourceClump::new(ClumpKind::Stump, TilePos::new(5, 5));
        let (bush_id, stump_id) = (bush.id, stump.id);
        loc.add_large_terrain_feature(bush);
        loc.add_resource_clump(stump);
        loc.drain_events();

        assert_eq!(loc.remove_large_terrain_feature(bush_id).map(|b| b.tile), Some(TilePos::new(1, 1)));
        assert_eq!(loc.remove_resource_clump(stump_id).map(|c| c.tile), Some(TilePos::new(5, 5)));
        assert!(loc.remove_resource_clump(stump_id).is_none());
        assert!(loc.large_terrain_features().is_empty());
        assert!(loc.debris().is_empty());
        assert_eq!(
            removed_kinds(&loc),
            vec![OccupantKind::LargeTerrainFeature, OccupantKind::ResourceClump]
        );
    }

    #[test]
    fn damaged_clump_breaks_into_debris() {
        let mut loc = location();
        let boulder = ResourceClump::new(ClumpKind::Boulder, TilePos::new(4, 4));
        let id = boulder.id;
        loc.add_resource_clump(boulder);

        assert!(!loc.damage_resource_clump(id, 5));
        assert_eq!(loc.resource_clumps()[0].health, 3);
        assert!(loc.debris().is_empty());
        assert!(loc.damage_resource_clump(id, 5));
        assert!(loc.resource_clumps().is_empty());
        assert_eq!(loc.debris().len(), 1);
        assert_eq!(loc.debris()[0].item, "stone");
        assert!(!loc.damage_resource_clump(id, 5));
        assert!(loc.events().iter().any(|e| matches!(
            e,
            LocationEvent::Destroyed { kind: OccupantKind::ResourceClump, .. }
        )));
    }

    #[test]
    fn passable_overrides_are_per_actor() {
        let mut loc = location();
        let actor = OccupantId::new();
        let other = OccupantId::new();
        loc.allow_passable_tiles(actor, [TilePos::new(1, 1)]);
        assert!(loc.has_passable_override(actor, TilePos::new(1, 1)));
        assert!(!loc.has_passable_override(other, TilePos::new(1, 1)));
        loc.clear_passable_overrides(actor);
        assert!(!loc.has_passable_override(actor, TilePos::new(1, 1)));
    }
}
