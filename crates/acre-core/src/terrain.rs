use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::calendar::Season;
use crate::geometry::{PixelRect, TilePos};
use crate::occupant::OccupantId;

/// Growth stage at which a tree is fully grown.
pub const TREE_MATURE_STAGE: u8 = 5;
/// Fruit a fruit tree can hold at once.
pub const FRUIT_TREE_MAX_FRUIT: u8 = 3;
/// Blades of grass in a full patch.
pub const GRASS_MAX_BLADES: u8 = 4;

/// Fertilizer that keeps soil watered overnight.
pub const RETAINING_SOIL: &str = "retaining_soil";

const SHAKE_MS: u32 = 500;
const FALL_MS: u32 = 1_000;

/// Overnight conditions handed to day updates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayConditions {
    /// Season the night falls in.
    pub season: Season,
    /// Greenhouses and interiors grow anything year-round.
    pub ignores_seasons: bool,
    /// Chance a tree grows a stage tonight.
    pub tree_growth_chance: f64,
}

impl DayConditions {
    /// `true` if something restricted to `seasons` may grow tonight.
    pub fn allows(&self, seasons: &[Season]) -> bool {
        self.ignores_seasons || seasons.is_empty() || seasons.contains(&self.season)
    }
}

/// Result of a per-frame terrain update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainTick {
    /// Nothing left to animate. The feature can leave the active list.
    Idle,
    /// Still animating.
    Active,
    /// The feature finished dying and must be destroyed.
    Destroyed,
}

/// A crop planted in tilled dirt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crop {
    /// Seed item name.
    pub seed: String,
    /// Watered nights grown so far.
    #[serde(default)]
    pub days_grown: u32,
    /// Nights needed to ripen.
    pub days_to_mature: u32,
    /// Seasons the crop survives in. Empty means any.
    #[serde(default)]
    pub seasons: Vec<Season>,
    /// Days to produce again after harvest, for regrowing crops.
    #[serde(default)]
    pub regrow_days: Option<u32>,
    /// Killed by an out-of-season night.
    #[serde(default)]
    pub dead: bool,
}

impl Crop {
    /// A freshly planted crop.
    pub fn new(seed: impl Into<String>, days_to_mature: u32, seasons: Vec<Season>) -> Self {
        Self {
            seed: seed.into(),
            days_grown: 0,
            days_to_mature,
            seasons,
            regrow_days: None,
            dead: false,
        }
    }

    /// Make the crop regrow after harvest.
    pub fn with_regrow(mut self, days: u32) -> Self {
        self.regrow_days = Some(days);
        self
    }

    /// Whether the crop can be harvested.
    pub fn is_ready(&self) -> bool {
        !self.dead && self.days_grown >= self.days_to_mature
    }

    /// Harvest the crop. Returns `true` if it stays planted to regrow.
    pub fn harvest(&mut self) -> bool {
        match self.regrow_days {
            Some(days) => {
                self.days_grown = self.days_to_mature.saturating_sub(days);
                true
            }
            None => false,
        }
    }
}

/// Tilled soil, optionally watered and planted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoeDirt {
    /// Watered today.
    #[serde(default)]
    pub watered: bool,
    /// What is growing, if anything.
    #[serde(default)]
    pub crop: Option<Crop>,
    /// Applied fertilizer item.
    #[serde(default)]
    pub fertilizer: Option<String>,
}

impl HoeDirt {
    /// Dirt already holding a crop.
    pub fn with_crop(crop: Crop) -> Self {
        Self {
            crop: Some(crop),
            ..Self::default()
        }
    }

    /// Whether something is planted.
    pub fn has_crop(&self) -> bool {
        self.crop.is_some()
    }

    /// Plant a seed. Fails if something is already growing.
    pub fn plant(&mut self, crop: Crop) -> bool {
        if self.crop.is_some() {
            return false;
        }
        self.crop = Some(crop);
        true
    }

    /// Grow or kill the crop and dry the soil.
    pub fn day_update(&mut self, conditions: &DayConditions) {
        if let Some(crop) = &mut self.crop {
            if !conditions.allows(&crop.seasons) {
                crop.dead = true;
            } else if self.watered && !crop.dead && crop.days_grown < crop.days_to_mature {
                crop.days_grown += 1;
            }
        }
        if self.fertilizer.as_deref() != Some(RETAINING_SOIL) {
            self.watered = false;
        }
    }
}

/// A patch of grass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grass {
    /// Blades left; cut grass at zero is removed.
    pub blades: u8,
    /// Shake animation timer.
    #[serde(default)]
    pub shake_ms: u32,
}

impl Default for Grass {
    fn default() -> Self {
        Self {
            blades: GRASS_MAX_BLADES,
            shake_ms: 0,
        }
    }
}

/// A wild tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Tree type.
    pub species: String,
    /// Growth stage, capped at maturity.
    #[serde(default)]
    pub growth_stage: u8,
    /// Only the stump is left.
    #[serde(default)]
    pub stump: bool,
    /// Hits left.
    pub health: i32,
    /// Shake animation timer.
    #[serde(default)]
    pub shake_ms: u32,
    /// Falling animation timer, set once a mature tree is felled.
    #[serde(default)]
    pub fall_ms: Option<u32>,
}

impl Tree {
    /// A tree with full health.
    pub fn new(species: impl Into<String>, growth_stage: u8) -> Self {
        Self {
            species: species.into(),
            growth_stage: growth_stage.min(TREE_MATURE_STAGE),
            stump: false,
            health: 10,
            shake_ms: 0,
            fall_ms: None,
        }
    }

    /// Whether the tree is fully grown.
    pub fn is_mature(&self) -> bool {
        self.growth_stage >= TREE_MATURE_STAGE
    }

    /// Deal damage. Mature trees start falling; saplings
    /// and stumps are destroyed outright. Returns `true` if destroyed now.
    pub fn hit(&mut self, damage: i32) -> bool {
        self.health -= damage;
        self.shake_ms = SHAKE_MS;
        if self.health > 0 {
            return false;
        }
        if self.is_mature() && !self.stump {
            self.fall_ms = Some(FALL_MS);
            false
        } else {
            true
        }
    }
}

/// A tree that bears fruit once mature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FruitTree {
    /// Tree type.
    pub species: String,
    /// Nights until it bears fruit.
    pub days_until_mature: u32,
    /// Fruit currently hanging.
    #[serde(default)]
    pub fruit: u8,
    /// Season it fruits in.
    pub fruit_season: Season,
}

/// Walkable floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flooring {
    /// Floor style.
    pub style: String,
}

impl Flooring {
    /// Flooring of a style.
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
        }
    }
}

/// A single-tile terrain feature, keyed by its tile in the owning location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerrainFeature {
    /// Tilled soil.
    HoeDirt(HoeDirt),
    /// Grass.
    Grass(Grass),
    /// Wild tree.
    Tree(Tree),
    /// Fruit tree.
    FruitTree(FruitTree),
    /// Walkable floor.
    Flooring(Flooring),
}

impl TerrainFeature {
    /// Short name used in events and output.
    pub fn label(&self) -> &'static str {
        match self {
            TerrainFeature::HoeDirt(_) => "hoe_dirt",
            TerrainFeature::Grass(_) => "grass",
            TerrainFeature::Tree(_) => "tree",
            TerrainFeature::FruitTree(_) => "fruit_tree",
            TerrainFeature::Flooring(_) => "flooring",
        }
    }

    /// Whether walkers may step onto it.
    pub fn is_passable(&self) -> bool {
        match self {
            TerrainFeature::HoeDirt(_) | TerrainFeature::Grass(_) | TerrainFeature::Flooring(_) => {
                true
            }
            TerrainFeature::Tree(t) => t.growth_stage <= 1 && !t.stump,
            TerrainFeature::FruitTree(_) => false,
        }
    }

    /// Whether this is flooring.
    pub fn is_flooring(&self) -> bool {
        matches!(self, TerrainFeature::Flooring(_))
    }

    /// The dirt, if this is tilled soil.
    pub fn as_hoe_dirt(&self) -> Option<&HoeDirt> {
        match self {
            TerrainFeature::HoeDirt(d) => Some(d),
            _ => None,
        }
    }

    /// The dirt, mutably.
    pub fn as_hoe_dirt_mut(&mut self) -> Option<&mut HoeDirt> {
        match self {
            TerrainFeature::HoeDirt(d) => Some(d),
            _ => None,
        }
    }

    /// `true` while the feature wants per-frame updates.
    pub fn needs_tick(&self) -> bool {
        match self {
            TerrainFeature::Grass(g) => g.shake_ms > 0,
            TerrainFeature::Tree(t) => t.shake_ms > 0 || t.fall_ms.is_some(),
            _ => false,
        }
    }

    /// Advance animation state.
    pub fn tick(&mut self, elapsed_ms: u32) -> TerrainTick {
        match self {
            TerrainFeature::Grass(g) => {
                g.shake_ms = g.shake_ms.saturating_sub(elapsed_ms);
            }
            TerrainFeature::Tree(t) => {
                t.shake_ms = t.shake_ms.saturating_sub(elapsed_ms);
                if let Some(remaining) = t.fall_ms {
                    let remaining = remaining.saturating_sub(elapsed_ms);
                    if remaining == 0 {
                        t.fall_ms = None;
                        return TerrainTick::Destroyed;
                    }
                    t.fall_ms = Some(remaining);
                }
            }
            _ => {}
        }
        if self.needs_tick() {
            TerrainTick::Active
        } else {
            TerrainTick::Idle
        }
    }

    /// React to something moving through the tile. Returns `true` if the
    /// feature now needs per-frame updates.
    pub fn on_collision(&mut self) -> bool {
        match self {
            TerrainFeature::Grass(g) => {
                g.shake_ms = SHAKE_MS;
                true
            }
            _ => false,
        }
    }

    /// Overnight growth and decay. Returns `true` if the feature should be
    /// removed.
    pub fn day_update<R: Rng + ?Sized>(&mut self, conditions: &DayConditions, rng: &mut R) -> bool {
        match self {
            TerrainFeature::HoeDirt(dirt) => {
                dirt.day_update(conditions);
                false
            }
            TerrainFeature::Grass(g) => {
                g.shake_ms = 0;
                if conditions.season == Season::Winter && !conditions.ignores_seasons {
                    g.blades = g.blades.saturating_sub(1);
                } else {
                    g.blades = (g.blades + 1).min(GRASS_MAX_BLADES);
                }
                g.blades == 0
            }
            TerrainFeature::Tree(t) => {
                t.shake_ms = 0;
                let growing_season = conditions.season != Season::Winter || conditions.ignores_seasons;
                if !t.stump
                    && !t.is_mature()
                    && growing_season
                    && rng.random_bool(conditions.tree_growth_chance.clamp(0.0, 1.0))
                {
                    t.growth_stage += 1;
                }
                false
            }
            TerrainFeature::FruitTree(tree) => {
                if tree.days_until_mature > 0 {
                    tree.days_until_mature -= 1;
                } else if conditions.ignores_seasons || conditions.season == tree.fruit_season {
                    tree.fruit = (tree.fruit + 1).min(FRUIT_TREE_MAX_FRUIT);
                } else {
                    tree.fruit = 0;
                }
                false
            }
            TerrainFeature::Flooring(_) => false,
        }
    }

    /// Item dropped when the feature is destroyed rather than merely removed.
    pub fn destroyed_drop(&self) -> Option<&'static str> {
        match self {
            TerrainFeature::Tree(_) | TerrainFeature::FruitTree(_) => Some("wood"),
            TerrainFeature::Grass(_) => Some("fiber"),
            TerrainFeature::HoeDirt(d) if d.crop.as_ref().is_some_and(Crop::is_ready) => {
                Some("produce")
            }
            _ => None,
        }
    }
}

/// A multi-tile bush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeTerrainFeature {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Left tile.
    pub tile: TilePos,
    /// Width in tiles, from one to three.
    pub width_tiles: i32,
    /// Carrying berries.
    #[serde(default)]
    pub berries: bool,
    /// Shake animation timer.
    #[serde(default)]
    pub shake_ms: u32,
}

impl LargeTerrainFeature {
    /// A bush, clamped to one to three tiles wide.
    pub fn bush(tile: TilePos, width_tiles: i32) -> Self {
        Self {
            id: OccupantId::new(),
            tile,
            width_tiles: width_tiles.clamp(1, 3),
            berries: false,
            shake_ms: 0,
        }
    }

    /// Footprint in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::from_tiles(self.tile, self.width_tiles, 1)
    }

    /// Reset shaking and grow berries in spring and fall.
    pub fn day_update(&mut self, conditions: &DayConditions) {
        self.shake_ms = 0;
        self.berries = matches!(conditions.season, Season::Spring | Season::Fall);
    }
}

/// Large immovable debris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClumpKind {
    /// Tree stump.
    Stump,
    /// Fallen log.
    Log,
    /// Boulder.
    Boulder,
    /// Meteorite.
    Meteorite,
}

impl ClumpKind {
    /// Hits a fresh clump takes.
    pub fn base_health(self) -> i32 {
        match self {
            ClumpKind::Stump => 4,
            ClumpKind::Log | ClumpKind::Boulder => 8,
            ClumpKind::Meteorite => 20,
        }
    }

    /// Item dropped when it breaks.
    pub fn yield_item(self) -> &'static str {
        match self {
            ClumpKind::Stump | ClumpKind::Log => "hardwood",
            ClumpKind::Boulder => "stone",
            ClumpKind::Meteorite => "iridium_ore",
        }
    }
}

impl fmt::Display for ClumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ClumpKind::Stump => "stump",
            ClumpKind::Log => "log",
            ClumpKind::Boulder => "boulder",
            ClumpKind::Meteorite => "meteorite",
        };
        f.write_str(s)
    }
}

/// A 2x2 resource clump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceClump {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// What it is.
    pub kind: ClumpKind,
    /// Top-left tile.
    pub tile: TilePos,
    /// Hits left.
    pub health: i32,
}

impl ResourceClump {
    /// Edge length in tiles.
    pub const SIZE: i32 = 2;

    /// A clump at full health.
    pub fn new(kind: ClumpKind, tile: TilePos) -> Self {
        Self {
            id: OccupantId::new(),
            kind,
            tile,
            health: kind.base_health(),
        }
    }

    /// Footprint in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::from_tiles(self.tile, Self::SIZE, Self::SIZE)
    }

    /// Deal damage. Returns `true` once the clump breaks.
    pub fn hit(&mut self, damage: i32) -> bool {
        self.health -= damage;
        self.health <= 0
    }
}
