//! Short-lived and location-owned occupants: critters, debris, projectiles,
//! sprites, lights, fixtures and bridges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{PixelPos, PixelRect, TilePos, TileRect, Velocity};
use crate::occupant::OccupantId;

/// Milliseconds debris lies around before despawning.
pub const DEBRIS_LIFETIME_MS: u32 = 10_000;

/// Ambient wildlife kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CritterKind {
    /// Butterfly.
    Butterfly,
    /// Bird.
    Bird,
    /// Frog.
    Frog,
    /// Rabbit.
    Rabbit,
}

impl fmt::Display for CritterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CritterKind::Butterfly => "butterfly",
            CritterKind::Bird => "bird",
            CritterKind::Frog => "frog",
            CritterKind::Rabbit => "rabbit",
        };
        f.write_str(s)
    }
}

/// Ambient wildlife. Never occupies tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Critter {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Species.
    pub kind: CritterKind,
    /// Top-left in pixels.
    pub position: PixelPos,
    /// Pixels moved per frame.
    #[serde(default)]
    pub velocity: Velocity,
    /// Time left before it leaves.
    pub lifetime_ms: u32,
}

impl Critter {
    /// A critter with a fresh id.
    pub fn new(kind: CritterKind, position: PixelPos, velocity: Velocity, lifetime_ms: u32) -> Self {
        Self {
            id: OccupantId::new(),
            kind,
            position,
            velocity,
            lifetime_ms,
        }
    }

    /// 32x32 box at its position.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::at(self.position, 32, 32)
    }

    /// Move and age. Returns `false` once the critter should be removed.
    pub fn update(&mut self, elapsed_ms: u32, map_bounds: &PixelRect) -> bool {
        self.position = self.position.moved(self.velocity);
        self.lifetime_ms = self.lifetime_ms.saturating_sub(elapsed_ms);
        self.lifetime_ms > 0 && map_bounds.intersects(&self.bounding_box())
    }
}

/// A dropped item waiting to be collected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debris {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Item name.
    pub item: String,
    /// Top-left in pixels.
    pub position: PixelPos,
    /// Slide velocity, halved every frame.
    #[serde(default)]
    pub velocity: Velocity,
    /// Time on the ground.
    #[serde(default)]
    pub age_ms: u32,
}

impl Debris {
    /// Resting debris at a pixel position.
    pub fn new(item: impl Into<String>, position: PixelPos) -> Self {
        Self {
            id: OccupantId::new(),
            item: item.into(),
            position,
            velocity: Velocity::ZERO,
            age_ms: 0,
        }
    }

    /// Debris dropped at the centre of a tile.
    pub fn at_tile(item: impl Into<String>, tile: TilePos) -> Self {
        let origin = PixelPos::of_tile(tile);
        Self::new(item, PixelPos::new(origin.x + 24, origin.y + 24))
    }

    /// 16x16 box at its position.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::at(self.position, 16, 16)
    }

    /// Slide to a stop and age. Returns `false` once expired.
    pub fn update(&mut self, elapsed_ms: u32) -> bool {
        self.position = self.position.moved(self.velocity);
        self.velocity = Velocity::new(self.velocity.dx / 2, self.velocity.dy / 2);
        self.age_ms = self.age_ms.saturating_add(elapsed_ms);
        self.age_ms < DEBRIS_LIFETIME_MS
    }
}

/// A moving projectile. Never occupies tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projectile {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Top-left in pixels.
    pub position: PixelPos,
    /// Pixels moved per frame.
    pub velocity: Velocity,
    /// Damage dealt on hit.
    pub damage: i32,
    /// Pixels flown so far.
    #[serde(default)]
    pub travelled: i32,
    /// Range in pixels.
    pub max_distance: i32,
    /// Flies over ground occupants.
    #[serde(default)]
    pub glider: bool,
}

impl Projectile {
    /// A ground projectile.
    pub fn new(position: PixelPos, velocity: Velocity, damage: i32, max_distance: i32) -> Self {
        Self {
            id: OccupantId::new(),
            position,
            velocity,
            damage,
            travelled: 0,
            max_distance,
            glider: false,
        }
    }

    /// 16x16 box at its position.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::at(self.position, 16, 16)
    }

    /// The box one step ahead.
    pub fn next_box(&self) -> PixelRect {
        self.bounding_box().translated(self.velocity)
    }

    /// Take one step. Returns `false` once out of range.
    pub fn advance(&mut self) -> bool {
        self.position = self.position.moved(self.velocity);
        self.travelled += self.velocity.dx.abs() + self.velocity.dy.abs();
        self.travelled < self.max_distance
    }
}

/// A purely visual effect with a time limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporarySprite {
    /// Effect name.
    pub name: String,
    /// Where it is drawn.
    pub position: PixelPos,
    /// Time left on screen.
    pub remaining_ms: u32,
}

impl TemporarySprite {
    /// A sprite shown for `remaining_ms`.
    pub fn new(name: impl Into<String>, position: PixelPos, remaining_ms: u32) -> Self {
        Self {
            name: name.into(),
            position,
            remaining_ms,
        }
    }

    /// Returns `false` once expired.
    pub fn update(&mut self, elapsed_ms: u32) -> bool {
        self.remaining_ms = self.remaining_ms.saturating_sub(elapsed_ms);
        self.remaining_ms > 0
    }
}

/// A keyed light registered with the location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightSource {
    /// Unique key; re-adding a key replaces the light.
    pub key: String,
    /// Centre tile.
    pub tile: TilePos,
    /// Radius in tiles.
    pub radius: u32,
}

impl LightSource {
    /// A light at a tile.
    pub fn new(key: impl Into<String>, tile: TilePos, radius: u32) -> Self {
        Self {
            key: key.into(),
            tile,
            radius,
        }
    }
}

/// Bubbling fishing spot. Cleared every night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplashPoint {
    /// Spot tile.
    pub tile: TilePos,
    /// Time left before it fades.
    pub remaining_ms: u32,
}

/// A fixed, location-specific obstacle such as a fountain or a statue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Fixture name.
    pub name: String,
    /// Top-left tile.
    pub tile: TilePos,
    /// Footprint in tiles as `(width, height)`.
    pub size: (i32, i32),
    /// Walkers may pass through it.
    #[serde(default)]
    pub passable: bool,
}

impl Fixture {
    /// A solid fixture.
    pub fn new(name: impl Into<String>, tile: TilePos, size: (i32, i32)) -> Self {
        Self {
            id: OccupantId::new(),
            name: name.into(),
            tile,
            size,
            passable: false,
        }
    }

    /// Footprint in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::from_tiles(self.tile, self.size.0, self.size.1)
    }
}

/// A bridge span. While intact, tiles under it are walkable whatever the
/// ground says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    /// Bridge name.
    pub name: String,
    /// Tiles the span covers.
    pub span: TileRect,
    /// Broken bridges block like the ground below.
    #[serde(default = "intact")]
    pub intact: bool,
}

fn intact() -> bool {
    true
}

impl Bridge {
    /// An intact bridge.
    pub fn new(name: impl Into<String>, span: TileRect) -> Self {
        Self {
            name: name.into(),
            span,
            intact: true,
        }
    }

    /// `true` if the rectangle lies entirely on an intact span.
    pub fn carries(&self, rect: &PixelRect) -> bool {
        self.intact && self.span.to_pixels().contains_rect(rect)
    }
}

/// State owned by the scripted-event collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventState {
    /// A festival lets actors leave the map edge.
    #[serde(default)]
    pub festival_active: bool,
}
