use serde::{Deserialize, Serialize};

use crate::geometry::{PixelPos, PixelRect, Velocity};
use crate::occupant::OccupantId;

/// Frames a villager stands still after a farmer walks into them.
pub const BUMP_HALT_FRAMES: u32 = 30;

const ACTOR_WIDTH: i32 = 48;
const ACTOR_HEIGHT: i32 = 32;
const ANIMAL_FRAME_CYCLE_MS: u32 = 800;
const HUNGER_INTERVAL_MS: u32 = 60_000;

fn actor_size() -> (i32, i32) {
    (ACTOR_WIDTH, ACTOR_HEIGHT)
}

/// What sort of non-player character this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CharacterKind {
    /// A townsperson who halts when bumped.
    Villager,
    /// A hostile creature.
    Monster {
        /// Flies over ground occupants.
        #[serde(default)]
        flying: bool,
    },
    /// A rideable horse. Keeps moving while the clock is paused.
    Mount,
    /// A child; walks like a villager.
    Child,
}

/// A free-roaming non-player character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Display name.
    pub name: String,
    /// Role.
    pub kind: CharacterKind,
    /// Top-left of the collision box.
    pub position: PixelPos,
    /// Collision box size in pixels.
    #[serde(default = "actor_size")]
    pub size: (i32, i32),
    /// Pixels moved per frame.
    #[serde(default)]
    pub velocity: Velocity,
    /// Frames left standing still after a bump.
    #[serde(default)]
    pub halt_frames: u32,
}

impl Character {
    /// A character with the default collision box.
    pub fn new(name: impl Into<String>, kind: CharacterKind, position: PixelPos) -> Self {
        Self {
            id: OccupantId::new(),
            name: name.into(),
            kind,
            position,
            size: actor_size(),
            velocity: Velocity::ZERO,
            halt_frames: 0,
        }
    }

    /// A villager.
    pub fn villager(name: impl Into<String>, position: PixelPos) -> Self {
        Self::new(name, CharacterKind::Villager, position)
    }

    /// Set the per-frame velocity.
    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }

    /// Collision box in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::at(self.position, self.size.0, self.size.1)
    }

    /// Whether this is a monster of any kind.
    pub fn is_monster(&self) -> bool {
        matches!(self.kind, CharacterKind::Monster { .. })
    }

    /// Whether this is a villager or child.
    pub fn is_villager(&self) -> bool {
        matches!(self.kind, CharacterKind::Villager | CharacterKind::Child)
    }

    /// Whether this is a mount.
    pub fn is_mount(&self) -> bool {
        self.kind == CharacterKind::Mount
    }

    /// Flying monsters skip ground occupants entirely.
    pub fn is_glider(&self) -> bool {
        matches!(self.kind, CharacterKind::Monster { flying: true })
    }

    /// A farmer walked into this character.
    pub fn on_bumped(&mut self) {
        if self.is_villager() {
            self.halt_frames = BUMP_HALT_FRAMES;
        }
    }

    /// Count down a bump halt. Returns `true` while still halted.
    pub fn tick_halt(&mut self) -> bool {
        if self.halt_frames == 0 {
            return false;
        }
        self.halt_frames -= 1;
        true
    }
}

/// A player-controlled farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farmer {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Display name.
    pub name: String,
    /// Top-left of the collision box.
    pub position: PixelPos,
    /// Collision box size in pixels.
    #[serde(default = "actor_size")]
    pub size: (i32, i32),
    /// Floating on a raft, so water is walkable.
    #[serde(default)]
    pub on_raft: bool,
}

impl Farmer {
    /// A farmer with the default collision box.
    pub fn new(name: impl Into<String>, position: PixelPos) -> Self {
        Self {
            id: OccupantId::new(),
            name: name.into(),
            position,
            size: actor_size(),
            on_raft: false,
        }
    }

    /// Collision box in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::at(self.position, self.size.0, self.size.1)
    }
}

/// A farm animal that wanders its location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FarmAnimal {
    /// Stable identity.
    #[serde(default)]
    pub id: OccupantId,
    /// Display name.
    pub name: String,
    /// Animal type, e.g. `chicken`.
    pub species: String,
    /// Top-left of the collision box.
    pub position: PixelPos,
    /// Collision box size in pixels.
    #[serde(default = "actor_size")]
    pub size: (i32, i32),
    /// Pixels moved per frame.
    #[serde(default)]
    pub velocity: Velocity,
    /// Building the animal sleeps in.
    #[serde(default)]
    pub home: Option<OccupantId>,
    /// Drops over time; refilled overnight.
    #[serde(default = "full")]
    pub fullness: u8,
    /// Time toward the next fullness drop.
    #[serde(default)]
    pub hunger_ms: u32,
    /// Walk animation timer.
    #[serde(default)]
    pub frame_ms: u32,
}

fn full() -> u8 {
    u8::MAX
}

impl FarmAnimal {
    /// An animal at full fullness.
    pub fn new(name: impl Into<String>, species: impl Into<String>, position: PixelPos) -> Self {
        Self {
            id: OccupantId::new(),
            name: name.into(),
            species: species.into(),
            position,
            size: actor_size(),
            velocity: Velocity::ZERO,
            home: None,
            fullness: full(),
            hunger_ms: 0,
            frame_ms: 0,
        }
    }

    /// Set the per-frame velocity.
    pub fn with_velocity(mut self, velocity: Velocity) -> Self {
        self.velocity = velocity;
        self
    }

    /// Collision box in pixels.
    pub fn bounding_box(&self) -> PixelRect {
        PixelRect::at(self.position, self.size.0, self.size.1)
    }

    /// Hunger and other timers that run regardless of who is watching.
    pub fn update_when_not_current(&mut self, elapsed_ms: u32) {
        self.hunger_ms += elapsed_ms;
        while self.hunger_ms >= HUNGER_INTERVAL_MS {
            self.hunger_ms -= HUNGER_INTERVAL_MS;
            self.fullness = self.fullness.saturating_sub(1);
        }
    }

    /// Full update while in the viewer's location: timers plus animation.
    pub fn update_when_current(&mut self, elapsed_ms: u32) {
        self.update_when_not_current(elapsed_ms);
        if !self.velocity.is_zero() {
            self.frame_ms = (self.frame_ms + elapsed_ms) % ANIMAL_FRAME_CYCLE_MS;
        }
    }

    /// Refill fullness and reset timers.
    pub fn day_update(&mut self) {
        self.fullness = full();
        self.hunger_ms = 0;
        self.frame_ms = 0;
    }
}
