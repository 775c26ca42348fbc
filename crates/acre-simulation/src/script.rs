use serde::{Deserialize, Serialize};

use acre_core::object::PlacedObject;
use acre_core::script::{ScriptedSequence, StepOutcome};
use acre_core::{Location, PixelPos, TilePos};

use crate::error::SimResult;

/// One instruction of a [`CommandScript`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ScriptCommand {
    /// Hold the script for a number of frames.
    Wait {
        /// Frames to hold.
        frames: u32,
    },
    /// Toggle the festival flag.
    SetFestival {
        /// New flag value.
        active: bool,
    },
    /// Let a character walk on otherwise blocked tiles.
    AllowTiles {
        /// Character name.
        character: String,
        /// Tiles to open up.
        tiles: Vec<TilePos>,
    },
    /// Drop a character's allowed tiles.
    ClearTiles {
        /// Character name.
        character: String,
    },
    /// Teleport a character, then yield the frame.
    MoveCharacter {
        /// Character name.
        character: String,
        /// Destination in pixels.
        to: PixelPos,
    },
    /// Add an object through the normal add path.
    PlaceObject {
        /// Object to add.
        object: PlacedObject,
    },
    /// Remove whatever object sits on a tile.
    RemoveObject {
        /// Tile to clear.
        tile: TilePos,
    },
    /// End the script.
    Finish,
}

/// A scripted sequence built from a list of commands.
///
/// Commands run back to back within a frame until one yields. Running off
/// the end of the list finishes the script.
#[derive(Debug, Clone)]
pub struct CommandScript {
    name: String,
    commands: Vec<ScriptCommand>,
    cursor: usize,
    waited: u32,
}

impl CommandScript {
    /// Script starting at its first command.
    pub fn new(name: impl Into<String>, commands: Vec<ScriptCommand>) -> Self {
        Self {
            name: name.into(),
            commands,
            cursor: 0,
            waited: 0,
        }
    }

    /// Parse a command list from JSON.
    pub fn from_json_str(name: impl Into<String>, json: &str) -> SimResult<Self> {
        let commands: Vec<ScriptCommand> = serde_json::from_str(json)?;
        Ok(Self::new(name, commands))
    }

    /// The command list.
    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    fn advance(&mut self) -> StepOutcome {
        self.cursor += 1;
        self.waited = 0;
        StepOutcome::Continue
    }
}

impl ScriptedSequence for CommandScript {
    fn name(&self) -> &str {
        &self.name
    }

    fn step(&mut self, location: &mut Location) -> StepOutcome {
        let Some(command) = self.commands.get(self.cursor).cloned() else {
            return StepOutcome::Finished;
        };
        match command {
            ScriptCommand::Wait { frames } => {
                if self.waited < frames {
                    self.waited += 1;
                    return StepOutcome::Yield;
                }
                self.advance()
            }
            ScriptCommand::SetFestival { active } => {
                location.event_state.festival_active = active;
                self.advance()
            }
            ScriptCommand::AllowTiles { character, tiles } => {
                match character_id(location, &character) {
                    Some(id) => location.allow_passable_tiles(id, tiles),
                    None => tracing::warn!(script = %self.name, %character, "unknown_character"),
                }
                self.advance()
            }
            ScriptCommand::ClearTiles { character } => {
                if let Some(id) = character_id(location, &character) {
                    location.clear_passable_overrides(id);
                }
                self.advance()
            }
            ScriptCommand::MoveCharacter { character, to } => {
                match location.characters_mut().iter_mut().find(|c| c.name == character) {
                    Some(actor) => actor.position = to,
                    None => tracing::warn!(script = %self.name, %character, "unknown_character"),
                }
                self.cursor += 1;
                StepOutcome::Yield
            }
            ScriptCommand::PlaceObject { object } => {
                let tile = object.tile;
                if !location.add_object(object) {
                    tracing::debug!(script = %self.name, %tile, "object_tile_taken");
                }
                self.advance()
            }
            ScriptCommand::RemoveObject { tile } => {
                location.remove_object(tile);
                self.advance()
            }
            ScriptCommand::Finish => {
                self.cursor = self.commands.len();
                StepOutcome::Finished
            }
        }
    }

    fn cursor(&self) -> usize {
        self.cursor
    }
}

fn character_id(location: &Location, name: &str) -> Option<acre_core::OccupantId> {
    location
        .characters()
        .iter()
        .find(|c| c.name == name)
        .map(|c| c.id)
}
