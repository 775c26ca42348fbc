use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::TilePos;
use crate::occupant::OccupantKind;

/// Something a location reports about itself.
///
/// Lifecycle hooks push these; the simulation drains them into its log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LocationEvent {
    /// An occupant joined one of the collections.
    Added {
        /// Collection the occupant joined.
        kind: OccupantKind,
        /// Display name of the occupant.
        label: String,
        /// Key tile for point-keyed and multi-tile occupants.
        tile: Option<TilePos>,
    },
    /// An occupant left its collection through the removal hook.
    Removed {
        /// Collection the occupant left.
        kind: OccupantKind,
        /// Display name of the occupant.
        label: String,
        /// Key tile for point-keyed and multi-tile occupants.
        tile: Option<TilePos>,
    },
    /// Destroyed rather than merely removed: drops were spawned.
    Destroyed {
        /// Collection the occupant left.
        kind: OccupantKind,
        /// Display name of the occupant.
        label: String,
        /// Where the drops landed.
        tile: Option<TilePos>,
    },
    /// A deferred insert could not be replayed because the tile was taken.
    InsertRejected {
        /// The contested tile.
        tile: TilePos,
        /// Display name of the object that was dropped.
        label: String,
    },
    /// A building finished construction overnight.
    BuildingConstructed {
        /// Building type.
        kind: String,
    },
    /// A building finished an upgrade overnight.
    BuildingUpgraded {
        /// Building type.
        kind: String,
        /// Upgrade level reached.
        level: u32,
    },
    /// A keyed map patch was written into the grid.
    PatchApplied {
        /// The patch key.
        key: String,
    },
    /// The grid was replaced from the content source.
    MapReloaded {
        /// Map asset the grid was loaded from.
        asset: String,
    },
    /// An `Action` tile property was dispatched to a handler.
    ActionPerformed {
        /// The action verb.
        verb: String,
        /// Tile carrying the property.
        tile: TilePos,
    },
    /// A bomb went off.
    Explosion {
        /// Center of the blast.
        tile: TilePos,
        /// Blast radius in tiles.
        radius: i32,
    },
    /// A ready crop was harvested.
    Harvested {
        /// Tile of the hoe dirt.
        tile: TilePos,
        /// Seed name of the crop.
        crop: String,
    },
    /// A scripted sequence ran to completion and was dropped.
    ScriptFinished {
        /// Name of the sequence.
        name: String,
    },
}

fn at(tile: Option<TilePos>) -> String {
    tile.map(|t| format!(" at {t}")).unwrap_or_default()
}

impl fmt::Display for LocationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationEvent::Added { kind, label, tile } => {
                write!(f, "{kind} '{label}' added{}", at(*tile))
            }
            LocationEvent::Removed { kind, label, tile } => {
                write!(f, "{kind} '{label}' removed{}", at(*tile))
            }
            LocationEvent::Destroyed { kind, label, tile } => {
                write!(f, "{kind} '{label}' destroyed{}", at(*tile))
            }
            LocationEvent::InsertRejected { tile, label } => {
                write!(f, "'{label}' could not be placed at {tile}: tile taken")
            }
            LocationEvent::BuildingConstructed { kind } => write!(f, "{kind} construction finished"),
            LocationEvent::BuildingUpgraded { kind, level } => {
                write!(f, "{kind} upgraded to level {level}")
            }
            LocationEvent::PatchApplied { key } => write!(f, "map patch '{key}' applied"),
            LocationEvent::MapReloaded { asset } => write!(f, "map reloaded from '{asset}'"),
            LocationEvent::ActionPerformed { verb, tile } => {
                write!(f, "action '{verb}' performed at {tile}")
            }
            LocationEvent::Explosion { tile, radius } => {
                write!(f, "explosion at {tile} (radius {radius})")
            }
            LocationEvent::Harvested { tile, crop } => write!(f, "{crop} harvested at {tile}"),
            LocationEvent::ScriptFinished { name } => write!(f, "script '{name}' finished"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_readable() {
        let e = LocationEvent::Removed {
            kind: OccupantKind::PointObject,
            label: "stone".into(),
            tile: Some(TilePos::new(3, 4)),
        };
        assert_eq!(e.to_string(), "object 'stone' removed at (3, 4)");
        let e = LocationEvent::Added {
            kind: OccupantKind::Character,
            label: "Robin".into(),
            tile: None,
        };
        assert_eq!(e.to_string(), "character 'Robin' added");
    }
}
