pub mod inspect;
pub mod patch;
pub mod simulate;

use std::fs;
use std::path::Path;

use acre_core::{Location, LocationSnapshot, MapDocument};
use serde::{Deserialize, Serialize};

/// On-disk form of a location: its map plus the saved entity state.
#[derive(Debug, Serialize, Deserialize)]
pub struct LocationDocument {
    pub map: MapDocument,
    #[serde(flatten)]
    pub snapshot: LocationSnapshot,
}

/// Read a location file and rebuild the location it describes.
fn load_location(path: &Path) -> Result<Location, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let mut doc: LocationDocument = serde_json::from_str(&text)
        .map_err(|e| format!("{}: invalid location file: {e}", path.display()))?;
    let grid = doc
        .map
        .into_grid()
        .map_err(|e| format!("{}: {e}", path.display()))?;
    if doc.snapshot.name.is_empty() {
        doc.snapshot.name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("location")
            .to_string();
    }
    Ok(doc.snapshot.restore(grid))
}

/// Serialize a location back into its file form.
fn location_json(location: &Location) -> Result<String, String> {
    let doc = LocationDocument {
        map: MapDocument::from_grid(location.grid()),
        snapshot: LocationSnapshot::capture(location),
    };
    serde_json::to_string_pretty(&doc).map_err(|e| format!("cannot serialize location: {e}"))
}

fn load_map(path: &Path) -> Result<acre_core::Grid, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    MapDocument::from_json_str(&text)
        .and_then(|doc| doc.into_grid())
        .map_err(|e| format!("{}: {e}", path.display()))
}
