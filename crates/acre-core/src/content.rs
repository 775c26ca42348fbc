use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::geometry::TilePos;
use crate::grid::{Grid, Layer, Tile, TileRef};
use crate::properties::PropertyMap;
use crate::tilesheet::Tilesheet;

/// Resolves map assets by name.
///
/// Map loading is an outside concern; locations only ask for a fresh grid when
/// their asset changes or a patch names one.
pub trait ContentSource {
    /// Load a fresh copy of the named map, or `None` if it does not exist.
    fn load_map(&self, asset: &str) -> Option<Grid>;
}

/// Content source backed by grids held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContent {
    maps: HashMap<String, Grid>,
}

impl InMemoryContent {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a map.
    pub fn insert(&mut self, asset: impl Into<String>, grid: Grid) {
        self.maps.insert(asset.into(), grid);
    }

    /// Builder form of [`InMemoryContent::insert`].
    pub fn with_map(mut self, asset: impl Into<String>, grid: Grid) -> Self {
        self.insert(asset, grid);
        self
    }

    /// Number of registered maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Whether no maps are registered.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl ContentSource for InMemoryContent {
    fn load_map(&self, asset: &str) -> Option<Grid> {
        self.maps.get(asset).cloned()
    }
}

/// One authored tile in a [`MapDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentTile {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Tilesheet id.
    pub sheet: String,
    /// Index on the sheet.
    pub index: u32,
    /// Extra frame indices on the same sheet. Non-empty means animated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<u32>,
    /// Frame interval for animated tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u32>,
    /// Tile properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: PropertyMap,
}

/// One authored layer in a [`MapDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLayer {
    /// Layer id, e.g. `Back`.
    pub id: String,
    /// Tile stamped on every cell before `tiles` are applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<TileRef>,
    /// Sparse tiles stamped after the fill.
    #[serde(default)]
    pub tiles: Vec<DocumentTile>,
}

/// JSON form of a map: extent, tilesheets and sparse layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    /// Width in tiles.
    pub width: u32,
    /// Height in tiles.
    pub height: u32,
    /// Declared tilesheets.
    #[serde(default)]
    pub tilesheets: Vec<Tilesheet>,
    /// Layers in draw order.
    #[serde(default)]
    pub layers: Vec<DocumentLayer>,
}

const DEFAULT_FRAME_INTERVAL_MS: u32 = 250;

impl MapDocument {
    /// Parse a document from JSON.
    pub fn from_json_str(json: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a grid. Tiles that reference unknown sheets or fall outside the
    /// extent are skipped with a warning.
    pub fn into_grid(&self) -> CoreResult<Grid> {
        let mut grid = Grid::new(self.width, self.height);
        for sheet in &self.tilesheets {
            grid.sheets.add(sheet.clone())?;
        }
        for doc_layer in &self.layers {
            let mut layer = Layer::new(&doc_layer.id, self.width, self.height);
            if let Some(fill) = &doc_layer.fill {
                if grid.sheets.contains(&fill.sheet) {
                    for pos in grid.positions() {
                        layer.set(pos, Some(Tile::new(&fill.sheet, fill.index)));
                    }
                } else {
                    tracing::warn!(layer = %doc_layer.id, sheet = %fill.sheet, "fill_references_unknown_sheet");
                }
            }
            for doc_tile in &doc_layer.tiles {
                if !grid.sheets.contains(&doc_tile.sheet) {
                    tracing::warn!(
                        layer = %doc_layer.id,
                        sheet = %doc_tile.sheet,
                        x = doc_tile.x,
                        y = doc_tile.y,
                        "tile_references_unknown_sheet"
                    );
                    continue;
                }
                let pos = TilePos::new(doc_tile.x, doc_tile.y);
                if !layer.set(pos, Some(doc_tile.to_tile())) {
                    tracing::warn!(layer = %doc_layer.id, %pos, "tile_outside_map");
                }
            }
            grid.add_layer(layer);
        }
        Ok(grid)
    }

    /// Describe a grid as a document. Only set cells are listed.
    pub fn from_grid(grid: &Grid) -> Self {
        let layers = grid
            .layers()
            .iter()
            .map(|layer| DocumentLayer {
                id: layer.id.clone(),
                fill: None,
                tiles: layer
                    .iter()
                    .filter_map(|(pos, tile)| DocumentTile::from_tile(pos, tile))
                    .collect(),
            })
            .collect();
        Self {
            width: grid.width(),
            height: grid.height(),
            tilesheets: grid.sheets.iter().cloned().collect(),
            layers,
        }
    }
}

impl DocumentTile {
    fn to_tile(&self) -> Tile {
        let mut tile = if self.frames.is_empty() {
            Tile::new(&self.sheet, self.index)
        } else {
            let frames = std::iter::once(self.index)
                .chain(self.frames.iter().copied())
                .map(|i| TileRef::new(&self.sheet, i))
                .collect();
            Tile::animated(frames, self.interval_ms.unwrap_or(DEFAULT_FRAME_INTERVAL_MS))
        };
        tile.properties = self.properties.clone();
        tile
    }

    fn from_tile(pos: TilePos, tile: &Tile) -> Option<Self> {
        let primary = tile.graphic.primary()?;
        let (frames, interval_ms) = match &tile.graphic {
            crate::grid::TileGraphic::Static(_) => (Vec::new(), None),
            crate::grid::TileGraphic::Animated { frames, interval_ms } => (
                frames.iter().skip(1).map(|r| r.index).collect(),
                Some(*interval_ms),
            ),
        };
        Some(Self {
            x: pos.x,
            y: pos.y,
            sheet: primary.sheet.clone(),
            index: primary.index,
            frames,
            interval_ms,
            properties: tile.properties.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::layer;

    const DOC: &str = r#"{
        "width": 3,
        "height": 2,
        "tilesheets": [
            {"id": "out", "image_source": "Maps/outdoors", "columns": 4, "rows": 4,
             "tile_properties": {"1": {"Diggable": "T"}}}
        ],
        "layers": [
            {"id": "Back", "fill": {"sheet": "out", "index": 1},
             "tiles": [
                {"x": 2, "y": 1, "sheet": "out", "index": 0, "properties": {"Water": "T"}},
                {"x": 0, "y": 0, "sheet": "ghost", "index": 0},
                {"x": 9, "y": 9, "sheet": "out", "index": 0}
             ]},
            {"id": "Buildings", "tiles": [
                {"x": 1, "y": 0, "sheet": "out", "index": 5, "frames": [6, 7]}
            ]}
        ]
    }"#;

    #[test]
    fn document_builds_grid_and_skips_bad_tiles() {
        let grid = MapDocument::from_json_str(DOC).unwrap().into_grid().unwrap();
        assert_eq!((grid.width(), grid.height()), (3, 2));
        assert!(grid.is_diggable(TilePos::new(0, 0)));
        assert!(grid.is_water(TilePos::new(2, 1)));
        assert!(!grid.is_diggable(TilePos::new(2, 1)));
        let animated = grid.tile(layer::BUILDINGS, TilePos::new(1, 0)).unwrap();
        assert_eq!(animated.graphic.refs().len(), 3);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(MapDocument::from_json_str("{ nope").is_err());
    }

    #[test]
    fn grid_round_trips_through_document() {
        let grid = MapDocument::from_json_str(DOC).unwrap().into_grid().unwrap();
        let again = MapDocument::from_grid(&grid).into_grid().unwrap();
        assert_eq!(grid.indices(layer::BACK), again.indices(layer::BACK));
        assert_eq!(grid.indices(layer::BUILDINGS), again.indices(layer::BUILDINGS));
    }

    #[test]
    fn in_memory_content_returns_copies() {
        let content = InMemoryContent::new().with_map("Maps/Farm", Grid::new(2, 2));
        assert!(content.load_map("Maps/Farm").is_some());
        assert!(content.load_map("Maps/Town").is_none());
    }
}
