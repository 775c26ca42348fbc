use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geometry::{PixelRect, TILE_SIZE, TilePos};
use crate::properties::{PropertyMap, layer, name, parse_flag};
use crate::tilesheet::TilesheetRegistry;

/// A reference into a tilesheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    /// Tilesheet id.
    pub sheet: String,
    /// Index within the sheet.
    pub index: u32,
}

impl TileRef {
    /// Reference to `index` on `sheet`.
    pub fn new(sheet: impl Into<String>, index: u32) -> Self {
        Self {
            sheet: sheet.into(),
            index,
        }
    }
}

/// What a tile draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TileGraphic {
    /// A single index.
    Static(TileRef),
    /// Frames cycled every `interval_ms`.
    Animated {
        /// Frames in display order. Never empty for authored content.
        frames: Vec<TileRef>,
        /// Milliseconds each frame is shown.
        interval_ms: u32,
    },
}

impl TileGraphic {
    /// The frame used for property lookups and static snapshots.
    pub fn primary(&self) -> Option<&TileRef> {
        match self {
            TileGraphic::Static(r) => Some(r),
            TileGraphic::Animated { frames, .. } => frames.first(),
        }
    }

    /// Every tilesheet reference the graphic uses.
    pub fn refs(&self) -> Vec<&TileRef> {
        match self {
            TileGraphic::Static(r) => vec![r],
            TileGraphic::Animated { frames, .. } => frames.iter().collect(),
        }
    }
}

/// One placed tile. Replaced wholesale on edit, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// What the tile draws.
    pub graphic: TileGraphic,
    /// Per-tile overrides, checked before the sheet's per-index table.
    #[serde(default, skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap,
}

impl Tile {
    /// A static tile with no overrides.
    pub fn new(sheet: impl Into<String>, index: u32) -> Self {
        Self {
            graphic: TileGraphic::Static(TileRef::new(sheet, index)),
            properties: PropertyMap::new(),
        }
    }

    /// An animated tile with no overrides.
    pub fn animated(frames: Vec<TileRef>, interval_ms: u32) -> Self {
        Self {
            graphic: TileGraphic::Animated { frames, interval_ms },
            properties: PropertyMap::new(),
        }
    }

    /// Builder: add a per-tile property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Index of the primary frame.
    pub fn index(&self) -> Option<u32> {
        self.graphic.primary().map(|r| r.index)
    }
}

/// A named dense 2D plane of optional tiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer name.
    pub id: String,
    width: u32,
    height: u32,
    tiles: Vec<Option<Tile>>,
}

impl Layer {
    /// An empty layer.
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            tiles: vec![None; (width as usize) * (height as usize)],
        }
    }

    /// Build a layer from row-major tiles.
    pub fn from_tiles(
        id: impl Into<String>,
        width: u32,
        height: u32,
        tiles: Vec<Option<Tile>>,
    ) -> CoreResult<Self> {
        let id = id.into();
        let expected = (width as usize) * (height as usize);
        if tiles.len() != expected {
            return Err(CoreError::TileCountMismatch {
                layer: id,
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            id,
            width,
            height,
            tiles,
        })
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    fn offset(&self, pos: TilePos) -> Option<usize> {
        if pos.x < 0 || pos.y < 0 {
            return None;
        }
        let (x, y) = (pos.x as u32, pos.y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize) * (self.width as usize) + x as usize)
    }

    /// Tile at a position; out of bounds is "no tile".
    pub fn get(&self, pos: TilePos) -> Option<&Tile> {
        self.offset(pos).and_then(|i| self.tiles[i].as_ref())
    }

    /// Replace the tile at a position. Returns `false` when out of bounds.
    pub fn set(&mut self, pos: TilePos, tile: Option<Tile>) -> bool {
        match self.offset(pos) {
            Some(i) => {
                self.tiles[i] = tile;
                true
            }
            None => false,
        }
    }

    /// Grow or shrink to new dimensions, keeping overlapping content.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        let mut tiles = vec![None; (width as usize) * (height as usize)];
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                let old = (y as usize) * (self.width as usize) + x as usize;
                let new = (y as usize) * (width as usize) + x as usize;
                tiles[new] = self.tiles[old].take();
            }
        }
        self.tiles = tiles;
        self.width = width;
        self.height = height;
    }

    /// Positions and tiles that are set, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, &Tile)> {
        let width = self.width.max(1) as usize;
        self.tiles.iter().enumerate().filter_map(move |(i, t)| {
            t.as_ref()
                .map(|t| (TilePos::new((i % width) as i32, (i / width) as i32), t))
        })
    }

    /// Number of non-empty cells.
    pub fn filled(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }
}

/// The tile map of one location: ordered layers sharing one coordinate space
/// plus the tilesheets they reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    layers: Vec<Layer>,
    /// Tilesheets referenced by the layers.
    pub sheets: TilesheetRegistry,
    width: u32,
    height: u32,
}

impl Grid {
    /// A grid with the standard empty layers.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            layers: layer::STANDARD
                .iter()
                .map(|id| Layer::new(*id, width, height))
                .collect(),
            sheets: TilesheetRegistry::new(),
            width,
            height,
        }
    }

    /// A grid with no layers at all.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            layers: Vec::new(),
            sheets: TilesheetRegistry::new(),
            width,
            height,
        }
    }

    /// Width in tiles.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in tiles.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Map extent in pixels.
    pub fn pixel_bounds(&self) -> PixelRect {
        PixelRect::new(
            0,
            0,
            self.width as i32 * TILE_SIZE,
            self.height as i32 * TILE_SIZE,
        )
    }

    /// Layers in draw order.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layer by id.
    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.id == id)
    }

    /// Mutable layer by id.
    pub fn layer_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    /// Append a layer, or replace the one with the same id, then resize every
    /// layer to the largest extent.
    pub fn add_layer(&mut self, layer: Layer) {
        self.width = self.width.max(layer.width());
        self.height = self.height.max(layer.height());
        match self.layers.iter_mut().find(|l| l.id == layer.id) {
            Some(existing) => *existing = layer,
            None => self.layers.push(layer),
        }
        self.normalize();
    }

    /// Create an empty layer if none with this id exists.
    pub fn ensure_layer(&mut self, id: &str) {
        if self.layer(id).is_none() {
            self.layers
                .push(Layer::new(id, self.width, self.height));
        }
    }

    /// Grow the shared extent. Never shrinks.
    pub fn grow(&mut self, width: u32, height: u32) {
        self.width = self.width.max(width);
        self.height = self.height.max(height);
        self.normalize();
    }

    fn normalize(&mut self) {
        let (w, h) = (self.width, self.height);
        for layer in &mut self.layers {
            layer.resize(w, h);
        }
    }

    /// Whether `pos` lies inside the map.
    pub fn is_tile_on_map(&self, pos: TilePos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    /// Tile on a layer; missing layers and out-of-bounds positions are "no tile".
    pub fn tile(&self, layer_id: &str, pos: TilePos) -> Option<&Tile> {
        self.layer(layer_id).and_then(|l| l.get(pos))
    }

    /// Replace a tile. Returns `false` if the layer is missing or the position
    /// is out of bounds.
    pub fn set_tile(&mut self, layer_id: &str, pos: TilePos, tile: Option<Tile>) -> bool {
        self.layer_mut(layer_id)
            .map(|l| l.set(pos, tile))
            .unwrap_or(false)
    }

    /// Look up a property: per-tile override first, then the sheet's per-index
    /// table for the tile's primary frame.
    pub fn tile_property(&self, pos: TilePos, key: &str, layer_id: &str) -> Option<&str> {
        let tile = self.tile(layer_id, pos)?;
        if let Some(value) = tile.properties.get(key) {
            return Some(value.as_str());
        }
        let primary = tile.graphic.primary()?;
        match self.sheets.get(&primary.sheet) {
            Some(sheet) => sheet.property(primary.index, key),
            None => {
                tracing::debug!(sheet = %primary.sheet, %pos, "tile_references_unknown_sheet");
                None
            }
        }
    }

    /// Boolean property with lenient parsing; malformed values are absent.
    pub fn tile_flag(&self, pos: TilePos, key: &str, layer_id: &str) -> Option<bool> {
        self.tile_property(pos, key, layer_id).and_then(parse_flag)
    }

    /// `true` if a property is present at all, whatever its value.
    pub fn has_property(&self, pos: TilePos, key: &str, layer_id: &str) -> bool {
        self.tile_property(pos, key, layer_id).is_some()
    }

    /// Ground-level walkability ignoring every occupant.
    ///
    /// Off-map tiles are impassable. A `Passable=F` ground tile blocks. A
    /// structure tile blocks unless it is explicitly passable or only a shadow.
    pub fn is_tile_passable(&self, pos: TilePos) -> bool {
        if !self.is_tile_on_map(pos) {
            return false;
        }
        if self.tile_flag(pos, name::PASSABLE, layer::BACK) == Some(false) {
            return false;
        }
        if self.tile(layer::BUILDINGS, pos).is_some() {
            let passable = self.tile_flag(pos, name::PASSABLE, layer::BUILDINGS) == Some(true);
            let shadow = self.has_property(pos, name::SHADOW, layer::BUILDINGS);
            if !passable && !shadow {
                return false;
            }
        }
        true
    }

    /// Whether the back tile is flagged as water.
    pub fn is_water(&self, pos: TilePos) -> bool {
        self.tile_flag(pos, name::WATER, layer::BACK) == Some(true)
    }

    /// Whether the back tile may be hoed.
    pub fn is_diggable(&self, pos: TilePos) -> bool {
        self.tile_flag(pos, name::DIGGABLE, layer::BACK) == Some(true)
    }

    /// Whether the back tile accepts buildings.
    pub fn is_buildable(&self, pos: TilePos) -> bool {
        self.tile_flag(pos, name::BUILDABLE, layer::BACK) == Some(true)
    }

    /// Grid-level placeability: an explicit `Placeable` flag wins, otherwise
    /// dry passable ground accepts items.
    pub fn is_tile_placeable(&self, pos: TilePos) -> bool {
        if !self.is_tile_on_map(pos) {
            return false;
        }
        if let Some(flag) = self.tile_flag(pos, name::PLACEABLE, layer::BACK) {
            return flag;
        }
        !self.is_water(pos) && self.is_tile_passable(pos)
    }

    /// `NoSpawn` value on the ground layer, if any.
    pub fn no_spawn(&self, pos: TilePos) -> Option<&str> {
        self.tile_property(pos, name::NO_SPAWN, layer::BACK)
    }

    /// Every on-map position, row by row.
    pub fn positions(&self) -> impl Iterator<Item = TilePos> + use<> {
        let (w, h) = (self.width as i32, self.height as i32);
        (0..h).flat_map(move |y| (0..w).map(move |x| TilePos::new(x, y)))
    }

    /// Primary tile indices of a layer, row by row.
    pub fn indices(&self, layer_id: &str) -> Vec<Option<u32>> {
        self.positions()
            .map(|p| self.tile(layer_id, p).and_then(Tile::index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilesheet::Tilesheet;

    fn sample() -> Grid {
        let mut grid = Grid::new(4, 3);
        grid.sheets
            .add(Tilesheet::new("out", "Maps/outdoors", 4, 4).with_property(2, "Diggable", "T"))
            .unwrap();
        grid
    }

    #[test]
    fn standard_layers_share_extent() {
        let grid = Grid::new(5, 6);
        assert_eq!(grid.layers().len(), 4);
        assert!(grid.layers().iter().all(|l| l.width() == 5 && l.height() == 6));
    }

    #[test]
    fn from_tiles_checks_count() {
        let err = Layer::from_tiles("Back", 2, 2, vec![None; 3]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::TileCountMismatch { expected: 4, actual: 3, .. }
        ));
    }

    #[test]
    fn out_of_bounds_is_no_tile() {
        let grid = sample();
        assert!(grid.tile(layer::BACK, TilePos::new(-1, 0)).is_none());
        assert!(grid.tile(layer::BACK, TilePos::new(4, 0)).is_none());
        assert!(grid.tile("Missing", TilePos::new(0, 0)).is_none());
    }

    #[test]
    fn tile_override_beats_sheet_property() {
        let mut grid = sample();
        let pos = TilePos::new(1, 1);
        grid.set_tile(layer::BACK, pos, Some(Tile::new("out", 2)));
        assert!(grid.is_diggable(pos));
        grid.set_tile(
            layer::BACK,
            pos,
            Some(Tile::new("out", 2).with_property("Diggable", "F")),
        );
        assert!(!grid.is_diggable(pos));
    }

    #[test]
    fn malformed_flag_is_absent() {
        let mut grid = sample();
        let pos = TilePos::new(0, 0);
        grid.set_tile(
            layer::BACK,
            pos,
            Some(Tile::new("out", 0).with_property("Passable", "nope")),
        );
        assert_eq!(grid.tile_flag(pos, "Passable", layer::BACK), None);
        assert!(grid.is_tile_passable(pos));
    }

    #[test]
    fn structure_tile_blocks_unless_shadow() {
        let mut grid = sample();
        let pos = TilePos::new(2, 1);
        grid.set_tile(layer::BUILDINGS, pos, Some(Tile::new("out", 0)));
        assert!(!grid.is_tile_passable(pos));
        grid.set_tile(
            layer::BUILDINGS,
            pos,
            Some(Tile::new("out", 0).with_property("Shadow", "")),
        );
        assert!(grid.is_tile_passable(pos));
    }

    #[test]
    fn add_layer_grows_every_layer() {
        let mut grid = Grid::new(2, 2);
        grid.add_layer(Layer::new("Paths", 5, 3));
        assert_eq!((grid.width(), grid.height()), (5, 3));
        assert!(grid.layers().iter().all(|l| l.width() == 5 && l.height() == 3));
    }

    #[test]
    fn resize_keeps_content() {
        let mut layer = Layer::new("Back", 2, 2);
        layer.set(TilePos::new(1, 1), Some(Tile::new("s", 7)));
        layer.resize(4, 4);
        assert_eq!(layer.get(TilePos::new(1, 1)).and_then(Tile::index), Some(7));
        assert_eq!(layer.filled(), 1);
    }

    #[test]
    fn animated_tile_uses_first_frame_for_properties() {
        let mut grid = sample();
        let pos = TilePos::new(3, 2);
        grid.set_tile(
            layer::BACK,
            pos,
            Some(Tile::animated(vec![TileRef::new("out", 2), TileRef::new("out", 3)], 250)),
        );
        assert!(grid.is_diggable(pos));
    }
}
