use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::properties::PropertyMap;

/// Pixel-source metadata and per-index properties for one tilesheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tilesheet {
    /// Identifier tiles use to reference this sheet.
    pub id: String,
    /// Image asset the sheet draws from. Two sheets with the same source are
    /// interchangeable.
    pub image_source: String,
    /// Tiles per row.
    pub columns: u32,
    /// Number of rows.
    pub rows: u32,
    /// Properties shared by every tile using a given index.
    #[serde(default)]
    pub tile_properties: BTreeMap<u32, PropertyMap>,
}

impl Tilesheet {
    /// Create a sheet with no per-index properties.
    pub fn new(id: impl Into<String>, image_source: impl Into<String>, columns: u32, rows: u32) -> Self {
        Self {
            id: id.into(),
            image_source: image_source.into(),
            columns,
            rows,
            tile_properties: BTreeMap::new(),
        }
    }

    /// Builder: set a per-index property.
    pub fn with_property(mut self, index: u32, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tile_properties
            .entry(index)
            .or_default()
            .insert(key.into(), value.into());
        self
    }

    /// Number of tile indices the sheet currently provides.
    pub fn tile_count(&self) -> u32 {
        self.columns.saturating_mul(self.rows)
    }

    /// `true` if the index is addressable.
    pub fn has_index(&self, index: u32) -> bool {
        index < self.tile_count()
    }

    /// Look up a per-index property.
    pub fn property(&self, index: u32, key: &str) -> Option<&str> {
        self.tile_properties
            .get(&index)
            .and_then(|props| props.get(key))
            .map(String::as_str)
    }

    /// Grow the sheet so it provides at least `count` tiles, adding rows.
    /// Never shrinks.
    pub fn grow_to(&mut self, count: u32) {
        if count <= self.tile_count() {
            return;
        }
        let columns = self.columns.max(1);
        self.columns = columns;
        self.rows = count.div_ceil(columns);
    }
}

/// The set of tilesheets a grid may reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TilesheetRegistry {
    sheets: Vec<Tilesheet>,
}

impl TilesheetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sheet. Ids must be unique.
    pub fn add(&mut self, sheet: Tilesheet) -> CoreResult<()> {
        if self.contains(&sheet.id) {
            return Err(CoreError::DuplicateTilesheet(sheet.id));
        }
        self.sheets.push(sheet);
        Ok(())
    }

    /// Whether a sheet with this id is declared.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Sheet by id.
    pub fn get(&self, id: &str) -> Option<&Tilesheet> {
        self.sheets.iter().find(|s| s.id == id)
    }

    /// Mutable sheet by id.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Tilesheet> {
        self.sheets.iter_mut().find(|s| s.id == id)
    }

    /// First sheet drawing from the given image.
    pub fn find_by_image_source(&self, image_source: &str) -> Option<&Tilesheet> {
        self.sheets.iter().find(|s| s.image_source == image_source)
    }

    /// Sheets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Tilesheet> {
        self.sheets.iter()
    }

    /// Number of sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Whether no sheets are declared.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_id_rejected() {
        let mut reg = TilesheetRegistry::new();
        reg.add(Tilesheet::new("outdoors", "Maps/outdoors", 4, 4)).unwrap();
        let err = reg
            .add(Tilesheet::new("outdoors", "Maps/other", 1, 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateTilesheet(id) if id == "outdoors"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn find_by_image_source() {
        let mut reg = TilesheetRegistry::new();
        reg.add(Tilesheet::new("a", "Maps/spring", 4, 4)).unwrap();
        reg.add(Tilesheet::new("b", "Maps/town", 4, 4)).unwrap();
        assert_eq!(reg.find_by_image_source("Maps/town").unwrap().id, "b");
        assert!(reg.find_by_image_source("Maps/none").is_none());
    }

    #[test]
    fn grow_adds_rows_and_never_shrinks() {
        let mut sheet = Tilesheet::new("a", "img", 4, 2);
        sheet.grow_to(10);
        assert_eq!(sheet.rows, 3);
        assert!(sheet.has_index(11));
        sheet.grow_to(2);
        assert_eq!(sheet.tile_count(), 12);
    }

    #[test]
    fn per_index_property() {
        let sheet = Tilesheet::new("a", "img", 4, 4).with_property(5, "Diggable", "T");
        assert_eq!(sheet.property(5, "Diggable"), Some("T"));
        assert_eq!(sheet.property(4, "Diggable"), None);
    }
}
