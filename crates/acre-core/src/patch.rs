//! Map patches: keyed, at-most-once overlays of one grid onto another.
//!
//! A patch copies a rectangle of a source grid onto the live grid, layer by
//! layer. Tilesheets are matched by image source; a source sheet with no live
//! match is registered under a synthetic id derived from the patch key.
//! Applied keys are remembered until cleared or the map is reloaded.

use std::collections::HashMap;

use crate::content::ContentSource;
use crate::event::LocationEvent;
use crate::geometry::{TilePos, TileRect};
use crate::grid::{Grid, Tile, TileGraphic, TileRef};
use crate::location::Location;

/// Prefix of tilesheet ids synthesized by patches.
pub const PATCH_SHEET_PREFIX: &str = "zz_";

/// Per-tile side effect run once for every destination tile of a patch.
pub type PatchCallback<'a> = &'a mut dyn FnMut(&mut Location, TilePos);

impl Location {
    /// Overlay `source` onto the live grid under `key`.
    ///
    /// `source_rect` defaults to the whole source grid, `dest_rect` to the
    /// origin with the source size. Returns `false` without touching anything
    /// when the key is already applied.
    pub fn apply_map_override(
        &mut self,
        source: &Grid,
        key: &str,
        source_rect: Option<TileRect>,
        dest_rect: Option<TileRect>,
        on_tile: Option<PatchCallback<'_>>,
    ) -> bool {
        if self.applied_patches.contains(key) {
            tracing::debug!(location = %self.name(), key, "patch_already_applied");
            return false;
        }
        self.applied_patches.insert(key.to_string());

        let src = source_rect.unwrap_or(TileRect::new(
            0,
            0,
            source.width() as i32,
            source.height() as i32,
        ));
        let dest = dest_rect.unwrap_or(TileRect::new(0, 0, src.width, src.height));
        let width = src.width.min(dest.width).max(0);
        let height = src.height.min(dest.height).max(0);

        let sheet_map = self.remap_tilesheets(source, key);

        for layer in source.layers() {
            self.grid.ensure_layer(&layer.id);
        }
        self.grid.grow(
            source.width().max((dest.x + width).max(0) as u32),
            source.height().max((dest.y + height).max(0) as u32),
        );

        let mut changed = 0usize;
        for dy in 0..height {
            for dx in 0..width {
                let from = TilePos::new(src.x + dx, src.y + dy);
                let to = TilePos::new(dest.x + dx, dest.y + dy);
                let mut lower_overridden = false;
                for layer in source.layers() {
                    let source_tile = layer.get(from);
                    if source_tile.is_none() && !lower_overridden {
                        continue;
                    }
                    let replacement = match source_tile {
                        Some(tile) => match remap_tile(tile, &sheet_map) {
                            Some(tile) => Some(tile),
                            None => {
                                tracing::warn!(key, tile = %from, layer = %layer.id, "patch_tile_sheet_missing");
                                continue;
                            }
                        },
                        None => None,
                    };
                    if self.grid.set_tile(&layer.id, to, replacement) {
                        changed += 1;
                    }
                    lower_overridden = true;
                }
            }
        }

        if let Some(callback) = on_tile {
            for tile in dest_tiles(dest, width, height) {
                callback(self, tile);
            }
        }

        self.mark_seats_dirty();
        tracing::debug!(location = %self.name(), key, changed, "patch_applied");
        self.push_event(LocationEvent::PatchApplied {
            key: key.to_string(),
        });
        true
    }

    /// Load a map by asset name and apply it as a patch keyed by the asset.
    pub fn apply_map_override_asset(
        &mut self,
        content: &dyn ContentSource,
        asset: &str,
        source_rect: Option<TileRect>,
        dest_rect: Option<TileRect>,
    ) -> bool {
        if self.applied_patches.contains(asset) {
            return false;
        }
        let Some(source) = content.load_map(asset) else {
            tracing::warn!(location = %self.name(), asset, "patch_asset_missing");
            return false;
        };
        self.apply_map_override(&source, asset, source_rect, dest_rect, None)
    }

    /// Clear whatever sits on a tile about to be overwritten by a patch.
    /// Returns `true` if anything was removed.
    pub fn clean_up_tile_for_map_override(&mut self, tile: TilePos) -> bool {
        let mut removed = self.remove_object(tile).is_some();
        removed |= self.remove_terrain_feature(tile).is_some();
        let area = tile.pixel_rect();
        let covering: Vec<_> = self
            .furniture()
            .iter()
            .filter(|f| f.bounding_box().intersects(&area))
            .map(|f| f.id)
            .collect();
        for id in covering {
            removed |= self.remove_furniture(id).is_some();
        }
        removed
    }

    /// Whether `key` has been applied since the last reload.
    pub fn is_patch_applied(&self, key: &str) -> bool {
        self.applied_patches.contains(key)
    }

    /// Applied patch keys in order.
    pub fn applied_patches(&self) -> impl Iterator<Item = &str> {
        self.applied_patches.iter().map(String::as_str)
    }

    /// Forget a key so the patch may be applied again. The grid keeps the
    /// patched tiles.
    pub fn clear_patch(&mut self, key: &str) -> bool {
        self.applied_patches.remove(key)
    }

    /// Replace the grid wholesale from the content source and forget every
    /// applied patch. Returns `false` if there is no asset or it is missing.
    pub fn reload_map(&mut self, content: &dyn ContentSource) -> bool {
        self.map_dirty = false;
        let Some(asset) = self.map_asset.clone() else {
            return false;
        };
        let Some(grid) = content.load_map(&asset) else {
            tracing::warn!(location = %self.name(), asset = %asset, "map_asset_missing");
            return false;
        };
        self.grid = grid;
        self.applied_patches.clear();
        self.mark_seats_dirty();
        self.rebuild_light_sources();
        tracing::info!(location = %self.name(), asset = %asset, "map_reloaded");
        self.push_event(LocationEvent::MapReloaded { asset });
        true
    }

    /// Find or create a live sheet for every source sheet. Returns source id
    /// to live id.
    fn remap_tilesheets(&mut self, source: &Grid, key: &str) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for sheet in source.sheets.iter() {
            let needed = sheet.tile_count();
            let live_id = match self.grid.sheets.find_by_image_source(&sheet.image_source) {
                Some(live) => live.id.clone(),
                None => {
                    let id = format!("{PATCH_SHEET_PREFIX}{key}_{}", sheet.id);
                    if !self.grid.sheets.contains(&id) {
                        let mut synthetic = sheet.clone();
                        synthetic.id = id.clone();
                        if let Err(err) = self.grid.sheets.add(synthetic) {
                            tracing::warn!(%err, "patch_sheet_register_failed");
                        }
                    }
                    id
                }
            };
            if let Some(live) = self.grid.sheets.get_mut(&live_id) {
                live.grow_to(needed);
            }
            map.insert(sheet.id.clone(), live_id);
        }
        map
    }
}

/// Rebuild a source tile against live sheet ids. `None` if any frame points
/// at a sheet the source grid does not declare.
fn remap_tile(tile: &Tile, sheet_map: &HashMap<String, String>) -> Option<Tile> {
    let remap = |r: &TileRef| sheet_map.get(&r.sheet).map(|id| TileRef::new(id.clone(), r.index));
    let graphic = match &tile.graphic {
        TileGraphic::Static(r) => TileGraphic::Static(remap(r)?),
        TileGraphic::Animated { frames, interval_ms } => TileGraphic::Animated {
            frames: frames.iter().map(remap).collect::<Option<Vec<_>>>()?,
            interval_ms: *interval_ms,
        },
    };
    Some(Tile {
        graphic,
        properties: tile.properties.clone(),
    })
}

fn dest_tiles(dest: TileRect, width: i32, height: i32) -> Vec<TilePos> {
    TileRect::new(dest.x, dest.y, width, height).tiles().collect()
}
