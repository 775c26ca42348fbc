use std::collections::HashMap;

use crate::furniture::Furniture;
use crate::geometry::TilePos;
use crate::occupant::OccupantId;

/// A structural edit requested while a collection was locked.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingEdit<T> {
    /// Occupy a tile.
    Insert(TilePos, T),
    /// Vacate a tile.
    Remove(TilePos),
}

/// Occupants keyed by tile. At most one occupant per key.
///
/// Lookup by tile is constant time. Iteration visits tiles in sorted order so
/// that seeded passes replay identically.
///
/// While locked, structural edits are queued instead of applied so a scan in
/// progress never sees the map change under it. [`PointCollection::unlock`]
/// hands the queued edits back for replay through the owner's hooks.
#[derive(Debug, Clone, PartialEq)]
pub struct PointCollection<T> {
    items: HashMap<TilePos, T>,
    locked: bool,
    pending: Vec<PendingEdit<T>>,
}

impl<T> Default for PointCollection<T> {
    fn default() -> Self {
        Self {
            items: HashMap::new(),
            locked: false,
            pending: Vec::new(),
        }
    }
}

impl<T> PointCollection<T> {
    /// An empty, unlocked collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Occupant at a tile.
    pub fn get(&self, tile: TilePos) -> Option<&T> {
        self.items.get(&tile)
    }

    /// Mutable occupant at a tile.
    pub fn get_mut(&mut self, tile: TilePos) -> Option<&mut T> {
        self.items.get_mut(&tile)
    }

    /// Whether a tile is taken.
    pub fn contains(&self, tile: TilePos) -> bool {
        self.items.contains_key(&tile)
    }

    /// Number of occupants, not counting pending edits.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds nothing.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Occupants with their tiles.
    pub fn iter(&self) -> impl Iterator<Item = (TilePos, &T)> {
        let mut entries: Vec<_> = self.items.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries.into_iter()
    }

    /// Occupants with their tiles, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (TilePos, &mut T)> {
        let mut entries: Vec<_> = self.items.iter_mut().map(|(k, v)| (*k, v)).collect();
        entries.sort_unstable_by_key(|(k, _)| *k);
        entries.into_iter()
    }

    /// Occupants in tile order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, v)| v)
    }

    /// Copy of the current key set in sorted order, safe to iterate while
    /// mutating.
    pub fn keys(&self) -> Vec<TilePos> {
        let mut keys: Vec<TilePos> = self.items.keys().copied().collect();
        keys.sort_unstable();
        keys
    }

    /// Whether edits are currently being deferred.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Start deferring structural edits.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    /// Stop deferring and return the edits queued meanwhile, oldest first.
    pub fn unlock(&mut self) -> Vec<PendingEdit<T>> {
        self.locked = false;
        std::mem::take(&mut self.pending)
    }

    /// Queue an edit for the next unlock.
    pub(crate) fn defer(&mut self, edit: PendingEdit<T>) {
        self.pending.push(edit);
    }

    /// Whether an insert for `tile` is waiting for the next unlock.
    pub(crate) fn has_pending_insert(&self, tile: TilePos) -> bool {
        self.pending
            .iter()
            .any(|edit| matches!(edit, PendingEdit::Insert(t, _) if *t == tile))
    }

    /// Number of edits waiting for the next unlock.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Insert if the key is free. Returns the value back when taken.
    pub(crate) fn insert_new(&mut self, tile: TilePos, value: T) -> Result<(), T> {
        if self.items.contains_key(&tile) {
            return Err(value);
        }
        self.items.insert(tile, value);
        Ok(())
    }

    pub(crate) fn remove(&mut self, tile: TilePos) -> Option<T> {
        self.items.remove(&tile)
    }

    /// Remove every entry matching the predicate, returning them in key order.
    pub(crate) fn drain_where(&mut self, mut remove: impl FnMut(TilePos, &T) -> bool) -> Vec<(TilePos, T)> {
        let doomed: Vec<TilePos> = self
            .iter()
            .filter(|(k, v)| remove(*k, v))
            .map(|(k, _)| k)
            .collect();
        doomed
            .into_iter()
            .filter_map(|k| self.items.remove(&k).map(|v| (k, v)))
            .collect()
    }
}

/// Furniture with a deferred-removal queue.
///
/// Removal may be requested at any time with
/// [`FurnitureCollection::mark_for_removal`]; the removal itself happens once
/// per frame in [`FurnitureCollection::process_removals`], which refuses to
/// re-enter itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FurnitureCollection {
    items: Vec<Furniture>,
    pending_removals: Vec<OccupantId>,
    processing: bool,
}

impl FurnitureCollection {
    /// An empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Furniture in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &Furniture> {
        self.items.iter()
    }

    /// Furniture as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [Furniture] {
        &mut self.items
    }

    /// Furniture by id.
    pub fn get(&self, id: OccupantId) -> Option<&Furniture> {
        self.items.iter().find(|f| f.id == id)
    }

    /// Number of pieces.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is placed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn push(&mut self, furniture: Furniture) {
        self.items.push(furniture);
    }

    /// Queue a removal. Unknown ids are accepted and ignored later.
    pub fn mark_for_removal(&mut self, id: OccupantId) {
        self.pending_removals.push(id);
    }

    /// Removals waiting for the next flush.
    pub fn pending_removals(&self) -> usize {
        self.pending_removals.len()
    }

    /// Apply queued removals and return what was removed. Returns nothing if
    /// called while already processing.
    pub(crate) fn process_removals(&mut self) -> Vec<Furniture> {
        if self.processing || self.pending_removals.is_empty() {
            return Vec::new();
        }
        self.processing = true;
        self.pending_removals.sort();
        self.pending_removals.dedup();
        let pending = std::mem::take(&mut self.pending_removals);
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.items.len());
        for item in self.items.drain(..) {
            if pending.binary_search(&item.id).is_ok() {
                removed.push(item);
            } else {
                kept.push(item);
            }
        }
        self.items = kept;
        self.processing = false;
        removed
    }

    /// Immediate removal, used outside of iteration.
    pub(crate) fn remove_now(&mut self, id: OccupantId) -> Option<Furniture> {
        let idx = self.items.iter().position(|f| f.id == id)?;
        Some(self.items.remove(idx))
    }
}
