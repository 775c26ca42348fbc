use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Occupant categories a tile query considers.
    ///
    /// Used both as the set of categories to test and as the set whose
    /// passable presence is ignored.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CollisionMask: u8 {
        /// Building footprints.
        const BUILDINGS = 1;
        /// Villagers, monsters and animals.
        const CHARACTERS = 1 << 1;
        /// Player-controlled farmers.
        const FARMERS = 1 << 2;
        /// Walkable floor terrain features.
        const FLOORING = 1 << 3;
        /// Furniture pieces.
        const FURNITURE = 1 << 4;
        /// Point objects.
        const OBJECTS = 1 << 5;
        /// Terrain features other than flooring, bushes and resource clumps.
        const TERRAIN_FEATURES = 1 << 6;
        /// Fixtures owned by the location itself.
        const LOCATION_SPECIFIC = 1 << 7;
    }
}

impl CollisionMask {
    /// Every category.
    pub const ALL: CollisionMask = CollisionMask::all();
    /// No category.
    pub const NONE: CollisionMask = CollisionMask::empty();

    /// Parse a `|`-separated list of category names such as `objects|furniture`.
    /// Unknown names are ignored.
    pub fn parse_list(raw: &str) -> CollisionMask {
        raw.split(['|', ','])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .fold(CollisionMask::NONE, |acc, name| {
                let flag = match name.to_ascii_lowercase().as_str() {
                    "all" => CollisionMask::ALL,
                    "none" => CollisionMask::NONE,
                    "buildings" => CollisionMask::BUILDINGS,
                    "characters" => CollisionMask::CHARACTERS,
                    "farmers" => CollisionMask::FARMERS,
                    "flooring" => CollisionMask::FLOORING,
                    "furniture" => CollisionMask::FURNITURE,
                    "objects" => CollisionMask::OBJECTS,
                    "terrain" | "terrain_features" => CollisionMask::TERRAIN_FEATURES,
                    "location" | "location_specific" => CollisionMask::LOCATION_SPECIFIC,
                    other => {
                        tracing::debug!(name = other, "unknown_mask_category");
                        CollisionMask::NONE
                    }
                };
                acc | flag
            })
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        CollisionMask::ALL
    }
}

bitflags! {
    /// Per-query modifiers for rectangle collision.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionFlags: u8 {
        /// Mover flies: skips ground-level occupants and reactions.
        const GLIDER = 1;
        /// Mover is a projectile: no reactions, no actor collisions.
        const PROJECTILE = 1 << 1;
        /// Path search query: read-only, no reactions.
        const PATHFINDING = 1 << 2;
        /// Mover is riding a raft: only water is open.
        const RAFT = 1 << 3;
    }
}

impl CollisionFlags {
    /// `true` if collision reactions (trampling, bumping) must not fire.
    pub fn is_read_only(self) -> bool {
        self.intersects(
            CollisionFlags::GLIDER | CollisionFlags::PROJECTILE | CollisionFlags::PATHFINDING,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_combines_names() {
        let mask = CollisionMask::parse_list("objects|Furniture, bogus");
        assert_eq!(mask, CollisionMask::OBJECTS | CollisionMask::FURNITURE);
        assert_eq!(CollisionMask::parse_list("all"), CollisionMask::ALL);
        assert_eq!(CollisionMask::parse_list(""), CollisionMask::NONE);
    }

    #[test]
    fn pathfinding_is_read_only() {
        assert!(CollisionFlags::PATHFINDING.is_read_only());
        assert!(!CollisionFlags::RAFT.is_read_only());
        assert!(!CollisionFlags::empty().is_read_only());
    }
}
