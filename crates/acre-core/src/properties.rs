use std::collections::BTreeMap;

/// String-keyed tile properties as authored in map content.
pub type PropertyMap = BTreeMap<String, String>;

/// Standard layer ids.
pub mod layer {
    /// Ground layer. Walkability and diggability live here.
    pub const BACK: &str = "Back";
    /// Structures. Any tile here blocks unless marked passable.
    pub const BUILDINGS: &str = "Buildings";
    /// Foreground drawn over actors.
    pub const FRONT: &str = "Front";
    /// Foreground drawn over everything.
    pub const ALWAYS_FRONT: &str = "AlwaysFront";
    /// Invisible authoring layer for spawn markers.
    pub const PATHS: &str = "Paths";

    /// Layers every grid starts with, in draw order.
    pub const STANDARD: [&str; 4] = [BACK, BUILDINGS, FRONT, ALWAYS_FRONT];
}

/// Well-known tile property names.
pub mod name {
    /// Tile can be tilled.
    pub const DIGGABLE: &str = "Diggable";
    /// Explicit walkability override.
    pub const PASSABLE: &str = "Passable";
    /// Blocks non-farmer actors.
    pub const NPC_BARRIER: &str = "NPCBarrier";
    /// Blocks everyone until cleared by a script.
    pub const TEMPORARY_BARRIER: &str = "TemporaryBarrier";
    /// Nothing spawns here. Value is `All`, `Forage`, `Grass` or `Tree`.
    pub const NO_SPAWN: &str = "NoSpawn";
    /// Interaction verb plus arguments.
    pub const ACTION: &str = "Action";
    /// Tile is water.
    pub const WATER: &str = "Water";
    /// Explicit placeability override.
    pub const PLACEABLE: &str = "Placeable";
    /// Tile accepts buildings.
    pub const BUILDABLE: &str = "Buildable";
    /// Tile is a seat.
    pub const SEAT: &str = "Seat";
    /// Building-layer tile that only casts a shadow.
    pub const SHADOW: &str = "Shadow";
    /// Light emitted by this tile, as a radius in tiles.
    pub const LIGHT: &str = "Light";
    /// Ground tile where the day pass may spawn forage and farm debris.
    pub const SPAWNABLE: &str = "Spawnable";
}

/// Parse a boolean property leniently.
///
/// Accepts `T`/`true`/`F`/`false` (case-insensitive). Anything else,
/// including an empty value, is treated as absent.
pub fn parse_flag(raw: &str) -> Option<bool> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("t") || trimmed.eq_ignore_ascii_case("true") {
        Some(true)
    } else if trimmed.eq_ignore_ascii_case("f") || trimmed.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        tracing::debug!(value = raw, "malformed_tile_flag");
        None
    }
}

/// Split an `Action` value into its verb and arguments.
pub fn split_action(raw: &str) -> Option<(&str, Vec<&str>)> {
    let mut parts = raw.split_whitespace();
    let verb = parts.next()?;
    Some((verb, parts.collect()))
}
