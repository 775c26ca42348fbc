//! Spatial state of a single game location: the tile grid, the entities that
//! occupy it, and the queries every other subsystem asks of it.
//!
//! A [`Location`] owns its [`Grid`] and one collection per occupant category.
//! Occupancy and collision questions go through [`Location::occupancy`];
//! runtime map overlays through [`Location::apply_map_override`]. The crate
//! has no notion of time; the simulation crate drives updates.

/// Action verb registry for `Action` tile properties.
pub mod action;
/// Characters, farmers and farm animals.
pub mod actor;
/// Buildings with doors, interiors and construction counters.
pub mod building;
/// Seasons and the day calendar.
pub mod calendar;
/// Point-keyed and deferred-removal entity collections.
pub mod collections;
/// Content source trait and JSON map documents.
pub mod content;
/// Error types used throughout the crate.
pub mod error;
/// Lifecycle events reported by locations.
pub mod event;
/// Multi-tile furniture.
pub mod furniture;
/// Tile and pixel coordinates and rectangles.
pub mod geometry;
/// Layers, tiles and the grid.
pub mod grid;
/// The location: owner of the grid and every entity collection.
pub mod location;
/// Collision categories and collision flags.
pub mod mask;
/// Placed point objects.
pub mod object;
/// Occupancy and collision queries.
pub mod occupancy;
/// Occupant identifiers and the tagged occupant view.
pub mod occupant;
/// Runtime map patches.
pub mod patch;
/// Placement and farming operations.
pub mod placement;
/// Standard layer and property names, lenient property parsing.
pub mod properties;
/// ASCII rendering of occupancy.
pub mod render;
/// Per-location spawn, decay and growth rules.
pub mod rules;
/// Resumable scripted sequences.
pub mod script;
/// Persistence snapshots.
pub mod snapshot;
/// Terrain features, bushes and resource clumps.
pub mod terrain;
/// Tilesheets and the tilesheet registry.
pub mod tilesheet;
/// Critters, debris, projectiles, sprites, lights, fixtures and bridges.
pub mod transient;
/// The set of loaded locations.
pub mod world;

/// Re-export action registry types.
pub use action::{ActionInvocation, ActionRegistry};
/// Re-export content types.
pub use content::{ContentSource, InMemoryContent, MapDocument};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export location events.
pub use event::LocationEvent;
/// Re-export geometry types.
pub use geometry::{PixelPos, PixelRect, TILE_SIZE, TilePos, TileRect, Velocity};
/// Re-export grid types.
pub use grid::{Grid, Layer, Tile};
/// Re-export the location.
pub use location::Location;
/// Re-export collision masks.
pub use mask::{CollisionFlags, CollisionMask};
/// Re-export occupancy query types.
pub use occupancy::{Mover, MoverKind, Occupancy};
/// Re-export occupant identity types.
pub use occupant::{Occupant, OccupantId, OccupantKind};
/// Re-export location rules.
pub use rules::{LocationKind, LocationRules};
/// Re-export snapshot types.
pub use snapshot::LocationSnapshot;
/// Re-export the world.
pub use world::World;
