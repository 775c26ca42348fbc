use crate::occupant::OccupantId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while building or assembling location state.
///
/// Data-quality problems in authored map content are not errors; they are
/// logged and treated as absent. Only structural problems surface here.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A tilesheet with the same id is already registered.
    #[error("tilesheet already registered: \"{0}\"")]
    DuplicateTilesheet(String),

    /// A layer was built from a tile list that does not match its dimensions.
    #[error("tile count mismatch in layer \"{layer}\": expected {expected}, got {actual}")]
    TileCountMismatch {
        /// The layer being built.
        layer: String,
        /// `width * height` of the layer.
        expected: usize,
        /// Number of tiles supplied.
        actual: usize,
    },

    /// A location with the same name is already loaded.
    #[error("location already loaded: \"{0}\"")]
    DuplicateLocation(String),

    /// The requested location is not loaded.
    #[error("location not found: \"{0}\"")]
    LocationNotFound(String),

    /// The requested occupant does not exist in the location.
    #[error("occupant not found: {0}")]
    OccupantNotFound(OccupantId),

    /// A JSON document could not be parsed.
    #[error("invalid document: {0}")]
    Document(#[from] serde_json::Error),
}
