use thiserror::Error;

/// Top-level error type for geometry construction and track generation.
#[derive(Debug, Error)]
pub enum MocError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while building or querying the CSG model.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("unable to add neighbor cell {cell} to surface {surface} since the halfspace {halfspace} is not -1 or 1")]
    InvalidHalfspace {
        cell: i32,
        surface: i32,
        halfspace: i32,
    },

    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("geometry is unbounded along {0}")]
    Unbounded(&'static str),

    #[error("periodic boundary on {0} is not matched by the opposite side")]
    UnmatchedPeriodic(&'static str),
}

/// Configuration and generation errors of the track generator.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("number of azimuthal angles must be a positive multiple of 4, got {0}")]
    InvalidAzimCount(usize),

    #[error("invalid polar quadrature: {0}")]
    InvalidPolar(String),

    #[error("track spacing must be positive, got {0}")]
    InvalidSpacing(f64),

    #[error("maximum optical length must be positive, got {0}")]
    InvalidOpticalLength(f64),

    #[error("invalid thread count {0}")]
    InvalidThreads(usize),

    #[error("cycle starting at track {track} of azimuthal angle {azim} did not close within {bound} hops")]
    CycleNotClosed {
        azim: usize,
        track: usize,
        bound: usize,
    },

    #[error("track {track} of azimuthal angle {azim} found no cell at ({x}, {y}, {z})")]
    GeometryGap {
        azim: usize,
        track: usize,
        x: f64,
        y: f64,
        z: f64,
    },

    #[error("FSR buffer holds {found} entries, expected {expected}")]
    FsrCountMismatch { expected: usize, found: usize },

    #[error("cannot {operation} before {required}")]
    InvalidStage {
        operation: &'static str,
        required: &'static str,
    },
}

/// Errors of the on-disk track cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("track cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed track cache: {0}")]
    Format(#[from] serde_json::Error),

    #[error("track cache signature mismatch: expected {expected}, found {found}")]
    SignatureMismatch { expected: String, found: String },

    #[error("track cache holds {found} tracks for azimuthal angle {azim}, expected {expected}")]
    TrackCountMismatch {
        azim: usize,
        expected: usize,
        found: usize,
    },

    #[error("track cache entry {index} of azimuthal angle {azim} has no laid out track")]
    UnknownTrack { azim: usize, index: usize },

    #[error("track cache holds track {index} of azimuthal angle {azim} more than once")]
    DuplicateTrack { azim: usize, index: usize },

    #[error("cached endpoints of track {index} of azimuthal angle {azim} differ from the layout")]
    EndpointMismatch { azim: usize, index: usize },
}

impl CacheError {
    /// Returns `true` for failures that only mean the cache is unusable,
    /// as opposed to a cache that contradicts the current configuration.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::SignatureMismatch { .. })
    }
}

/// Errors loading track generator settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`MocError`].
pub type Result<T> = std::result::Result<T, MocError>;
