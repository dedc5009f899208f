//! Error types for track bookkeeping and fusion dispatch.

use thiserror::Error;

use crate::tracker::SensorKind;

/// Errors reported by [`Track`](crate::Track) and
/// [`TrackContext`](crate::TrackContext) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackError {
    /// The observation cannot be bound to a modality bucket.
    #[error("invalid observation: {0}")]
    InvalidObservation(String),

    /// An invisibility period must be finite and non-negative.
    #[error("invalid invisible period {period} for {kind:?}")]
    InvalidPeriod { kind: SensorKind, period: f64 },
}

impl TrackError {
    /// Creates an invalid observation error.
    #[must_use]
    pub fn invalid_observation(reason: impl Into<String>) -> Self {
        Self::InvalidObservation(reason.into())
    }
}

/// Error returned by a [`FusionBackend`](crate::FusionBackend) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct BackendError {
    reason: String,
}

impl BackendError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Human-readable failure reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl From<TrackError> for BackendError {
    fn from(err: TrackError) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors reported by the fusion registry and dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FusionError {
    /// No backend is registered under the requested name.
    #[error("unknown fusion method `{0}`")]
    UnknownMethod(String),

    /// A backend with the same name is already registered.
    #[error("fusion method `{0}` is already registered")]
    DuplicateMethod(String),

    /// The dispatcher already runs a different backend.
    #[error("fusion method `{requested}` requested but `{active}` is already initialized")]
    MethodConflict { active: String, requested: String },

    /// The resolved backend rejected its init options.
    #[error("fusion backend `{method}` failed to initialize: {source}")]
    BackendInit {
        method: String,
        #[source]
        source: BackendError,
    },

    /// A previous init attempt failed; the dispatcher stays unusable.
    #[error("fusion dispatcher initialization previously failed: {0}")]
    InitFailed(String),

    /// `process` called before a successful `init`.
    #[error("fusion dispatcher is not initialized")]
    NotInitialized,

    /// The backend failed to fuse one frame.
    #[error("fusion backend `{method}` failed on frame from `{sensor_id}` at {timestamp:.3}: {source}")]
    Fuse {
        method: String,
        sensor_id: String,
        timestamp: f64,
        #[source]
        source: BackendError,
    },
}
