//! Multi-sensor obstacle tracking core.
//!
//! [`tracker`] holds the per-object [`Track`] entity that ages and expires
//! lidar, radar and camera observations, and [`fusion`] holds the registry and
//! dispatcher that feed sensor frames into a selectable [`FusionBackend`].

pub mod error;
pub mod fusion;
pub mod tracker;

pub use error::{BackendError, FusionError, TrackError};
pub use fusion::{
    DispatcherState, DispatcherStats, FusionBackend, FusionDispatcher, FusionInitOptions,
    FusionOptions, FusionParams, FusionRegistry, ObjectBuilder, SensorFrame, SensorTrackFusion,
};
pub use tracker::{
    DetectedObject, FusedObject, ObjectType, Rect, Scene, SensorKind, SensorObservation,
    Supplement, Track, TrackConfig, TrackContext,
};
