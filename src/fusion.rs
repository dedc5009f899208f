//! Fusion backend selection and frame dispatch.
//!
//! Backends implement [`FusionBackend`] and are registered by name in a
//! [`FusionRegistry`]; a [`FusionDispatcher`] picks one at startup from its
//! [`FusionParams`] and forwards every [`SensorFrame`] to it.

mod backend;
mod builder;
mod dispatcher;
mod frame;
mod registry;
mod sensor_track;

pub use backend::{FusionBackend, FusionInitOptions, FusionOptions};
pub use builder::ObjectBuilder;
pub use dispatcher::{DispatcherState, DispatcherStats, FusionDispatcher, FusionParams};
pub use frame::SensorFrame;
pub use registry::{BackendConstructor, FusionRegistry};
pub use sensor_track::SensorTrackFusion;
