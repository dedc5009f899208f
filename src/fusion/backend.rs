//! Trait for pluggable fusion strategies.

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::fusion::frame::SensorFrame;
use crate::tracker::FusedObject;

/// Options handed to [`FusionBackend::init`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionInitOptions {
    /// Sensor whose frames anchor a fusion cycle
    pub main_sensor: String,
}

/// Per-frame options handed to [`FusionBackend::fuse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct FusionOptions {}

/// A fusion strategy selectable by name through a
/// [`FusionRegistry`](crate::FusionRegistry).
///
/// Implementations own their track set and are driven by exactly one
/// [`FusionDispatcher`](crate::FusionDispatcher).
///
/// # Example
///
/// ```
/// use obstacle_fusion::{
///     BackendError, FusedObject, FusionBackend, FusionInitOptions, FusionOptions, SensorFrame,
/// };
///
/// struct Echo;
///
/// impl FusionBackend for Echo {
///     fn name(&self) -> &str {
///         "echo"
///     }
///
///     fn init(&mut self, _options: &FusionInitOptions) -> Result<(), BackendError> {
///         Ok(())
///     }
///
///     fn fuse(
///         &mut self,
///         _options: &FusionOptions,
///         frame: &SensorFrame,
///     ) -> Result<Vec<FusedObject>, BackendError> {
///         Ok(frame
///             .objects
///             .iter()
///             .map(|object| FusedObject {
///                 object: object.clone(),
///                 latest_tracked_time: frame.timestamp,
///                 ..FusedObject::default()
///             })
///             .collect())
///     }
/// }
/// ```
pub trait FusionBackend: Send {
    /// Name of the strategy, for logs.
    fn name(&self) -> &str;

    /// Prepare the backend. Called once before the first frame.
    fn init(&mut self, options: &FusionInitOptions) -> Result<(), BackendError>;

    /// Fuse one sensor frame into the track set and return the objects to
    /// publish for this cycle.
    fn fuse(
        &mut self,
        options: &FusionOptions,
        frame: &SensorFrame,
    ) -> Result<Vec<FusedObject>, BackendError>;
}
