//! FusionDispatcher forwarding sensor frames to the configured backend.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::FusionError;
use crate::fusion::backend::{FusionBackend, FusionInitOptions, FusionOptions};
use crate::fusion::frame::SensorFrame;
use crate::fusion::registry::FusionRegistry;
use crate::tracker::FusedObject;

/// Dispatcher configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FusionParams {
    /// Sensor whose frames anchor a fusion cycle
    #[serde(alias = "mainSensor")]
    pub main_sensor: String,
    /// Registered name of the backend to run
    #[serde(alias = "fusionMethod")]
    pub fusion_method: String,
}

impl FusionParams {
    /// Params selecting `fusion_method` with `main_sensor` as the anchor sensor.
    pub fn new(main_sensor: impl Into<String>, fusion_method: impl Into<String>) -> Self {
        Self {
            main_sensor: main_sensor.into(),
            fusion_method: fusion_method.into(),
        }
    }
}

/// Lifecycle of a [`FusionDispatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Uninitialized,
    Initialized,
    /// Terminal: the dispatcher never runs a backend.
    FailedInit,
}

/// Frame counters of an initialized dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub processed_frames: u64,
    pub failed_frames: u64,
}

enum Slot {
    Uninitialized,
    Initialized {
        method: String,
        backend: Box<dyn FusionBackend>,
    },
    FailedInit {
        reason: String,
    },
}

/// Holds one backend selected by name and forwards every frame to it.
///
/// The dispatcher does not interpret fused output, so backends stay fully
/// interchangeable.
pub struct FusionDispatcher {
    registry: Arc<FusionRegistry>,
    slot: Slot,
    stats: DispatcherStats,
}

impl FusionDispatcher {
    /// Uninitialized dispatcher resolving methods from `registry`.
    pub fn new(registry: Arc<FusionRegistry>) -> Self {
        Self {
            registry,
            slot: Slot::Uninitialized,
            stats: DispatcherStats::default(),
        }
    }

    /// Resolve, construct and initialize the backend named by
    /// `params.fusion_method`.
    ///
    /// Repeating the call with the same method is a no-op. Asking for a
    /// different method once initialized fails with
    /// [`FusionError::MethodConflict`] and keeps the running backend. Any
    /// failure on the first attempt is terminal.
    pub fn init(&mut self, params: &FusionParams) -> Result<(), FusionError> {
        match &self.slot {
            Slot::Initialized { method, .. } if *method == params.fusion_method => {
                info!(method = %method, "fusion dispatcher already initialized");
                return Ok(());
            }
            Slot::Initialized { method, .. } => {
                warn!(
                    active = %method,
                    requested = %params.fusion_method,
                    "rejecting request for a different fusion method"
                );
                return Err(FusionError::MethodConflict {
                    active: method.clone(),
                    requested: params.fusion_method.clone(),
                });
            }
            Slot::FailedInit { reason } => {
                return Err(FusionError::InitFailed(reason.clone()));
            }
            Slot::Uninitialized => {}
        }

        match self.create_backend(params) {
            Ok(backend) => {
                info!(
                    method = %params.fusion_method,
                    backend = backend.name(),
                    main_sensor = %params.main_sensor,
                    "fusion dispatcher initialized"
                );
                self.slot = Slot::Initialized {
                    method: params.fusion_method.clone(),
                    backend,
                };
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "failed to initialize fusion dispatcher");
                self.slot = Slot::FailedInit {
                    reason: err.to_string(),
                };
                Err(err)
            }
        }
    }

    fn create_backend(&self, params: &FusionParams) -> Result<Box<dyn FusionBackend>, FusionError> {
        let mut backend = self
            .registry
            .create(&params.fusion_method)
            .ok_or_else(|| FusionError::UnknownMethod(params.fusion_method.clone()))?;

        let options = FusionInitOptions {
            main_sensor: params.main_sensor.clone(),
        };
        backend
            .init(&options)
            .map_err(|source| FusionError::BackendInit {
                method: params.fusion_method.clone(),
                source,
            })?;
        Ok(backend)
    }

    /// Fuse one frame with the active backend.
    ///
    /// Fails with [`FusionError::NotInitialized`], without side effects,
    /// unless `init` succeeded. A backend failure only affects this frame.
    pub fn process(&mut self, frame: &SensorFrame) -> Result<Vec<FusedObject>, FusionError> {
        let Slot::Initialized { method, backend } = &mut self.slot else {
            return Err(FusionError::NotInitialized);
        };

        self.stats.processed_frames += 1;
        backend
            .fuse(&FusionOptions::default(), frame)
            .map_err(|source| {
                self.stats.failed_frames += 1;
                warn!(
                    method = %method,
                    sensor_id = %frame.sensor_id,
                    timestamp = frame.timestamp,
                    error = %source,
                    "fusion failed for frame"
                );
                FusionError::Fuse {
                    method: method.clone(),
                    sensor_id: frame.sensor_id.clone(),
                    timestamp: frame.timestamp,
                    source,
                }
            })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DispatcherState {
        match self.slot {
            Slot::Uninitialized => DispatcherState::Uninitialized,
            Slot::Initialized { .. } => DispatcherState::Initialized,
            Slot::FailedInit { .. } => DispatcherState::FailedInit,
        }
    }

    /// Registered name of the active method.
    pub fn method(&self) -> Option<&str> {
        match &self.slot {
            Slot::Initialized { method, .. } => Some(method.as_str()),
            _ => None,
        }
    }

    /// Name reported by the active backend itself.
    pub fn backend_name(&self) -> Option<&str> {
        match &self.slot {
            Slot::Initialized { backend, .. } => Some(backend.name()),
            _ => None,
        }
    }

    /// Frame counters since initialization.
    pub fn stats(&self) -> DispatcherStats {
        self.stats
    }

    /// Registry the dispatcher resolves methods from.
    pub fn registry(&self) -> &FusionRegistry {
        &self.registry
    }
}
