//! Sensor frame input.

use crate::error::TrackError;
use crate::tracker::{DetectedObject, SensorKind, SensorObservation};

/// All detections one sensor produced at one timestamp.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorFrame {
    pub sensor_id: String,
    pub sensor_kind: SensorKind,
    /// Capture time in seconds
    pub timestamp: f64,
    pub objects: Vec<DetectedObject>,
}

impl SensorFrame {
    /// Empty frame captured by `sensor_id` at `timestamp`.
    pub fn new(sensor_id: impl Into<String>, sensor_kind: SensorKind, timestamp: f64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sensor_kind,
            timestamp,
            objects: Vec::new(),
        }
    }

    /// Append a detection.
    pub fn with_object(mut self, object: DetectedObject) -> Self {
        self.objects.push(object);
        self
    }

    /// Check the frame can be turned into routable observations.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.sensor_id.is_empty() {
            return Err(TrackError::invalid_observation("frame without sensor id"));
        }
        if !self.timestamp.is_finite() {
            return Err(TrackError::invalid_observation(format!(
                "frame from `{}` has non-finite timestamp {}",
                self.sensor_id, self.timestamp
            )));
        }
        if self.sensor_kind == SensorKind::Unknown {
            return Err(TrackError::invalid_observation(format!(
                "frame from `{}` has no lidar, radar or camera modality",
                self.sensor_id
            )));
        }
        Ok(())
    }

    /// One observation per detection, in frame order.
    pub fn observations(&self) -> impl Iterator<Item = SensorObservation> + '_ {
        self.objects.iter().map(|object| {
            SensorObservation::new(
                self.sensor_id.clone(),
                self.sensor_kind,
                self.timestamp,
                object.clone(),
            )
        })
    }
}
