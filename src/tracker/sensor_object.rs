//! Sensor observations bound into track modality buckets.

use nalgebra::Vector3;
use ndarray::Array2;

use crate::error::TrackError;
use crate::tracker::rect::Rect;

/// Sensor category. Each of lidar, radar and camera has its own bucket in a
/// [`Track`](crate::Track) and its own invisibility period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SensorKind {
    Lidar,
    Radar,
    Camera,
    /// Sensors without a modality bucket (ultrasonic, unconfigured ids).
    #[default]
    Unknown,
}

/// Semantic class of a detected object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectType {
    #[default]
    Unknown,
    UnknownMovable,
    UnknownUnmovable,
    Pedestrian,
    Bicycle,
    Vehicle,
}

/// Sensor-specific extras carried by a detection.
#[derive(Debug, Clone, PartialEq)]
pub enum Supplement {
    Lidar {
        /// Number of cloud points segmented into the object
        num_points: usize,
    },
    Radar {
        range: f64,
        angle: f64,
        relative_radial_velocity: f64,
    },
    Camera {
        /// Box in the camera image
        image_box: Rect,
    },
}

impl Supplement {
    pub fn sensor_kind(&self) -> SensorKind {
        match self {
            Self::Lidar { .. } => SensorKind::Lidar,
            Self::Radar { .. } => SensorKind::Radar,
            Self::Camera { .. } => SensorKind::Camera,
        }
    }
}

/// Geometry, kinematics and class of one detected (or fused) object.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    /// Index of the object within its frame
    pub id: i32,
    /// Track id assigned by the producer (upstream sensor tracker or fusion)
    pub track_id: u64,
    /// Center in the world frame (meters)
    pub center: Vector3<f64>,
    /// Length, width, height (meters)
    pub size: Vector3<f32>,
    /// Heading unit vector
    pub direction: Vector3<f32>,
    /// Heading angle (radians)
    pub theta: f32,
    pub velocity: Vector3<f32>,
    pub velocity_converged: bool,
    pub acceleration: Vector3<f32>,
    /// Convex hull contour, one `[x, y, z]` row per vertex
    pub polygon: Array2<f64>,
    pub object_type: ObjectType,
    /// Detection confidence in [0, 1]
    pub confidence: f32,
    pub supplement: Option<Supplement>,
}

impl Default for DetectedObject {
    fn default() -> Self {
        Self {
            id: -1,
            track_id: 0,
            center: Vector3::zeros(),
            size: Vector3::zeros(),
            direction: Vector3::x(),
            theta: 0.0,
            velocity: Vector3::zeros(),
            velocity_converged: true,
            acceleration: Vector3::zeros(),
            polygon: Array2::zeros((0, 3)),
            object_type: ObjectType::Unknown,
            confidence: 1.0,
            supplement: None,
        }
    }
}

/// One sensor's detection of an object at one timestamp.
///
/// The detection itself is immutable once created. The owning track keeps
/// the time elapsed since this observation (its invisible period) next to it.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorObservation {
    sensor_id: String,
    sensor_kind: SensorKind,
    timestamp: f64,
    object: DetectedObject,
    invisible_period: f64,
}

impl SensorObservation {
    /// Fresh observation, visible until aged.
    pub fn new(
        sensor_id: impl Into<String>,
        sensor_kind: SensorKind,
        timestamp: f64,
        object: DetectedObject,
    ) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            sensor_kind,
            timestamp,
            object,
            invisible_period: 0.0,
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn sensor_kind(&self) -> SensorKind {
        self.sensor_kind
    }

    /// Capture time in seconds.
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn object(&self) -> &DetectedObject {
        &self.object
    }

    /// Seconds since this observation as of the last track update; zero while
    /// the sensor keeps reporting the object.
    pub fn invisible_period(&self) -> f64 {
        self.invisible_period
    }

    pub(crate) fn set_invisible_period(&mut self, period: f64) {
        self.invisible_period = period;
    }

    /// Reject observations that cannot be routed to a modality bucket.
    pub fn validate(&self) -> Result<(), TrackError> {
        if self.sensor_id.is_empty() {
            return Err(TrackError::invalid_observation("empty sensor id"));
        }
        if !self.timestamp.is_finite() {
            return Err(TrackError::invalid_observation(format!(
                "non-finite timestamp {} from `{}`",
                self.timestamp, self.sensor_id
            )));
        }
        if self.sensor_kind == SensorKind::Unknown {
            return Err(TrackError::invalid_observation(format!(
                "sensor `{}` has no lidar, radar or camera modality",
                self.sensor_id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_observation_is_visible() {
        let obs = SensorObservation::new("lidar_front", SensorKind::Lidar, 1.5, Default::default());
        assert_eq!(obs.invisible_period(), 0.0);
        assert!(obs.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unroutable_observations() {
        let empty_id = SensorObservation::new("", SensorKind::Lidar, 0.0, Default::default());
        let nan_time = SensorObservation::new("radar", SensorKind::Radar, f64::NAN, Default::default());
        let unknown = SensorObservation::new("ultrasonic", SensorKind::Unknown, 0.0, Default::default());

        for obs in [empty_id, nan_time, unknown] {
            assert!(matches!(
                obs.validate(),
                Err(TrackError::InvalidObservation(_))
            ));
        }
    }

    #[test]
    fn test_supplement_kind() {
        let supplement = Supplement::Camera {
            image_box: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        assert_eq!(supplement.sensor_kind(), SensorKind::Camera);
    }
}
