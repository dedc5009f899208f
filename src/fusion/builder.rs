//! Builder for creating DetectedObject payloads.

use nalgebra::Vector3;
use ndarray::Array2;

use crate::tracker::{DetectedObject, ObjectType, Rect, Supplement};

/// Builder for creating [`DetectedObject`] payloads from detector output.
#[derive(Debug, Clone, Default)]
pub struct ObjectBuilder {
    object: DetectedObject,
}

impl ObjectBuilder {
    /// Create a new object builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the index within the frame.
    pub fn id(mut self, id: i32) -> Self {
        self.object.id = id;
        self
    }

    /// Set the id assigned by the sensor's own tracker.
    pub fn track_id(mut self, track_id: u64) -> Self {
        self.object.track_id = track_id;
        self
    }

    /// Set the center in the world frame.
    pub fn center(mut self, x: f64, y: f64, z: f64) -> Self {
        self.object.center = Vector3::new(x, y, z);
        self
    }

    /// Set length, width and height.
    pub fn size(mut self, length: f32, width: f32, height: f32) -> Self {
        self.object.size = Vector3::new(length, width, height);
        self
    }

    /// Set the heading angle; the direction vector follows it.
    pub fn theta(mut self, theta: f32) -> Self {
        self.object.theta = theta;
        self.object.direction = Vector3::new(theta.cos(), theta.sin(), 0.0);
        self
    }

    /// Velocity in m/s.
    pub fn velocity(mut self, vx: f32, vy: f32, vz: f32) -> Self {
        self.object.velocity = Vector3::new(vx, vy, vz);
        self
    }

    pub fn velocity_converged(mut self, converged: bool) -> Self {
        self.object.velocity_converged = converged;
        self
    }

    /// Acceleration in m/s^2.
    pub fn acceleration(mut self, ax: f32, ay: f32, az: f32) -> Self {
        self.object.acceleration = Vector3::new(ax, ay, az);
        self
    }

    /// Set the contour from `[x, y, z]` vertices.
    pub fn polygon(mut self, points: &[[f64; 3]]) -> Self {
        let flat: Vec<f64> = points.iter().flatten().copied().collect();
        self.object.polygon = Array2::from_shape_vec((points.len(), 3), flat)
            .unwrap_or_else(|_| Array2::zeros((0, 3)));
        self
    }

    pub fn object_type(mut self, object_type: ObjectType) -> Self {
        self.object.object_type = object_type;
        self
    }

    /// Set the confidence score.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.object.confidence = confidence;
        self
    }

    /// Attach a lidar supplement.
    pub fn lidar_points(mut self, num_points: usize) -> Self {
        self.object.supplement = Some(Supplement::Lidar { num_points });
        self
    }

    /// Attach a radar supplement.
    pub fn radar_measurement(mut self, range: f64, angle: f64, relative_radial_velocity: f64) -> Self {
        self.object.supplement = Some(Supplement::Radar {
            range,
            angle,
            relative_radial_velocity,
        });
        self
    }

    /// Attach a camera supplement from an image box in TLBR format (x1, y1, x2, y2).
    pub fn camera_box(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.object.supplement = Some(Supplement::Camera {
            image_box: Rect::from_tlbr(x1, y1, x2, y2),
        });
        self
    }

    /// Build the final `DetectedObject`.
    pub fn build(self) -> DetectedObject {
        self.object
    }
}
