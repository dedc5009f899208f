//! Fused object representation owned by a track.

use crate::tracker::sensor_object::{DetectedObject, SensorKind, Supplement};

/// Best estimate of one tracked object across all sensors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FusedObject {
    /// Fused geometry and kinematics; `object.track_id` is the fusion track id
    pub object: DetectedObject,
    /// Timestamp of the most recent measurement absorbed by the track
    pub latest_tracked_time: f64,
    /// Supplement of the latest lidar measurement, cleared once no lidar sees the object
    pub lidar_supplement: Option<Supplement>,
    pub radar_supplement: Option<Supplement>,
    pub camera_supplement: Option<Supplement>,
}

impl FusedObject {
    pub fn track_id(&self) -> u64 {
        self.object.track_id
    }

    pub fn supplement(&self, kind: SensorKind) -> Option<&Supplement> {
        match kind {
            SensorKind::Lidar => self.lidar_supplement.as_ref(),
            SensorKind::Radar => self.radar_supplement.as_ref(),
            SensorKind::Camera => self.camera_supplement.as_ref(),
            SensorKind::Unknown => None,
        }
    }

    pub(crate) fn supplement_slot_mut(&mut self, kind: SensorKind) -> Option<&mut Option<Supplement>> {
        match kind {
            SensorKind::Lidar => Some(&mut self.lidar_supplement),
            SensorKind::Radar => Some(&mut self.radar_supplement),
            SensorKind::Camera => Some(&mut self.camera_supplement),
            SensorKind::Unknown => None,
        }
    }

    /// Drop all per-sensor supplements.
    pub(crate) fn clear_supplements(&mut self) {
        self.lidar_supplement = None;
        self.radar_supplement = None;
        self.camera_supplement = None;
    }
}
