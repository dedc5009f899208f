//! Process-wide track state shared by every [`Track`](crate::Track).

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::tracker::sensor_object::SensorKind;

/// Invisibility periods and track initialization policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackConfig {
    /// Seconds a lidar may miss the object before its slot turns invisible
    pub max_lidar_invisible_period: f64,
    /// Seconds a radar may miss the object before its slot turns invisible
    pub max_radar_invisible_period: f64,
    /// Seconds a camera may miss the object before its slot turns invisible
    pub max_camera_invisible_period: f64,
    /// Multiplier applied to every period for background tracks
    pub background_period_scale: f64,
    /// Existence probability given to a freshly initialized track
    pub initial_existence_probability: f64,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            max_lidar_invisible_period: 0.25,
            max_radar_invisible_period: 0.50,
            max_camera_invisible_period: 0.75,
            background_period_scale: 2.0,
            initial_existence_probability: 0.5,
        }
    }
}

impl TrackConfig {
    /// Invisibility period for a modality, `None` for [`SensorKind::Unknown`].
    pub fn max_invisible_period(&self, kind: SensorKind) -> Option<f64> {
        match kind {
            SensorKind::Lidar => Some(self.max_lidar_invisible_period),
            SensorKind::Radar => Some(self.max_radar_invisible_period),
            SensorKind::Camera => Some(self.max_camera_invisible_period),
            SensorKind::Unknown => None,
        }
    }
}

/// Track id counter plus the shared [`TrackConfig`].
///
/// Create one per fusion pipeline and hand it to tracks through an `Arc`.
/// Ids come from an atomic counter; the config sits behind a read-write lock
/// so processing threads read it concurrently while startup code writes it.
#[derive(Debug)]
pub struct TrackContext {
    next_track_id: AtomicU64,
    config: RwLock<TrackConfig>,
}

impl Default for TrackContext {
    fn default() -> Self {
        Self::new(TrackConfig::default())
    }
}

impl TrackContext {
    /// Context whose track ids start at 1.
    pub fn new(config: TrackConfig) -> Self {
        Self {
            next_track_id: AtomicU64::new(1),
            config: RwLock::new(config),
        }
    }

    /// Return the next track id and advance the counter. Ids start at 1.
    pub fn generate_new_track_id(&self) -> u64 {
        self.next_track_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Restart ids at 1 (useful for testing).
    pub fn reset_track_ids(&self) {
        self.next_track_id.store(1, Ordering::SeqCst);
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> TrackConfig {
        *self.config.read()
    }

    /// Invisible period of `kind`; `None` for sensors without a modality.
    pub fn max_invisible_period(&self, kind: SensorKind) -> Option<f64> {
        self.config.read().max_invisible_period(kind)
    }

    /// Rejects negative or non-finite periods.
    pub fn set_max_lidar_invisible_period(&self, period: f64) -> Result<(), TrackError> {
        self.set_max_invisible_period(SensorKind::Lidar, period)
    }

    pub fn set_max_radar_invisible_period(&self, period: f64) -> Result<(), TrackError> {
        self.set_max_invisible_period(SensorKind::Radar, period)
    }

    pub fn set_max_camera_invisible_period(&self, period: f64) -> Result<(), TrackError> {
        self.set_max_invisible_period(SensorKind::Camera, period)
    }

    fn set_max_invisible_period(&self, kind: SensorKind, period: f64) -> Result<(), TrackError> {
        if !period.is_finite() || period < 0.0 {
            return Err(TrackError::InvalidPeriod { kind, period });
        }
        let mut config = self.config.write();
        match kind {
            SensorKind::Lidar => config.max_lidar_invisible_period = period,
            SensorKind::Radar => config.max_radar_invisible_period = period,
            SensorKind::Camera => config.max_camera_invisible_period = period,
            SensorKind::Unknown => return Err(TrackError::InvalidPeriod { kind, period }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_default_periods_ordered_by_modality() {
        let config = TrackConfig::default();
        assert!(config.max_camera_invisible_period > config.max_radar_invisible_period);
        assert!(config.max_radar_invisible_period > config.max_lidar_invisible_period);
        assert_eq!(config.max_invisible_period(SensorKind::Unknown), None);
    }

    #[test]
    fn test_ids_start_at_one_and_reset() {
        let context = TrackContext::default();
        assert_eq!(context.generate_new_track_id(), 1);
        assert_eq!(context.generate_new_track_id(), 2);
        context.reset_track_ids();
        assert_eq!(context.generate_new_track_id(), 1);
    }

    #[test]
    fn test_concurrent_ids_are_distinct() {
        let context = Arc::new(TrackContext::default());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let context = Arc::clone(&context);
                thread::spawn(move || {
                    (0..250)
                        .map(|_| context.generate_new_track_id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_set_period_rejects_invalid_values() {
        let context = TrackContext::default();
        assert!(context.set_max_radar_invisible_period(1.0).is_ok());
        assert_eq!(context.max_invisible_period(SensorKind::Radar), Some(1.0));
        assert!(matches!(
            context.set_max_lidar_invisible_period(-0.1),
            Err(TrackError::InvalidPeriod { .. })
        ));
        assert!(context.set_max_camera_invisible_period(f64::INFINITY).is_err());
        assert_eq!(context.config().max_lidar_invisible_period, 0.25);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: TrackConfig =
            serde_json::from_str(r#"{ "max_lidar_invisible_period": 0.1 }"#).unwrap();
        assert_eq!(config.max_lidar_invisible_period, 0.1);
        assert_eq!(config.max_camera_invisible_period, 0.75);
    }
}
