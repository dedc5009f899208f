//! Reference backend associating detections by the sensor's own track id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::BackendError;
use crate::fusion::backend::{FusionBackend, FusionInitOptions, FusionOptions};
use crate::fusion::frame::SensorFrame;
use crate::tracker::{DetectedObject, FusedObject, ObjectType, Scene, Track, TrackContext};

/// Fusion by upstream identity.
///
/// Every `(sensor id, sensor track id)` pair feeds one fusion track. A pair
/// repeated within one frame, such as detections without an upstream id
/// (track id 0), feeds one track per occurrence: the n-th occurrence continues
/// the n-th track created for that pair. The fused geometry follows the latest measurement; a track dies once none of
/// its sensors has seen the object within the modality's invisible period.
/// Objects are published on frames from the main sensor only.
#[derive(Debug)]
pub struct SensorTrackFusion {
    context: Arc<TrackContext>,
    main_sensor: String,
    scene: Scene,
    associations: HashMap<(String, u64), Vec<u64>>,
    initialized: bool,
}

impl Default for SensorTrackFusion {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorTrackFusion {
    /// Registry name.
    pub const NAME: &'static str = "sensor_track";

    /// Backend with its own track context.
    pub fn new() -> Self {
        Self::with_context(Arc::new(TrackContext::default()))
    }

    /// Share a track id counter and invisibility config with other components.
    pub fn with_context(context: Arc<TrackContext>) -> Self {
        Self {
            context,
            main_sensor: String::new(),
            scene: Scene::new(),
            associations: HashMap::new(),
            initialized: false,
        }
    }

    /// Sensor whose frames trigger publication; empty before `init`.
    pub fn main_sensor(&self) -> &str {
        &self.main_sensor
    }

    /// Tracks currently maintained by the backend.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    fn associate(&mut self, frame: &SensorFrame) -> Result<HashSet<u64>, BackendError> {
        let mut updated = HashSet::new();
        let mut occurrences: HashMap<u64, usize> = HashMap::new();
        for observation in frame.observations() {
            let key = (frame.sensor_id.clone(), observation.object().track_id);
            let measured = observation.object().clone();

            let nth = occurrences.entry(key.1).or_insert(0);
            let existing = self
                .associations
                .get(&key)
                .and_then(|track_ids| track_ids.get(*nth))
                .copied()
                .filter(|track_id| !updated.contains(track_id));
            *nth += 1;
            match existing.and_then(|track_id| self.scene.track_mut(track_id)) {
                Some(track) => {
                    track.update_with_sensor_object(observation)?;
                    adopt_measurement(track.fused_object_mut(), &measured);
                    updated.insert(track.track_id());
                }
                None => {
                    let mut track = Track::new(Arc::clone(&self.context));
                    track.initialize(observation, false)?;
                    let track_id = track.track_id();
                    debug!(
                        track_id,
                        sensor_id = %frame.sensor_id,
                        sensor_track_id = key.1,
                        "created fusion track"
                    );
                    self.associations.entry(key).or_default().push(track_id);
                    self.scene.add_foreground_track(track);
                    updated.insert(track_id);
                }
            }
        }
        Ok(updated)
    }

    fn age_unmatched(&mut self, frame: &SensorFrame, updated: &HashSet<u64>) {
        for track in self.scene.foreground_tracks_mut() {
            if !updated.contains(&track.track_id()) {
                track.update_without_sensor_object(&frame.sensor_id, frame.timestamp);
            }
            track.prune_expired_observations();
            if !track.is_any_visible() {
                track.mark_dead();
            }
        }

        if self.scene.remove_dead_tracks() > 0 {
            let scene = &self.scene;
            self.associations.retain(|_, track_ids| {
                track_ids.retain(|track_id| scene.track(*track_id).is_some());
                !track_ids.is_empty()
            });
        }
    }

    fn publish(&self) -> Vec<FusedObject> {
        let mut objects: Vec<FusedObject> = self
            .scene
            .foreground_tracks()
            .iter()
            .map(|track| track.fused_object().clone())
            .collect();
        objects.sort_by_key(FusedObject::track_id);
        objects
    }
}

/// Latest measurement wins for geometry and kinematics.
fn adopt_measurement(fused: &mut FusedObject, measured: &DetectedObject) {
    let dst = &mut fused.object;
    dst.center = measured.center;
    dst.size = measured.size;
    dst.direction = measured.direction;
    dst.theta = measured.theta;
    dst.velocity = measured.velocity;
    dst.acceleration = measured.acceleration;
    dst.polygon = measured.polygon.clone();
    if measured.object_type != ObjectType::Unknown {
        dst.object_type = measured.object_type;
    }
}

impl FusionBackend for SensorTrackFusion {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn init(&mut self, options: &FusionInitOptions) -> Result<(), BackendError> {
        if options.main_sensor.is_empty() {
            return Err(BackendError::new("main sensor must not be empty"));
        }
        self.main_sensor = options.main_sensor.clone();
        self.initialized = true;
        Ok(())
    }

    fn fuse(
        &mut self,
        _options: &FusionOptions,
        frame: &SensorFrame,
    ) -> Result<Vec<FusedObject>, BackendError> {
        if !self.initialized {
            return Err(BackendError::new("backend used before init"));
        }
        frame.validate()?;

        let updated = self.associate(frame)?;
        self.age_unmatched(frame, &updated);

        if frame.sensor_id != self.main_sensor {
            return Ok(Vec::new());
        }
        Ok(self.publish())
    }
}
