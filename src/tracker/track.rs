//! Fusion track: per-sensor observations plus one fused object.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::TrackError;
use crate::tracker::context::{TrackConfig, TrackContext};
use crate::tracker::fused_object::FusedObject;
use crate::tracker::sensor_object::{SensorKind, SensorObservation};

/// Latest observation per sensor id within one modality.
pub type SensorObjectMap = BTreeMap<String, SensorObservation>;

fn clamp_probability(prob: f64) -> f64 {
    if prob.is_nan() {
        0.0
    } else {
        prob.clamp(0.0, 1.0)
    }
}

/// One tracked physical object.
///
/// The fusion backend owns its tracks and is the only writer during a cycle.
/// Updating a track after [`Track::mark_dead`] is a backend bug; the track
/// does not guard against it.
#[derive(Debug)]
pub struct Track {
    context: Arc<TrackContext>,
    lidar_objects: SensorObjectMap,
    radar_objects: SensorObjectMap,
    camera_objects: SensorObjectMap,
    fused_object: FusedObject,
    /// Seconds between the first and the latest absorbed measurement
    tracking_period: f64,
    existence_probability: f64,
    /// Probability of being an obstacle the ego vehicle has to avoid
    toic_probability: f64,
    is_background: bool,
    is_alive: bool,
    tracked_times: usize,
}

impl Track {
    /// Create an empty, uninitialized track (track id 0).
    pub fn new(context: Arc<TrackContext>) -> Self {
        Self {
            context,
            lidar_objects: SensorObjectMap::new(),
            radar_objects: SensorObjectMap::new(),
            camera_objects: SensorObjectMap::new(),
            fused_object: FusedObject::default(),
            tracking_period: 0.0,
            existence_probability: 0.0,
            toic_probability: 0.0,
            is_background: false,
            is_alive: true,
            tracked_times: 0,
        }
    }

    /// Bind the first observation and assign a fresh track id.
    ///
    /// On error the track is left untouched and no id is consumed.
    pub fn initialize(
        &mut self,
        observation: SensorObservation,
        is_background: bool,
    ) -> Result<(), TrackError> {
        observation.validate()?;
        self.reset();

        let config = self.context.config();
        let track_id = self.context.generate_new_track_id();
        self.is_background = is_background;
        self.existence_probability = clamp_probability(config.initial_existence_probability);

        self.fused_object = FusedObject {
            object: observation.object().clone(),
            latest_tracked_time: observation.timestamp(),
            ..FusedObject::default()
        };
        self.fused_object.object.track_id = track_id;

        self.update_with_sensor_object(observation)
    }

    /// Clear all observations and state; the track id returns to 0.
    pub fn reset(&mut self) {
        self.lidar_objects.clear();
        self.radar_objects.clear();
        self.camera_objects.clear();
        self.fused_object = FusedObject::default();
        self.tracking_period = 0.0;
        self.existence_probability = 0.0;
        self.toic_probability = 0.0;
        self.is_background = false;
        self.is_alive = true;
        self.tracked_times = 0;
    }

    /// Absorb a matched measurement.
    ///
    /// Replaces the sensor's previous observation and makes that sensor
    /// visible again. How much the measurement moves the existence
    /// probability or the fused kinematics is left to the backend.
    pub fn update_with_sensor_object(
        &mut self,
        observation: SensorObservation,
    ) -> Result<(), TrackError> {
        observation.validate()?;
        let timestamp = observation.timestamp();
        let sensor_id = observation.sensor_id().to_owned();

        // The only fallible step runs before any state changes.
        let mut stored = observation.clone();
        stored.set_invisible_period(0.0);
        let objects = self.objects_mut(observation.sensor_kind()).ok_or_else(|| {
            TrackError::invalid_observation(format!("sensor `{sensor_id}` has no modality bucket"))
        })?;
        objects.insert(sensor_id.clone(), stored);

        self.age_other_sensors(&sensor_id, timestamp);
        self.tracking_period += (timestamp - self.fused_object.latest_tracked_time).max(0.0);
        self.fused_object.latest_tracked_time = self.fused_object.latest_tracked_time.max(timestamp);
        self.tracked_times += 1;
        self.is_alive = true;

        if self.is_background {
            self.update_with_sensor_object_for_background(&observation);
        } else {
            self.update_supplement_state(Some(&observation));
            self.update_unfused_state(&observation);
        }

        trace!(
            track_id = self.track_id(),
            sensor_id = %sensor_id,
            timestamp,
            "track updated with measurement"
        );
        Ok(())
    }

    /// Age the observation from `sensor_id` to `timestamp` without a new
    /// measurement. No observation is created or replaced.
    ///
    /// Foreground tracks also keep aging sensors that already lost the
    /// object. Background tracks only age the named sensor and tolerate
    /// longer gaps (see [`TrackConfig::background_period_scale`]).
    pub fn update_without_sensor_object(&mut self, sensor_id: &str, timestamp: f64) {
        let is_background = self.is_background;
        for objects in [
            &mut self.lidar_objects,
            &mut self.radar_objects,
            &mut self.camera_objects,
        ] {
            for (id, slot) in objects.iter_mut() {
                let period = (timestamp - slot.timestamp()).max(0.0);
                if id == sensor_id || (!is_background && slot.invisible_period() > 0.0) {
                    slot.set_invisible_period(period);
                }
            }
        }

        if !is_background {
            self.update_supplement_state(None);
        }
    }

    /// Remove observations that have been invisible past their modality's
    /// period. Returns how many were dropped.
    pub fn prune_expired_observations(&mut self) -> usize {
        let config = self.context.config();
        let scale = self.period_scale(&config);
        let mut removed = 0;
        for objects in [
            &mut self.lidar_objects,
            &mut self.radar_objects,
            &mut self.camera_objects,
        ] {
            let before = objects.len();
            objects.retain(|_, slot| slot_visible(slot, &config, scale));
            removed += before - objects.len();
        }

        if removed > 0 && !self.is_background {
            self.update_supplement_state(None);
        }
        removed
    }

    /// Observation currently held for `sensor_id`, in any modality.
    pub fn sensor_object(&self, sensor_id: &str) -> Option<&SensorObservation> {
        self.lidar_objects
            .get(sensor_id)
            .or_else(|| self.radar_objects.get(sensor_id))
            .or_else(|| self.camera_objects.get(sensor_id))
    }

    /// Most recent lidar observation across lidar sensors.
    pub fn latest_lidar_object(&self) -> Option<&SensorObservation> {
        latest_sensor_object(&self.lidar_objects)
    }

    /// Most recent radar observation across radar sensors.
    pub fn latest_radar_object(&self) -> Option<&SensorObservation> {
        latest_sensor_object(&self.radar_objects)
    }

    /// Most recent camera observation across cameras.
    pub fn latest_camera_object(&self) -> Option<&SensorObservation> {
        latest_sensor_object(&self.camera_objects)
    }

    /// Seconds since `sensor_id` last reported this object, if it ever did.
    pub fn invisible_period(&self, sensor_id: &str) -> Option<f64> {
        self.sensor_object(sensor_id)
            .map(SensorObservation::invisible_period)
    }

    /// True iff `sensor_id` holds an observation whose age is within its
    /// modality's invisible period.
    pub fn is_visible(&self, sensor_id: &str) -> bool {
        let config = self.context.config();
        let scale = self.period_scale(&config);
        self.sensor_object(sensor_id)
            .is_some_and(|slot| slot_visible(slot, &config, scale))
    }

    /// True iff any lidar sensor still sees the object.
    pub fn is_lidar_visible(&self) -> bool {
        self.any_visible(&self.lidar_objects)
    }

    /// True iff any radar sensor still sees the object.
    pub fn is_radar_visible(&self) -> bool {
        self.any_visible(&self.radar_objects)
    }

    /// True iff any camera still sees the object.
    pub fn is_camera_visible(&self) -> bool {
        self.any_visible(&self.camera_objects)
    }

    /// True iff at least one modality still sees the object.
    pub fn is_any_visible(&self) -> bool {
        self.is_lidar_visible() || self.is_radar_visible() || self.is_camera_visible()
    }

    /// Fusion track id, 0 until initialized.
    pub fn track_id(&self) -> u64 {
        self.fused_object.track_id()
    }

    /// Fused estimate published for this track.
    pub fn fused_object(&self) -> &FusedObject {
        &self.fused_object
    }

    /// Mutable access for the backend's estimation step. The backend must
    /// not rewrite `object.track_id`.
    pub fn fused_object_mut(&mut self) -> &mut FusedObject {
        &mut self.fused_object
    }

    /// Lidar observations keyed by sensor id.
    pub fn lidar_objects(&self) -> &SensorObjectMap {
        &self.lidar_objects
    }

    /// Radar observations keyed by sensor id.
    pub fn radar_objects(&self) -> &SensorObjectMap {
        &self.radar_objects
    }

    /// Camera observations keyed by sensor id.
    pub fn camera_objects(&self) -> &SensorObjectMap {
        &self.camera_objects
    }

    /// Seconds between the first and the latest measurement.
    pub fn tracking_period(&self) -> f64 {
        self.tracking_period
    }

    /// Number of measurements absorbed since initialization.
    pub fn tracked_times(&self) -> usize {
        self.tracked_times
    }

    /// Probability that the object exists, in [0, 1].
    pub fn existence_probability(&self) -> f64 {
        self.existence_probability
    }

    /// Set the existence probability, clamped to [0, 1]. NaN becomes 0.
    pub fn set_existence_probability(&mut self, prob: f64) {
        self.existence_probability = clamp_probability(prob);
    }

    /// Probability that the object is an obstacle to avoid, in [0, 1].
    pub fn toic_probability(&self) -> f64 {
        self.toic_probability
    }

    /// Set the obstacle probability, clamped to [0, 1]. NaN becomes 0.
    pub fn set_toic_probability(&mut self, prob: f64) {
        self.toic_probability = clamp_probability(prob);
    }

    /// True for static background tracks.
    pub fn is_background(&self) -> bool {
        self.is_background
    }

    /// False once the backend marked the track dead.
    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    /// Flag the track for removal from the scene.
    pub fn mark_dead(&mut self) {
        self.is_alive = false;
    }

    fn period_scale(&self, config: &TrackConfig) -> f64 {
        if self.is_background {
            config.background_period_scale
        } else {
            1.0
        }
    }

    fn objects_mut(&mut self, kind: SensorKind) -> Option<&mut SensorObjectMap> {
        match kind {
            SensorKind::Lidar => Some(&mut self.lidar_objects),
            SensorKind::Radar => Some(&mut self.radar_objects),
            SensorKind::Camera => Some(&mut self.camera_objects),
            SensorKind::Unknown => None,
        }
    }

    fn any_visible(&self, objects: &SensorObjectMap) -> bool {
        let config = self.context.config();
        let scale = self.period_scale(&config);
        objects
            .values()
            .any(|slot| slot_visible(slot, &config, scale))
    }

    /// Other sensors keep aging relative to a fresh measurement.
    fn age_other_sensors(&mut self, sensor_id: &str, timestamp: f64) {
        for objects in [
            &mut self.lidar_objects,
            &mut self.radar_objects,
            &mut self.camera_objects,
        ] {
            for (id, slot) in objects.iter_mut() {
                if id != sensor_id {
                    let period = (timestamp - slot.timestamp()).max(slot.invisible_period());
                    slot.set_invisible_period(period);
                }
            }
        }
    }

    /// Take the measured modality's supplement and drop supplements of
    /// modalities that no longer hold any observation.
    fn update_supplement_state(&mut self, src: Option<&SensorObservation>) {
        let src_kind = src.map(SensorObservation::sensor_kind);
        for kind in [SensorKind::Lidar, SensorKind::Radar, SensorKind::Camera] {
            let bucket_empty = match kind {
                SensorKind::Lidar => self.lidar_objects.is_empty(),
                SensorKind::Radar => self.radar_objects.is_empty(),
                SensorKind::Camera => self.camera_objects.is_empty(),
                SensorKind::Unknown => true,
            };
            let Some(slot) = self.fused_object.supplement_slot_mut(kind) else {
                continue;
            };
            if src_kind == Some(kind) {
                *slot = src.and_then(|obs| obs.object().supplement.clone());
            } else if bucket_empty {
                *slot = None;
            }
        }
    }

    /// Copy the fields the backend does not estimate itself.
    fn update_unfused_state(&mut self, src: &SensorObservation) {
        let dst = &mut self.fused_object.object;
        let measured = src.object();
        match src.sensor_kind() {
            SensorKind::Lidar => {
                dst.confidence = measured.confidence;
                dst.velocity_converged = measured.velocity_converged;
            }
            SensorKind::Camera => dst.confidence = measured.confidence,
            SensorKind::Radar | SensorKind::Unknown => {}
        }
    }

    /// Static objects take the measurement as-is, keeping the track id.
    fn update_with_sensor_object_for_background(&mut self, src: &SensorObservation) {
        let track_id = self.track_id();
        self.fused_object.object = src.object().clone();
        self.fused_object.object.track_id = track_id;
        self.fused_object.clear_supplements();
        if let Some(slot) = self.fused_object.supplement_slot_mut(src.sensor_kind()) {
            *slot = src.object().supplement.clone();
        }
    }
}

fn slot_visible(slot: &SensorObservation, config: &TrackConfig, scale: f64) -> bool {
    config
        .max_invisible_period(slot.sensor_kind())
        .is_some_and(|max_period| slot.invisible_period() <= max_period * scale)
}

fn latest_sensor_object(objects: &SensorObjectMap) -> Option<&SensorObservation> {
    objects
        .values()
        .max_by(|a, b| a.timestamp().total_cmp(&b.timestamp()))
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = |objects: &SensorObjectMap| {
            objects.keys().cloned().collect::<Vec<_>>().join(",")
        };
        write!(
            f,
            "track {}: background={} alive={} existence={:.3} toic={:.3} tracked_times={} \
             tracking_period={:.3} lidar=[{}] radar=[{}] camera=[{}]",
            self.track_id(),
            self.is_background,
            self.is_alive,
            self.existence_probability,
            self.toic_probability,
            self.tracked_times,
            self.tracking_period,
            ids(&self.lidar_objects),
            ids(&self.radar_objects),
            ids(&self.camera_objects),
        )
    }
}
