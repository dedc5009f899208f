mod context;
mod fused_object;
mod rect;
mod scene;
mod sensor_object;
mod track;

pub use context::{TrackConfig, TrackContext};
pub use fused_object::FusedObject;
pub use rect::Rect;
pub use scene::Scene;
pub use sensor_object::{DetectedObject, ObjectType, SensorKind, SensorObservation, Supplement};
pub use track::{SensorObjectMap, Track};
