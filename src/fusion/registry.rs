//! Name-keyed constructors for fusion backends.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::error::FusionError;
use crate::fusion::backend::FusionBackend;
use crate::fusion::sensor_track::SensorTrackFusion;

/// Constructs a fresh, uninitialized backend.
pub type BackendConstructor = Box<dyn Fn() -> Box<dyn FusionBackend> + Send + Sync>;

/// Maps a fusion method name to a backend constructor.
///
/// Populate it at startup, then share it with dispatchers, which select a
/// method by the `fusion_method` of their [`FusionParams`](crate::FusionParams).
#[derive(Default)]
pub struct FusionRegistry {
    constructors: BTreeMap<String, BackendConstructor>,
}

impl FusionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the backends shipped with this crate.
    pub fn with_builtin_methods() -> Self {
        let mut registry = Self::new();
        registry.constructors.insert(
            SensorTrackFusion::NAME.to_owned(),
            Box::new(|| Box::new(SensorTrackFusion::new()) as Box<dyn FusionBackend>),
        );
        registry
    }

    /// Register `constructor` under `name`. Names are unique.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> Result<(), FusionError>
    where
        F: Fn() -> Box<dyn FusionBackend> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(FusionError::DuplicateMethod(name));
        }
        debug!(method = %name, "registered fusion method");
        self.constructors.insert(name, Box::new(constructor));
        Ok(())
    }

    /// True iff a constructor is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered method names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Construct a new backend registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn FusionBackend>> {
        self.constructors.get(name).map(|constructor| constructor())
    }
}

impl fmt::Debug for FusionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FusionRegistry")
            .field("methods", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_methods() {
        let registry = FusionRegistry::with_builtin_methods();
        assert!(registry.contains(SensorTrackFusion::NAME));
        let backend = registry.create(SensorTrackFusion::NAME).unwrap();
        assert_eq!(backend.name(), SensorTrackFusion::NAME);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut registry = FusionRegistry::with_builtin_methods();
        let result = registry.register(SensorTrackFusion::NAME, || {
            Box::new(SensorTrackFusion::new()) as Box<dyn FusionBackend>
        });
        assert!(matches!(result, Err(FusionError::DuplicateMethod(_))));
    }

    #[test]
    fn test_unknown_name_creates_nothing() {
        let registry = FusionRegistry::new();
        assert!(registry.create("probabilistic").is_none());
        assert_eq!(registry.names().count(), 0);
    }
}
