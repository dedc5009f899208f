use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use obstacle_fusion::{
    BackendError, DispatcherState, FusedObject, FusionBackend, FusionDispatcher, FusionError,
    FusionInitOptions, FusionOptions, FusionParams, FusionRegistry, ObjectBuilder, SensorFrame,
    SensorKind, SensorTrackFusion,
};

/// Publishes every detection of the frame unchanged.
#[derive(Default)]
struct StubBackend {
    main_sensor: Option<String>,
}

impl FusionBackend for StubBackend {
    fn name(&self) -> &str {
        "stub"
    }

    fn init(&mut self, options: &FusionInitOptions) -> Result<(), BackendError> {
        self.main_sensor = Some(options.main_sensor.clone());
        Ok(())
    }

    fn fuse(
        &mut self,
        _options: &FusionOptions,
        frame: &SensorFrame,
    ) -> Result<Vec<FusedObject>, BackendError> {
        Ok(frame
            .objects
            .iter()
            .map(|object| FusedObject {
                object: object.clone(),
                latest_tracked_time: frame.timestamp,
                ..FusedObject::default()
            })
            .collect())
    }
}

fn stub_registry(constructed: Arc<AtomicUsize>) -> Arc<FusionRegistry> {
    let mut registry = FusionRegistry::with_builtin_methods();
    registry
        .register("stub", move || {
            constructed.fetch_add(1, Ordering::SeqCst);
            Box::new(StubBackend::default()) as Box<dyn FusionBackend>
        })
        .unwrap();
    Arc::new(registry)
}

fn lidar_frame(timestamp: f64) -> SensorFrame {
    SensorFrame::new("lidar128", SensorKind::Lidar, timestamp).with_object(
        ObjectBuilder::new()
            .track_id(11)
            .center(12.0, -3.5, 0.8)
            .size(4.5, 1.9, 1.6)
            .velocity(5.0, 0.0, 0.0)
            .build(),
    )
}

#[test]
fn test_stub_backend_round_trip() {
    let mut dispatcher = FusionDispatcher::new(stub_registry(Arc::default()));
    dispatcher
        .init(&FusionParams::new("lidar128", "stub"))
        .unwrap();

    let frame = lidar_frame(0.0);
    let objects = dispatcher.process(&frame).unwrap();

    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].object, frame.objects[0]);
    assert_eq!(dispatcher.backend_name(), Some("stub"));
    assert_eq!(dispatcher.stats().processed_frames, 1);
}

#[test]
fn test_unknown_method_fails_init() {
    let mut dispatcher = FusionDispatcher::new(stub_registry(Arc::default()));

    let result = dispatcher.init(&FusionParams::new("lidar128", "probabilistic"));

    assert!(matches!(result, Err(FusionError::UnknownMethod(name)) if name == "probabilistic"));
    assert_ne!(dispatcher.state(), DispatcherState::Initialized);
    assert!(matches!(
        dispatcher.process(&lidar_frame(0.0)),
        Err(FusionError::NotInitialized)
    ));
    assert_eq!(dispatcher.stats().processed_frames, 0);
}

#[test]
fn test_process_before_init_fails() {
    let mut dispatcher = FusionDispatcher::new(stub_registry(Arc::default()));

    assert_eq!(dispatcher.state(), DispatcherState::Uninitialized);
    assert!(matches!(
        dispatcher.process(&lidar_frame(0.0)),
        Err(FusionError::NotInitialized)
    ));
    assert_eq!(dispatcher.state(), DispatcherState::Uninitialized);
}

#[test]
fn test_repeated_init_constructs_one_backend() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let mut dispatcher = FusionDispatcher::new(stub_registry(Arc::clone(&constructed)));
    let params = FusionParams::new("lidar128", "stub");

    dispatcher.init(&params).unwrap();
    dispatcher.init(&params).unwrap();

    assert_eq!(constructed.load(Ordering::SeqCst), 1);
    assert_eq!(dispatcher.state(), DispatcherState::Initialized);
}

#[test]
fn test_builtin_backend_through_dispatcher() {
    let registry = Arc::new(FusionRegistry::with_builtin_methods());
    let mut dispatcher = FusionDispatcher::new(registry);
    dispatcher
        .init(&FusionParams::new("lidar128", SensorTrackFusion::NAME))
        .unwrap();

    let first = dispatcher.process(&lidar_frame(0.0)).unwrap();
    let second = dispatcher.process(&lidar_frame(0.1)).unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].track_id(), second[0].track_id());
    assert_eq!(second[0].object.size.x, 4.5);

    // Nothing seen by the lidar for longer than its period
    let empty = SensorFrame::new("lidar128", SensorKind::Lidar, 0.5);
    assert!(dispatcher.process(&empty).unwrap().is_empty());
}

#[test]
fn test_builtin_backend_rejects_empty_main_sensor() {
    let registry = Arc::new(FusionRegistry::with_builtin_methods());
    let mut dispatcher = FusionDispatcher::new(registry);

    let result = dispatcher.init(&FusionParams::new("", SensorTrackFusion::NAME));

    assert!(matches!(result, Err(FusionError::BackendInit { .. })));
    assert_eq!(dispatcher.state(), DispatcherState::FailedInit);
    assert!(dispatcher.process(&lidar_frame(0.0)).is_err());
}

#[test]
fn test_builtin_backend_keeps_untracked_detections_apart() {
    let registry = Arc::new(FusionRegistry::with_builtin_methods());
    let mut dispatcher = FusionDispatcher::new(registry);
    dispatcher
        .init(&FusionParams::new("lidar128", SensorTrackFusion::NAME))
        .unwrap();
    let frame = SensorFrame::new("lidar128", SensorKind::Lidar, 0.0)
        .with_object(ObjectBuilder::new().center(5.0, 0.0, 0.0).build())
        .with_object(ObjectBuilder::new().center(50.0, 0.0, 0.0).build());

    let fused = dispatcher.process(&frame).unwrap();

    let centers: Vec<f64> = fused.iter().map(|obj| obj.object.center.x).collect();
    assert_eq!(centers, vec![5.0, 50.0]);
}
