use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use ecolens::{
    prepare_frame, AnalysisPipeline, CameraFrame, Category, Classification, Classifier,
    ClassifierRegistry, FileConfig, FileSource, PreparedImage, Rotation, StubClassifier,
};

/// Classifier that always reports the same single label.
struct FixedClassifier {
    label: &'static str,
    confidence: f32,
}

impl Classifier for FixedClassifier {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn category(&self) -> Category {
        Category::Plant
    }

    fn classify(
        &mut self,
        _image: &PreparedImage,
        _rotation: Rotation,
    ) -> Result<Vec<Classification>> {
        Ok(vec![Classification::new(self.label, self.confidence)])
    }
}

/// Classifier that fails on its second invocation and recovers afterwards.
struct FlakyClassifier {
    calls: usize,
}

impl Classifier for FlakyClassifier {
    fn name(&self) -> &'static str {
        "flaky"
    }

    fn category(&self) -> Category {
        Category::Plant
    }

    fn classify(
        &mut self,
        _image: &PreparedImage,
        _rotation: Rotation,
    ) -> Result<Vec<Classification>> {
        let call = self.calls;
        self.calls += 1;
        if call == 1 {
            Err(anyhow!("inference backend unavailable"))
        } else {
            Ok(vec![Classification::new("rose", 0.9)])
        }
    }
}

/// Classifier that records what the pipeline hands it.
struct CapturingClassifier {
    seen: Arc<Mutex<Vec<(u32, Rotation, Vec<u8>)>>>,
}

impl Classifier for CapturingClassifier {
    fn name(&self) -> &'static str {
        "capturing"
    }

    fn category(&self) -> Category {
        Category::Plant
    }

    fn classify(
        &mut self,
        image: &PreparedImage,
        rotation: Rotation,
    ) -> Result<Vec<Classification>> {
        self.seen
            .lock()
            .unwrap()
            .push((image.size(), rotation, image.pixels().to_vec()));
        Ok(vec![Classification::new("captured", 1.0)])
    }
}

fn gradient_frame(width: u32, height: u32, rotation: Rotation) -> CameraFrame {
    let data = (0..(width * height * 3) as usize)
        .map(|i| (i % 251) as u8)
        .collect();
    CameraFrame::new(data, width, height, rotation)
}

fn collecting_sink(
    log: &Arc<Mutex<Vec<Vec<Classification>>>>,
) -> impl FnMut(Vec<Classification>) + Send + 'static {
    let log = Arc::clone(log);
    move |results: Vec<Classification>| {
        log.lock().unwrap().push(results);
    }
}

#[test]
fn first_frame_in_plant_mode_delivers_one_result() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let classifier = Arc::new(Mutex::new(FixedClassifier {
        label: "rose",
        confidence: 0.93,
    }));

    let mut pipeline = AnalysisPipeline::new(classifier, collecting_sink(&delivered));
    pipeline.on_frame(gradient_frame(640, 480, Rotation::Deg0));

    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0], vec![Classification::new("rose", 0.93)]);
}

#[test]
fn default_cadence_analyzes_every_sixtieth_frame() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let classifier = Arc::new(Mutex::new(FixedClassifier {
        label: "rose",
        confidence: 0.93,
    }));

    let mut pipeline = AnalysisPipeline::new(classifier, collecting_sink(&delivered));
    for _ in 0..60 {
        pipeline.on_frame(gradient_frame(640, 480, Rotation::Deg0));
    }
    assert_eq!(delivered.lock().unwrap().len(), 1);

    pipeline.on_frame(gradient_frame(640, 480, Rotation::Deg0));
    assert_eq!(delivered.lock().unwrap().len(), 2);
    assert_eq!(pipeline.frames_seen(), 61);
}

#[test]
fn classifier_failure_mid_stream_keeps_the_pipeline_alive() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let released = Arc::new(AtomicUsize::new(0));
    let classifier = Arc::new(Mutex::new(FlakyClassifier { calls: 0 }));

    let mut pipeline = AnalysisPipeline::new(classifier, collecting_sink(&delivered));
    for _ in 0..121 {
        let counter = Arc::clone(&released);
        let frame = gradient_frame(640, 480, Rotation::Deg0).with_release_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pipeline.on_frame(frame);
    }

    // Frames 0, 60 and 120 were analyzed; the second analysis failed.
    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 3);
    assert_eq!(delivered[0].len(), 1);
    assert!(delivered[1].is_empty());
    assert_eq!(delivered[2].len(), 1);
    assert_eq!(released.load(Ordering::SeqCst), 121);
}

#[test]
fn small_frames_are_letterboxed_to_the_crop_size() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let classifier = Arc::new(Mutex::new(CapturingClassifier {
        seen: Arc::clone(&seen),
    }));

    let mut pipeline = AnalysisPipeline::new(classifier, collecting_sink(&delivered));
    pipeline.on_frame(gradient_frame(200, 100, Rotation::Deg0));

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 321);
    assert_eq!(delivered.lock().unwrap().len(), 1);
}

#[test]
fn rotated_frames_reach_the_classifier_upright() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let classifier = Arc::new(Mutex::new(CapturingClassifier {
        seen: Arc::clone(&seen),
    }));

    let mut pipeline =
        AnalysisPipeline::new(classifier, collecting_sink(&delivered)).with_crop_size(32);
    pipeline.on_frame(gradient_frame(64, 48, Rotation::Deg90));

    let expected = prepare_frame(&gradient_frame(64, 48, Rotation::Deg90), 32).unwrap();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, 32);
    assert_eq!(seen[0].1, Rotation::Deg90);
    assert_eq!(seen[0].2, expected.pixels());
}

#[test]
fn malformed_frame_consumes_its_slot_without_delivery() {
    let delivered = Arc::new(Mutex::new(Vec::new()));
    let released = Arc::new(AtomicUsize::new(0));
    let classifier = Arc::new(Mutex::new(FixedClassifier {
        label: "rose",
        confidence: 0.93,
    }));

    let mut pipeline = AnalysisPipeline::new(classifier, collecting_sink(&delivered));
    for i in 0..61 {
        let counter = Arc::clone(&released);
        let frame = if i == 60 {
            // Truncated buffer for the claimed dimensions.
            CameraFrame::new(vec![0; 640 * 480 * 3 - 7], 640, 480, Rotation::Deg0)
        } else {
            gradient_frame(640, 480, Rotation::Deg0)
        };
        pipeline.on_frame(frame.with_release_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
    }

    // Frame 60 was on cadence but malformed: no delivery, still counted and released.
    assert_eq!(delivered.lock().unwrap().len(), 1);
    assert_eq!(released.load(Ordering::SeqCst), 61);
    assert_eq!(pipeline.frames_seen(), 61);
}

#[test]
fn registry_selects_classifiers_by_category() {
    let mut registry = ClassifierRegistry::new();
    for category in Category::ALL {
        registry.register(StubClassifier::new(category));
    }

    let bird = registry.select(Category::Bird).unwrap();
    assert_eq!(bird.lock().unwrap().category(), Category::Bird);

    let mut plant_only = ClassifierRegistry::new();
    plant_only.register(StubClassifier::new(Category::Plant));
    assert!(plant_only.select(Category::Bird).is_err());
}

#[test]
fn synthetic_source_end_to_end() {
    let mut registry = ClassifierRegistry::new();
    for category in Category::ALL {
        registry.register(StubClassifier::new(category));
    }
    let classifier = registry.select(Category::Plant).unwrap();

    let mut source = FileSource::new(FileConfig {
        path: "stub://garden".to_string(),
        ..FileConfig::default()
    })
    .unwrap();
    source.connect().unwrap();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let mut pipeline = AnalysisPipeline::new(classifier, collecting_sink(&delivered));

    for _ in 0..120 {
        let frame = source.next_frame().unwrap();
        pipeline.on_frame(frame);
    }

    let delivered = delivered.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    for results in delivered.iter() {
        assert_eq!(results.len(), 1);
        assert!((0.0..=1.0).contains(&results[0].confidence));
    }
    assert_eq!(source.stats().frames_captured, 120);
}
