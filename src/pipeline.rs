//! Frame analysis pipeline.
//!
//! The pipeline sits between a frame source and a result sink. For every
//! frame handed to it, it:
//! - Consults the cadence gate and drops off-cadence frames outright
//! - Prepares accepted frames (rotation upright, square center crop)
//! - Runs the active classifier on the prepared image
//! - Delivers the outcome to the single registered sink
//!
//! Every frame is released when `on_frame` returns, on every path. The
//! pipeline MUST NOT:
//! - Retain frame buffers past the `on_frame` call
//! - Deliver results for frames that failed preparation
//! - Treat classifier failure as fatal

use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};

use crate::classify::{Classification, Classifier};
use crate::frame::{CameraFrame, Rotation};
use crate::gate::{DEFAULT_CADENCE, FrameGate};
use crate::preprocess::{prepare_frame, DEFAULT_CROP_SIZE, PreparedImage};

/// Receiver for classification outcomes.
///
/// The pipeline delivers exactly one call per accepted, well-formed frame.
/// A classifier failure surfaces as an empty result list, not as a missing
/// call.
pub trait ResultSink: Send {
    fn on_results(&mut self, results: Vec<Classification>);
}

impl<F> ResultSink for F
where
    F: FnMut(Vec<Classification>) + Send,
{
    fn on_results(&mut self, results: Vec<Classification>) {
        self(results)
    }
}

/// Cadence-gated analysis pipeline.
///
/// Owns the frame counter, so cadence survives classifier swaps. Callers
/// need `&mut` to feed frames, which keeps frame handling serial without
/// any locking of its own.
pub struct AnalysisPipeline {
    gate: FrameGate,
    classifier: Arc<Mutex<dyn Classifier>>,
    sink: Box<dyn ResultSink>,
    crop_size: u32,
}

impl AnalysisPipeline {
    /// Build a pipeline with the default cadence and crop size.
    pub fn new(classifier: Arc<Mutex<dyn Classifier>>, sink: impl ResultSink + 'static) -> Self {
        Self {
            gate: FrameGate::with_cadence(DEFAULT_CADENCE),
            classifier,
            sink: Box::new(sink),
            crop_size: DEFAULT_CROP_SIZE,
        }
    }

    /// Override the sampling cadence. A cadence of `n` analyzes every n-th
    /// frame, starting with the first.
    pub fn with_cadence(mut self, cadence: u32) -> Self {
        self.gate = FrameGate::with_cadence(cadence);
        self
    }

    /// Override the square crop size handed to the classifier.
    pub fn with_crop_size(mut self, crop_size: u32) -> Self {
        self.crop_size = crop_size;
        self
    }

    /// Swap the active classifier. The frame counter is unaffected, so the
    /// sampling rhythm carries across category switches.
    pub fn set_classifier(&mut self, classifier: Arc<Mutex<dyn Classifier>>) {
        self.classifier = classifier;
    }

    /// Total frames observed, accepted or not.
    pub fn frames_seen(&self) -> u64 {
        self.gate.frames_seen()
    }

    /// Feed one frame through the pipeline.
    ///
    /// Takes the frame by value; its release hook fires when this call
    /// returns, after any result delivery. Off-cadence frames are counted
    /// and released without further work.
    pub fn on_frame(&mut self, frame: CameraFrame) {
        if !self.gate.should_process() {
            return;
        }

        let image = match prepare_frame(&frame, self.crop_size) {
            Ok(image) => image,
            Err(err) => {
                log::warn!("frame rejected by preprocessing: {}", err);
                return;
            }
        };

        let results = match self.run_classifier(&image, frame.rotation) {
            Ok(results) => results,
            Err(err) => {
                log::warn!("classification failed: {}", err);
                Vec::new()
            }
        };

        self.sink.on_results(results);
    }

    fn run_classifier(
        &mut self,
        image: &PreparedImage,
        rotation: Rotation,
    ) -> Result<Vec<Classification>> {
        let mut classifier = self
            .classifier
            .lock()
            .map_err(|_| anyhow!("classifier lock poisoned"))?;
        classifier.classify(image, rotation)
    }
}
