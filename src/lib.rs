//! EcoLens
//!
//! This crate implements an on-device nature classification pipeline: frames
//! come in from a camera-like source, a small fraction of them is analyzed,
//! and classification results flow to a single registered sink.
//!
//! # Architecture
//!
//! The pipeline enforces a handful of contracts by construction:
//!
//! 1. **Cadence Gating**: Only every n-th frame (default 60) is analyzed;
//!    the rest are counted and dropped.
//! 2. **Upright Analysis**: Frames are rotated to sensor-upright form before
//!    a square center crop (default 321x321) is handed to the classifier.
//! 3. **Unconditional Release**: Every frame is released when handling ends,
//!    whether it was analyzed, dropped, malformed, or the classifier failed.
//! 4. **Serial Handling**: One frame at a time; feeding the pipeline takes
//!    `&mut`, so overlapping analysis cannot be expressed.
//! 5. **Non-Fatal Classification**: Classifier errors surface as empty
//!    result lists, never as pipeline failures.
//!
//! # Module Structure
//!
//! - `frame`: Frame type with rotation metadata and release hooks
//! - `gate`: Cadence gate owning the frame counter
//! - `preprocess`: Rotation and center-crop into classifier input
//! - `classify`: Classifier capability, per-category backends, registry
//! - `pipeline`: Gate + preprocess + classify + sink orchestration
//! - `ingest`: Frame sources (local stills, synthetic stub)
//! - `config`: Daemon configuration (file + environment)

pub mod classify;
pub mod config;
pub mod frame;
pub mod gate;
pub mod ingest;
pub mod pipeline;
pub mod preprocess;

pub use classify::{Category, Classification, Classifier, ClassifierRegistry, StubClassifier};
pub use config::{BackendKind, EcolensConfig};
pub use frame::{CameraFrame, ReleaseHook, Rotation};
pub use gate::{DEFAULT_CADENCE, FrameGate};
pub use ingest::{FileConfig, FileSource, FileStats};
pub use pipeline::{AnalysisPipeline, ResultSink};
pub use preprocess::{prepare_frame, DEFAULT_CROP_SIZE, PreparedImage};

#[cfg(feature = "backend-tract")]
pub use classify::TractClassifier;
