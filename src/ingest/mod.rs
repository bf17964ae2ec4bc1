//! Frame acquisition sources.
//!
//! This module provides sources that feed the analysis pipeline:
//! - Local directories of JPEG stills (feature: ingest-image)
//! - Stub source (testing, model-less runs)
//!
//! All sources produce `CameraFrame` instances and hand them out one at a
//! time. The acquisition layer is responsible for:
//! - Stamping the sensor rotation on every frame
//! - Enforcing single-frame-in-flight delivery
//!
//! The acquisition layer MUST NOT:
//! - Fetch frames over the network
//! - Inspect or classify frame content

pub mod file;

pub use file::{FileConfig, FileSource, FileStats};
