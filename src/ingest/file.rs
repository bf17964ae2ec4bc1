//! Local file frame source.
//!
//! This module provides `FileSource` for feeding the analysis pipeline from
//! local material. The file source is responsible for:
//! - Producing `CameraFrame` instances from a local directory of stills
//!   (feature: ingest-image) or from a synthetic generator (stub://)
//! - Stamping each frame with the configured sensor rotation
//! - Enforcing that at most one frame is in flight at a time
//!
//! The file source MUST NOT:
//! - Fetch remote URLs
//! - Hand out a new frame while the previous one is unreleased
//! - Analyze frame content itself

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::frame::{CameraFrame, Rotation};

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local path: a directory of JPEG stills, or "stub://..." for the
    /// synthetic generator.
    pub path: String,
    /// Target frame rate (frames per second). Callers pace delivery to this.
    pub target_fps: u32,
    /// Sensor rotation stamped on every produced frame.
    pub rotation: Rotation,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            target_fps: 10,
            rotation: Rotation::Deg0,
        }
    }
}

/// Local file frame source.
pub struct FileSource {
    backend: FileBackend,
    rotation: Rotation,
    in_flight: Arc<AtomicBool>,
}

enum FileBackend {
    Synthetic(SyntheticSource),
    #[cfg(feature = "ingest-image")]
    Image(ImageDirSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file ingestion only supports local paths (no URL schemes)"
            ));
        }
        let rotation = config.rotation;
        let backend = if config.path.starts_with("stub://") {
            FileBackend::Synthetic(SyntheticSource::new(config))
        } else {
            #[cfg(feature = "ingest-image")]
            {
                FileBackend::Image(ImageDirSource::new(config))
            }
            #[cfg(not(feature = "ingest-image"))]
            {
                return Err(anyhow!("image ingestion requires the ingest-image feature"));
            }
        };
        Ok(Self {
            backend,
            rotation,
            in_flight: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Connect to the file source.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-image")]
            FileBackend::Image(source) => source.connect(),
        }
    }

    /// Capture the next frame.
    ///
    /// Fails while the previously captured frame is still alive. The
    /// returned frame carries a release hook that re-arms the source when
    /// it drops.
    pub fn next_frame(&mut self) -> Result<CameraFrame> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(anyhow!("previous frame has not been released"));
        }

        let frame = match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame(self.rotation),
            #[cfg(feature = "ingest-image")]
            FileBackend::Image(source) => source.next_frame(self.rotation),
        };

        match frame {
            Ok(frame) => {
                let slot = Arc::clone(&self.in_flight);
                Ok(frame.with_release_hook(move || {
                    slot.store(false, Ordering::SeqCst);
                }))
            }
            Err(err) => {
                self.in_flight.store(false, Ordering::SeqCst);
                Err(err)
            }
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            FileBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-image")]
            FileBackend::Image(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        match &self.backend {
            FileBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-image")]
            FileBackend::Image(source) => source.stats(),
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_captured: u64,
    pub path: String,
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://) for tests and model-less runs
// ----------------------------------------------------------------------------

struct SyntheticSource {
    config: FileConfig,
    frame_count: u64,
    scene_state: u8,
}

impl SyntheticSource {
    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    fn new(config: FileConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            scene_state: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: connected to {} (synthetic)", self.config.path);
        Ok(())
    }

    fn next_frame(&mut self, rotation: Rotation) -> Result<CameraFrame> {
        self.frame_count += 1;
        let pixels = self.generate_synthetic_pixels();
        Ok(CameraFrame::new(
            pixels,
            Self::WIDTH,
            Self::HEIGHT,
            rotation,
        ))
    }

    fn generate_synthetic_pixels(&mut self) -> Vec<u8> {
        let pixel_count = (Self::WIDTH * Self::HEIGHT * 3) as usize;
        if self.frame_count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.scene_state as u64) % 256) as u8;
        }
        pixels
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

// ----------------------------------------------------------------------------
// Image directory source (feature: ingest-image)
// ----------------------------------------------------------------------------

#[cfg(feature = "ingest-image")]
struct ImageDirSource {
    config: FileConfig,
    files: Vec<std::path::PathBuf>,
    next_index: usize,
    frame_count: u64,
}

#[cfg(feature = "ingest-image")]
impl ImageDirSource {
    fn new(config: FileConfig) -> Self {
        Self {
            config,
            files: Vec::new(),
            next_index: 0,
            frame_count: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        use anyhow::Context;

        let mut files = Vec::new();
        let entries = std::fs::read_dir(&self.config.path)
            .with_context(|| format!("failed to read image directory {}", self.config.path))?;
        for entry in entries {
            let path = entry?.path();
            let is_jpeg = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
                .unwrap_or(false);
            if is_jpeg {
                files.push(path);
            }
        }
        files.sort();
        if files.is_empty() {
            return Err(anyhow!("no JPEG files found in {}", self.config.path));
        }
        log::info!(
            "FileSource: connected to {} ({} stills)",
            self.config.path,
            files.len()
        );
        self.files = files;
        self.next_index = 0;
        Ok(())
    }

    fn next_frame(&mut self, rotation: Rotation) -> Result<CameraFrame> {
        use anyhow::Context;

        if self.files.is_empty() {
            return Err(anyhow!("image source is not connected"));
        }
        let path = &self.files[self.next_index];
        self.next_index = (self.next_index + 1) % self.files.len();
        self.frame_count += 1;

        let decoded = image::open(path)
            .with_context(|| format!("failed to decode {}", path.display()))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        Ok(CameraFrame::new(decoded.into_raw(), width, height, rotation))
    }

    fn is_healthy(&self) -> bool {
        !self.files.is_empty()
    }

    fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}
