//! Camera frame lifecycle.
//!
//! A `CameraFrame` is one capture delivered for analysis. The producer owns
//! the underlying buffer slot and will not deliver the next frame until the
//! current one has been released, so the frame carries a release hook that
//! MUST fire exactly once, on every path.
//!
//! Rather than asking every caller to remember an explicit close call, the
//! release signal rides on `Drop`: `AnalysisPipeline::on_frame` consumes the
//! frame by value and the hook fires when the frame goes out of scope,
//! accepted, dropped, or failed alike, including during unwind.

use anyhow::{anyhow, Result};

/// Orientation correction for a captured frame.
///
/// The camera subsystem reports how far the sensor image must be rotated
/// clockwise to appear upright. Only the four square rotations exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Parse a rotation from degrees as reported by the camera subsystem.
    pub fn from_degrees(degrees: u32) -> Result<Self> {
        match degrees {
            0 => Ok(Rotation::Deg0),
            90 => Ok(Rotation::Deg90),
            180 => Ok(Rotation::Deg180),
            270 => Ok(Rotation::Deg270),
            other => Err(anyhow!(
                "unsupported rotation {} degrees (expected 0/90/180/270)",
                other
            )),
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }

    /// True when this rotation swaps the width and height of a frame.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Deg90 | Rotation::Deg270)
    }
}

/// Callback invoked exactly once when a frame's buffer may be reused.
pub type ReleaseHook = Box<dyn FnOnce() + Send>;

/// One camera capture: an RGB24 pixel buffer plus its capture metadata.
///
/// The pixel buffer is expected to hold `width * height * 3` bytes in
/// row-major RGB order. Construction does not validate this; a mismatched
/// buffer is caught by preprocessing and treated as a malformed frame.
pub struct CameraFrame {
    /// Private pixel data; read through [`CameraFrame::pixels`].
    data: Vec<u8>,

    /// Frame dimensions before rotation correction.
    pub width: u32,
    pub height: u32,

    /// Clockwise correction to apply before analysis.
    pub rotation: Rotation,

    release_hook: Option<ReleaseHook>,
}

impl CameraFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, rotation: Rotation) -> Self {
        Self {
            data,
            width,
            height,
            rotation,
            release_hook: None,
        }
    }

    /// Attach the producer's release hook. The hook fires when the frame is
    /// dropped, which is how "processing complete" reaches the producer.
    pub fn with_release_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.release_hook = Some(Box::new(hook));
        self
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for CameraFrame {
    fn drop(&mut self) {
        // Exactly-once: take() empties the slot before the hook runs.
        if let Some(hook) = self.release_hook.take() {
            hook();
        }
    }
}
