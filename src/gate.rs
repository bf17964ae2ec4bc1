//! Frame cadence gate.
//!
//! Classification is far more expensive than frame acquisition, so only
//! every Nth frame is analyzed. The gate is strictly frame-count based: no
//! timestamps, no allocation, one counter increment per decision. Wall-clock
//! classification cadence therefore varies with the camera frame rate; that
//! is documented behavior, not a defect.

/// Contract cadence: analyze one frame in 60.
pub const DEFAULT_CADENCE: u32 = 60;

/// Decides, per incoming frame, whether it is worth classifying.
///
/// The counter is private, advances on every call whether or not the frame
/// is accepted, and is never reset after construction, so the accept/reject
/// sequence is a pure function of call count.
#[derive(Debug)]
pub struct FrameGate {
    counter: u64,
    cadence: u32,
}

impl FrameGate {
    pub fn new() -> Self {
        Self::with_cadence(DEFAULT_CADENCE)
    }

    /// Build a gate with a custom cadence. A cadence below 1 is treated as 1
    /// (accept every frame).
    pub fn with_cadence(cadence: u32) -> Self {
        Self {
            counter: 0,
            cadence: cadence.max(1),
        }
    }

    /// Accept exactly when the frame index is a multiple of the cadence.
    /// Advances the counter on every call, accepted or not. Never fails.
    pub fn should_process(&mut self) -> bool {
        let accept = self.counter % u64::from(self.cadence) == 0;
        self.counter += 1;
        accept
    }

    /// Frames seen so far (accepted and dropped).
    pub fn frames_seen(&self) -> u64 {
        self.counter
    }

    pub fn cadence(&self) -> u32 {
        self.cadence
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}
