use serde::{Deserialize, Serialize};

/// One labeled outcome from a classifier.
///
/// Immutable once produced; ownership moves with the result list from the
/// classifier to the result sink. Downstream consumers only rely on the
/// label; the confidence is carried for display and thresholding.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    /// Human-readable category name (e.g. "rose").
    pub label: String,
    /// Model score in 0..=1.
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}
