use serde::{Deserialize, Serialize};
use std::fmt;

/// Label emitted by the classifier when no product is held up.
pub const IDLE_LABEL: &str = "Welcome!";

/// Opaque identifier produced by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionLabel(String);

impl DetectionLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn idle() -> Self {
        Self::new(IDLE_LABEL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DetectionLabel {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}

impl From<String> for DetectionLabel {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl fmt::Display for DetectionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
