use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::ClassificationError;
use crate::frame::Frame;
use crate::label::DetectionLabel;

/// One ranked entry of a classifier response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: DetectionLabel,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<DetectionLabel>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

pub type ClassifyResult = Result<Vec<Classification>, ClassificationError>;

/// Image classifier capability. Responses are ordered best first; only the
/// first entry is used.
pub trait Classifier: Send + Sync + 'static {
    fn classify(&self, frame: Frame) -> BoxFuture<'static, ClassifyResult>;
}

/// First entry of a ranked response.
pub fn top_ranked(ranked: Vec<Classification>) -> Result<Classification, ClassificationError> {
    ranked.into_iter().next().ok_or(ClassificationError::Empty)
}
