//! Classifier reached over HTTP.
//!
//! The frame is POSTed as the request body; the service answers with the
//! ranked list ml5 produces, best first:
//!
//! ```json
//! [{ "label": "COSRX", "confidence": 0.93 }, { "label": "Welcome!", "confidence": 0.05 }]
//! ```

use futures::future::BoxFuture;
use log::debug;
use std::sync::Arc;
use std::time::Duration;

use vitrine_core::config::ClassifierConfig;
use vitrine_core::{Classification, ClassificationError, Classifier, ClassifyResult, Frame, FrameFormat};

pub struct HttpClassifier {
    agent: ureq::Agent,
    url: Arc<str>,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build();
        Self {
            agent,
            url: Arc::from(config.url.as_str()),
        }
    }
}

impl Classifier for HttpClassifier {
    fn classify(&self, frame: Frame) -> BoxFuture<'static, ClassifyResult> {
        let agent = self.agent.clone();
        let url = Arc::clone(&self.url);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || post_frame(&agent, &url, &frame))
                .await
                .unwrap_or_else(|e| Err(ClassificationError::Transport(format!("request task failed: {}", e))))
        })
    }
}

fn post_frame(agent: &ureq::Agent, url: &str, frame: &Frame) -> ClassifyResult {
    debug!("Posting {} byte frame to {}", frame.data.len(), url);

    let response = agent
        .post(url)
        .set("Content-Type", content_type(frame))
        .set("X-Frame-Width", &frame.width.to_string())
        .set("X-Frame-Height", &frame.height.to_string())
        .send_bytes(&frame.data)
        .map_err(|e| ClassificationError::Transport(e.to_string()))?;

    let body = response
        .into_string()
        .map_err(|e| ClassificationError::Transport(format!("failed to read response: {}", e)))?;

    parse_ranking(&body)
}

pub fn parse_ranking(body: &str) -> ClassifyResult {
    let ranked: Vec<Classification> =
        serde_json::from_str(body).map_err(|e| ClassificationError::Malformed(e.to_string()))?;
    if ranked.is_empty() {
        return Err(ClassificationError::Empty);
    }
    Ok(ranked)
}

fn content_type(frame: &Frame) -> &'static str {
    match frame.format {
        FrameFormat::Rgb8 => "application/octet-stream",
        FrameFormat::Encoded if frame.data.starts_with(&[0xFF, 0xD8, 0xFF]) => "image/jpeg",
        FrameFormat::Encoded if frame.data.starts_with(b"\x89PNG") => "image/png",
        FrameFormat::Encoded => "application/octet-stream",
    }
}
