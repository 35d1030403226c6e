use log::debug;
use std::fs;
use std::path::PathBuf;

use vitrine_core::{Frame, FrameSource};

/// Frames from an image file that an external capture tool keeps rewriting.
pub struct SnapshotFrameSource {
    path: PathBuf,
    pending: Option<Vec<u8>>,
}

impl SnapshotFrameSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path, pending: None }
    }
}

impl FrameSource for SnapshotFrameSource {
    fn is_ready(&mut self) -> bool {
        match fs::read(&self.path) {
            Ok(bytes) if !bytes.is_empty() => {
                self.pending = Some(bytes);
                true
            }
            Ok(_) => {
                debug!("Snapshot {:?} is empty", self.path);
                false
            }
            Err(e) => {
                debug!("Snapshot {:?} unavailable: {}", self.path, e);
                false
            }
        }
    }

    fn current_frame(&mut self) -> Frame {
        Frame::encoded(self.pending.take().unwrap_or_default())
    }
}
