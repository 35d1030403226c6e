use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info, warn};
use opencv::prelude::*;
use opencv::videoio::{self, VideoCapture, CAP_V4L2};
use std::time::Duration;

use vitrine_core::{Frame, FrameSource};

// ~20fps capture rate
const CAPTURE_INTERVAL: Duration = Duration::from_millis(50);

struct Camera {
    cap: VideoCapture,
}

impl Camera {
    fn new(device_id: i32, width: u32, height: u32) -> Result<Self> {
        let cap = VideoCapture::new(device_id, CAP_V4L2)
            .with_context(|| format!("failed to open camera video{}", device_id))?;

        if !cap.is_opened().unwrap_or(false) {
            bail!("camera video{} not opened", device_id);
        }

        let mut camera = Self { cap };
        camera.cap.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64).ok();
        camera.cap.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64).ok();
        Ok(camera)
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let mut mat = opencv::core::Mat::default();
        self.cap.read(&mut mat).context("failed to read frame")?;

        if mat.empty() {
            bail!("empty frame");
        }

        let mut rgb_mat = opencv::core::Mat::default();
        opencv::imgproc::cvt_color(&mat, &mut rgb_mat, opencv::imgproc::COLOR_BGR2RGB, 0)
            .context("color conversion failed")?;

        let width = rgb_mat.cols() as u32;
        let height = rgb_mat.rows() as u32;
        let data = rgb_mat
            .data_bytes()
            .map_err(|e| anyhow!("failed to get frame data: {}", e))?
            .to_vec();

        Ok(Frame::rgb(data, width, height))
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        let _ = self.cap.release();
    }
}

/// Live camera feed. A capture thread keeps the two freshest frames in a
/// channel; the debouncer only ever classifies the newest.
pub struct CameraFrameSource {
    frames: async_channel::Receiver<Frame>,
    latest: Option<Frame>,
}

impl CameraFrameSource {
    /// Opens the device on the calling thread so start-up fails fast, then
    /// hands it to the capture thread.
    pub fn open(device_id: i32, width: u32, height: u32) -> Result<Self> {
        let mut camera = Camera::new(device_id, width, height)?;
        info!("Capturing from camera video{}", device_id);

        let (frame_tx, frame_rx) = async_channel::bounded::<Frame>(2);

        std::thread::Builder::new()
            .name("vitrine-camera".into())
            .spawn(move || {
                loop {
                    match camera.read_frame() {
                        Ok(frame) => {
                            if frame_tx.force_send(frame).is_err() {
                                debug!("Frame receiver dropped, stopping capture");
                                break;
                            }
                            std::thread::sleep(CAPTURE_INTERVAL);
                        }
                        Err(e) => {
                            warn!("Camera capture stopped, no new frames will be classified: {:#}", e);
                            break;
                        }
                    }
                }
            })
            .context("failed to spawn camera thread")?;

        Ok(Self {
            frames: frame_rx,
            latest: None,
        })
    }
}

impl FrameSource for CameraFrameSource {
    fn is_ready(&mut self) -> bool {
        while let Ok(frame) = self.frames.try_recv() {
            self.latest = Some(frame);
        }
        self.latest.is_some()
    }

    fn current_frame(&mut self) -> Frame {
        match self.latest {
            Some(ref frame) => frame.clone(),
            None => Frame::rgb(Vec::new(), 0, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_device_fails_at_open() {
        let result = CameraFrameSource::open(97, 640, 480);
        assert!(result.is_err());
    }
}
