use std::sync::Arc;

/// Pixel layout of a [`Frame`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Tightly packed 8-bit RGB, `width * height * 3` bytes.
    Rgb8,
    /// Compressed image (JPEG, PNG) passed through untouched.
    Encoded,
}

/// A captured video frame. The payload is shared so handing a frame to a
/// classification request does not copy pixels.
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Arc<[u8]>,
    pub width: u32,
    pub height: u32,
    pub format: FrameFormat,
}

impl Frame {
    pub fn rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data: data.into(),
            width,
            height,
            format: FrameFormat::Rgb8,
        }
    }

    pub fn encoded(data: Vec<u8>) -> Self {
        Self {
            data: data.into(),
            width: 0,
            height: 0,
            format: FrameFormat::Encoded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Where the debouncer takes frames from.
pub trait FrameSource: Send {
    /// False while the source has not buffered enough data to classify.
    fn is_ready(&mut self) -> bool;

    /// Latest frame. Only called after `is_ready` returned true.
    fn current_frame(&mut self) -> Frame;
}
