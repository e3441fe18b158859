//! Video frames and the frame source seam.
//!
//! Capture and display live outside this crate. The inference loop only
//! ever reads the most recent frame, and reads it without blocking.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::watch;

/// A single captured video frame.
///
/// Pixel data is reference counted so handing a frame to the detector does
/// not copy the buffer.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
    pub data: Arc<[u8]>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            captured_at: Utc::now(),
            data: data.into(),
        }
    }

    /// A zero-sized frame, handy for detectors that ignore pixels.
    pub fn empty() -> Self {
        Self::new(0, 0, Vec::new())
    }
}

/// Read-only access to the live video feed.
pub trait FrameSource: Send + Sync {
    /// The frame currently on screen, or `None` while the video is not ready.
    fn current_frame(&self) -> Option<VideoFrame>;
}

impl<F: FrameSource + ?Sized> FrameSource for Arc<F> {
    fn current_frame(&self) -> Option<VideoFrame> {
        (**self).current_frame()
    }
}

/// Single-slot frame buffer fed by a capture loop.
///
/// Publishing replaces the previous frame; readers always see the newest.
#[derive(Debug, Clone)]
pub struct LatestFrame {
    tx: Arc<watch::Sender<Option<VideoFrame>>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current frame.
    pub fn publish(&self, frame: VideoFrame) {
        self.tx.send_replace(Some(frame));
    }

    /// Mark the video as not ready (e.g. camera released).
    pub fn clear(&self) {
        self.tx.send_replace(None);
    }
}

impl Default for LatestFrame {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSource for LatestFrame {
    fn current_frame(&self) -> Option<VideoFrame> {
        self.tx.borrow().clone()
    }
}
