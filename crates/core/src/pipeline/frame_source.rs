use crate::shared::frame::Frame;

/// Pull-based frame producer for the engine worker.
///
/// Frames are delivered in capture channel order (BGR for the ffmpeg
/// adapter); the engine handles channel reordering at its boundaries.
pub trait FrameSource: Send {
    /// Produce the next frame. `Ok(None)` means end of stream; an error
    /// is transient and the caller may retry.
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
