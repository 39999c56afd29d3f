use crate::shared::frame::Frame;
use crate::shared::rect::Rect;

/// Domain interface for face detection.
///
/// Returns raw face boxes in the coordinates of the frame it was given;
/// association with tracking slots happens elsewhere. Implementations
/// may be stateful, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Box<dyn std::error::Error>>;
}
