use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::tracking::domain::face_landmarks::FaceLandmarks;

/// Domain interface for facial landmark extraction within a face box.
///
/// `Ok(None)` means the face region yielded no usable landmarks; this is
/// not an error and folds into "no recognition this frame".
pub trait LandmarkExtractor: Send {
    fn extract(
        &mut self,
        frame: &Frame,
        rect: &Rect,
    ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>>;
}
