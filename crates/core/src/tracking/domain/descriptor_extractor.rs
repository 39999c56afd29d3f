use crate::shared::frame::Frame;
use crate::tracking::domain::face_landmarks::FaceLandmarks;

/// Domain interface for identity descriptor computation.
///
/// Produces a fixed-length embedding suitable for distance comparison
/// against gallery entries. Invoked at the slot's recognition cadence,
/// not every frame.
pub trait DescriptorExtractor: Send {
    fn extract(
        &mut self,
        frame: &Frame,
        landmarks: &FaceLandmarks,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
