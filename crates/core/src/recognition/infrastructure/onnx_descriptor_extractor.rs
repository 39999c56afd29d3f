//! ArcFace-style identity descriptor extractor using ONNX Runtime.
//!
//! Crops a square region around the weighted landmark center, feeds a
//! 112x112 `(x - 127.5) / 127.5` tensor through the model, and returns
//! the L2-normalized embedding.

use std::path::Path;

use crate::recognition::infrastructure::preprocess::{crop_to_tensor, l2_normalize, CropWindow};
use crate::shared::frame::Frame;
use crate::tracking::domain::descriptor_extractor::DescriptorExtractor;
use crate::tracking::domain::face_landmarks::FaceLandmarks;

const INPUT_SIZE: usize = 112;

/// Crop side as a multiple of the landmark spread. Landmarks cover the
/// eye-nose-mouth region, roughly the middle half of the face, so the
/// crop takes a generous margin around them.
const SPREAD_FACTOR: f64 = 2.4;

/// Minimum crop side in pixels. Spread collapses when landmarks bunch
/// together on very small faces.
const MIN_CROP_SIDE: f64 = 32.0;

pub struct OnnxDescriptorExtractor {
    session: ort::session::Session,
}

impl OnnxDescriptorExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }
}

impl DescriptorExtractor for OnnxDescriptorExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        landmarks: &FaceLandmarks,
    ) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let (cx, cy) = landmarks.center()?;
        let side = landmark_spread(landmarks).max(MIN_CROP_SIDE) * SPREAD_FACTOR;
        let window = CropWindow::centered_square(cx, cy, side);

        let tensor = crop_to_tensor(frame, &window, INPUT_SIZE, 127.5, 127.5);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("descriptor model produced no outputs".into());
        }

        let out = outputs[0].try_extract_array::<f32>()?;
        let data = out.as_slice().ok_or("Cannot get tensor slice")?;
        if data.is_empty() {
            return Err("descriptor model produced an empty embedding".into());
        }

        let mut embedding = data.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Largest axis extent across visible landmarks.
fn landmark_spread(landmarks: &FaceLandmarks) -> f64 {
    let visible: Vec<&(f64, f64)> = landmarks.points().iter().filter(|(x, _)| *x > 0.0).collect();
    if visible.len() < 2 {
        return 0.0;
    }

    let min_x = visible.iter().map(|(x, _)| *x).fold(f64::INFINITY, f64::min);
    let max_x = visible
        .iter()
        .map(|(x, _)| *x)
        .fold(f64::NEG_INFINITY, f64::max);
    let min_y = visible.iter().map(|(_, y)| *y).fold(f64::INFINITY, f64::min);
    let max_y = visible
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::NEG_INFINITY, f64::max);

    (max_x - min_x).max(max_y - min_y)
}
