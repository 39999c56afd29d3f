//! 5-point facial landmark extractor using ONNX Runtime via `ort`.
//!
//! The model takes a square crop around the face box and emits 10
//! floats, normalized x/y pairs in crop coordinates. Points are mapped
//! back to frame coordinates before they reach the rest of the engine.

use std::path::Path;

use crate::recognition::infrastructure::preprocess::{crop_to_tensor, CropWindow};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::tracking::domain::face_landmarks::FaceLandmarks;
use crate::tracking::domain::landmark_extractor::LandmarkExtractor;

/// Model input resolution.
const INPUT_SIZE: usize = 112;

/// Crop margin relative to the face box, so chin and forehead landmarks
/// stay inside the crop for tight detector boxes.
const CROP_MARGIN: f64 = 1.25;

pub struct OnnxLandmarkExtractor {
    session: ort::session::Session,
}

impl OnnxLandmarkExtractor {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }
}

impl LandmarkExtractor for OnnxLandmarkExtractor {
    fn extract(
        &mut self,
        frame: &Frame,
        rect: &Rect,
    ) -> Result<Option<FaceLandmarks>, Box<dyn std::error::Error>> {
        let side = rect.width().max(rect.height()) as f64 * CROP_MARGIN;
        let (cx, cy) = rect.center();
        let window = CropWindow::centered_square(cx, cy, side);
        if window.is_degenerate() {
            return Ok(None);
        }

        let tensor = crop_to_tensor(frame, &window, INPUT_SIZE, 0.0, 255.0);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("landmark model produced no outputs".into());
        }

        let out = outputs[0].try_extract_array::<f32>()?;
        let data = out.as_slice().ok_or("Cannot get tensor slice")?;
        if data.len() < 10 {
            return Err(format!("Unexpected landmark output length: {}", data.len()).into());
        }

        let mut points = [(0.0f64, 0.0f64); 5];
        for (i, point) in points.iter_mut().enumerate() {
            let nx = data[i * 2] as f64;
            let ny = data[i * 2 + 1] as f64;
            *point = (
                window.left + nx * window.width,
                window.top + ny * window.height,
            );
        }

        let landmarks = FaceLandmarks::new(points);
        if landmarks.has_visible() {
            Ok(Some(landmarks))
        } else {
            Ok(None)
        }
    }
}
