//! YOLO-family face detector using ONNX Runtime via `ort`.
//!
//! Handles letterbox preprocessing, inference, confidence filtering and
//! NMS. Output is plain face boxes in frame coordinates; association
//! with tracking slots is the SlotTracker's job, not the detector's.

use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::tracking::domain::face_detector::FaceDetector;

/// Fallback model input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 640;

/// Default confidence threshold for face detection.
pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
const NMS_IOU_THRESH: f64 = 0.45;

pub struct OnnxFaceDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Load a face-detection ONNX model and prepare for inference.
    ///
    /// The input resolution is read from the model's input shape
    /// (expecting NCHW). Falls back to 640 if the shape is dynamic.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = ort::session::Session::builder()?.commit_from_file(model_path)?;

        let input_size = session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    // [N, C, H, W] — use H (square input assumed)
                    if shape.len() >= 4 && shape[2] > 0 {
                        Some(shape[2] as u32)
                    } else {
                        None
                    }
                } else {
                    None
                }
            })
            .unwrap_or(DEFAULT_INPUT_SIZE);

        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rect>, Box<dyn std::error::Error>> {
        let fw = frame.width() as f64;
        let fh = frame.height() as f64;

        let (input_tensor, scale, pad_x, pad_y) = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("face model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape();

        // YOLO output is [1, num_features, num_detections] (transposed)
        // or [1, num_detections, num_features]. Handle both.
        let (num_dets, num_feats) = if shape.len() == 3 {
            if shape[1] < shape[2] {
                (shape[2], shape[1])
            } else {
                (shape[1], shape[2])
            }
        } else {
            return Err(format!("Unexpected detector output shape: {shape:?}").into());
        };

        if num_feats < 5 {
            return Err(format!("Detector rows too short: {num_feats} features").into());
        }

        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;
        let transposed = shape.len() == 3 && shape[1] < shape[2];
        // Feature f of detection i, independent of layout
        let feat = |i: usize, f: usize| -> f64 {
            let v = if transposed {
                data[f * num_dets + i]
            } else {
                data[i * num_feats + f]
            };
            v as f64
        };

        let mut raw_dets = Vec::new();
        for i in 0..num_dets {
            let conf = feat(i, 4);
            if conf < self.confidence {
                continue;
            }

            // Detector emits center/size in letterbox space; undo the
            // letterbox to get frame-space corners.
            let (cx, cy) = (feat(i, 0), feat(i, 1));
            let (half_w, half_h) = (feat(i, 2) / 2.0, feat(i, 3) / 2.0);
            let unpad = |v: f64, pad: u32| (v - pad as f64) / scale;

            raw_dets.push(RawDetection {
                x1: unpad(cx - half_w, pad_x),
                y1: unpad(cy - half_h, pad_y),
                x2: unpad(cx + half_w, pad_x),
                y2: unpad(cy + half_h, pad_y),
                confidence: conf,
            });
        }

        let kept = nms(&mut raw_dets, NMS_IOU_THRESH);

        Ok(kept
            .iter()
            .map(|d| {
                Rect::new(
                    d.x1.clamp(0.0, fw).round() as i32,
                    d.y1.clamp(0.0, fh).round() as i32,
                    d.x2.clamp(0.0, fw).round() as i32,
                    d.y2.clamp(0.0, fh).round() as i32,
                )
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Letterbox a frame into a centered `target_size` square: scaled to
/// fit while keeping aspect, remainder padded with 114/255 gray (the
/// YOLO training convention), normalized to `[0, 1]` NCHW.
///
/// Returns the tensor plus the scale and padding needed to map model
/// output back to frame coordinates.
fn letterbox(frame: &Frame, target_size: u32) -> (ndarray::Array4<f32>, f64, u32, u32) {
    let target = target_size as f64;
    let scale = (target / frame.width() as f64).min(target / frame.height() as f64);
    let scaled_w = (frame.width() as f64 * scale).round() as u32;
    let scaled_h = (frame.height() as f64 * scale).round() as u32;
    let pad_x = (target_size - scaled_w) / 2;
    let pad_y = (target_size - scaled_h) / 2;

    let src = frame.as_ndarray(); // [H, W, C] u8
    let size = target_size as usize;
    let gray = 114.0 / 255.0;

    // Nearest-neighbor sample inside the image region, gray elsewhere
    let tensor = ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, ty, tx)| {
        let x = tx as i64 - pad_x as i64;
        let y = ty as i64 - pad_y as i64;
        if x < 0 || y < 0 || x >= scaled_w as i64 || y >= scaled_h as i64 {
            return gray;
        }
        let sx = ((x as f64 / scale) as usize).min(frame.width() as usize - 1);
        let sy = ((y as f64 / scale) as usize).min(frame.height() as usize - 1);
        src[[sy, sx, c]] as f32 / 255.0
    });

    (tensor, scale, pad_x, pad_y)
}

// ---------------------------------------------------------------------------
// NMS
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
    confidence: f64,
}

impl RawDetection {
    fn corners(&self) -> [f64; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }
}

/// Greedy NMS: walk detections in descending confidence, keeping each
/// one unless it overlaps an already-kept box past `iou_thresh`.
fn nms(dets: &mut [RawDetection], iou_thresh: f64) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<RawDetection> = Vec::new();
    for det in dets.iter() {
        let overlaps = keep
            .iter()
            .any(|k| bbox_iou(&k.corners(), &det.corners()) > iou_thresh);
        if !overlaps {
            keep.push(det.clone());
        }
    }
    keep
}

fn bbox_iou(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    let overlap_w = (a[2].min(b[2]) - a[0].max(b[0])).max(0.0);
    let overlap_h = (a[3].min(b[3]) - a[1].max(b[1])).max(0.0);
    let inter = overlap_w * overlap_h;
    if inter == 0.0 {
        return 0.0;
    }
    let union = (a[2] - a[0]) * (a[3] - a[1]) + (b[2] - b[0]) * (b[3] - b[1]) - inter;
    inter / union
}
