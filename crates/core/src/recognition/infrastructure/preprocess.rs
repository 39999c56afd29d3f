//! Crop-and-resize helpers shared by the ONNX recognition adapters.

use crate::shared::frame::Frame;

/// A crop window in frame coordinates. May extend past the frame edges;
/// out-of-frame samples are clamped to the nearest edge pixel.
#[derive(Clone, Copy, Debug)]
pub struct CropWindow {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CropWindow {
    /// Square window of side `side` centered on `(cx, cy)`.
    pub fn centered_square(cx: f64, cy: f64, side: f64) -> Self {
        Self {
            left: cx - side / 2.0,
            top: cy - side / 2.0,
            width: side,
            height: side,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }
}

/// Crop `window` out of `frame` and resize to `size` x `size`, producing
/// an NCHW float tensor normalized by `(x - mean) / std` per byte.
///
/// Nearest-neighbor sampling. Edge pixels are repeated for the parts of
/// the window outside the frame, so faces near a border still produce a
/// full-size crop instead of failing.
pub fn crop_to_tensor(
    frame: &Frame,
    window: &CropWindow,
    size: usize,
    mean: f32,
    std: f32,
) -> ndarray::Array4<f32> {
    let src = frame.as_ndarray();
    let src_h = frame.height() as i64;
    let src_w = frame.width() as i64;

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, size, size));
    for y in 0..size {
        let fy = window.top + (y as f64 + 0.5) / size as f64 * window.height;
        let sy = (fy as i64).clamp(0, src_h - 1) as usize;
        for x in 0..size {
            let fx = window.left + (x as f64 + 0.5) / size as f64 * window.width;
            let sx = (fx as i64).clamp(0, src_w - 1) as usize;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (src[[sy, sx, c]] as f32 - mean) / std;
            }
        }
    }
    tensor
}

/// L2-normalize in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn solid_frame(width: u32, height: u32, value: u8) -> Frame {
        Frame::new(
            vec![value; (width * height * 3) as usize],
            width,
            height,
            3,
            0,
        )
    }

    #[test]
    fn test_centered_square_window() {
        let w = CropWindow::centered_square(50.0, 40.0, 20.0);
        assert_relative_eq!(w.left, 40.0);
        assert_relative_eq!(w.top, 30.0);
        assert_relative_eq!(w.width, 20.0);
        assert_relative_eq!(w.height, 20.0);
    }

    #[test]
    fn test_degenerate_window() {
        assert!(CropWindow::centered_square(10.0, 10.0, 0.0).is_degenerate());
        assert!(!CropWindow::centered_square(10.0, 10.0, 4.0).is_degenerate());
    }

    #[test]
    fn test_crop_to_tensor_shape_and_normalization() {
        let frame = solid_frame(64, 64, 255);
        let window = CropWindow::centered_square(32.0, 32.0, 32.0);
        let tensor = crop_to_tensor(&frame, &window, 112, 127.5, 127.5);

        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
        // (255 - 127.5) / 127.5 = 1.0
        assert_relative_eq!(tensor[[0, 0, 56, 56]], 1.0);
    }

    #[test]
    fn test_crop_to_tensor_clamps_outside_frame() {
        // Window hangs off the top-left corner; samples clamp to (0,0)
        let mut frame = solid_frame(8, 8, 100);
        frame.data_mut()[0] = 200; // B channel of pixel (0,0)

        let window = CropWindow::centered_square(0.0, 0.0, 16.0);
        let tensor = crop_to_tensor(&frame, &window, 4, 0.0, 1.0);

        assert_relative_eq!(tensor[[0, 0, 0, 0]], 200.0);
    }

    #[test]
    fn test_l2_normalize_unit_length() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize(&mut v);
        assert_relative_eq!(v[0], 0.6, epsilon = 1e-6);
        assert_relative_eq!(v[1], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn test_l2_normalize_zero_vector_unchanged() {
        let mut v = vec![0.0f32; 4];
        l2_normalize(&mut v);
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
