/// Axis-aligned integer box in detection-resolution coordinates.
///
/// Edges are inclusive of `left`/`top` and exclusive of nothing in
/// particular — the same loose pixel convention the detector output
/// uses. Width and height are derived, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.left + self.right) as f64 / 2.0,
            (self.top + self.bottom) as f64 / 2.0,
        )
    }

    /// Euclidean distance between the centers of two rects.
    pub fn center_distance(&self, other: &Rect) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((ax - bx).powi(2) + (ay - by).powi(2)).sqrt()
    }

    /// Anti-jitter blend: each coordinate is `round(alpha*old + (1-alpha)*new)`.
    ///
    /// Repeated application with a constant `new` converges monotonically
    /// toward `new` without overshoot.
    pub fn blended(old: &Rect, new: &Rect, alpha: f64) -> Rect {
        let mix = |a: i32, b: i32| (alpha * a as f64 + (1.0 - alpha) * b as f64).round() as i32;
        Rect {
            left: mix(old.left, new.left),
            top: mix(old.top, new.top),
            right: mix(old.right, new.right),
            bottom: mix(old.bottom, new.bottom),
        }
    }

    /// Scale all coordinates by an integer factor (detection resolution
    /// back to capture resolution).
    pub fn scaled(&self, factor: i32) -> Rect {
        Rect {
            left: self.left * factor,
            top: self.top * factor,
            right: self.right * factor,
            bottom: self.bottom * factor,
        }
    }
}
