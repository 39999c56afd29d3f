//! Five facial anchor points in frame coordinates.
//!
//! Landmark models report eyes, nose and mouth corners; occluded points
//! come back with a non-positive x coordinate and are skipped everywhere.

/// Centroid weight per point (eyes, nose, mouth corners). The nose
/// dominates because it moves least when the head turns.
const WEIGHTS: [f64; 5] = [2.0, 2.0, 3.0, 1.0, 1.0];

#[derive(Clone, Debug, PartialEq)]
pub struct FaceLandmarks {
    points: [(f64, f64); 5],
}

impl FaceLandmarks {
    /// Order: left eye, right eye, nose, left mouth corner, right mouth
    /// corner. A point with x <= 0 counts as invisible.
    pub fn new(points: [(f64, f64); 5]) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64); 5] {
        &self.points
    }

    fn visible(&self) -> impl Iterator<Item = (f64, (f64, f64))> + '_ {
        self.points
            .iter()
            .zip(WEIGHTS)
            .filter(|((x, _), _)| *x > 0.0)
            .map(|(p, w)| (w, *p))
    }

    pub fn has_visible(&self) -> bool {
        self.visible().next().is_some()
    }

    /// Weight-averaged position of the visible points, or an error when
    /// every point is occluded.
    pub fn center(&self) -> Result<(f64, f64), &'static str> {
        let (mut wx, mut wy, mut total) = (0.0, 0.0, 0.0);
        for (w, (x, y)) in self.visible() {
            wx += w * x;
            wy += w * y;
            total += w;
        }

        if total == 0.0 {
            return Err("No visible landmarks");
        }
        Ok((wx / total, wy / total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn face_at_origin() -> FaceLandmarks {
        FaceLandmarks::new([
            (40.0, 30.0),  // left eye
            (80.0, 30.0),  // right eye
            (60.0, 55.0),  // nose
            (45.0, 80.0),  // left mouth
            (75.0, 80.0),  // right mouth
        ])
    }

    #[test]
    fn test_center_pulls_toward_nose() {
        let (cx, cy) = face_at_origin().center().unwrap();
        // weights 2+2+3+1+1 = 9
        // cx = (40*2 + 80*2 + 60*3 + 45 + 75) / 9 = 540/9 = 60
        assert_relative_eq!(cx, 60.0, epsilon = 1e-9);
        // cy = (30*2 + 30*2 + 55*3 + 80 + 80) / 9 = 445/9
        assert_relative_eq!(cy, 445.0 / 9.0, epsilon = 1e-9);
    }

    #[test]
    fn test_center_skips_occluded_points() {
        let mut pts = *face_at_origin().points();
        pts[0] = (0.0, 30.0); // left eye occluded
        pts[3] = (-5.0, 80.0); // left mouth occluded
        let lm = FaceLandmarks::new(pts);

        let (cx, _) = lm.center().unwrap();
        // remaining weights 2+3+1 = 6: cx = (80*2 + 60*3 + 75) / 6
        assert_relative_eq!(cx, 415.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_center_single_visible_point() {
        let mut pts = [(0.0, 0.0); 5];
        pts[2] = (300.0, 400.0);
        let (cx, cy) = FaceLandmarks::new(pts).center().unwrap();
        assert_relative_eq!(cx, 300.0);
        assert_relative_eq!(cy, 400.0);
    }

    #[test]
    fn test_center_all_occluded_is_error() {
        assert!(FaceLandmarks::new([(0.0, 0.0); 5]).center().is_err());
    }

    #[rstest]
    #[case::all_visible(face_at_origin(), true)]
    #[case::none_visible(FaceLandmarks::new([(0.0, 0.0); 5]), false)]
    #[case::negative_x(FaceLandmarks::new([(-1.0, 10.0); 5]), false)]
    fn test_has_visible(#[case] lm: FaceLandmarks, #[case] expected: bool) {
        assert_eq!(lm.has_visible(), expected);
    }
}
