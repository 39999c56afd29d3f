/// A named identity embedding. Names are case-normalized (uppercase)
/// and unique within a gallery.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryEntry {
    pub name: String,
    pub embedding: Vec<f32>,
}

impl GalleryEntry {
    pub fn new(name: &str, embedding: Vec<f32>) -> Self {
        Self {
            name: name.to_uppercase(),
            embedding,
        }
    }
}

/// Nearest-neighbor result.
#[derive(Clone, Debug, PartialEq)]
pub struct GalleryMatch {
    pub name: String,
    pub distance: f64,
}

/// Immutable snapshot of known identities.
///
/// The gallery is constructed whole and never mutated; callers replace
/// the entire snapshot between sessions. The engine only ever holds a
/// read reference, which is what makes the lock-free re-read in the
/// worker loop sound.
#[derive(Clone, Debug, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
}

impl Gallery {
    pub fn new(entries: Vec<GalleryEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Nearest entry to `descriptor` by euclidean distance.
    ///
    /// Returns `None` only for an empty gallery; classification into
    /// accept/gray/reject bands is the recognition engine's concern.
    pub fn nearest(&self, descriptor: &[f32]) -> Option<GalleryMatch> {
        self.entries
            .iter()
            .map(|e| GalleryMatch {
                name: e.name.clone(),
                distance: euclidean_distance(&e.embedding, descriptor),
            })
            .min_by(|a, b| {
                a.distance
                    .partial_cmp(&b.distance)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = (*x - *y) as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}
