use crate::shared::constants::{GATE_RADIUS, LOST_GATE_RADIUS, POOL_SIZE, SMOOTHING_ALPHA};
use crate::shared::rect::Rect;
use crate::tracking::slot::{SlotState, TrackSlot};

/// Matches periodic detections against the fixed slot pool.
///
/// Largest faces win: detections are processed in descending area order
/// and anything beyond the pool size is dropped up front. Association is
/// nearest-center within a state-dependent gate; a LOST slot gets a
/// tighter gate so a different face wandering nearby is not mistaken
/// for the one that disappeared.
pub struct SlotTracker {
    pool_size: usize,
    gate_radius: f64,
    lost_gate_radius: f64,
    alpha: f64,
}

impl SlotTracker {
    pub fn new(pool_size: usize, gate_radius: f64, lost_gate_radius: f64, alpha: f64) -> Self {
        Self {
            pool_size,
            gate_radius,
            lost_gate_radius,
            alpha,
        }
    }

    /// Assign one detection cycle's detections to slots.
    ///
    /// Returns a per-slot "matched this cycle" flag, consumed by the
    /// state machine. Each slot accepts at most one detection; a
    /// detection whose best slot was already claimed is dropped, not
    /// rerouted.
    pub fn assign(&self, slots: &mut [TrackSlot], detections: &[Rect]) -> Vec<bool> {
        let mut matched = vec![false; slots.len()];

        let mut dets: Vec<Rect> = detections.to_vec();
        dets.sort_by(|a, b| b.area().cmp(&a.area()));
        dets.truncate(self.pool_size);

        for det in &dets {
            let target = self
                .nearest_gated_slot(slots, det)
                .or_else(|| self.first_idle_slot(slots));

            if let Some(idx) = target {
                if !matched[idx] {
                    let slot = &mut slots[idx];
                    slot.rect = Some(match slot.rect {
                        Some(old) => Rect::blended(&old, det, self.alpha),
                        None => *det,
                    });
                    matched[idx] = true;
                }
            }
        }

        matched
    }

    fn nearest_gated_slot(&self, slots: &[TrackSlot], det: &Rect) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, slot) in slots.iter().enumerate() {
            let Some(rect) = slot.rect.filter(|_| slot.active) else {
                continue;
            };
            let gate = if slot.state == SlotState::Lost {
                self.lost_gate_radius
            } else {
                self.gate_radius
            };
            let dist = rect.center_distance(det);
            if dist < gate && best.map_or(true, |(_, d)| dist < d) {
                best = Some((i, dist));
            }
        }
        best.map(|(i, _)| i)
    }

    fn first_idle_slot(&self, slots: &[TrackSlot]) -> Option<usize> {
        slots
            .iter()
            .position(|s| !s.active && s.state == SlotState::Idle)
    }
}

impl Default for SlotTracker {
    fn default() -> Self {
        Self::new(POOL_SIZE, GATE_RADIUS, LOST_GATE_RADIUS, SMOOTHING_ALPHA)
    }
}
