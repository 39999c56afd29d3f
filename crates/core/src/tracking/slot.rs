use crate::shared::constants::MAX_CONFIDENCE;
use crate::shared::rect::Rect;
use crate::tracking::domain::face_landmarks::FaceLandmarks;

/// Lifecycle state of a tracking slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// Unoccupied; the initial state and the reentry terminal.
    Idle,
    /// Tracking a face whose identity is not yet trusted.
    Searching,
    /// Tracking a face with an established identity.
    Confirmed,
    /// Face temporarily missing; holding position for re-acquisition.
    Lost,
}

/// One element of the fixed tracking pool: at most one tracked face.
///
/// Slots are allocated once and recycled in place via [`TrackSlot::reset`],
/// never destroyed. Invariants: `active == false` implies `state == Idle`;
/// confidence stays in `[0, MAX_CONFIDENCE]` (the only mutation path is
/// [`TrackSlot::add_confidence`]).
#[derive(Clone, Debug)]
pub struct TrackSlot {
    pub id: usize,
    pub active: bool,
    pub rect: Option<Rect>,
    pub landmarks: Option<FaceLandmarks>,
    pub state: SlotState,
    pub name: Option<String>,
    pub lost_counter: u32,
    pub miss_counter: u32,
    confidence: f64,
}

impl TrackSlot {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            active: false,
            rect: None,
            landmarks: None,
            state: SlotState::Idle,
            name: None,
            lost_counter: 0,
            miss_counter: 0,
            confidence: 0.0,
        }
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Adjust confidence, clamping to `[0, MAX_CONFIDENCE]`.
    pub fn add_confidence(&mut self, delta: f64) {
        self.confidence = (self.confidence + delta).clamp(0.0, MAX_CONFIDENCE);
    }

    /// Recycle the slot back to IDLE, clearing every tracked field.
    pub fn reset(&mut self) {
        self.active = false;
        self.rect = None;
        self.landmarks = None;
        self.state = SlotState::Idle;
        self.name = None;
        self.lost_counter = 0;
        self.miss_counter = 0;
        self.confidence = 0.0;
    }

    /// Eligible for landmark/descriptor work this frame.
    pub fn is_trackable(&self) -> bool {
        self.active && self.rect.is_some() && self.state != SlotState::Lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_slot_is_idle_and_inactive() {
        let slot = TrackSlot::new(1);
        assert_eq!(slot.id, 1);
        assert!(!slot.active);
        assert_eq!(slot.state, SlotState::Idle);
        assert!(slot.rect.is_none());
        assert!(slot.name.is_none());
        assert_eq!(slot.confidence(), 0.0);
    }

    #[test]
    fn test_add_confidence_clamps_to_ceiling() {
        let mut slot = TrackSlot::new(0);
        slot.add_confidence(4.0);
        slot.add_confidence(3.0);
        assert_eq!(slot.confidence(), 5.0);
    }

    #[test]
    fn test_add_confidence_clamps_to_floor() {
        let mut slot = TrackSlot::new(0);
        slot.add_confidence(1.0);
        slot.add_confidence(-10.0);
        assert_eq!(slot.confidence(), 0.0);
    }

    #[test]
    fn test_reset_clears_all_fields_but_id() {
        let mut slot = TrackSlot::new(3);
        slot.active = true;
        slot.rect = Some(Rect::new(0, 0, 10, 10));
        slot.state = SlotState::Confirmed;
        slot.name = Some("ALICE".into());
        slot.lost_counter = 4;
        slot.miss_counter = 2;
        slot.add_confidence(3.5);

        slot.reset();

        assert_eq!(slot.id, 3);
        assert!(!slot.active);
        assert!(slot.rect.is_none());
        assert_eq!(slot.state, SlotState::Idle);
        assert!(slot.name.is_none());
        assert_eq!(slot.lost_counter, 0);
        assert_eq!(slot.miss_counter, 0);
        assert_eq!(slot.confidence(), 0.0);
    }

    #[test]
    fn test_is_trackable_requires_active_rect_and_not_lost() {
        let mut slot = TrackSlot::new(0);
        assert!(!slot.is_trackable());

        slot.active = true;
        assert!(!slot.is_trackable()); // no rect

        slot.rect = Some(Rect::new(0, 0, 10, 10));
        slot.state = SlotState::Searching;
        assert!(slot.is_trackable());

        slot.state = SlotState::Lost;
        assert!(!slot.is_trackable());
    }
}
