use crate::shared::constants::{CONFIRM_THRESHOLD, MAX_LOST_FRAMES};
use crate::tracking::slot::{SlotState, TrackSlot};

/// Per-slot lifecycle transitions, evaluated once per detection cycle.
///
/// ```text
///            match                    conf >= 3.0
///   IDLE ───────────> SEARCHING ───────────────────> CONFIRMED
///    ^                    │  miss                        │ 2nd miss
///    │                    v                              v
///    └──── 6th miss ──── LOST <──────────────────────────┘
/// ```
///
/// An unconfirmed track is cheap to drop: SEARCHING goes straight back
/// to IDLE on a single miss. CONFIRMED earns a one-miss grace period
/// and then a LOST holding period before the slot is recycled.
pub struct SlotStateMachine {
    confirm_threshold: f64,
    max_lost: u32,
}

impl SlotStateMachine {
    pub fn new(confirm_threshold: f64, max_lost: u32) -> Self {
        Self {
            confirm_threshold,
            max_lost,
        }
    }

    pub fn apply(&self, slot: &mut TrackSlot, matched: bool) {
        if matched {
            self.on_match(slot);
        } else {
            self.on_miss(slot);
        }
    }

    fn on_match(&self, slot: &mut TrackSlot) {
        slot.lost_counter = 0;
        slot.miss_counter = 0;
        slot.active = true;

        match slot.state {
            SlotState::Idle => slot.state = SlotState::Searching,
            SlotState::Lost => {
                slot.state = if slot.confidence() >= self.confirm_threshold {
                    SlotState::Confirmed
                } else {
                    SlotState::Searching
                };
            }
            SlotState::Searching => {
                if slot.confidence() >= self.confirm_threshold {
                    slot.state = SlotState::Confirmed;
                }
            }
            SlotState::Confirmed => {}
        }

        // Safety check: never leave a barely-trusted identity displayed
        // as CONFIRMED across a frame boundary.
        if slot.state == SlotState::Confirmed && slot.confidence() < 1.0 {
            slot.state = SlotState::Searching;
            slot.name = None;
        }
    }

    fn on_miss(&self, slot: &mut TrackSlot) {
        slot.miss_counter += 1;

        match slot.state {
            SlotState::Confirmed => {
                if slot.miss_counter >= 2 {
                    slot.state = SlotState::Lost;
                    slot.lost_counter = 0;
                }
            }
            SlotState::Searching => slot.reset(),
            SlotState::Lost => {
                slot.lost_counter += 1;
                if slot.lost_counter > self.max_lost {
                    slot.reset();
                }
            }
            SlotState::Idle => {}
        }
    }
}

impl Default for SlotStateMachine {
    fn default() -> Self {
        Self::new(CONFIRM_THRESHOLD, MAX_LOST_FRAMES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::rect::Rect;
    use rstest::rstest;

    fn machine() -> SlotStateMachine {
        SlotStateMachine::default()
    }

    fn confirmed_slot(confidence: f64) -> TrackSlot {
        let mut slot = TrackSlot::new(0);
        slot.active = true;
        slot.rect = Some(Rect::new(0, 0, 50, 50));
        slot.state = SlotState::Confirmed;
        slot.name = Some("ALICE".into());
        slot.add_confidence(confidence);
        slot
    }

    #[test]
    fn test_idle_to_searching_on_match() {
        let mut slot = TrackSlot::new(0);
        machine().apply(&mut slot, true);
        assert_eq!(slot.state, SlotState::Searching);
        assert!(slot.active);
    }

    #[test]
    fn test_searching_confirms_only_at_threshold() {
        let mut slot = TrackSlot::new(0);
        slot.active = true;
        slot.state = SlotState::Searching;
        slot.add_confidence(2.9);

        machine().apply(&mut slot, true);
        assert_eq!(slot.state, SlotState::Searching);

        slot.add_confidence(0.1);
        machine().apply(&mut slot, true);
        assert_eq!(slot.state, SlotState::Confirmed);
    }

    #[rstest]
    #[case(3.5, SlotState::Confirmed)]
    #[case(3.0, SlotState::Confirmed)]
    #[case(2.0, SlotState::Searching)]
    fn test_lost_reacquisition_depends_on_confidence(
        #[case] confidence: f64,
        #[case] expected: SlotState,
    ) {
        let mut slot = confirmed_slot(confidence);
        slot.state = SlotState::Lost;
        machine().apply(&mut slot, true);
        assert_eq!(slot.state, expected);
        assert_eq!(slot.lost_counter, 0);
    }

    #[test]
    fn test_confirmed_with_low_confidence_downgrades_on_match() {
        let mut slot = confirmed_slot(0.5);
        machine().apply(&mut slot, true);
        assert_eq!(slot.state, SlotState::Searching);
        assert!(slot.name.is_none());
    }

    #[test]
    fn test_match_clears_counters() {
        let mut slot = confirmed_slot(4.0);
        slot.miss_counter = 1;
        slot.lost_counter = 3;
        machine().apply(&mut slot, true);
        assert_eq!(slot.miss_counter, 0);
        assert_eq!(slot.lost_counter, 0);
    }

    #[test]
    fn test_confirmed_survives_one_miss() {
        let mut slot = confirmed_slot(4.0);
        machine().apply(&mut slot, false);
        assert_eq!(slot.state, SlotState::Confirmed);
        assert_eq!(slot.miss_counter, 1);
    }

    #[test]
    fn test_confirmed_lost_on_second_consecutive_miss() {
        let mut slot = confirmed_slot(4.0);
        machine().apply(&mut slot, false);
        machine().apply(&mut slot, false);
        assert_eq!(slot.state, SlotState::Lost);
        assert_eq!(slot.lost_counter, 0);
    }

    #[test]
    fn test_searching_drops_to_idle_on_single_miss() {
        let mut slot = TrackSlot::new(0);
        slot.active = true;
        slot.rect = Some(Rect::new(0, 0, 50, 50));
        slot.state = SlotState::Searching;
        slot.name = Some("BOB".into());
        slot.add_confidence(2.0);

        machine().apply(&mut slot, false);

        assert_eq!(slot.state, SlotState::Idle);
        assert!(!slot.active);
        assert!(slot.rect.is_none());
        assert!(slot.name.is_none());
        assert_eq!(slot.confidence(), 0.0);
    }

    #[test]
    fn test_lost_recycles_after_exactly_six_misses() {
        let mut slot = confirmed_slot(4.0);
        machine().apply(&mut slot, false);
        machine().apply(&mut slot, false);
        assert_eq!(slot.state, SlotState::Lost);

        // 5 tolerated non-matches while LOST
        for i in 1..=5 {
            machine().apply(&mut slot, false);
            assert_eq!(slot.state, SlotState::Lost, "recycled early at miss {i}");
            assert_eq!(slot.lost_counter, i);
        }

        // 6th triggers the reset
        machine().apply(&mut slot, false);
        assert_eq!(slot.state, SlotState::Idle);
        assert!(!slot.active);
        assert_eq!(slot.confidence(), 0.0);
    }

    #[test]
    fn test_idle_miss_is_noop_apart_from_counter() {
        let mut slot = TrackSlot::new(0);
        machine().apply(&mut slot, false);
        assert_eq!(slot.state, SlotState::Idle);
        assert!(!slot.active);
        assert_eq!(slot.miss_counter, 1);
    }

    #[test]
    fn test_state_always_valid_over_random_sequences() {
        // Deterministic pseudo-random match/miss stream; confidence held
        // at zero, so CONFIRMED must never be reached.
        let mut slot = TrackSlot::new(0);
        let m = machine();
        let mut x: u32 = 0x2545_f491;
        for _ in 0..500 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            m.apply(&mut slot, x & 1 == 0);
            assert!(matches!(
                slot.state,
                SlotState::Idle | SlotState::Searching | SlotState::Confirmed | SlotState::Lost
            ));
            assert_ne!(slot.state, SlotState::Confirmed);
            assert!((0.0..=5.0).contains(&slot.confidence()));
            if !slot.active {
                assert_eq!(slot.state, SlotState::Idle);
            }
        }
    }
}
