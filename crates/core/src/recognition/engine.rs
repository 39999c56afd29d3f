use crate::recognition::gallery::{Gallery, GalleryMatch};
use crate::shared::constants::{
    RECOG_ACCEPT, RECOG_GRAY, REC_INTERVAL_CONFIRMED, REC_INTERVAL_SEARCHING,
};
use crate::shared::frame::Frame;
use crate::tracking::domain::descriptor_extractor::DescriptorExtractor;
use crate::tracking::domain::landmark_extractor::LandmarkExtractor;
use crate::tracking::slot::{SlotState, TrackSlot};

/// Converts raw embedding distances into a stable displayed identity.
///
/// Landmarks are refreshed every eligible frame; the descriptor is
/// computed only at the slot's recognition cadence — every 6 frames
/// while SEARCHING (fast lock-on), every 15 once CONFIRMED. Distances
/// pass through asymmetric accept/gray/reject bands so the label does
/// not flicker near a decision boundary.
///
/// The descriptor capability is optional: without it (model missing),
/// recognition is disabled for the session and tracking continues.
pub struct RecognitionEngine {
    landmark_extractor: Box<dyn LandmarkExtractor>,
    descriptor_extractor: Option<Box<dyn DescriptorExtractor>>,
    accept: f64,
    gray: f64,
}

impl RecognitionEngine {
    pub fn new(
        landmark_extractor: Box<dyn LandmarkExtractor>,
        descriptor_extractor: Option<Box<dyn DescriptorExtractor>>,
    ) -> Self {
        Self {
            landmark_extractor,
            descriptor_extractor,
            accept: RECOG_ACCEPT,
            gray: RECOG_GRAY,
        }
    }

    pub fn recognition_enabled(&self) -> bool {
        self.descriptor_extractor.is_some()
    }

    /// Run one recognition step for a slot on the current frame.
    ///
    /// No error escapes: extraction failures are logged and fold into
    /// "no recognition this frame" (passive decay applies instead).
    pub fn process_slot(
        &mut self,
        slot: &mut TrackSlot,
        frame: &Frame,
        gallery: &Gallery,
        frame_count: usize,
    ) {
        if !slot.is_trackable() {
            return;
        }
        let Some(rect) = slot.rect else {
            return;
        };

        slot.landmarks = match self.landmark_extractor.extract(frame, &rect) {
            Ok(lm) => lm,
            Err(e) => {
                log::warn!("landmark extraction failed on slot {}: {e}", slot.id);
                None
            }
        };

        let interval = if slot.state == SlotState::Searching {
            REC_INTERVAL_SEARCHING
        } else {
            REC_INTERVAL_CONFIRMED
        };

        let mut did_recognition = false;
        if frame_count % interval == 0 && !gallery.is_empty() {
            if let (Some(extractor), Some(landmarks)) =
                (self.descriptor_extractor.as_mut(), slot.landmarks.as_ref())
            {
                match extractor.extract(frame, landmarks) {
                    Ok(descriptor) => {
                        if let Some(best) = gallery.nearest(&descriptor) {
                            apply_hysteresis(slot, &best, self.accept, self.gray);
                            did_recognition = true;
                        }
                    }
                    Err(e) => {
                        log::warn!("descriptor extraction failed on slot {}: {e}", slot.id);
                    }
                }
            }
        }

        if !did_recognition && slot.confidence() > 0.0 {
            let decay = if slot.state == SlotState::Confirmed {
                -0.01
            } else {
                -0.2
            };
            slot.add_confidence(decay);
        }
    }
}

/// Accept below `accept` (strict), ambiguous up to `gray`, reject beyond.
///
/// Rejection of a CONFIRMED slot erodes confidence by 0.5 per hit but
/// clears the displayed name only once confidence reaches zero; the
/// briefly-stale label is deliberate (sudden label drops look worse
/// than a short lag).
fn apply_hysteresis(slot: &mut TrackSlot, best: &GalleryMatch, accept: f64, gray: f64) {
    if best.distance < accept {
        if slot.state == SlotState::Confirmed && slot.name.as_deref() == Some(&best.name) {
            slot.add_confidence(1.0);
        } else {
            slot.name = Some(best.name.clone());
            slot.add_confidence(1.5);
        }
    } else if best.distance < gray {
        slot.add_confidence(-0.1);
    } else if slot.state == SlotState::Confirmed {
        slot.add_confidence(-0.5);
        if slot.confidence() <= 0.0 {
            slot.name = None;
        }
    } else {
        slot.add_confidence(-2.0);
        slot.name = None;
    }
}
