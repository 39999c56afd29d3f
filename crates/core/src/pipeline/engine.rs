//! Engine orchestration: the background worker that turns a frame
//! stream into tracked, recognized, annotated output.
//!
//! One worker thread runs the whole per-frame pipeline:
//! capture -> detect (every 4th frame, half resolution) -> slot
//! assignment -> state update -> recognition -> annotate -> publish.
//! Consumers read the published output from a single-cell mailbox;
//! there is no queue and no backpressure, a slow consumer simply sees
//! the most recent result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::pipeline::annotator::Annotator;
use crate::pipeline::engine_logger::EngineLogger;
use crate::pipeline::frame_source::FrameSource;
use crate::recognition::engine::RecognitionEngine;
use crate::recognition::gallery::Gallery;
use crate::shared::constants::{
    DETECT_INTERVAL, DETECT_SCALE, GATE_RADIUS, LOST_GATE_RADIUS, POOL_SIZE, SMOOTHING_ALPHA,
    TARGET_FPS,
};
use crate::shared::frame::Frame;
use crate::shared::rect::Rect;
use crate::tracking::domain::face_detector::FaceDetector;
use crate::tracking::slot::{SlotState, TrackSlot};
use crate::tracking::slot_tracker::SlotTracker;
use crate::tracking::state_machine::SlotStateMachine;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub pool_size: usize,
    pub detect_interval: usize,
    pub target_fps: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pool_size: POOL_SIZE,
            detect_interval: DETECT_INTERVAL,
            target_fps: TARGET_FPS,
        }
    }
}

/// Per-slot view published with each output frame. The rect is in
/// capture resolution, unlike the slot's internal detection-resolution
/// rect.
#[derive(Clone, Debug)]
pub struct FaceSnapshot {
    pub slot_id: usize,
    pub rect: Rect,
    pub state: SlotState,
    pub name: Option<String>,
    pub confidence: f64,
}

/// One published result: the annotated RGB frame at capture resolution
/// plus a snapshot of every occupied slot.
pub struct EngineOutput {
    pub frame: Frame,
    pub faces: Vec<FaceSnapshot>,
}

/// The capability bundle the worker thread owns while running. Returned
/// through the join handle on stop so the engine can be restarted.
pub struct WorkerParts {
    pub source: Box<dyn FrameSource>,
    pub detector: Box<dyn FaceDetector>,
    pub recognition: RecognitionEngine,
    pub logger: Box<dyn EngineLogger>,
}

pub struct TrackingEngine {
    config: EngineConfig,
    running: Arc<AtomicBool>,
    output: Arc<Mutex<Option<EngineOutput>>>,
    gallery: Arc<Mutex<Arc<Gallery>>>,
    parts: Option<WorkerParts>,
    handle: Option<JoinHandle<WorkerParts>>,
}

impl TrackingEngine {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: Box<dyn FaceDetector>,
        recognition: RecognitionEngine,
        logger: Box<dyn EngineLogger>,
        config: EngineConfig,
    ) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            output: Arc::new(Mutex::new(None)),
            gallery: Arc::new(Mutex::new(Arc::new(Gallery::default()))),
            parts: Some(WorkerParts {
                source,
                detector,
                recognition,
                logger,
            }),
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Take the most recent published output, leaving the mailbox empty.
    pub fn take_output(&self) -> Option<EngineOutput> {
        self.output
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Replace the identity gallery. The worker re-reads the snapshot
    /// every frame, so the swap takes effect on its next recognition
    /// cycle without a restart.
    pub fn set_gallery(&self, gallery: Gallery) {
        *self
            .gallery
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(gallery);
    }

    /// Launch the worker thread. Calling on a running engine is a no-op.
    pub fn start(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.is_running() {
            return Ok(());
        }

        // A previous run may have ended on its own (end of stream);
        // reclaim its parts before restarting.
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(parts) => self.parts = Some(parts),
                Err(_) => return Err("Engine worker thread panicked".into()),
            }
        }

        let parts = self
            .parts
            .take()
            .ok_or("Engine worker parts unavailable")?;

        self.running.store(true, Ordering::Relaxed);

        let worker = Worker::new(
            parts,
            self.config.clone(),
            Arc::clone(&self.gallery),
            Arc::clone(&self.output),
        );
        let running = Arc::clone(&self.running);
        let target_fps = self.config.target_fps;

        self.handle = Some(std::thread::spawn(move || {
            worker.run(running, target_fps)
        }));

        Ok(())
    }

    /// Signal the worker to stop and wait for the in-flight frame to
    /// complete. Calling on a stopped engine is a no-op.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if let Ok(parts) = handle.join() {
                self.parts = Some(parts);
            }
        }
    }
}

impl Drop for TrackingEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Owns all per-run state; lives entirely on the worker thread.
struct Worker {
    parts: WorkerParts,
    tracker: SlotTracker,
    state_machine: SlotStateMachine,
    annotator: Annotator,
    slots: Vec<TrackSlot>,
    detect_interval: usize,
    frame_count: usize,
    gallery: Arc<Mutex<Arc<Gallery>>>,
    output: Arc<Mutex<Option<EngineOutput>>>,
}

impl Worker {
    fn new(
        parts: WorkerParts,
        config: EngineConfig,
        gallery: Arc<Mutex<Arc<Gallery>>>,
        output: Arc<Mutex<Option<EngineOutput>>>,
    ) -> Self {
        Self {
            parts,
            // The tracker truncates detections to the pool size, so it
            // must agree with the slot pool built below.
            tracker: SlotTracker::new(
                config.pool_size,
                GATE_RADIUS,
                LOST_GATE_RADIUS,
                SMOOTHING_ALPHA,
            ),
            state_machine: SlotStateMachine::default(),
            annotator: Annotator::default(),
            slots: (0..config.pool_size).map(TrackSlot::new).collect(),
            detect_interval: config.detect_interval,
            frame_count: 0,
            gallery,
            output,
        }
    }

    fn run(mut self, running: Arc<AtomicBool>, target_fps: f64) -> WorkerParts {
        let period = Duration::from_secs_f64(1.0 / target_fps);

        while running.load(Ordering::Relaxed) {
            let started = Instant::now();

            match self.parts.source.next_frame() {
                Ok(Some(frame)) => self.process_frame(frame),
                Ok(None) => {
                    self.parts.logger.info("End of stream, stopping");
                    running.store(false, Ordering::Relaxed);
                    break;
                }
                // No backoff: the next iteration retries at frame pace.
                Err(e) => log::warn!("Frame capture failed, retrying: {e}"),
            }

            // Pace to the target rate. Overruns are not compensated;
            // a slow frame just delays the next one.
            let elapsed = started.elapsed();
            if elapsed < period {
                std::thread::sleep(period - elapsed);
            }
        }

        self.parts.logger.summary();
        self.parts
    }

    /// Run one frame through the full pipeline and publish the result.
    fn process_frame(&mut self, frame: Frame) {
        self.frame_count += 1;

        // Detection and recognition work on a half-resolution RGB copy;
        // capture delivers BGR.
        let work_frame = frame.half_scale().swapped_channels();

        if self.frame_count % self.detect_interval == 0 {
            let started = Instant::now();
            match self.parts.detector.detect(&work_frame) {
                Ok(detections) => {
                    let matched = self.tracker.assign(&mut self.slots, &detections);
                    for (slot, was_matched) in self.slots.iter_mut().zip(matched) {
                        self.state_machine.apply(slot, was_matched);
                    }
                }
                Err(e) => {
                    // A failed detector run is a skipped cycle, not a
                    // fault; slots coast until the next one.
                    log::warn!("Face detection failed, coasting: {e}");
                    self.keep_alive();
                }
            }
            self.parts
                .logger
                .timing("detect", started.elapsed().as_secs_f64() * 1000.0);
        } else {
            self.keep_alive();
        }

        let started = Instant::now();
        let gallery = Arc::clone(
            &self
                .gallery
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for slot in self.slots.iter_mut() {
            self.parts
                .recognition
                .process_slot(slot, &work_frame, &gallery, self.frame_count);
        }
        self.parts
            .logger
            .timing("recognize", started.elapsed().as_secs_f64() * 1000.0);

        let started = Instant::now();
        let mut display = frame.swapped_channels();
        self.annotator.annotate(&mut display, &self.slots);
        self.parts
            .logger
            .timing("annotate", started.elapsed().as_secs_f64() * 1000.0);

        let faces = self
            .slots
            .iter()
            .filter(|s| s.active && s.state != SlotState::Idle)
            .filter_map(|s| {
                s.rect.map(|rect| FaceSnapshot {
                    slot_id: s.id,
                    rect: rect.scaled(DETECT_SCALE),
                    state: s.state,
                    name: s.name.clone(),
                    confidence: s.confidence(),
                })
            })
            .collect();

        // Last write wins; a consumer that missed a frame missed it.
        *self
            .output
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(EngineOutput {
            frame: display,
            faces,
        });

        self.parts.logger.frame_done(self.frame_count);
    }

    /// Non-detection frames hold tracked slots alive: active non-Lost
    /// slots get their lost counter zeroed, Lost slots coast untouched.
    fn keep_alive(&mut self) {
        for slot in self.slots.iter_mut() {
            if slot.active && slot.state != SlotState::Lost {
                slot.lost_counter = 0;
            }
        }
    }
}
