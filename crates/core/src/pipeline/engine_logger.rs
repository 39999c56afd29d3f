use std::collections::HashMap;
use std::time::Instant;

/// Cross-cutting logger for engine worker events.
///
/// Decouples the frame loop from specific output mechanisms (stdout,
/// GUI signals, log crate) so callers can observe engine behavior
/// without changing the orchestration code.
pub trait EngineLogger: Send {
    /// Called once per processed frame with its running index.
    fn frame_done(&mut self, frame_index: usize);

    /// Record one frame's duration for a named engine stage.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Free-form status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events. Used where logger output is
/// irrelevant, primarily tests.
pub struct NullEngineLogger;

impl EngineLogger for NullEngineLogger {
    fn frame_done(&mut self, _frame_index: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// CLI-oriented logger: per-stage timing collection, throttled progress
/// lines, and a summary report when the engine stops.
///
/// Progress output is emitted every `throttle_frames` frames to avoid
/// flooding the terminal at the 25 Hz frame cadence.
pub struct StdoutEngineLogger {
    throttle_frames: usize,
    timings: HashMap<String, Vec<f64>>,
    start_time: Instant,
    frames_seen: usize,
}

impl StdoutEngineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if nothing ran.
    pub fn summary_string(&self) -> Option<String> {
        if self.frames_seen == 0 {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = Vec::new();
        lines.push(format!(
            "Engine summary ({} frames, {:.1}s total):",
            self.frames_seen,
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by_key(|(name, _)| name.as_str());
        for (stage, durations) in stages {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = total_ms / durations.len() as f64;
            lines.push(format!(
                "  {stage:12}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms"
            ));
        }

        if elapsed_ms > 0.0 {
            let fps = self.frames_seen as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the timing data recorded for a given stage.
    pub fn timings_for(&self, stage: &str) -> Option<&[f64]> {
        self.timings.get(stage).map(|v| v.as_slice())
    }
}

impl Default for StdoutEngineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl EngineLogger for StdoutEngineLogger {
    fn frame_done(&mut self, frame_index: usize) {
        self.frames_seen = self.frames_seen.max(frame_index);
        if frame_index % self.throttle_frames == 0 {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let fps = if elapsed > 0.0 {
                frame_index as f64 / elapsed
            } else {
                0.0
            };
            log::info!("Frame {frame_index} ({fps:.1} fps)");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullEngineLogger;
        logger.frame_done(1);
        logger.timing("detect", 5.0);
        logger.info("hello");
        logger.summary();
        // No panics = success
    }

    #[test]
    fn test_timing_records_values_per_stage() {
        let mut logger = StdoutEngineLogger::new(10);
        logger.timing("detect", 18.5);
        logger.timing("detect", 21.5);
        logger.timing("recognize", 5.0);

        let detect = logger.timings_for("detect").unwrap();
        assert_eq!(detect, [18.5, 21.5]);
        assert_eq!(logger.timings_for("recognize").unwrap().len(), 1);
        assert!(logger.timings_for("annotate").is_none());
    }

    #[test]
    fn test_summary_includes_stages_and_fps() {
        let mut logger = StdoutEngineLogger::new(10);
        logger.frame_done(100);
        logger.timing("detect", 20.0);
        logger.timing("annotate", 1.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("detect"));
        assert!(summary.contains("annotate"));
        assert!(summary.contains("fps"));
        assert!(summary.contains("100 frames"));
    }

    #[test]
    fn test_summary_before_any_frame_returns_none() {
        let logger = StdoutEngineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_frame_done_tracks_latest_index() {
        let mut logger = StdoutEngineLogger::new(10);
        for i in 1..=20 {
            logger.frame_done(i);
        }
        assert_eq!(logger.frames_seen, 20);
    }

    #[test]
    fn test_default_throttle() {
        let logger = StdoutEngineLogger::default();
        assert_eq!(logger.throttle_frames, 25);
    }
}
