/// Number of tracking slots. Allocated once at engine construction,
/// recycled in place, never resized.
pub const POOL_SIZE: usize = 2;

/// Run the detector every Nth frame; other frames coast.
pub const DETECT_INTERVAL: usize = 4;

/// Detection runs at half capture resolution; slot rects scale back up
/// by this factor for annotation and published snapshots.
pub const DETECT_SCALE: i32 = 2;

/// Max center-to-center distance (px) to associate a detection with a slot.
pub const GATE_RADIUS: f64 = 150.0;

/// Tighter re-acquisition gate for LOST slots, to avoid grabbing a
/// different face that wandered nearby.
pub const LOST_GATE_RADIUS: f64 = 80.0;

/// Rect smoothing: weight of the old position.
pub const SMOOTHING_ALPHA: f64 = 0.6;

/// Lost frames tolerated before a LOST slot is recycled to IDLE.
pub const MAX_LOST_FRAMES: u32 = 5;

/// Confidence required to enter CONFIRMED.
pub const CONFIRM_THRESHOLD: f64 = 3.0;

/// Confidence ceiling.
pub const MAX_CONFIDENCE: f64 = 5.0;

/// Embedding distance below which a match is accepted (strict).
pub const RECOG_ACCEPT: f64 = 0.50;

/// Embedding distance below which a match is ambiguous (gray band).
pub const RECOG_GRAY: f64 = 0.60;

/// Descriptor cadence (frames) while SEARCHING — fast convergence.
pub const REC_INTERVAL_SEARCHING: usize = 6;

/// Descriptor cadence (frames) while CONFIRMED — steady-state savings.
pub const REC_INTERVAL_CONFIRMED: usize = 15;

/// Target cadence for the worker loop.
pub const TARGET_FPS: f64 = 25.0;
