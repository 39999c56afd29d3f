pub mod annotator;
pub mod engine;
pub mod engine_logger;
pub mod frame_source;
pub mod infrastructure;
