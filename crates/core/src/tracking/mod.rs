pub mod domain;
pub mod infrastructure;
pub mod slot;
pub mod slot_tracker;
pub mod state_machine;
