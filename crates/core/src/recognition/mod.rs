pub mod engine;
pub mod gallery;
pub mod infrastructure;
