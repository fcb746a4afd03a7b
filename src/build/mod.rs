//! Builds: what to build, how it runs, and its observable state

pub mod pipeline;
pub mod repository;
pub mod state;

pub use pipeline::{Pipeline, CLONE_DIR, LOG_FILE};
pub use repository::Repository;
pub use state::{Build, BuildId, BuildStatus, BuildSummary};
