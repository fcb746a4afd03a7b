//! Buildy - minimal build-triggering service
//!
//! Accepts a git repository over HTTP, clones it into a fresh directory,
//! runs the build in the background and keeps a bounded set of recent
//! builds in memory. Running builds are never evicted.

pub mod audit;
pub mod build;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod server;

pub use error::{BuildyError, BuildyResult};
