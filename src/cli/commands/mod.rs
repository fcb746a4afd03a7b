//! CLI command implementations

pub mod config;
pub mod history;
pub mod serve;

pub use config::execute as config;
pub use history::execute as history;
pub use serve::execute as serve;
