//! In-memory build cache
//!
//! Tracks builds by id with a bounded size. Eviction only forgets the
//! in-memory handle; the build directory and its log stay on disk and
//! show up as history.
//!
//! # Rank
//!
//! | Order | Entries                                  |
//! |-------|------------------------------------------|
//! | 1     | Running builds, newest first             |
//! | 2     | Finished builds (success or failure), newest first |
//!
//! Listings use this order and eviction drops from the bottom of it.

mod rank;
mod registry;

pub use rank::Tracked;
pub use registry::BuildCache;
