//! Records whether the user is working or idle in 5 minute buckets and reports on it.
//! A small daemon samples idle time from the desktop into a single JSON document, the cli reads
//! the same document to print timelines, period totals, goal progress and tag breakdowns.
//!

pub mod cli;
pub mod daemon;
pub mod fs;
pub mod probe;
pub mod query;
pub mod store;
pub mod utils;
