//! The activity store is a single JSON document, see [persistence::JsonStoreFile].
//! The basic idea is:
//!  - Every sampling tick upserts a raw sample for the 5 minute bucket it falls into.
//!  - Once enough samples pile up they are compacted into ranges of same-status buckets.
//!  - Ranges can carry a tag and a note. Tagging never splits a range.
//!  - The document is always replaced as a whole.

pub mod activity_store;
pub mod compactor;
pub mod entities;
pub mod persistence;

pub use activity_store::Store;
pub use entities::{Range, Status};
pub use persistence::{JsonStoreFile, StoreRepository};
