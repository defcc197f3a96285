//! Read side of the store. Everything here reconstructs per-bucket status from raw samples and
//! ranges, then aggregates it into timelines, period tables, goal progress and tag totals.
//! Functions are generic over the time zone so calendar boundaries follow the caller's zone.

pub mod focus;
pub mod goal;
pub mod periods;
pub mod resolver;
pub mod tags;
pub mod timeline;
