//! Core types shared across the crate.
//!
//! All time values are nanoseconds (i64); see [`time`] for the conversions
//! between byte offsets, seconds and the `MM:SS` strings used by seeking.

pub mod time;

pub use time::{Time, ZERO};
