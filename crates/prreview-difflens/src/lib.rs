//! Pre-review diff filtering and aggregation.
//!
//! Drops files that are not worth an assistant's attention (media, lockfiles,
//! markup, configuration, anything without a patch), stitches the rest into
//! one labeled text blob, and measures its size for the relevance gate.

pub mod aggregate;
pub mod filter;

pub use aggregate::{aggregate, count_change_markers};
pub use filter::DiffFilter;
