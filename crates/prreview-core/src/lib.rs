//! Core types, configuration, and error handling for prreview.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`PrReviewError`] - unified error type using `thiserror`
//! - [`PrReviewConfig`] - configuration loaded from `.prreview.toml`
//! - Shared types: [`ChangedFile`], [`AggregatedDiff`], [`RunStatus`],
//!   [`ReviewThread`], [`ReviewResult`], [`ReviewOutcome`]

mod config;
mod error;
mod types;

pub use config::{
    AssistantConfig, GitHubConfig, PollConfig, PrReviewConfig, ReviewConfig, DEFAULT_PROMPT,
    DEFAULT_IGNORE_EXTENSIONS,
};
pub use error::PrReviewError;
pub use types::{
    AggregatedDiff, ChangedFile, ReviewOutcome, ReviewResult, ReviewThread, RunStatus,
    SkipReason, SkippedFile,
};

/// A convenience `Result` type for prreview operations.
pub type Result<T> = std::result::Result<T, PrReviewError>;
