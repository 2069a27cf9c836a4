//! Pull-request review orchestration.
//!
//! Provides the GitHub client that collects changed files and publishes
//! comments, the Assistants API client that runs the review, the polling
//! policy, prompt construction, and the [`pipeline::ReviewPipeline`] that
//! drives one run end to end.

pub mod assistant;
pub mod github;
pub mod pipeline;
pub mod poll;
pub mod prompt;
