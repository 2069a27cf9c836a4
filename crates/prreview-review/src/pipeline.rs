//! The collect, gate, review and publish sequence for one pull request.

use prreview_core::{PrReviewConfig, PrReviewError, ReviewConfig, ReviewOutcome};
use prreview_difflens::{aggregate, DiffFilter};
use tracing::{info, warn};

use crate::assistant::{AssistantClient, RunOutcome};
use crate::github::{GitHubClient, PullRequestRef};
use crate::poll::PollPolicy;
use crate::prompt;

/// Review orchestrator that drives one pull request from files to comment.
///
/// Collects changed files, aggregates and gates them, asks the assistant for
/// a review, and publishes the result. Every step is awaited in order.
pub struct ReviewPipeline {
    github: GitHubClient,
    assistant: AssistantClient,
    filter: DiffFilter,
    review: ReviewConfig,
    poll: PollPolicy,
}

impl ReviewPipeline {
    /// Create a new pipeline from the two API clients and configuration.
    pub fn new(github: GitHubClient, assistant: AssistantClient, config: &PrReviewConfig) -> Self {
        Self {
            github,
            assistant,
            filter: DiffFilter::from_config(&config.review),
            review: config.review.clone(),
            poll: PollPolicy::from_config(&config.poll),
        }
    }

    /// Review `pr` and return how the run ended.
    ///
    /// A diff below `review.min_diff_size` gets a skip notice and never
    /// reaches the assistant. A run that ends in anything but `completed`
    /// posts nothing.
    ///
    /// # Errors
    ///
    /// Propagates any [`PrReviewError`] from either API; no step is retried.
    pub async fn run(&self, pr: &PullRequestRef) -> Result<ReviewOutcome, PrReviewError> {
        let files = self.github.list_changed_files(pr).await?;
        let diff = aggregate(&files, &self.filter);
        info!(
            %pr,
            included = diff.included.len(),
            skipped = diff.skipped.len(),
            size = diff.size_metric,
            threshold = self.review.min_diff_size,
            "aggregated pull request diff"
        );

        if !diff.meets_threshold(self.review.min_diff_size) {
            self.github
                .post_comment(pr, &prompt::skip_notice(diff.size_metric))
                .await?;
            return Ok(ReviewOutcome::Skipped {
                size_metric: diff.size_metric,
            });
        }

        let message = prompt::build_review_message(&self.review.prompt, &diff.text);
        match self.assistant.request_review(&message, &self.poll).await? {
            RunOutcome::Completed(result) => {
                self.github.post_comment(pr, &result.body_text).await?;
                Ok(ReviewOutcome::Posted(result))
            }
            RunOutcome::Ended(status) => {
                warn!(%pr, %status, "no review posted");
                Ok(ReviewOutcome::AssistantFailed { status })
            }
        }
    }
}
