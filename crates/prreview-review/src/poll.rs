//! Bounded fixed-interval polling.

use std::future::Future;
use std::time::Duration;

use prreview_core::{PollConfig, PrReviewError, RunStatus};
use tokio::time::Instant;
use tracing::debug;

/// How often and how long to wait for a run to finish.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use prreview_core::PollConfig;
/// use prreview_review::poll::PollPolicy;
///
/// let policy = PollPolicy::from_config(&PollConfig::default());
/// assert_eq!(policy.interval, Duration::from_secs(2));
/// assert_eq!(policy.max_attempts, 450);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive checks.
    pub interval: Duration,
    /// Upper bound on the number of checks.
    pub max_attempts: u32,
}

impl PollPolicy {
    /// Build a policy from the `[poll]` section.
    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            max_attempts: config.max_attempts,
        }
    }

    /// Longest time a full poll can take, ignoring request latency.
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }

    /// Call `check` until it reports a terminal [`RunStatus`].
    ///
    /// `check` receives the 1-based attempt number. Sleeps `interval` between
    /// checks, never after the last one.
    ///
    /// # Errors
    ///
    /// Propagates the first error from `check`, and returns
    /// [`PrReviewError::PollTimeout`] once `max_attempts` checks have all
    /// reported non-terminal statuses.
    pub async fn wait_for_terminal<F, Fut>(&self, mut check: F) -> Result<RunStatus, PrReviewError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<RunStatus, PrReviewError>>,
    {
        let started = Instant::now();
        for attempt in 1..=self.max_attempts {
            let status = check(attempt).await?;
            debug!(attempt, %status, "polled run status");
            if status.is_terminal() {
                return Ok(status);
            }
            if attempt < self.max_attempts {
                tokio::time::sleep(self.interval).await;
            }
        }

        Err(PrReviewError::PollTimeout {
            attempts: self.max_attempts,
            elapsed: started.elapsed(),
        })
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}
