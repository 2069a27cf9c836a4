use std::fmt;

use serde::{Deserialize, Serialize};

/// One file touched by a pull request, as returned by the files endpoint.
///
/// Only `filename` and `patch` drive the review; the counters are carried
/// for logging.
///
/// # Examples
///
/// ```
/// use prreview_core::ChangedFile;
///
/// let file: ChangedFile = serde_json::from_str(
///     r#"{"filename": "src/lib.rs", "status": "modified", "patch": "@@ -1 +1 @@\n-a\n+b"}"#,
/// ).unwrap();
/// assert_eq!(file.filename, "src/lib.rs");
/// assert!(file.patch.is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    /// Path relative to the repository root.
    pub filename: String,
    /// Unified-diff fragment. Absent for binary or very large files.
    #[serde(default)]
    pub patch: Option<String>,
    /// `added`, `modified`, `removed`, `renamed`, ...
    #[serde(default)]
    pub status: Option<String>,
    /// Added line count reported by the host.
    #[serde(default)]
    pub additions: u64,
    /// Removed line count reported by the host.
    #[serde(default)]
    pub deletions: u64,
}

impl ChangedFile {
    /// Shorthand for a file with a filename and patch.
    pub fn new(filename: impl Into<String>, patch: Option<&str>) -> Self {
        Self {
            filename: filename.into(),
            patch: patch.map(str::to_string),
            ..Self::default()
        }
    }
}

/// The labeled concatenation of every reviewable patch in a pull request.
///
/// # Examples
///
/// ```
/// use prreview_core::AggregatedDiff;
///
/// let diff = AggregatedDiff::default();
/// assert!(diff.text.is_empty());
/// assert_eq!(diff.size_metric, 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedDiff {
    /// `### File: <name>` blocks, in input order.
    pub text: String,
    /// Count of `"\n+"` and `"\n-"` occurrences over the included patches.
    pub size_metric: usize,
    /// Filenames that contributed to `text`.
    pub included: Vec<String>,
    /// Files left out, with the reason.
    pub skipped: Vec<SkippedFile>,
}

impl AggregatedDiff {
    /// Whether the diff clears the relevance gate.
    ///
    /// # Examples
    ///
    /// ```
    /// use prreview_core::AggregatedDiff;
    ///
    /// let diff = AggregatedDiff { size_metric: 75, ..AggregatedDiff::default() };
    /// assert!(diff.meets_threshold(75));
    /// assert!(!diff.meets_threshold(76));
    /// ```
    pub fn meets_threshold(&self, min_size: usize) -> bool {
        self.size_metric >= min_size
    }
}

/// A file that was left out of the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedFile {
    /// Path of the skipped file.
    pub filename: String,
    /// Why the file was skipped.
    pub reason: SkipReason,
}

/// Reason a file was skipped.
///
/// # Examples
///
/// ```
/// use prreview_core::SkipReason;
///
/// let reason = SkipReason::IgnoredExtension(".lock".into());
/// assert_eq!(reason.to_string(), "ignored extension .lock");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    /// The host sent no patch (binary, too large, or pure rename).
    NoPatch,
    /// Filename ends with an ignored suffix.
    IgnoredExtension(String),
    /// Path matched a configured glob.
    PatternMatch(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoPatch => write!(f, "no patch"),
            SkipReason::IgnoredExtension(ext) => write!(f, "ignored extension {ext}"),
            SkipReason::PatternMatch(pat) => write!(f, "pattern: {pat}"),
        }
    }
}

/// Lifecycle state of an assistant run.
///
/// # Examples
///
/// ```
/// use prreview_core::RunStatus;
///
/// let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
/// assert_eq!(status, RunStatus::InProgress);
/// assert!(!status.is_terminal());
///
/// let odd: RunStatus = serde_json::from_str("\"paused\"").unwrap();
/// assert_eq!(odd, RunStatus::Unknown);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start.
    Queued,
    /// Executing.
    InProgress,
    /// Waiting on tool outputs.
    RequiresAction,
    /// Cancellation requested.
    Cancelling,
    /// Cancelled.
    Cancelled,
    /// Finished with an error.
    Failed,
    /// Finished successfully.
    Completed,
    /// Ended early on a token or turn limit.
    Incomplete,
    /// Exceeded the server-side deadline.
    Expired,
    /// Anything the API adds later.
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether polling can stop.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One request/response cycle with the assistant API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewThread {
    /// Conversation identifier.
    pub thread_id: String,
    /// Run identifier, once a run has been started.
    pub run_id: Option<String>,
    /// Last observed run status.
    pub status: RunStatus,
}

impl ReviewThread {
    /// A freshly created thread with no run yet.
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: None,
            status: RunStatus::Queued,
        }
    }
}

/// Text to post as the review comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// Markdown body, posted verbatim.
    pub body_text: String,
}

/// Terminal state of one review run.
///
/// # Examples
///
/// ```
/// use prreview_core::{ReviewOutcome, RunStatus};
///
/// let outcome = ReviewOutcome::AssistantFailed { status: RunStatus::Failed };
/// assert!(!outcome.comment_posted());
/// assert_eq!(outcome.to_string(), "Assistant run failed (failed).");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// Below the size threshold; the skip notice was posted.
    Skipped {
        /// The computed size metric.
        size_metric: usize,
    },
    /// The review was generated and posted.
    Posted(ReviewResult),
    /// The run ended in a non-`completed` terminal status; nothing posted.
    AssistantFailed {
        /// The terminal status reported by the API.
        status: RunStatus,
    },
}

impl ReviewOutcome {
    /// Whether a comment landed on the pull request.
    pub fn comment_posted(&self) -> bool {
        !matches!(self, ReviewOutcome::AssistantFailed { .. })
    }
}

impl fmt::Display for ReviewOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewOutcome::Skipped { size_metric } => {
                write!(f, "Skipped AI review (diff size {size_metric}).")
            }
            ReviewOutcome::Posted(_) => write!(f, "Review posted successfully."),
            ReviewOutcome::AssistantFailed { status } => {
                write!(f, "Assistant run failed ({status}).")
            }
        }
    }
}
