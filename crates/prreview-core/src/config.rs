use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrReviewError;

/// File suffixes that never reach the assistant: media, fonts, lockfiles,
/// markup and configuration formats.
pub const DEFAULT_IGNORE_EXTENSIONS: &[&str] = &[
    ".yml", ".css", ".json", ".lock", ".env", ".txt", ".png", ".jpg", ".jpeg", ".gif", ".svg",
    ".ico", ".ttf", ".woff", ".woff2", ".eot", ".otf", ".webp", ".md", ".htm", ".xml", ".jsonld",
    ".csv", ".yaml", ".toml",
];

/// Instructional prompt sent ahead of the aggregated diff.
pub const DEFAULT_PROMPT: &str = "\
You are a seasoned code reviewer. Analyze the following cumulative diff of a pull request \
and give a firm, to-the-point review. Only comment on changes introduced by the diff; do not \
speculate about code you cannot see. Format the response as Markdown with exactly these sections:

# PR Code Review Analysis

## Summary:
A concise summary of what the diff changes. No reminders to add TODOs, change environment \
variables, or double-check things.

## Changes:
Bullet points listing only functional code changes, each ending with the file name. Ignore \
formatting, styling and test-only edits.

## Detailed Observations:
Bullet points listing only functional issues or likely bugs introduced by the diff. No generic \
advice such as \"verify behavior\" or \"check accessibility\".

## Fixes and Improvements:
Bullet points with actionable fixes for the issues above, each ending with the file name in \
parentheses. Only include specific, value-adding corrections to core functionality.
";

/// Top-level configuration loaded from `.prreview.toml`.
///
/// Every section is optional; omitted values fall back to the built-in
/// defaults. Process inputs (owner, repo, PR number, tokens) are not part of
/// the file and come from the environment.
///
/// # Examples
///
/// ```
/// use prreview_core::PrReviewConfig;
///
/// let config = PrReviewConfig::default();
/// assert_eq!(config.review.min_diff_size, 75);
/// assert_eq!(config.poll.interval_ms, 2000);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrReviewConfig {
    /// Source-hosting API settings.
    #[serde(default)]
    pub github: GitHubConfig,
    /// Assistant API settings.
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Diff filtering and gating.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Run status polling.
    #[serde(default)]
    pub poll: PollConfig,
}

impl PrReviewConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Io`] if the file cannot be read, or
    /// [`PrReviewError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, PrReviewError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Toml`] if parsing fails, and
    /// [`PrReviewError::Config`] if a value is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// use prreview_core::PrReviewConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// min_diff_size = 20
    /// "#;
    /// let config = PrReviewConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.min_diff_size, 20);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PrReviewError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make a run meaningless.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Config`] naming the offending key.
    pub fn validate(&self) -> Result<(), PrReviewError> {
        if self.assistant.assistant_id.trim().is_empty() {
            return Err(PrReviewError::Config(
                "assistant.assistant_id must not be empty".into(),
            ));
        }
        if self.poll.max_attempts == 0 {
            return Err(PrReviewError::Config(
                "poll.max_attempts must be at least 1".into(),
            ));
        }
        if self.review.all_ignore_extensions().any(|ext| ext.trim().is_empty()) {
            return Err(PrReviewError::Config(
                "review ignore extensions must not contain empty entries".into(),
            ));
        }
        Ok(())
    }
}

/// Source-hosting (GitHub REST) API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubConfig {
    /// API root, without a trailing slash.
    #[serde(default = "default_github_api_base")]
    pub api_base: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_github_api_base() -> String {
    "https://api.github.com".into()
}

fn default_http_timeout_secs() -> u64 {
    60
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: default_github_api_base(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Assistant (OpenAI Assistants v2) API settings.
///
/// # Examples
///
/// ```
/// use prreview_core::AssistantConfig;
///
/// let config = AssistantConfig::default();
/// assert_eq!(config.beta, "assistants=v2");
/// assert!(config.model.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssistantConfig {
    /// API root including the version segment, without a trailing slash.
    #[serde(default = "default_assistant_api_base")]
    pub api_base: String,
    /// Pre-configured assistant that performs the review.
    #[serde(default = "default_assistant_id")]
    pub assistant_id: String,
    /// Model override sent with the run; the assistant's own model when unset.
    pub model: Option<String>,
    /// Value of the `OpenAI-Beta` opt-in header.
    #[serde(default = "default_beta")]
    pub beta: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_assistant_api_base() -> String {
    "https://api.openai.com/v1".into()
}

fn default_assistant_id() -> String {
    "asst_JUTY7WIQ6hsKWEKWcVhQL78u".into()
}

fn default_beta() -> String {
    "assistants=v2".into()
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: default_assistant_api_base(),
            assistant_id: default_assistant_id(),
            model: None,
            beta: default_beta(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Diff filtering and relevance gate.
///
/// # Examples
///
/// ```
/// use prreview_core::ReviewConfig;
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.min_diff_size, 75);
/// assert!(config.ignore_extensions.iter().any(|e| e == ".lock"));
/// assert!(config.skip_patterns.is_empty());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReviewConfig {
    /// Size metric below which the review is skipped (default: 75).
    #[serde(default = "default_min_diff_size")]
    pub min_diff_size: usize,
    /// Filename suffixes that are never reviewed. Replaces the built-in list.
    #[serde(default = "default_ignore_extensions")]
    pub ignore_extensions: Vec<String>,
    /// Suffixes appended to `ignore_extensions`.
    #[serde(default)]
    pub extra_ignore_extensions: Vec<String>,
    /// Glob patterns (e.g. `"dist/**"`) that exclude matching paths.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
    /// Instructional prompt placed before the diff.
    #[serde(default = "default_prompt")]
    pub prompt: String,
}

fn default_min_diff_size() -> usize {
    75
}

fn default_ignore_extensions() -> Vec<String> {
    DEFAULT_IGNORE_EXTENSIONS
        .iter()
        .map(|ext| (*ext).to_string())
        .collect()
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.into()
}

impl ReviewConfig {
    /// Every suffix that excludes a file: the base list plus the extras.
    pub fn all_ignore_extensions(&self) -> impl Iterator<Item = &str> {
        self.ignore_extensions
            .iter()
            .chain(&self.extra_ignore_extensions)
            .map(String::as_str)
    }
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            min_diff_size: default_min_diff_size(),
            ignore_extensions: default_ignore_extensions(),
            extra_ignore_extensions: Vec::new(),
            skip_patterns: Vec::new(),
            prompt: default_prompt(),
        }
    }
}

/// Run status polling policy.
///
/// # Examples
///
/// ```
/// use prreview_core::PollConfig;
///
/// let config = PollConfig::default();
/// assert_eq!(config.max_attempts, 450);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PollConfig {
    /// Delay between status checks in milliseconds (default: 2000).
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Status checks before giving up (default: 450, i.e. 15 minutes).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_interval_ms() -> u64 {
    2000
}

fn default_max_attempts() -> u32 {
    450
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}
