use std::fmt;
use std::time::Duration;

use octocrab::service::middleware::retry::RetryConfig;
use prreview_core::{ChangedFile, GitHubConfig, PrReviewError};
use reqwest::header::{HeaderName, ACCEPT};
use tracing::{debug, info};

/// Page size requested from the files endpoint (the API maximum).
const FILES_PER_PAGE: usize = 100;

/// The files endpoint stops at 3000 entries.
const MAX_FILE_PAGES: usize = 30;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Identifies one pull request.
///
/// # Examples
///
/// ```
/// use prreview_review::github::PullRequestRef;
///
/// let pr = PullRequestRef::new("octocat", "hello-world", 42);
/// assert_eq!(pr.to_string(), "octocat/hello-world#42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Repository owner (user or organisation).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
}

impl PullRequestRef {
    /// Build a reference from its parts.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// GitHub client for collecting pull request files and posting comments.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GitHubClient {
    /// Create a client for `token` against the configured API root.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Config`] if the token is empty or the API
    /// root is not a valid URI, and [`PrReviewError::GitHub`] if a client
    /// cannot be built.
    pub fn new(token: &str, config: &GitHubConfig) -> Result<Self, PrReviewError> {
        if token.trim().is_empty() {
            return Err(PrReviewError::Config("GITHUB_TOKEN is empty".into()));
        }
        let api_base = config.api_base.trim_end_matches('/').to_string();
        let timeout = Duration::from_secs(config.timeout_secs);

        // Comment POSTs must not be replayed.
        let octocrab = octocrab::Octocrab::builder()
            .add_retry_config(RetryConfig::None)
            .set_connect_timeout(Some(timeout))
            .set_read_timeout(Some(timeout))
            .set_write_timeout(Some(timeout))
            .add_header(ACCEPT, GITHUB_ACCEPT.to_string())
            .add_header(
                HeaderName::from_static("x-github-api-version"),
                GITHUB_API_VERSION.to_string(),
            )
            .personal_token(token.to_string())
            .base_uri(api_base.as_str())
            .map_err(|e| PrReviewError::Config(format!("invalid github.api_base: {e}")))?
            .build()
            .map_err(|e| {
                PrReviewError::github(None, format!("failed to create GitHub client: {e}"))
            })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("prreview/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                PrReviewError::github(None, format!("failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            octocrab,
            http,
            token: token.to_string(),
            api_base,
        })
    }

    /// Fetch every changed file of a pull request, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::GitHub`] on network errors or any
    /// non-success status.
    pub async fn list_changed_files(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<ChangedFile>, PrReviewError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_base, pr.owner, pr.repo, pr.number
        );

        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let response = self
                .http
                .get(&url)
                .query(&[("per_page", FILES_PER_PAGE), ("page", page)])
                .header("Authorization", format!("Bearer {}", self.token))
                .header(ACCEPT, GITHUB_ACCEPT)
                .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
                .send()
                .await
                .map_err(|e| {
                    PrReviewError::github(None, format!("failed to list PR files: {e}"))
                })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(PrReviewError::github(Some(status.as_u16()), body));
            }

            let batch: Vec<ChangedFile> = response.json().await.map_err(|e| {
                PrReviewError::github(None, format!("failed to decode PR files: {e}"))
            })?;
            let len = batch.len();
            files.extend(batch);
            debug!(%pr, page, len, "fetched files page");

            if len < FILES_PER_PAGE {
                break;
            }
        }

        info!(%pr, files = files.len(), "collected changed files");
        Ok(files)
    }

    /// Post `body` as a conversation comment on the pull request.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::GitHub`] on API errors.
    pub async fn post_comment(&self, pr: &PullRequestRef, body: &str) -> Result<(), PrReviewError> {
        let route = format!(
            "/repos/{}/{}/issues/{}/comments",
            pr.owner, pr.repo, pr.number
        );
        let payload = serde_json::json!({ "body": body });

        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| PrReviewError::github(None, format!("failed to post comment: {e}")))?;

        info!(%pr, chars = body.len(), "posted comment");
        Ok(())
    }
}
