use std::time::Duration;

/// Errors that can occur while reviewing a pull request.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use prreview_core::PrReviewError;
///
/// let err = PrReviewError::Config("missing assistant id".into());
/// assert!(err.to_string().contains("missing assistant id"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PrReviewError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(help("check .prreview.toml or the OWNER/REPO/PR_NUMBER environment"))]
    Config(String),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Source-hosting API transport or status failure.
    #[error("GitHub API error{}: {message}", status_suffix(.status))]
    #[diagnostic(help("verify GITHUB_TOKEN has pull request and issue scopes"))]
    GitHub {
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        /// Human-readable detail.
        message: String,
    },

    /// Assistant API transport or status failure.
    #[error("assistant API error{}: {message}", status_suffix(.status))]
    #[diagnostic(help("verify OPENAI_API_KEY and the configured assistant id"))]
    Assistant {
        /// HTTP status, when the server answered at all.
        status: Option<u16>,
        /// Human-readable detail.
        message: String,
    },

    /// A response decoded but lacked the expected structure.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// The assistant run never reached a terminal status.
    #[error("assistant run did not finish after {attempts} polls ({}s)", .elapsed.as_secs())]
    #[diagnostic(help("raise [poll] max_attempts or check the run in the OpenAI dashboard"))]
    PollTimeout {
        /// Number of status checks performed.
        attempts: u32,
        /// Wall-clock time spent polling.
        elapsed: Duration,
    },
}

impl PrReviewError {
    /// Build a [`PrReviewError::GitHub`] from a status code and detail.
    pub fn github(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::GitHub {
            status,
            message: message.into(),
        }
    }

    /// Build a [`PrReviewError::Assistant`] from a status code and detail.
    pub fn assistant(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Assistant {
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" {code}"),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PrReviewError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = PrReviewError::Config("bad value".into());
        assert_eq!(err.to_string(), "configuration error: bad value");
    }

    #[test]
    fn github_error_includes_status_when_present() {
        let err = PrReviewError::github(Some(404), "Not Found");
        assert_eq!(err.to_string(), "GitHub API error 404: Not Found");

        let err = PrReviewError::github(None, "connection refused");
        assert_eq!(err.to_string(), "GitHub API error: connection refused");
    }

    #[test]
    fn poll_timeout_reports_attempts() {
        let err = PrReviewError::PollTimeout {
            attempts: 3,
            elapsed: Duration::from_secs(6),
        };
        assert_eq!(
            err.to_string(),
            "assistant run did not finish after 3 polls (6s)"
        );
    }
}
