use std::time::Duration;

use prreview_core::{AssistantConfig, PrReviewError, ReviewResult, ReviewThread, RunStatus};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::poll::PollPolicy;

/// Author of a thread message.
///
/// # Examples
///
/// ```
/// use prreview_review::assistant::Role;
///
/// assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Human input.
    User,
    /// Assistant reply.
    Assistant,
}

/// Body of `POST /threads/{id}/messages`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMessage<'a> {
    /// Always [`Role::User`] for review requests.
    pub role: Role,
    /// Prompt followed by the aggregated diff.
    pub content: &'a str,
}

#[derive(Serialize)]
struct NewRun<'a> {
    assistant_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Deserialize)]
struct RunState {
    status: RunStatus,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<ThreadMessage>,
}

#[derive(Deserialize)]
struct ThreadMessage {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<TextContent>,
}

#[derive(Deserialize)]
struct TextContent {
    value: String,
}

/// How a review request ended when no transport error occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run completed and produced this reply.
    Completed(ReviewResult),
    /// The run reached a terminal status other than `completed`.
    Ended(RunStatus),
}

/// Client for the OpenAI Assistants v2 thread/run protocol.
///
/// # Examples
///
/// ```
/// use prreview_core::AssistantConfig;
/// use prreview_review::assistant::AssistantClient;
///
/// let client = AssistantClient::new("sk-test", &AssistantConfig::default()).unwrap();
/// assert_eq!(client.assistant_id(), "asst_JUTY7WIQ6hsKWEKWcVhQL78u");
/// ```
pub struct AssistantClient {
    client: reqwest::Client,
    config: AssistantConfig,
    api_key: String,
}

impl AssistantClient {
    /// Create a new client from an API key and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Config`] if the key is empty and
    /// [`PrReviewError::Assistant`] if the HTTP client cannot be built.
    pub fn new(api_key: &str, config: &AssistantConfig) -> Result<Self, PrReviewError> {
        if api_key.trim().is_empty() {
            return Err(PrReviewError::Config("OPENAI_API_KEY is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                PrReviewError::assistant(None, format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            config: config.clone(),
            api_key: api_key.to_string(),
        })
    }

    /// Return the assistant identifier from the configuration.
    pub fn assistant_id(&self) -> &str {
        &self.config.assistant_id
    }

    /// Run the full create-thread / add-message / run / poll / fetch protocol.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Assistant`] on any HTTP failure,
    /// [`PrReviewError::UnexpectedResponse`] if the reply has no text, and
    /// [`PrReviewError::PollTimeout`] if the run outlives `policy`.
    pub async fn request_review(
        &self,
        content: &str,
        policy: &PollPolicy,
    ) -> Result<RunOutcome, PrReviewError> {
        let mut thread = self.create_thread().await?;
        self.add_message(&thread, content).await?;
        self.start_run(&mut thread).await?;
        let status = self.wait_for_run(&mut thread, policy).await?;

        if status != RunStatus::Completed {
            warn!(thread_id = %thread.thread_id, %status, "assistant run did not complete");
            return Ok(RunOutcome::Ended(status));
        }

        let body_text = self.fetch_reply(&thread).await?;
        Ok(RunOutcome::Completed(ReviewResult { body_text }))
    }

    /// `POST /threads`.
    pub async fn create_thread(&self) -> Result<ReviewThread, PrReviewError> {
        let url = self.url("threads");
        let created: Created = self
            .send(self.post(&url).json(&serde_json::json!({})), "create thread")
            .await?;
        debug!(thread_id = %created.id, "created thread");
        Ok(ReviewThread::new(created.id))
    }

    /// `POST /threads/{id}/messages` with a single user message.
    pub async fn add_message(
        &self,
        thread: &ReviewThread,
        content: &str,
    ) -> Result<(), PrReviewError> {
        let url = self.url(&format!("threads/{}/messages", thread.thread_id));
        let message = NewMessage {
            role: Role::User,
            content,
        };
        let _: serde_json::Value = self
            .send(self.post(&url).json(&message), "add message")
            .await?;
        debug!(thread_id = %thread.thread_id, chars = content.len(), "added message");
        Ok(())
    }

    /// `POST /threads/{id}/runs`; records the run id on `thread`.
    pub async fn start_run(&self, thread: &mut ReviewThread) -> Result<(), PrReviewError> {
        let url = self.url(&format!("threads/{}/runs", thread.thread_id));
        let body = NewRun {
            assistant_id: &self.config.assistant_id,
            model: self.config.model.as_deref(),
        };
        let created: Created = self
            .send(self.post(&url).json(&body), "start run")
            .await?;
        info!(thread_id = %thread.thread_id, run_id = %created.id, "started assistant run");
        thread.run_id = Some(created.id);
        thread.status = RunStatus::Queued;
        Ok(())
    }

    /// `GET /threads/{id}/runs/{run_id}`.
    pub async fn run_status(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunStatus, PrReviewError> {
        let url = self.url(&format!("threads/{thread_id}/runs/{run_id}"));
        let state: RunState = self.send(self.get(&url), "get run status").await?;
        Ok(state.status)
    }

    /// Poll the thread's run under `policy` and record the final status.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::Config`] if no run was started on `thread`.
    pub async fn wait_for_run(
        &self,
        thread: &mut ReviewThread,
        policy: &PollPolicy,
    ) -> Result<RunStatus, PrReviewError> {
        let Some(run_id) = thread.run_id.clone() else {
            return Err(PrReviewError::Config(format!(
                "thread {} has no run to wait for",
                thread.thread_id
            )));
        };
        let thread_id = thread.thread_id.clone();

        let status = policy
            .wait_for_terminal(|_| self.run_status(&thread_id, &run_id))
            .await?;
        info!(%thread_id, %run_id, %status, "assistant run finished");
        thread.status = status;
        Ok(status)
    }

    /// `GET /threads/{id}/messages`; returns the first message's first text block.
    ///
    /// # Errors
    ///
    /// Returns [`PrReviewError::UnexpectedResponse`] if the list is empty or
    /// the first block carries no text.
    pub async fn fetch_reply(&self, thread: &ReviewThread) -> Result<String, PrReviewError> {
        let url = self.url(&format!("threads/{}/messages", thread.thread_id));
        let list: MessageList = self.send(self.get(&url), "list messages").await?;
        first_text_value(list).ok_or_else(|| {
            PrReviewError::UnexpectedResponse(format!(
                "thread {} has no text reply",
                thread.thread_id
            ))
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.api_base.trim_end_matches('/'))
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.get(url))
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.post(url))
    }

    // Content-Type is set up front so `.json()` does not add a second one.
    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("OpenAI-Beta", &self.config.beta)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        action: &str,
    ) -> Result<T, PrReviewError> {
        let response = request
            .send()
            .await
            .map_err(|e| PrReviewError::assistant(None, format!("{action} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(PrReviewError::assistant(
                Some(status.as_u16()),
                format!("{action}: {body_text}"),
            ));
        }

        response.json().await.map_err(|e| {
            PrReviewError::UnexpectedResponse(format!("{action}: failed to parse response: {e}"))
        })
    }
}

fn first_text_value(list: MessageList) -> Option<String> {
    list.data
        .into_iter()
        .next()?
        .content
        .into_iter()
        .next()?
        .text
        .map(|t| t.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: serde_json::Value) -> Option<String> {
        first_text_value(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn empty_key_is_rejected() {
        let result = AssistantClient::new("", &AssistantConfig::default());
        assert!(matches!(result, Err(PrReviewError::Config(_))));
    }

    #[test]
    fn url_joins_without_double_slash() {
        let config = AssistantConfig {
            api_base: "http://localhost:1234/v1/".into(),
            ..AssistantConfig::default()
        };
        let client = AssistantClient::new("sk", &config).unwrap();
        assert_eq!(client.url("threads"), "http://localhost:1234/v1/threads");
    }

    #[test]
    fn first_text_value_takes_first_block_of_first_message() {
        let reply = parse(serde_json::json!({
            "data": [
                { "content": [
                    { "type": "text", "text": { "value": "newest", "annotations": [] } },
                    { "type": "text", "text": { "value": "second block" } }
                ] },
                { "content": [ { "type": "text", "text": { "value": "older" } } ] }
            ]
        }));
        assert_eq!(reply.as_deref(), Some("newest"));
    }

    #[test]
    fn first_text_value_is_none_for_missing_parts() {
        assert_eq!(parse(serde_json::json!({ "data": [] })), None);
        assert_eq!(parse(serde_json::json!({ "data": [ { "content": [] } ] })), None);
        assert_eq!(
            parse(serde_json::json!({
                "data": [ { "content": [ { "type": "image_file", "image_file": { "file_id": "f" } } ] } ]
            })),
            None
        );
    }

    #[test]
    fn new_run_omits_unset_model() {
        let body = NewRun {
            assistant_id: "asst_1",
            model: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "assistant_id": "asst_1" })
        );
    }

    #[test]
    fn new_message_serializes_user_role() {
        let message = NewMessage {
            role: Role::User,
            content: "diff",
        };
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            serde_json::json!({ "role": "user", "content": "diff" })
        );
    }
}
