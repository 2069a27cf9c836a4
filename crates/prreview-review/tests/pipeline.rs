use prreview_core::{PrReviewConfig, PrReviewError, ReviewOutcome, RunStatus};
use prreview_review::assistant::AssistantClient;
use prreview_review::github::{GitHubClient, PullRequestRef};
use prreview_review::pipeline::ReviewPipeline;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILES: &str = "/repos/octo/app/pulls/12/files";
const COMMENTS: &str = "/repos/octo/app/issues/12/comments";

struct Servers {
    github: MockServer,
    openai: MockServer,
}

impl Servers {
    async fn start() -> Self {
        Self {
            github: MockServer::start().await,
            openai: MockServer::start().await,
        }
    }

    fn pipeline(&self, max_attempts: u32) -> ReviewPipeline {
        let mut config = PrReviewConfig::default();
        config.github.api_base = self.github.uri();
        config.assistant.api_base = format!("{}/v1", self.openai.uri());
        config.assistant.assistant_id = "asst_test".into();
        config.poll.interval_ms = 5;
        config.poll.max_attempts = max_attempts;

        let github = GitHubClient::new("ghp_test", &config.github).unwrap();
        let assistant = AssistantClient::new("sk-test", &config.assistant).unwrap();
        ReviewPipeline::new(github, assistant, &config)
    }

    async fn serve_files(&self, files: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(FILES))
            .respond_with(ResponseTemplate::new(200).set_body_json(files))
            .expect(1)
            .mount(&self.github)
            .await;
    }

    async fn expect_comment(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path(COMMENTS))
            .and(body_json(serde_json::json!({ "body": body })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": 99 })))
            .expect(1)
            .mount(&self.github)
            .await;
    }

    async fn forbid_comments(&self) {
        Mock::given(method("POST"))
            .and(path(COMMENTS))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&self.github)
            .await;
    }

    async fn forbid_assistant(&self) {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&self.openai)
            .await;
    }

    /// Thread, message and run creation, each expected exactly once.
    async fn accept_run(&self) {
        Mock::given(method("POST"))
            .and(path("/v1/threads"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(header("OpenAI-Beta", "assistants=v2"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "thread_1" })),
            )
            .expect(1)
            .mount(&self.openai)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/threads/thread_1/messages"))
            .and(body_string_contains("You are a seasoned code reviewer."))
            .and(body_string_contains("### File: src/App.tsx"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "msg_1" })),
            )
            .expect(1)
            .mount(&self.openai)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/threads/thread_1/runs"))
            .and(body_json(serde_json::json!({ "assistant_id": "asst_test" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "run_1" })),
            )
            .expect(1)
            .mount(&self.openai)
            .await;
    }

    /// Serve `first` once, then `then` for every later status check.
    async fn run_statuses(&self, first: &str, then: &str) {
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/runs/run_1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "run_1", "status": first })),
            )
            .up_to_n_times(1)
            .mount(&self.openai)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/threads/thread_1/runs/run_1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": "run_1", "status": then })),
            )
            .mount(&self.openai)
            .await;
    }
}

fn pr() -> PullRequestRef {
    PullRequestRef::new("octo", "app", 12)
}

fn large_patch(markers: usize) -> String {
    let mut patch = String::from("@@ -1,3 +1,80 @@");
    for i in 0..markers {
        patch.push_str(&format!("\n+const line{i} = {i};"));
    }
    patch.push('\n');
    patch
}

#[tokio::test]
async fn stylesheet_only_pr_posts_skip_notice() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "app.css", "patch": "@@ -1 +1 @@\n-a {}\n+b {}" }
        ]))
        .await;
    servers
        .expect_comment("Skipping AI review: Diff size (0) is below threshold.")
        .await;
    servers.forbid_assistant().await;

    let outcome = servers.pipeline(3).run(&pr()).await.unwrap();
    assert_eq!(outcome, ReviewOutcome::Skipped { size_metric: 0 });
}

#[tokio::test]
async fn small_source_diff_reports_its_size() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "src/main.rs", "patch": large_patch(74) },
            { "filename": "Cargo.lock", "patch": large_patch(500) }
        ]))
        .await;
    servers
        .expect_comment("Skipping AI review: Diff size (74) is below threshold.")
        .await;
    servers.forbid_assistant().await;

    let outcome = servers.pipeline(3).run(&pr()).await.unwrap();
    assert_eq!(outcome, ReviewOutcome::Skipped { size_metric: 74 });
}

#[tokio::test]
async fn completed_run_posts_review_verbatim() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "src/App.tsx", "patch": large_patch(80) },
            { "filename": "logo.svg" }
        ]))
        .await;
    servers.accept_run().await;
    servers.run_statuses("in_progress", "completed").await;
    let review = "# PR Code Review Analysis\n\n## Summary:\nAdds eighty constants.";
    Mock::given(method("GET"))
        .and(path("/v1/threads/thread_1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "object": "list",
            "data": [
                { "role": "assistant", "content": [ { "type": "text", "text": { "value": review, "annotations": [] } } ] },
                { "role": "user", "content": [ { "type": "text", "text": { "value": "prompt", "annotations": [] } } ] }
            ]
        })))
        .expect(1)
        .mount(&servers.openai)
        .await;
    servers.expect_comment(review).await;

    let outcome = servers.pipeline(5).run(&pr()).await.unwrap();
    match outcome {
        ReviewOutcome::Posted(result) => assert_eq!(result.body_text, review),
        other => panic!("expected a posted review, got {other:?}"),
    }
}

#[tokio::test]
async fn failed_run_posts_nothing() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "src/App.tsx", "patch": large_patch(90) }
        ]))
        .await;
    servers.accept_run().await;
    servers.run_statuses("queued", "failed").await;
    servers.forbid_comments().await;

    let outcome = servers.pipeline(5).run(&pr()).await.unwrap();
    assert_eq!(
        outcome,
        ReviewOutcome::AssistantFailed {
            status: RunStatus::Failed
        }
    );
    assert!(!outcome.comment_posted());
}

#[tokio::test]
async fn expired_run_counts_as_failure() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "src/App.tsx", "patch": large_patch(90) }
        ]))
        .await;
    servers.accept_run().await;
    servers.run_statuses("expired", "expired").await;
    servers.forbid_comments().await;

    let outcome = servers.pipeline(5).run(&pr()).await.unwrap();
    assert_eq!(
        outcome,
        ReviewOutcome::AssistantFailed {
            status: RunStatus::Expired
        }
    );
}

#[tokio::test]
async fn stuck_run_times_out() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "src/App.tsx", "patch": large_patch(90) }
        ]))
        .await;
    servers.accept_run().await;
    servers.run_statuses("queued", "in_progress").await;
    servers.forbid_comments().await;

    let err = servers.pipeline(3).run(&pr()).await.unwrap_err();
    assert!(
        matches!(err, PrReviewError::PollTimeout { attempts: 3, .. }),
        "expected poll timeout, got {err:?}"
    );
}

#[tokio::test]
async fn github_failure_aborts_before_assistant() {
    let servers = Servers::start().await;
    Mock::given(method("GET"))
        .and(path(FILES))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(1)
        .mount(&servers.github)
        .await;
    servers.forbid_assistant().await;
    servers.forbid_comments().await;

    let err = servers.pipeline(3).run(&pr()).await.unwrap_err();
    assert!(matches!(
        err,
        PrReviewError::GitHub {
            status: Some(404),
            ..
        }
    ));
}

#[tokio::test]
async fn assistant_rejection_aborts_without_comment() {
    let servers = Servers::start().await;
    servers
        .serve_files(serde_json::json!([
            { "filename": "src/App.tsx", "patch": large_patch(90) }
        ]))
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/threads"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&servers.openai)
        .await;
    servers.forbid_comments().await;

    let err = servers.pipeline(3).run(&pr()).await.unwrap_err();
    match err {
        PrReviewError::Assistant { status, message } => {
            assert_eq!(status, Some(401));
            assert!(message.contains("create thread"));
        }
        other => panic!("expected assistant error, got {other:?}"),
    }
}
