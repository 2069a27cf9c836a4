use std::path::{Path, PathBuf};

use clap::Parser;
use miette::Result;
use prreview_core::{PrReviewConfig, ReviewOutcome};
use prreview_review::assistant::AssistantClient;
use prreview_review::github::{GitHubClient, PullRequestRef};
use prreview_review::pipeline::ReviewPipeline;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit status when the assistant run ends without completing.
const EXIT_ASSISTANT_FAILED: i32 = 3;

const DEFAULT_CONFIG_FILE: &str = ".prreview.toml";

#[derive(Parser)]
#[command(
    name = "prreview",
    version,
    about = "Review a pull request with a hosted assistant and post the result",
    long_about = "Review a pull request with a hosted assistant and post the result.\n\n\
                  Fetches the PR's changed files, drops media/lockfile/config patches, and\n\
                  posts a skip notice when the remaining diff is too small. Otherwise sends\n\
                  the diff to an OpenAI assistant, waits for the run, and posts its reply\n\
                  as a PR comment.\n\n\
                  Meant for CI: every input comes from the environment.\n\n\
                  Exit codes:\n  \
                    0  comment posted (review or skip notice)\n  \
                    1  API or configuration error\n  \
                    2  usage error (missing input)\n  \
                    3  assistant run failed; nothing posted"
)]
struct Cli {
    /// Repository owner
    #[arg(long, env = "OWNER")]
    owner: String,

    /// Repository name
    #[arg(long, env = "REPO")]
    repo: String,

    /// Pull request number
    #[arg(long, env = "PR_NUMBER")]
    pr_number: u64,

    /// GitHub token with pull request read and issue write access
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: String,

    /// Path to configuration file (default: .prreview.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "warn,prreview=debug,prreview_difflens=debug,prreview_review=debug"
    } else {
        "warn,prreview=info,prreview_difflens=info,prreview_review=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<PrReviewConfig> {
    let config = match explicit {
        Some(path) => PrReviewConfig::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                PrReviewConfig::from_file(default_path)?
            } else {
                PrReviewConfig::default()
            }
        }
    };
    Ok(config)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    debug!(
        github = %config.github.api_base,
        assistant = %config.assistant.api_base,
        assistant_id = %config.assistant.assistant_id,
        min_diff_size = config.review.min_diff_size,
        "loaded configuration"
    );

    let pr = PullRequestRef::new(cli.owner, cli.repo, cli.pr_number);
    let github = GitHubClient::new(&cli.github_token, &config.github)?;
    let assistant = AssistantClient::new(&cli.openai_api_key, &config.assistant)?;
    let pipeline = ReviewPipeline::new(github, assistant, &config);

    info!(%pr, "starting review");
    let outcome = pipeline.run(&pr).await?;
    println!("{outcome}");

    if let ReviewOutcome::AssistantFailed { .. } = outcome {
        std::process::exit(EXIT_ASSISTANT_FAILED);
    }
    Ok(())
}
