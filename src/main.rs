use anyhow::{Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

use issue_digest::clients::{GithubClient, LlmClient, Summarizer};
use issue_digest::core::config::AppConfig;
use issue_digest::worker::deliver::write_action_output;
use issue_digest::worker::{DigestOutcome, DigestRun};

async fn run() -> Result<()> {
    let config = AppConfig::from_env().context("Config error")?;
    let github = GithubClient::from_config(&config)?;
    let llm = if config.models_enabled {
        Some(LlmClient::from_config(&config)?)
    } else {
        None
    };

    let outcome = DigestRun::new(
        config,
        &github,
        &github,
        llm.as_ref().map(|client| client as &dyn Summarizer),
    )
    .execute(Utc::now())
    .await?;

    match &outcome {
        DigestOutcome::NoIssues => info!("No issues matched; nothing to post."),
        DigestOutcome::Posted {
            discussion,
            created,
            comment,
            issue_count,
            summarized,
        } => {
            info!(
                "Posted {} issues ({} summarized) to {} discussion {}: {}",
                issue_count,
                summarized,
                if *created { "new" } else { "existing" },
                discussion.url,
                comment.url
            );
        }
    }

    if let (Some(url), Some(path)) = (
        outcome.discussion_url(),
        std::env::var_os("GITHUB_OUTPUT").map(PathBuf::from),
    ) {
        write_action_output(&path, "discussionUrl", url)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    issue_digest::setup_logging();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Digest run failed: {:#}", e);
            // Workflow command so the failure shows up on the run summary.
            println!("::error::{e:#}");
            ExitCode::FAILURE
        }
    }
}
