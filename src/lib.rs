/// Issue Digest - posts a digest of matching GitHub issues to a Discussion.
///
/// Each run searches issues and pull requests with a query, finds or creates
/// a Discussion by title and category, optionally summarizes each issue's
/// recent timeline with a language model, and appends one markdown comment
/// listing the issues.
///
/// # Architecture
///
/// The system uses:
/// - reqwest for the GitHub REST and GraphQL APIs
/// - openai-api-rs message types for the chat-completion summarizer
/// - futures for paging streams and the per-issue summary fan-out
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use issue_digest::clients::{GithubClient, LlmClient, Summarizer};
/// use issue_digest::core::config::AppConfig;
/// use issue_digest::worker::DigestRun;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     issue_digest::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let github = GithubClient::from_config(&config)?;
///     let llm = LlmClient::from_config(&config)?;
///
///     let outcome = DigestRun::new(config, &github, &github, Some(&llm as &dyn Summarizer))
///         .execute(chrono::Utc::now())
///         .await?;
///
///     if let Some(url) = outcome.discussion_url() {
///         println!("Digest posted to {url}");
///     }
///     Ok(())
/// }
/// ```
// Module declarations
pub mod clients;
pub mod core;
pub mod discussions;
pub mod errors;
pub mod issues;
pub mod prompt;
pub mod utils;
pub mod worker;

pub use clients::llm_client::estimate_tokens;

/// Configure structured JSON logging.
///
/// The filter defaults to `info` and honours `RUST_LOG`. Calling this more
/// than once keeps the first subscriber.
///
/// # Example
///
/// ```
/// issue_digest::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
