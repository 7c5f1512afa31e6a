use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{info, warn};

use crate::clients::{IssueSource, Summarizer};
use crate::core::models::Issue;
use crate::errors::DigestError;
use crate::issues::issue_timeline;
use crate::prompt::serialize_timeline;

/// Fetch one issue's recent timeline and summarize it.
///
/// # Errors
///
/// Returns `TimelineFetchError` or `SummarizationError`; both are isolated
/// to this issue by the caller.
pub async fn summarize_issue(
    source: &dyn IssueSource,
    summarizer: &dyn Summarizer,
    issue: &Issue,
    cutoff: DateTime<Utc>,
    context_query: &str,
) -> Result<String, DigestError> {
    let timeline = issue_timeline(source, issue, Some(cutoff)).await?;
    let serialized = serialize_timeline(&timeline)
        .map_err(|e| DigestError::SummarizationError(format!("timeline serialize: {e}")))?;
    let completion = summarizer.summarize(&serialized, context_query).await?;
    info!("Completion for {}: {}", issue.html_url, completion);
    Ok(completion)
}

/// Summarizes every issue concurrently. Each issue gets its own result, in
/// the same order as `issues`; one failure never affects another.
pub async fn summarize_all(
    source: &dyn IssueSource,
    summarizer: &dyn Summarizer,
    issues: &[Issue],
    cutoff: DateTime<Utc>,
    context_query: &str,
) -> Vec<Result<String, DigestError>> {
    join_all(
        issues
            .iter()
            .map(|issue| summarize_issue(source, summarizer, issue, cutoff, context_query)),
    )
    .await
}

/// Attaches successful summaries to their issues and logs the failures.
/// Returns how many issues received a summary.
pub fn attach_summaries(issues: &mut [Issue], results: Vec<Result<String, DigestError>>) -> usize {
    let mut attached = 0;
    for (issue, result) in issues.iter_mut().zip(results) {
        match result {
            Ok(summary) => {
                if issue.summary.is_none() {
                    issue.summary = Some(summary);
                    attached += 1;
                }
            }
            Err(e) => {
                warn!("Error summarizing issue {}: {}", issue.html_url, e);
            }
        }
    }
    attached
}
