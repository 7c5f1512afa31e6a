//! Issue search and timeline retrieval.

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tracing::{debug, info};

use crate::clients::IssueSource;
use crate::core::models::{Issue, TimelineEvent};
use crate::core::pagination::paginate;
use crate::errors::DigestError;
use crate::utils::filters::filter_recent_events;
use crate::utils::links::issue_ref_from_html_url;

/// Runs a search to exhaustion and returns every match in result order.
///
/// # Errors
///
/// Returns `SearchError` if any page fails; no partial list is returned.
pub async fn search_issues(
    source: &dyn IssueSource,
    query: &str,
) -> Result<Vec<Issue>, DigestError> {
    info!("Using query: {}", query);

    let pages: Vec<Vec<Issue>> = paginate(|cursor| source.search_page(query, cursor))
        .try_collect()
        .await?;
    let issues: Vec<Issue> = pages.into_iter().flatten().collect();

    info!("{} issues found.", issues.len());
    Ok(issues)
}

/// Fetches an issue's full timeline, keeping only events newer than
/// `cutoff` when one is given.
///
/// # Errors
///
/// Returns `TimelineFetchError` if the issue URL cannot be parsed or a page
/// fails to load.
pub async fn issue_timeline(
    source: &dyn IssueSource,
    issue: &Issue,
    cutoff: Option<DateTime<Utc>>,
) -> Result<Vec<TimelineEvent>, DigestError> {
    let issue_ref = issue_ref_from_html_url(&issue.html_url, issue.number).ok_or_else(|| {
        DigestError::TimelineFetchError(format!("cannot parse issue url {}", issue.html_url))
    })?;

    info!(
        "Fetching timeline for issue: {}, owner: {}, repo: {}, issue number: {}",
        issue.html_url, issue_ref.repo.owner, issue_ref.repo.name, issue_ref.number
    );

    let pages: Vec<Vec<TimelineEvent>> = paginate(|cursor| source.timeline_page(&issue_ref, cursor))
        .try_collect()
        .await?;
    let events = pages.into_iter().flatten();

    let timeline = match cutoff {
        Some(cutoff) => filter_recent_events(events, cutoff),
        None => events.collect(),
    };
    debug!("Timeline for {} has {} events", issue.html_url, timeline.len());
    Ok(timeline)
}
