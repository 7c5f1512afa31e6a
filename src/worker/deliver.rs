use chrono::{DateTime, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::core::models::Issue;
use crate::errors::DigestError;
use crate::utils::time::format_distance_to_now;

pub const PROJECT_URL: &str = "https://github.com/sethrylan/issue-digest";
const MODELS_URL: &str = "https://github.com/marketplace/models";

/// Renders one digest line: `* <url> (<state> <relative time>)`, followed
/// by `: <summary>` when a non-empty summary is attached.
#[must_use]
pub fn issue_line(issue: &Issue, now: DateTime<Utc>) -> String {
    let (state_word, at) = if let Some(closed_at) = issue.closed_at {
        ("closed", closed_at)
    } else if issue.updated_at > issue.created_at {
        ("updated", issue.updated_at)
    } else {
        ("created", issue.created_at)
    };

    let mut line = format!(
        "* {} ({} {})",
        issue.html_url,
        state_word,
        format_distance_to_now(at, now)
    );

    if let Some(summary) = issue.summary.as_deref().map(single_line)
        && !summary.is_empty()
    {
        line.push_str(": ");
        line.push_str(&summary);
    }
    line
}

/// One newline-terminated line per issue, in the given order.
#[must_use]
pub fn issues_to_markdown(issues: &[Issue], now: DateTime<Utc>) -> String {
    issues
        .iter()
        .map(|issue| format!("{}\n", issue_line(issue, now)))
        .collect()
}

/// The comment posted to the discussion: optional prefix line, then the digest.
#[must_use]
pub fn comment_body(prefix: &str, digest: &str) -> String {
    let separator = if prefix.is_empty() { "" } else { "\n" };
    format!("{prefix}{separator} {digest}")
}

/// Footer appended to the intro of a newly created discussion.
#[must_use]
pub fn discussion_footer(query: &str, workflow_run_url: &str, models_enabled: bool) -> String {
    let models_disclaimer = if models_enabled {
        format!(
            " This workflow uses <a href=\"{MODELS_URL}\">GitHub Models</a> to summarize the issues at the time of writing; review the linked issues for the latest and most accurate info."
        )
    } else {
        String::new()
    };

    format!(
        "<hr /><em>This discussion was prompted <a href='https://github.com/search?q={}'>by a search query</a> in a <a href='{}'>workflow run</a> using <a href='{}'>issue-digest</a>.{}</em>",
        urlencoding::encode(query),
        workflow_run_url,
        PROJECT_URL,
        models_disclaimer
    )
}

/// Appends `name=value` to the runner's output file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be written.
pub fn write_action_output(path: &Path, name: &str, value: &str) -> Result<(), DigestError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| DigestError::ConfigError(format!("cannot open {}: {e}", path.display())))?;
    writeln!(file, "{name}={value}")
        .map_err(|e| DigestError::ConfigError(format!("cannot write {}: {e}", path.display())))
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
