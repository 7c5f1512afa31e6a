use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::core::models::{IssueRef, RepoRef};

/// Derive the `(owner, repo, number)` triple of an issue from its web URL.
///
/// Accepts both `/<owner>/<repo>/issues/<n>` and `/<owner>/<repo>/pull/<n>`.
/// The number in the path wins over `fallback_number` when present.
#[must_use]
pub fn issue_ref_from_html_url(html_url: &str, fallback_number: u64) -> Option<IssueRef> {
    let url = Url::parse(html_url).ok()?;
    let segments: Vec<&str> = url
        .path_segments()?
        .filter(|segment| !segment.is_empty())
        .collect();

    let (owner, name) = match segments.as_slice() {
        [owner, name, ..] => (*owner, *name),
        _ => return None,
    };

    let number = match segments.as_slice() {
        [_, _, "issues" | "pull" | "pulls", number, ..] => number.parse().ok()?,
        [_, _] => fallback_number,
        _ => return None,
    };

    Some(IssueRef {
        repo: RepoRef {
            owner: owner.to_string(),
            name: name.to_string(),
        },
        number,
    })
}

/// Extract the `rel="next"` target from a REST `Link` response header.
#[must_use]
pub fn next_page_link(link_header: &str) -> Option<String> {
    static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"<([^>]+)>\s*;\s*rel="([^"]+)""#)
            .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
    });

    LINK_RE
        .captures_iter(link_header)
        .find(|caps| {
            caps.get(2)
                .is_some_and(|rel| rel.as_str().split_whitespace().any(|r| r == "next"))
        })
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
