use chrono::{DateTime, Duration, TimeZone, Utc};

use issue_digest::core::models::Issue;
use issue_digest::worker::deliver::{
    PROJECT_URL, comment_body, discussion_footer, issue_line, issues_to_markdown,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

fn issue(number: u64, created_ago: Duration) -> Issue {
    let created = now() - created_ago;
    Issue {
        url: format!("https://api.github.com/repos/octo/widgets/issues/{number}"),
        html_url: format!("https://github.com/octo/widgets/issues/{number}"),
        id: number,
        number,
        title: format!("Issue {number}"),
        created_at: created,
        updated_at: created,
        closed_at: None,
        state: "open".to_string(),
        locked: false,
        summary: None,
    }
}

#[test]
fn test_closed_issue_reports_close_time() {
    let mut closed = issue(1, Duration::days(10));
    closed.updated_at = now() - Duration::hours(1);
    closed.closed_at = Some(now() - Duration::hours(3));

    assert_eq!(
        issue_line(&closed, now()),
        "* https://github.com/octo/widgets/issues/1 (closed about 3 hours ago)"
    );
}

#[test]
fn test_updated_issue_reports_update_time() {
    let mut updated = issue(2, Duration::days(10));
    updated.updated_at = now() - Duration::minutes(30);

    assert_eq!(
        issue_line(&updated, now()),
        "* https://github.com/octo/widgets/issues/2 (updated 30 minutes ago)"
    );
}

#[test]
fn test_untouched_issue_reports_creation_time() {
    let created = issue(3, Duration::days(2));

    assert_eq!(
        issue_line(&created, now()),
        "* https://github.com/octo/widgets/issues/3 (created 2 days ago)"
    );
}

#[test]
fn test_summary_is_appended_on_the_same_line() {
    let mut summarized = issue(4, Duration::days(2));
    summarized.summary = Some("`@octocat` added the\nbug label.".to_string());

    let line = issue_line(&summarized, now());
    assert_eq!(
        line,
        "* https://github.com/octo/widgets/issues/4 (created 2 days ago): `@octocat` added the bug label."
    );

    summarized.summary = Some("   ".to_string());
    assert!(issue_line(&summarized, now()).ends_with("(created 2 days ago)"));
}

#[test]
fn test_markdown_has_one_line_per_issue_in_order() {
    let issues = vec![
        issue(9, Duration::days(1)),
        issue(4, Duration::days(2)),
        issue(7, Duration::days(3)),
    ];

    let markdown = issues_to_markdown(&issues, now());
    let lines: Vec<&str> = markdown.lines().collect();

    assert_eq!(lines.len(), 3);
    assert!(markdown.ends_with('\n'));
    assert!(lines[0].contains("/issues/9 "));
    assert!(lines[1].contains("/issues/4 "));
    assert!(lines[2].contains("/issues/7 "));
    assert_eq!(issues_to_markdown(&[], now()), "");
}

#[test]
fn test_comment_body_prefix() {
    assert_eq!(comment_body("", "* a\n"), " * a\n");
    assert_eq!(comment_body("New today:", "* a\n"), "New today:\n * a\n");
}

#[test]
fn test_footer_links_query_run_and_project() {
    let footer = discussion_footer(
        "repo:octo/widgets is:open",
        "https://github.com/octo/widgets/actions/runs/42",
        false,
    );

    assert!(footer.starts_with("<hr /><em>"));
    assert!(footer.ends_with("</em>"));
    assert!(footer.contains("https://github.com/search?q=repo%3Aocto%2Fwidgets%20is%3Aopen"));
    assert!(footer.contains("https://github.com/octo/widgets/actions/runs/42"));
    assert!(footer.contains(PROJECT_URL));
    assert!(!footer.contains("GitHub Models"));

    let with_models = discussion_footer("is:open", "https://example.com/run", true);
    assert!(with_models.contains("GitHub Models"));
}
