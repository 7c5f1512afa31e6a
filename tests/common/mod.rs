#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use issue_digest::clients::{DiscussionStore, IssueSource, Summarizer};
use issue_digest::core::config::{AppConfig, DigestQuery};
use issue_digest::core::models::{
    CommentRef, Discussion, DiscussionCategory, Issue, IssueRef, RepoRef, TimelineEvent,
};
use issue_digest::core::pagination::Page;
use issue_digest::errors::DigestError;

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub fn repo() -> RepoRef {
    RepoRef::parse("octo/widgets").unwrap()
}

pub fn issue(number: u64) -> Issue {
    let created = now() - Duration::days(3);
    Issue {
        url: format!("https://api.github.com/repos/octo/widgets/issues/{number}"),
        html_url: format!("https://github.com/octo/widgets/issues/{number}"),
        id: 1000 + number,
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

pub fn recent_event(number: u64) -> TimelineEvent {
    TimelineEvent {
        id: Some(number),
        event: Some("commented".to_string()),
        body: Some(format!("activity on #{number}")),
        created_at: Some(now() - Duration::hours(1)),
        ..TimelineEvent::default()
    }
}

pub fn config(models_enabled: bool) -> AppConfig {
    AppConfig {
        repository: repo(),
        query: DigestQuery {
            query: "repo:octo/widgets is:open".to_string(),
            lookback: Duration::hours(24),
        },
        title: "Issue Digest for 2024-06-15".to_string(),
        intro: "Hello there!".to_string(),
        comment: String::new(),
        discussion_category: "General".to_string(),
        models_enabled,
        github_token: "token".to_string(),
        models_token: "token".to_string(),
        api_url: "https://api.github.com".to_string(),
        graphql_url: "https://api.github.com/graphql".to_string(),
        models_endpoint: "https://models.github.ai/inference".to_string(),
        models_model: "openai/gpt-4o-mini".to_string(),
        workflow_run_url: "https://github.com/octo/widgets/actions/runs/1".to_string(),
    }
}

/// In-memory GitHub: issue search, timelines and discussions.
#[derive(Default)]
pub struct FakeGithub {
    pub search_pages: Vec<Vec<Issue>>,
    pub fail_search: bool,
    pub timelines: HashMap<u64, Vec<TimelineEvent>>,
    pub failing_timelines: HashSet<u64>,
    pub categories: Vec<DiscussionCategory>,
    pub discussion_pages: Mutex<Vec<Vec<Discussion>>>,
    pub fail_create: bool,
    pub fail_comment: bool,
    pub calls: Mutex<Vec<String>>,
    pub comments: Mutex<Vec<(String, String)>>,
}

impl FakeGithub {
    pub fn with_issues(issues: Vec<Issue>) -> Self {
        let timelines = issues
            .iter()
            .map(|i| (i.number, vec![recent_event(i.number)]))
            .collect();
        Self {
            search_pages: vec![issues],
            timelines,
            categories: vec![
                DiscussionCategory {
                    id: "CAT_ANN".to_string(),
                    name: "Announcements".to_string(),
                },
                DiscussionCategory {
                    id: "CAT_GEN".to_string(),
                    name: "General".to_string(),
                },
            ],
            ..Self::default()
        }
    }

    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

fn page_at<T: Clone>(pages: &[Vec<T>], cursor: Option<String>) -> Page<T> {
    let index: usize = cursor.map_or(0, |c| c.parse().unwrap());
    let items = pages.get(index).cloned().unwrap_or_default();
    let next = (index + 1 < pages.len()).then(|| (index + 1).to_string());
    Page::new(items, next)
}

#[async_trait]
impl IssueSource for FakeGithub {
    async fn search_page(
        &self,
        query: &str,
        cursor: Option<String>,
    ) -> Result<Page<Issue>, DigestError> {
        self.record(format!("search:{query}"));
        if self.fail_search {
            return Err(DigestError::SearchError("search unavailable".to_string()));
        }
        Ok(page_at(&self.search_pages, cursor))
    }

    async fn timeline_page(
        &self,
        issue: &IssueRef,
        _cursor: Option<String>,
    ) -> Result<Page<TimelineEvent>, DigestError> {
        self.record(format!("timeline:{}", issue.number));
        if self.failing_timelines.contains(&issue.number) {
            return Err(DigestError::TimelineFetchError(format!(
                "timeline {} unavailable",
                issue.number
            )));
        }
        Ok(Page::last(
            self.timelines.get(&issue.number).cloned().unwrap_or_default(),
        ))
    }
}

#[async_trait]
impl DiscussionStore for FakeGithub {
    async fn list_categories(
        &self,
        _repo: &RepoRef,
    ) -> Result<Vec<DiscussionCategory>, DigestError> {
        self.record("categories");
        Ok(self.categories.clone())
    }

    async fn discussions_page(
        &self,
        _repo: &RepoRef,
        cursor: Option<String>,
    ) -> Result<Page<Discussion>, DigestError> {
        self.record(format!("discussions:{}", cursor.clone().unwrap_or_default()));
        let pages = self.discussion_pages.lock().unwrap().clone();
        Ok(page_at(&pages, cursor))
    }

    async fn repository_id(&self, _repo: &RepoRef) -> Result<String, DigestError> {
        self.record("repository_id");
        Ok("R_1".to_string())
    }

    async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        _body: &str,
    ) -> Result<Discussion, DigestError> {
        self.record(format!("create:{repository_id}:{category_id}:{title}"));
        if self.fail_create {
            return Err(DigestError::DiscussionCreateError("forbidden".to_string()));
        }
        let discussion = Discussion {
            id: "D_new".to_string(),
            title: title.to_string(),
            url: "https://github.com/octo/widgets/discussions/99".to_string(),
            category_id: category_id.to_string(),
        };
        self.discussion_pages
            .lock()
            .unwrap()
            .push(vec![discussion.clone()]);
        Ok(discussion)
    }

    async fn add_comment(
        &self,
        discussion_id: &str,
        body: &str,
    ) -> Result<CommentRef, DigestError> {
        self.record(format!("comment:{discussion_id}"));
        if self.fail_comment {
            return Err(DigestError::CommentError("locked".to_string()));
        }
        self.comments
            .lock()
            .unwrap()
            .push((discussion_id.to_string(), body.to_string()));
        Ok(CommentRef {
            url: format!("https://github.com/octo/widgets/discussions/99#comment-{discussion_id}"),
        })
    }
}

/// Summarizes by echoing the issue marker found in the timeline; fails for
/// the markers listed in `failing`.
#[derive(Default)]
pub struct FakeSummarizer {
    pub failing: HashSet<u64>,
    pub delays_ms: HashMap<u64, u64>,
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl Summarizer for FakeSummarizer {
    async fn summarize(
        &self,
        serialized_timeline: &str,
        context_query: &str,
    ) -> Result<String, DigestError> {
        self.queries.lock().unwrap().push(context_query.to_string());
        let events: Vec<TimelineEvent> = serde_json::from_str(serialized_timeline)
            .map_err(|e| DigestError::SummarizationError(e.to_string()))?;
        let number = events
            .first()
            .and_then(|e| e.id)
            .ok_or_else(|| DigestError::SummarizationError("empty timeline".to_string()))?;

        if let Some(delay) = self.delays_ms.get(&number) {
            tokio::time::sleep(std::time::Duration::from_millis(*delay)).await;
        }
        if self.failing.contains(&number) {
            return Err(DigestError::SummarizationError(format!(
                "model timed out for #{number}"
            )));
        }
        Ok(format!("`@octocat` commented on #{number}."))
    }
}
