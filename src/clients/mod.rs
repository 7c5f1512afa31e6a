//! Client modules for external API interactions

pub mod github_client;
pub mod llm_client;

use async_trait::async_trait;

use crate::core::models::{
    CommentRef, Discussion, DiscussionCategory, Issue, IssueRef, RepoRef, TimelineEvent,
};
use crate::core::pagination::Page;
use crate::errors::DigestError;

pub use github_client::GithubClient;
pub use llm_client::LlmClient;

/// Page-level access to issue search and issue timelines.
#[async_trait]
pub trait IssueSource: Send + Sync {
    async fn search_page(
        &self,
        query: &str,
        cursor: Option<String>,
    ) -> Result<Page<Issue>, DigestError>;

    async fn timeline_page(
        &self,
        issue: &IssueRef,
        cursor: Option<String>,
    ) -> Result<Page<TimelineEvent>, DigestError>;
}

/// Remote discussion operations for one repository.
#[async_trait]
pub trait DiscussionStore: Send + Sync {
    async fn list_categories(&self, repo: &RepoRef)
    -> Result<Vec<DiscussionCategory>, DigestError>;

    async fn discussions_page(
        &self,
        repo: &RepoRef,
        cursor: Option<String>,
    ) -> Result<Page<Discussion>, DigestError>;

    async fn repository_id(&self, repo: &RepoRef) -> Result<String, DigestError>;

    async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Discussion, DigestError>;

    async fn add_comment(&self, discussion_id: &str, body: &str)
    -> Result<CommentRef, DigestError>;
}

/// Turns a serialized timeline into one sentence of prose.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        serialized_timeline: &str,
        context_query: &str,
    ) -> Result<String, DigestError>;
}
