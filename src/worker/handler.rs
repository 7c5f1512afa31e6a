use chrono::{DateTime, Utc};
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::deliver::{comment_body, discussion_footer, issues_to_markdown};
use super::summarize::{attach_summaries, summarize_all};
use crate::clients::{DiscussionStore, IssueSource, Summarizer};
use crate::core::config::AppConfig;
use crate::core::models::{CommentRef, Discussion};
use crate::discussions::DiscussionDirectory;
use crate::errors::DigestError;
use crate::issues::search_issues;

/// What one run did.
#[derive(Debug, Clone, PartialEq)]
pub enum DigestOutcome {
    /// The search matched nothing; no discussion was touched.
    NoIssues,
    Posted {
        discussion: Discussion,
        created: bool,
        comment: CommentRef,
        issue_count: usize,
        summarized: usize,
    },
}

impl DigestOutcome {
    /// The discussion URL to report as the action output, if any.
    #[must_use]
    pub fn discussion_url(&self) -> Option<&str> {
        match self {
            DigestOutcome::NoIssues => None,
            DigestOutcome::Posted { discussion, .. } => Some(&discussion.url),
        }
    }
}

/// One digest run over explicit collaborators.
pub struct DigestRun<'a> {
    config: AppConfig,
    issues: &'a dyn IssueSource,
    discussions: &'a dyn DiscussionStore,
    summarizer: Option<&'a dyn Summarizer>,
}

impl<'a> DigestRun<'a> {
    #[must_use]
    pub fn new(
        config: AppConfig,
        issues: &'a dyn IssueSource,
        discussions: &'a dyn DiscussionStore,
        summarizer: Option<&'a dyn Summarizer>,
    ) -> Self {
        Self {
            config,
            issues,
            discussions,
            summarizer,
        }
    }

    /// Search, resolve the discussion, summarize, render and comment.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: search, category, discussion lookup,
    /// create or comment failure. Per-issue summary failures are only logged.
    pub async fn execute(self, now: DateTime<Utc>) -> Result<DigestOutcome, DigestError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("digest_run", %run_id, repo = %self.config.repository);
        self.run(now).instrument(span).await
    }

    async fn run(self, now: DateTime<Utc>) -> Result<DigestOutcome, DigestError> {
        let config = self.config;

        let mut issues = search_issues(self.issues, &config.query.query).await?;
        if issues.is_empty() {
            return Ok(DigestOutcome::NoIssues);
        }

        let mut directory = DiscussionDirectory::new(self.discussions, config.repository.clone());
        let category = directory
            .resolve_category(&config.discussion_category)
            .await?;
        info!("Discussion category: {} ({})", category.name, category.id);

        let body = format!(
            "{}{}",
            config.intro,
            discussion_footer(
                &config.query.query,
                &config.workflow_run_url,
                config.models_enabled
            )
        );
        let (discussion, created) = directory
            .find_or_create(&config.title, &category.id, &body)
            .await?;

        let mut summarized = 0;
        if config.models_enabled {
            match self.summarizer {
                Some(summarizer) => {
                    let cutoff = config.query.cutoff(now);
                    let results =
                        summarize_all(self.issues, summarizer, &issues, cutoff, &config.query.query)
                            .await;
                    summarized = attach_summaries(&mut issues, results);
                    info!("Summarized {} of {} issues", summarized, issues.len());
                }
                None => warn!("Summaries requested but no summarizer is configured"),
            }
        }

        let digest = issues_to_markdown(&issues, now);
        let comment = directory
            .add_comment(&comment_body(&config.comment, &digest))
            .await?;

        Ok(DigestOutcome::Posted {
            discussion,
            created,
            comment,
            issue_count: issues.len(),
            summarized,
        })
    }
}
