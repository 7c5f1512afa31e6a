//! Discussion resolution: category lookup, find-or-create, and the single
//! comment append of a run.

use futures::TryStreamExt;
use futures::pin_mut;
use tracing::{debug, info};

use crate::clients::DiscussionStore;
use crate::core::models::{CommentRef, Discussion, DiscussionCategory, RepoRef};
use crate::core::pagination::paginate;
use crate::errors::DigestError;

/// Resolves a category by exact, case-sensitive name.
///
/// # Errors
///
/// Returns `CategoryNotFoundError` when no category carries that name, or
/// the store's error when the listing fails.
pub async fn resolve_category(
    store: &dyn DiscussionStore,
    repo: &RepoRef,
    name: &str,
) -> Result<DiscussionCategory, DigestError> {
    info!("Finding discussion categories in {}", repo);
    let categories = store.list_categories(repo).await?;
    let category = categories.into_iter().find(|category| category.name == name);
    debug!("Discussion category: {:?}", category);
    category.ok_or_else(|| DigestError::CategoryNotFoundError(name.to_string()))
}

/// Walks the discussion listing until a discussion with this exact title and
/// category shows up. The first match in listing order wins.
///
/// # Errors
///
/// Returns the store's error if any page fails to load.
pub async fn find_discussion(
    store: &dyn DiscussionStore,
    repo: &RepoRef,
    title: &str,
    category_id: &str,
) -> Result<Option<Discussion>, DigestError> {
    info!("Finding discussion with title: {} in {}", title, repo);

    let pages = paginate(|cursor| store.discussions_page(repo, cursor));
    pin_mut!(pages);

    while let Some(page) = pages.try_next().await? {
        debug!("discussion page length: {}", page.len());
        if let Some(found) = page
            .into_iter()
            .find(|d| d.title == title && d.category_id == category_id)
        {
            return Ok(Some(found));
        }
    }

    debug!("discussion listing exhausted");
    Ok(None)
}

/// Where the run's discussion stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscussionState {
    Unresolved,
    /// Searched, nothing matched yet.
    Searching,
    Found(Discussion),
    Creating,
    Created(Discussion),
    Commented(Discussion, CommentRef),
}

/// Tracks the one discussion a run writes to.
///
/// A discussion is only created after a search came back empty, and only
/// one comment is ever appended.
pub struct DiscussionDirectory<'a> {
    store: &'a dyn DiscussionStore,
    repo: RepoRef,
    state: DiscussionState,
}

impl<'a> DiscussionDirectory<'a> {
    #[must_use]
    pub fn new(store: &'a dyn DiscussionStore, repo: RepoRef) -> Self {
        Self {
            store,
            repo,
            state: DiscussionState::Unresolved,
        }
    }

    #[must_use]
    pub fn state(&self) -> &DiscussionState {
        &self.state
    }

    /// # Errors
    ///
    /// See [`resolve_category`].
    pub async fn resolve_category(&self, name: &str) -> Result<DiscussionCategory, DigestError> {
        resolve_category(self.store, &self.repo, name).await
    }

    /// Searches for the discussion. Allowed until a create has started.
    ///
    /// # Errors
    ///
    /// Returns `DiscussionLookupError` once a discussion was created or
    /// commented on, or the store's error.
    pub async fn find_discussion(
        &mut self,
        title: &str,
        category_id: &str,
    ) -> Result<Option<Discussion>, DigestError> {
        match self.state {
            DiscussionState::Unresolved
            | DiscussionState::Searching
            | DiscussionState::Found(_) => {}
            _ => {
                return Err(DigestError::DiscussionLookupError(
                    "discussion already resolved for this run".to_string(),
                ));
            }
        }

        self.state = DiscussionState::Searching;
        let found = find_discussion(self.store, &self.repo, title, category_id).await?;
        if let Some(discussion) = &found {
            self.state = DiscussionState::Found(discussion.clone());
        }
        Ok(found)
    }

    /// Creates the discussion. Only valid right after a search found nothing.
    ///
    /// # Errors
    ///
    /// Returns `DiscussionCreateError` from any other state, or when the
    /// repository lookup or mutation fails.
    pub async fn create_discussion(
        &mut self,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Discussion, DigestError> {
        if self.state != DiscussionState::Searching {
            return Err(DigestError::DiscussionCreateError(format!(
                "refusing to create a discussion from state {:?}",
                self.state
            )));
        }

        self.state = DiscussionState::Creating;
        let repository_id = self.store.repository_id(&self.repo).await?;
        let discussion = self
            .store
            .create_discussion(&repository_id, category_id, title, body)
            .await?;
        info!("Discussion created: {}", discussion.url);
        self.state = DiscussionState::Created(discussion.clone());
        Ok(discussion)
    }

    /// Returns the matching discussion, creating it with `body` if absent.
    /// The flag is `true` when this call created it.
    ///
    /// # Errors
    ///
    /// See [`DiscussionDirectory::find_discussion`] and
    /// [`DiscussionDirectory::create_discussion`].
    pub async fn find_or_create(
        &mut self,
        title: &str,
        category_id: &str,
        body: &str,
    ) -> Result<(Discussion, bool), DigestError> {
        if let Some(found) = self.find_discussion(title, category_id).await? {
            info!("Discussion found: {}", found.url);
            return Ok((found, false));
        }

        info!("Discussion not found.");
        let created = self.create_discussion(category_id, title, body).await?;
        Ok((created, true))
    }

    /// Appends the run's single comment to the resolved discussion.
    ///
    /// # Errors
    ///
    /// Returns `CommentError` when no discussion is resolved, a comment was
    /// already added, or the mutation fails.
    pub async fn add_comment(&mut self, body: &str) -> Result<CommentRef, DigestError> {
        let discussion = match &self.state {
            DiscussionState::Found(d) | DiscussionState::Created(d) => d.clone(),
            DiscussionState::Commented(..) => {
                return Err(DigestError::CommentError(
                    "a comment was already added in this run".to_string(),
                ));
            }
            other => {
                return Err(DigestError::CommentError(format!(
                    "no discussion resolved (state {other:?})"
                )));
            }
        };

        let comment = self.store.add_comment(&discussion.id, body).await?;
        info!("Discussion updated: {}", comment.url);
        self.state = DiscussionState::Commented(discussion, comment.clone());
        Ok(comment)
    }
}
