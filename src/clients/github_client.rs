//! GitHub API client module
//!
//! One authenticated HTTP client for the REST search and timeline endpoints
//! and the GraphQL discussion API. Idempotent reads are retried with
//! exponential backoff; mutations are sent exactly once.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

use super::{DiscussionStore, IssueSource};
use crate::core::config::AppConfig;
use crate::core::models::{
    CommentRef, Discussion, DiscussionCategory, Issue, IssueRef, RepoRef, TimelineEvent,
};
use crate::core::pagination::Page;
use crate::errors::DigestError;
use crate::utils::links::next_page_link;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const RETRY_BASE: u64 = 2;
const RETRY_FACTOR_MS: u64 = 50;
const RETRY_ATTEMPTS: usize = 2;
const REST_PAGE_SIZE: &str = "100";
const CATEGORY_PAGE_SIZE: u32 = 50;
const DISCUSSION_PAGE_SIZE: u32 = 10;
const MAX_ERROR_BODY_CHARS: usize = 800;

const CATEGORIES_QUERY: &str = r"query($owner: String!, $name: String!, $first: Int!) {
  repository(owner: $owner, name: $name) {
    discussionCategories(first: $first) {
      nodes { id name }
    }
  }
}";

const DISCUSSIONS_QUERY: &str = r"query($owner: String!, $name: String!, $first: Int!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    discussions(first: $first, after: $cursor) {
      nodes { id title url category { id } }
      pageInfo { hasNextPage endCursor }
    }
  }
}";

const REPOSITORY_ID_QUERY: &str = r"query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) { id name }
}";

const CREATE_DISCUSSION_MUTATION: &str = r"mutation createDiscussion($input: CreateDiscussionInput!) {
  createDiscussion(input: $input) {
    discussion { id title url }
  }
}";

const ADD_COMMENT_MUTATION: &str = r"mutation addComment($discussionID: ID!, $body: String!) {
  addDiscussionComment(input: {discussionId: $discussionID, body: $body}) {
    clientMutationId
    comment { url }
  }
}";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    total_count: u64,
    #[serde(default)]
    incomplete_results: bool,
    items: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Debug, Deserialize)]
struct NodeList<T> {
    nodes: Option<Vec<Option<T>>>,
}

impl<T> NodeList<T> {
    fn into_items(self) -> Vec<T> {
        self.nodes.unwrap_or_default().into_iter().flatten().collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesRepository {
    discussion_categories: Option<NodeList<DiscussionCategory>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DiscussionNode {
    id: String,
    title: String,
    url: String,
    category: NodeId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionConnection {
    #[serde(default)]
    nodes: Option<Vec<Option<DiscussionNode>>>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct DiscussionsRepository {
    discussions: DiscussionConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateDiscussionData {
    create_discussion: Option<CreatedDiscussionPayload>,
}

#[derive(Debug, Deserialize)]
struct CreatedDiscussionPayload {
    discussion: Option<CreatedDiscussion>,
}

#[derive(Debug, Deserialize)]
struct CreatedDiscussion {
    id: String,
    title: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddCommentData {
    add_discussion_comment: Option<AddCommentPayload>,
}

#[derive(Debug, Deserialize)]
struct AddCommentPayload {
    comment: Option<CommentRef>,
}

/// A failed attempt, tagged with whether trying again could help.
#[derive(Debug)]
struct RequestFailure {
    retryable: bool,
    message: String,
}

impl RequestFailure {
    fn transport(error: &reqwest::Error) -> Self {
        Self {
            retryable: error.is_timeout() || error.is_connect() || error.is_request(),
            message: format!("request failed: {error}"),
        }
    }

    fn status(status: StatusCode, body: &str) -> Self {
        Self {
            retryable: is_retryable_status(status),
            message: format!(
                "failed with status {}: {}",
                status.as_u16(),
                truncate_for_error(body, MAX_ERROR_BODY_CHARS)
            ),
        }
    }

    fn decode(error: &reqwest::Error) -> Self {
        Self {
            retryable: false,
            message: format!("returned an undecodable body: {error}"),
        }
    }

    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

#[must_use]
pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn truncate_for_error(body: &str, max_chars: usize) -> String {
    if body.chars().count() <= max_chars {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(max_chars).collect();
        truncated.push_str("...");
        truncated
    }
}

/// GitHub API client shared by the search, timeline and discussion paths.
#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    api_url: String,
    graphql_url: String,
}

impl GithubClient {
    /// # Errors
    ///
    /// Returns `ConfigError` if the token cannot be used as a header value
    /// or the HTTP client cannot be built.
    pub fn new(api_url: &str, graphql_url: &str, token: &str) -> Result<Self, DigestError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("issue-digest"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static("2022-11-28"),
        );
        let auth = HeaderValue::from_str(&format!("Bearer {}", token.trim()))
            .map_err(|e| DigestError::ConfigError(format!("invalid GitHub token: {e}")))?;
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DigestError::ConfigError(format!("failed to build GitHub client: {e}")))?;

        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            graphql_url: graphql_url.to_string(),
        })
    }

    /// # Errors
    ///
    /// See [`GithubClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, DigestError> {
        Self::new(&config.api_url, &config.graphql_url, &config.github_token)
    }

    async fn attempt<T>(request: RequestBuilder) -> Result<(T, Option<String>), RequestFailure>
    where
        T: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestFailure::status(status, &body));
        }

        let next = response
            .headers()
            .get(LINK)
            .and_then(|value| value.to_str().ok())
            .and_then(next_page_link);
        let parsed = response
            .json::<T>()
            .await
            .map_err(|e| RequestFailure::decode(&e))?;
        Ok((parsed, next))
    }

    async fn with_retry<T, F>(
        &self,
        operation: &str,
        kind: fn(String) -> DigestError,
        request: F,
    ) -> Result<(T, Option<String>), DigestError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let strategy = ExponentialBackoff::from_millis(RETRY_BASE)
            .factor(RETRY_FACTOR_MS)
            .map(jitter)
            .take(RETRY_ATTEMPTS);
        let request = &request;

        RetryIf::spawn(
            strategy,
            move || async move {
                let result = Self::attempt(request()).await;
                if let Err(failure) = &result
                    && failure.is_retryable()
                {
                    warn!("GitHub {} attempt failed, may retry: {}", operation, failure.message);
                }
                result
            },
            RequestFailure::is_retryable,
        )
        .await
        .map_err(|failure| kind(format!("github api {operation} {}", failure.message)))
    }

    async fn graphql_query<T>(
        &self,
        operation: &str,
        kind: fn(String) -> DigestError,
        query: &str,
        variables: Value,
    ) -> Result<T, DigestError>
    where
        T: DeserializeOwned,
    {
        let payload = json!({ "query": query, "variables": variables });
        let (response, _) = self
            .with_retry(operation, kind, || self.http.post(&self.graphql_url).json(&payload))
            .await?;
        unwrap_graphql(operation, kind, response)
    }

    async fn graphql_mutation<T>(
        &self,
        operation: &str,
        kind: fn(String) -> DigestError,
        query: &str,
        variables: Value,
    ) -> Result<T, DigestError>
    where
        T: DeserializeOwned,
    {
        let payload = json!({ "query": query, "variables": variables });
        let request = self.http.post(&self.graphql_url).json(&payload);
        let (response, _) = Self::attempt(request)
            .await
            .map_err(|failure| kind(format!("github api {operation} {}", failure.message)))?;
        unwrap_graphql(operation, kind, response)
    }
}

fn unwrap_graphql<T>(
    operation: &str,
    kind: fn(String) -> DigestError,
    response: GraphqlResponse<T>,
) -> Result<T, DigestError> {
    if let Some(errors) = response.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(kind(format!(
            "github graphql {operation} returned errors: {}",
            messages.join("; ")
        )));
    }
    response
        .data
        .ok_or_else(|| kind(format!("github graphql {operation} returned no data")))
}

#[async_trait]
impl IssueSource for GithubClient {
    async fn search_page(
        &self,
        query: &str,
        cursor: Option<String>,
    ) -> Result<Page<Issue>, DigestError> {
        let (response, next): (SearchResponse, _) = self
            .with_retry("search issues", DigestError::SearchError, || match &cursor {
                Some(next_url) => self.http.get(next_url),
                None => self.http.get(format!("{}/search/issues", self.api_url)).query(&[
                    ("q", query),
                    ("per_page", REST_PAGE_SIZE),
                    ("advanced_search", "true"),
                ]),
            })
            .await?;

        if response.incomplete_results {
            warn!("GitHub reported incomplete search results for query: {}", query);
        }
        debug!(
            "Search page returned {} of {} issues",
            response.items.len(),
            response.total_count
        );
        Ok(Page::new(response.items, next))
    }

    async fn timeline_page(
        &self,
        issue: &IssueRef,
        cursor: Option<String>,
    ) -> Result<Page<TimelineEvent>, DigestError> {
        let (events, next): (Vec<TimelineEvent>, _) = self
            .with_retry("list timeline", DigestError::TimelineFetchError, || {
                match &cursor {
                    Some(next_url) => self.http.get(next_url),
                    None => self
                        .http
                        .get(format!(
                            "{}/repos/{}/{}/issues/{}/timeline",
                            self.api_url, issue.repo.owner, issue.repo.name, issue.number
                        ))
                        .query(&[("per_page", REST_PAGE_SIZE)]),
                }
            })
            .await?;

        debug!(
            "Timeline page for {}#{} returned {} events",
            issue.repo, issue.number,
            events.len()
        );
        Ok(Page::new(events, next))
    }
}

#[async_trait]
impl DiscussionStore for GithubClient {
    async fn list_categories(
        &self,
        repo: &RepoRef,
    ) -> Result<Vec<DiscussionCategory>, DigestError> {
        let data: RepositoryData<CategoriesRepository> = self
            .graphql_query(
                "list discussion categories",
                DigestError::DiscussionLookupError,
                CATEGORIES_QUERY,
                json!({ "owner": repo.owner, "name": repo.name, "first": CATEGORY_PAGE_SIZE }),
            )
            .await?;

        Ok(data
            .repository
            .and_then(|r| r.discussion_categories)
            .map(NodeList::into_items)
            .unwrap_or_default())
    }

    async fn discussions_page(
        &self,
        repo: &RepoRef,
        cursor: Option<String>,
    ) -> Result<Page<Discussion>, DigestError> {
        let data: RepositoryData<DiscussionsRepository> = self
            .graphql_query(
                "list discussions",
                DigestError::DiscussionLookupError,
                DISCUSSIONS_QUERY,
                json!({
                    "owner": repo.owner,
                    "name": repo.name,
                    "first": DISCUSSION_PAGE_SIZE,
                    "cursor": cursor,
                }),
            )
            .await?;

        let Some(repository) = data.repository else {
            return Err(DigestError::DiscussionLookupError(format!(
                "repository {repo} not found"
            )));
        };
        let connection = repository.discussions;
        let next = if connection.page_info.has_next_page {
            connection.page_info.end_cursor
        } else {
            None
        };
        let discussions = connection
            .nodes
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .map(|node| Discussion {
                id: node.id,
                title: node.title,
                url: node.url,
                category_id: node.category.id,
            })
            .collect();

        Ok(Page::new(discussions, next))
    }

    async fn repository_id(&self, repo: &RepoRef) -> Result<String, DigestError> {
        let data: RepositoryData<NodeId> = self
            .graphql_query(
                "find repository id",
                DigestError::DiscussionCreateError,
                REPOSITORY_ID_QUERY,
                json!({ "owner": repo.owner, "name": repo.name }),
            )
            .await?;

        data.repository.map(|r| r.id).ok_or_else(|| {
            DigestError::DiscussionCreateError(format!("repository {repo} not found"))
        })
    }

    async fn create_discussion(
        &self,
        repository_id: &str,
        category_id: &str,
        title: &str,
        body: &str,
    ) -> Result<Discussion, DigestError> {
        let data: CreateDiscussionData = self
            .graphql_mutation(
                "create discussion",
                DigestError::DiscussionCreateError,
                CREATE_DISCUSSION_MUTATION,
                json!({
                    "input": {
                        "repositoryId": repository_id,
                        "title": title,
                        "body": body,
                        "categoryId": category_id,
                    }
                }),
            )
            .await?;

        let created = data
            .create_discussion
            .and_then(|payload| payload.discussion)
            .ok_or_else(|| {
                DigestError::DiscussionCreateError(
                    "mutation returned no discussion".to_string(),
                )
            })?;

        Ok(Discussion {
            id: created.id,
            title: created.title,
            url: created.url,
            category_id: category_id.to_string(),
        })
    }

    async fn add_comment(
        &self,
        discussion_id: &str,
        body: &str,
    ) -> Result<CommentRef, DigestError> {
        let data: AddCommentData = self
            .graphql_mutation(
                "add discussion comment",
                DigestError::CommentError,
                ADD_COMMENT_MUTATION,
                json!({ "discussionID": discussion_id, "body": body }),
            )
            .await?;

        data.add_discussion_comment
            .and_then(|payload| payload.comment)
            .ok_or_else(|| DigestError::CommentError("mutation returned no comment".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::UNPROCESSABLE_ENTITY));
    }

    #[test]
    fn test_truncate_for_error() {
        assert_eq!(truncate_for_error("short", 10), "short");
        assert_eq!(truncate_for_error("abcdefgh", 3), "abc...");
    }

    #[test]
    fn test_graphql_errors_become_typed_failures() {
        let response: GraphqlResponse<Value> = serde_json::from_value(json!({
            "data": null,
            "errors": [{ "message": "Could not resolve to a Repository" }]
        }))
        .unwrap();

        match unwrap_graphql("list discussions", DigestError::DiscussionLookupError, response) {
            Err(DigestError::DiscussionLookupError(msg)) => {
                assert!(msg.contains("Could not resolve to a Repository"));
            }
            other => panic!("Expected DiscussionLookupError, got: {other:?}"),
        }
    }

    #[test]
    fn test_categories_without_nodes_decode_as_empty() {
        let response: GraphqlResponse<RepositoryData<CategoriesRepository>> =
            serde_json::from_value(json!({
                "data": { "repository": { "discussionCategories": {} } }
            }))
            .unwrap();

        let data = unwrap_graphql(
            "list discussion categories",
            DigestError::DiscussionLookupError,
            response,
        )
        .unwrap();
        let categories: Vec<DiscussionCategory> = data
            .repository
            .and_then(|r| r.discussion_categories)
            .map(NodeList::into_items)
            .unwrap_or_default();
        assert!(categories.is_empty());
    }

    #[test]
    fn test_graphql_missing_data_is_a_failure() {
        let response: GraphqlResponse<Value> =
            serde_json::from_value(json!({ "data": null })).unwrap();
        assert!(matches!(
            unwrap_graphql("add discussion comment", DigestError::CommentError, response),
            Err(DigestError::CommentError(_))
        ));
    }
}
