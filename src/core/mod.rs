//! Configuration, data model and paging shared by every component

pub mod config;
pub mod models;
pub mod pagination;

pub use config::{AppConfig, DigestQuery};
pub use models::{
    Actor, CommentRef, Discussion, DiscussionCategory, Issue, IssueRef, RepoRef, TimelineEvent,
};
pub use pagination::{Page, paginate};
