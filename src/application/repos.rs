//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use postcache_api_types::{Post, PostListItem};

use crate::domain::posts::ListProjection;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
    #[error("database unavailable: {0}")]
    Unavailable(String),
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreatePostParams {
    pub title: String,
    pub body: Option<String>,
}

#[async_trait]
pub trait PostsRepo: Send + Sync {
    /// Every post, newest first (`created_at` descending, ties broken by `id`
    /// descending), shaped by `projection`.
    async fn list_posts(&self, projection: ListProjection)
    -> Result<Vec<PostListItem>, RepoError>;
}

#[async_trait]
pub trait PostsWriteRepo: Send + Sync {
    /// Insert a post; the store assigns `id` and `created_at`.
    async fn create_post(&self, params: CreatePostParams) -> Result<Post, RepoError>;
}

#[async_trait]
pub trait StoreHealth: Send + Sync {
    /// Round-trip to the store.
    async fn health_check(&self) -> Result<(), RepoError>;
}
