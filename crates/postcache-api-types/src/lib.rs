//! Wire types shared by the postcache server and its clients.
//!
//! Timestamps travel as RFC 3339 strings.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A persisted post as returned by `POST /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The `{id, title}` projection served by `GET /posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
}

impl From<Post> for PostSummary {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
        }
    }
}

/// One element of the post listing.
///
/// The server lists either summaries or full records depending on its
/// configured projection. `Full` is tried first when decoding because a full
/// record would also satisfy the summary shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostListItem {
    Full(Post),
    Summary(PostSummary),
}

impl PostListItem {
    pub fn id(&self) -> i64 {
        match self {
            Self::Full(post) => post.id,
            Self::Summary(summary) => summary.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Self::Full(post) => &post.title,
            Self::Summary(summary) => &summary.title,
        }
    }
}

/// Body of `POST /posts`.
///
/// `title` is optional on the wire so that a missing title is reported as a
/// validation failure rather than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

/// Error payload returned with every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
