//! Post invariants and the list projection.

use std::{fmt, str::FromStr};

use serde::Deserialize;

use super::error::DomainError;

pub const TITLE_REQUIRED: &str = "Title is required";

/// Validated input for creating a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    title: String,
    body: Option<String>,
}

impl NewPost {
    /// Reject an absent or empty title. Any other title is stored as given.
    pub fn new(title: Option<String>, body: Option<String>) -> Result<Self, DomainError> {
        match title {
            Some(title) if !title.is_empty() => Ok(Self { title, body }),
            _ => Err(DomainError::validation(TITLE_REQUIRED)),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn into_parts(self) -> (String, Option<String>) {
        (self.title, self.body)
    }
}

/// Fields exposed by the cached `GET /posts` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListProjection {
    /// `{id, title}`.
    #[default]
    Summary,
    /// `{id, title, body, created_at}`.
    Full,
}

impl ListProjection {
    pub fn as_str(self) -> &'static str {
        match self {
            ListProjection::Summary => "summary",
            ListProjection::Full => "full",
        }
    }
}

impl fmt::Display for ListProjection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListProjection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "full" => Ok(Self::Full),
            other => Err(format!(
                "unknown projection `{other}` (expected `summary` or `full`)"
            )),
        }
    }
}
