//! Comment model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::PostId;

/// A reader comment on a post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// CMS comment id
    pub id: u64,
    /// Post this comment belongs to
    pub post: PostId,
    /// Parent comment id (0 for top-level)
    #[serde(default)]
    pub parent: u64,
    /// Commenter display name
    #[serde(default)]
    pub author_name: String,
    /// When the comment was written (site-local time)
    pub date: NaiveDateTime,
    /// Comment body
    pub content: Rendered,
}

/// A `{ "rendered": "..." }` wrapper as returned by the CMS
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rendered {
    /// Rendered HTML
    pub rendered: String,
}

impl Comment {
    /// Whether this is a reply to another comment
    pub const fn is_reply(&self) -> bool {
        self.parent != 0
    }
}
