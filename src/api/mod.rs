//! Remote content API

pub mod wordpress;

use anyhow::Result;

use crate::models::{Category, Comment, Post, PostId, Tag};

pub use wordpress::WordPressClient;

/// Read-only access to a blog's content
#[allow(async_fn_in_trait)]
pub trait ContentApi {
    /// Fetch every published post, newest first
    async fn fetch_posts(&self) -> Result<Vec<Post>>;

    /// Fetch a single post
    async fn fetch_post(&self, id: PostId) -> Result<Post>;

    /// Fetch all categories
    async fn fetch_categories(&self) -> Result<Vec<Category>>;

    /// Fetch all tags
    async fn fetch_tags(&self) -> Result<Vec<Tag>>;

    /// Fetch one page of comments for a post (pages start at 1)
    async fn fetch_comments(&self, post_id: PostId, page: u32) -> Result<Vec<Comment>>;
}
