//! Per-post flags and toggle callbacks for list and detail views

use crate::collection::{CollectionState, Toggled};
use crate::models::Post;
use crate::provider::Library;

/// Collection membership of one post, as a list row renders it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PostFlags {
    /// Post is in favorites
    pub favorite: bool,
    /// Post is in bookmarks
    pub bookmarked: bool,
}

impl PostFlags {
    /// Heart glyph for terminal output
    pub const fn favorite_icon(&self) -> &'static str {
        if self.favorite { "♥" } else { "♡" }
    }

    /// Bookmark glyph for terminal output
    pub const fn bookmark_icon(&self) -> &'static str {
        if self.bookmarked { "★" } else { "☆" }
    }
}

impl Library {
    /// Whether the post is a favorite
    pub fn is_favorite(&self, post: &Post) -> bool {
        self.favorites().contains(post.id)
    }

    /// Whether the post is bookmarked
    pub fn is_bookmarked(&self, post: &Post) -> bool {
        self.bookmarks().contains(post.id)
    }

    /// Favorite or un-favorite the post
    pub fn on_toggle_favorite(&self, post: &Post) -> CollectionState {
        self.favorites().toggle(post)
    }

    /// Bookmark or un-bookmark the post
    pub fn on_toggle_bookmark(&self, post: &Post) -> CollectionState {
        self.bookmarks().toggle(post)
    }

    /// Both flags at once
    pub fn flags(&self, post: &Post) -> PostFlags {
        PostFlags {
            favorite: self.is_favorite(post),
            bookmarked: self.is_bookmarked(post),
        }
    }

    /// Flags for a whole page of posts, in the same order
    pub fn flags_for(&self, posts: &[Post]) -> Vec<PostFlags> {
        posts.iter().map(|post| self.flags(post)).collect()
    }

    /// Favorite toggle that reports the direction
    pub fn toggle_favorite_outcome(&self, post: &Post) -> Toggled {
        self.favorites().toggle_with_outcome(post)
    }

    /// Bookmark toggle that reports the direction
    pub fn toggle_bookmark_outcome(&self, post: &Post) -> Toggled {
        self.bookmarks().toggle_with_outcome(post)
    }
}
