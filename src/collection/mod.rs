//! User-curated post collections (favorites, bookmarks)
//!
//! Both kinds share one implementation: an ordered id list, a cache of the
//! full posts keyed by id, and a background writer that mirrors every change
//! into a [`KeyValueStore`](crate::storage::KeyValueStore).

mod reconcile;
mod state;
mod store;
mod writeback;

use serde::{Deserialize, Serialize};

pub use reconcile::{reconcile, reconciled};
pub use state::{CollectionState, Toggled};
pub use store::CollectionStore;

/// Which collection a store holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    /// Posts the user hearted
    Favorites,
    /// Posts saved for later reading
    Bookmarks,
}

impl CollectionKind {
    /// Get all collection kinds
    pub const fn all() -> &'static [Self] {
        &[Self::Favorites, Self::Bookmarks]
    }

    /// Get the display name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Favorites => "Favorites",
            Self::Bookmarks => "Bookmarks",
        }
    }

    /// Storage key for the ordered id list
    pub const fn ids_key(&self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::Bookmarks => "bookmarks",
        }
    }

    /// Storage key for the cached post list
    pub const fn entities_key(&self) -> &'static str {
        match self {
            Self::Favorites => "favoritePosts",
            Self::Bookmarks => "bookmarkedPosts",
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "favorites" | "favorite" | "fav" => Some(Self::Favorites),
            "bookmarks" | "bookmark" | "bm" => Some(Self::Bookmarks),
            _ => None,
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
