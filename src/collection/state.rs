//! In-memory collection state

use std::collections::{HashMap, HashSet};

use crate::models::{Post, PostId};

/// Outcome of a toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggled {
    /// The post was not in the collection and now is
    Added,
    /// The post was in the collection and no longer is
    Removed,
}

/// Id list plus denormalized post cache for one collection.
///
/// `ids` keeps insertion order for display; `index` mirrors it for O(1)
/// membership. Entity keys are a subset of `ids` whenever
/// [`reconcile`](super::reconcile) has run; an id without an entity is
/// allowed and simply not listed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionState {
    pub(super) ids: Vec<PostId>,
    pub(super) index: HashSet<PostId>,
    pub(super) entities: HashMap<PostId, Post>,
}

impl CollectionState {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a state from a persisted id list and post list.
    ///
    /// Duplicate ids keep their first position. Posts are cached as given,
    /// so the result may hold entities outside `ids` until reconciled.
    pub fn from_parts(ids: Vec<PostId>, posts: Vec<Post>) -> Self {
        let mut state = Self::default();
        for id in ids {
            if state.index.insert(id) {
                state.ids.push(id);
            }
        }
        for post in posts {
            state.entities.entry(post.id).or_insert(post);
        }
        state
    }

    /// Ordered ids in the collection
    pub fn ids(&self) -> &[PostId] {
        &self.ids
    }

    /// Cached post for an id, if any
    pub fn entity(&self, id: PostId) -> Option<&Post> {
        self.entities.get(&id)
    }

    /// Number of cached posts
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of ids
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the collection holds no ids
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Membership test
    pub fn contains(&self, id: PostId) -> bool {
        self.index.contains(&id)
    }

    /// Cached posts in id order. Ids without a cached post are skipped.
    pub fn list(&self) -> Vec<Post> {
        self.ids
            .iter()
            .filter_map(|id| self.entities.get(id))
            .cloned()
            .collect()
    }

    /// Whether every cached post has its id in the collection
    pub fn is_consistent(&self) -> bool {
        self.entities.keys().all(|id| self.index.contains(id))
    }

    /// Add the post if absent, remove it if present
    pub(super) fn toggle(&mut self, post: &Post) -> Toggled {
        if self.index.remove(&post.id) {
            self.ids.retain(|id| *id != post.id);
            self.entities.remove(&post.id);
            Toggled::Removed
        } else {
            self.index.insert(post.id);
            self.ids.push(post.id);
            self.entities.insert(post.id, post.clone());
            Toggled::Added
        }
    }

    /// Force the post in or out. Unlike [`toggle`](Self::toggle), applying
    /// the same change twice is a no-op.
    pub(super) fn apply(&mut self, post: &Post, change: Toggled) {
        match change {
            Toggled::Added => {
                if self.index.insert(post.id) {
                    self.ids.push(post.id);
                }
                self.entities.insert(post.id, post.clone());
            }
            Toggled::Removed => {
                if self.index.remove(&post.id) {
                    self.ids.retain(|id| *id != post.id);
                }
                self.entities.remove(&post.id);
            }
        }
    }
}
