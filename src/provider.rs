//! Shared library state (favorites + bookmarks)
//!
//! A [`Library`] is built once per process and passed to whatever needs it.
//! It is cheap to clone; clones share the same stores.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::collection::{CollectionKind, CollectionState, CollectionStore};
use crate::storage::KeyValueStore;

/// Lifecycle of a [`Library`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Mounted, nothing loaded yet
    #[default]
    Uninitialized,
    /// Reading persisted collections
    Hydrating,
    /// Persisted state loaded; stays here for the rest of the process
    Ready,
}

/// Owns one store per collection kind
#[derive(Clone)]
pub struct Library {
    favorites: CollectionStore,
    bookmarks: CollectionStore,
    phase: Arc<watch::Sender<Phase>>,
}

impl Library {
    /// Create empty stores backed by `storage`.
    ///
    /// Reads return empty collections until [`hydrate`](Self::hydrate)
    /// completes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn mount(storage: Arc<dyn KeyValueStore>) -> Self {
        let (phase, _) = watch::channel(Phase::Uninitialized);
        Self {
            favorites: CollectionStore::new(CollectionKind::Favorites, Arc::clone(&storage)),
            bookmarks: CollectionStore::new(CollectionKind::Bookmarks, storage),
            phase: Arc::new(phase),
        }
    }

    /// Load both collections from storage.
    ///
    /// Only the first call does any work; later calls wait for it to finish.
    pub async fn hydrate(&self) {
        let started = self.phase.send_if_modified(|phase| {
            if *phase == Phase::Uninitialized {
                *phase = Phase::Hydrating;
                true
            } else {
                false
            }
        });

        if !started {
            debug!("hydration already started; waiting for it");
            let mut rx = self.phase.subscribe();
            let _ = rx.wait_for(|phase| *phase == Phase::Ready).await;
            return;
        }

        tokio::join!(self.favorites.hydrate(), self.bookmarks.hydrate());
        self.phase.send_replace(Phase::Ready);
        info!(
            favorites = self.favorites.len(),
            bookmarks = self.bookmarks.len(),
            "library ready"
        );
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Whether hydration has completed
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Ready
    }

    /// Observe lifecycle transitions
    pub fn phase_changes(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    /// Favorites store
    pub const fn favorites(&self) -> &CollectionStore {
        &self.favorites
    }

    /// Bookmarks store
    pub const fn bookmarks(&self) -> &CollectionStore {
        &self.bookmarks
    }

    /// Store for a collection kind
    pub const fn store(&self, kind: CollectionKind) -> &CollectionStore {
        match kind {
            CollectionKind::Favorites => &self.favorites,
            CollectionKind::Bookmarks => &self.bookmarks,
        }
    }

    /// Observe every committed state of one collection
    pub fn subscribe(&self, kind: CollectionKind) -> watch::Receiver<CollectionState> {
        self.store(kind).subscribe()
    }

    /// Wait for all queued write-backs
    pub async fn flush(&self) {
        tokio::join!(self.favorites.flush(), self.bookmarks.flush());
    }
}
