//! Collection store: in-memory state, hydration and write-back

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::writeback::WriteBack;
use super::{CollectionKind, CollectionState, Toggled, reconcile};
use crate::models::{Post, PostId};
use crate::storage::KeyValueStore;

/// Result of reading one storage key during hydration
enum Slot<T> {
    Missing,
    Unreadable,
    Value(T),
}

/// Toggles made while a load is in flight.
///
/// They are held back from storage and replayed onto the loaded state, so
/// a tap during startup never overwrites what is on disk.
#[derive(Default)]
struct Pending {
    loads: usize,
    changes: Vec<(Post, Toggled)>,
}

/// Owns the state of one collection kind.
///
/// State lives in a `watch` channel: mutations happen under its lock with no
/// await point, and every subscriber sees each committed state. Clones share
/// the same state and writer.
#[derive(Clone)]
pub struct CollectionStore {
    kind: CollectionKind,
    state: Arc<watch::Sender<CollectionState>>,
    storage: Arc<dyn KeyValueStore>,
    writer: WriteBack,
    // Always locked after the state lock
    pending: Arc<Mutex<Pending>>,
}

impl CollectionStore {
    /// Create an empty store and start its write-back worker.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(kind: CollectionKind, storage: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(CollectionState::new());
        let writer = WriteBack::spawn(kind, Arc::clone(&storage));

        Self {
            kind,
            state: Arc::new(state),
            storage,
            writer,
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    /// Which collection this store holds
    pub const fn kind(&self) -> CollectionKind {
        self.kind
    }

    /// Load persisted state and make it current.
    ///
    /// Missing or unparsable data yields an empty collection; this never
    /// fails. Toggles made while loading are replayed on top of the loaded
    /// state as adds or removes, and the merged result is written back once.
    pub async fn hydrate(&self) -> CollectionState {
        let mut in_flight = InFlight::start(self);

        // Anything queued earlier must be on disk before it is read back
        self.writer.flush().await;
        let mut loaded = load(self.storage.as_ref(), self.kind).await;

        let mut replayed = 0;
        self.state.send_modify(|state| {
            let mut pending = self.lock_pending();
            for (post, change) in &pending.changes {
                loaded.apply(post, *change);
            }
            replayed = pending.changes.len();
            pending.finish_load();
            in_flight.finished = true;

            let pruned = reconcile(&mut loaded);
            if pruned || replayed > 0 {
                self.writer.enqueue(loaded.clone());
            }
            *state = loaded;
        });

        info!(kind = %self.kind, count = self.len(), replayed, "collection hydrated");
        self.snapshot()
    }

    /// Add the post if absent, remove it if present.
    ///
    /// Commits and notifies subscribers before returning, then queues a
    /// write-back of the full new state. While a load is in flight the
    /// write-back is deferred to the end of hydration.
    pub fn toggle(&self, post: &Post) -> CollectionState {
        let mut next = None;
        self.state.send_modify(|state| {
            let change = state.toggle(post);
            reconcile(state);
            debug!(kind = %self.kind, id = post.id, ?change, "collection toggled");

            let mut pending = self.lock_pending();
            if pending.loads > 0 {
                pending.changes.push((post.clone(), change));
            } else {
                // Queued under the lock so write order matches mutation order
                self.writer.enqueue(state.clone());
            }
            next = Some(state.clone());
        });
        next.unwrap_or_else(|| self.snapshot())
    }

    /// Toggle and report which way it went
    pub fn toggle_with_outcome(&self, post: &Post) -> Toggled {
        if self.toggle(post).contains(post.id) {
            Toggled::Added
        } else {
            Toggled::Removed
        }
    }

    /// Membership test
    pub fn contains(&self, id: PostId) -> bool {
        self.state.borrow().contains(id)
    }

    /// Post to toggle for `id` without going to the network.
    ///
    /// The cached copy if there is one, a bare post if the id is a member
    /// without a cached copy, `None` if the id is not in the collection.
    pub fn local_post(&self, id: PostId) -> Option<Post> {
        let state = self.state.borrow();
        match state.entity(id) {
            Some(post) => Some(post.clone()),
            None if state.contains(id) => Some(Post::new(id)),
            None => None,
        }
    }

    /// Cached posts in collection order
    pub fn list(&self) -> Vec<Post> {
        self.state.borrow().list()
    }

    /// Number of ids in the collection
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Whether the collection is empty
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> CollectionState {
        self.state.borrow().clone()
    }

    /// Observe every committed state
    pub fn subscribe(&self) -> watch::Receiver<CollectionState> {
        self.state.subscribe()
    }

    /// Wait for queued write-backs to finish
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}

impl CollectionStore {
    fn lock_pending(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Pending {
    fn finish_load(&mut self) {
        self.loads = self.loads.saturating_sub(1);
        if self.loads == 0 {
            self.changes.clear();
        }
    }
}

/// Registers a load for the lifetime of one `hydrate` call.
///
/// A cancelled hydration still releases its slot; the store then behaves
/// as if it had never been hydrated.
struct InFlight<'a> {
    store: &'a CollectionStore,
    finished: bool,
}

impl<'a> InFlight<'a> {
    fn start(store: &'a CollectionStore) -> Self {
        store.lock_pending().loads += 1;
        Self {
            store,
            finished: false,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            warn!(kind = %self.store.kind, "hydration cancelled");
            self.store.lock_pending().finish_load();
        }
    }
}

/// Read both keys for a kind and assemble a state
async fn load(storage: &dyn KeyValueStore, kind: CollectionKind) -> CollectionState {
    let ids: Slot<Vec<PostId>> = read_json(storage, kind.ids_key()).await;
    let posts: Slot<Vec<Post>> = read_json(storage, kind.entities_key()).await;

    match (ids, posts) {
        (Slot::Value(ids), Slot::Value(posts)) => CollectionState::from_parts(ids, posts),
        (Slot::Value(ids), _) => CollectionState::from_parts(ids, Vec::new()),
        (Slot::Missing, Slot::Value(posts)) => {
            // Older builds stored only the post list
            debug!(%kind, "no id list stored; deriving ids from cached posts");
            let ids = posts.iter().map(|p| p.id).collect();
            CollectionState::from_parts(ids, posts)
        }
        _ => CollectionState::new(),
    }
}

async fn read_json<T: DeserializeOwned>(storage: &dyn KeyValueStore, key: &str) -> Slot<T> {
    match storage.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
            Ok(value) => Slot::Value(value),
            Err(e) => {
                warn!(key, error = %e, "failed to parse stored collection data");
                Slot::Unreadable
            }
        },
        Ok(None) => Slot::Missing,
        Err(e) => {
            warn!(key, error = %e, "failed to read stored collection data");
            Slot::Unreadable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use crate::storage::{MemoryStore, StorageError};

    /// Reads park until the gate opens; writes go straight through
    struct GatedStore {
        inner: MemoryStore,
        entered: Notify,
        gate: watch::Receiver<bool>,
    }

    #[async_trait]
    impl KeyValueStore for GatedStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.entered.notify_one();
            let mut gate = self.gate.clone();
            let _ = gate.wait_for(|open| *open).await.map(|_| ());
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.inner.set(key, value).await
        }
    }

    /// Each write takes less time than the one before it
    struct SlowingStore {
        inner: MemoryStore,
        writes: AtomicU64,
    }

    #[async_trait]
    impl KeyValueStore for SlowingStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(40u64.saturating_sub(n * 5))).await;
            self.inner.set(key, value).await
        }
    }

    fn post(id: PostId) -> Post {
        Post::new(id).with_title(&format!("Post {id}"))
    }

    fn store_with(memory: &MemoryStore) -> CollectionStore {
        CollectionStore::new(CollectionKind::Favorites, Arc::new(memory.clone()))
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_membership() {
        let store = store_with(&MemoryStore::new());
        for id in [1, 2, 3] {
            let before = store.contains(id);
            store.toggle(&post(id));
            store.toggle(&post(id));
            assert_eq!(store.contains(id), before);
        }
        store.toggle(&post(9));
        store.toggle(&post(9));
        store.toggle(&post(9));
        assert!(store.contains(9));
        store.toggle(&post(9));
        assert!(!store.contains(9));
    }

    #[tokio::test]
    async fn test_add_then_remove_postconditions() {
        let store = store_with(&MemoryStore::new());
        let p = post(5);

        let added = store.toggle(&p);
        assert!(added.contains(5));
        assert!(store.contains(5));
        assert!(store.list().contains(&p));

        let removed = store.toggle(&p);
        assert!(!removed.contains(5));
        assert!(removed.entity(5).is_none());
        assert!(removed.is_consistent());
    }

    #[tokio::test]
    async fn test_one_two_one_scenario() {
        let store = store_with(&MemoryStore::new());
        store.toggle(&post(1));
        store.toggle(&post(2));
        let state = store.toggle(&post(1));

        assert_eq!(state.ids(), &[2]);
        assert_eq!(state.entity_count(), 1);
        assert_eq!(state.entity(2), Some(&post(2)));
    }

    #[tokio::test]
    async fn test_hydration_round_trip() {
        let memory = MemoryStore::new();
        let store = store_with(&memory);
        for id in [4, 8, 15] {
            store.toggle(&post(id));
        }
        store.toggle(&post(8));
        store.flush().await;
        let written = store.snapshot();

        let fresh = store_with(&memory);
        assert!(fresh.is_empty());
        let hydrated = fresh.hydrate().await;
        assert_eq!(hydrated, written);
        assert_eq!(fresh.snapshot(), written);
    }

    #[tokio::test]
    async fn test_hydrate_with_missing_entity() {
        let memory = MemoryStore::new();
        memory.set("favorites", "[1,2,3]").await.unwrap();
        let posts = serde_json::to_string(&vec![post(1), post(2)]).unwrap();
        memory.set("favoritePosts", &posts).await.unwrap();

        let store = store_with(&memory);
        store.hydrate().await;

        assert!(store.contains(3));
        let listed: Vec<_> = store.list().iter().map(|p| p.id).collect();
        assert_eq!(listed, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_member_without_cached_post_can_be_removed() {
        let memory = MemoryStore::new();
        memory.set("favorites", "[1,2]").await.unwrap();
        let posts = serde_json::to_string(&vec![post(1)]).unwrap();
        memory.set("favoritePosts", &posts).await.unwrap();

        let store = store_with(&memory);
        store.hydrate().await;
        assert_eq!(store.local_post(1), Some(post(1)));
        assert_eq!(store.local_post(7), None);

        let bare = store.local_post(2).unwrap();
        assert_eq!(bare.id, 2);
        assert_eq!(store.toggle_with_outcome(&bare), Toggled::Removed);
        store.flush().await;
        assert_eq!(memory.peek("favorites").as_deref(), Some("[1]"));
    }

    #[tokio::test]
    async fn test_hydrate_prunes_and_persists_stale_posts() {
        let memory = MemoryStore::new();
        memory.set("favorites", "[1]").await.unwrap();
        let posts = serde_json::to_string(&vec![post(1), post(2)]).unwrap();
        memory.set("favoritePosts", &posts).await.unwrap();

        let store = store_with(&memory);
        let state = store.hydrate().await;
        assert!(state.is_consistent());
        assert_eq!(state.entity_count(), 1);

        store.flush().await;
        let stored: Vec<Post> =
            serde_json::from_str(&memory.peek("favoritePosts").unwrap()).unwrap();
        assert_eq!(stored, vec![post(1)]);
    }

    #[tokio::test]
    async fn test_hydrate_fails_open() {
        let memory = MemoryStore::new();
        memory.set("favorites", "{ not json").await.unwrap();
        memory.set("favoritePosts", "[]").await.unwrap();
        let store = store_with(&memory);
        assert!(store.hydrate().await.is_empty());

        let offline = MemoryStore::new();
        offline.set_offline(true);
        let store = store_with(&offline);
        assert!(store.hydrate().await.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_post_list_only() {
        let memory = MemoryStore::new();
        let posts = serde_json::to_string(&vec![post(10), post(11)]).unwrap();
        memory.set("bookmarkedPosts", &posts).await.unwrap();

        let store = CollectionStore::new(CollectionKind::Bookmarks, Arc::new(memory.clone()));
        let state = store.hydrate().await;
        assert_eq!(state.ids(), &[10, 11]);
        assert_eq!(state.list(), vec![post(10), post(11)]);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let memory = MemoryStore::new();
        memory.set_offline(true);
        let store = store_with(&memory);

        store.toggle(&post(1));
        store.flush().await;
        assert!(store.contains(1));
        assert_eq!(memory.write_count(), 0);

        // Next successful write carries the full state
        memory.set_offline(false);
        store.toggle(&post(2));
        store.flush().await;
        assert_eq!(memory.peek("favorites").as_deref(), Some("[1,2]"));
    }

    #[tokio::test]
    async fn test_concurrent_toggles_both_persist() {
        let memory = MemoryStore::new();
        let store = store_with(&memory);

        let a = {
            let store = store.clone();
            tokio::spawn(async move { store.toggle(&post(1)) })
        };
        let b = {
            let store = store.clone();
            tokio::spawn(async move { store.toggle(&post(2)) })
        };
        a.await.unwrap();
        b.await.unwrap();
        store.flush().await;

        assert!(store.contains(1) && store.contains(2));
        let stored: Vec<PostId> = serde_json::from_str(&memory.peek("favorites").unwrap()).unwrap();
        let mut stored_sorted = stored.clone();
        stored_sorted.sort_unstable();
        assert_eq!(stored_sorted, vec![1, 2]);
        assert_eq!(stored, store.snapshot().ids());
    }

    #[tokio::test]
    async fn test_subscribers_see_every_toggle() {
        let store = store_with(&MemoryStore::new());
        let mut rx = store.subscribe();

        store.toggle(&post(3));
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().contains(3));

        store.toggle(&post(3));
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().contains(3));
    }

    #[tokio::test]
    async fn test_toggle_during_hydration_keeps_stored_posts() {
        let memory = MemoryStore::new();
        memory.set("favorites", "[1,2,3]").await.unwrap();
        let posts = serde_json::to_string(&vec![post(1), post(2), post(3)]).unwrap();
        memory.set("favoritePosts", &posts).await.unwrap();

        let (open, gate) = watch::channel(false);
        let gated = Arc::new(GatedStore {
            inner: memory.clone(),
            entered: Notify::new(),
            gate,
        });
        let storage: Arc<dyn KeyValueStore> = gated.clone();
        let store = CollectionStore::new(CollectionKind::Favorites, storage);

        let loading = {
            let store = store.clone();
            tokio::spawn(async move { store.hydrate().await })
        };
        gated.entered.notified().await;

        // The user sees an empty list and taps two posts
        assert_eq!(store.toggle_with_outcome(&post(9)), Toggled::Added);
        assert_eq!(store.toggle_with_outcome(&post(2)), Toggled::Added);
        store.flush().await;
        assert_eq!(memory.peek("favorites").as_deref(), Some("[1,2,3]"));

        open.send(true).unwrap();
        let hydrated = loading.await.unwrap();
        assert_eq!(hydrated.ids(), &[1, 2, 3, 9]);
        assert_eq!(hydrated.entity(9), Some(&post(9)));
        assert_eq!(store.snapshot(), hydrated);

        store.flush().await;
        assert_eq!(memory.peek("favorites").as_deref(), Some("[1,2,3,9]"));
        let stored: Vec<Post> =
            serde_json::from_str(&memory.peek("favoritePosts").unwrap()).unwrap();
        assert_eq!(stored, hydrated.list());

        // Back to immediate write-back once loaded
        store.toggle(&post(1));
        store.flush().await;
        assert_eq!(memory.peek("favorites").as_deref(), Some("[2,3,9]"));
    }

    #[tokio::test]
    async fn test_last_change_during_hydration_wins() {
        let memory = MemoryStore::new();
        memory.set("favorites", "[4,6]").await.unwrap();

        let (open, gate) = watch::channel(false);
        let gated = Arc::new(GatedStore {
            inner: memory.clone(),
            entered: Notify::new(),
            gate,
        });
        let storage: Arc<dyn KeyValueStore> = gated.clone();
        let store = CollectionStore::new(CollectionKind::Favorites, storage);

        let loading = {
            let store = store.clone();
            tokio::spawn(async move { store.hydrate().await })
        };
        gated.entered.notified().await;

        // Added then removed: the post ends up out even though it was stored
        store.toggle(&post(4));
        store.toggle(&post(4));
        store.toggle(&post(5));
        store.toggle(&post(5));

        open.send(true).unwrap();
        let hydrated = loading.await.unwrap();
        assert_eq!(hydrated.ids(), &[6]);
        assert!(hydrated.is_consistent());
        store.flush().await;
        assert_eq!(memory.peek("favorites").as_deref(), Some("[6]"));
    }

    #[tokio::test]
    async fn test_newest_snapshot_wins_with_uneven_writes() {
        let memory = MemoryStore::new();
        let slow = SlowingStore {
            inner: memory.clone(),
            writes: AtomicU64::new(0),
        };
        let store = CollectionStore::new(CollectionKind::Favorites, Arc::new(slow));

        for id in [1, 2, 3, 4] {
            store.toggle(&post(id));
        }
        store.toggle(&post(2));
        store.flush().await;

        let last = store.snapshot();
        assert_eq!(last.ids(), &[1, 3, 4]);
        let ids: Vec<PostId> = serde_json::from_str(&memory.peek("favorites").unwrap()).unwrap();
        assert_eq!(ids, last.ids());
        let stored: Vec<Post> =
            serde_json::from_str(&memory.peek("favoritePosts").unwrap()).unwrap();
        assert_eq!(stored, last.list());
    }
}
