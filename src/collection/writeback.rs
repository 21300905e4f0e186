//! Single-writer persistence queue
//!
//! Each store owns one worker task. Snapshots are written in the order they
//! were queued, so the last completed write is always the newest state.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{CollectionKind, CollectionState};
use crate::storage::KeyValueStore;

/// Commands sent to the write-back worker
enum WriteBackCommand {
    /// Persist a full snapshot under the kind's keys
    Persist(CollectionState),
    /// Reply once every earlier command has been handled
    Flush(oneshot::Sender<()>),
}

/// Handle to a running write-back worker.
///
/// The worker exits when the last handle is dropped.
#[derive(Clone)]
pub(super) struct WriteBack {
    tx: mpsc::UnboundedSender<WriteBackCommand>,
}

impl WriteBack {
    /// Spawn the worker on the current Tokio runtime
    pub(super) fn spawn(kind: CollectionKind, storage: Arc<dyn KeyValueStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteBackCommand>();

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    WriteBackCommand::Persist(state) => {
                        persist(storage.as_ref(), kind, &state).await;
                    }
                    WriteBackCommand::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!(%kind, "write-back worker stopped");
        });

        Self { tx }
    }

    /// Queue a snapshot. Never blocks.
    pub(super) fn enqueue(&self, state: CollectionState) {
        if self.tx.send(WriteBackCommand::Persist(state)).is_err() {
            warn!("write-back worker is gone; change will not be persisted");
        }
    }

    /// Wait until everything queued so far has been written (or has failed)
    pub(super) async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(WriteBackCommand::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }
}

/// Write both keys for one snapshot. Failures are logged and dropped.
async fn persist(storage: &dyn KeyValueStore, kind: CollectionKind, state: &CollectionState) {
    let ids = match serde_json::to_string(state.ids()) {
        Ok(json) => json,
        Err(e) => {
            warn!(%kind, error = %e, "failed to serialize collection ids");
            return;
        }
    };
    let posts = match serde_json::to_string(&state.list()) {
        Ok(json) => json,
        Err(e) => {
            warn!(%kind, error = %e, "failed to serialize cached posts");
            return;
        }
    };

    if let Err(e) = storage.set(kind.ids_key(), &ids).await {
        warn!(%kind, key = kind.ids_key(), error = %e, "failed to persist collection ids");
    }
    if let Err(e) = storage.set(kind.entities_key(), &posts).await {
        warn!(%kind, key = kind.entities_key(), error = %e, "failed to persist cached posts");
    }
    debug!(%kind, count = state.len(), "collection written back");
}
