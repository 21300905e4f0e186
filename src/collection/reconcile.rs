//! Entity cache pruning

use tracing::debug;

use super::CollectionState;

/// Drop cached posts whose id is no longer in the collection.
///
/// Returns `true` if anything was pruned. Ids without a cached post are left
/// alone. Running it twice in a row is a no-op the second time.
pub fn reconcile(state: &mut CollectionState) -> bool {
    let before = state.entities.len();
    let index = &state.index;
    state.entities.retain(|id, _| index.contains(id));

    let pruned = before - state.entities.len();
    if pruned > 0 {
        debug!(pruned, "pruned stale cached posts");
    }
    pruned > 0
}

/// Non-mutating form of [`reconcile`]
pub fn reconciled(state: &CollectionState) -> CollectionState {
    let mut next = state.clone();
    reconcile(&mut next);
    next
}
