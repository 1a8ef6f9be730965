/// In-memory position store
///
/// Keeps every scope in a map behind an async mutex. A unit of work holds the
/// lock for its whole lifetime and writes to a private copy of the state, so
/// units are fully serialized and nothing is visible before `commit`.
///
/// Used as the test double for the reindexer. [`MemoryPositionStore::fail_after_writes`]
/// makes the N+1th write of every later unit fail, which is how atomicity is
/// exercised.
///
/// # Example
///
/// ```
/// use roster_shared::ordering::{MemoryPositionStore, PositionStore, PositionTx, Scope};
/// use uuid::Uuid;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), roster_shared::ordering::OrderingError> {
/// let store = MemoryPositionStore::new();
/// let mut tx = store.begin().await?;
/// tx.insert(&Scope::Users, Uuid::new_v4(), 1);
/// tx.commit().await?;
///
/// assert_eq!(store.snapshot(&Scope::Users).await.len(), 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::error::{OrderingError, OrderingResult};
use super::scope::{Placement, Scope};
use super::store::{PositionStore, PositionTx};

type ScopeMap = HashMap<Scope, HashMap<Uuid, i32>>;

#[derive(Debug, Default)]
struct MemoryState {
    scopes: ScopeMap,
    fail_after_writes: Option<usize>,
}

/// Position store held entirely in process memory
///
/// Cloning is cheap and clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryPositionStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPositionStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a scope with `ids` at positions `1..=ids.len()`
    pub async fn seed(&self, scope: &Scope, ids: &[Uuid]) {
        let mut state = self.state.lock().await;
        let records = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i as i32 + 1))
            .collect();
        state.scopes.insert(*scope, records);
    }

    /// Committed records of a scope, ascending by position
    pub async fn snapshot(&self, scope: &Scope) -> Vec<Placement> {
        let state = self.state.lock().await;
        ordered(&state.scopes, scope)
    }

    /// Makes every later unit fail once it has performed `writes` writes
    ///
    /// `None` turns failure injection off.
    pub async fn fail_after_writes(&self, writes: Option<usize>) {
        self.state.lock().await.fail_after_writes = writes;
    }
}

#[async_trait]
impl PositionStore for MemoryPositionStore {
    type Tx = MemoryPositionTx;

    async fn begin(&self) -> OrderingResult<MemoryPositionTx> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.scopes.clone();
        let write_budget = guard.fail_after_writes;

        Ok(MemoryPositionTx {
            guard,
            working,
            writes: 0,
            write_budget,
        })
    }
}

/// Unit of work over a [`MemoryPositionStore`]
///
/// Dropping the unit without committing discards its writes and releases the
/// store.
#[derive(Debug)]
pub struct MemoryPositionTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: ScopeMap,
    writes: usize,
    write_budget: Option<usize>,
}

impl MemoryPositionTx {
    /// Adds a record, standing in for an `INSERT`
    pub fn insert(&mut self, scope: &Scope, id: Uuid, position: i32) {
        self.working.entry(*scope).or_default().insert(id, position);
    }

    /// Removes a record and returns the position it held
    pub fn remove(&mut self, scope: &Scope, id: Uuid) -> Option<i32> {
        self.working.get_mut(scope).and_then(|records| records.remove(&id))
    }

    /// Number of writes performed through this unit
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn record_write(&mut self) -> OrderingResult<()> {
        if let Some(budget) = self.write_budget {
            if self.writes >= budget {
                return Err(OrderingError::Unavailable(format!(
                    "injected failure after {} writes",
                    budget
                )));
            }
        }
        self.writes += 1;
        Ok(())
    }
}

#[async_trait]
impl PositionTx for MemoryPositionTx {
    async fn list_ordered(&mut self, scope: &Scope) -> OrderingResult<Vec<Placement>> {
        Ok(ordered(&self.working, scope))
    }

    async fn max_position(&mut self, scope: &Scope) -> OrderingResult<i32> {
        Ok(self
            .working
            .get(scope)
            .and_then(|records| records.values().copied().max())
            .unwrap_or(0))
    }

    async fn set_position(&mut self, scope: &Scope, id: Uuid, position: i32) -> OrderingResult<()> {
        self.record_write()?;
        if let Some(slot) = self.working.get_mut(scope).and_then(|records| records.get_mut(&id)) {
            *slot = position;
        }
        Ok(())
    }

    async fn shift_range(
        &mut self,
        scope: &Scope,
        from: i32,
        to: i32,
        delta: i32,
    ) -> OrderingResult<u64> {
        self.record_write()?;
        let mut touched = 0;
        if let Some(records) = self.working.get_mut(scope) {
            for position in records.values_mut() {
                if (from..=to).contains(position) {
                    *position += delta;
                    touched += 1;
                }
            }
        }
        Ok(touched)
    }

    async fn commit(mut self) -> OrderingResult<()> {
        debug!(writes = self.writes, "Committing in-memory unit");
        self.guard.scopes = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> OrderingResult<()> {
        debug!(writes = self.writes, "Discarding in-memory unit");
        Ok(())
    }
}

fn ordered(scopes: &ScopeMap, scope: &Scope) -> Vec<Placement> {
    let mut placements: Vec<Placement> = scopes
        .get(scope)
        .map(|records| {
            records
                .iter()
                .map(|(id, position)| Placement::new(*id, *position))
                .collect()
        })
        .unwrap_or_default();
    placements.sort_by_key(|p| p.position);
    placements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryPositionStore::new();
        let id = Uuid::new_v4();

        let mut tx = store.begin().await.unwrap();
        tx.insert(&Scope::Users, id, 1);
        drop(tx);

        assert!(store.snapshot(&Scope::Users).await.is_empty());
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryPositionStore::new();
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        store.seed(&Scope::Users, &ids).await;

        let mut tx = store.begin().await.unwrap();
        let touched = tx.shift_range(&Scope::Users, 1, 1, 1).await.unwrap();
        tx.set_position(&Scope::Users, ids[1], 1).await.unwrap();
        assert_eq!(touched, 1);
        assert_eq!(tx.writes(), 2);
        tx.commit().await.unwrap();

        let snapshot = store.snapshot(&Scope::Users).await;
        assert_eq!(
            snapshot,
            vec![Placement::new(ids[1], 1), Placement::new(ids[0], 2)]
        );
    }

    #[tokio::test]
    async fn test_scopes_are_separate() {
        let store = MemoryPositionStore::new();
        let owner = Uuid::new_v4();
        store.seed(&Scope::Users, &[Uuid::new_v4()]).await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.max_position(&Scope::Users).await.unwrap(), 1);
        assert_eq!(tx.max_position(&Scope::UserImages(owner)).await.unwrap(), 0);
        tx.rollback().await.unwrap();
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let store = MemoryPositionStore::new();
        store.seed(&Scope::Users, &[Uuid::new_v4()]).await;
        store.fail_after_writes(Some(1)).await;

        let mut tx = store.begin().await.unwrap();
        tx.shift_range(&Scope::Users, 1, 1, 1).await.unwrap();
        let err = tx.shift_range(&Scope::Users, 1, 5, 1).await.unwrap_err();
        assert!(matches!(err, OrderingError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_remove_returns_position() {
        let store = MemoryPositionStore::new();
        let ids = [Uuid::new_v4(), Uuid::new_v4()];
        store.seed(&Scope::Users, &ids).await;

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.remove(&Scope::Users, ids[1]), Some(2));
        assert_eq!(tx.remove(&Scope::Users, ids[1]), None);
    }
}
