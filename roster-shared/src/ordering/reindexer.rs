/// Position reindexer
///
/// The three operations that keep a scope dense. Each comes in two forms:
///
/// - a method on [`Reindexer`], which opens its own atomic unit and commits it
/// - a free `*_in` function that runs inside a unit the caller already holds,
///   so a model can insert or delete its row and reindex in one transaction
///
/// # Example
///
/// ```
/// use roster_shared::ordering::{
///     remove_and_compact_in, MemoryPositionStore, PositionStore, PositionTx, Reindexer, Scope,
/// };
/// use uuid::Uuid;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), roster_shared::ordering::OrderingError> {
/// let ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
/// let store = MemoryPositionStore::new();
/// store.seed(&Scope::Users, &ids).await;
///
/// // Delete the record at position 3 and close the gap in the same unit
/// let mut tx = store.begin().await?;
/// let removed = tx.remove(&Scope::Users, ids[2]).unwrap();
/// remove_and_compact_in(&mut tx, &Scope::Users, removed).await?;
/// tx.commit().await?;
///
/// let positions: Vec<i32> = store
///     .snapshot(&Scope::Users)
///     .await
///     .iter()
///     .map(|p| p.position)
///     .collect();
/// assert_eq!(positions, vec![1, 2, 3, 4]);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::OrderingResult;
use super::plan::{plan_reorder, PlanStep};
use super::scope::{PositionUpdate, Scope};
use super::store::{PositionStore, PositionTx};

/// Result of a reorder
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderOutcome {
    /// Records placed at a new position
    pub moved: usize,

    /// Requested IDs not found in the scope
    pub skipped: Vec<Uuid>,

    /// Store writes issued
    pub writes: usize,
}

/// Position to give a record about to be created in `scope`
///
/// `max(position) + 1`, or 1 for an empty scope.
pub async fn append_in<T: PositionTx>(tx: &mut T, scope: &Scope) -> OrderingResult<i32> {
    let max = tx.max_position(scope).await?;
    Ok(max + 1)
}

/// Closes the gap left by a record deleted from `removed_position`
///
/// Every record above the gap moves down by one. Returns the number of
/// records shifted.
pub async fn remove_and_compact_in<T: PositionTx>(
    tx: &mut T,
    scope: &Scope,
    removed_position: i32,
) -> OrderingResult<u64> {
    let shifted = tx
        .shift_range(scope, removed_position + 1, i32::MAX, -1)
        .await?;
    debug!(%scope, removed_position, shifted, "Compacted positions");
    Ok(shifted)
}

/// Applies a batch of moves inside an open unit
///
/// The scope is read once, the whole batch is planned and validated, and
/// only then are writes issued, each shift directly followed by the placement
/// of the moved record. Nothing is written when validation fails.
///
/// # Errors
///
/// - `InvalidPosition`, `DuplicateId`, `DuplicateTarget` for a bad batch
/// - store errors from the unit
pub async fn reorder_in<T: PositionTx>(
    tx: &mut T,
    scope: &Scope,
    updates: &[PositionUpdate],
) -> OrderingResult<ReorderOutcome> {
    let current = tx.list_ordered(scope).await?;
    let plan = plan_reorder(&current, updates)?;

    if !plan.skipped.is_empty() {
        warn!(%scope, skipped = ?plan.skipped, "Skipping moves for records outside the scope");
    }

    for step in &plan.steps {
        match *step {
            PlanStep::Shift { from, to, delta } => {
                tx.shift_range(scope, from, to, delta).await?;
            }
            PlanStep::Place { id, position } => {
                tx.set_position(scope, id, position).await?;
            }
        }
    }

    Ok(ReorderOutcome {
        moved: plan.moved,
        skipped: plan.skipped,
        writes: plan.steps.len(),
    })
}

/// Keeps the positions of a store dense
///
/// Holds an injected store handle; every method runs as one atomic unit.
#[derive(Debug, Clone)]
pub struct Reindexer<S> {
    store: S,
}

impl<S: PositionStore> Reindexer<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Store this reindexer writes to
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Position a new record in `scope` should be created at
    pub async fn append(&self, scope: &Scope) -> OrderingResult<i32> {
        let mut tx = self.store.begin().await?;
        let position = append_in(&mut tx, scope).await?;
        tx.commit().await?;
        Ok(position)
    }

    /// Shifts every record above `removed_position` down by one
    pub async fn remove_and_compact(&self, scope: &Scope, removed_position: i32) -> OrderingResult<u64> {
        let mut tx = self.store.begin().await?;
        let shifted = remove_and_compact_in(&mut tx, scope, removed_position).await?;
        tx.commit().await?;
        Ok(shifted)
    }

    /// Applies a batch of moves as one unit
    ///
    /// On any error the unit is rolled back and the scope is left exactly as
    /// it was.
    pub async fn reorder(
        &self,
        scope: &Scope,
        updates: &[PositionUpdate],
    ) -> OrderingResult<ReorderOutcome> {
        let mut tx = self.store.begin().await?;

        match reorder_in(&mut tx, scope, updates).await {
            Ok(outcome) => {
                tx.commit().await?;
                info!(
                    %scope,
                    requested = updates.len(),
                    moved = outcome.moved,
                    writes = outcome.writes,
                    "Reordered positions"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(%scope, error = %err, "Reorder failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(%scope, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}
