/// Position reindexing for ordered records
///
/// Users and images each carry an explicit `position` column. Within one
/// [`Scope`] those positions must always form the dense sequence `1..=N`:
/// no gaps and no duplicates. This module keeps that invariant under the three
/// mutations the admin interface performs:
///
/// - **append**: a new record goes at `max(position) + 1`
/// - **remove and compact**: after a delete, every later sibling moves up by one
/// - **reorder**: a batch of drag-and-drop moves is applied as one unit
///
/// The algorithm is written once against the [`PositionStore`] /
/// [`PositionTx`] capability traits. [`PgPositionStore`] backs it with the
/// `users` and `images` tables, [`MemoryPositionStore`] keeps everything in
/// process for tests.
///
/// # Example
///
/// ```no_run
/// use roster_shared::ordering::{MemoryPositionStore, PositionUpdate, Reindexer, Scope};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), roster_shared::ordering::OrderingError> {
/// let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
/// let store = MemoryPositionStore::new();
/// store.seed(&Scope::Users, &ids).await;
///
/// let reindexer = Reindexer::new(store);
/// assert_eq!(reindexer.append(&Scope::Users).await?, 4);
///
/// // Drag the last user to the top
/// let outcome = reindexer
///     .reorder(&Scope::Users, &[PositionUpdate::new(ids[2], 1)])
///     .await?;
/// assert_eq!(outcome.moved, 1);
/// # Ok(())
/// # }
/// ```

pub mod error;
pub mod memory;
pub mod plan;
pub mod postgres;
pub mod reindexer;
pub mod scope;
pub mod store;

pub use error::{OrderingError, OrderingResult};
pub use memory::{MemoryPositionStore, MemoryPositionTx};
pub use plan::{check_batch, plan_reorder, PlanStep, ReorderPlan};
pub use postgres::{PgPositionStore, PgPositionTx};
pub use reindexer::{append_in, remove_and_compact_in, reorder_in, ReorderOutcome, Reindexer};
pub use scope::{Placement, PositionUpdate, Scope};
pub use store::{PositionStore, PositionTx};
