/// Store capability traits
///
/// The reindexer never talks to a database directly. It opens an atomic unit
/// through [`PositionStore::begin`] and issues reads and writes through the
/// returned [`PositionTx`]. Everything written through one unit becomes
/// visible together on [`PositionTx::commit`]; a unit that is rolled back or
/// simply dropped leaves the store untouched.
///
/// # Implementations
///
/// - `PgPositionStore`: PostgreSQL (`users` / `images` tables)
/// - `MemoryPositionStore`: in-process, used by tests

use async_trait::async_trait;
use uuid::Uuid;

use super::error::OrderingResult;
use super::scope::{Placement, Scope};

/// Opens atomic units against a position table
#[async_trait]
pub trait PositionStore: Send + Sync {
    /// Unit of work type
    type Tx: PositionTx;

    /// Starts a new atomic unit
    async fn begin(&self) -> OrderingResult<Self::Tx>;
}

/// Reads and writes positions inside one atomic unit
#[async_trait]
pub trait PositionTx: Send {
    /// Every record of the scope, ascending by position
    async fn list_ordered(&mut self, scope: &Scope) -> OrderingResult<Vec<Placement>>;

    /// Highest position in the scope, 0 when empty
    async fn max_position(&mut self, scope: &Scope) -> OrderingResult<i32>;

    /// Moves one record to `position`
    async fn set_position(&mut self, scope: &Scope, id: Uuid, position: i32) -> OrderingResult<()>;

    /// Adds `delta` to every position in `from..=to`
    ///
    /// Returns the number of records touched.
    async fn shift_range(
        &mut self,
        scope: &Scope,
        from: i32,
        to: i32,
        delta: i32,
    ) -> OrderingResult<u64>;

    /// Publishes every write made through this unit
    async fn commit(self) -> OrderingResult<()>;

    /// Discards every write made through this unit
    async fn rollback(self) -> OrderingResult<()>;
}
