/// PostgreSQL position store
///
/// Each unit of work is one sqlx transaction. Scopes map onto tables:
///
/// | Scope                 | Table    | Filter              |
/// |-----------------------|----------|---------------------|
/// | `Users`               | `users`  | none                |
/// | `UserImages(user_id)` | `images` | `user_id = user_id` |
///
/// Reads take `FOR UPDATE` row locks, so two reorders of the same scope run
/// one after the other instead of both planning against the same snapshot.
/// The `position` unique constraints are `DEFERRABLE INITIALLY DEFERRED`:
/// the transient duplicates produced mid-shift are allowed, a committed
/// duplicate is not.
///
/// # Example
///
/// ```no_run
/// use roster_shared::ordering::{PgPositionStore, Reindexer, Scope};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), roster_shared::ordering::OrderingError> {
/// let reindexer = Reindexer::new(PgPositionStore::new(pool));
/// let next = reindexer.append(&Scope::Users).await?;
/// println!("Next user goes at position {}", next);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::error::OrderingResult;
use super::scope::{Placement, Scope};
use super::store::{PositionStore, PositionTx};

/// Position store over the `users` and `images` tables
#[derive(Debug, Clone)]
pub struct PgPositionStore {
    pool: PgPool,
}

impl PgPositionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl PositionStore for PgPositionStore {
    type Tx = PgPositionTx;

    async fn begin(&self) -> OrderingResult<PgPositionTx> {
        let tx = self.pool.begin().await?;
        Ok(PgPositionTx { tx })
    }
}

/// One PostgreSQL transaction
///
/// Model code runs its own `INSERT` / `DELETE` statements through
/// [`PgPositionTx::conn`] so the row change and the reindexing commit together.
pub struct PgPositionTx {
    tx: Transaction<'static, Postgres>,
}

impl PgPositionTx {
    /// Connection for additional statements inside this transaction
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut *self.tx
    }
}

/// Appends the `WHERE` clause selecting the records of `scope`
///
/// Further conditions can follow as `AND ...`.
fn push_scope_filter(qb: &mut QueryBuilder<'_, Postgres>, scope: &Scope) {
    match scope {
        Scope::Users => {
            qb.push(" WHERE TRUE");
        }
        Scope::UserImages(user_id) => {
            qb.push(" WHERE user_id = ");
            qb.push_bind(*user_id);
        }
    }
}

#[async_trait]
impl PositionTx for PgPositionTx {
    async fn list_ordered(&mut self, scope: &Scope) -> OrderingResult<Vec<Placement>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id, position FROM ");
        qb.push(scope.table());
        push_scope_filter(&mut qb, scope);
        qb.push(" ORDER BY position ASC FOR UPDATE");

        let placements = qb
            .build_query_as::<Placement>()
            .fetch_all(&mut *self.tx)
            .await?;

        Ok(placements)
    }

    async fn max_position(&mut self, scope: &Scope) -> OrderingResult<i32> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT position FROM ");
        qb.push(scope.table());
        push_scope_filter(&mut qb, scope);
        qb.push(" ORDER BY position DESC LIMIT 1 FOR UPDATE");

        let max: Option<(i32,)> = qb
            .build_query_as()
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(max.map(|(position,)| position).unwrap_or(0))
    }

    async fn set_position(&mut self, scope: &Scope, id: Uuid, position: i32) -> OrderingResult<()> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(scope.table());
        qb.push(" SET position = ");
        qb.push_bind(position);
        push_scope_filter(&mut qb, scope);
        qb.push(" AND id = ");
        qb.push_bind(id);

        qb.build().execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn shift_range(
        &mut self,
        scope: &Scope,
        from: i32,
        to: i32,
        delta: i32,
    ) -> OrderingResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE ");
        qb.push(scope.table());
        qb.push(" SET position = position + ");
        qb.push_bind(delta);
        push_scope_filter(&mut qb, scope);
        qb.push(" AND position BETWEEN ");
        qb.push_bind(from);
        qb.push(" AND ");
        qb.push_bind(to);

        let result = qb.build().execute(&mut *self.tx).await?;
        debug!(%scope, from, to, delta, rows = result.rows_affected(), "Shifted positions");
        Ok(result.rows_affected())
    }

    async fn commit(self) -> OrderingResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> OrderingResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
