/// Database models for Roster
///
/// # Models
///
/// - `user`: Admin-managed users, globally ordered
/// - `image`: Gallery images, ordered per user
///
/// Creating or deleting a record and reindexing its siblings always happen in
/// the same transaction; see [`crate::ordering`].
///
/// # Example
///
/// ```no_run
/// use roster_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), roster_shared::models::ModelError> {
/// let user = User::create(
///     &pool,
///     CreateUser {
///         name: "Ada".to_string(),
///         email: "ada@example.com".to_string(),
///         roles: vec!["admin".to_string()],
///         bio: String::new(),
///     },
/// )
/// .await?;
/// println!("{} is at position {}", user.name, user.position);
/// # Ok(())
/// # }
/// ```

use crate::ordering::OrderingError;

pub mod image;
pub mod user;

/// Errors returned by model operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Reindexing failed or the batch was rejected
    #[error(transparent)]
    Ordering(#[from] OrderingError),

    /// Query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Model result type alias
pub type ModelResult<T> = Result<T, ModelError>;
