use uuid::Uuid;

/// Errors raised while maintaining positions
#[derive(Debug, thiserror::Error)]
pub enum OrderingError {
    /// Target position outside `1..=len`
    #[error("Invalid position {position}: scope holds {len} records")]
    InvalidPosition { position: i32, len: usize },

    /// Same record named twice in one batch
    #[error("Record {0} appears more than once in the batch")]
    DuplicateId(Uuid),

    /// Two records asked for the same target position
    #[error("Position {0} requested by more than one record")]
    DuplicateTarget(i32),

    /// Underlying database failure
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Non-database store failure (in-memory store)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl OrderingError {
    /// Whether the caller sent a batch that can never be applied
    pub fn is_rejected_input(&self) -> bool {
        matches!(
            self,
            OrderingError::InvalidPosition { .. }
                | OrderingError::DuplicateId(_)
                | OrderingError::DuplicateTarget(_)
        )
    }
}

/// Ordering result type alias
pub type OrderingResult<T> = Result<T, OrderingError>;
