/// API route handlers
///
/// - `health`: Health check endpoint
/// - `users`: User CRUD and list reordering
/// - `images`: Gallery images and gallery reordering

pub mod health;
pub mod images;
pub mod users;

use crate::error::{ApiError, ApiResult};
use roster_shared::ordering::{check_batch, PositionUpdate};
use serde::Deserialize;

/// Body of the reorder endpoints
///
/// ```json
/// { "updates": [ { "id": "uuid", "newPosition": 1 } ] }
/// ```
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub updates: Vec<PositionUpdate>,
}

impl ReorderRequest {
    /// Rejects ambiguous batches before a transaction is opened
    pub fn checked(&self) -> ApiResult<&[PositionUpdate]> {
        check_batch(&self.updates).map_err(ApiError::from)?;
        if let Some(bad) = self.updates.iter().find(|u| u.new_position < 1) {
            return Err(ApiError::BadRequest(format!(
                "Position {} is out of range, positions start at 1",
                bad.new_position
            )));
        }
        Ok(&self.updates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_checked_accepts_distinct_moves() {
        let request = ReorderRequest {
            updates: vec![
                PositionUpdate::new(Uuid::new_v4(), 1),
                PositionUpdate::new(Uuid::new_v4(), 2),
            ],
        };
        assert_eq!(request.checked().unwrap().len(), 2);
    }

    #[test]
    fn test_checked_rejects_duplicate_targets() {
        let request = ReorderRequest {
            updates: vec![
                PositionUpdate::new(Uuid::new_v4(), 2),
                PositionUpdate::new(Uuid::new_v4(), 2),
            ],
        };
        assert!(matches!(request.checked(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn test_checked_rejects_non_positive() {
        let request = ReorderRequest {
            updates: vec![PositionUpdate::new(Uuid::new_v4(), 0)],
        };
        assert!(matches!(request.checked(), Err(ApiError::BadRequest(_))));
    }
}
