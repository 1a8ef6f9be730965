/// Scopes, placements and update requests
///
/// A scope is the sibling group a position sequence is computed over. Users
/// are ordered globally; images are ordered per owning user.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sibling group whose positions form one dense `1..=N` sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "user_id", rename_all = "snake_case")]
pub enum Scope {
    /// All users
    Users,

    /// Images belonging to one user
    UserImages(Uuid),
}

impl Scope {
    /// Table holding the records of this scope
    pub fn table(&self) -> &'static str {
        match self {
            Scope::Users => "users",
            Scope::UserImages(_) => "images",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Users => write!(f, "users"),
            Scope::UserImages(user_id) => write!(f, "images:{}", user_id),
        }
    }
}

/// Current position of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Placement {
    /// Record ID
    pub id: Uuid,

    /// 1-based position within the scope
    pub position: i32,
}

impl Placement {
    pub fn new(id: Uuid, position: i32) -> Self {
        Self { id, position }
    }
}

/// Requested move of one record
///
/// Serialized as `{ "id": "...", "newPosition": 3 }`, the shape the admin
/// table submits after a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    /// Record to move
    pub id: Uuid,

    /// Target position (1-based)
    pub new_position: i32,
}

impl PositionUpdate {
    pub fn new(id: Uuid, new_position: i32) -> Self {
        Self { id, new_position }
    }
}
