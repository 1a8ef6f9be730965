/// User model and database operations
///
/// Users form one global ordering: the admin table lists them by `position`
/// and lets the operator drag rows around. New users go to the end, deleted
/// users leave no gap.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     roles TEXT[] NOT NULL DEFAULT '{}',
///     bio TEXT NOT NULL DEFAULT '',
///     position INTEGER NOT NULL CHECK (position > 0),   -- unique, deferred
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use tracing::{debug, info};
use uuid::Uuid;

use super::image::Image;
use super::ModelResult;
use crate::ordering::{
    append_in, remove_and_compact_in, PgPositionStore, PositionStore, PositionTx, PositionUpdate,
    ReorderOutcome, Reindexer, Scope,
};

/// Roles a user may hold
pub const ROLES: [&str; 3] = ["admin", "editor", "viewer"];

/// Whether `role` is one of [`ROLES`]
pub fn is_known_role(role: &str) -> bool {
    ROLES.contains(&role)
}

/// `local+counter@domain` variant of an email address
///
/// Used to keep emails unique when an admin creates a second user with an
/// address that is already taken.
pub fn alias_email(email: &str, counter: u32) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}+{}@{}", local, counter, domain),
        None => format!("{}+{}", email, counter),
    }
}

const USER_COLUMNS: &str = "id, name, email, roles, bio, position, created_at, updated_at";

/// User record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, unique across users
    pub email: String,

    /// Granted roles, drawn from [`ROLES`]
    pub roles: Vec<String>,

    /// Free-form biography
    pub bio: String,

    /// 1-based place in the user list
    pub position: i32,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
///
/// The position is assigned by the reindexer, never by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub bio: String,
}

/// Input for updating a user
///
/// Only `Some` fields change. Position is not editable here; use
/// [`User::update_positions`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub roles: Option<Vec<String>>,
    pub bio: Option<String>,
}

/// User together with its ordered gallery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWithImages {
    #[serde(flatten)]
    pub user: User,

    /// Images, ascending by position
    pub images: Vec<Image>,
}

impl User {
    /// Creates a user at the end of the list
    ///
    /// If the email is already taken it is rewritten to the first free
    /// `local+N@domain` alias. The position lookup, the alias search and the
    /// insert share one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database fails or a concurrent create took the
    /// same position or email (constraint violation at commit).
    pub async fn create(pool: &PgPool, data: CreateUser) -> ModelResult<Self> {
        let mut tx = PgPositionStore::new(pool.clone()).begin().await?;

        let position = append_in(&mut tx, &Scope::Users).await?;
        let email = Self::free_email(tx.conn(), &data.email).await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, roles, bio, position)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(data.name)
        .bind(email)
        .bind(data.roles)
        .bind(data.bio)
        .bind(position)
        .fetch_one(tx.conn())
        .await?;

        tx.commit().await?;

        info!(user_id = %user.id, position, "Created user");
        Ok(user)
    }

    /// `email` if free, otherwise the first free alias
    async fn free_email(conn: &mut PgConnection, email: &str) -> Result<String, sqlx::Error> {
        if !Self::email_taken(conn, email).await? {
            return Ok(email.to_string());
        }

        let mut counter = 1;
        loop {
            let candidate = alias_email(email, counter);
            if !Self::email_taken(conn, &candidate).await? {
                debug!(requested = email, assigned = %candidate, "Email taken, using alias");
                return Ok(candidate);
            }
            counter += 1;
        }
    }

    async fn email_taken(conn: &mut PgConnection, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&mut *conn)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> ModelResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// All users, ascending by position
    pub async fn list(pool: &PgPool) -> ModelResult<Vec<Self>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY position ASC",
            USER_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// All users with their galleries, both ascending by position
    pub async fn list_with_images(pool: &PgPool) -> ModelResult<Vec<UserWithImages>> {
        let users = Self::list(pool).await?;
        let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();

        let mut galleries: HashMap<Uuid, Vec<Image>> = HashMap::new();
        for image in Image::list_for_users(pool, &ids).await? {
            galleries.entry(image.user_id).or_default().push(image);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let images = galleries.remove(&user.id).unwrap_or_default();
                UserWithImages { user, images }
            })
            .collect())
    }

    /// One user with its gallery
    pub async fn find_with_images(pool: &PgPool, id: Uuid) -> ModelResult<Option<UserWithImages>> {
        let Some(user) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let images = Image::list_for_user(pool, id).await?;
        Ok(Some(UserWithImages { user, images }))
    }

    /// Updates name, email, roles and bio
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update(pool: &PgPool, id: Uuid, data: UpdateUser) -> ModelResult<Option<Self>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET name = COALESCE($2, name),
                 email = COALESCE($3, email),
                 roles = COALESCE($4, roles),
                 bio = COALESCE($5, bio),
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.roles)
        .bind(data.bio)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Deletes a user and closes the gap it leaves
    ///
    /// The user's images go with it (`ON DELETE CASCADE`). Returns false if
    /// the user did not exist.
    pub async fn delete(pool: &PgPool, id: Uuid) -> ModelResult<bool> {
        let mut tx = PgPositionStore::new(pool.clone()).begin().await?;

        let removed: Option<(i32,)> =
            sqlx::query_as("DELETE FROM users WHERE id = $1 RETURNING position")
                .bind(id)
                .fetch_optional(tx.conn())
                .await?;

        let Some((position,)) = removed else {
            tx.rollback().await?;
            return Ok(false);
        };

        remove_and_compact_in(&mut tx, &Scope::Users, position).await?;
        tx.commit().await?;

        info!(user_id = %id, position, "Deleted user");
        Ok(true)
    }

    /// Applies a drag-and-drop batch to the user list
    pub async fn update_positions(
        pool: &PgPool,
        updates: &[PositionUpdate],
    ) -> ModelResult<ReorderOutcome> {
        let reindexer = Reindexer::new(PgPositionStore::new(pool.clone()));
        Ok(reindexer.reorder(&Scope::Users, updates).await?)
    }

    /// Number of users
    pub async fn count(pool: &PgPool) -> ModelResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_email() {
        assert_eq!(alias_email("ada@example.com", 1), "ada+1@example.com");
        assert_eq!(alias_email("ada@example.com", 12), "ada+12@example.com");
        assert_eq!(alias_email("not-an-email", 2), "not-an-email+2");
    }

    #[test]
    fn test_known_roles() {
        assert!(is_known_role("admin"));
        assert!(is_known_role("viewer"));
        assert!(!is_known_role("owner"));
        assert!(!is_known_role("Admin"));
    }

    #[test]
    fn test_update_user_default() {
        let update = UpdateUser::default();
        assert!(update.name.is_none());
        assert!(update.email.is_none());
        assert!(update.roles.is_none());
        assert!(update.bio.is_none());
    }

    #[test]
    fn test_user_with_images_flattens() {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            roles: vec!["admin".to_string()],
            bio: String::new(),
            position: 1,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(UserWithImages {
            user: user.clone(),
            images: Vec::new(),
        })
        .unwrap();

        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["position"], 1);
        assert!(json["images"].as_array().unwrap().is_empty());
    }

    // Database round trips are in tests/models_tests.rs
}
