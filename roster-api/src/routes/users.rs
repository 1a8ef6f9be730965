/// User endpoints
///
/// # Endpoints
///
/// - `GET /v1/users` - List users with their galleries, ordered by position
/// - `POST /v1/users` - Create user (appended at the end of the list)
/// - `GET /v1/users/:id` - Get user with gallery
/// - `PUT /v1/users/:id` - Update user fields
/// - `DELETE /v1/users/:id` - Delete user and close the gap
/// - `PUT /v1/users/positions` - Apply a drag-and-drop batch

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    routes::ReorderRequest,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use roster_shared::{
    models::user::{is_known_role, CreateUser, UpdateUser, User, UserWithImages, ROLES},
    ordering::ReorderOutcome,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create user request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 20, message = "Name must be 2-20 characters"))]
    pub name: String,

    #[validate(email(message = "Please enter a valid email address."))]
    pub email: String,

    /// Any of `admin`, `editor`, `viewer`
    #[validate(length(min = 1, message = "Please select at least one role."))]
    pub roles: Vec<String>,

    #[serde(default)]
    #[validate(length(max = 300, message = "Bio must be at most 300 characters"))]
    pub bio: String,
}

/// Update user request
///
/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 20, message = "Name must be 2-20 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Please enter a valid email address."))]
    pub email: Option<String>,

    #[validate(length(min = 1, message = "Please select at least one role."))]
    pub roles: Option<Vec<String>>,

    #[validate(length(max = 300, message = "Bio must be at most 300 characters"))]
    pub bio: Option<String>,
}

/// List users response
#[derive(Debug, Serialize)]
pub struct ListUsersResponse {
    pub users: Vec<UserWithImages>,
}

/// Delete response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

fn check_roles(roles: &[String]) -> ApiResult<()> {
    if let Some(unknown) = roles.iter().find(|role| !is_known_role(role)) {
        return Err(ApiError::ValidationError(vec![ValidationErrorDetail::new(
            "roles",
            format!(
                "Unknown role '{}', expected one of: {}",
                unknown,
                ROLES.join(", ")
            ),
        )]));
    }
    Ok(())
}

/// List users
///
/// # Response
///
/// ```json
/// {
///   "users": [
///     {
///       "id": "uuid",
///       "name": "Ada",
///       "email": "ada@example.com",
///       "roles": ["admin"],
///       "bio": "",
///       "position": 1,
///       "created_at": "2024-06-01T12:00:00Z",
///       "updated_at": "2024-06-01T12:00:00Z",
///       "images": []
///     }
///   ]
/// }
/// ```
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<ListUsersResponse>> {
    let users = User::list_with_images(&state.db).await?;
    Ok(Json(ListUsersResponse { users }))
}

/// Get a user with its gallery
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserWithImages>> {
    User::find_with_images(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Create a user
///
/// ```text
/// POST /v1/users
/// Content-Type: application/json
///
/// { "name": "Ada", "email": "ada@example.com", "roles": ["admin"], "bio": "" }
/// ```
///
/// A taken email is stored as the first free `local+N@domain` alias.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `409 Conflict`: A concurrent create took the same position
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    req.validate()?;
    check_roles(&req.roles)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            roles: req.roles,
            bio: req.bio,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// Update a user
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Validation failed
/// - `404 Not Found`: No such user
/// - `409 Conflict`: Email already exists
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;
    if let Some(roles) = &req.roles {
        check_roles(roles)?;
    }

    User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            roles: req.roles,
            bio: req.bio,
        },
    )
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Delete a user
///
/// Followers move up one place and the user's images are removed with it.
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    if !User::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(DeleteResponse { deleted: true }))
}

/// Reorder users
///
/// ```text
/// PUT /v1/users/positions
///
/// { "updates": [ { "id": "uuid", "newPosition": 1 } ] }
/// ```
///
/// # Response
///
/// ```json
/// { "moved": 1, "skipped": [], "writes": 4 }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Duplicate ids or targets, or a target outside `1..=N`
pub async fn update_user_positions(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<ReorderOutcome>> {
    let updates = req.checked()?;
    let outcome = User::update_positions(&state.db, updates).await?;
    Ok(Json(outcome))
}
