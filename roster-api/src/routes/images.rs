/// Gallery endpoints
///
/// # Endpoints
///
/// - `GET /v1/users/:id/images` - List a user's images by position
/// - `POST /v1/users/:id/images` - Register an uploaded image URL
/// - `PUT /v1/users/:id/images/positions` - Reorder one gallery
/// - `DELETE /v1/images/:id` - Delete an image and close the gap

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{users::DeleteResponse, ReorderRequest},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use roster_shared::{
    models::{
        image::{CreateImage, Image},
        user::User,
    },
    ordering::ReorderOutcome,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Create image request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateImageRequest {
    /// Location of the already uploaded file
    #[validate(url(message = "Image must be a valid URL"))]
    pub url: String,
}

/// List images response
#[derive(Debug, Serialize)]
pub struct ListImagesResponse {
    pub images: Vec<Image>,
}

async fn require_user(db: &PgPool, user_id: Uuid) -> ApiResult<()> {
    match User::find_by_id(db, user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

/// List a user's images
///
/// # Errors
///
/// - `404 Not Found`: No such user
pub async fn list_images(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ListImagesResponse>> {
    require_user(&state.db, user_id).await?;

    let images = Image::list_for_user(&state.db, user_id).await?;
    Ok(Json(ListImagesResponse { images }))
}

/// Register an image at the end of a user's gallery
///
/// ```text
/// POST /v1/users/:id/images
///
/// { "url": "https://bucket.s3.amazonaws.com/users/1/photo.png" }
/// ```
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Not a URL
/// - `404 Not Found`: No such user
pub async fn create_image(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CreateImageRequest>,
) -> ApiResult<(StatusCode, Json<Image>)> {
    req.validate()?;
    require_user(&state.db, user_id).await?;

    let image = Image::create(
        &state.db,
        CreateImage {
            user_id,
            url: req.url,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(image)))
}

/// Reorder one user's gallery
///
/// Same body and response as `PUT /v1/users/positions`.
///
/// # Errors
///
/// - `400 Bad Request`: Duplicate ids or targets, or a target outside `1..=N`
/// - `404 Not Found`: No such user
pub async fn update_image_positions(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Json<ReorderOutcome>> {
    let updates = req.checked()?;
    require_user(&state.db, user_id).await?;

    let outcome = Image::update_positions(&state.db, user_id, updates).await?;
    Ok(Json(outcome))
}

/// Delete an image
///
/// # Errors
///
/// - `404 Not Found`: No such image
pub async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    if !Image::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Image not found".to_string()));
    }

    Ok(Json(DeleteResponse { deleted: true }))
}
