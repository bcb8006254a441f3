//! Route handlers

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::AppState;
use super::middleware::CurrentUser;
use crate::error::{ApiError, VIDEO_NOT_FOUND, VIDEO_NOT_FOUND_OR_NOT_AUTHORIZED};
use crate::store::Video;

/// The signed-in user as reported by `/api/auth/me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Subject of the verified token
    pub id: String,
    /// `email`, falling back to `primary_email`
    pub email: Option<String>,
    /// Given name
    pub first_name: Option<String>,
    /// Family name
    pub last_name: Option<String>,
    /// `image_url`, falling back to `picture`
    pub image_url: Option<String>,
}

impl From<&CurrentUser> for UserProfile {
    fn from(user: &CurrentUser) -> Self {
        let claims = user.claims();
        let text = |name: &str| claims.get_str(name).map(str::to_string);

        Self {
            id: user.subject().to_string(),
            email: text("email").or_else(|| text("primary_email")),
            first_name: text("first_name"),
            last_name: text("last_name"),
            image_url: text("image_url").or_else(|| text("picture")),
        }
    }
}

/// Liveness probe
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Profile of the caller, read from the verified claims
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}

/// Every video, public
pub async fn list_videos(State(state): State<AppState>) -> Json<Vec<Video>> {
    Json(state.store.list_all().await)
}

/// Videos owned by the caller
pub async fn my_videos(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Json<Vec<Video>> {
    Json(state.store.list_by_owner(user.subject()).await)
}

/// One video by id; 404 when absent
pub async fn get_video(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Video>, ApiError> {
    state
        .store
        .get_by_id(id)
        .await
        .map(Json)
        .map_err(|e| ApiError::from_store(e, VIDEO_NOT_FOUND))
}

/// Store a video owned by the caller, whatever `user_id` the body claims
pub async fn create_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(video): Json<Video>,
) -> impl IntoResponse {
    let stored = state.store.create(video, user.subject()).await;
    (StatusCode::CREATED, Json(stored))
}

/// Delete one of the caller's videos
///
/// Someone else's video answers exactly like a missing one.
pub async fn delete_video(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .delete_by_id_and_owner(id, user.subject())
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(|e| ApiError::from_store(e, VIDEO_NOT_FOUND_OR_NOT_AUTHORIZED))
}
