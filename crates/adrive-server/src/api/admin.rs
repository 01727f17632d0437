use crate::api::{ApiResponse, ApiResult, state::AppState};
use crate::auth::require_admin;
use adrive_core::{AuthContext, UserUsage};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SetQuotaRequest {
    pub quota_gb: f64,
}

/// Omitting `is_admin` toggles the flag.
#[derive(Debug, Default, Deserialize)]
pub struct SetAdminRequest {
    pub is_admin: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct AdminFlag {
    pub username: String,
    pub is_admin: bool,
}

// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Vec<UserUsage>> {
    require_admin(&state, &auth)?;
    Ok(Json(ApiResponse::ok(state.core.admin.list_users()?)))
}

// PUT /api/admin/users/{username}/quota
pub async fn set_quota(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
    Json(request): Json<SetQuotaRequest>,
) -> ApiResult<f64> {
    require_admin(&state, &auth)?;
    state.core.admin.set_quota(&username, request.quota_gb)?;
    Ok(Json(ApiResponse::ok_with_message(
        request.quota_gb,
        format!("Quota for {} set to {} GB", username, request.quota_gb),
    )))
}

// PUT /api/admin/users/{username}/admin
pub async fn set_admin(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
    Json(request): Json<SetAdminRequest>,
) -> ApiResult<AdminFlag> {
    require_admin(&state, &auth)?;
    let is_admin = match request.is_admin {
        Some(is_admin) => {
            state.core.admin.set_admin(&username, is_admin)?;
            is_admin
        }
        None => state.core.admin.toggle_admin(&username)?,
    };
    Ok(Json(ApiResponse::ok(AdminFlag { username, is_admin })))
}

// DELETE /api/admin/users/{username}
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(username): Path<String>,
) -> ApiResult<usize> {
    require_admin(&state, &auth)?;
    let removed = state.core.admin.delete_user(&username).await?;
    Ok(Json(ApiResponse::ok_with_message(
        removed,
        format!("User {} deleted with {} files", username, removed),
    )))
}
