use crate::api::{ApiResponse, ApiResult, state::AppState};
use crate::auth::require_user;
use adrive_core::{AuthContext, Dashboard};
use axum::{
    Extension, Json,
    extract::{Path, State},
};

// POST|DELETE /api/files/{code}
pub async fn delete_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(code): Path<String>,
) -> ApiResult<String> {
    let removed = state.core.exchange.delete(&code, &auth).await?;
    Ok(Json(ApiResponse::ok_with_message(
        removed.stored_name,
        format!("File with code {} has been deleted.", code),
    )))
}

// GET /api/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Dashboard> {
    let username = require_user(&auth)?;
    Ok(Json(ApiResponse::ok(state.core.dashboard(username)?)))
}
