use crate::api::{ApiError, ApiResponse, ApiResult, state::AppState};
use adrive_core::{AuthContext, DriveError, QuotaSummary, UploadReceipt};
use axum::{
    Extension, Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use tracing::debug;

// POST /api/upload
pub async fn upload_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    mut multipart: Multipart,
) -> ApiResult<UploadReceipt> {
    let limit_bytes = state.max_upload_bytes;
    let mut file = None;
    let mut reusable = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| multipart_error(err, limit_bytes))?
    {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| multipart_error(err, limit_bytes))?;
                file = Some((name, bytes));
            }
            Some("reusable") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| multipart_error(err, limit_bytes))?;
                reusable = is_truthy(&value);
            }
            _ => {}
        }
    }

    let Some((name, bytes)) = file else {
        return Err(ApiError::bad_request("No file provided!"));
    };

    let receipt = state
        .core
        .exchange
        .upload(&name, &bytes, reusable, &auth)
        .await?;

    let message = if receipt.reusable {
        format!("Download code: {}", receipt.code)
    } else {
        format!("1-Time Download code: {}", receipt.code)
    };
    Ok(Json(ApiResponse::ok_with_message(receipt, message)))
}

// GET /api/quota
pub async fn get_quota(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<QuotaSummary> {
    Ok(Json(ApiResponse::ok(state.core.quota_summary(&auth)?)))
}

fn multipart_error(err: MultipartError, limit_bytes: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return DriveError::OversizedUpload { limit_bytes }.into();
    }
    debug!(error = %err, "Malformed upload");
    ApiError::bad_request(err.body_text())
}

fn is_truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}
