use adrive_core::DriveError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, warn};

/// Shown for every failure on the download path.
pub const INVALID_CODE_MESSAGE: &str = "Invalid code! Check if you typed the correct code, and for one-time codes, make sure nobody else entered the code before you did.";

#[derive(Serialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message.into()),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Error half of a handler result: a status plus the JSON envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "You must be signed in!")
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn invalid_code() -> Self {
        Self::new(StatusCode::NOT_FOUND, INVALID_CODE_MESSAGE)
    }
}

impl From<DriveError> for ApiError {
    fn from(error: DriveError) -> Self {
        match error {
            DriveError::InvalidCode => Self::invalid_code(),
            DriveError::Forbidden => {
                Self::forbidden("You do not own this file and cannot delete it.")
            }
            DriveError::OversizedUpload { .. } => Self::new(
                StatusCode::PAYLOAD_TOO_LARGE,
                "File is larger than the size limit.",
            ),
            DriveError::UnknownUser(username) => {
                Self::new(StatusCode::NOT_FOUND, format!("User {} not found", username))
            }
            DriveError::UserExists(_) => Self::new(StatusCode::CONFLICT, "Username already taken!"),
            DriveError::InvalidQuota(_) => Self::bad_request(error.to_string()),
            DriveError::CodeSpaceExhausted(_) => {
                warn!(%error, "Upload rejected");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "No download code available, try again.")
            }
            DriveError::Storage(_) | DriveError::Io(_) => {
                error!(%error, "Request failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::error(self.message))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;
