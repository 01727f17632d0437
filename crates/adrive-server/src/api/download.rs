use crate::api::{ApiError, state::AppState};
use adrive_core::services::ServedFile;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;
use tracing::warn;

// GET /download
pub async fn download_without_code() -> ApiError {
    ApiError::bad_request("No code provided!")
}

// GET|POST /download/{code}
pub async fn download(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    match state.core.exchange.serve(&code).await {
        Ok(served) => file_response(served),
        Err(err) => {
            warn!(code = %code, error = %err, "Download failed");
            ApiError::invalid_code().into_response()
        }
    }
}

fn file_response(served: ServedFile) -> Response {
    let content_type = mime_guess::from_path(&served.original_name).first_or_octet_stream();
    let content_type = HeaderValue::from_str(content_type.as_ref())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&served.original_name))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (header::CONTENT_LENGTH, HeaderValue::from(served.size_bytes)),
        (header::CONTENT_DISPOSITION, disposition),
    ];
    let body = Body::from_stream(ReaderStream::new(served.file));
    (headers, body).into_response()
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition() {
        assert_eq!(
            content_disposition("report.pdf"),
            "attachment; filename=\"report.pdf\"; filename*=UTF-8''report.pdf"
        );
        assert_eq!(
            content_disposition("résumé \"v2\".txt"),
            "attachment; filename=\"r_sum_ _v2_.txt\"; filename*=UTF-8''r%C3%A9sum%C3%A9%20%22v2%22.txt"
        );
    }
}
