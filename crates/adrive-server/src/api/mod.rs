pub mod admin;
pub mod download;
pub mod files;
pub mod response;
pub mod state;
pub mod upload;

pub use response::{ApiError, ApiResponse, ApiResult};

use crate::auth::auth_middleware;
use admin::*;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware,
    routing::{get, post, put},
};
use download::*;
use files::*;
use state::AppState;
use tower_http::cors::CorsLayer;
use upload::*;

#[derive(serde::Serialize)]
struct Health {
    status: String,
}

async fn health() -> axum::Json<Health> {
    axum::Json(Health {
        status: "adrive is working!".to_string(),
    })
}

pub fn router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.max_upload_bytes).unwrap_or(usize::MAX);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health))
        // Exchange
        .route("/api/upload", post(upload_file))
        .route("/api/quota", get(get_quota))
        .route("/download", get(download_without_code))
        .route("/download/{code}", get(download).post(download))
        .route("/api/files/{code}", post(delete_file).delete(delete_file))
        .route("/api/dashboard", get(get_dashboard))
        // Administration
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{username}/quota", put(set_quota))
        .route("/api/admin/users/{username}/admin", put(set_admin))
        .route(
            "/api/admin/users/{username}",
            axum::routing::delete(delete_user),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}
