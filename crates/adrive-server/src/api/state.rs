use adrive_core::DriveCore;
use std::sync::Arc;

/// Application state shared across all API handlers
pub struct ServerState {
    pub core: Arc<DriveCore>,
    /// HS256 secret for bearer tokens; `None` disables authentication.
    pub jwt_secret: Option<String>,
    pub max_upload_bytes: u64,
}

pub type AppState = Arc<ServerState>;
