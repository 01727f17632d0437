//! Read models returned to the dashboard and upload collaborators.

use serde::Serialize;

/// Quota figures for the upload page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuotaSummary {
    pub quota_gb: f64,
    pub usage_gb: f64,
    pub remaining_gb: f64,
}

/// One owned file as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnedFile {
    pub stored_name: String,
    pub code: String,
    pub original_name: String,
    pub size_megabytes: f64,
    pub reusable: bool,
}

/// Everything the dashboard shows for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub username: String,
    pub files: Vec<OwnedFile>,
    pub quota_gb: f64,
    pub quota_usage_gb: f64,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub code: String,
    pub stored_name: String,
    pub size_megabytes: f64,
    pub reusable: bool,
    pub owner: Option<String>,
    /// The uploader was authenticated but the file did not fit their
    /// remaining quota, so it was stored unowned.
    pub quota_exceeded: bool,
}
