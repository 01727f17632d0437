//! Stored file records.

use serde::{Deserialize, Serialize};

const BYTES_PER_MEGABYTE: f64 = 1024.0 * 1024.0;
const MEGABYTES_PER_GIGABYTE: f64 = 1024.0;

/// Registry record for one uploaded file, keyed by its stored name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Name the uploader's client sent, before sanitizing.
    #[serde(default)]
    pub original_name: String,
    /// Size on disk, rounded to one decimal place.
    pub size_megabytes: f64,
    pub reusable: bool,
    /// Set only when an authenticated uploader had quota for the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Upload time in milliseconds since the epoch.
    #[serde(default)]
    pub uploaded_at: i64,
    /// Set while the blob sits under its serving name.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub serving: bool,
}

impl FileEntry {
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner.as_deref() == Some(username)
    }
}

/// A registry record together with its key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredFile {
    pub stored_name: String,
    #[serde(flatten)]
    pub entry: FileEntry,
}

impl StoredFile {
    /// The download code carried by the stored name.
    pub fn code(&self) -> &str {
        crate::naming::code_of(&self.stored_name).unwrap_or_default()
    }
}

/// Round to one decimal place. All size and quota figures use this precision.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Byte count to megabytes, rounded to one decimal place.
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    round_tenth(bytes as f64 / BYTES_PER_MEGABYTE)
}

pub fn megabytes_to_gb(megabytes: f64) -> f64 {
    megabytes / MEGABYTES_PER_GIGABYTE
}
