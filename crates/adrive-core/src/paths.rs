//! Locations under the adrive data directory.

pub use adrive_storage::paths::resolve_adrive_dir;

use std::path::{Path, PathBuf};

const DB_FILE: &str = "adrive.db";
const UPLOADS_DIR: &str = "uploads";
const LOGS_DIR: &str = "logs";

pub(crate) fn database_path_in(data_dir: &Path) -> PathBuf {
    data_dir.join(DB_FILE)
}

pub(crate) fn uploads_dir_in(data_dir: &Path) -> PathBuf {
    data_dir.join(UPLOADS_DIR)
}

pub(crate) fn logs_dir_in(data_dir: &Path) -> PathBuf {
    data_dir.join(LOGS_DIR)
}
