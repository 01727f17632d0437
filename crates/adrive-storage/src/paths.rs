//! Path utilities for adrive directory resolution.
//!
//! This is the canonical source for the data directory. Re-exported by
//! adrive-core, which derives the database, upload and log paths from it.

use std::io;
use std::path::PathBuf;

const ADRIVE_DIR: &str = ".adrive";

/// Environment variable to override the adrive data directory.
pub const ADRIVE_DIR_ENV: &str = "ADRIVE_DIR";

/// Resolve the adrive data directory.
/// Priority: ADRIVE_DIR env var > ~/.adrive/
pub fn resolve_adrive_dir() -> io::Result<PathBuf> {
    if let Ok(dir) = std::env::var(ADRIVE_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(ADRIVE_DIR))
        .ok_or_else(|| io::Error::other("failed to determine home directory"))
}
