pub mod file_entry;
pub mod user;
pub mod views;

pub use file_entry::{FileEntry, StoredFile, bytes_to_megabytes, megabytes_to_gb, round_tenth};
pub use user::{AuthContext, UserEntry, UserUsage};
pub use views::{Dashboard, OwnedFile, QuotaSummary, UploadReceipt};
