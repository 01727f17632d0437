//! Upload, code resolution and the serve / restore-or-purge sequence.
//!
//! A stored file lives in two places that must agree: a registry record keyed
//! by its stored name and a blob with the same name in the upload directory.
//! Serving renames the blob to its serving name (the stored name without the
//! `_<code>` suffix) and schedules a follow-up: reusable files are renamed
//! back after the restore delay, one-time files lose their registry record.
//!
//! Every step that touches a blob runs under a lock keyed by the serving
//! name. Serving holds that lock until the follow-up has run, so a second
//! request for the same code waits for the file to be restored instead of
//! racing the rename. A reusable record carries a `serving` marker for the
//! length of its window; startup recovery only renames blobs back for
//! records that carry it.

use chrono::Utc;
use rand::RngExt;
use std::collections::HashSet;
use std::io;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tracing::{debug, info, warn};

use super::blobs::BlobStore;
use super::follow_up::FollowUpScheduler;
use super::locks::{KeyGuard, KeyedLocks};
use super::quota::QuotaEnforcer;
use crate::config::DriveConfig;
use crate::error::{DriveError, Result};
use crate::models::{
    AuthContext, FileEntry, StoredFile, UploadReceipt, bytes_to_megabytes, megabytes_to_gb,
};
use crate::naming::{
    code_of, display_name, is_valid_code, sanitize_filename, serving_name, stored_name,
};
use crate::storage::Storage;

/// A code resolved to a live stored file. Holds the serve lock for it.
#[derive(Debug)]
pub struct ResolvedFile {
    pub stored_name: String,
    pub entry: FileEntry,
    guard: KeyGuard,
}

/// An open blob in its serving window.
#[derive(Debug)]
pub struct ServedFile {
    /// Suggested client-facing filename.
    pub original_name: String,
    pub stored_name: String,
    pub file: File,
    pub size_bytes: u64,
    pub reusable: bool,
}

#[derive(Debug, Clone, Copy)]
enum FollowUp {
    Restore,
    Purge,
}

pub struct ExchangeProtocol {
    storage: Arc<Storage>,
    quota: QuotaEnforcer,
    blobs: BlobStore,
    serve_locks: KeyedLocks,
    upload_locks: KeyedLocks,
    code_locks: KeyedLocks,
    follow_ups: FollowUpScheduler,
    restore_delay: Duration,
    code_range: RangeInclusive<u64>,
    max_code_attempts: usize,
}

impl ExchangeProtocol {
    pub fn new(storage: Arc<Storage>, quota: QuotaEnforcer, config: &DriveConfig) -> Self {
        Self {
            storage,
            quota,
            blobs: BlobStore::new(&config.upload_dir),
            serve_locks: KeyedLocks::new(),
            upload_locks: KeyedLocks::new(),
            code_locks: KeyedLocks::new(),
            follow_ups: FollowUpScheduler::new(),
            restore_delay: config.restore_delay,
            code_range: config.code_range.clone(),
            max_code_attempts: config.max_code_attempts,
        }
    }

    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    pub fn follow_ups(&self) -> &FollowUpScheduler {
        &self.follow_ups
    }

    /// Store an upload and register it under a fresh code.
    ///
    /// The blob is written first and measured on disk; the registry record is
    /// written last. Ownership goes to an authenticated uploader only when the
    /// file fits their remaining quota, otherwise the file is kept unowned.
    pub async fn upload(
        &self,
        original_name: &str,
        bytes: &[u8],
        reusable: bool,
        auth: &AuthContext,
    ) -> Result<UploadReceipt> {
        let sanitized = sanitize_filename(original_name);
        let (code, stored_name, size_bytes, _reservation) =
            self.write_blob(&sanitized, bytes).await?;

        let size_megabytes = bytes_to_megabytes(size_bytes);
        let size_gb = megabytes_to_gb(size_megabytes);

        let _upload_guard = match auth.username() {
            Some(username) => Some(self.upload_locks.lock(username).await),
            None => None,
        };

        let (owner, quota_exceeded) = match auth.username() {
            Some(username) => match self.quota.can_accept_upload(username, size_gb) {
                Ok(true) => (Some(username.to_string()), false),
                Ok(false) => {
                    info!(username, size_gb, "Upload exceeds remaining quota, storing unowned");
                    (None, true)
                }
                Err(DriveError::UnknownUser(_)) => {
                    warn!(username, "Upload by unregistered user, storing unowned");
                    (None, false)
                }
                Err(error) => {
                    self.discard_blob(&stored_name).await;
                    return Err(error);
                }
            },
            None => (None, false),
        };

        let shown_name = match display_name(original_name) {
            "" => sanitized.as_str(),
            name => name,
        };
        let entry = FileEntry {
            original_name: shown_name.to_string(),
            size_megabytes,
            reusable,
            owner: owner.clone(),
            uploaded_at: Utc::now().timestamp_millis(),
            serving: false,
        };

        if let Err(error) = self.storage.files.insert(&stored_name, &entry) {
            self.discard_blob(&stored_name).await;
            return Err(error.into());
        }

        info!(
            stored_name = %stored_name,
            size_megabytes,
            reusable,
            owner = owner.as_deref().unwrap_or("-"),
            "File uploaded"
        );

        Ok(UploadReceipt {
            code,
            stored_name,
            size_megabytes,
            reusable,
            owner,
            quota_exceeded,
        })
    }

    /// Map a code to a live stored file and take its serve lock.
    ///
    /// Blobs on disk are the primary source: a coded blob with a registry
    /// record is a match, a coded blob without one is an orphan and is never
    /// served. Registry records whose blob is missing are then checked under
    /// the lock; if the blob is still missing the record is stale and removed.
    pub async fn resolve_code(&self, code: &str) -> Result<ResolvedFile> {
        if !is_valid_code(code) {
            return Err(DriveError::InvalidCode);
        }

        let mut candidates: Vec<String> = self
            .blobs
            .names()
            .await?
            .into_iter()
            .filter(|name| code_of(name) == Some(code))
            .collect();
        for name in self.storage.files.find_by_code(code)? {
            if !candidates.contains(&name) {
                candidates.push(name);
            }
        }

        for stored_name in candidates {
            let guard = self.serve_locks.lock(serving_name(&stored_name)).await;

            let entry = self.storage.files.get(&stored_name)?;
            let on_disk = self.blobs.exists(&stored_name).await?;
            match (entry, on_disk) {
                (Some(entry), true) => {
                    return Ok(ResolvedFile {
                        stored_name,
                        entry,
                        guard,
                    });
                }
                (Some(_), false) => {
                    self.storage.files.remove(&stored_name)?;
                    warn!(stored_name = %stored_name, "Removed registry record with no blob");
                }
                (None, true) => {
                    debug!(stored_name = %stored_name, "Ignoring blob with no registry record");
                }
                (None, false) => {}
            }
        }

        Err(DriveError::InvalidCode)
    }

    /// Open the file behind `code` for download and schedule its follow-up.
    pub async fn serve(&self, code: &str) -> Result<ServedFile> {
        let ResolvedFile {
            stored_name,
            entry,
            guard,
        } = self.resolve_code(code).await?;
        let serving = serving_name(&stored_name).to_string();

        if entry.reusable {
            self.storage.files.set_serving(&stored_name, true)?;
        }
        if let Err(error) = self.blobs.rename(&stored_name, &serving).await {
            warn!(stored_name = %stored_name, %error, "Failed to enter serving window");
            if entry.reusable {
                self.storage.files.set_serving(&stored_name, false)?;
            }
            return Err(DriveError::InvalidCode);
        }

        let (file, size_bytes) = match self.blobs.open(&serving).await {
            Ok(opened) => opened,
            Err(error) => {
                warn!(stored_name = %stored_name, %error, "Failed to open served blob, restoring");
                self.schedule(&stored_name, FollowUp::Restore, Duration::ZERO, guard);
                return Err(error.into());
            }
        };

        if entry.reusable {
            self.schedule(&stored_name, FollowUp::Restore, self.restore_delay, guard);
        } else {
            self.schedule(&stored_name, FollowUp::Purge, Duration::ZERO, guard);
        }

        info!(stored_name = %stored_name, reusable = entry.reusable, "Serving file");
        Ok(ServedFile {
            original_name: entry.original_name,
            stored_name,
            file,
            size_bytes,
            reusable: entry.reusable,
        })
    }

    /// Owner-initiated delete.
    ///
    /// Resolution goes through the registry so a file in its serving window
    /// can still be deleted. Fails with `Forbidden` unless the requester is
    /// authenticated and owns the file.
    pub async fn delete(&self, code: &str, auth: &AuthContext) -> Result<StoredFile> {
        if !is_valid_code(code) {
            return Err(DriveError::InvalidCode);
        }

        let mut forbidden = false;
        for stored_name in self.storage.files.find_by_code(code)? {
            let Some(entry) = self.storage.files.get(&stored_name)? else {
                continue;
            };
            let is_owner = auth
                .username()
                .is_some_and(|username| entry.is_owned_by(username));
            if !is_owner {
                forbidden = true;
                continue;
            }

            self.purge_file(&stored_name).await?;
            info!(stored_name = %stored_name, "File deleted by owner");
            return Ok(StoredFile { stored_name, entry });
        }

        if forbidden {
            Err(DriveError::Forbidden)
        } else {
            Err(DriveError::InvalidCode)
        }
    }

    /// Remove a stored file completely: pending follow-up, blob under both
    /// names and registry record. Missing blobs are tolerated.
    pub async fn purge_file(&self, stored_name: &str) -> Result<Option<FileEntry>> {
        if self.follow_ups.cancel(stored_name) {
            debug!(stored_name, "Cancelled pending follow-up");
        }

        let serving = serving_name(stored_name);
        let _guard = self.serve_locks.lock(serving).await;

        self.blobs.remove(stored_name).await?;
        if let Err(error) = self.blobs.remove(serving).await {
            warn!(stored_name, %error, "Failed to remove blob under serving name");
        }

        Ok(self.storage.files.remove(stored_name)?)
    }

    /// Purge every file owned by `username`. Returns how many were removed.
    pub async fn purge_owned_by(&self, username: &str) -> Result<usize> {
        let owned = self.storage.files.owned_by(username)?;
        for file in &owned {
            self.purge_file(&file.stored_name).await?;
        }
        Ok(owned.len())
    }

    /// Rename blobs of records still marked as serving by an earlier process
    /// back to their stored names, then clear the marker.
    ///
    /// Unmarked records are left alone even when a blob with their serving
    /// name exists: that blob belongs to another file, such as the leftover
    /// of a one-time download. A marked record with no blob under either
    /// name is left for code resolution to drop as stale.
    pub async fn recover(&self) -> Result<usize> {
        let mut restored = 0;
        for file in self.storage.files.list()? {
            if !file.entry.serving {
                continue;
            }
            let serving = serving_name(&file.stored_name);
            let _guard = self.serve_locks.lock(serving).await;
            if !self.blobs.exists(&file.stored_name).await? && self.blobs.exists(serving).await? {
                self.blobs.rename(serving, &file.stored_name).await?;
                info!(stored_name = %file.stored_name, "Restored file left in serving window");
                restored += 1;
            }
            self.storage.files.set_serving(&file.stored_name, false)?;
        }
        Ok(restored)
    }

    /// Wait until every scheduled restore or purge has run.
    pub async fn wait_for_follow_ups(&self) {
        self.follow_ups.wait_idle().await;
    }

    /// Draw a free code and write the blob under it. The returned guard
    /// reserves the code; hold it until the registry record is written.
    async fn write_blob(
        &self,
        sanitized: &str,
        bytes: &[u8],
    ) -> Result<(String, String, u64, KeyGuard)> {
        let mut used = self.used_codes().await?;

        for _ in 0..self.max_code_attempts {
            let code = rand::rng().random_range(self.code_range.clone()).to_string();
            if !used.insert(code.clone()) {
                debug!(code = %code, "Code already in use, drawing again");
                continue;
            }
            let Some(reservation) = self.code_locks.try_lock(&code) else {
                debug!(code = %code, "Code reserved by a concurrent upload, drawing again");
                continue;
            };
            if self.code_in_use(&code).await? {
                debug!(code = %code, "Code taken since the scan, drawing again");
                continue;
            }

            let stored_name = stored_name(sanitized, &code);
            match self.blobs.create_new(&stored_name, bytes).await {
                Ok(size_bytes) => return Ok((code, stored_name, size_bytes, reservation)),
                Err(error) if error.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(stored_name = %stored_name, "Blob name taken, drawing again");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(DriveError::CodeSpaceExhausted(self.max_code_attempts))
    }

    /// Codes carried by registry records or coded blobs.
    async fn used_codes(&self) -> Result<HashSet<String>> {
        let mut used: HashSet<String> = self
            .storage
            .files
            .names()?
            .iter()
            .filter_map(|name| code_of(name))
            .map(str::to_string)
            .collect();

        for name in self.blobs.names().await? {
            if let Some(code) = code_of(&name).filter(|code| is_valid_code(code)) {
                used.insert(code.to_string());
            }
        }
        Ok(used)
    }

    async fn code_in_use(&self, code: &str) -> Result<bool> {
        if !self.storage.files.find_by_code(code)?.is_empty() {
            return Ok(true);
        }
        Ok(self
            .blobs
            .names()
            .await?
            .iter()
            .any(|name| code_of(name) == Some(code)))
    }

    async fn discard_blob(&self, stored_name: &str) {
        if let Err(error) = self.blobs.remove(stored_name).await {
            warn!(stored_name, %error, "Failed to discard blob");
        }
    }

    fn schedule(&self, stored_name: &str, follow_up: FollowUp, delay: Duration, guard: KeyGuard) {
        let storage = self.storage.clone();
        let blobs = self.blobs.clone();
        let name = stored_name.to_string();

        self.follow_ups.schedule(stored_name, delay, async move {
            let _guard = guard;
            match follow_up {
                FollowUp::Restore => {
                    match blobs.rename(serving_name(&name), &name).await {
                        Ok(()) => debug!(stored_name = %name, "Restored after serving"),
                        Err(error) => warn!(stored_name = %name, %error, "Failed to restore"),
                    }
                    if let Err(error) = storage.files.set_serving(&name, false) {
                        warn!(stored_name = %name, %error, "Failed to clear serving marker");
                    }
                }
                FollowUp::Purge => match storage.files.remove(&name) {
                    Ok(_) => debug!(stored_name = %name, "Purged one-time file"),
                    Err(error) => warn!(stored_name = %name, %error, "Failed to purge"),
                },
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserEntry;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;

    struct Fixture {
        exchange: ExchangeProtocol,
        storage: Arc<Storage>,
        _temp_dir: tempfile::TempDir,
    }

    async fn setup() -> Fixture {
        let temp_dir = tempdir().unwrap();
        let config = DriveConfig::from_data_dir(temp_dir.path())
            .with_restore_delay(Duration::from_millis(50));
        let storage = Arc::new(Storage::new(&config.database_path).unwrap());
        let exchange =
            ExchangeProtocol::new(storage.clone(), QuotaEnforcer::new(storage.clone()), &config);
        exchange.blobs().ensure().await.unwrap();
        Fixture {
            exchange,
            storage,
            _temp_dir: temp_dir,
        }
    }

    async fn read_all(mut served: ServedFile) -> Vec<u8> {
        let mut content = Vec::new();
        served.file.read_to_end(&mut content).await.unwrap();
        content
    }

    #[tokio::test]
    async fn test_upload_registers_entry() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("My Report.pdf", b"hello", false, &AuthContext::Anonymous)
            .await
            .unwrap();

        assert!(receipt.stored_name.starts_with("My_Report.pdf_"));
        assert_eq!(code_of(&receipt.stored_name), Some(receipt.code.as_str()));
        assert!(receipt.code.len() >= 6);
        assert!(!receipt.quota_exceeded);

        let entry = fx.storage.files.get(&receipt.stored_name).unwrap().unwrap();
        assert_eq!(entry.original_name, "My Report.pdf");
        assert_eq!(entry.owner, None);
        assert!(fx.exchange.blobs().exists(&receipt.stored_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_name_uses_fallback() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("", b"x", false, &AuthContext::Anonymous)
            .await
            .unwrap();
        assert_eq!(serving_name(&receipt.stored_name), "file");
        let entry = fx.storage.files.get(&receipt.stored_name).unwrap().unwrap();
        assert_eq!(entry.original_name, "file");
    }

    #[tokio::test]
    async fn test_code_space_exhausted() {
        let temp_dir = tempdir().unwrap();
        let config = DriveConfig::from_data_dir(temp_dir.path()).with_code_range(100_000..=100_000);
        let storage = Arc::new(Storage::new(&config.database_path).unwrap());
        let exchange =
            ExchangeProtocol::new(storage.clone(), QuotaEnforcer::new(storage.clone()), &config);
        exchange.blobs().ensure().await.unwrap();

        let first = exchange
            .upload("a.txt", b"1", false, &AuthContext::Anonymous)
            .await
            .unwrap();
        assert_eq!(first.code, "100000");

        let err = exchange
            .upload("b.txt", b"2", false, &AuthContext::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::CodeSpaceExhausted(_)));
        assert_eq!(exchange.blobs().names().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_orphan_blob_is_not_served() {
        let fx = setup().await;
        fx.exchange
            .blobs()
            .create_new("stray.bin_555555", b"x")
            .await
            .unwrap();

        let err = fx.exchange.serve("555555").await.unwrap_err();
        assert!(matches!(err, DriveError::InvalidCode));
        assert!(fx.exchange.blobs().exists("stray.bin_555555").await.unwrap());
    }

    #[tokio::test]
    async fn test_non_numeric_code_rejected() {
        let fx = setup().await;
        assert!(matches!(
            fx.exchange.serve("../etc").await,
            Err(DriveError::InvalidCode)
        ));
        assert!(matches!(
            fx.exchange.delete("abc", &AuthContext::user("alice")).await,
            Err(DriveError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_one_time_leaves_decoded_blob() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("once.txt", b"secret", false, &AuthContext::Anonymous)
            .await
            .unwrap();

        let served = fx.exchange.serve(&receipt.code).await.unwrap();
        assert_eq!(served.original_name, "once.txt");
        assert_eq!(read_all(served).await, b"secret");
        fx.exchange.wait_for_follow_ups().await;

        assert!(fx.storage.files.get(&receipt.stored_name).unwrap().is_none());
        assert!(fx.exchange.blobs().exists("once.txt").await.unwrap());
        assert!(matches!(
            fx.exchange.serve(&receipt.code).await,
            Err(DriveError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_serve_waits_for_restore() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("shared.txt", b"data", true, &AuthContext::Anonymous)
            .await
            .unwrap();

        let first = fx.exchange.serve(&receipt.code).await.unwrap();
        let second = fx.exchange.serve(&receipt.code).await.unwrap();

        assert_eq!(read_all(first).await, b"data");
        assert_eq!(read_all(second).await, b"data");
        fx.exchange.wait_for_follow_ups().await;
        assert!(fx.exchange.blobs().exists(&receipt.stored_name).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_during_serving_window_is_final() {
        let fx = setup().await;
        fx.storage
            .users
            .register(&UserEntry::new("alice", "h", 3.0))
            .unwrap();
        let alice = AuthContext::user("alice");
        let receipt = fx
            .exchange
            .upload("keep.txt", b"data", true, &alice)
            .await
            .unwrap();

        let served = fx.exchange.serve(&receipt.code).await.unwrap();
        drop(served);
        assert!(fx.exchange.follow_ups().is_pending(&receipt.stored_name));

        fx.exchange.delete(&receipt.code, &alice).await.unwrap();
        fx.exchange.wait_for_follow_ups().await;

        assert!(!fx.exchange.blobs().exists(&receipt.stored_name).await.unwrap());
        assert!(!fx.exchange.blobs().exists("keep.txt").await.unwrap());
        assert!(fx.storage.files.is_empty().unwrap());
    }

    #[tokio::test]
    async fn test_anonymous_cannot_delete_unowned() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("a.txt", b"x", false, &AuthContext::Anonymous)
            .await
            .unwrap();

        let err = fx
            .exchange
            .delete(&receipt.code, &AuthContext::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::Forbidden));
    }

    #[tokio::test]
    async fn test_recover_restores_serving_window() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("r.txt", b"x", true, &AuthContext::Anonymous)
            .await
            .unwrap();
        fx.storage
            .files
            .set_serving(&receipt.stored_name, true)
            .unwrap();
        fx.exchange
            .blobs()
            .rename(&receipt.stored_name, "r.txt")
            .await
            .unwrap();

        assert_eq!(fx.exchange.recover().await.unwrap(), 1);
        assert!(fx.exchange.blobs().exists(&receipt.stored_name).await.unwrap());
        assert!(!fx.storage.files.get(&receipt.stored_name).unwrap().unwrap().serving);
        assert_eq!(fx.exchange.recover().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_serving_marker_spans_restore_window() {
        let fx = setup().await;
        let receipt = fx
            .exchange
            .upload("w.txt", b"x", true, &AuthContext::Anonymous)
            .await
            .unwrap();

        let served = fx.exchange.serve(&receipt.code).await.unwrap();
        drop(served);
        assert!(fx.storage.files.get(&receipt.stored_name).unwrap().unwrap().serving);

        fx.exchange.wait_for_follow_ups().await;
        assert!(!fx.storage.files.get(&receipt.stored_name).unwrap().unwrap().serving);
    }

    #[tokio::test]
    async fn test_recover_ignores_other_files_leftover() {
        let fx = setup().await;
        let once = fx
            .exchange
            .upload("a.txt", b"one-time secret", false, &AuthContext::Anonymous)
            .await
            .unwrap();
        let reusable = fx
            .exchange
            .upload("a.txt", b"reusable public", true, &AuthContext::Anonymous)
            .await
            .unwrap();

        let served = fx.exchange.serve(&once.code).await.unwrap();
        assert_eq!(read_all(served).await, b"one-time secret");
        fx.exchange.wait_for_follow_ups().await;
        fx.exchange
            .blobs()
            .remove(&reusable.stored_name)
            .await
            .unwrap();

        assert_eq!(fx.exchange.recover().await.unwrap(), 0);
        assert!(!fx.exchange.blobs().exists(&reusable.stored_name).await.unwrap());
        assert!(matches!(
            fx.exchange.serve(&reusable.code).await,
            Err(DriveError::InvalidCode)
        ));
        assert!(fx.storage.files.get(&reusable.stored_name).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reserved_code_is_not_reused() {
        let temp_dir = tempdir().unwrap();
        let config = DriveConfig::from_data_dir(temp_dir.path()).with_code_range(100_000..=100_000);
        let storage = Arc::new(Storage::new(&config.database_path).unwrap());
        let exchange =
            ExchangeProtocol::new(storage.clone(), QuotaEnforcer::new(storage.clone()), &config);
        exchange.blobs().ensure().await.unwrap();

        let reservation = exchange.code_locks.try_lock("100000").unwrap();
        let err = exchange
            .upload("a.txt", b"1", false, &AuthContext::Anonymous)
            .await
            .unwrap_err();
        assert!(matches!(err, DriveError::CodeSpaceExhausted(_)));
        assert!(exchange.blobs().names().await.unwrap().is_empty());

        drop(reservation);
        let receipt = exchange
            .upload("a.txt", b"1", false, &AuthContext::Anonymous)
            .await
            .unwrap();
        assert_eq!(receipt.code, "100000");
        assert!(exchange.code_locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_uploads_get_distinct_codes() {
        let temp_dir = tempdir().unwrap();
        let mut config =
            DriveConfig::from_data_dir(temp_dir.path()).with_code_range(100_000..=100_019);
        config.max_code_attempts = 500;
        let storage = Arc::new(Storage::new(&config.database_path).unwrap());
        let exchange = Arc::new(ExchangeProtocol::new(
            storage.clone(),
            QuotaEnforcer::new(storage.clone()),
            &config,
        ));
        exchange.blobs().ensure().await.unwrap();

        let uploads: Vec<_> = (0..10)
            .map(|i| {
                let exchange = exchange.clone();
                tokio::spawn(async move {
                    exchange
                        .upload(&format!("f{i}.txt"), b"x", false, &AuthContext::Anonymous)
                        .await
                        .unwrap()
                        .code
                })
            })
            .collect();

        let mut codes = HashSet::new();
        for upload in uploads {
            assert!(codes.insert(upload.await.unwrap()));
        }
        assert_eq!(storage.files.len().unwrap(), 10);
    }
}
