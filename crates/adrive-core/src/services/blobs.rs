//! The directory of uploaded blobs.

use std::io;
use std::path::PathBuf;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Flat directory of blobs addressed by file name.
#[derive(Debug, Clone)]
pub struct BlobStore {
    dir: PathBuf,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write a new blob, failing with `AlreadyExists` rather than replacing
    /// one. Returns the size measured on disk.
    pub async fn create_new(&self, name: &str, bytes: &[u8]) -> io::Result<u64> {
        let path = self.path(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(error) = written {
            let _ = fs::remove_file(&path).await;
            return Err(error);
        }
        Ok(fs::metadata(&path).await?.len())
    }

    pub async fn exists(&self, name: &str) -> io::Result<bool> {
        fs::try_exists(self.path(name)).await
    }

    pub async fn rename(&self, from: &str, to: &str) -> io::Result<()> {
        fs::rename(self.path(from), self.path(to)).await
    }

    /// Remove a blob. Returns `false` when it was already gone.
    pub async fn remove(&self, name: &str) -> io::Result<bool> {
        match fs::remove_file(self.path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Open a blob for reading together with its length.
    pub async fn open(&self, name: &str) -> io::Result<(File, u64)> {
        let file = File::open(self.path(name)).await?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Names of the regular files in the directory.
    pub async fn names(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_create_rename_remove() {
        let temp_dir = tempdir().unwrap();
        let blobs = BlobStore::new(temp_dir.path().join("uploads"));
        blobs.ensure().await.unwrap();

        assert_eq!(blobs.create_new("a.txt_111111", b"hello").await.unwrap(), 5);
        let err = blobs.create_new("a.txt_111111", b"again").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);

        blobs.rename("a.txt_111111", "a.txt").await.unwrap();
        assert!(!blobs.exists("a.txt_111111").await.unwrap());
        assert!(blobs.exists("a.txt").await.unwrap());
        assert_eq!(blobs.names().await.unwrap(), vec!["a.txt"]);

        assert!(blobs.remove("a.txt").await.unwrap());
        assert!(!blobs.remove("a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_names_skips_directories() {
        let temp_dir = tempdir().unwrap();
        let blobs = BlobStore::new(temp_dir.path());
        blobs.create_new("b_222222", b"x").await.unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();

        assert_eq!(blobs.names().await.unwrap(), vec!["b_222222"]);
    }

    #[tokio::test]
    async fn test_missing_dir_lists_nothing() {
        let temp_dir = tempdir().unwrap();
        let blobs = BlobStore::new(temp_dir.path().join("absent"));
        assert!(blobs.names().await.unwrap().is_empty());
    }
}
