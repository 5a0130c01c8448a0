//! Storage for rendered report files, addressed by key

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::{collections::HashMap, path::PathBuf, sync::Arc};
use tokio::sync::RwLock;
use tracing::info;

#[async_trait]
pub trait ReportArchive: Send + Sync {
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<()>;

    /// `Ok(None)` when nothing is stored under `key`
    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Removing a missing key is not an error
    async fn remove(&self, key: &str) -> Result<()>;
}

/// Archive key for a report's PDF
pub fn report_key(report_id: uuid::Uuid) -> String {
    format!("report-{}.pdf", report_id)
}

fn check_key(key: &str) -> Result<()> {
    if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
        bail!("Invalid archive key: {}", key);
    }
    Ok(())
}

/// Keeps report files in a directory on disk
#[derive(Debug, Clone)]
pub struct FsReportArchive {
    dir: PathBuf,
}

impl FsReportArchive {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        check_key(key)?;
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl ReportArchive for FsReportArchive {
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        let path = self.path(key)?;
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(&path, bytes).await?;
        info!("Archived report file: {}", path.display());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(key)?).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path(key)?).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Keeps report files in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryReportArchive {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryReportArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of the files currently held
    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.files.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ReportArchive for MemoryReportArchive {
    async fn store(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        check_key(key)?;
        self.files.write().await.insert(key.to_string(), bytes);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.read().await.get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.files.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn filesystem_round_trip_and_removal() {
        let dir = std::env::temp_dir().join(format!("wastewise-archive-{}", uuid::Uuid::new_v4()));
        let archive = FsReportArchive::new(&dir);
        let key = report_key(uuid::Uuid::new_v4());

        archive.store(&key, b"%PDF-1.4".to_vec()).await.unwrap();
        assert_eq!(archive.load(&key).await.unwrap().unwrap(), b"%PDF-1.4");

        archive.remove(&key).await.unwrap();
        archive.remove(&key).await.unwrap();
        assert!(archive.load(&key).await.unwrap().is_none());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_keys_that_leave_the_directory() {
        let archive = FsReportArchive::new(std::env::temp_dir());
        assert!(archive.store("../escape.pdf", Vec::new()).await.is_err());
        assert!(archive.load("nested/file.pdf").await.is_err());
    }
}
