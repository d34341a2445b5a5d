//! Filesystem usage checker.

use crate::checker::{CheckError, Checker};
use crate::context::CheckContext;
use async_trait::async_trait;
use nix::sys::statvfs::statvfs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Reasons a disk-space check fails
#[derive(Debug, Error)]
pub enum DiskSpaceError {
    #[error("filesystem not found: {0}")]
    NotFound(#[source] io::Error),

    #[error("error looking for {} filesystem stats: {source}", .dir.display())]
    Stats {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("filesystem at {} reports zero blocks", .0.display())]
    EmptyFilesystem(PathBuf),

    #[error("used: {used}% threshold: {threshold}% location: {}", .dir.display())]
    ThresholdExceeded {
        used: u64,
        threshold: u64,
        dir: PathBuf,
    },
}

impl From<DiskSpaceError> for CheckError {
    fn from(e: DiskSpaceError) -> Self {
        CheckError::Failed(e.to_string())
    }
}

/// Block counts reported for a filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsUsage {
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub block_size: u64,
}

impl FsUsage {
    /// Percentage of the filesystem in use, rounded down.
    ///
    /// Returns `None` for a filesystem without any blocks.
    pub fn used_percentage(&self) -> Option<u64> {
        let total = u128::from(self.total_blocks) * u128::from(self.block_size);
        if total == 0 {
            return None;
        }
        let free = u128::from(self.free_blocks) * u128::from(self.block_size);
        let used = total.saturating_sub(free);
        u64::try_from(100 * used / total).ok()
    }
}

/// Source of filesystem statistics
#[cfg_attr(test, mockall::automock)]
pub trait FilesystemStats: Send + Sync {
    fn stats(&self, path: &Path) -> io::Result<FsUsage>;
}

/// Reads statistics with the `statvfs` syscall
#[derive(Debug, Clone, Copy, Default)]
pub struct Statvfs;

impl FilesystemStats for Statvfs {
    fn stats(&self, path: &Path) -> io::Result<FsUsage> {
        let stat = statvfs(path).map_err(io::Error::from)?;
        Ok(FsUsage {
            total_blocks: u64::from(stat.blocks()),
            free_blocks: u64::from(stat.blocks_free()),
            block_size: u64::from(stat.fragment_size()),
        })
    }
}

/// Fails when the filesystem holding `dir` is fuller than `threshold` percent
pub struct DiskSpace {
    dir: PathBuf,
    threshold: u64,
    stats: Arc<dyn FilesystemStats>,
}

impl DiskSpace {
    /// Create a checker backed by `statvfs`
    pub fn new(dir: impl Into<PathBuf>, threshold: u64) -> Self {
        Self::with_stats(dir, threshold, Statvfs)
    }

    /// Create a checker reading statistics from `stats`
    pub fn with_stats(
        dir: impl Into<PathBuf>,
        threshold: u64,
        stats: impl FilesystemStats + 'static,
    ) -> Self {
        Self {
            dir: dir.into(),
            threshold,
            stats: Arc::new(stats),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    async fn evaluate(&self) -> Result<(), DiskSpaceError> {
        tokio::fs::metadata(&self.dir)
            .await
            .map_err(DiskSpaceError::NotFound)?;

        let stats = Arc::clone(&self.stats);
        let dir = self.dir.clone();
        let usage = tokio::task::spawn_blocking(move || stats.stats(&dir))
            .await
            .map_err(|e| DiskSpaceError::Stats {
                dir: self.dir.clone(),
                source: io::Error::other(e),
            })?
            .map_err(|source| DiskSpaceError::Stats {
                dir: self.dir.clone(),
                source,
            })?;

        let used = usage
            .used_percentage()
            .ok_or_else(|| DiskSpaceError::EmptyFilesystem(self.dir.clone()))?;

        if used > self.threshold {
            warn!(
                dir = %self.dir.display(),
                used,
                threshold = self.threshold,
                "Disk usage above threshold"
            );
            return Err(DiskSpaceError::ThresholdExceeded {
                used,
                threshold: self.threshold,
                dir: self.dir.clone(),
            });
        }

        debug!(dir = %self.dir.display(), used, threshold = self.threshold, "Disk usage ok");
        Ok(())
    }
}

#[async_trait]
impl Checker for DiskSpace {
    async fn check(&self, _ctx: &CheckContext) -> Result<(), CheckError> {
        self.evaluate().await.map_err(CheckError::from)
    }
}
