use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use super::entry::LogoCacheEntry;
use super::format::{PNG_SIGNATURE, PNG_TRAILER, has_png_signature, has_png_trailer};
use super::key::CacheKey;
use crate::errors::{AppError, AppResult};

/// Flat directory of `<encoded key>.png` files
#[derive(Debug, Clone)]
pub struct LogoCacheStorage {
    cache_dir: PathBuf,
}

impl LogoCacheStorage {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory; a no-op when it already exists
    pub async fn ensure_storage_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| AppError::storage(&self.cache_dir, e))
    }

    pub fn logo_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }

    /// Path of the cached logo for `key` if a usable file is present.
    ///
    /// Unreadable or malformed files count as absent.
    pub async fn find_logo(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.logo_path(key);
        match Self::is_usable_logo(&path).await {
            Ok(true) => {
                trace!("Cached logo found for '{}': {}", key, path.display());
                Some(path)
            }
            Ok(false) => {
                warn!(
                    "Ignoring malformed cached logo for '{}': {}",
                    key,
                    path.display()
                );
                None
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                debug!("Failed to inspect cached logo {}: {}", path.display(), e);
                None
            }
        }
    }

    /// A usable logo is a regular file that opens with the PNG signature and
    /// closes with the `IEND` chunk. Only those 20 bytes are read.
    async fn is_usable_logo(path: &Path) -> std::io::Result<bool> {
        let metadata = fs::metadata(path).await?;
        let min_len = (PNG_SIGNATURE.len() + PNG_TRAILER.len()) as u64;
        if !metadata.is_file() || metadata.len() < min_len {
            return Ok(false);
        }

        let mut file = fs::File::open(path).await?;
        let mut header = [0u8; PNG_SIGNATURE.len()];
        file.read_exact(&mut header).await?;
        if !has_png_signature(&header) {
            return Ok(false);
        }

        file.seek(SeekFrom::End(-(PNG_TRAILER.len() as i64))).await?;
        let mut trailer = [0u8; PNG_TRAILER.len()];
        file.read_exact(&mut trailer).await?;
        Ok(has_png_trailer(&trailer))
    }

    /// Write PNG bytes for `key`, replacing any previous file atomically.
    pub async fn save_logo(&self, key: &CacheKey, png_bytes: &[u8]) -> AppResult<PathBuf> {
        self.ensure_storage_dir().await?;

        let final_path = self.logo_path(key);
        // Dot prefix and .tmp suffix keep temp files out of listings
        let temp_path = self
            .cache_dir
            .join(format!(".{}.{}.tmp", key.file_stem(), Uuid::new_v4()));

        if let Err(e) = Self::write_synced(&temp_path, png_bytes).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::storage(&temp_path, e));
        }

        if let Err(e) = fs::rename(&temp_path, &final_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(AppError::storage(&final_path, e));
        }

        debug!(
            "Stored logo for '{}' ({} bytes) at {}",
            key,
            png_bytes.len(),
            final_path.display()
        );
        Ok(final_path)
    }

    async fn write_synced(path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    /// Delete the cached logo for `key`. Returns whether a file was removed.
    pub async fn delete_logo(&self, key: &CacheKey) -> AppResult<bool> {
        let path = self.logo_path(key);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Removed cached logo for '{}'", key);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::storage(path, e)),
        }
    }

    /// All usable cached logos, sorted by key
    pub async fn list_logos(&self) -> AppResult<Vec<LogoCacheEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| AppError::storage(&self.cache_dir, e))?;

        while let Some(dir_entry) = dir
            .next_entry()
            .await
            .map_err(|e| AppError::storage(&self.cache_dir, e))?
        {
            let file_name = dir_entry.file_name();
            let Some(key) = file_name.to_str().and_then(CacheKey::parse_file_name) else {
                continue;
            };

            let path = dir_entry.path();
            match Self::is_usable_logo(&path).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Skipping malformed cached logo {}", path.display());
                    continue;
                }
                Err(e) => {
                    debug!("Failed to inspect {}: {}", path.display(), e);
                    continue;
                }
            }

            match dir_entry.metadata().await {
                Ok(metadata) => entries.push(LogoCacheEntry::new(key, path, &metadata)),
                Err(e) => debug!("Failed to get metadata for {}: {}", path.display(), e),
            }
        }

        entries.sort_by(|a, b| a.company_key.cmp(&b.company_key));
        Ok(entries)
    }
}
