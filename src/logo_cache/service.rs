//! Company logo lookup backed by the on-disk cache

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::entry::LogoCacheEntry;
use super::fetcher::LogoFetcher;
use super::format::normalize_to_png;
use super::key::CacheKey;
use super::storage::LogoCacheStorage;
use crate::config::defaults::DEFAULT_LOGO_CACHE_PATH;
use crate::errors::AppResult;

/// Resolves company names to cached logo files, fetching on a miss
pub struct LogoCache {
    storage: LogoCacheStorage,
    fetcher: Arc<dyn LogoFetcher>,
}

impl LogoCache {
    /// Open the cache, creating its directory if needed.
    ///
    /// Without a directory the cache lives in `logos/` relative to the
    /// working directory. Fails with a storage error when the directory
    /// cannot be created.
    pub async fn initialize(
        cache_dir: Option<PathBuf>,
        fetcher: Arc<dyn LogoFetcher>,
    ) -> AppResult<Self> {
        let cache_dir = cache_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_LOGO_CACHE_PATH));
        let storage = LogoCacheStorage::new(cache_dir);
        storage.ensure_storage_dir().await?;

        info!(
            "Logo cache initialized at {}",
            storage.cache_dir().display()
        );
        Ok(Self { storage, fetcher })
    }

    pub fn cache_dir(&self) -> &Path {
        self.storage.cache_dir()
    }

    /// Cached logo for a company, without fetching
    pub async fn get_cached_logo(&self, company_name: &str) -> Option<PathBuf> {
        let key = CacheKey::new(company_name)?;
        self.storage.find_logo(&key).await
    }

    /// Cached logo for a company, fetching and storing it on a miss.
    ///
    /// `Ok(None)` means no logo is available; fetch failures end up there
    /// too. Only failures to write the cache are returned as errors.
    pub async fn download_logo(&self, company_name: &str) -> AppResult<Option<PathBuf>> {
        let Some(key) = CacheKey::new(company_name) else {
            debug!("Logo requested for a blank company name");
            return Ok(None);
        };

        if let Some(path) = self.storage.find_logo(&key).await {
            return Ok(Some(path));
        }

        debug!("Logo cache miss for '{}'", key);
        self.fetch_and_store(company_name, &key).await
    }

    /// Fetch a fresh logo and replace the cached one.
    ///
    /// When nothing can be fetched the existing file is kept.
    pub async fn refresh_logo(&self, company_name: &str) -> AppResult<Option<PathBuf>> {
        let Some(key) = CacheKey::new(company_name) else {
            return Ok(None);
        };
        self.fetch_and_store(company_name, &key).await
    }

    async fn fetch_and_store(
        &self,
        company_name: &str,
        key: &CacheKey,
    ) -> AppResult<Option<PathBuf>> {
        let raw_bytes = match self.fetcher.fetch(company_name.trim()).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("No logo available for '{}'", company_name.trim());
                return Ok(None);
            }
            Err(e) => {
                debug!("Logo fetch failed for '{}': {}", company_name.trim(), e);
                return Ok(None);
            }
        };

        let png_bytes = match normalize_to_png(&raw_bytes) {
            Ok(png_bytes) => png_bytes,
            Err(e) => {
                debug!(
                    "Discarding logo for '{}' ({} bytes): {}",
                    company_name.trim(),
                    raw_bytes.len(),
                    e
                );
                return Ok(None);
            }
        };

        let path = self.storage.save_logo(key, &png_bytes).await?;
        info!(
            "Cached logo for '{}' (fetched {} bytes, stored {} PNG bytes)",
            key,
            raw_bytes.len(),
            png_bytes.len()
        );
        Ok(Some(path))
    }

    /// Drop the cached logo for a company. Returns whether one existed.
    pub async fn remove_cached_logo(&self, company_name: &str) -> AppResult<bool> {
        match CacheKey::new(company_name) {
            Some(key) => self.storage.delete_logo(&key).await,
            None => Ok(false),
        }
    }

    pub async fn list_cached_logos(&self) -> AppResult<Vec<LogoCacheEntry>> {
        self.storage.list_logos().await
    }

    /// Which of `company_names` already have a cached logo
    pub async fn coverage_report<S: AsRef<str>>(
        &self,
        company_names: &[S],
    ) -> BTreeMap<String, bool> {
        let mut report = BTreeMap::new();
        for name in company_names {
            let name = name.as_ref();
            let cached = self.get_cached_logo(name).await.is_some();
            report.insert(name.to_string(), cached);
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FetchError;
    use crate::logo_cache::fetcher::MockLogoFetcher;
    use crate::logo_cache::format::{has_png_signature, sample_image, sample_image_sized};
    use image::ImageFormat;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    async fn cache_with(temp_dir: &TempDir, fetcher: MockLogoFetcher) -> LogoCache {
        LogoCache::initialize(Some(temp_dir.path().join("logos")), Arc::new(fetcher))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_second_download_is_served_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|name| name == "Acme Corp")
            .times(1)
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        let cache = cache_with(&temp_dir, fetcher).await;

        let first = cache.download_logo("Acme Corp").await.unwrap().unwrap();
        let second = cache.download_logo("  ACME CORP ").await.unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_fetch_receives_trimmed_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .withf(|name| name == "Acme Corp")
            .times(1)
            .returning(|_| Ok(None));
        let cache = cache_with(&temp_dir, fetcher).await;

        assert_eq!(cache.download_logo("\tAcme Corp  ").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_blank_name_never_fetches() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher.expect_fetch().never();
        let cache = cache_with(&temp_dir, fetcher).await;

        assert_eq!(cache.download_logo("   ").await.unwrap(), None);
        assert_eq!(cache.get_cached_logo("").await, None);
        assert!(!cache.remove_cached_logo(" ").await.unwrap());
    }

    #[tokio::test]
    #[traced_test]
    async fn test_fetch_error_becomes_absence() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_| {
            Err(FetchError::Status {
                status: 503,
                url: "https://logos.example.com/acme".to_string(),
            })
        });
        let cache = cache_with(&temp_dir, fetcher).await;

        assert_eq!(cache.download_logo("Acme Corp").await.unwrap(), None);
        assert!(logs_contain("Logo fetch failed for 'Acme Corp'"));
        assert!(cache.list_cached_logos().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_image_bytes_are_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(Some(b"<html>logo not found</html>".to_vec())));
        let cache = cache_with(&temp_dir, fetcher).await;

        assert_eq!(cache.download_logo("Acme Corp").await.unwrap(), None);
        assert_eq!(std::fs::read_dir(cache.cache_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_jpeg_is_stored_as_png() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(Some(sample_image(ImageFormat::Jpeg))));
        let cache = cache_with(&temp_dir, fetcher).await;

        let path = cache.download_logo("Acme Corp").await.unwrap().unwrap();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));
        assert!(has_png_signature(&std::fs::read(&path).unwrap()));
    }

    #[tokio::test]
    async fn test_malformed_cache_file_is_refetched() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        let cache = cache_with(&temp_dir, fetcher).await;

        let key = CacheKey::new("Acme Corp").unwrap();
        let path = cache.cache_dir().join(key.file_name());
        std::fs::write(&path, b"truncated").unwrap();
        assert_eq!(cache.get_cached_logo("Acme Corp").await, None);

        let fetched = cache.download_logo("Acme Corp").await.unwrap().unwrap();
        assert_eq!(fetched, path);
        assert_eq!(
            std::fs::read(&path).unwrap(),
            sample_image(ImageFormat::Png)
        );
    }

    #[tokio::test]
    async fn test_truncated_png_is_refetched() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        let cache = cache_with(&temp_dir, fetcher).await;

        let key = CacheKey::new("Acme Corp").unwrap();
        let path = cache.cache_dir().join(key.file_name());
        let png = sample_image_sized(ImageFormat::Png, 32);
        std::fs::write(&path, &png[..png.len() / 2]).unwrap();
        assert_eq!(cache.get_cached_logo("Acme Corp").await, None);

        assert_eq!(cache.download_logo("Acme Corp").await.unwrap(), Some(path.clone()));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            sample_image(ImageFormat::Png)
        );
    }

    #[tokio::test]
    async fn test_long_name_is_cached_after_one_fetch() {
        let temp_dir = TempDir::new().unwrap();
        let name = "株式会社".repeat(10);
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        let cache = cache_with(&temp_dir, fetcher).await;

        let first = cache.download_logo(&name).await.unwrap().unwrap();
        let second = cache.download_logo(&name).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(cache.get_cached_logo(&name).await, Some(first));
    }

    #[tokio::test]
    async fn test_refresh_keeps_existing_logo_when_fetch_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        let mut sequence = mockall::Sequence::new();
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(None));
        let cache = cache_with(&temp_dir, fetcher).await;

        let path = cache.download_logo("Acme Corp").await.unwrap().unwrap();
        assert_eq!(cache.refresh_logo("Acme Corp").await.unwrap(), None);
        assert_eq!(cache.get_cached_logo("acme corp").await, Some(path));
    }

    #[tokio::test]
    async fn test_refresh_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        let mut sequence = mockall::Sequence::new();
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        fetcher
            .expect_fetch()
            .times(1)
            .in_sequence(&mut sequence)
            .returning(|_| Ok(Some(sample_image_sized(ImageFormat::Jpeg, 8))));
        let cache = cache_with(&temp_dir, fetcher).await;

        let original = cache.download_logo("Acme Corp").await.unwrap().unwrap();
        let original_bytes = std::fs::read(&original).unwrap();
        let refreshed = cache.refresh_logo("Acme Corp").await.unwrap().unwrap();

        assert_eq!(original, refreshed);
        assert_ne!(std::fs::read(&refreshed).unwrap(), original_bytes);
    }

    #[tokio::test]
    async fn test_coverage_report() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        let cache = cache_with(&temp_dir, fetcher).await;

        cache.download_logo("Kwik Trip").await.unwrap();
        let report = cache.coverage_report(&["kwik trip", "Wayfair"]).await;

        assert_eq!(report.get("kwik trip"), Some(&true));
        assert_eq!(report.get("Wayfair"), Some(&false));
    }

    #[tokio::test]
    async fn test_remove_cached_logo() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = MockLogoFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(Some(sample_image(ImageFormat::Png))));
        let cache = cache_with(&temp_dir, fetcher).await;

        cache.download_logo("Acme Corp").await.unwrap();
        assert!(cache.remove_cached_logo("ACME CORP").await.unwrap());
        assert_eq!(cache.get_cached_logo("Acme Corp").await, None);
        assert!(!cache.remove_cached_logo("Acme Corp").await.unwrap());
    }
}
