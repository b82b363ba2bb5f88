//! Logo sources consulted on a cache miss

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

use super::key::CacheKey;
use crate::errors::{AppError, AppResult, FetchError, FetchResult};

/// Image extensions the directory source looks for, in lookup order
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp"];

/// Obtains raw logo bytes for a company.
///
/// `Ok(None)` means the source has no logo for this company; `Err` means the
/// attempt itself failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LogoFetcher: Send + Sync {
    async fn fetch(&self, company_name: &str) -> FetchResult<Option<Vec<u8>>>;
}

/// Source that never has a logo
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLogoFetcher;

#[async_trait]
impl LogoFetcher for NoLogoFetcher {
    async fn fetch(&self, company_name: &str) -> FetchResult<Option<Vec<u8>>> {
        trace!("No logo source configured for '{}'", company_name);
        Ok(None)
    }
}

/// Remote source addressed by a URL template.
///
/// `{name}` expands to the percent-encoded company name and `{key}` to the
/// percent-encoded cache key.
#[derive(Debug, Clone)]
pub struct HttpLogoFetcher {
    client: Client,
    url_template: String,
    max_image_size: usize,
}

impl HttpLogoFetcher {
    pub fn new(
        url_template: String,
        timeout: Duration,
        user_agent: &str,
        max_image_size: usize,
    ) -> AppResult<Self> {
        if !url_template.contains("{name}") && !url_template.contains("{key}") {
            return Err(AppError::configuration(format!(
                "url_template '{url_template}' must contain {{name}} or {{key}}"
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| AppError::configuration(format!("failed to build HTTP client: {e}")))?;

        let fetcher = Self {
            client,
            url_template,
            max_image_size,
        };
        // Reject templates that cannot produce a URL before the first miss
        fetcher
            .request_url("example")
            .map_err(|e| AppError::configuration(e.to_string()))?;

        Ok(fetcher)
    }

    pub fn request_url(&self, company_name: &str) -> FetchResult<Url> {
        let key = CacheKey::new(company_name)
            .ok_or_else(|| FetchError::invalid_template(&self.url_template, "blank company name"))?;
        let rendered = self
            .url_template
            .replace("{name}", &urlencoding::encode(company_name.trim()))
            .replace("{key}", &urlencoding::encode(key.as_str()));

        Url::parse(&rendered)
            .map_err(|e| FetchError::invalid_template(&self.url_template, e.to_string()))
    }
}

#[async_trait]
impl LogoFetcher for HttpLogoFetcher {
    async fn fetch(&self, company_name: &str) -> FetchResult<Option<Vec<u8>>> {
        let url = self.request_url(company_name)?;
        debug!("Downloading logo for '{}' from {}", company_name, url);

        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(FetchError::NotAnImage { content_type });
        }

        if let Some(length) = response.content_length()
            && length > self.max_image_size as u64
        {
            return Err(FetchError::TooLarge {
                size: usize::try_from(length).unwrap_or(usize::MAX),
                max_size: self.max_image_size,
            });
        }

        // Content-Length may be absent or wrong; enforce the cap while reading
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            let size = bytes.len() + chunk.len();
            if size > self.max_image_size {
                return Err(FetchError::TooLarge {
                    size,
                    max_size: self.max_image_size,
                });
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(Some(bytes))
    }
}

/// Local directory of hand-curated logo files
#[derive(Debug, Clone)]
pub struct DirectoryLogoFetcher {
    asset_dir: PathBuf,
}

impl DirectoryLogoFetcher {
    pub fn new(asset_dir: PathBuf) -> Self {
        Self { asset_dir }
    }

    /// File stems tried for a company, most specific first
    pub fn name_variations(company_name: &str) -> Vec<String> {
        let original = company_name.trim();
        let lower = original.to_lowercase();
        let candidates = [
            original.to_string(),
            lower.clone(),
            lower.replace(' ', "_"),
            lower.replace(' ', "-"),
            lower.chars().filter(|c| c.is_alphanumeric()).collect(),
        ];

        let mut variations: Vec<String> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let is_safe = !candidate.is_empty()
                && candidate != "."
                && candidate != ".."
                && !candidate.contains(['/', '\\']);
            if is_safe && !variations.contains(&candidate) {
                variations.push(candidate);
            }
        }
        variations
    }
}

#[async_trait]
impl LogoFetcher for DirectoryLogoFetcher {
    async fn fetch(&self, company_name: &str) -> FetchResult<Option<Vec<u8>>> {
        for stem in Self::name_variations(company_name) {
            for ext in SUPPORTED_EXTENSIONS {
                let candidate = self.asset_dir.join(format!("{stem}.{ext}"));
                match tokio::fs::read(&candidate).await {
                    Ok(bytes) => {
                        debug!(
                            "Found logo asset for '{}': {}",
                            company_name,
                            candidate.display()
                        );
                        return Ok(Some(bytes));
                    }
                    Err(e) if e.kind() == ErrorKind::NotFound => continue,
                    Err(e) => return Err(FetchError::Io(e)),
                }
            }
        }
        Ok(None)
    }
}
