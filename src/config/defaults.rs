/// Configuration default values
///
/// This module contains all the default values for configuration options,
/// making them easily changeable in one central location.
// Storage defaults
pub const DEFAULT_LOGO_CACHE_PATH: &str = "logos";

// Fetcher defaults
pub const DEFAULT_FETCH_TIMEOUT: &str = "30s";
pub const DEFAULT_MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024; // 10MB
pub const DEFAULT_USER_AGENT: &str = concat!("logo-cache/", env!("CARGO_PKG_VERSION"));
