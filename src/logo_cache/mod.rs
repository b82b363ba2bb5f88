//! On-disk logo cache keyed by company name
//!
//! Lookups normalize the company name (trimmed, case-folded) into a
//! [`CacheKey`], which names a single `.png` file in the cache directory.
//! On a miss the configured [`LogoFetcher`] is asked for the image; whatever
//! it returns is validated, normalized to PNG and written atomically.
//!
//! A missing logo is an expected outcome and is reported as `None`. Only
//! storage failures are errors.

pub mod entry;
pub mod fetcher;
pub mod format;
pub mod key;
pub mod service;
pub mod storage;

pub use entry::LogoCacheEntry;
pub use fetcher::{DirectoryLogoFetcher, HttpLogoFetcher, LogoFetcher, NoLogoFetcher};
pub use key::{CacheKey, StoredKey};
pub use service::LogoCache;
pub use storage::LogoCacheStorage;
