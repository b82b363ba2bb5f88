//! Centralized error handling for the logo cache
//!
//! # Error Categories
//!
//! - **Storage Errors**: the cache directory cannot be created or written
//! - **Fetch Errors**: a logo source failed; recoverable, usually logged and
//!   turned into "no logo"
//! - **Configuration Errors**: invalid or unreadable configuration
//!
//! # Usage
//!
//! ```rust
//! use logo_cache::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     Err(AppError::configuration("fetcher.url_template is required"))
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for fetch source Results
pub type FetchResult<T> = Result<T, FetchError>;
