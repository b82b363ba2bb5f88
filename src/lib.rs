pub mod config;
pub mod errors;
pub mod logo_cache;

pub use logo_cache::{LogoCache, LogoFetcher};
