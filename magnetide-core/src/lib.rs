//! Magnetide Core - Shared building blocks for the search aggregator
//!
//! This crate provides the ambient pieces every Magnetide component relies on:
//! centralized configuration, tracing setup, and the cache service contract
//! that callers may wrap around provider searches.

pub mod cache;
pub mod config;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use cache::{CacheService, CacheServiceExt, MemoryCache};
pub use config::MagnetideConfig;

/// Core errors that can bubble up from shared Magnetide infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {reason}")]
    Cache { reason: String },
}

impl CoreError {
    /// Returns a user-friendly error message suitable for display.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Configuration { reason } => format!("Invalid configuration: {reason}"),
            CoreError::Io(_) => "File system error occurred".to_string(),
            CoreError::Cache { .. } => "Cache unavailable".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
