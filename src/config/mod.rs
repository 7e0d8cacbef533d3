//! Configuration module for ranking extraction
//!
//! This module provides the `ScrapeConfig` struct, its type-safe builder and
//! the loaders for category lists and JSON config files.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod loader;
pub mod methods;
pub mod types;

// Re-exports for public API
pub use builder::{ScrapeConfigBuilder, WithOutputDir};
pub use loader::{
    default_categories, load_categories, load_config, parse_categories, select_categories,
};
pub use types::ScrapeConfig;
