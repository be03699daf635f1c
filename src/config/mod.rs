/// Database configuration and connection management
pub mod database;

/// Default-category catalogue, optionally loaded from config.toml
pub mod categories;
