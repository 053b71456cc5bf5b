/// Database connection and table creation
pub mod database;

/// Reference data seed loading from catalog.toml
pub mod seed;

/// Server settings from environment variables
pub mod server;

pub use server::AppConfig;
