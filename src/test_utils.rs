//! Shared test utilities for the catalog service.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        catalog,
        product::{self, NewProduct},
        user,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per test binary.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test category with a zero count.
pub async fn create_test_category(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::category::Model> {
    catalog::create_category(db, name.to_string()).await
}

/// Creates a test tag.
pub async fn create_test_tag(db: &DatabaseConnection, name: &str) -> Result<entities::tag::Model> {
    catalog::create_tag(db, name.to_string()).await
}

/// Creates a test user.
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
) -> Result<entities::user::Model> {
    user::create_user(db, username.to_string()).await
}

/// Creates a test product with sensible defaults.
///
/// # Defaults
/// * price: 10.0
/// * no category, subcategory, origin or tags
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(db, NewProduct::new(name, 10.0)).await
}

/// Creates a test product with a category and tag list.
pub async fn create_custom_product(
    db: &DatabaseConnection,
    name: &str,
    category_id: Option<i64>,
    tag_ids: Option<Vec<i64>>,
) -> Result<entities::product::Model> {
    let input = NewProduct {
        category_id,
        tag_ids,
        ..NewProduct::new(name, 10.0)
    };
    product::create_product(db, input).await
}
