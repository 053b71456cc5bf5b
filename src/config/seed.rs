//! Reference data loading from catalog.toml
//!
//! The seed file lists the categories, subcategories, origins and tags that
//! should exist before the first product is created, plus the users comments
//! can be attributed to. Seeding only inserts
//! names that are missing, so the file can be applied on every start.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogSeed {
    /// Category names
    #[serde(default)]
    pub categories: Vec<NamedSeed>,
    /// Subcategories, optionally under a category (by name)
    #[serde(default)]
    pub subcategories: Vec<SubCategorySeed>,
    /// Origin names
    #[serde(default)]
    pub origins: Vec<NamedSeed>,
    /// Tag names
    #[serde(default)]
    pub tags: Vec<NamedSeed>,
    /// Users allowed to comment
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

/// A seed entry that only carries a name
#[derive(Debug, Deserialize, Clone)]
pub struct NamedSeed {
    /// Entity name
    pub name: String,
}

/// Seed entry for a user
#[derive(Debug, Deserialize, Clone)]
pub struct UserSeed {
    /// Unique username
    pub username: String,
}

/// Seed entry for a subcategory
#[derive(Debug, Deserialize, Clone)]
pub struct SubCategorySeed {
    /// Subcategory name
    pub name: String,
    /// Name of the parent category
    #[serde(default)]
    pub category: Option<String>,
}

/// Loads the catalog seed from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_seed<P: AsRef<Path>>(path: P) -> Result<CatalogSeed> {
    let path_ref = path.as_ref();
    debug!("Loading catalog seed from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read seed file {}: {e}", path_ref.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse seed file {}: {e}", path_ref.display()),
    })
}

/// Loads the catalog seed if the file exists, returning an empty seed otherwise.
pub fn load_seed_if_present<P: AsRef<Path>>(path: P) -> Result<CatalogSeed> {
    let path_ref = path.as_ref();
    if path_ref.exists() {
        load_seed(path_ref)
    } else {
        info!("No seed file at {}, skipping", path_ref.display());
        Ok(CatalogSeed::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_catalog_seed() {
        let toml_str = r#"
            [[categories]]
            name = "Seeds"

            [[categories]]
            name = "Fertilizer"

            [[subcategories]]
            name = "Rice seeds"
            category = "Seeds"

            [[subcategories]]
            name = "Misc"

            [[tags]]
            name = "organic"

            [[users]]
            username = "farmer_em"
        "#;

        let seed: CatalogSeed = toml::from_str(toml_str).unwrap();
        assert_eq!(seed.categories.len(), 2);
        assert_eq!(seed.categories[1].name, "Fertilizer");
        assert_eq!(seed.subcategories[0].category.as_deref(), Some("Seeds"));
        assert!(seed.subcategories[1].category.is_none());
        assert!(seed.origins.is_empty());
        assert_eq!(seed.tags[0].name, "organic");
        assert_eq!(seed.users[0].username, "farmer_em");
    }

    #[test]
    fn test_missing_seed_file_is_empty() {
        let seed = load_seed_if_present("definitely/not/here/catalog.toml").unwrap();
        assert!(seed.categories.is_empty());
        assert!(seed.tags.is_empty());
        assert!(seed.users.is_empty());
    }

    #[test]
    fn test_invalid_seed_is_config_error() {
        let dir = std::env::temp_dir().join("agri_catalog_seed_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("broken.toml");
        std::fs::write(&path, "[[categories]\nname = ").unwrap();

        let result = load_seed(&path);
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
