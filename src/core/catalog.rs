//! Reference data business logic - categories, subcategories, origins and tags.
//!
//! Products point at these records, so they are created up front (by an admin
//! or from the seed file) and only listed afterwards. This module also owns the
//! denormalized `Category.count` column: the product service adjusts it inside
//! its own transactions, and [`reconcile_category_counts`] repairs any drift
//! that predates that.

use crate::{
    config::seed::CatalogSeed,
    entities::{
        Category, Origin, Product, SubCategory, Tag, User, category, origin, product,
        subcategory, tag, user,
    },
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

fn require_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::bad_request(format!("{kind} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Atomically adds `delta` to a category's product count.
///
/// Runs a single `UPDATE categories SET count = count + delta` so concurrent
/// callers never lose an increment. Pass a transaction to tie the adjustment
/// to the membership change that causes it.
///
/// # Errors
/// Returns `Error::NotFound` if the category does not exist.
pub async fn adjust_category_count<C>(db: &C, category_id: i64, delta: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = Category::update_many()
        .col_expr(
            category::Column::Count,
            Expr::col(category::Column::Count).add(delta),
        )
        .filter(category::Column::Id.eq(category_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found(format!(
            "Category not found: {category_id}"
        )));
    }

    debug!(category_id, delta, "Adjusted category count");
    Ok(())
}

/// Creates a category with a zero product count.
///
/// # Errors
/// Returns `Error::BadRequest` for a blank name and `Error::Conflict` if the
/// name is already taken.
pub async fn create_category(db: &DatabaseConnection, name: String) -> Result<category::Model> {
    let name = require_name("Category", &name)?;
    let category = category::ActiveModel {
        name: Set(name),
        count: Set(0),
        ..Default::default()
    };
    category.insert(db).await.map_err(Into::into)
}

/// Retrieves a category by ID.
pub async fn get_category_by_id(
    db: &DatabaseConnection,
    category_id: i64,
) -> Result<Option<category::Model>> {
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all categories ordered by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a subcategory, optionally under an existing category.
///
/// # Errors
/// Returns `Error::BadRequest` for a blank name and `Error::NotFound` if the
/// parent category does not exist.
pub async fn create_subcategory(
    db: &DatabaseConnection,
    name: String,
    category_id: Option<i64>,
) -> Result<subcategory::Model> {
    let name = require_name("Subcategory", &name)?;
    let subcategory = subcategory::ActiveModel {
        name: Set(name),
        category_id: Set(category_id),
        ..Default::default()
    };
    subcategory.insert(db).await.map_err(Into::into)
}

/// Lists all subcategories ordered by name.
pub async fn list_subcategories(db: &DatabaseConnection) -> Result<Vec<subcategory::Model>> {
    SubCategory::find()
        .order_by_asc(subcategory::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates an origin.
pub async fn create_origin(db: &DatabaseConnection, name: String) -> Result<origin::Model> {
    let name = require_name("Origin", &name)?;
    let origin = origin::ActiveModel {
        name: Set(name),
        ..Default::default()
    };
    origin.insert(db).await.map_err(Into::into)
}

/// Lists all origins ordered by name.
pub async fn list_origins(db: &DatabaseConnection) -> Result<Vec<origin::Model>> {
    Origin::find()
        .order_by_asc(origin::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Creates a tag. Tag names are unique.
pub async fn create_tag(db: &DatabaseConnection, name: String) -> Result<tag::Model> {
    let name = require_name("Tag", &name)?;
    let tag = tag::ActiveModel {
        name: Set(name),
        ..Default::default()
    };
    tag.insert(db).await.map_err(Into::into)
}

/// Lists all tags ordered by name.
pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>> {
    Tag::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Inserts every seed entry whose name (or username) is not present yet.
///
/// All inserts share one transaction, so a bad seed file leaves the catalog
/// untouched. Returns the number of rows inserted.
///
/// # Errors
/// Returns `Error::Config` if a subcategory names a parent category that is
/// neither in the database nor in the seed.
#[instrument(skip_all)]
pub async fn seed_catalog(db: &DatabaseConnection, seed: &CatalogSeed) -> Result<usize> {
    let txn = db.begin().await?;
    let mut inserted = 0;

    for entry in &seed.categories {
        let exists = Category::find()
            .filter(category::Column::Name.eq(entry.name.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if !exists {
            category::ActiveModel {
                name: Set(require_name("Category", &entry.name)?),
                count: Set(0),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }
    }

    for entry in &seed.subcategories {
        let parent_id = match &entry.category {
            Some(parent) => Some(
                Category::find()
                    .filter(category::Column::Name.eq(parent.as_str()))
                    .one(&txn)
                    .await?
                    .ok_or_else(|| Error::Config {
                        message: format!(
                            "Subcategory '{}' references unknown category '{parent}'",
                            entry.name
                        ),
                    })?
                    .id,
            ),
            None => None,
        };

        let exists = SubCategory::find()
            .filter(subcategory::Column::Name.eq(entry.name.as_str()))
            .filter(match parent_id {
                Some(id) => subcategory::Column::CategoryId.eq(id),
                None => subcategory::Column::CategoryId.is_null(),
            })
            .one(&txn)
            .await?
            .is_some();
        if !exists {
            subcategory::ActiveModel {
                name: Set(require_name("Subcategory", &entry.name)?),
                category_id: Set(parent_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }
    }

    for entry in &seed.origins {
        let exists = Origin::find()
            .filter(origin::Column::Name.eq(entry.name.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if !exists {
            origin::ActiveModel {
                name: Set(require_name("Origin", &entry.name)?),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }
    }

    for entry in &seed.tags {
        let exists = Tag::find()
            .filter(tag::Column::Name.eq(entry.name.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if !exists {
            tag::ActiveModel {
                name: Set(require_name("Tag", &entry.name)?),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }
    }

    for entry in &seed.users {
        let username = require_name("User", &entry.username)?;
        let exists = User::find()
            .filter(user::Column::Username.eq(username.as_str()))
            .one(&txn)
            .await?
            .is_some();
        if !exists {
            user::ActiveModel {
                username: Set(username),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            inserted += 1;
        }
    }

    txn.commit().await?;
    info!(inserted, "Catalog seed applied");
    Ok(inserted)
}

/// A category whose stored count disagreed with its live product membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountCorrection {
    /// Category that was corrected
    #[serde(rename = "categoryID")]
    pub category_id: i64,
    /// Category name
    pub name: String,
    /// Value found in `categories.count`
    pub stored: i32,
    /// Number of products actually referencing the category
    pub actual: i32,
}

/// Recomputes every `Category.count` from the products table.
///
/// Only categories that drifted are written. Returns one [`CountCorrection`]
/// per repaired category.
#[instrument(skip(db))]
pub async fn reconcile_category_counts(db: &DatabaseConnection) -> Result<Vec<CountCorrection>> {
    let txn = db.begin().await?;
    let mut corrections = Vec::new();

    for existing in Category::find().all(&txn).await? {
        let members = Product::find()
            .filter(product::Column::CategoryId.eq(existing.id))
            .count(&txn)
            .await?;
        let actual = i32::try_from(members).unwrap_or(i32::MAX);

        if actual != existing.count {
            warn!(
                category_id = existing.id,
                stored = existing.count,
                actual,
                "Category count drifted, correcting"
            );
            corrections.push(CountCorrection {
                category_id: existing.id,
                name: existing.name.clone(),
                stored: existing.count,
                actual,
            });

            let mut active: category::ActiveModel = existing.into();
            active.count = Set(actual);
            active.update(&txn).await?;
        }
    }

    txn.commit().await?;
    Ok(corrections)
}
