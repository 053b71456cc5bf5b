//! Product business logic - Handles the product lifecycle and catalog queries.
//!
//! This module creates, updates and deletes products together with their tag
//! links and the owning category's product count. Each of those operations runs
//! inside one database transaction: the counter moves in the same commit as the
//! membership change, and a tag replacement is applied as a set difference so
//! readers see either the old tag set or the new one, never an empty one.
//!
//! Reads are framework-agnostic: [`get_product_by_id`] assembles the product
//! with its category, subcategory, origin, tags and comments in one call.

use crate::{
    core::{
        catalog::adjust_category_count,
        comment::{CommentWithUser, list_comments_for_product},
    },
    entities::{
        Category, Comment, Origin, Product, ProductTag, SubCategory, Tag, category, comment,
        origin, product, product_tag, subcategory, tag,
    },
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*,
    sea_query::LikeExpr,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Rating every new product starts with, regardless of input
pub const INITIAL_RATING: f64 = 5.0;

const fn default_visible() -> bool {
    true
}

/// Input for [`create_product`]
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub quantity_available: i32,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub description_images: Vec<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime>,
    #[serde(default, rename = "categoryID")]
    pub category_id: Option<i64>,
    #[serde(default, rename = "subcategoryID")]
    pub subcategory_id: Option<i64>,
    #[serde(default, rename = "originID")]
    pub origin_id: Option<i64>,
    /// Tags to link; absent means no tags
    #[serde(default, rename = "tagIDs")]
    pub tag_ids: Option<Vec<i64>>,
}

impl NewProduct {
    /// A visible product with only a name and price set
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            price,
            sale_price: None,
            quantity_available: 0,
            unit: String::new(),
            description: String::new(),
            images: Vec::new(),
            description_images: Vec::new(),
            visible: true,
            expires_at: None,
            category_id: None,
            subcategory_id: None,
            origin_id: None,
            tag_ids: None,
        }
    }
}

/// Deserializes a present field (including an explicit `null`) as `Some`.
///
/// Paired with `#[serde(default)]` this separates "absent" (`None`) from
/// "cleared" (`Some(None)`).
fn present<'de, T, D>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Input for [`update_product`]. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub name: Option<String>,
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "present")]
    pub sale_price: Option<Option<f64>>,
    pub quantity_available: Option<i32>,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub description_images: Option<Vec<String>>,
    pub visible: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub expires_at: Option<Option<DateTime>>,
    #[serde(default, deserialize_with = "present", rename = "categoryID")]
    pub category_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", rename = "subcategoryID")]
    pub subcategory_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", rename = "originID")]
    pub origin_id: Option<Option<i64>>,
    /// Replacement tag set; `Some(vec![])` clears all tags
    #[serde(default, rename = "tagIDs")]
    pub tag_ids: Option<Vec<i64>>,
}

/// Result of [`update_product`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductUpdated {
    /// Confirmation text
    pub message: String,
    /// The product as stored after the update
    pub product: product::Model,
}

/// A product with every relation the storefront detail page needs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub category: Option<category::Model>,
    pub subcategory: Option<subcategory::Model>,
    pub origin: Option<origin::Model>,
    pub tags: Vec<tag::Model>,
    pub comments: Vec<CommentWithUser>,
}

/// Optional window over a product listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

fn validate_fields(name: &str, price: f64, sale_price: Option<f64>, quantity: i32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::bad_request("Product name cannot be empty"));
    }

    if !price.is_finite() || price < 0.0 {
        return Err(Error::bad_request(format!("Invalid price: {price}")));
    }

    if let Some(sale) = sale_price {
        if !sale.is_finite() || sale < 0.0 {
            return Err(Error::bad_request(format!("Invalid sale price: {sale}")));
        }
        if sale > price {
            return Err(Error::bad_request(format!(
                "Sale price {sale} exceeds price {price}"
            )));
        }
    }

    if quantity < 0 {
        return Err(Error::bad_request(format!(
            "Quantity available cannot be negative: {quantity}"
        )));
    }

    Ok(())
}

/// Rejects a tag list that names the same tag twice.
///
/// The composite key on `product_tags` enforces the same rule at the store.
fn ensure_distinct(tag_ids: &[i64]) -> Result<BTreeSet<i64>> {
    let mut seen = BTreeSet::new();
    for &tag_id in tag_ids {
        if !seen.insert(tag_id) {
            return Err(Error::Conflict {
                message: format!("Tag {tag_id} listed more than once"),
            });
        }
    }
    Ok(seen)
}

/// Links each tag ID to the product.
async fn insert_tag_links<C>(db: &C, product_id: i64, tag_ids: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    if tag_ids.is_empty() {
        return Ok(());
    }

    let links = tag_ids.iter().map(|&tag_id| product_tag::ActiveModel {
        product_id: Set(product_id),
        tag_id: Set(tag_id),
    });
    ProductTag::insert_many(links)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Makes the product's tag set exactly `desired`.
///
/// Only the difference is written: links missing from `desired` are deleted and
/// new ones inserted. Call inside a transaction.
async fn replace_tags<C>(db: &C, product_id: i64, desired: &[i64]) -> Result<()>
where
    C: ConnectionTrait,
{
    let wanted = ensure_distinct(desired)?;

    let current: BTreeSet<i64> = ProductTag::find()
        .filter(product_tag::Column::ProductId.eq(product_id))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.tag_id)
        .collect();

    let removed: Vec<i64> = current.difference(&wanted).copied().collect();
    let added: Vec<i64> = wanted.difference(&current).copied().collect();

    if !removed.is_empty() {
        ProductTag::delete_many()
            .filter(product_tag::Column::ProductId.eq(product_id))
            .filter(product_tag::Column::TagId.is_in(removed.iter().copied()))
            .exec(db)
            .await?;
    }
    insert_tag_links(db, product_id, &added).await?;

    debug!(
        product_id,
        added = added.len(),
        removed = removed.len(),
        "Replaced product tags"
    );
    Ok(())
}

/// Creates a product, its tag links and the category count increment in one transaction.
///
/// The rating is always [`INITIAL_RATING`]. The returned model does not carry
/// tags; fetch it with [`get_product_by_id`] for the full view.
///
/// # Errors
/// Returns an error if:
/// - The name is blank, a price is negative or not finite, the sale price
///   exceeds the price, or the quantity is negative (`BadRequest`)
/// - A referenced category, subcategory, origin or tag does not exist (`NotFound`)
/// - `tag_ids` repeats an ID (`Conflict`)
///
/// Nothing is persisted when any step fails.
#[instrument(skip(db, input), fields(name = %input.name))]
pub async fn create_product(db: &DatabaseConnection, input: NewProduct) -> Result<product::Model> {
    validate_fields(
        &input.name,
        input.price,
        input.sale_price,
        input.quantity_available,
    )?;
    if let Some(tag_ids) = &input.tag_ids {
        ensure_distinct(tag_ids)?;
    }

    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;

    let created = product::ActiveModel {
        name: Set(input.name.trim().to_string()),
        price: Set(input.price),
        sale_price: Set(input.sale_price),
        quantity_available: Set(input.quantity_available),
        unit: Set(input.unit),
        description: Set(input.description),
        images: Set(input.images.into()),
        description_images: Set(input.description_images.into()),
        rating: Set(INITIAL_RATING),
        visible: Set(input.visible),
        expires_at: Set(input.expires_at),
        category_id: Set(input.category_id),
        subcategory_id: Set(input.subcategory_id),
        origin_id: Set(input.origin_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    if let Some(category_id) = input.category_id {
        adjust_category_count(&txn, category_id, 1).await?;
    }

    if let Some(tag_ids) = &input.tag_ids {
        insert_tag_links(&txn, created.id, tag_ids).await?;
    }

    txn.commit().await?;
    info!(product_id = created.id, "Created product");
    Ok(created)
}

/// Retrieves a bare product row by ID, returning None if it does not exist.
pub async fn find_product<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a product with its category, subcategory, tags, origin and comments.
///
/// All reads share one transaction so the relations come from a single
/// snapshot. Missing optional relations are `None`.
///
/// # Errors
/// Returns `Error::ProductNotFound` if the product does not exist.
#[instrument(skip(db))]
pub async fn get_product_by_id(db: &DatabaseConnection, product_id: i64) -> Result<ProductDetail> {
    let txn = db.begin().await?;

    let (product, category) = Product::find_by_id(product_id)
        .find_also_related(Category)
        .one(&txn)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let subcategory = product.find_related(SubCategory).one(&txn).await?;
    let origin = product.find_related(Origin).one(&txn).await?;
    let tags = product
        .find_related(Tag)
        .order_by_asc(tag::Column::Id)
        .all(&txn)
        .await?;
    let comments = list_comments_for_product(&txn, product_id).await?;

    txn.commit().await?;

    Ok(ProductDetail {
        product,
        category,
        subcategory,
        origin,
        tags,
        comments,
    })
}

/// Applies the fields present in `changes` and, when `tag_ids` is present,
/// replaces the tag set.
///
/// Moving the product to another category moves one unit of count from the
/// old category to the new one in the same transaction.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist (`ProductNotFound`)
/// - The merged field values fail validation (`BadRequest`)
/// - A referenced entity does not exist (`NotFound`)
/// - `tag_ids` repeats an ID (`Conflict`)
#[instrument(skip(db, changes))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    changes: ProductChanges,
) -> Result<ProductUpdated> {
    let txn = db.begin().await?;

    let existing = find_product(&txn, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;

    let name = changes
        .name
        .map_or_else(|| existing.name.clone(), |name| name.trim().to_string());
    let price = changes.price.unwrap_or(existing.price);
    let sale_price = changes.sale_price.unwrap_or(existing.sale_price);
    let quantity = changes
        .quantity_available
        .unwrap_or(existing.quantity_available);
    validate_fields(&name, price, sale_price, quantity)?;

    let old_category = existing.category_id;
    let new_category = changes.category_id.unwrap_or(old_category);

    let mut active: product::ActiveModel = existing.into();
    active.name = Set(name);
    active.price = Set(price);
    active.sale_price = Set(sale_price);
    active.quantity_available = Set(quantity);
    active.category_id = Set(new_category);
    if let Some(unit) = changes.unit {
        active.unit = Set(unit);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(images) = changes.images {
        active.images = Set(images.into());
    }
    if let Some(description_images) = changes.description_images {
        active.description_images = Set(description_images.into());
    }
    if let Some(visible) = changes.visible {
        active.visible = Set(visible);
    }
    if let Some(expires_at) = changes.expires_at {
        active.expires_at = Set(expires_at);
    }
    if let Some(subcategory_id) = changes.subcategory_id {
        active.subcategory_id = Set(subcategory_id);
    }
    if let Some(origin_id) = changes.origin_id {
        active.origin_id = Set(origin_id);
    }
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    let updated = active.update(&txn).await?;

    if old_category != new_category {
        if let Some(old) = old_category {
            adjust_category_count(&txn, old, -1).await?;
        }
        if let Some(new) = new_category {
            adjust_category_count(&txn, new, 1).await?;
        }
    }

    if let Some(tag_ids) = &changes.tag_ids {
        replace_tags(&txn, product_id, tag_ids).await?;
    }

    txn.commit().await?;
    info!(product_id, "Updated product");

    Ok(ProductUpdated {
        message: "Product updated successfully".to_string(),
        product: updated,
    })
}

/// Deletes a product after removing its tag links and comments, and
/// decrements its category's count.
///
/// # Errors
/// Returns `Error::ProductNotFound` if the product does not exist, including
/// when it was already deleted.
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = find_product(&txn, product_id)
        .await?
        .ok_or(Error::ProductNotFound { id: product_id })?;
    let category_id = existing.category_id;

    // Join rows and comments reference the product row, so they go first
    let unlinked = ProductTag::delete_many()
        .filter(product_tag::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?
        .rows_affected;
    Comment::delete_many()
        .filter(comment::Column::ProductId.eq(product_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;

    if let Some(category_id) = category_id {
        adjust_category_count(&txn, category_id, -1).await?;
    }

    txn.commit().await?;
    info!(product_id, unlinked, "Deleted product");
    Ok(())
}

/// Takes `quantity` units out of one product's stock.
///
/// A negative quantity puts units back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StockChange {
    #[serde(rename = "productID")]
    pub product_id: i64,
    pub quantity: i32,
}

/// Result of [`update_stock`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockUpdated {
    /// Confirmation text
    pub message: String,
    /// Each product as stored after its change, in request order
    pub products: Vec<product::Model>,
}

/// Applies a checkout's stock changes in one transaction.
///
/// Entries run in order, so a product listed twice has both changes applied.
/// Either every change is stored or none is.
///
/// # Errors
/// Returns an error if:
/// - A product does not exist (`ProductNotFound`)
/// - A change would leave a negative quantity available (`BadRequest`)
#[instrument(skip(db, changes), fields(entries = changes.len()))]
pub async fn update_stock(db: &DatabaseConnection, changes: &[StockChange]) -> Result<StockUpdated> {
    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;
    let mut products = Vec::with_capacity(changes.len());

    for change in changes {
        let existing = find_product(&txn, change.product_id)
            .await?
            .ok_or(Error::ProductNotFound {
                id: change.product_id,
            })?;

        let available = existing.quantity_available;
        let remaining = available
            .checked_sub(change.quantity)
            .filter(|remaining| *remaining >= 0)
            .ok_or_else(|| {
                Error::bad_request(format!(
                    "Insufficient stock for product {}: {available} available, {} requested",
                    change.product_id, change.quantity
                ))
            })?;

        let mut active: product::ActiveModel = existing.into();
        active.quantity_available = Set(remaining);
        active.updated_at = Set(now);
        products.push(active.update(&txn).await?);
    }

    txn.commit().await?;
    info!(updated = products.len(), "Updated product stock");

    Ok(StockUpdated {
        message: "Product quantities updated successfully".to_string(),
        products,
    })
}

/// Lists products, newest first.
pub async fn list_products(db: &DatabaseConnection, page: Page) -> Result<Vec<product::Model>> {
    // SQLite only accepts OFFSET after a LIMIT
    let limit = page
        .limit
        .or_else(|| page.offset.map(|_| i64::MAX.unsigned_abs()));

    Product::find()
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .limit(limit)
        .offset(page.offset)
        .all(db)
        .await
        .map_err(Into::into)
}

/// `LIKE` expression matching `text` literally anywhere in the column.
fn substring_pattern(text: &str) -> LikeExpr {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    LikeExpr::new(escaped).escape('\\')
}

/// Finds products whose name contains `pattern` literally, newest first.
///
/// `%` and `_` in the pattern are matched as ordinary characters.
///
/// # Errors
/// Returns `Error::BadRequest` for a blank pattern and `Error::NoProductsMatch`
/// when nothing matches.
#[instrument(skip(db))]
pub async fn find_products_by_name(
    db: &DatabaseConnection,
    pattern: &str,
) -> Result<Vec<product::Model>> {
    if pattern.trim().is_empty() {
        return Err(Error::bad_request("Product name is required"));
    }

    let products = Product::find()
        .filter(product::Column::Name.like(substring_pattern(pattern)))
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .all(db)
        .await?;

    if products.is_empty() {
        return Err(Error::NoProductsMatch {
            pattern: pattern.to_string(),
        });
    }

    debug!("Found {} products matching '{}'", products.len(), pattern);
    Ok(products)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::catalog::get_category_by_id;
    use crate::test_utils::*;

    fn tag_ids(detail: &ProductDetail) -> BTreeSet<i64> {
        detail.tags.iter().map(|t| t.id).collect()
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        // Empty name
        let result = create_product(&db, NewProduct::new("  ", 10.0)).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        // Negative and non-finite price
        let result = create_product(&db, NewProduct::new("Rice", -1.0)).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));
        let result = create_product(&db, NewProduct::new("Rice", f64::NAN)).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        // Sale price above price
        let mut input = NewProduct::new("Rice", 10.0);
        input.sale_price = Some(12.0);
        let result = create_product(&db, input).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        // Negative stock
        let mut input = NewProduct::new("Rice", 10.0);
        input.quantity_available = -3;
        let result = create_product(&db, input).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        assert!(list_products(&db, Page::default()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_round_trip_forces_rating() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Grains").await?;
        let origin = crate::core::catalog::create_origin(&db, "Mekong Delta".to_string()).await?;

        let input = NewProduct {
            sale_price: Some(18.5),
            quantity_available: 40,
            unit: "kg".to_string(),
            description: "Fragrant jasmine rice".to_string(),
            images: vec!["/img/rice-1.png".to_string(), "/img/rice-2.png".to_string()],
            description_images: vec!["/img/rice-field.png".to_string()],
            visible: false,
            category_id: Some(category.id),
            origin_id: Some(origin.id),
            ..NewProduct::new("Organic Rice", 20.0)
        };
        let created = create_product(&db, input.clone()).await?;
        assert_eq!(created.rating, INITIAL_RATING);

        let detail = get_product_by_id(&db, created.id).await?;
        let product = &detail.product;
        assert_eq!(product.name, input.name);
        assert_eq!(product.price, input.price);
        assert_eq!(product.sale_price, input.sale_price);
        assert_eq!(product.quantity_available, input.quantity_available);
        assert_eq!(product.unit, input.unit);
        assert_eq!(product.description, input.description);
        assert_eq!(product.images.0, input.images);
        assert_eq!(product.description_images.0, input.description_images);
        assert_eq!(product.visible, input.visible);
        assert_eq!(product.rating, 5.0);
        assert_eq!(detail.category.as_ref().map(|c| c.id), Some(category.id));
        assert_eq!(detail.origin.as_ref().map(|o| o.id), Some(origin.id));
        assert!(detail.subcategory.is_none());
        assert!(detail.tags.is_empty());
        assert!(detail.comments.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_increments_category_count() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Seeds").await?;
        assert_eq!(category.count, 0);

        create_custom_product(&db, "Rice seed", Some(category.id), None).await?;
        let after_one = get_category_by_id(&db, category.id).await?.unwrap();
        assert_eq!(after_one.count, 1);

        create_custom_product(&db, "Corn seed", Some(category.id), None).await?;
        create_test_product(&db, "Uncategorized").await?;
        let after_three = get_category_by_id(&db, category.id).await?.unwrap();
        assert_eq!(after_three.count, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_tags() -> Result<()> {
        let db = setup_test_db().await?;
        let organic = create_test_tag(&db, "organic").await?;
        let local = create_test_tag(&db, "local").await?;

        let created =
            create_custom_product(&db, "Rice", None, Some(vec![organic.id, local.id])).await?;

        let detail = get_product_by_id(&db, created.id).await?;
        assert_eq!(tag_ids(&detail), BTreeSet::from([organic.id, local.id]));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_duplicate_tags_conflicts_and_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Seeds").await?;
        let organic = create_test_tag(&db, "organic").await?;

        let result = create_custom_product(
            &db,
            "Rice",
            Some(category.id),
            Some(vec![organic.id, organic.id]),
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        // Neither the product nor the counter change survived
        assert!(list_products(&db, Page::default()).await?.is_empty());
        let category = get_category_by_id(&db, category.id).await?.unwrap();
        assert_eq!(category.count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_with_unknown_references() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_custom_product(&db, "Rice", Some(42), None).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let result = create_custom_product(&db, "Rice", None, Some(vec![42])).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        assert!(list_products(&db, Page::default()).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_by_id_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = get_product_by_id(&db, 999).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_product_by_id_includes_comments_with_users() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Rice").await?;
        let user = create_test_user(&db, "farmer_an").await?;

        crate::core::comment::create_comment(&db, product.id, user.id, "Great rice".to_string())
            .await?;

        let detail = get_product_by_id(&db, product.id).await?;
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].comment.content, "Great rice");
        assert_eq!(
            detail.comments[0].user.as_ref().map(|u| u.username.as_str()),
            Some("farmer_an")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_update_replaces_tag_set_exactly() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Grains").await?;
        let t1 = create_test_tag(&db, "organic").await?;
        let t2 = create_test_tag(&db, "local").await?;
        let t3 = create_test_tag(&db, "bestseller").await?;

        let product =
            create_custom_product(&db, "Product A", Some(category.id), Some(vec![t1.id, t2.id]))
                .await?;
        let category_after_create = get_category_by_id(&db, category.id).await?.unwrap();
        assert_eq!(category_after_create.count, 1);

        let changes = ProductChanges {
            tag_ids: Some(vec![t2.id, t3.id]),
            ..Default::default()
        };
        update_product(&db, product.id, changes).await?;

        let detail = get_product_by_id(&db, product.id).await?;
        assert_eq!(tag_ids(&detail), BTreeSet::from([t2.id, t3.id]));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_with_empty_tags_clears_them() -> Result<()> {
        let db = setup_test_db().await?;
        let t1 = create_test_tag(&db, "organic").await?;
        let product = create_custom_product(&db, "Rice", None, Some(vec![t1.id])).await?;

        let changes = ProductChanges {
            tag_ids: Some(Vec::new()),
            ..Default::default()
        };
        update_product(&db, product.id, changes).await?;

        let detail = get_product_by_id(&db, product.id).await?;
        assert!(detail.tags.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_without_tags_field_keeps_tags() -> Result<()> {
        let db = setup_test_db().await?;
        let t1 = create_test_tag(&db, "organic").await?;
        let product = create_custom_product(&db, "Rice", None, Some(vec![t1.id])).await?;

        let changes = ProductChanges {
            price: Some(12.0),
            ..Default::default()
        };
        let result = update_product(&db, product.id, changes).await?;
        assert_eq!(result.message, "Product updated successfully");
        assert_eq!(result.product.price, 12.0);
        assert_eq!(result.product.name, "Rice");

        let detail = get_product_by_id(&db, product.id).await?;
        assert_eq!(tag_ids(&detail), BTreeSet::from([t1.id]));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_partial_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let mut input = NewProduct::new("Rice", 20.0);
        input.sale_price = Some(15.0);
        input.unit = "kg".to_string();
        let product = create_product(&db, input).await?;

        // Clearing the sale price while leaving everything else alone
        let changes = ProductChanges {
            sale_price: Some(None),
            description: Some("Long grain".to_string()),
            ..Default::default()
        };
        let updated = update_product(&db, product.id, changes).await?.product;
        assert_eq!(updated.sale_price, None);
        assert_eq!(updated.description, "Long grain");
        assert_eq!(updated.unit, "kg");
        assert_eq!(updated.price, 20.0);
        assert_eq!(updated.rating, INITIAL_RATING);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_validation_uses_merged_values() -> Result<()> {
        let db = setup_test_db().await?;
        let mut input = NewProduct::new("Rice", 20.0);
        input.sale_price = Some(15.0);
        let product = create_product(&db, input).await?;

        // Lowering the price below the stored sale price is rejected
        let changes = ProductChanges {
            price: Some(10.0),
            ..Default::default()
        };
        let result = update_product(&db, product.id, changes).await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let unchanged = find_product(&db, product.id).await?.unwrap();
        assert_eq!(unchanged.price, 20.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_moves_category_count() -> Result<()> {
        let db = setup_test_db().await?;
        let seeds = create_test_category(&db, "Seeds").await?;
        let tools = create_test_category(&db, "Tools").await?;
        let product = create_custom_product(&db, "Rice seed", Some(seeds.id), None).await?;

        let changes = ProductChanges {
            category_id: Some(Some(tools.id)),
            ..Default::default()
        };
        update_product(&db, product.id, changes).await?;
        assert_eq!(get_category_by_id(&db, seeds.id).await?.unwrap().count, 0);
        assert_eq!(get_category_by_id(&db, tools.id).await?.unwrap().count, 1);

        // Removing the category entirely
        let changes = ProductChanges {
            category_id: Some(None),
            ..Default::default()
        };
        update_product(&db, product.id, changes).await?;
        assert_eq!(get_category_by_id(&db, tools.id).await?.unwrap().count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_with_duplicate_tags_keeps_old_set() -> Result<()> {
        let db = setup_test_db().await?;
        let t1 = create_test_tag(&db, "organic").await?;
        let t2 = create_test_tag(&db, "local").await?;
        let product = create_custom_product(&db, "Rice", None, Some(vec![t1.id])).await?;

        let changes = ProductChanges {
            name: Some("Renamed".to_string()),
            tag_ids: Some(vec![t2.id, t2.id]),
            ..Default::default()
        };
        let result = update_product(&db, product.id, changes).await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        let detail = get_product_by_id(&db, product.id).await?;
        assert_eq!(detail.product.name, "Rice");
        assert_eq!(tag_ids(&detail), BTreeSet::from([t1.id]));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let result = update_product(&db, 999, ProductChanges::default()).await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_twice() -> Result<()> {
        let db = setup_test_db().await?;
        let category = create_test_category(&db, "Seeds").await?;
        let t1 = create_test_tag(&db, "organic").await?;
        let product =
            create_custom_product(&db, "Rice", Some(category.id), Some(vec![t1.id])).await?;

        delete_product(&db, product.id).await?;

        let links = ProductTag::find()
            .filter(product_tag::Column::ProductId.eq(product.id))
            .all(&db)
            .await?;
        assert!(links.is_empty());
        assert!(find_product(&db, product.id).await?.is_none());
        assert_eq!(get_category_by_id(&db, category.id).await?.unwrap().count, 0);

        let second = delete_product(&db, product.id).await;
        assert!(matches!(second, Err(Error::ProductNotFound { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_product_with_comments() -> Result<()> {
        let db = setup_test_db().await?;
        let product = create_test_product(&db, "Rice").await?;
        let user = create_test_user(&db, "farmer_binh").await?;
        crate::core::comment::create_comment(&db, product.id, user.id, "Nice".to_string())
            .await?;

        delete_product(&db, product.id).await?;
        assert!(find_product(&db, product.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_stock_applies_all_changes() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_product(
            &db,
            NewProduct {
                quantity_available: 10,
                ..NewProduct::new("Organic Rice", 20.0)
            },
        )
        .await?;
        let urea = create_product(
            &db,
            NewProduct {
                quantity_available: 4,
                ..NewProduct::new("Urea", 8.0)
            },
        )
        .await?;

        let result = update_stock(
            &db,
            &[
                StockChange {
                    product_id: rice.id,
                    quantity: 3,
                },
                StockChange {
                    product_id: urea.id,
                    quantity: 4,
                },
                StockChange {
                    product_id: rice.id,
                    quantity: 2,
                },
            ],
        )
        .await?;
        assert_eq!(result.products.len(), 3);

        let rice_now = find_product(&db, rice.id).await?.unwrap();
        let urea_now = find_product(&db, urea.id).await?.unwrap();
        assert_eq!(rice_now.quantity_available, 5);
        assert_eq!(urea_now.quantity_available, 0);

        // Negative quantities restock
        update_stock(
            &db,
            &[StockChange {
                product_id: urea.id,
                quantity: -6,
            }],
        )
        .await?;
        let urea_now = find_product(&db, urea.id).await?.unwrap();
        assert_eq!(urea_now.quantity_available, 6);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_stock_is_all_or_nothing() -> Result<()> {
        let db = setup_test_db().await?;
        let rice = create_product(
            &db,
            NewProduct {
                quantity_available: 10,
                ..NewProduct::new("Organic Rice", 20.0)
            },
        )
        .await?;

        // Unknown product after a valid change
        let result = update_stock(
            &db,
            &[
                StockChange {
                    product_id: rice.id,
                    quantity: 1,
                },
                StockChange {
                    product_id: 999,
                    quantity: 1,
                },
            ],
        )
        .await;
        assert!(matches!(result, Err(Error::ProductNotFound { id: 999 })));

        // Overdrawn stock
        let result = update_stock(
            &db,
            &[
                StockChange {
                    product_id: rice.id,
                    quantity: 6,
                },
                StockChange {
                    product_id: rice.id,
                    quantity: 6,
                },
            ],
        )
        .await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        // Overflowing restock
        let result = update_stock(
            &db,
            &[StockChange {
                product_id: rice.id,
                quantity: i32::MIN,
            }],
        )
        .await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        let rice_now = find_product(&db, rice.id).await?.unwrap();
        assert_eq!(rice_now.quantity_available, 10);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_products_newest_first() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_product(&db, "First").await?;
        let second = create_test_product(&db, "Second").await?;
        let third = create_test_product(&db, "Third").await?;

        let products = list_products(&db, Page::default()).await?;
        let ids: Vec<_> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![third.id, second.id, first.id]);

        let window = list_products(
            &db,
            Page {
                limit: Some(1),
                offset: Some(1),
            },
        )
        .await?;
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].id, second.id);

        // Offset alone skips without capping the result
        let rest = list_products(
            &db,
            Page {
                limit: None,
                offset: Some(1),
            },
        )
        .await?;
        let ids: Vec<_> = rest.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        Ok(())
    }

    #[tokio::test]
    async fn test_find_products_by_name() -> Result<()> {
        let db = setup_test_db().await?;

        let result = find_products_by_name(&db, "").await;
        assert!(matches!(result, Err(Error::BadRequest { .. })));

        create_test_product(&db, "Organic Rice").await?;
        create_test_product(&db, "NPK Fertilizer").await?;
        let brown = create_test_product(&db, "Brown rice").await?;

        let result = find_products_by_name(&db, "zzzznoexist").await;
        assert!(matches!(result, Err(Error::NoProductsMatch { .. })));

        let matches = find_products_by_name(&db, "rice").await?;
        let names: Vec<_> = matches.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Brown rice", "Organic Rice"]);
        assert_eq!(matches[0].id, brown.id);

        // Wildcard characters are matched literally
        let result = find_products_by_name(&db, "%").await;
        assert!(matches!(result, Err(Error::NoProductsMatch { .. })));
        let result = find_products_by_name(&db, "R_ce").await;
        assert!(matches!(result, Err(Error::NoProductsMatch { .. })));

        create_test_product(&db, "Urea 46_0").await?;
        let matches = find_products_by_name(&db, "46_0").await?;
        assert_eq!(matches.len(), 1);

        Ok(())
    }

    #[test]
    fn test_changes_distinguish_absent_from_null() {
        let absent: ProductChanges = serde_json::from_str(r#"{"price": 3.5}"#).unwrap();
        assert_eq!(absent.price, Some(3.5));
        assert_eq!(absent.sale_price, None);
        assert_eq!(absent.category_id, None);
        assert_eq!(absent.tag_ids, None);

        let cleared: ProductChanges =
            serde_json::from_str(r#"{"salePrice": null, "categoryID": 4, "tagIDs": []}"#)
                .unwrap();
        assert_eq!(cleared.sale_price, Some(None));
        assert_eq!(cleared.category_id, Some(Some(4)));
        assert_eq!(cleared.tag_ids, Some(Vec::new()));
    }

    #[test]
    fn test_new_product_defaults_from_json() {
        let input: NewProduct =
            serde_json::from_str(r#"{"name": "Rice", "price": 10, "tagIDs": [1, 2]}"#).unwrap();
        assert!(input.visible);
        assert_eq!(input.quantity_available, 0);
        assert_eq!(input.tag_ids, Some(vec![1, 2]));
        assert!(input.category_id.is_none());
    }
}
