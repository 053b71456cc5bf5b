//! Product entity - Represents a sellable catalog item.
//!
//! Each product belongs to at most one category, subcategory and origin, and
//! carries any number of tags through the `product_tags` join table. Image
//! lists are stored as JSON arrays so their order is preserved.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ordered list of image URIs stored in a single JSON column
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct UriList(pub Vec<String>);

impl From<Vec<String>> for UriList {
    fn from(uris: Vec<String>) -> Self {
        Self(uris)
    }
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    #[serde(rename = "productID")]
    pub id: i64,
    /// Display name (e.g., "Organic Rice")
    pub name: String,
    /// Regular unit price
    pub price: f64,
    /// Discounted price, never above `price`
    pub sale_price: Option<f64>,
    /// Units in stock
    pub quantity_available: i32,
    /// Selling unit (e.g., "kg", "bag")
    pub unit: String,
    /// Long-form description
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Gallery images, in display order
    #[sea_orm(column_type = "Json")]
    pub images: UriList,
    /// Images embedded in the description, in display order
    #[sea_orm(column_type = "Json")]
    pub description_images: UriList,
    /// Average rating; new products start at [`INITIAL_RATING`](crate::core::product::INITIAL_RATING)
    pub rating: f64,
    /// Whether the storefront shows this product
    pub visible: bool,
    /// When the product stops being sellable
    pub expires_at: Option<DateTime>,
    /// Primary category
    #[serde(rename = "categoryID")]
    pub category_id: Option<i64>,
    /// Optional subcategory
    #[serde(rename = "subcategoryID")]
    pub subcategory_id: Option<i64>,
    /// Optional place of origin
    #[serde(rename = "originID")]
    pub origin_id: Option<i64>,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// Each product may belong to one subcategory
    #[sea_orm(
        belongs_to = "super::subcategory::Entity",
        from = "Column::SubcategoryId",
        to = "super::subcategory::Column::Id"
    )]
    SubCategory,
    /// Each product may name one origin
    #[sea_orm(
        belongs_to = "super::origin::Entity",
        from = "Column::OriginId",
        to = "super::origin::Column::Id"
    )]
    Origin,
    /// Tag links
    #[sea_orm(has_many = "super::product_tag::Entity")]
    ProductTags,
    /// One product has many comments
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubCategory.def()
    }
}

impl Related<super::origin::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Origin.def()
    }
}

impl Related<super::product_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductTags.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_tag::Relation::Product.def().rev())
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
