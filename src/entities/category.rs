//! Category entity - Top-level product classification.
//!
//! `count` is a denormalized total of the products that reference the
//! category. It is maintained by the product service inside the same
//! transaction as the membership change.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    #[serde(rename = "categoryID")]
    pub id: i64,
    /// Category name (e.g., "Fertilizer", "Seeds")
    #[sea_orm(unique)]
    pub name: String,
    /// Number of products assigned to this category
    pub count: i32,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many products
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    /// One category has many subcategories
    #[sea_orm(has_many = "super::subcategory::Entity")]
    SubCategories,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::subcategory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubCategories.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
