//! Product-tag join entity.
//!
//! The composite primary key makes each (product, tag) pair unique. Requests
//! that repeat a tag ID are rejected with a conflict before any row is written.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product-tag link model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_tags")]
pub struct Model {
    /// Linked product
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(rename = "productID")]
    pub product_id: i64,
    /// Linked tag
    #[sea_orm(primary_key, auto_increment = false)]
    #[serde(rename = "tagID")]
    pub tag_id: i64,
}

/// Both sides of the link
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each link points at one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each link points at one tag
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::TagId",
        to = "super::tag::Column::Id"
    )]
    Tag,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
