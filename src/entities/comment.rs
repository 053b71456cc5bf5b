//! Comment entity - A user's review of a product.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Comment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the comment
    #[sea_orm(primary_key)]
    #[serde(rename = "commentID")]
    pub id: i64,
    /// Product being commented on
    #[serde(rename = "productID")]
    pub product_id: i64,
    /// Author
    #[serde(rename = "userID")]
    pub user_id: i64,
    /// Comment body
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// When the comment was posted
    pub created_at: DateTime,
    /// When the comment was last edited
    pub updated_at: DateTime,
}

/// Defines relationships between Comment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each comment belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// Each comment is written by one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
