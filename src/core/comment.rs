//! Comment business logic - product reviews and their authors.
//!
//! Comments exist so the product detail view can aggregate them; listing
//! always joins the author in the same query.

use crate::{
    entities::{Comment, Product, User, comment, user},
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::info;

/// A comment together with the user who wrote it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentWithUser {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub user: Option<user::Model>,
}

/// Posts a comment on a product.
///
/// # Errors
/// Returns an error if:
/// - The content is empty or whitespace-only (`BadRequest`)
/// - The product does not exist (`ProductNotFound`)
/// - The user does not exist (`NotFound`)
pub async fn create_comment(
    db: &DatabaseConnection,
    product_id: i64,
    user_id: i64,
    content: String,
) -> Result<comment::Model> {
    if content.trim().is_empty() {
        return Err(Error::bad_request("Comment content cannot be empty"));
    }

    if Product::find_by_id(product_id).one(db).await?.is_none() {
        return Err(Error::ProductNotFound { id: product_id });
    }
    if User::find_by_id(user_id).one(db).await?.is_none() {
        return Err(Error::not_found(format!("User not found: {user_id}")));
    }

    let now = chrono::Utc::now().naive_utc();
    let comment = comment::ActiveModel {
        product_id: Set(product_id),
        user_id: Set(user_id),
        content: Set(content.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(comment_id = comment.id, product_id, user_id, "Comment posted");
    Ok(comment)
}

/// Lists a product's comments with their authors, newest first.
pub async fn list_comments_for_product<C>(db: &C, product_id: i64) -> Result<Vec<CommentWithUser>>
where
    C: ConnectionTrait,
{
    let rows = Comment::find()
        .filter(comment::Column::ProductId.eq(product_id))
        .find_also_related(User)
        .order_by_desc(comment::Column::CreatedAt)
        .order_by_desc(comment::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(comment, user)| CommentWithUser { comment, user })
        .collect())
}
