//! User business logic - just enough to attribute comments.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};

/// Creates a user with a unique username.
///
/// # Errors
/// Returns `Error::BadRequest` for a blank username and `Error::Conflict` if
/// it is already taken.
pub async fn create_user(db: &DatabaseConnection, username: String) -> Result<user::Model> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::bad_request("Username cannot be empty"));
    }

    user::ActiveModel {
        username: Set(username.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Retrieves a user by ID.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}
