//! Entity module - Contains all SeaORM entity definitions for the catalog.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod comment;
pub mod origin;
pub mod product;
pub mod product_tag;
pub mod subcategory;
pub mod tag;
pub mod user;

// Re-export specific types to avoid conflicts
pub use category::{Column as CategoryColumn, Entity as Category, Model as CategoryModel};
pub use comment::{Column as CommentColumn, Entity as Comment, Model as CommentModel};
pub use origin::{Column as OriginColumn, Entity as Origin, Model as OriginModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_tag::{
    Column as ProductTagColumn, Entity as ProductTag, Model as ProductTagModel,
};
pub use subcategory::{
    Column as SubCategoryColumn, Entity as SubCategory, Model as SubCategoryModel,
};
pub use tag::{Column as TagColumn, Entity as Tag, Model as TagModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
