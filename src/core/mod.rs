//! Core business logic - framework-agnostic catalog operations.
//!
//! Every function takes a `SeaORM` connection and returns [`crate::errors::Result`];
//! the HTTP layer only translates requests into these calls.

/// Categories, subcategories, origins, tags and the category counter
pub mod catalog;
/// Product comments
pub mod comment;
/// Product lifecycle and queries
pub mod product;
/// Comment authors
pub mod user;
