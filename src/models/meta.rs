//! Metadata models
//!
//! Free-form key/value rows attached to a post (`postmeta`) or a user
//! (`usermeta`). Both columns are nullable in the platform schema.

use serde::{Deserialize, Serialize};

/// A row of the `postmeta` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMeta {
    pub meta_id: i64,
    /// Owning post (`posts.ID`)
    pub post_id: i64,
    pub meta_key: Option<String>,
    pub meta_value: Option<String>,
}

/// A row of the `usermeta` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMeta {
    pub umeta_id: i64,
    /// Owning user (`users.ID`)
    pub user_id: i64,
    pub meta_key: Option<String>,
    pub meta_value: Option<String>,
}
