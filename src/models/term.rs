//! Term and taxonomy models
//!
//! Classification on the platform takes three tables:
//! - `terms` holds the label itself ("ruby")
//! - `term_taxonomy` places a term in a taxonomy ("post_tag", "category")
//! - `term_relationships` links a content row to a taxonomy entry
//!
//! A post's tags are therefore reached as
//! post -> term_relationships -> term_taxonomy -> terms.

use serde::{Deserialize, Serialize};

/// Built-in taxonomy names.
pub mod taxonomy {
    pub const CATEGORY: &str = "category";
    pub const POST_TAG: &str = "post_tag";
    pub const LINK_CATEGORY: &str = "link_category";
}

/// A row of the `terms` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term_id: i64,
    pub name: String,
    pub slug: String,
    pub term_group: i64,
}

impl Term {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            term_id: 0,
            name: name.into(),
            slug: slug.into(),
            term_group: 0,
        }
    }
}

/// A row of the `term_taxonomy` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermTaxonomy {
    pub term_taxonomy_id: i64,
    /// Labelled term (`terms.term_id`)
    pub term_id: i64,
    pub taxonomy: String,
    pub description: String,
    /// Parent entry in hierarchical taxonomies, 0 at the root
    pub parent: i64,
    /// Cached number of objects in this entry, maintained by the platform
    pub count: i64,
}

impl TermTaxonomy {
    pub fn new(term_id: i64, taxonomy: impl Into<String>) -> Self {
        Self {
            term_taxonomy_id: 0,
            term_id,
            taxonomy: taxonomy.into(),
            description: String::new(),
            parent: 0,
            count: 0,
        }
    }
}

/// A row of the `term_relationships` join table.
///
/// Identified by the (`object_id`, `term_taxonomy_id`) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRelationship {
    /// Classified row, normally `posts.ID`
    pub object_id: i64,
    pub term_taxonomy_id: i64,
    pub term_order: i32,
}
