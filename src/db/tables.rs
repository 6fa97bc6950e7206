//! Table naming
//!
//! Every table of an installation shares one prefix (`wp_` by default).
//! A `Tables` value is built once from configuration and handed to each
//! repository, so no table name is ever derived from global state.

use crate::config::{validate_table_prefix, ConfigError};

/// Fully prefixed table names of one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    prefix: String,
    posts: String,
    postmeta: String,
    comments: String,
    users: String,
    usermeta: String,
    terms: String,
    term_taxonomy: String,
    term_relationships: String,
    links: String,
    options: String,
}

impl Tables {
    /// Build the table names for `prefix`.
    ///
    /// The prefix ends up verbatim in SQL text and is rejected unless it
    /// consists of ASCII letters, digits and underscores.
    pub fn new(prefix: &str) -> Result<Self, ConfigError> {
        validate_table_prefix(prefix)?;
        Ok(Self::build(prefix))
    }

    fn build(prefix: &str) -> Self {
        let name = |table: &str| format!("{}{}", prefix, table);
        Self {
            prefix: prefix.to_string(),
            posts: name("posts"),
            postmeta: name("postmeta"),
            comments: name("comments"),
            users: name("users"),
            usermeta: name("usermeta"),
            terms: name("terms"),
            term_taxonomy: name("term_taxonomy"),
            term_relationships: name("term_relationships"),
            links: name("links"),
            options: name("options"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn posts(&self) -> &str {
        &self.posts
    }

    pub fn postmeta(&self) -> &str {
        &self.postmeta
    }

    pub fn comments(&self) -> &str {
        &self.comments
    }

    pub fn users(&self) -> &str {
        &self.users
    }

    pub fn usermeta(&self) -> &str {
        &self.usermeta
    }

    pub fn terms(&self) -> &str {
        &self.terms
    }

    pub fn term_taxonomy(&self) -> &str {
        &self.term_taxonomy
    }

    pub fn term_relationships(&self) -> &str {
        &self.term_relationships
    }

    pub fn links(&self) -> &str {
        &self.links
    }

    pub fn options(&self) -> &str {
        &self.options
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::build("wp_")
    }
}
