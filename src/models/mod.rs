//! Data models
//!
//! One record type per platform table. Field names follow the column names;
//! where the platform spells a column in mixed case (`ID`, `comment_ID`,
//! `comment_post_ID`, `comment_author_IP`) serde keeps the exact spelling.

mod comment;
mod link;
mod meta;
mod option;
mod post;
mod term;
mod user;

pub use comment::{comment_approval, Comment};
pub use link::Link;
pub use meta::{PostMeta, UserMeta};
pub use option::SiteOption;
pub(crate) use post::QueryValue;
pub use post::{comment_status, post_status, post_type, Post, PostOrder, PostQuery};
pub use term::{taxonomy, Term, TermRelationship, TermTaxonomy};
pub use user::User;
