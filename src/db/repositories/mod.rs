//! Database repositories
//!
//! One repository per platform table. Each is a trait plus an
//! `Sqlx*Repository` built from a pool and the installation's [`Tables`],
//! with separate SQLite and MySQL implementations behind it.
//!
//! [`Tables`]: crate::db::Tables

pub mod comment;
pub mod link;
pub mod meta;
pub mod option;
pub mod post;
pub mod term;
pub mod user;

pub use comment::{CommentRepository, SqlxCommentRepository};
pub use link::{LinkRepository, SqlxLinkRepository};
pub use meta::{MetaRecord, MetaRepository, SqlxMetaRepository};
pub use option::{OptionRepository, SqlxOptionRepository};
pub use post::{PostRepository, SqlxPostRepository};
pub use term::{
    SqlxTermRelationshipRepository, SqlxTermRepository, SqlxTermTaxonomyRepository,
    TermRelationshipRepository, TermRepository, TermTaxonomyRepository,
};
pub use user::{SqlxUserRepository, UserRepository};

use anyhow::{Context, Result};
use sqlx::mysql::MySqlRow;
use sqlx::Row;

/// MySQL stores "no value yet" in NOT NULL datetime columns as a zero date,
/// which does not decode into a chrono type.
const ZERO_DATETIME: &str = "0000-00-00 00:00:00";

/// Comma-separated `columns`, qualified with `alias` when given.
pub(crate) fn column_list(columns: &[&str], alias: Option<&str>) -> String {
    columns
        .iter()
        .map(|column| qualify(column, alias))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Like [`column_list`], but selects zero dates in `dates` as NULL.
pub(crate) fn mysql_column_list(columns: &[&str], dates: &[&str], alias: Option<&str>) -> String {
    columns
        .iter()
        .map(|column| {
            let qualified = qualify(column, alias);
            if dates.contains(column) {
                format!("NULLIF({}, '{}') AS {}", qualified, ZERO_DATETIME, column)
            } else {
                qualified
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn qualify(column: &str, alias: Option<&str>) -> String {
    match alias {
        Some(alias) => format!("{}.{}", alias, column),
        None => column.to_string(),
    }
}

/// `?, ?, ...` for `count` parameters.
pub(crate) fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `a = ?, b = ?, ...` for an UPDATE statement.
pub(crate) fn assignments(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|column| format!("{} = ?", column))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convert the unsigned id MySQL reports for an insert.
pub(crate) fn mysql_insert_id(id: u64) -> Result<i64> {
    i64::try_from(id).with_context(|| format!("Inserted id out of range: {}", id))
}

/// Decode a `BIGINT UNSIGNED` column.
pub(crate) fn mysql_id(row: &MySqlRow, column: &str) -> Result<i64> {
    let value: u64 = row
        .try_get(column)
        .with_context(|| format!("Failed to read column {}", column))?;
    i64::try_from(value).with_context(|| format!("Column {} out of range: {}", column, value))
}
