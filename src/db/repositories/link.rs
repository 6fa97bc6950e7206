//! Link repository
//!
//! Database operations for the `links` table (blogroll bookmarks).

use crate::db::repositories::{
    assignments, column_list, mysql_column_list, mysql_id, mysql_insert_id, placeholders,
};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::Link;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COLUMNS: [&str; 13] = [
    "link_id",
    "link_url",
    "link_name",
    "link_image",
    "link_target",
    "link_description",
    "link_visible",
    "link_owner",
    "link_rating",
    "link_updated",
    "link_rel",
    "link_notes",
    "link_rss",
];

const DATE_COLUMNS: [&str; 1] = ["link_updated"];

fn writable() -> &'static [&'static str] {
    &COLUMNS[1..]
}

macro_rules! bind_link_columns {
    ($query:expr, $link:expr) => {
        $query
            .bind(&$link.link_url)
            .bind(&$link.link_name)
            .bind(&$link.link_image)
            .bind(&$link.link_target)
            .bind(&$link.link_description)
            .bind(&$link.link_visible)
            .bind($link.link_owner)
            .bind($link.link_rating)
            .bind($link.link_updated)
            .bind(&$link.link_rel)
            .bind(&$link.link_notes)
            .bind(&$link.link_rss)
    };
}

/// Link repository trait
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn create(&self, link: &Link) -> Result<Link>;

    async fn update(&self, link: &Link) -> Result<Link>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>>;

    /// All links by name
    async fn list(&self) -> Result<Vec<Link>>;

    /// Links with `link_visible = 'Y'`, by name
    async fn list_visible(&self) -> Result<Vec<Link>>;
}

/// SQLx-based link repository implementation
pub struct SqlxLinkRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxLinkRepository {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn LinkRepository> {
        Arc::new(Self::new(pool, tables))
    }

    /// `filter` is a trusted condition without placeholders.
    async fn select(&self, filter: &str, id: Option<i64>) -> Result<Vec<Link>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => select_links_sqlite(pool, &self.tables, filter, id).await,
            Backend::Mysql(pool) => select_links_mysql(pool, &self.tables, filter, id).await,
        }
    }
}

#[async_trait]
impl LinkRepository for SqlxLinkRepository {
    async fn create(&self, link: &Link) -> Result<Link> {
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.tables.links(),
            column_list(writable(), None),
            placeholders(writable().len())
        );
        let link_id = match self.pool.backend() {
            Backend::Sqlite(pool) => bind_link_columns!(sqlx::query(&sql), link)
                .execute(pool)
                .await
                .context("Failed to create link")?
                .last_insert_rowid(),
            Backend::Mysql(pool) => mysql_insert_id(
                bind_link_columns!(sqlx::query(&sql), link)
                    .execute(pool)
                    .await
                    .context("Failed to create link")?
                    .last_insert_id(),
            )?,
        };
        Ok(Link {
            link_id,
            ..link.clone()
        })
    }

    async fn update(&self, link: &Link) -> Result<Link> {
        let sql = format!(
            "UPDATE {} SET {} WHERE link_id = ?",
            self.tables.links(),
            assignments(writable())
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                bind_link_columns!(sqlx::query(&sql), link)
                    .bind(link.link_id)
                    .execute(pool)
                    .await
                    .context("Failed to update link")?;
            }
            Backend::Mysql(pool) => {
                bind_link_columns!(sqlx::query(&sql), link)
                    .bind(link.link_id)
                    .execute(pool)
                    .await
                    .context("Failed to update link")?;
            }
        }
        Ok(link.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE link_id = ?", self.tables.links());
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete link")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete link")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Link>> {
        Ok(self.select("link_id = ?", Some(id)).await?.into_iter().next())
    }

    async fn list(&self) -> Result<Vec<Link>> {
        self.select("1 = 1", None).await
    }

    async fn list_visible(&self) -> Result<Vec<Link>> {
        self.select("link_visible = 'Y'", None).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn select_links_sqlite(
    pool: &SqlitePool,
    tables: &Tables,
    filter: &str,
    id: Option<i64>,
) -> Result<Vec<Link>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY link_name, link_id",
        column_list(&COLUMNS, None),
        tables.links(),
        filter
    );
    let mut query = sqlx::query(&sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query links")?;

    rows.iter().map(row_to_link_sqlite).collect()
}

fn row_to_link_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Link> {
    Ok(Link {
        link_id: row.try_get("link_id")?,
        link_url: row.try_get("link_url")?,
        link_name: row.try_get("link_name")?,
        link_image: row.try_get("link_image")?,
        link_target: row.try_get("link_target")?,
        link_description: row.try_get("link_description")?,
        link_visible: row.try_get("link_visible")?,
        link_owner: row.try_get("link_owner")?,
        link_rating: row.try_get("link_rating")?,
        link_updated: row.try_get("link_updated")?,
        link_rel: row.try_get("link_rel")?,
        link_notes: row.try_get("link_notes")?,
        link_rss: row.try_get("link_rss")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn select_links_mysql(
    pool: &MySqlPool,
    tables: &Tables,
    filter: &str,
    id: Option<i64>,
) -> Result<Vec<Link>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY link_name, link_id",
        mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        tables.links(),
        filter
    );
    let mut query = sqlx::query(&sql);
    if let Some(id) = id {
        query = query.bind(id);
    }
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query links")?;

    rows.iter().map(row_to_link_mysql).collect()
}

fn row_to_link_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Link> {
    Ok(Link {
        link_id: mysql_id(row, "link_id")?,
        link_url: row.try_get("link_url")?,
        link_name: row.try_get("link_name")?,
        link_image: row.try_get("link_image")?,
        link_target: row.try_get("link_target")?,
        link_description: row.try_get("link_description")?,
        link_visible: row.try_get("link_visible")?,
        link_owner: mysql_id(row, "link_owner")?,
        link_rating: row.try_get("link_rating")?,
        link_updated: row.try_get("link_updated")?,
        link_rel: row.try_get("link_rel")?,
        link_notes: row.try_get("link_notes")?,
        link_rss: row.try_get("link_rss")?,
    })
}
