//! Metadata repository
//!
//! `postmeta` and `usermeta` share one shape (identity, owner, key, value)
//! and differ only in table and column names. [`MetaRecord`] names those;
//! [`SqlxMetaRepository`] implements the queries once for both.

use crate::db::repositories::{mysql_id, mysql_insert_id};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::{PostMeta, UserMeta};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::marker::PhantomData;
use std::sync::Arc;

/// A key/value row owned by another record.
pub trait MetaRecord: Clone + Send + Sync + 'static {
    /// Name used in error context
    const ENTITY: &'static str;
    /// Identity column (`meta_id`, `umeta_id`)
    const ID_COLUMN: &'static str;
    /// Owner column (`post_id`, `user_id`)
    const OWNER_COLUMN: &'static str;

    fn table(tables: &Tables) -> &str;

    fn from_parts(
        id: i64,
        owner_id: i64,
        meta_key: Option<String>,
        meta_value: Option<String>,
    ) -> Self;

    fn id(&self) -> i64;
    fn owner_id(&self) -> i64;
    fn meta_key(&self) -> Option<&str>;
    fn meta_value(&self) -> Option<&str>;
}

impl MetaRecord for PostMeta {
    const ENTITY: &'static str = "post meta";
    const ID_COLUMN: &'static str = "meta_id";
    const OWNER_COLUMN: &'static str = "post_id";

    fn table(tables: &Tables) -> &str {
        tables.postmeta()
    }

    fn from_parts(
        meta_id: i64,
        post_id: i64,
        meta_key: Option<String>,
        meta_value: Option<String>,
    ) -> Self {
        Self {
            meta_id,
            post_id,
            meta_key,
            meta_value,
        }
    }

    fn id(&self) -> i64 {
        self.meta_id
    }

    fn owner_id(&self) -> i64 {
        self.post_id
    }

    fn meta_key(&self) -> Option<&str> {
        self.meta_key.as_deref()
    }

    fn meta_value(&self) -> Option<&str> {
        self.meta_value.as_deref()
    }
}

impl MetaRecord for UserMeta {
    const ENTITY: &'static str = "user meta";
    const ID_COLUMN: &'static str = "umeta_id";
    const OWNER_COLUMN: &'static str = "user_id";

    fn table(tables: &Tables) -> &str {
        tables.usermeta()
    }

    fn from_parts(
        umeta_id: i64,
        user_id: i64,
        meta_key: Option<String>,
        meta_value: Option<String>,
    ) -> Self {
        Self {
            umeta_id,
            user_id,
            meta_key,
            meta_value,
        }
    }

    fn id(&self) -> i64 {
        self.umeta_id
    }

    fn owner_id(&self) -> i64 {
        self.user_id
    }

    fn meta_key(&self) -> Option<&str> {
        self.meta_key.as_deref()
    }

    fn meta_value(&self) -> Option<&str> {
        self.meta_value.as_deref()
    }
}

/// Metadata repository trait
#[async_trait]
pub trait MetaRepository<M: MetaRecord>: Send + Sync {
    /// Attach a key/value pair to `owner_id`
    async fn create(&self, owner_id: i64, key: &str, value: &str) -> Result<M>;

    async fn get_by_id(&self, id: i64) -> Result<Option<M>>;

    /// Every row of an owner, in insertion order
    async fn list_for(&self, owner_id: i64) -> Result<Vec<M>>;

    /// First row of an owner with this key (keys may repeat)
    async fn find(&self, owner_id: i64, key: &str) -> Result<Option<M>>;

    /// Write owner, key and value of an existing row
    async fn update(&self, meta: &M) -> Result<M>;

    async fn delete(&self, id: i64) -> Result<bool>;

    /// Remove every row of an owner; returns how many were removed
    async fn delete_for(&self, owner_id: i64) -> Result<u64>;
}

/// SQLx-based metadata repository implementation
pub struct SqlxMetaRepository<M> {
    pool: DynDatabasePool,
    tables: Tables,
    record: PhantomData<fn() -> M>,
}

impl<M: MetaRecord> SqlxMetaRepository<M> {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self {
            pool,
            tables,
            record: PhantomData,
        }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn MetaRepository<M>> {
        Arc::new(Self::new(pool, tables))
    }

    fn select_sql(&self, filter: &str) -> String {
        format!(
            "SELECT {}, {}, meta_key, meta_value FROM {} WHERE {} ORDER BY {}",
            M::ID_COLUMN,
            M::OWNER_COLUMN,
            M::table(&self.tables),
            filter,
            M::ID_COLUMN
        )
    }

    /// Run a select with one id placeholder and, when `key` is given, a
    /// `meta_key` placeholder after it.
    async fn fetch(&self, sql: &str, first: i64, key: Option<&str>) -> Result<Vec<M>> {
        let context = || format!("Failed to query {}", M::ENTITY);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let query = sqlx::query(sql).bind(first);
                let query = match key {
                    Some(key) => query.bind(key),
                    None => query,
                };
                let rows = query
                    .fetch_all(pool)
                    .await
                    .with_context(context)?;
                rows.iter().map(row_to_meta_sqlite::<M>).collect()
            }
            Backend::Mysql(pool) => {
                let query = sqlx::query(sql).bind(first);
                let query = match key {
                    Some(key) => query.bind(key),
                    None => query,
                };
                let rows = query
                    .fetch_all(pool)
                    .await
                    .with_context(context)?;
                rows.iter().map(row_to_meta_mysql::<M>).collect()
            }
        }
    }

    async fn delete_where(&self, sql: &str, id: i64) -> Result<u64> {
        let context = || format!("Failed to delete {}", M::ENTITY);
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .with_context(context)?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .with_context(context)?
                .rows_affected(),
        };
        Ok(affected)
    }
}

#[async_trait]
impl<M: MetaRecord> MetaRepository<M> for SqlxMetaRepository<M> {
    async fn create(&self, owner_id: i64, key: &str, value: &str) -> Result<M> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                create_meta_sqlite::<M>(pool, &self.tables, owner_id, key, value).await
            }
            Backend::Mysql(pool) => {
                create_meta_mysql::<M>(pool, &self.tables, owner_id, key, value).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<M>> {
        let sql = self.select_sql(&format!("{} = ?", M::ID_COLUMN));
        Ok(self.fetch(&sql, id, None).await?.into_iter().next())
    }

    async fn list_for(&self, owner_id: i64) -> Result<Vec<M>> {
        let sql = self.select_sql(&format!("{} = ?", M::OWNER_COLUMN));
        self.fetch(&sql, owner_id, None).await
    }

    async fn find(&self, owner_id: i64, key: &str) -> Result<Option<M>> {
        let sql = self.select_sql(&format!("{} = ? AND meta_key = ?", M::OWNER_COLUMN));
        Ok(self.fetch(&sql, owner_id, Some(key)).await?.into_iter().next())
    }

    async fn update(&self, meta: &M) -> Result<M> {
        let sql = format!(
            "UPDATE {} SET {} = ?, meta_key = ?, meta_value = ? WHERE {} = ?",
            M::table(&self.tables),
            M::OWNER_COLUMN,
            M::ID_COLUMN
        );
        let context = || format!("Failed to update {}", M::ENTITY);
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(&sql)
                    .bind(meta.owner_id())
                    .bind(meta.meta_key())
                    .bind(meta.meta_value())
                    .bind(meta.id())
                    .execute(pool)
                    .await
                    .with_context(context)?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(&sql)
                    .bind(meta.owner_id())
                    .bind(meta.meta_key())
                    .bind(meta.meta_value())
                    .bind(meta.id())
                    .execute(pool)
                    .await
                    .with_context(context)?;
            }
        }
        Ok(meta.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            M::table(&self.tables),
            M::ID_COLUMN
        );
        Ok(self.delete_where(&sql, id).await? > 0)
    }

    async fn delete_for(&self, owner_id: i64) -> Result<u64> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?",
            M::table(&self.tables),
            M::OWNER_COLUMN
        );
        self.delete_where(&sql, owner_id).await
    }
}

fn insert_sql<M: MetaRecord>(tables: &Tables) -> String {
    format!(
        "INSERT INTO {} ({}, meta_key, meta_value) VALUES (?, ?, ?)",
        M::table(tables),
        M::OWNER_COLUMN
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_meta_sqlite<M: MetaRecord>(
    pool: &SqlitePool,
    tables: &Tables,
    owner_id: i64,
    key: &str,
    value: &str,
) -> Result<M> {
    let result = sqlx::query(&insert_sql::<M>(tables))
        .bind(owner_id)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {}", M::ENTITY))?;

    Ok(M::from_parts(
        result.last_insert_rowid(),
        owner_id,
        Some(key.to_string()),
        Some(value.to_string()),
    ))
}

fn row_to_meta_sqlite<M: MetaRecord>(row: &sqlx::sqlite::SqliteRow) -> Result<M> {
    Ok(M::from_parts(
        row.try_get(M::ID_COLUMN)?,
        row.try_get(M::OWNER_COLUMN)?,
        row.try_get("meta_key")?,
        row.try_get("meta_value")?,
    ))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_meta_mysql<M: MetaRecord>(
    pool: &MySqlPool,
    tables: &Tables,
    owner_id: i64,
    key: &str,
    value: &str,
) -> Result<M> {
    let result = sqlx::query(&insert_sql::<M>(tables))
        .bind(owner_id)
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create {}", M::ENTITY))?;

    Ok(M::from_parts(
        mysql_insert_id(result.last_insert_id())?,
        owner_id,
        Some(key.to_string()),
        Some(value.to_string()),
    ))
}

fn row_to_meta_mysql<M: MetaRecord>(row: &sqlx::mysql::MySqlRow) -> Result<M> {
    Ok(M::from_parts(
        mysql_id(row, M::ID_COLUMN)?,
        mysql_id(row, M::OWNER_COLUMN)?,
        row.try_get("meta_key")?,
        row.try_get("meta_value")?,
    ))
}
