//! Option repository
//!
//! Repository for the installation's site options (`options` table).
//! `option_name` is unique, so [`OptionRepository::set`] is an upsert.

use crate::db::repositories::{mysql_id, mysql_insert_id};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::{QueryValue, SiteOption};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Repository trait for site options
#[async_trait]
pub trait OptionRepository: Send + Sync {
    async fn create(&self, option: &SiteOption) -> Result<SiteOption>;

    async fn update(&self, option: &SiteOption) -> Result<SiteOption>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn get_by_id(&self, id: i64) -> Result<Option<SiteOption>>;

    /// Get an option by its unique name
    async fn get_by_name(&self, name: &str) -> Result<Option<SiteOption>>;

    /// Options the platform preloads (`autoload = 'yes'`), by name
    async fn list_autoload(&self) -> Result<Vec<SiteOption>>;

    /// Insert the option, or overwrite the value of an existing one
    async fn set(&self, name: &str, value: &str) -> Result<SiteOption>;
}

/// SQLx-based option repository
pub struct SqlxOptionRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxOptionRepository {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn OptionRepository> {
        Arc::new(Self::new(pool, tables))
    }

    async fn select(&self, filter: &str, value: Option<QueryValue<'_>>) -> Result<Vec<SiteOption>> {
        let sql = format!(
            "SELECT option_id, option_name, option_value, autoload FROM {} WHERE {} ORDER BY option_name",
            self.tables.options(),
            filter
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => select_options_sqlite(pool, &sql, value).await,
            Backend::Mysql(pool) => select_options_mysql(pool, &sql, value).await,
        }
    }
}

#[async_trait]
impl OptionRepository for SqlxOptionRepository {
    async fn create(&self, option: &SiteOption) -> Result<SiteOption> {
        let option_id = match self.pool.backend() {
            Backend::Sqlite(pool) => create_option_sqlite(pool, &self.tables, option).await?,
            Backend::Mysql(pool) => create_option_mysql(pool, &self.tables, option).await?,
        };
        Ok(SiteOption {
            option_id,
            ..option.clone()
        })
    }

    async fn update(&self, option: &SiteOption) -> Result<SiteOption> {
        let sql = format!(
            "UPDATE {} SET option_name = ?, option_value = ?, autoload = ? WHERE option_id = ?",
            self.tables.options()
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(&sql)
                    .bind(&option.option_name)
                    .bind(&option.option_value)
                    .bind(&option.autoload)
                    .bind(option.option_id)
                    .execute(pool)
                    .await
                    .context("Failed to update option")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(&sql)
                    .bind(&option.option_name)
                    .bind(&option.option_value)
                    .bind(&option.autoload)
                    .bind(option.option_id)
                    .execute(pool)
                    .await
                    .context("Failed to update option")?;
            }
        }
        Ok(option.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE option_id = ?", self.tables.options());
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete option")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete option")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<SiteOption>> {
        let options = self.select("option_id = ?", Some(QueryValue::Int(id))).await?;
        Ok(options.into_iter().next())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<SiteOption>> {
        let options = self.select("option_name = ?", Some(QueryValue::Text(name))).await?;
        Ok(options.into_iter().next())
    }

    async fn list_autoload(&self) -> Result<Vec<SiteOption>> {
        self.select("autoload = 'yes'", None).await
    }

    async fn set(&self, name: &str, value: &str) -> Result<SiteOption> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => set_option_sqlite(pool, &self.tables, name, value).await?,
            Backend::Mysql(pool) => set_option_mysql(pool, &self.tables, name, value).await?,
        }
        self.get_by_name(name)
            .await?
            .ok_or_else(|| anyhow!("Option {} missing after write", name))
    }
}

// SQLite implementations
async fn create_option_sqlite(pool: &SqlitePool, tables: &Tables, option: &SiteOption) -> Result<i64> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (option_name, option_value, autoload) VALUES (?, ?, ?)",
        tables.options()
    ))
    .bind(&option.option_name)
    .bind(&option.option_value)
    .bind(&option.autoload)
    .execute(pool)
    .await
    .context("Failed to create option")?;
    Ok(result.last_insert_rowid())
}

async fn set_option_sqlite(pool: &SqlitePool, tables: &Tables, name: &str, value: &str) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (option_name, option_value, autoload) VALUES (?, ?, 'yes')
         ON CONFLICT(option_name) DO UPDATE SET option_value = excluded.option_value",
        tables.options()
    ))
    .bind(name)
    .bind(value)
    .execute(pool)
    .await
    .context("Failed to set option")?;
    Ok(())
}

async fn select_options_sqlite(
    pool: &SqlitePool,
    sql: &str,
    value: Option<QueryValue<'_>>,
) -> Result<Vec<SiteOption>> {
    let query = sqlx::query(sql);
    let query = match value {
        Some(QueryValue::Text(text)) => query.bind(text),
        Some(QueryValue::Int(int)) => query.bind(int),
        None => query,
    };
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query options")?;

    rows.iter()
        .map(|r| -> Result<SiteOption> {
            Ok(SiteOption {
                option_id: r.try_get("option_id")?,
                option_name: r.try_get("option_name")?,
                option_value: r.try_get("option_value")?,
                autoload: r.try_get("autoload")?,
            })
        })
        .collect()
}

// MySQL implementations
async fn create_option_mysql(pool: &MySqlPool, tables: &Tables, option: &SiteOption) -> Result<i64> {
    let result = sqlx::query(&format!(
        "INSERT INTO {} (option_name, option_value, autoload) VALUES (?, ?, ?)",
        tables.options()
    ))
    .bind(&option.option_name)
    .bind(&option.option_value)
    .bind(&option.autoload)
    .execute(pool)
    .await
    .context("Failed to create option")?;
    mysql_insert_id(result.last_insert_id())
}

async fn set_option_mysql(pool: &MySqlPool, tables: &Tables, name: &str, value: &str) -> Result<()> {
    sqlx::query(&format!(
        "INSERT INTO {} (option_name, option_value, autoload) VALUES (?, ?, 'yes')
         ON DUPLICATE KEY UPDATE option_value = VALUES(option_value)",
        tables.options()
    ))
    .bind(name)
    .bind(value)
    .execute(pool)
    .await
    .context("Failed to set option")?;
    Ok(())
}

async fn select_options_mysql(
    pool: &MySqlPool,
    sql: &str,
    value: Option<QueryValue<'_>>,
) -> Result<Vec<SiteOption>> {
    let query = sqlx::query(sql);
    let query = match value {
        Some(QueryValue::Text(text)) => query.bind(text),
        Some(QueryValue::Int(int)) => query.bind(int),
        None => query,
    };
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to query options")?;

    rows.iter()
        .map(|r| -> Result<SiteOption> {
            Ok(SiteOption {
                option_id: mysql_id(r, "option_id")?,
                option_name: r.try_get("option_name")?,
                option_value: r.try_get("option_value")?,
                autoload: r.try_get("autoload")?,
            })
        })
        .collect()
}
