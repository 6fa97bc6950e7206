//! User repository
//!
//! Database operations for the `users` table.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL
//!
//! The platform enforces login and email uniqueness in application code, not
//! with indexes; `login_taken` / `email_taken` are the queries behind it.

use crate::db::repositories::{
    assignments, column_list, mysql_column_list, mysql_id, mysql_insert_id, placeholders,
};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::{QueryValue, User};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COLUMNS: [&str; 10] = [
    "ID",
    "user_login",
    "user_pass",
    "user_nicename",
    "user_email",
    "user_url",
    "user_registered",
    "user_activation_key",
    "user_status",
    "display_name",
];

const DATE_COLUMNS: [&str; 1] = ["user_registered"];

fn writable() -> &'static [&'static str] {
    &COLUMNS[1..]
}

macro_rules! bind_user_columns {
    ($query:expr, $user:expr) => {
        $query
            .bind(&$user.user_login)
            .bind(&$user.user_pass)
            .bind(&$user.user_nicename)
            .bind(&$user.user_email)
            .bind(&$user.user_url)
            .bind($user.user_registered)
            .bind(&$user.user_activation_key)
            .bind($user.user_status)
            .bind(&$user.display_name)
    };
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, user: &User) -> Result<User>;

    /// Update a user
    async fn update(&self, user: &User) -> Result<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by login name
    async fn get_by_login(&self, login: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Whether a user other than `excluding` has this login, ignoring case
    async fn login_taken(&self, login: &str, excluding: i64) -> Result<bool>;

    /// Whether a user other than `excluding` has this email, ignoring case
    async fn email_taken(&self, email: &str, excluding: i64) -> Result<bool>;

    /// List all users by ID
    async fn list(&self) -> Result<Vec<User>>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool, tables))
    }

    async fn get_by(&self, column: &str, value: QueryValue<'_>) -> Result<Option<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_user_by_sqlite(pool, &self.tables, column, value).await,
            Backend::Mysql(pool) => get_user_by_mysql(pool, &self.tables, column, value).await,
        }
    }

    /// Compared through `LOWER` so SQLite agrees with MySQL's
    /// case-insensitive collation.
    async fn taken(&self, column: &str, value: &str, excluding: i64) -> Result<bool> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE LOWER({}) = LOWER(?) AND ID <> ?",
            self.tables.users(),
            column
        );
        let count: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query_scalar::<_, i64>(&sql)
                .bind(value)
                .bind(excluding)
                .fetch_one(pool)
                .await
                .with_context(|| format!("Failed to check {} uniqueness", column))?,
            Backend::Mysql(pool) => sqlx::query_scalar::<_, i64>(&sql)
                .bind(value)
                .bind(excluding)
                .fetch_one(pool)
                .await
                .with_context(|| format!("Failed to check {} uniqueness", column))?,
        };
        Ok(count > 0)
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_user_sqlite(pool, &self.tables, user).await,
            Backend::Mysql(pool) => create_user_mysql(pool, &self.tables, user).await,
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        let sql = format!(
            "UPDATE {} SET {} WHERE ID = ?",
            self.tables.users(),
            assignments(writable())
        );
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                bind_user_columns!(sqlx::query(&sql), user)
                    .bind(user.id)
                    .execute(pool)
                    .await
                    .context("Failed to update user")?;
            }
            Backend::Mysql(pool) => {
                bind_user_columns!(sqlx::query(&sql), user)
                    .bind(user.id)
                    .execute(pool)
                    .await
                    .context("Failed to update user")?;
            }
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE ID = ?", self.tables.users());
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete user")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete user")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_by("ID", QueryValue::Int(id)).await
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<User>> {
        self.get_by("user_login", QueryValue::Text(login)).await
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_by("user_email", QueryValue::Text(email)).await
    }

    async fn login_taken(&self, login: &str, excluding: i64) -> Result<bool> {
        self.taken("user_login", login, excluding).await
    }

    async fn email_taken(&self, email: &str, excluding: i64) -> Result<bool> {
        self.taken("user_email", email, excluding).await
    }

    async fn list(&self) -> Result<Vec<User>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_users_sqlite(pool, &self.tables).await,
            Backend::Mysql(pool) => list_users_mysql(pool, &self.tables).await,
        }
    }
}

fn insert_sql(tables: &Tables) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        tables.users(),
        column_list(writable(), None),
        placeholders(writable().len())
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, tables: &Tables, user: &User) -> Result<User> {
    let sql = insert_sql(tables);
    let result = bind_user_columns!(sqlx::query(&sql), user)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: result.last_insert_rowid(),
        ..user.clone()
    })
}

/// `column` is a trusted column name.
async fn get_user_by_sqlite(
    pool: &SqlitePool,
    tables: &Tables,
    column: &str,
    value: QueryValue<'_>,
) -> Result<Option<User>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ? ORDER BY ID LIMIT 1",
        column_list(&COLUMNS, None),
        tables.users(),
        column
    );
    let query = sqlx::query(&sql);
    let query = match value {
        QueryValue::Text(text) => query.bind(text),
        QueryValue::Int(int) => query.bind(int),
    };
    let row = query
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_users_sqlite(pool: &SqlitePool, tables: &Tables) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY ID",
        column_list(&COLUMNS, None),
        tables.users()
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_sqlite).collect()
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("ID")?,
        user_login: row.try_get("user_login")?,
        user_pass: row.try_get("user_pass")?,
        user_nicename: row.try_get("user_nicename")?,
        user_email: row.try_get("user_email")?,
        user_url: row.try_get("user_url")?,
        user_registered: row.try_get("user_registered")?,
        user_activation_key: row.try_get("user_activation_key")?,
        user_status: row.try_get("user_status")?,
        display_name: row.try_get("display_name")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, tables: &Tables, user: &User) -> Result<User> {
    let sql = insert_sql(tables);
    let result = bind_user_columns!(sqlx::query(&sql), user)
        .execute(pool)
        .await
        .context("Failed to create user")?;

    Ok(User {
        id: mysql_insert_id(result.last_insert_id())?,
        ..user.clone()
    })
}

async fn get_user_by_mysql(
    pool: &MySqlPool,
    tables: &Tables,
    column: &str,
    value: QueryValue<'_>,
) -> Result<Option<User>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {} = ? ORDER BY ID LIMIT 1",
        mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        tables.users(),
        column
    );
    let query = sqlx::query(&sql);
    let query = match value {
        QueryValue::Text(text) => query.bind(text),
        QueryValue::Int(int) => query.bind(int),
    };
    let row = query
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get user by {}", column))?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_users_mysql(pool: &MySqlPool, tables: &Tables) -> Result<Vec<User>> {
    let sql = format!(
        "SELECT {} FROM {} ORDER BY ID",
        mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        tables.users()
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list users")?;

    rows.iter().map(row_to_user_mysql).collect()
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    Ok(User {
        id: mysql_id(row, "ID")?,
        user_login: row.try_get("user_login")?,
        user_pass: row.try_get("user_pass")?,
        user_nicename: row.try_get("user_nicename")?,
        user_email: row.try_get("user_email")?,
        user_url: row.try_get("user_url")?,
        user_registered: row.try_get("user_registered")?,
        user_activation_key: row.try_get("user_activation_key")?,
        user_status: row.try_get("user_status")?,
        display_name: row.try_get("display_name")?,
    })
}
