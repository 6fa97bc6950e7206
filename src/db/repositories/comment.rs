//! Comment repository
//!
//! Database operations for the `comments` table.
//!
//! This module provides:
//! - `CommentRepository` trait defining the interface for comment data access
//! - `SqlxCommentRepository` implementing the trait for SQLite and MySQL

use crate::db::repositories::{
    assignments, column_list, mysql_column_list, mysql_id, mysql_insert_id, placeholders,
};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::{Comment, QueryValue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COLUMNS: [&str; 15] = [
    "comment_ID",
    "comment_post_ID",
    "comment_author",
    "comment_author_email",
    "comment_author_url",
    "comment_author_IP",
    "comment_date",
    "comment_date_gmt",
    "comment_content",
    "comment_karma",
    "comment_approved",
    "comment_agent",
    "comment_type",
    "comment_parent",
    "user_id",
];

const DATE_COLUMNS: [&str; 2] = ["comment_date", "comment_date_gmt"];

fn writable() -> &'static [&'static str] {
    &COLUMNS[1..]
}

macro_rules! bind_comment_columns {
    ($query:expr, $comment:expr) => {
        $query
            .bind($comment.comment_post_id)
            .bind(&$comment.comment_author)
            .bind(&$comment.comment_author_email)
            .bind(&$comment.comment_author_url)
            .bind(&$comment.comment_author_ip)
            .bind($comment.comment_date)
            .bind($comment.comment_date_gmt)
            .bind(&$comment.comment_content)
            .bind($comment.comment_karma)
            .bind(&$comment.comment_approved)
            .bind(&$comment.comment_agent)
            .bind(&$comment.comment_type)
            .bind($comment.comment_parent)
            .bind($comment.user_id)
    };
}

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Insert a comment; returns it with its new `comment_ID`
    async fn create(&self, comment: &Comment) -> Result<Comment>;

    /// Write every column of an existing comment
    async fn update(&self, comment: &Comment) -> Result<Comment>;

    /// Delete a comment
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Get comment by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>>;

    /// Comments of a post, oldest first
    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    /// Comments with the given `comment_approved` value, newest first
    async fn list_by_approval(&self, approved: &str) -> Result<Vec<Comment>>;
}

/// SQLx-based comment repository implementation
pub struct SqlxCommentRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxCommentRepository {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn CommentRepository> {
        Arc::new(Self::new(pool, tables))
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_comment_sqlite(pool, &self.tables, comment).await,
            Backend::Mysql(pool) => create_comment_mysql(pool, &self.tables, comment).await,
        }
    }

    async fn update(&self, comment: &Comment) -> Result<Comment> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_comment_sqlite(pool, &self.tables, comment).await,
            Backend::Mysql(pool) => update_comment_mysql(pool, &self.tables, comment).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE comment_ID = ?", self.tables.comments());
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete comment")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Comment>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_comment_by_id_sqlite(pool, &self.tables, id).await,
            Backend::Mysql(pool) => get_comment_by_id_mysql(pool, &self.tables, id).await,
        }
    }

    async fn list_by_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let filter = "comment_post_ID = ? ORDER BY comment_date ASC, comment_ID ASC";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                list_comments_sqlite(pool, &self.tables, filter, QueryValue::Int(post_id)).await
            }
            Backend::Mysql(pool) => {
                list_comments_mysql(pool, &self.tables, filter, QueryValue::Int(post_id)).await
            }
        }
    }

    async fn list_by_approval(&self, approved: &str) -> Result<Vec<Comment>> {
        let filter = "comment_approved = ? ORDER BY comment_date DESC, comment_ID DESC";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                list_comments_sqlite(pool, &self.tables, filter, QueryValue::Text(approved)).await
            }
            Backend::Mysql(pool) => {
                list_comments_mysql(pool, &self.tables, filter, QueryValue::Text(approved)).await
            }
        }
    }
}

fn insert_sql(tables: &Tables) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        tables.comments(),
        column_list(writable(), None),
        placeholders(writable().len())
    )
}

fn update_sql(tables: &Tables) -> String {
    format!(
        "UPDATE {} SET {} WHERE comment_ID = ?",
        tables.comments(),
        assignments(writable())
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_comment_sqlite(
    pool: &SqlitePool,
    tables: &Tables,
    comment: &Comment,
) -> Result<Comment> {
    let sql = insert_sql(tables);
    let result = bind_comment_columns!(sqlx::query(&sql), comment)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: result.last_insert_rowid(),
        ..comment.clone()
    })
}

async fn update_comment_sqlite(
    pool: &SqlitePool,
    tables: &Tables,
    comment: &Comment,
) -> Result<Comment> {
    let sql = update_sql(tables);
    bind_comment_columns!(sqlx::query(&sql), comment)
        .bind(comment.id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(comment.clone())
}

async fn get_comment_by_id_sqlite(
    pool: &SqlitePool,
    tables: &Tables,
    id: i64,
) -> Result<Option<Comment>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE comment_ID = ?",
        column_list(&COLUMNS, None),
        tables.comments()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_comment_sqlite(&row)?)),
        None => Ok(None),
    }
}

/// `filter` is a trusted `WHERE` tail with exactly one placeholder.
async fn list_comments_sqlite(
    pool: &SqlitePool,
    tables: &Tables,
    filter: &str,
    value: QueryValue<'_>,
) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        column_list(&COLUMNS, None),
        tables.comments(),
        filter
    );
    let query = sqlx::query(&sql);
    let query = match value {
        QueryValue::Text(text) => query.bind(text),
        QueryValue::Int(int) => query.bind(int),
    };
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    rows.iter().map(row_to_comment_sqlite).collect()
}

fn row_to_comment_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("comment_ID")?,
        comment_post_id: row.try_get("comment_post_ID")?,
        comment_author: row.try_get("comment_author")?,
        comment_author_email: row.try_get("comment_author_email")?,
        comment_author_url: row.try_get("comment_author_url")?,
        comment_author_ip: row.try_get("comment_author_IP")?,
        comment_date: row.try_get("comment_date")?,
        comment_date_gmt: row.try_get("comment_date_gmt")?,
        comment_content: row.try_get("comment_content")?,
        comment_karma: row.try_get("comment_karma")?,
        comment_approved: row.try_get("comment_approved")?,
        comment_agent: row.try_get("comment_agent")?,
        comment_type: row.try_get("comment_type")?,
        comment_parent: row.try_get("comment_parent")?,
        user_id: row.try_get("user_id")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_comment_mysql(
    pool: &MySqlPool,
    tables: &Tables,
    comment: &Comment,
) -> Result<Comment> {
    let sql = insert_sql(tables);
    let result = bind_comment_columns!(sqlx::query(&sql), comment)
        .execute(pool)
        .await
        .context("Failed to create comment")?;

    Ok(Comment {
        id: mysql_insert_id(result.last_insert_id())?,
        ..comment.clone()
    })
}

async fn update_comment_mysql(
    pool: &MySqlPool,
    tables: &Tables,
    comment: &Comment,
) -> Result<Comment> {
    let sql = update_sql(tables);
    bind_comment_columns!(sqlx::query(&sql), comment)
        .bind(comment.id)
        .execute(pool)
        .await
        .context("Failed to update comment")?;

    Ok(comment.clone())
}

async fn get_comment_by_id_mysql(
    pool: &MySqlPool,
    tables: &Tables,
    id: i64,
) -> Result<Option<Comment>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE comment_ID = ?",
        mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        tables.comments()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get comment by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_comment_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_comments_mysql(
    pool: &MySqlPool,
    tables: &Tables,
    filter: &str,
    value: QueryValue<'_>,
) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        tables.comments(),
        filter
    );
    let query = sqlx::query(&sql);
    let query = match value {
        QueryValue::Text(text) => query.bind(text),
        QueryValue::Int(int) => query.bind(int),
    };
    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list comments")?;

    rows.iter().map(row_to_comment_mysql).collect()
}

fn row_to_comment_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Comment> {
    Ok(Comment {
        id: mysql_id(row, "comment_ID")?,
        comment_post_id: mysql_id(row, "comment_post_ID")?,
        comment_author: row.try_get("comment_author")?,
        comment_author_email: row.try_get("comment_author_email")?,
        comment_author_url: row.try_get("comment_author_url")?,
        comment_author_ip: row.try_get("comment_author_IP")?,
        comment_date: row.try_get("comment_date")?,
        comment_date_gmt: row.try_get("comment_date_gmt")?,
        comment_content: row.try_get("comment_content")?,
        comment_karma: row.try_get("comment_karma")?,
        comment_approved: row.try_get("comment_approved")?,
        comment_agent: row.try_get("comment_agent")?,
        comment_type: row.try_get("comment_type")?,
        comment_parent: mysql_id(row, "comment_parent")?,
        user_id: mysql_id(row, "user_id")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::models::comment_approval;
    use chrono::{NaiveDate, NaiveDateTime};

    async fn setup_test_repo() -> SqlxCommentRepository {
        let (pool, tables) = schema::setup().await;
        SqlxCommentRepository::new(pool, tables)
    }

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn create_test_comment(post_id: i64, content: &str, hour: u32) -> Comment {
        let mut comment = Comment::new(post_id, "Ann", "ann@example.com", content);
        comment.comment_date = Some(at(hour));
        comment.comment_date_gmt = Some(at(hour));
        comment
    }

    #[tokio::test]
    async fn test_create_comment() {
        let repo = setup_test_repo().await;
        let mut comment = create_test_comment(1, "First!", 9);
        comment.comment_author_ip = "127.0.0.1".to_string();
        comment.comment_karma = -2;

        let created = repo.create(&comment).await.expect("Failed to create comment");

        assert!(created.id > 0);
        let found = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(found, created);
        assert_eq!(found.comment_author_ip, "127.0.0.1");
        assert_eq!(found.comment_karma, -2);
    }

    #[tokio::test]
    async fn test_update_and_delete_comment() {
        let repo = setup_test_repo().await;
        let mut comment = repo.create(&create_test_comment(1, "Hi", 9)).await.unwrap();

        comment.comment_approved = comment_approval::SPAM.to_string();
        repo.update(&comment).await.expect("Failed to update comment");
        let found = repo.get_by_id(comment.id).await.unwrap().unwrap();
        assert_eq!(found.comment_approved, "spam");

        assert!(repo.delete(comment.id).await.unwrap());
        assert!(!repo.delete(comment.id).await.unwrap());
        assert!(repo.get_by_id(comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_post_oldest_first() {
        let repo = setup_test_repo().await;
        repo.create(&create_test_comment(1, "second", 11)).await.unwrap();
        repo.create(&create_test_comment(1, "first", 10)).await.unwrap();
        repo.create(&create_test_comment(2, "elsewhere", 9)).await.unwrap();

        let comments = repo.list_by_post(1).await.expect("Failed to list comments");
        let contents: Vec<&str> = comments.iter().map(|c| c.comment_content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);

        assert!(repo.list_by_post(3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_approval() {
        let repo = setup_test_repo().await;
        repo.create(&create_test_comment(1, "ok", 9)).await.unwrap();
        let mut pending = create_test_comment(1, "waiting", 10);
        pending.comment_approved = comment_approval::PENDING.to_string();
        repo.create(&pending).await.unwrap();

        let waiting = repo
            .list_by_approval(comment_approval::PENDING)
            .await
            .unwrap();
        assert_eq!(waiting.len(), 1);
        assert_eq!(waiting[0].comment_content, "waiting");

        let approved = repo
            .list_by_approval(comment_approval::APPROVED)
            .await
            .unwrap();
        assert_eq!(approved.len(), 1);
    }
}
