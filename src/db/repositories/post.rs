//! Post repository
//!
//! Database operations for the `posts` table.
//!
//! This module provides:
//! - `PostRepository` trait defining the interface for post data access
//! - `SqlxPostRepository` implementing the trait for SQLite and MySQL
//!
//! Timestamps are written as given; callers stamp them first (see
//! [`Post::stamp`]).

use crate::db::repositories::{
    assignments, column_list, mysql_column_list, mysql_id, mysql_insert_id, placeholders,
};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::{Post, PostOrder, PostQuery, QueryValue};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

const COLUMNS: [&str; 23] = [
    "ID",
    "post_author",
    "post_date",
    "post_date_gmt",
    "post_content",
    "post_title",
    "post_excerpt",
    "post_status",
    "comment_status",
    "ping_status",
    "post_password",
    "post_name",
    "to_ping",
    "pinged",
    "post_modified",
    "post_modified_gmt",
    "post_content_filtered",
    "post_parent",
    "guid",
    "menu_order",
    "post_type",
    "post_mime_type",
    "comment_count",
];

const DATE_COLUMNS: [&str; 4] = [
    "post_date",
    "post_date_gmt",
    "post_modified",
    "post_modified_gmt",
];

/// Every column but `ID`, in the order `bind_post_columns!` binds them.
fn writable() -> &'static [&'static str] {
    &COLUMNS[1..]
}

macro_rules! bind_post_columns {
    ($query:expr, $post:expr) => {
        $query
            .bind($post.post_author)
            .bind($post.post_date)
            .bind($post.post_date_gmt)
            .bind(&$post.post_content)
            .bind(&$post.post_title)
            .bind(&$post.post_excerpt)
            .bind(&$post.post_status)
            .bind(&$post.comment_status)
            .bind(&$post.ping_status)
            .bind(&$post.post_password)
            .bind(&$post.post_name)
            .bind(&$post.to_ping)
            .bind(&$post.pinged)
            .bind($post.post_modified)
            .bind($post.post_modified_gmt)
            .bind(&$post.post_content_filtered)
            .bind($post.post_parent)
            .bind(&$post.guid)
            .bind($post.menu_order)
            .bind(&$post.post_type)
            .bind(&$post.post_mime_type)
            .bind($post.comment_count)
    };
}

/// Binds the filters and paging of a [`PostQuery`], in placeholder order.
macro_rules! bind_post_query {
    ($query:expr, $filter:expr) => {{
        let mut bound = $query;
        for value in $filter.bind_values() {
            bound = match value {
                QueryValue::Text(text) => bound.bind(text),
                QueryValue::Int(int) => bound.bind(int),
            };
        }
        if let Some((limit, offset)) = $filter.paging() {
            bound = bound.bind(limit).bind(offset);
        }
        bound
    }};
}

/// Post repository trait
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post; returns it with its new `ID`
    async fn create(&self, post: &Post) -> Result<Post>;

    /// Write every column of an existing post
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Delete a post; `false` when no row had that ID
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Get post by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Post>>;

    /// List posts matching `query`
    async fn list(&self, query: &PostQuery) -> Result<Vec<Post>>;

    /// Count posts matching `query` (paging ignored)
    async fn count(&self, query: &PostQuery) -> Result<i64>;

    /// Distinct posts related to any taxonomy of a term, newest first
    async fn list_by_term(&self, term_id: i64) -> Result<Vec<Post>>;
}

/// SQLx-based post repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxPostRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxPostRepository {
    /// Create a new SQLx post repository
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool, tables))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn create(&self, post: &Post) -> Result<Post> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => create_post_sqlite(pool, &self.tables, post).await,
            Backend::Mysql(pool) => create_post_mysql(pool, &self.tables, post).await,
        }
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => update_post_sqlite(pool, &self.tables, post).await,
            Backend::Mysql(pool) => update_post_mysql(pool, &self.tables, post).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => delete_post_sqlite(pool, &self.tables, id).await,
            Backend::Mysql(pool) => delete_post_mysql(pool, &self.tables, id).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Post>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => get_post_by_id_sqlite(pool, &self.tables, id).await,
            Backend::Mysql(pool) => get_post_by_id_mysql(pool, &self.tables, id).await,
        }
    }

    async fn list(&self, query: &PostQuery) -> Result<Vec<Post>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_posts_sqlite(pool, &self.tables, query).await,
            Backend::Mysql(pool) => list_posts_mysql(pool, &self.tables, query).await,
        }
    }

    async fn count(&self, query: &PostQuery) -> Result<i64> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => count_posts_sqlite(pool, &self.tables, query).await,
            Backend::Mysql(pool) => count_posts_mysql(pool, &self.tables, query).await,
        }
    }

    async fn list_by_term(&self, term_id: i64) -> Result<Vec<Post>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => list_posts_by_term_sqlite(pool, &self.tables, term_id).await,
            Backend::Mysql(pool) => list_posts_by_term_mysql(pool, &self.tables, term_id).await,
        }
    }
}

fn insert_sql(tables: &Tables) -> String {
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        tables.posts(),
        column_list(writable(), None),
        placeholders(writable().len())
    )
}

fn update_sql(tables: &Tables) -> String {
    format!(
        "UPDATE {} SET {} WHERE ID = ?",
        tables.posts(),
        assignments(writable())
    )
}

fn list_sql(tables: &Tables, columns: &str, query: &PostQuery) -> String {
    let mut sql = format!(
        "SELECT {} FROM {} {} ORDER BY {}",
        columns,
        tables.posts(),
        query.where_sql(),
        query.order.sql()
    );
    if query.paging().is_some() {
        sql.push_str(" LIMIT ? OFFSET ?");
    }
    sql
}

fn count_sql(tables: &Tables, query: &PostQuery) -> String {
    format!(
        "SELECT COUNT(*) FROM {} {}",
        tables.posts(),
        query.where_sql()
    )
}

fn by_term_sql(tables: &Tables, columns: &str) -> String {
    format!(
        r#"
        SELECT DISTINCT {}
        FROM {} p
        INNER JOIN {} tr ON tr.object_id = p.ID
        INNER JOIN {} tt ON tt.term_taxonomy_id = tr.term_taxonomy_id
        WHERE tt.term_id = ?
        ORDER BY {}
        "#,
        columns,
        tables.posts(),
        tables.term_relationships(),
        tables.term_taxonomy(),
        PostOrder::default().sql()
    )
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_post_sqlite(pool: &SqlitePool, tables: &Tables, post: &Post) -> Result<Post> {
    let sql = insert_sql(tables);
    let result = bind_post_columns!(sqlx::query(&sql), post)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        ..post.clone()
    })
}

async fn update_post_sqlite(pool: &SqlitePool, tables: &Tables, post: &Post) -> Result<Post> {
    let sql = update_sql(tables);
    bind_post_columns!(sqlx::query(&sql), post)
        .bind(post.id)
        .execute(pool)
        .await
        .context("Failed to update post")?;

    Ok(post.clone())
}

async fn delete_post_sqlite(pool: &SqlitePool, tables: &Tables, id: i64) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE ID = ?", tables.posts()))
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(result.rows_affected() > 0)
}

async fn get_post_by_id_sqlite(pool: &SqlitePool, tables: &Tables, id: i64) -> Result<Option<Post>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE ID = ?",
        column_list(&COLUMNS, None),
        tables.posts()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_post_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_posts_sqlite(pool: &SqlitePool, tables: &Tables, query: &PostQuery) -> Result<Vec<Post>> {
    let sql = list_sql(tables, &column_list(&COLUMNS, None), query);
    let rows = bind_post_query!(sqlx::query(&sql), query)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

async fn count_posts_sqlite(pool: &SqlitePool, tables: &Tables, query: &PostQuery) -> Result<i64> {
    let sql = count_sql(tables, query);
    let mut count = sqlx::query_scalar::<_, i64>(&sql);
    for value in query.bind_values() {
        count = match value {
            QueryValue::Text(text) => count.bind(text),
            QueryValue::Int(int) => count.bind(int),
        };
    }

    count
        .fetch_one(pool)
        .await
        .context("Failed to count posts")
}

async fn list_posts_by_term_sqlite(pool: &SqlitePool, tables: &Tables, term_id: i64) -> Result<Vec<Post>> {
    let sql = by_term_sql(tables, &column_list(&COLUMNS, Some("p")));
    let rows = sqlx::query(&sql)
        .bind(term_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts by term")?;

    rows.iter().map(row_to_post_sqlite).collect()
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.try_get("ID")?,
        post_author: row.try_get("post_author")?,
        post_date: row.try_get("post_date")?,
        post_date_gmt: row.try_get("post_date_gmt")?,
        post_content: row.try_get("post_content")?,
        post_title: row.try_get("post_title")?,
        post_excerpt: row.try_get("post_excerpt")?,
        post_status: row.try_get("post_status")?,
        comment_status: row.try_get("comment_status")?,
        ping_status: row.try_get("ping_status")?,
        post_password: row.try_get("post_password")?,
        post_name: row.try_get("post_name")?,
        to_ping: row.try_get("to_ping")?,
        pinged: row.try_get("pinged")?,
        post_modified: row.try_get("post_modified")?,
        post_modified_gmt: row.try_get("post_modified_gmt")?,
        post_content_filtered: row.try_get("post_content_filtered")?,
        post_parent: row.try_get("post_parent")?,
        guid: row.try_get("guid")?,
        menu_order: row.try_get("menu_order")?,
        post_type: row.try_get("post_type")?,
        post_mime_type: row.try_get("post_mime_type")?,
        comment_count: row.try_get("comment_count")?,
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_post_mysql(pool: &MySqlPool, tables: &Tables, post: &Post) -> Result<Post> {
    let sql = insert_sql(tables);
    let result = bind_post_columns!(sqlx::query(&sql), post)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(Post {
        id: mysql_insert_id(result.last_insert_id())?,
        ..post.clone()
    })
}

async fn update_post_mysql(pool: &MySqlPool, tables: &Tables, post: &Post) -> Result<Post> {
    let sql = update_sql(tables);
    bind_post_columns!(sqlx::query(&sql), post)
        .bind(post.id)
        .execute(pool)
        .await
        .context("Failed to update post")?;

    Ok(post.clone())
}

async fn delete_post_mysql(pool: &MySqlPool, tables: &Tables, id: i64) -> Result<bool> {
    let result = sqlx::query(&format!("DELETE FROM {} WHERE ID = ?", tables.posts()))
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;

    Ok(result.rows_affected() > 0)
}

async fn get_post_by_id_mysql(pool: &MySqlPool, tables: &Tables, id: i64) -> Result<Option<Post>> {
    let sql = format!(
        "SELECT {} FROM {} WHERE ID = ?",
        mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        tables.posts()
    );
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get post by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_post_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_posts_mysql(pool: &MySqlPool, tables: &Tables, query: &PostQuery) -> Result<Vec<Post>> {
    let sql = list_sql(
        tables,
        &mysql_column_list(&COLUMNS, &DATE_COLUMNS, None),
        query,
    );
    let rows = bind_post_query!(sqlx::query(&sql), query)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;

    rows.iter().map(row_to_post_mysql).collect()
}

async fn count_posts_mysql(pool: &MySqlPool, tables: &Tables, query: &PostQuery) -> Result<i64> {
    let sql = count_sql(tables, query);
    let mut count = sqlx::query_scalar::<_, i64>(&sql);
    for value in query.bind_values() {
        count = match value {
            QueryValue::Text(text) => count.bind(text),
            QueryValue::Int(int) => count.bind(int),
        };
    }

    count
        .fetch_one(pool)
        .await
        .context("Failed to count posts")
}

async fn list_posts_by_term_mysql(pool: &MySqlPool, tables: &Tables, term_id: i64) -> Result<Vec<Post>> {
    let sql = by_term_sql(
        tables,
        &mysql_column_list(&COLUMNS, &DATE_COLUMNS, Some("p")),
    );
    let rows = sqlx::query(&sql)
        .bind(term_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts by term")?;

    rows.iter().map(row_to_post_mysql).collect()
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Post> {
    Ok(Post {
        id: mysql_id(row, "ID")?,
        post_author: mysql_id(row, "post_author")?,
        post_date: row.try_get("post_date")?,
        post_date_gmt: row.try_get("post_date_gmt")?,
        post_content: row.try_get("post_content")?,
        post_title: row.try_get("post_title")?,
        post_excerpt: row.try_get("post_excerpt")?,
        post_status: row.try_get("post_status")?,
        comment_status: row.try_get("comment_status")?,
        ping_status: row.try_get("ping_status")?,
        post_password: row.try_get("post_password")?,
        post_name: row.try_get("post_name")?,
        to_ping: row.try_get("to_ping")?,
        pinged: row.try_get("pinged")?,
        post_modified: row.try_get("post_modified")?,
        post_modified_gmt: row.try_get("post_modified_gmt")?,
        post_content_filtered: row.try_get("post_content_filtered")?,
        post_parent: mysql_id(row, "post_parent")?,
        guid: row.try_get("guid")?,
        menu_order: row.try_get("menu_order")?,
        post_type: row.try_get("post_type")?,
        post_mime_type: row.try_get("post_mime_type")?,
        comment_count: row.try_get("comment_count")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::models::{post_status, PostOrder};
    use chrono::{NaiveDate, NaiveDateTime};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxPostRepository) {
        let (pool, tables) = schema::setup().await;
        let repo = SqlxPostRepository::new(pool.clone(), tables);
        (pool, repo)
    }

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn create_test_post(title: &str, status: &str, date: NaiveDateTime) -> Post {
        let mut post = Post::new(1, title, "Content").with_status(status);
        post.post_date = Some(date);
        post.post_date_gmt = Some(date);
        post.post_modified = Some(date);
        post.post_modified_gmt = Some(date);
        post
    }

    /// Helper to link a post to a term through a new taxonomy row
    async fn link_post_to_term(pool: &SqlitePool, post_id: i64, term_id: i64, taxonomy: &str) {
        let result = sqlx::query(
            "INSERT INTO wp_term_taxonomy (term_id, taxonomy, description) VALUES (?, ?, '')",
        )
        .bind(term_id)
        .bind(taxonomy)
        .execute(pool)
        .await
        .expect("Failed to create taxonomy");

        sqlx::query("INSERT INTO wp_term_relationships (object_id, term_taxonomy_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(result.last_insert_rowid())
            .execute(pool)
            .await
            .expect("Failed to create relationship");
    }

    #[tokio::test]
    async fn test_create_post() {
        let (_pool, repo) = setup_test_repo().await;
        let post = create_test_post("Hello", post_status::PUBLISH, day(1));

        let created = repo.create(&post).await.expect("Failed to create post");

        assert!(created.id > 0);
        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get post")
            .expect("Post should exist");
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_get_missing_post() {
        let (_pool, repo) = setup_test_repo().await;
        let found = repo.get_by_id(999).await.expect("Failed to get post");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_update_post() {
        let (_pool, repo) = setup_test_repo().await;
        let mut post = repo
            .create(&create_test_post("Hello", post_status::DRAFT, day(1)))
            .await
            .expect("Failed to create post");

        post.post_title = "Hello again".to_string();
        post.post_status = post_status::PUBLISH.to_string();
        post.menu_order = 3;
        repo.update(&post).await.expect("Failed to update post");

        let found = repo.get_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(found.post_title, "Hello again");
        assert_eq!(found.post_status, "publish");
        assert_eq!(found.menu_order, 3);
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (_pool, repo) = setup_test_repo().await;
        let post = repo
            .create(&create_test_post("Hello", post_status::DRAFT, day(1)))
            .await
            .unwrap();

        assert!(repo.delete(post.id).await.expect("Failed to delete post"));
        assert!(!repo.delete(post.id).await.expect("Failed to delete post"));
        assert!(repo.get_by_id(post.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_defaults_to_newest_first() {
        let (_pool, repo) = setup_test_repo().await;
        for (title, d) in [("middle", 2), ("oldest", 1), ("newest", 3)] {
            repo.create(&create_test_post(title, post_status::PUBLISH, day(d)))
                .await
                .unwrap();
        }

        let posts = repo.list(&PostQuery::new()).await.expect("Failed to list posts");
        let titles: Vec<&str> = posts.iter().map(|p| p.post_title.as_str()).collect();
        assert_eq!(titles, vec!["newest", "middle", "oldest"]);

        let posts = repo
            .list(&PostQuery::new().order(PostOrder::DateAsc))
            .await
            .unwrap();
        assert_eq!(posts[0].post_title, "oldest");
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&create_test_post("live", post_status::PUBLISH, day(1)))
            .await
            .unwrap();
        repo.create(&create_test_post("draft", post_status::DRAFT, day(2)))
            .await
            .unwrap();
        repo.create(&create_test_post("hidden", post_status::PRIVATE, day(3)))
            .await
            .unwrap();

        let published = repo.list(&PostQuery::published()).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].post_title, "live");

        assert_eq!(repo.count(&PostQuery::published()).await.unwrap(), 1);
        assert_eq!(repo.count(&PostQuery::new()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_by_author_and_type() {
        let (_pool, repo) = setup_test_repo().await;
        let mut page = create_test_post("About", post_status::PUBLISH, day(1));
        page.post_type = "page".to_string();
        page.post_author = 2;
        repo.create(&page).await.unwrap();
        repo.create(&create_test_post("Post", post_status::PUBLISH, day(2)))
            .await
            .unwrap();

        let pages = repo
            .list(&PostQuery::new().post_type("page").author(2))
            .await
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].post_title, "About");

        let none = repo
            .list(&PostQuery::new().post_type("page").author(1))
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_list_paging() {
        let (_pool, repo) = setup_test_repo().await;
        for d in 1..=5 {
            repo.create(&create_test_post(&format!("post {}", d), post_status::PUBLISH, day(d)))
                .await
                .unwrap();
        }

        let page = repo.list(&PostQuery::new().page(2, 1)).await.unwrap();
        let titles: Vec<&str> = page.iter().map(|p| p.post_title.as_str()).collect();
        assert_eq!(titles, vec!["post 4", "post 3"]);

        let rest = repo
            .list(&PostQuery {
                offset: 3,
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(rest.len(), 2);

        assert_eq!(repo.count(&PostQuery::new().page(2, 1)).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_list_by_term_is_distinct() {
        let (pool, repo) = setup_test_repo().await;
        let sqlite = pool.as_sqlite().unwrap();
        let first = repo
            .create(&create_test_post("first", post_status::PUBLISH, day(1)))
            .await
            .unwrap();
        let second = repo
            .create(&create_test_post("second", post_status::PUBLISH, day(2)))
            .await
            .unwrap();
        repo.create(&create_test_post("unrelated", post_status::PUBLISH, day(3)))
            .await
            .unwrap();

        // Term 7 reaches `first` through two taxonomies.
        link_post_to_term(sqlite, first.id, 7, "post_tag").await;
        link_post_to_term(sqlite, first.id, 7, "category").await;
        link_post_to_term(sqlite, second.id, 7, "post_tag").await;

        let posts = repo.list_by_term(7).await.expect("Failed to list by term");
        let titles: Vec<&str> = posts.iter().map(|p| p.post_title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        assert!(repo.list_by_term(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let pool = crate::db::create_test_pool().await.unwrap();
        let tables = Tables::new("blog_").unwrap();
        schema::install(pool.as_sqlite().unwrap(), &tables)
            .await
            .unwrap();
        let repo = SqlxPostRepository::new(pool, tables);

        let post = repo
            .create(&create_test_post("Hello", post_status::PUBLISH, day(1)))
            .await
            .expect("Failed to create post in prefixed table");
        assert!(repo.get_by_id(post.id).await.unwrap().is_some());
    }
}
