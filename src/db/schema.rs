//! Test schema fixture
//!
//! The platform owns its schema; this crate never creates or alters it.
//! Tests still need the tables, so this module lays down a SQLite rendition
//! of them (no foreign keys, no unique indexes on login/email: the
//! platform enforces those rules in application code).

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::{create_test_pool, DynDatabasePool, Tables};

fn statements(t: &Tables) -> Vec<String> {
    vec![
        format!(
            r#"CREATE TABLE {} (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                user_login VARCHAR(60) NOT NULL DEFAULT '',
                user_pass VARCHAR(255) NOT NULL DEFAULT '',
                user_nicename VARCHAR(50) NOT NULL DEFAULT '',
                user_email VARCHAR(100) NOT NULL DEFAULT '',
                user_url VARCHAR(100) NOT NULL DEFAULT '',
                user_registered DATETIME NOT NULL,
                user_activation_key VARCHAR(255) NOT NULL DEFAULT '',
                user_status INTEGER NOT NULL DEFAULT 0,
                display_name VARCHAR(250) NOT NULL DEFAULT ''
            )"#,
            t.users()
        ),
        format!(
            r#"CREATE TABLE {} (
                umeta_id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL DEFAULT 0,
                meta_key VARCHAR(255),
                meta_value TEXT
            )"#,
            t.usermeta()
        ),
        format!(
            r#"CREATE TABLE {} (
                ID INTEGER PRIMARY KEY AUTOINCREMENT,
                post_author INTEGER NOT NULL DEFAULT 0,
                post_date DATETIME NOT NULL,
                post_date_gmt DATETIME NOT NULL,
                post_content TEXT NOT NULL,
                post_title TEXT NOT NULL,
                post_excerpt TEXT NOT NULL,
                post_status VARCHAR(20) NOT NULL DEFAULT 'publish',
                comment_status VARCHAR(20) NOT NULL DEFAULT 'open',
                ping_status VARCHAR(20) NOT NULL DEFAULT 'open',
                post_password VARCHAR(255) NOT NULL DEFAULT '',
                post_name VARCHAR(200) NOT NULL DEFAULT '',
                to_ping TEXT NOT NULL,
                pinged TEXT NOT NULL,
                post_modified DATETIME NOT NULL,
                post_modified_gmt DATETIME NOT NULL,
                post_content_filtered TEXT NOT NULL,
                post_parent INTEGER NOT NULL DEFAULT 0,
                guid VARCHAR(255) NOT NULL DEFAULT '',
                menu_order INTEGER NOT NULL DEFAULT 0,
                post_type VARCHAR(20) NOT NULL DEFAULT 'post',
                post_mime_type VARCHAR(100) NOT NULL DEFAULT '',
                comment_count INTEGER NOT NULL DEFAULT 0
            )"#,
            t.posts()
        ),
        format!(
            r#"CREATE TABLE {} (
                meta_id INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id INTEGER NOT NULL DEFAULT 0,
                meta_key VARCHAR(255),
                meta_value TEXT
            )"#,
            t.postmeta()
        ),
        format!(
            r#"CREATE TABLE {} (
                comment_ID INTEGER PRIMARY KEY AUTOINCREMENT,
                comment_post_ID INTEGER NOT NULL DEFAULT 0,
                comment_author TEXT NOT NULL,
                comment_author_email VARCHAR(100) NOT NULL DEFAULT '',
                comment_author_url VARCHAR(200) NOT NULL DEFAULT '',
                comment_author_IP VARCHAR(100) NOT NULL DEFAULT '',
                comment_date DATETIME NOT NULL,
                comment_date_gmt DATETIME NOT NULL,
                comment_content TEXT NOT NULL,
                comment_karma INTEGER NOT NULL DEFAULT 0,
                comment_approved VARCHAR(20) NOT NULL DEFAULT '1',
                comment_agent VARCHAR(255) NOT NULL DEFAULT '',
                comment_type VARCHAR(20) NOT NULL DEFAULT 'comment',
                comment_parent INTEGER NOT NULL DEFAULT 0,
                user_id INTEGER NOT NULL DEFAULT 0
            )"#,
            t.comments()
        ),
        format!(
            r#"CREATE TABLE {} (
                term_id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(200) NOT NULL DEFAULT '',
                slug VARCHAR(200) NOT NULL DEFAULT '',
                term_group INTEGER NOT NULL DEFAULT 0
            )"#,
            t.terms()
        ),
        format!(
            r#"CREATE TABLE {} (
                term_taxonomy_id INTEGER PRIMARY KEY AUTOINCREMENT,
                term_id INTEGER NOT NULL DEFAULT 0,
                taxonomy VARCHAR(32) NOT NULL DEFAULT '',
                description TEXT NOT NULL,
                parent INTEGER NOT NULL DEFAULT 0,
                count INTEGER NOT NULL DEFAULT 0
            )"#,
            t.term_taxonomy()
        ),
        format!(
            r#"CREATE TABLE {} (
                object_id INTEGER NOT NULL DEFAULT 0,
                term_taxonomy_id INTEGER NOT NULL DEFAULT 0,
                term_order INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (object_id, term_taxonomy_id)
            )"#,
            t.term_relationships()
        ),
        format!(
            r#"CREATE TABLE {} (
                link_id INTEGER PRIMARY KEY AUTOINCREMENT,
                link_url VARCHAR(255) NOT NULL DEFAULT '',
                link_name VARCHAR(255) NOT NULL DEFAULT '',
                link_image VARCHAR(255) NOT NULL DEFAULT '',
                link_target VARCHAR(25) NOT NULL DEFAULT '',
                link_description VARCHAR(255) NOT NULL DEFAULT '',
                link_visible VARCHAR(20) NOT NULL DEFAULT 'Y',
                link_owner INTEGER NOT NULL DEFAULT 1,
                link_rating INTEGER NOT NULL DEFAULT 0,
                link_updated DATETIME,
                link_rel VARCHAR(255) NOT NULL DEFAULT '',
                link_notes TEXT NOT NULL,
                link_rss VARCHAR(255) NOT NULL DEFAULT ''
            )"#,
            t.links()
        ),
        format!(
            r#"CREATE TABLE {} (
                option_id INTEGER PRIMARY KEY AUTOINCREMENT,
                option_name VARCHAR(191) NOT NULL DEFAULT '' UNIQUE,
                option_value TEXT NOT NULL,
                autoload VARCHAR(20) NOT NULL DEFAULT 'yes'
            )"#,
            t.options()
        ),
    ]
}

/// Create every platform table for `tables` in a SQLite database.
pub async fn install(pool: &SqlitePool, tables: &Tables) -> Result<()> {
    for statement in statements(tables) {
        sqlx::query(&statement)
            .execute(pool)
            .await
            .with_context(|| format!("Failed to execute: {}", truncate_sql(&statement)))?;
    }
    Ok(())
}

/// In-memory pool with the default `wp_` tables installed.
pub async fn setup() -> (DynDatabasePool, Tables) {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    let tables = Tables::default();
    let sqlite = pool.as_sqlite().expect("test pool is SQLite");
    install(sqlite, &tables)
        .await
        .expect("Failed to install schema");
    (pool, tables)
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    let sql = sql.trim();
    match sql.char_indices().nth(80) {
        Some((end, _)) => format!("{}...", &sql[..end]),
        None => sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_install_creates_prefixed_tables() {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        let sqlite = pool.as_sqlite().unwrap();
        let tables = Tables::new("blog_").unwrap();

        install(sqlite, &tables).await.expect("Failed to install schema");

        let rows = sqlx::query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE 'blog\\_%' ESCAPE '\\' ORDER BY name",
        )
        .fetch_all(sqlite)
        .await
        .unwrap();
        let names: Vec<String> = rows.iter().map(|r| r.get("name")).collect();

        assert_eq!(
            names,
            vec![
                "blog_comments",
                "blog_links",
                "blog_options",
                "blog_postmeta",
                "blog_posts",
                "blog_term_relationships",
                "blog_term_taxonomy",
                "blog_terms",
                "blog_usermeta",
                "blog_users",
            ]
        );
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1"), "SELECT 1");
        let long = "x".repeat(200);
        assert_eq!(truncate_sql(&long).len(), 83);
    }
}
