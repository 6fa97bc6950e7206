//! Term repositories
//!
//! Database operations for the three classification tables.
//!
//! This module provides:
//! - `TermRepository` for `terms`
//! - `TermTaxonomyRepository` for `term_taxonomy`
//! - `TermRelationshipRepository` for the `term_relationships` join table
//!
//! Each has an `Sqlx*` implementation for SQLite and MySQL.

use crate::db::repositories::{mysql_id, mysql_insert_id};
use crate::db::{Backend, DynDatabasePool, Tables};
use crate::models::{QueryValue, Term, TermRelationship, TermTaxonomy};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Binds trusted-SQL parameters collected as [`QueryValue`]s.
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut bound = $query;
        for value in $values {
            bound = match value {
                QueryValue::Text(text) => bound.bind(text),
                QueryValue::Int(int) => bound.bind(int),
            };
        }
        bound
    }};
}

async fn rows_affected(
    pool: &DynDatabasePool,
    sql: &str,
    values: &[QueryValue<'_>],
    action: &str,
) -> Result<u64> {
    let affected = match pool.backend() {
        Backend::Sqlite(pool) => bind_values!(sqlx::query(sql), values.iter().copied())
            .execute(pool)
            .await
            .with_context(|| format!("Failed to {}", action))?
            .rows_affected(),
        Backend::Mysql(pool) => bind_values!(sqlx::query(sql), values.iter().copied())
            .execute(pool)
            .await
            .with_context(|| format!("Failed to {}", action))?
            .rows_affected(),
    };
    Ok(affected)
}

// ============================================================================
// Terms
// ============================================================================

/// Term repository trait
#[async_trait]
pub trait TermRepository: Send + Sync {
    /// Create a new term
    async fn create(&self, term: &Term) -> Result<Term>;

    /// Update a term
    async fn update(&self, term: &Term) -> Result<Term>;

    /// Delete a term (its taxonomy rows are left alone)
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Get term by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Term>>;

    /// Get term by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Term>>;

    /// Distinct terms attached to an object, optionally within one taxonomy,
    /// ordered by name
    async fn list_by_object(&self, object_id: i64, taxonomy: Option<&str>) -> Result<Vec<Term>>;
}

/// SQLx-based term repository implementation
pub struct SqlxTermRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxTermRepository {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn TermRepository> {
        Arc::new(Self::new(pool, tables))
    }

    async fn select(&self, sql: &str, values: &[QueryValue<'_>]) -> Result<Vec<Term>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => select_terms_sqlite(pool, sql, values).await,
            Backend::Mysql(pool) => select_terms_mysql(pool, sql, values).await,
        }
    }
}

#[async_trait]
impl TermRepository for SqlxTermRepository {
    async fn create(&self, term: &Term) -> Result<Term> {
        let sql = format!(
            "INSERT INTO {} (name, slug, term_group) VALUES (?, ?, ?)",
            self.tables.terms()
        );
        let term_id = match self.pool.backend() {
            Backend::Sqlite(pool) => create_term_sqlite(pool, &sql, term).await?,
            Backend::Mysql(pool) => create_term_mysql(pool, &sql, term).await?,
        };
        Ok(Term {
            term_id,
            ..term.clone()
        })
    }

    async fn update(&self, term: &Term) -> Result<Term> {
        let sql = format!(
            "UPDATE {} SET name = ?, slug = ?, term_group = ? WHERE term_id = ?",
            self.tables.terms()
        );
        let values = [
            QueryValue::Text(&term.name),
            QueryValue::Text(&term.slug),
            QueryValue::Int(term.term_group),
            QueryValue::Int(term.term_id),
        ];
        rows_affected(&self.pool, &sql, &values, "update term").await?;
        Ok(term.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE term_id = ?", self.tables.terms());
        Ok(rows_affected(&self.pool, &sql, &[QueryValue::Int(id)], "delete term").await? > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Term>> {
        let sql = format!(
            "SELECT term_id, name, slug, term_group FROM {} WHERE term_id = ?",
            self.tables.terms()
        );
        Ok(self.select(&sql, &[QueryValue::Int(id)]).await?.into_iter().next())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Term>> {
        let sql = format!(
            "SELECT term_id, name, slug, term_group FROM {} WHERE slug = ? ORDER BY term_id LIMIT 1",
            self.tables.terms()
        );
        Ok(self.select(&sql, &[QueryValue::Text(slug)]).await?.into_iter().next())
    }

    async fn list_by_object(&self, object_id: i64, taxonomy: Option<&str>) -> Result<Vec<Term>> {
        let mut values = vec![QueryValue::Int(object_id)];
        let mut filter = String::from("tr.object_id = ?");
        if let Some(taxonomy) = taxonomy {
            filter.push_str(" AND tt.taxonomy = ?");
            values.push(QueryValue::Text(taxonomy));
        }

        let sql = format!(
            r#"
            SELECT DISTINCT t.term_id, t.name, t.slug, t.term_group
            FROM {} t
            INNER JOIN {} tt ON tt.term_id = t.term_id
            INNER JOIN {} tr ON tr.term_taxonomy_id = tt.term_taxonomy_id
            WHERE {}
            ORDER BY t.name, t.term_id
            "#,
            self.tables.terms(),
            self.tables.term_taxonomy(),
            self.tables.term_relationships(),
            filter
        );
        self.select(&sql, &values).await
    }
}

// ============================================================================
// Taxonomy entries
// ============================================================================

/// Term taxonomy repository trait
#[async_trait]
pub trait TermTaxonomyRepository: Send + Sync {
    /// Create a new taxonomy entry
    async fn create(&self, entry: &TermTaxonomy) -> Result<TermTaxonomy>;

    /// Update a taxonomy entry
    async fn update(&self, entry: &TermTaxonomy) -> Result<TermTaxonomy>;

    /// Delete a taxonomy entry (relationships are left alone)
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Get taxonomy entry by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<TermTaxonomy>>;

    /// Every taxonomy entry of a term
    async fn list_by_term(&self, term_id: i64) -> Result<Vec<TermTaxonomy>>;

    /// Taxonomy entries an object is related to
    async fn list_by_object(&self, object_id: i64) -> Result<Vec<TermTaxonomy>>;

    /// The entry placing `term_id` in `taxonomy`, if any
    async fn find(&self, term_id: i64, taxonomy: &str) -> Result<Option<TermTaxonomy>>;
}

/// SQLx-based term taxonomy repository implementation
pub struct SqlxTermTaxonomyRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

const TAXONOMY_COLUMNS: &str = "term_taxonomy_id, term_id, taxonomy, description, parent, count";

impl SqlxTermTaxonomyRepository {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn TermTaxonomyRepository> {
        Arc::new(Self::new(pool, tables))
    }

    async fn select(&self, sql: &str, values: &[QueryValue<'_>]) -> Result<Vec<TermTaxonomy>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => select_taxonomies_sqlite(pool, sql, values).await,
            Backend::Mysql(pool) => select_taxonomies_mysql(pool, sql, values).await,
        }
    }
}

#[async_trait]
impl TermTaxonomyRepository for SqlxTermTaxonomyRepository {
    async fn create(&self, entry: &TermTaxonomy) -> Result<TermTaxonomy> {
        let sql = format!(
            "INSERT INTO {} (term_id, taxonomy, description, parent, count) VALUES (?, ?, ?, ?, ?)",
            self.tables.term_taxonomy()
        );
        let term_taxonomy_id = match self.pool.backend() {
            Backend::Sqlite(pool) => create_taxonomy_sqlite(pool, &sql, entry).await?,
            Backend::Mysql(pool) => create_taxonomy_mysql(pool, &sql, entry).await?,
        };
        Ok(TermTaxonomy {
            term_taxonomy_id,
            ..entry.clone()
        })
    }

    async fn update(&self, entry: &TermTaxonomy) -> Result<TermTaxonomy> {
        let sql = format!(
            "UPDATE {} SET term_id = ?, taxonomy = ?, description = ?, parent = ?, count = ? \
             WHERE term_taxonomy_id = ?",
            self.tables.term_taxonomy()
        );
        let values = [
            QueryValue::Int(entry.term_id),
            QueryValue::Text(&entry.taxonomy),
            QueryValue::Text(&entry.description),
            QueryValue::Int(entry.parent),
            QueryValue::Int(entry.count),
            QueryValue::Int(entry.term_taxonomy_id),
        ];
        rows_affected(&self.pool, &sql, &values, "update term taxonomy").await?;
        Ok(entry.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE term_taxonomy_id = ?",
            self.tables.term_taxonomy()
        );
        let affected =
            rows_affected(&self.pool, &sql, &[QueryValue::Int(id)], "delete term taxonomy").await?;
        Ok(affected > 0)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<TermTaxonomy>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE term_taxonomy_id = ?",
            TAXONOMY_COLUMNS,
            self.tables.term_taxonomy()
        );
        Ok(self.select(&sql, &[QueryValue::Int(id)]).await?.into_iter().next())
    }

    async fn list_by_term(&self, term_id: i64) -> Result<Vec<TermTaxonomy>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE term_id = ? ORDER BY term_taxonomy_id",
            TAXONOMY_COLUMNS,
            self.tables.term_taxonomy()
        );
        self.select(&sql, &[QueryValue::Int(term_id)]).await
    }

    async fn list_by_object(&self, object_id: i64) -> Result<Vec<TermTaxonomy>> {
        let sql = format!(
            r#"
            SELECT tt.term_taxonomy_id, tt.term_id, tt.taxonomy, tt.description, tt.parent, tt.count
            FROM {} tt
            INNER JOIN {} tr ON tr.term_taxonomy_id = tt.term_taxonomy_id
            WHERE tr.object_id = ?
            ORDER BY tr.term_order, tt.term_taxonomy_id
            "#,
            self.tables.term_taxonomy(),
            self.tables.term_relationships()
        );
        self.select(&sql, &[QueryValue::Int(object_id)]).await
    }

    async fn find(&self, term_id: i64, taxonomy: &str) -> Result<Option<TermTaxonomy>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE term_id = ? AND taxonomy = ? ORDER BY term_taxonomy_id LIMIT 1",
            TAXONOMY_COLUMNS,
            self.tables.term_taxonomy()
        );
        let values = [QueryValue::Int(term_id), QueryValue::Text(taxonomy)];
        Ok(self.select(&sql, &values).await?.into_iter().next())
    }
}

// ============================================================================
// Relationships
// ============================================================================

/// Term relationship repository trait
#[async_trait]
pub trait TermRelationshipRepository: Send + Sync {
    /// Relate an object to a taxonomy entry; relating twice is a no-op
    async fn add(
        &self,
        object_id: i64,
        term_taxonomy_id: i64,
        term_order: i32,
    ) -> Result<TermRelationship>;

    /// Remove a relationship
    async fn remove(&self, object_id: i64, term_taxonomy_id: i64) -> Result<bool>;

    /// Relationships of an object
    async fn list_by_object(&self, object_id: i64) -> Result<Vec<TermRelationship>>;

    /// Relationships of a taxonomy entry
    async fn list_by_taxonomy(&self, term_taxonomy_id: i64) -> Result<Vec<TermRelationship>>;

    /// Relationships of every taxonomy entry of a term
    async fn list_by_term(&self, term_id: i64) -> Result<Vec<TermRelationship>>;
}

/// SQLx-based term relationship repository implementation
pub struct SqlxTermRelationshipRepository {
    pool: DynDatabasePool,
    tables: Tables,
}

impl SqlxTermRelationshipRepository {
    pub fn new(pool: DynDatabasePool, tables: Tables) -> Self {
        Self { pool, tables }
    }

    pub fn boxed(pool: DynDatabasePool, tables: Tables) -> Arc<dyn TermRelationshipRepository> {
        Arc::new(Self::new(pool, tables))
    }

    async fn select(&self, sql: &str, id: i64) -> Result<Vec<TermRelationship>> {
        match self.pool.backend() {
            Backend::Sqlite(pool) => select_relationships_sqlite(pool, sql, id).await,
            Backend::Mysql(pool) => select_relationships_mysql(pool, sql, id).await,
        }
    }
}

#[async_trait]
impl TermRelationshipRepository for SqlxTermRelationshipRepository {
    async fn add(
        &self,
        object_id: i64,
        term_taxonomy_id: i64,
        term_order: i32,
    ) -> Result<TermRelationship> {
        let insert = match self.pool.backend() {
            Backend::Sqlite(_) => "INSERT OR IGNORE INTO",
            Backend::Mysql(_) => "INSERT IGNORE INTO",
        };
        let sql = format!(
            "{} {} (object_id, term_taxonomy_id, term_order) VALUES (?, ?, ?)",
            insert,
            self.tables.term_relationships()
        );
        let values = [
            QueryValue::Int(object_id),
            QueryValue::Int(term_taxonomy_id),
            QueryValue::Int(i64::from(term_order)),
        ];
        rows_affected(&self.pool, &sql, &values, "add term relationship").await?;

        Ok(TermRelationship {
            object_id,
            term_taxonomy_id,
            term_order,
        })
    }

    async fn remove(&self, object_id: i64, term_taxonomy_id: i64) -> Result<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE object_id = ? AND term_taxonomy_id = ?",
            self.tables.term_relationships()
        );
        let values = [QueryValue::Int(object_id), QueryValue::Int(term_taxonomy_id)];
        let affected =
            rows_affected(&self.pool, &sql, &values, "remove term relationship").await?;
        Ok(affected > 0)
    }

    async fn list_by_object(&self, object_id: i64) -> Result<Vec<TermRelationship>> {
        let sql = format!(
            "SELECT object_id, term_taxonomy_id, term_order FROM {} \
             WHERE object_id = ? ORDER BY term_order, term_taxonomy_id",
            self.tables.term_relationships()
        );
        self.select(&sql, object_id).await
    }

    async fn list_by_taxonomy(&self, term_taxonomy_id: i64) -> Result<Vec<TermRelationship>> {
        let sql = format!(
            "SELECT object_id, term_taxonomy_id, term_order FROM {} \
             WHERE term_taxonomy_id = ? ORDER BY object_id",
            self.tables.term_relationships()
        );
        self.select(&sql, term_taxonomy_id).await
    }

    async fn list_by_term(&self, term_id: i64) -> Result<Vec<TermRelationship>> {
        let sql = format!(
            r#"
            SELECT tr.object_id, tr.term_taxonomy_id, tr.term_order
            FROM {} tr
            INNER JOIN {} tt ON tt.term_taxonomy_id = tr.term_taxonomy_id
            WHERE tt.term_id = ?
            ORDER BY tr.term_taxonomy_id, tr.object_id
            "#,
            self.tables.term_relationships(),
            self.tables.term_taxonomy()
        );
        self.select(&sql, term_id).await
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_term_sqlite(pool: &SqlitePool, sql: &str, term: &Term) -> Result<i64> {
    let result = sqlx::query(sql)
        .bind(&term.name)
        .bind(&term.slug)
        .bind(term.term_group)
        .execute(pool)
        .await
        .context("Failed to create term")?;
    Ok(result.last_insert_rowid())
}

async fn select_terms_sqlite(
    pool: &SqlitePool,
    sql: &str,
    values: &[QueryValue<'_>],
) -> Result<Vec<Term>> {
    let rows = bind_values!(sqlx::query(sql), values.iter().copied())
        .fetch_all(pool)
        .await
        .context("Failed to query terms")?;

    rows.iter()
        .map(|row| -> Result<Term> {
            Ok(Term {
                term_id: row.try_get("term_id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                term_group: row.try_get("term_group")?,
            })
        })
        .collect()
}

async fn create_taxonomy_sqlite(pool: &SqlitePool, sql: &str, entry: &TermTaxonomy) -> Result<i64> {
    let result = sqlx::query(sql)
        .bind(entry.term_id)
        .bind(&entry.taxonomy)
        .bind(&entry.description)
        .bind(entry.parent)
        .bind(entry.count)
        .execute(pool)
        .await
        .context("Failed to create term taxonomy")?;
    Ok(result.last_insert_rowid())
}

async fn select_taxonomies_sqlite(
    pool: &SqlitePool,
    sql: &str,
    values: &[QueryValue<'_>],
) -> Result<Vec<TermTaxonomy>> {
    let rows = bind_values!(sqlx::query(sql), values.iter().copied())
        .fetch_all(pool)
        .await
        .context("Failed to query term taxonomies")?;

    rows.iter()
        .map(|row| -> Result<TermTaxonomy> {
            Ok(TermTaxonomy {
                term_taxonomy_id: row.try_get("term_taxonomy_id")?,
                term_id: row.try_get("term_id")?,
                taxonomy: row.try_get("taxonomy")?,
                description: row.try_get("description")?,
                parent: row.try_get("parent")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

async fn select_relationships_sqlite(
    pool: &SqlitePool,
    sql: &str,
    id: i64,
) -> Result<Vec<TermRelationship>> {
    let rows = sqlx::query(sql)
        .bind(id)
        .fetch_all(pool)
        .await
        .context("Failed to query term relationships")?;

    rows.iter()
        .map(|row| -> Result<TermRelationship> {
            Ok(TermRelationship {
                object_id: row.try_get("object_id")?,
                term_taxonomy_id: row.try_get("term_taxonomy_id")?,
                term_order: row.try_get("term_order")?,
            })
        })
        .collect()
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_term_mysql(pool: &MySqlPool, sql: &str, term: &Term) -> Result<i64> {
    let result = sqlx::query(sql)
        .bind(&term.name)
        .bind(&term.slug)
        .bind(term.term_group)
        .execute(pool)
        .await
        .context("Failed to create term")?;
    mysql_insert_id(result.last_insert_id())
}

async fn select_terms_mysql(
    pool: &MySqlPool,
    sql: &str,
    values: &[QueryValue<'_>],
) -> Result<Vec<Term>> {
    let rows = bind_values!(sqlx::query(sql), values.iter().copied())
        .fetch_all(pool)
        .await
        .context("Failed to query terms")?;

    rows.iter()
        .map(|row| -> Result<Term> {
            Ok(Term {
                term_id: mysql_id(row, "term_id")?,
                name: row.try_get("name")?,
                slug: row.try_get("slug")?,
                term_group: row.try_get("term_group")?,
            })
        })
        .collect()
}

async fn create_taxonomy_mysql(pool: &MySqlPool, sql: &str, entry: &TermTaxonomy) -> Result<i64> {
    let result = sqlx::query(sql)
        .bind(entry.term_id)
        .bind(&entry.taxonomy)
        .bind(&entry.description)
        .bind(entry.parent)
        .bind(entry.count)
        .execute(pool)
        .await
        .context("Failed to create term taxonomy")?;
    mysql_insert_id(result.last_insert_id())
}

async fn select_taxonomies_mysql(
    pool: &MySqlPool,
    sql: &str,
    values: &[QueryValue<'_>],
) -> Result<Vec<TermTaxonomy>> {
    let rows = bind_values!(sqlx::query(sql), values.iter().copied())
        .fetch_all(pool)
        .await
        .context("Failed to query term taxonomies")?;

    rows.iter()
        .map(|row| -> Result<TermTaxonomy> {
            Ok(TermTaxonomy {
                term_taxonomy_id: mysql_id(row, "term_taxonomy_id")?,
                term_id: mysql_id(row, "term_id")?,
                taxonomy: row.try_get("taxonomy")?,
                description: row.try_get("description")?,
                parent: mysql_id(row, "parent")?,
                count: row.try_get("count")?,
            })
        })
        .collect()
}

async fn select_relationships_mysql(
    pool: &MySqlPool,
    sql: &str,
    id: i64,
) -> Result<Vec<TermRelationship>> {
    let rows = sqlx::query(sql)
        .bind(id)
        .fetch_all(pool)
        .await
        .context("Failed to query term relationships")?;

    rows.iter()
        .map(|row| -> Result<TermRelationship> {
            Ok(TermRelationship {
                object_id: mysql_id(row, "object_id")?,
                term_taxonomy_id: mysql_id(row, "term_taxonomy_id")?,
                term_order: row.try_get("term_order")?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::models::taxonomy;

    struct Repos {
        terms: SqlxTermRepository,
        taxonomies: SqlxTermTaxonomyRepository,
        relationships: SqlxTermRelationshipRepository,
    }

    async fn setup_test_repos() -> Repos {
        let (pool, tables) = schema::setup().await;
        Repos {
            terms: SqlxTermRepository::new(pool.clone(), tables.clone()),
            taxonomies: SqlxTermTaxonomyRepository::new(pool.clone(), tables.clone()),
            relationships: SqlxTermRelationshipRepository::new(pool, tables),
        }
    }

    /// Helper to create a term with one taxonomy entry
    async fn create_test_entry(repos: &Repos, name: &str, tax: &str) -> (Term, TermTaxonomy) {
        let term = repos
            .terms
            .create(&Term::new(name, name.to_lowercase()))
            .await
            .expect("Failed to create term");
        let entry = repos
            .taxonomies
            .create(&TermTaxonomy::new(term.term_id, tax))
            .await
            .expect("Failed to create taxonomy");
        (term, entry)
    }

    #[tokio::test]
    async fn test_create_and_get_term() {
        let repos = setup_test_repos().await;
        let term = repos
            .terms
            .create(&Term::new("Ruby", "ruby"))
            .await
            .expect("Failed to create term");

        assert!(term.term_id > 0);
        assert_eq!(repos.terms.get_by_id(term.term_id).await.unwrap(), Some(term.clone()));
        assert_eq!(repos.terms.get_by_slug("ruby").await.unwrap(), Some(term));
        assert!(repos.terms.get_by_slug("python").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete_term() {
        let repos = setup_test_repos().await;
        let mut term = repos.terms.create(&Term::new("Ruby", "ruby")).await.unwrap();

        term.name = "Ruby Lang".to_string();
        term.term_group = 2;
        repos.terms.update(&term).await.unwrap();
        let found = repos.terms.get_by_id(term.term_id).await.unwrap().unwrap();
        assert_eq!(found.name, "Ruby Lang");
        assert_eq!(found.term_group, 2);

        assert!(repos.terms.delete(term.term_id).await.unwrap());
        assert!(!repos.terms.delete(term.term_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_taxonomy_lookups() {
        let repos = setup_test_repos().await;
        let (term, tag) = create_test_entry(&repos, "Ruby", taxonomy::POST_TAG).await;
        let category = repos
            .taxonomies
            .create(&TermTaxonomy::new(term.term_id, taxonomy::CATEGORY))
            .await
            .unwrap();

        let entries = repos.taxonomies.list_by_term(term.term_id).await.unwrap();
        assert_eq!(entries, vec![tag.clone(), category.clone()]);

        let found = repos
            .taxonomies
            .find(term.term_id, taxonomy::CATEGORY)
            .await
            .unwrap();
        assert_eq!(found, Some(category));
        assert!(repos
            .taxonomies
            .find(term.term_id, taxonomy::LINK_CATEGORY)
            .await
            .unwrap()
            .is_none());

        let mut tag = tag;
        tag.description = "Posts about Ruby".to_string();
        tag.count = 4;
        repos.taxonomies.update(&tag).await.unwrap();
        let found = repos
            .taxonomies
            .get_by_id(tag.term_taxonomy_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.description, "Posts about Ruby");
        assert_eq!(found.count, 4);

        assert!(repos.taxonomies.delete(tag.term_taxonomy_id).await.unwrap());
        assert_eq!(repos.taxonomies.list_by_term(term.term_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_relationship_is_idempotent() {
        let repos = setup_test_repos().await;
        let (_term, tag) = create_test_entry(&repos, "Ruby", taxonomy::POST_TAG).await;

        repos
            .relationships
            .add(10, tag.term_taxonomy_id, 0)
            .await
            .expect("Failed to add relationship");
        repos
            .relationships
            .add(10, tag.term_taxonomy_id, 0)
            .await
            .expect("Adding twice should not fail");

        let relationships = repos.relationships.list_by_object(10).await.unwrap();
        assert_eq!(relationships.len(), 1);
        assert_eq!(relationships[0].term_taxonomy_id, tag.term_taxonomy_id);

        assert!(repos.relationships.remove(10, tag.term_taxonomy_id).await.unwrap());
        assert!(!repos.relationships.remove(10, tag.term_taxonomy_id).await.unwrap());
        assert!(repos.relationships.list_by_object(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relationship_listings() {
        let repos = setup_test_repos().await;
        let (ruby, ruby_tag) = create_test_entry(&repos, "Ruby", taxonomy::POST_TAG).await;
        let ruby_category = repos
            .taxonomies
            .create(&TermTaxonomy::new(ruby.term_id, taxonomy::CATEGORY))
            .await
            .unwrap();
        let (_rust, rust_tag) = create_test_entry(&repos, "Rust", taxonomy::POST_TAG).await;

        repos.relationships.add(1, ruby_tag.term_taxonomy_id, 0).await.unwrap();
        repos.relationships.add(2, ruby_tag.term_taxonomy_id, 0).await.unwrap();
        repos.relationships.add(2, ruby_category.term_taxonomy_id, 0).await.unwrap();
        repos.relationships.add(2, rust_tag.term_taxonomy_id, 1).await.unwrap();

        let by_taxonomy = repos
            .relationships
            .list_by_taxonomy(ruby_tag.term_taxonomy_id)
            .await
            .unwrap();
        let objects: Vec<i64> = by_taxonomy.iter().map(|r| r.object_id).collect();
        assert_eq!(objects, vec![1, 2]);

        let by_term = repos.relationships.list_by_term(ruby.term_id).await.unwrap();
        assert_eq!(by_term.len(), 3);

        let entries = repos.taxonomies.list_by_object(2).await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].term_taxonomy_id, rust_tag.term_taxonomy_id);
    }

    #[tokio::test]
    async fn test_terms_by_object() {
        let repos = setup_test_repos().await;
        let (ruby, ruby_tag) = create_test_entry(&repos, "Ruby", taxonomy::POST_TAG).await;
        let ruby_category = repos
            .taxonomies
            .create(&TermTaxonomy::new(ruby.term_id, taxonomy::CATEGORY))
            .await
            .unwrap();
        let (_news, news_category) = create_test_entry(&repos, "News", taxonomy::CATEGORY).await;

        repos.relationships.add(5, ruby_tag.term_taxonomy_id, 0).await.unwrap();
        repos.relationships.add(5, ruby_category.term_taxonomy_id, 0).await.unwrap();
        repos.relationships.add(5, news_category.term_taxonomy_id, 0).await.unwrap();

        let all = repos.terms.list_by_object(5, None).await.unwrap();
        let names: Vec<&str> = all.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["News", "Ruby"]);

        let tags = repos
            .terms
            .list_by_object(5, Some(taxonomy::POST_TAG))
            .await
            .unwrap();
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ruby"]);

        assert!(repos.terms.list_by_object(6, None).await.unwrap().is_empty());
    }
}
