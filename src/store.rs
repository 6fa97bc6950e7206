//! Store
//!
//! Explicit context object tying one connection pool, one table naming and
//! one site clock to the services and repositories built over them. Several
//! stores (different databases or prefixes) can live side by side.
//!
//! ```ignore
//! use wp_records::{config::Config, Store};
//!
//! let config = Config::load_with_env(Path::new("config.yml"))?;
//! let store = Store::connect(&config).await?;
//! let posts = store.posts().published(10, 0).await?;
//! ```

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::clock::SiteClock;
use crate::config::{Config, ConfigError};
use crate::db::repositories::{LinkRepository, MetaRepository, OptionRepository};
use crate::db::{create_pool, DynDatabasePool, Tables};
use crate::models::{PostMeta, UserMeta};
use crate::services::{CommentService, PostService, Repositories, TermService, UserService};

pub struct Store {
    pool: DynDatabasePool,
    tables: Tables,
    clock: SiteClock,
    repos: Repositories,
    posts: PostService,
    comments: CommentService,
    users: UserService,
    terms: TermService,
}

impl Store {
    /// Validate `config`, open its pool and wire every service.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid configuration or when the database
    /// cannot be reached.
    pub async fn connect(config: &Config) -> Result<Self> {
        config.validate()?;
        let pool = create_pool(&config.database).await?;
        pool.ping().await?;
        let store = Self::from_pool(pool, config)?;
        info!(
            driver = ?config.database.driver,
            prefix = store.tables.prefix(),
            "Store connected"
        );
        Ok(store)
    }

    /// Wire the services over an existing pool.
    pub fn from_pool(pool: DynDatabasePool, config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let tables = Tables::new(&config.database.table_prefix)?;
        let clock = SiteClock::from_config(&config.site)?;
        let repos = Repositories::sqlx(&pool, &tables);

        Ok(Self {
            posts: PostService::new(repos.clone(), clock),
            comments: CommentService::new(repos.clone(), clock),
            users: UserService::new(repos.clone(), clock),
            terms: TermService::new(repos.clone()),
            pool,
            tables,
            clock,
            repos,
        })
    }

    pub fn posts(&self) -> &PostService {
        &self.posts
    }

    pub fn comments(&self) -> &CommentService {
        &self.comments
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }

    pub fn terms(&self) -> &TermService {
        &self.terms
    }

    pub fn post_metas(&self) -> Arc<dyn MetaRepository<PostMeta>> {
        self.repos.post_metas.clone()
    }

    pub fn user_metas(&self) -> Arc<dyn MetaRepository<UserMeta>> {
        self.repos.user_metas.clone()
    }

    pub fn links(&self) -> Arc<dyn LinkRepository> {
        self.repos.links.clone()
    }

    pub fn options(&self) -> Arc<dyn OptionRepository> {
        self.repos.options.clone()
    }

    /// Every repository, for queries the services do not cover
    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub fn pool(&self) -> &DynDatabasePool {
        &self.pool
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn clock(&self) -> SiteClock {
        self.clock
    }

    /// Close the underlying pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
