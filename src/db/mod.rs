//! Database layer
//!
//! Connection handling and table-level data access for an existing
//! WordPress-style schema. Both SQLite and MySQL are supported; the driver
//! is selected by configuration.
//!
//! # Usage
//!
//! ```ignore
//! use wp_records::config::DatabaseConfig;
//! use wp_records::db::{create_pool, Tables};
//!
//! let config = DatabaseConfig::default();
//! let pool = create_pool(&config).await?;
//! let tables = Tables::new(&config.table_prefix)?;
//! pool.ping().await?;
//! ```

pub mod pool;
pub mod repositories;
#[cfg(test)]
pub(crate) mod schema;
pub mod tables;

pub use pool::{
    create_pool, create_test_pool, Backend, DatabasePool, DynDatabasePool, MysqlDatabase,
    SqliteDatabase,
};
pub use tables::Tables;
