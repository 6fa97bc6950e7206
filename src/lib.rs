//! wp-records - typed records over the WordPress schema
//!
//! This library maps the platform's tables (posts, comments, terms, users,
//! links, options and metadata) to Rust records, runs the platform's rules
//! before writes, and exposes relationship traversal as explicit queries.

pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod validation;

pub use clock::SiteClock;
pub use error::RecordError;
pub use store::Store;
