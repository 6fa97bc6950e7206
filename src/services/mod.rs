//! Business logic services
//!
//! Services run the platform's rules (timestamps, presence, uniqueness,
//! comment permission) before a write, and expose relationship traversal
//! as explicit queries. They are built over repository trait objects so a
//! store can be swapped without touching them.

pub mod comment;
pub mod password;
pub mod post;
pub mod term;
pub mod user;

pub use comment::CommentService;
pub use password::legacy_md5_digest;
pub use post::PostService;
pub use term::TermService;
pub use user::UserService;

use std::sync::Arc;

use crate::db::repositories::{
    CommentRepository, LinkRepository, MetaRepository, OptionRepository, PostRepository,
    SqlxCommentRepository, SqlxLinkRepository, SqlxMetaRepository, SqlxOptionRepository,
    SqlxPostRepository, SqlxTermRelationshipRepository, SqlxTermRepository,
    SqlxTermTaxonomyRepository, SqlxUserRepository, TermRelationshipRepository, TermRepository,
    TermTaxonomyRepository, UserRepository,
};
use crate::db::{DynDatabasePool, Tables};
use crate::models::{PostMeta, UserMeta};

/// One handle per platform table.
#[derive(Clone)]
pub struct Repositories {
    pub posts: Arc<dyn PostRepository>,
    pub post_metas: Arc<dyn MetaRepository<PostMeta>>,
    pub comments: Arc<dyn CommentRepository>,
    pub users: Arc<dyn UserRepository>,
    pub user_metas: Arc<dyn MetaRepository<UserMeta>>,
    pub terms: Arc<dyn TermRepository>,
    pub term_taxonomies: Arc<dyn TermTaxonomyRepository>,
    pub term_relationships: Arc<dyn TermRelationshipRepository>,
    pub links: Arc<dyn LinkRepository>,
    pub options: Arc<dyn OptionRepository>,
}

impl Repositories {
    /// SQLx repositories over `pool`, all using the same table names.
    pub fn sqlx(pool: &DynDatabasePool, tables: &Tables) -> Self {
        Self {
            posts: SqlxPostRepository::boxed(pool.clone(), tables.clone()),
            post_metas: SqlxMetaRepository::<PostMeta>::boxed(pool.clone(), tables.clone()),
            comments: SqlxCommentRepository::boxed(pool.clone(), tables.clone()),
            users: SqlxUserRepository::boxed(pool.clone(), tables.clone()),
            user_metas: SqlxMetaRepository::<UserMeta>::boxed(pool.clone(), tables.clone()),
            terms: SqlxTermRepository::boxed(pool.clone(), tables.clone()),
            term_taxonomies: SqlxTermTaxonomyRepository::boxed(pool.clone(), tables.clone()),
            term_relationships: SqlxTermRelationshipRepository::boxed(
                pool.clone(),
                tables.clone(),
            ),
            links: SqlxLinkRepository::boxed(pool.clone(), tables.clone()),
            options: SqlxOptionRepository::boxed(pool.clone(), tables.clone()),
        }
    }
}
