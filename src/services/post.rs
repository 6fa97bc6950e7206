//! Post service
//!
//! Implements post persistence and traversal:
//! - `save` refreshes the four timestamps, validates, then inserts or updates
//! - listings go through [`PostQuery`] (newest first unless told otherwise)
//! - relationship traversal: author, comments, metadata, terms
//!
//! A post's tags are the terms reached through its relationships and their
//! taxonomy entries. [`PostService::tags`] follows every taxonomy;
//! [`PostService::terms`] restricts the walk to one.

use chrono::Utc;
use tracing::{debug, warn};

use crate::clock::SiteClock;
use crate::error::RecordError;
use crate::models::{
    Comment, Post, PostMeta, PostQuery, Term, TermRelationship, TermTaxonomy, User,
};
use crate::services::Repositories;
use crate::validation::{presence_of_time, run_checks, Check, FieldError};

fn post_date_present(post: &Post) -> Option<FieldError> {
    presence_of_time("post_date", post.post_date)
}

fn post_date_gmt_present(post: &Post) -> Option<FieldError> {
    presence_of_time("post_date_gmt", post.post_date_gmt)
}

fn post_modified_present(post: &Post) -> Option<FieldError> {
    presence_of_time("post_modified", post.post_modified)
}

fn post_modified_gmt_present(post: &Post) -> Option<FieldError> {
    presence_of_time("post_modified_gmt", post.post_modified_gmt)
}

/// Rules a post must pass before it is written.
pub const POST_CHECKS: &[Check<Post>] = &[
    post_modified_present,
    post_modified_gmt_present,
    post_date_present,
    post_date_gmt_present,
];

/// Post service for persisting and traversing posts
pub struct PostService {
    repos: Repositories,
    clock: SiteClock,
}

impl PostService {
    /// Create a new post service
    pub fn new(repos: Repositories, clock: SiteClock) -> Self {
        Self { repos, clock }
    }

    /// Save a post
    ///
    /// Stamps the timestamps for the current instant (see [`Post::stamp`]),
    /// runs [`POST_CHECKS`], then inserts a new post or updates an existing
    /// one. Nothing is written when a check fails.
    ///
    /// # Errors
    ///
    /// - `Validation` if a rule fails
    /// - `NotFound` when updating a post that no longer exists
    /// - `Store` for database errors
    pub async fn save(&self, mut post: Post) -> Result<Post, RecordError> {
        post.stamp(&self.clock, self.clock.now());

        let errors = run_checks(&post, POST_CHECKS);
        if !errors.is_empty() {
            warn!(post_id = post.id, %errors, "Post rejected");
            return Err(errors.into());
        }

        let saved = if post.is_new() {
            self.repos.posts.create(&post).await?
        } else {
            self.ensure_exists(post.id).await?;
            self.repos.posts.update(&post).await?
        };

        debug!(post_id = saved.id, status = %saved.post_status, "Post saved");
        Ok(saved)
    }

    async fn ensure_exists(&self, id: i64) -> Result<(), RecordError> {
        self.find(id).await.map(|_| ())
    }

    /// Get a post, failing when it does not exist
    pub async fn find(&self, id: i64) -> Result<Post, RecordError> {
        self.get(id)
            .await?
            .ok_or(RecordError::NotFound { entity: "Post", id })
    }

    /// Get a post if it exists
    pub async fn get(&self, id: i64) -> Result<Option<Post>, RecordError> {
        Ok(self.repos.posts.get_by_id(id).await?)
    }

    pub async fn list(&self, query: &PostQuery) -> Result<Vec<Post>, RecordError> {
        Ok(self.repos.posts.list(query).await?)
    }

    pub async fn count(&self, query: &PostQuery) -> Result<i64, RecordError> {
        Ok(self.repos.posts.count(query).await?)
    }

    /// A page of posts with status `publish`, newest first
    pub async fn published(&self, limit: i64, offset: i64) -> Result<Vec<Post>, RecordError> {
        self.list(&PostQuery::published().page(limit, offset)).await
    }

    /// Whether a post is live now in site-local time
    pub fn is_live(&self, post: &Post) -> bool {
        post.is_published(self.clock.local(Utc::now()))
    }

    /// Delete a post; related rows are left alone
    pub async fn delete(&self, id: i64) -> Result<bool, RecordError> {
        let deleted = self.repos.posts.delete(id).await?;
        if deleted {
            debug!(post_id = id, "Post deleted");
        }
        Ok(deleted)
    }

    /// The user named by `post_author`
    pub async fn author(&self, post: &Post) -> Result<Option<User>, RecordError> {
        Ok(self.repos.users.get_by_id(post.post_author).await?)
    }

    /// Comments of a post, oldest first
    pub async fn comments(&self, post_id: i64) -> Result<Vec<Comment>, RecordError> {
        Ok(self.repos.comments.list_by_post(post_id).await?)
    }

    pub async fn metas(&self, post_id: i64) -> Result<Vec<PostMeta>, RecordError> {
        Ok(self.repos.post_metas.list_for(post_id).await?)
    }

    pub async fn term_relationships(
        &self,
        post_id: i64,
    ) -> Result<Vec<TermRelationship>, RecordError> {
        Ok(self.repos.term_relationships.list_by_object(post_id).await?)
    }

    /// Taxonomy entries the post is related to
    pub async fn term_taxonomies(&self, post_id: i64) -> Result<Vec<TermTaxonomy>, RecordError> {
        Ok(self.repos.term_taxonomies.list_by_object(post_id).await?)
    }

    /// Every term reached through the post's relationships, whatever the
    /// taxonomy
    pub async fn tags(&self, post_id: i64) -> Result<Vec<Term>, RecordError> {
        Ok(self.repos.terms.list_by_object(post_id, None).await?)
    }

    /// Terms of the post within one taxonomy (`post_tag`, `category`, ...)
    pub async fn terms(&self, post_id: i64, taxonomy: &str) -> Result<Vec<Term>, RecordError> {
        Ok(self
            .repos
            .terms
            .list_by_object(post_id, Some(taxonomy))
            .await?)
    }
}
