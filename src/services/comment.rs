//! Comment service
//!
//! A comment is only written when its parent post exists and is open for
//! comments.

use tracing::{debug, warn};

use crate::clock::SiteClock;
use crate::error::RecordError;
use crate::models::{Comment, Post};
use crate::services::Repositories;
use crate::validation::{
    presence, presence_of_id, run_checks, Check, FieldError, ValidationErrors, BASE,
};

fn post_id_present(comment: &Comment) -> Option<FieldError> {
    presence_of_id("comment_post_ID", comment.comment_post_id)
}

fn author_present(comment: &Comment) -> Option<FieldError> {
    presence("comment_author", &comment.comment_author)
}

fn content_present(comment: &Comment) -> Option<FieldError> {
    presence("comment_content", &comment.comment_content)
}

fn email_present(comment: &Comment) -> Option<FieldError> {
    presence("comment_author_email", &comment.comment_author_email)
}

/// Rules a comment must pass before its parent post is consulted.
pub const COMMENT_CHECKS: &[Check<Comment>] = &[
    post_id_present,
    author_present,
    content_present,
    email_present,
];

pub const COMMENTS_CLOSED: &str = "Sorry, comments are closed for this post";

/// Comment service
pub struct CommentService {
    repos: Repositories,
    clock: SiteClock,
}

impl CommentService {
    pub fn new(repos: Repositories, clock: SiteClock) -> Self {
        Self { repos, clock }
    }

    /// Save a comment
    ///
    /// Unset dates default to now. After the presence checks the parent
    /// post is loaded: a missing post is reported on `comment_post_ID`, a
    /// post whose `comment_status` is not `open` yields [`COMMENTS_CLOSED`].
    pub async fn save(&self, mut comment: Comment) -> Result<Comment, RecordError> {
        let now = self.clock.now();
        if comment.comment_date.is_none() {
            comment.comment_date = Some(self.clock.local(now));
        }
        if comment.comment_date_gmt.is_none() {
            comment.comment_date_gmt = Some(now.naive_utc());
        }

        let mut errors = run_checks(&comment, COMMENT_CHECKS);
        if errors.on("comment_post_ID").is_empty() {
            self.check_post(&comment, &mut errors).await?;
        }
        if !errors.is_empty() {
            warn!(
                post_id = comment.comment_post_id,
                %errors,
                "Comment rejected"
            );
            return Err(errors.into());
        }

        let saved = if comment.is_new() {
            self.repos.comments.create(&comment).await?
        } else {
            self.find(comment.id).await?;
            self.repos.comments.update(&comment).await?
        };

        debug!(
            comment_id = saved.id,
            post_id = saved.comment_post_id,
            "Comment saved"
        );
        Ok(saved)
    }

    async fn check_post(
        &self,
        comment: &Comment,
        errors: &mut ValidationErrors,
    ) -> Result<(), RecordError> {
        match self.repos.posts.get_by_id(comment.comment_post_id).await? {
            None => errors.add("comment_post_ID", "post does not exist"),
            Some(post) if !post.accepts_comments() => errors.add(BASE, COMMENTS_CLOSED),
            Some(_) => {}
        }
        Ok(())
    }

    pub async fn find(&self, id: i64) -> Result<Comment, RecordError> {
        self.get(id)
            .await?
            .ok_or(RecordError::NotFound { entity: "Comment", id })
    }

    pub async fn get(&self, id: i64) -> Result<Option<Comment>, RecordError> {
        Ok(self.repos.comments.get_by_id(id).await?)
    }

    /// Comments on a post, oldest first
    pub async fn for_post(&self, post_id: i64) -> Result<Vec<Comment>, RecordError> {
        Ok(self.repos.comments.list_by_post(post_id).await?)
    }

    /// Comments in one moderation state (`1`, `0`, `spam`, `trash`), newest first
    pub async fn with_approval(&self, approved: &str) -> Result<Vec<Comment>, RecordError> {
        Ok(self.repos.comments.list_by_approval(approved).await?)
    }

    /// The post a comment belongs to
    pub async fn post(&self, comment: &Comment) -> Result<Option<Post>, RecordError> {
        Ok(self.repos.posts.get_by_id(comment.comment_post_id).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, RecordError> {
        let deleted = self.repos.comments.delete(id).await?;
        if deleted {
            debug!(comment_id = id, "Comment deleted");
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use crate::models::{comment_approval, comment_status, post_status};

    async fn setup_test_service() -> (Repositories, CommentService) {
        let (pool, tables) = schema::setup().await;
        let repos = Repositories::sqlx(&pool, &tables);
        let service = CommentService::new(repos.clone(), SiteClock::utc());
        (repos, service)
    }

    async fn create_post(repos: &Repositories, status: &str) -> Post {
        let mut post = Post::new(1, "Hello", "World").with_status(post_status::PUBLISH);
        post.comment_status = status.to_string();
        post.stamp(&SiteClock::utc(), chrono::Utc::now());
        repos.posts.create(&post).await.expect("Failed to create post")
    }

    fn comment_on(post_id: i64) -> Comment {
        Comment::new(post_id, "Ann", "ann@example.com", "Nice post")
    }

    #[tokio::test]
    async fn test_comment_on_open_post_is_saved() {
        let (_repos, service) = setup_test_service().await;
        let post = create_post(&service.repos, comment_status::OPEN).await;

        let saved = service
            .save(comment_on(post.id))
            .await
            .expect("Failed to save comment");

        assert!(saved.id > 0);
        assert!(saved.comment_date.is_some());
        assert_eq!(saved.comment_date, saved.comment_date_gmt);
        let comments = service.for_post(post.id).await.unwrap();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].comment_content, "Nice post");
    }

    #[tokio::test]
    async fn test_comment_on_closed_post_is_rejected() {
        let (repos, service) = setup_test_service().await;
        for status in [comment_status::CLOSED, "registered_only", ""] {
            let post = create_post(&repos, status).await;

            let err = service.save(comment_on(post.id)).await.unwrap_err();

            let errors = err.validation().expect("validation error");
            assert_eq!(errors.on(BASE).len(), 1);
            assert_eq!(errors.to_string(), COMMENTS_CLOSED);
            assert!(service.for_post(post.id).await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let (_repos, service) = setup_test_service().await;

        let err = service.save(comment_on(404)).await.unwrap_err();

        let errors = err.validation().expect("validation error");
        let on_post = errors.on("comment_post_ID");
        assert_eq!(on_post.len(), 1);
        assert_eq!(on_post[0].message, "post does not exist");
        assert!(service.with_approval(comment_approval::APPROVED).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_fields_are_reported_together() {
        let (_repos, service) = setup_test_service().await;
        let post = create_post(&service.repos, comment_status::OPEN).await;
        let comment = Comment::new(post.id, " ", "", "");

        let err = service.save(comment).await.unwrap_err();

        let fields: Vec<&str> = err
            .validation()
            .expect("validation error")
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(
            fields,
            vec!["comment_author", "comment_content", "comment_author_email"]
        );
    }

    #[tokio::test]
    async fn test_missing_post_id_skips_lookup() {
        let (_repos, service) = setup_test_service().await;

        let err = service.save(comment_on(0)).await.unwrap_err();

        let errors = err.validation().expect("validation error");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.on("comment_post_ID")[0].message, "can't be blank");
    }

    #[tokio::test]
    async fn test_update_and_delete_comment() {
        let (_repos, service) = setup_test_service().await;
        let post = create_post(&service.repos, comment_status::OPEN).await;
        let mut comment = service.save(comment_on(post.id)).await.unwrap();

        comment.comment_approved = comment_approval::SPAM.to_string();
        service.save(comment.clone()).await.expect("Failed to update comment");
        let spam = service.with_approval(comment_approval::SPAM).await.unwrap();
        assert_eq!(spam.len(), 1);

        let parent = service.post(&comment).await.unwrap().expect("post exists");
        assert_eq!(parent.id, post.id);

        assert!(service.delete(comment.id).await.unwrap());
        assert!(service.find(comment.id).await.unwrap_err().is_not_found());
    }
}
