//! User service
//!
//! Implements account persistence:
//! - `save` defaults `user_registered` on create, then checks presence and
//!   uniqueness of `user_login` and `user_email`
//! - lookups by id, login and email
//! - traversal to a user's posts and metadata
//!
//! `user_pass` is stored exactly as given. See [`crate::services::password`].

use tracing::{debug, warn};

use crate::clock::SiteClock;
use crate::error::RecordError;
use crate::models::{Post, PostQuery, User, UserMeta};
use crate::services::Repositories;
use crate::validation::{presence, presence_of_time, run_checks, Check, FieldError, ValidationErrors};

const TAKEN: &str = "has already been taken";

fn registered_present(user: &User) -> Option<FieldError> {
    presence_of_time("user_registered", user.user_registered)
}

fn login_present(user: &User) -> Option<FieldError> {
    presence("user_login", &user.user_login)
}

fn email_present(user: &User) -> Option<FieldError> {
    presence("user_email", &user.user_email)
}

/// Rules checked before uniqueness is looked up.
pub const USER_CHECKS: &[Check<User>] = &[registered_present, login_present, email_present];

/// User service
pub struct UserService {
    repos: Repositories,
    clock: SiteClock,
}

impl UserService {
    pub fn new(repos: Repositories, clock: SiteClock) -> Self {
        Self { repos, clock }
    }

    /// Save a user
    ///
    /// A new user without `user_registered` is registered now (UTC). Login
    /// and email must be present and not used by any other row.
    ///
    /// # Errors
    ///
    /// - `Validation` listing every failed rule; nothing is written
    /// - `NotFound` when updating a user that no longer exists
    pub async fn save(&self, mut user: User) -> Result<User, RecordError> {
        if user.is_new() && user.user_registered.is_none() {
            user.user_registered = Some(self.clock.now().naive_utc());
        }

        let mut errors = run_checks(&user, USER_CHECKS);
        self.check_uniqueness(&user, &mut errors).await?;
        if !errors.is_empty() {
            warn!(login = %user.user_login, %errors, "User rejected");
            return Err(errors.into());
        }

        let saved = if user.is_new() {
            self.repos.users.create(&user).await?
        } else {
            self.find(user.id).await?;
            self.repos.users.update(&user).await?
        };

        debug!(user_id = saved.id, login = %saved.user_login, "User saved");
        Ok(saved)
    }

    /// Blank values are already reported by the presence checks.
    async fn check_uniqueness(
        &self,
        user: &User,
        errors: &mut ValidationErrors,
    ) -> Result<(), RecordError> {
        if errors.on("user_login").is_empty()
            && self.repos.users.login_taken(&user.user_login, user.id).await?
        {
            errors.add("user_login", TAKEN);
        }
        if errors.on("user_email").is_empty()
            && self.repos.users.email_taken(&user.user_email, user.id).await?
        {
            errors.add("user_email", TAKEN);
        }
        Ok(())
    }

    pub async fn find(&self, id: i64) -> Result<User, RecordError> {
        self.get(id)
            .await?
            .ok_or(RecordError::NotFound { entity: "User", id })
    }

    pub async fn get(&self, id: i64) -> Result<Option<User>, RecordError> {
        Ok(self.repos.users.get_by_id(id).await?)
    }

    pub async fn find_by_login(&self, login: &str) -> Result<Option<User>, RecordError> {
        Ok(self.repos.users.get_by_login(login).await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, RecordError> {
        Ok(self.repos.users.get_by_email(email).await?)
    }

    pub async fn list(&self) -> Result<Vec<User>, RecordError> {
        Ok(self.repos.users.list().await?)
    }

    /// Delete a user; their posts and metadata stay
    pub async fn delete(&self, id: i64) -> Result<bool, RecordError> {
        let deleted = self.repos.users.delete(id).await?;
        if deleted {
            debug!(user_id = id, "User deleted");
        }
        Ok(deleted)
    }

    /// Posts written by the user, newest first
    pub async fn posts(&self, user_id: i64) -> Result<Vec<Post>, RecordError> {
        Ok(self.repos.posts.list(&PostQuery::new().author(user_id)).await?)
    }

    pub async fn metas(&self, user_id: i64) -> Result<Vec<UserMeta>, RecordError> {
        Ok(self.repos.user_metas.list_for(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;
    use chrono::{NaiveDate, Utc};
    use proptest::prelude::*;

    async fn setup_test_service() -> UserService {
        let (pool, tables) = schema::setup().await;
        UserService::new(Repositories::sqlx(&pool, &tables), SiteClock::utc())
    }

    #[tokio::test]
    async fn test_save_defaults_registration() {
        let service = setup_test_service().await;
        let before = Utc::now().naive_utc() - chrono::Duration::seconds(1);

        let user = service
            .save(User::new("admin", "admin@example.com"))
            .await
            .expect("Failed to save user");

        assert!(user.id > 0);
        let registered = user.user_registered.expect("registration set");
        assert!(registered >= before);
        assert_eq!(service.find(user.id).await.unwrap(), user);
    }

    #[tokio::test]
    async fn test_save_keeps_given_registration() {
        let service = setup_test_service().await;
        let registered = NaiveDate::from_ymd_opt(2009, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5);
        let mut user = User::new("old", "old@example.com");
        user.user_registered = registered;

        let saved = service.save(user).await.unwrap();
        assert_eq!(saved.user_registered, registered);
    }

    #[tokio::test]
    async fn test_update_without_registration_fails() {
        let service = setup_test_service().await;
        let mut user = service.save(User::new("ann", "ann@example.com")).await.unwrap();
        user.user_registered = None;

        let err = service.save(user).await.unwrap_err();
        let errors = err.validation().expect("validation error");
        assert_eq!(errors.on("user_registered").len(), 1);
    }

    #[tokio::test]
    async fn test_blank_login_and_email() {
        let service = setup_test_service().await;

        let err = service.save(User::new("", "  ")).await.unwrap_err();

        let errors = err.validation().expect("validation error");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.on("user_login")[0].message, "can't be blank");
        assert_eq!(errors.on("user_email")[0].message, "can't be blank");
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_login_and_email() {
        let service = setup_test_service().await;
        service.save(User::new("ann", "ann@example.com")).await.unwrap();

        let err = service
            .save(User::new("ann", "ann@example.com"))
            .await
            .unwrap_err();

        let errors = err.validation().expect("validation error");
        assert_eq!(
            errors.to_string(),
            "user_login has already been taken, user_email has already been taken"
        );
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_differing_in_case() {
        let service = setup_test_service().await;
        service.save(User::new("ann", "ann@example.com")).await.unwrap();

        let err = service
            .save(User::new("ann2", "ANN@example.com"))
            .await
            .unwrap_err();

        let errors = err.validation().expect("validation error");
        assert_eq!(errors.on("user_email")[0].message, TAKEN);
        assert!(errors.on("user_login").is_empty());
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_does_not_collide_with_itself() {
        let service = setup_test_service().await;
        let mut user = service.save(User::new("ann", "ann@example.com")).await.unwrap();
        let other = service.save(User::new("bob", "bob@example.com")).await.unwrap();

        user.display_name = "Ann A.".to_string();
        let updated = service.save(user).await.expect("Failed to update user");
        assert_eq!(updated.display_name, "Ann A.");

        let mut taken = other.clone();
        taken.user_email = "ann@example.com".to_string();
        let err = service.save(taken).await.unwrap_err();
        assert_eq!(err.validation().map(|e| e.on("user_email").len()), Some(1));
    }

    #[tokio::test]
    async fn test_lookups() {
        let service = setup_test_service().await;
        let user = service.save(User::new("ann", "ann@example.com")).await.unwrap();

        assert_eq!(service.find_by_login("ann").await.unwrap(), Some(user.clone()));
        assert_eq!(
            service.find_by_email("ann@example.com").await.unwrap(),
            Some(user.clone())
        );
        assert!(service.find_by_login("bob").await.unwrap().is_none());
        assert!(service.find(999).await.unwrap_err().is_not_found());

        assert!(service.delete(user.id).await.unwrap());
        assert!(service.get(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_posts_and_metas() {
        let service = setup_test_service().await;
        let user = service.save(User::new("ann", "ann@example.com")).await.unwrap();
        let clock = SiteClock::utc();

        for (title, author) in [("first", user.id), ("theirs", user.id + 1), ("second", user.id)] {
            let mut post = Post::new(author, title, "");
            post.stamp(&clock, Utc::now());
            service.repos.posts.create(&post).await.unwrap();
        }
        service.repos.user_metas.create(user.id, "nickname", "annie").await.unwrap();

        let posts = service.posts(user.id).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts.iter().all(|p| p.post_author == user.id));

        let metas = service.metas(user.id).await.unwrap();
        assert_eq!(metas.len(), 1);
        assert_eq!(metas[0].meta_value.as_deref(), Some("annie"));
    }

    // Any second user sharing a login or an email with a saved user is
    // rejected, and only the first row exists afterwards.
    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        #[test]
        fn property_duplicate_login_or_email_rejected(
            login in "[a-z]{3,10}",
            domain in "[a-z]{3,8}",
            other in "[0-9]{1,4}",
            share_login in any::<bool>(),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result: Result<(), TestCaseError> = rt.block_on(async {
                let service = setup_test_service().await;
                let email = format!("{}@{}.com", login, domain);
                service.save(User::new(login.clone(), email.clone())).await
                    .expect("First user should be saved");

                let second = if share_login {
                    User::new(login.clone(), format!("{}{}@{}.org", login, other, domain))
                } else {
                    User::new(format!("{}{}", login, other), email.clone())
                };
                let field = if share_login { "user_login" } else { "user_email" };

                let err = service.save(second).await.expect_err("Duplicate must fail");
                let errors = err.validation().expect("validation error");
                prop_assert_eq!(errors.len(), 1);
                prop_assert_eq!(errors.on(field)[0].message.as_str(), TAKEN);
                prop_assert_eq!(service.list().await.unwrap().len(), 1);
                Ok(())
            });
            result?;
        }
    }
}
