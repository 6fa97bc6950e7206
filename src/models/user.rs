//! User model
//!
//! Account rows of the `users` table. Passwords live in `user_pass` in
//! whatever form the platform wrote them; this crate does not verify them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row of the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "ID")]
    pub id: i64,
    /// Login name (unique across users)
    pub user_login: String,
    /// Stored password hash
    #[serde(default, skip_serializing)]
    pub user_pass: String,
    pub user_nicename: String,
    /// Email address (unique across users)
    pub user_email: String,
    pub user_url: String,
    /// Registration time (UTC); filled on first save when absent
    pub user_registered: Option<NaiveDateTime>,
    #[serde(default, skip_serializing)]
    pub user_activation_key: String,
    pub user_status: i32,
    pub display_name: String,
}

impl User {
    /// A new, unsaved user. Nice name and display name start as the login.
    pub fn new(user_login: impl Into<String>, user_email: impl Into<String>) -> Self {
        let user_login = user_login.into();
        Self {
            id: 0,
            user_nicename: user_login.to_lowercase(),
            display_name: user_login.clone(),
            user_login,
            user_pass: String::new(),
            user_email: user_email.into(),
            user_url: String::new(),
            user_registered: None,
            user_activation_key: String::new(),
            user_status: 0,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }
}
