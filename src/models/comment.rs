//! Comment model

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Values of the `comment_approved` column.
pub mod comment_approval {
    pub const APPROVED: &str = "1";
    pub const PENDING: &str = "0";
    pub const SPAM: &str = "spam";
    pub const TRASH: &str = "trash";
}

/// A row of the `comments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(rename = "comment_ID")]
    pub id: i64,
    /// Parent post (`posts.ID`)
    #[serde(rename = "comment_post_ID")]
    pub comment_post_id: i64,
    pub comment_author: String,
    pub comment_author_email: String,
    pub comment_author_url: String,
    #[serde(rename = "comment_author_IP")]
    pub comment_author_ip: String,
    pub comment_date: Option<NaiveDateTime>,
    pub comment_date_gmt: Option<NaiveDateTime>,
    pub comment_content: String,
    pub comment_karma: i32,
    pub comment_approved: String,
    pub comment_agent: String,
    pub comment_type: String,
    pub comment_parent: i64,
    /// Registered commenter (`users.ID`), 0 for guests
    pub user_id: i64,
}

impl Comment {
    /// A new, unsaved guest comment.
    pub fn new(
        comment_post_id: i64,
        comment_author: impl Into<String>,
        comment_author_email: impl Into<String>,
        comment_content: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            comment_post_id,
            comment_author: comment_author.into(),
            comment_author_email: comment_author_email.into(),
            comment_author_url: String::new(),
            comment_author_ip: String::new(),
            comment_date: None,
            comment_date_gmt: None,
            comment_content: comment_content.into(),
            comment_karma: 0,
            comment_approved: comment_approval::APPROVED.to_string(),
            comment_agent: String::new(),
            comment_type: "comment".to_string(),
            comment_parent: 0,
            user_id: 0,
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    pub fn is_approved(&self) -> bool {
        self.comment_approved == comment_approval::APPROVED
    }
}
