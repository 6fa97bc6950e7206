//! Link model (blogroll bookmarks)

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A row of the `links` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub link_id: i64,
    pub link_url: String,
    pub link_name: String,
    pub link_image: String,
    pub link_target: String,
    pub link_description: String,
    /// "Y" or "N"
    pub link_visible: String,
    pub link_owner: i64,
    pub link_rating: i32,
    pub link_updated: Option<NaiveDateTime>,
    pub link_rel: String,
    pub link_notes: String,
    pub link_rss: String,
}

impl Link {
    pub fn new(link_url: impl Into<String>, link_name: impl Into<String>) -> Self {
        Self {
            link_id: 0,
            link_url: link_url.into(),
            link_name: link_name.into(),
            link_image: String::new(),
            link_target: String::new(),
            link_description: String::new(),
            link_visible: "Y".to_string(),
            link_owner: 1,
            link_rating: 0,
            link_updated: None,
            link_rel: String::new(),
            link_notes: String::new(),
            link_rss: String::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        self.link_visible == "Y"
    }
}
