//! Post model
//!
//! This module provides:
//! - `Post`, one row of the `posts` table (every column, platform names)
//! - status constants for `post_status` / `comment_status`
//! - `PostQuery` / `PostOrder` for equality-filtered listings
//!
//! Posts are the platform's central content rows. Their four timestamps are
//! maintained by [`Post::stamp`] before every write.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::SiteClock;

/// Values of the `post_status` column.
pub mod post_status {
    pub const PUBLISH: &str = "publish";
    pub const DRAFT: &str = "draft";
    pub const PENDING: &str = "pending";
    pub const PRIVATE: &str = "private";
    pub const FUTURE: &str = "future";
    pub const TRASH: &str = "trash";
}

/// Values of the `comment_status` / `ping_status` columns.
pub mod comment_status {
    pub const OPEN: &str = "open";
    pub const CLOSED: &str = "closed";
}

/// Values of the `post_type` column.
pub mod post_type {
    pub const POST: &str = "post";
    pub const PAGE: &str = "page";
    pub const ATTACHMENT: &str = "attachment";
}

/// A row of the `posts` table.
///
/// `id == 0` marks a post that has not been saved yet. The four timestamp
/// columns are optional only until the first save; a persisted post always
/// carries all four.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "ID")]
    pub id: i64,
    /// Author (`users.ID`)
    pub post_author: i64,
    /// Publication time, site-local
    pub post_date: Option<NaiveDateTime>,
    /// Publication time, UTC
    pub post_date_gmt: Option<NaiveDateTime>,
    pub post_content: String,
    pub post_title: String,
    pub post_excerpt: String,
    pub post_status: String,
    pub comment_status: String,
    pub ping_status: String,
    pub post_password: String,
    /// URL slug
    pub post_name: String,
    pub to_ping: String,
    pub pinged: String,
    /// Last modification, site-local
    pub post_modified: Option<NaiveDateTime>,
    /// Last modification, UTC
    pub post_modified_gmt: Option<NaiveDateTime>,
    pub post_content_filtered: String,
    pub post_parent: i64,
    pub guid: String,
    pub menu_order: i32,
    pub post_type: String,
    pub post_mime_type: String,
    pub comment_count: i64,
}

impl Post {
    /// A new, unsaved post with the platform's column defaults.
    pub fn new(
        post_author: i64,
        post_title: impl Into<String>,
        post_content: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            post_author,
            post_date: None,
            post_date_gmt: None,
            post_content: post_content.into(),
            post_title: post_title.into(),
            post_excerpt: String::new(),
            post_status: post_status::DRAFT.to_string(),
            comment_status: comment_status::OPEN.to_string(),
            ping_status: comment_status::OPEN.to_string(),
            post_password: String::new(),
            post_name: String::new(),
            to_ping: String::new(),
            pinged: String::new(),
            post_modified: None,
            post_modified_gmt: None,
            post_content_filtered: String::new(),
            post_parent: 0,
            guid: String::new(),
            menu_order: 0,
            post_type: post_type::POST.to_string(),
            post_mime_type: String::new(),
            comment_count: 0,
        }
    }

    /// Builder-style status setter.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.post_status = status.into();
        self
    }

    /// Whether the row has been persisted.
    pub fn is_new(&self) -> bool {
        self.id == 0
    }

    /// Refresh the timestamps for a save happening at `now`.
    ///
    /// `post_modified` always moves to `now` (site-local) and
    /// `post_modified_gmt` to the same instant in UTC. `post_date` is only
    /// filled when unset, from `post_modified`; `post_date_gmt` likewise,
    /// from the UTC conversion of `post_date`. A `post_date` too close to
    /// the edge of the representable range has no conversion and leaves
    /// `post_date_gmt` unset.
    pub fn stamp(&mut self, clock: &SiteClock, now: DateTime<Utc>) {
        let modified = clock.local(now);
        self.post_modified = Some(modified);
        self.post_modified_gmt = Some(now.naive_utc());

        let date = *self.post_date.get_or_insert(modified);
        if self.post_date_gmt.is_none() {
            self.post_date_gmt = clock.to_gmt(date);
        }
    }

    /// Published and not scheduled for later than `now_local`.
    pub fn is_published(&self, now_local: NaiveDateTime) -> bool {
        self.post_status == post_status::PUBLISH
            && self.post_date.is_some_and(|date| date <= now_local)
    }

    /// Whether readers may comment on the post.
    pub fn accepts_comments(&self) -> bool {
        self.comment_status == comment_status::OPEN
    }
}

/// Sort order of a post listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Newest first (the platform's default)
    #[default]
    DateDesc,
    DateAsc,
    ModifiedDesc,
    TitleAsc,
    MenuOrderAsc,
}

impl PostOrder {
    /// `ORDER BY` clause; ties always fall back to `ID` in the same direction.
    pub(crate) fn sql(&self) -> &'static str {
        match self {
            Self::DateDesc => "post_date DESC, ID DESC",
            Self::DateAsc => "post_date ASC, ID ASC",
            Self::ModifiedDesc => "post_modified DESC, ID DESC",
            Self::TitleAsc => "post_title ASC, ID ASC",
            Self::MenuOrderAsc => "menu_order ASC, ID ASC",
        }
    }
}

/// Equality filters and paging for a post listing.
///
/// Every `None` filter is left out of the query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostQuery {
    pub post_status: Option<String>,
    pub post_type: Option<String>,
    pub post_author: Option<i64>,
    pub post_parent: Option<i64>,
    pub order: PostOrder,
    pub limit: Option<i64>,
    pub offset: i64,
}

impl PostQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts whose status is `publish`.
    pub fn published() -> Self {
        Self::new().status(post_status::PUBLISH)
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.post_status = Some(status.into());
        self
    }

    pub fn post_type(mut self, post_type: impl Into<String>) -> Self {
        self.post_type = Some(post_type.into());
        self
    }

    pub fn author(mut self, author_id: i64) -> Self {
        self.post_author = Some(author_id);
        self
    }

    pub fn parent(mut self, parent_id: i64) -> Self {
        self.post_parent = Some(parent_id);
        self
    }

    pub fn order(mut self, order: PostOrder) -> Self {
        self.order = order;
        self
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    /// `WHERE` clause (empty when unfiltered) with `?` placeholders in the
    /// order [`PostQuery::bind_values`] yields them.
    pub(crate) fn where_sql(&self) -> String {
        let mut conditions = Vec::new();
        if self.post_status.is_some() {
            conditions.push("post_status = ?");
        }
        if self.post_type.is_some() {
            conditions.push("post_type = ?");
        }
        if self.post_author.is_some() {
            conditions.push("post_author = ?");
        }
        if self.post_parent.is_some() {
            conditions.push("post_parent = ?");
        }

        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    pub(crate) fn bind_values(&self) -> Vec<QueryValue<'_>> {
        let mut values = Vec::new();
        if let Some(status) = &self.post_status {
            values.push(QueryValue::Text(status));
        }
        if let Some(post_type) = &self.post_type {
            values.push(QueryValue::Text(post_type));
        }
        if let Some(author) = self.post_author {
            values.push(QueryValue::Int(author));
        }
        if let Some(parent) = self.post_parent {
            values.push(QueryValue::Int(parent));
        }
        values
    }

    /// `(limit, offset)` to bind after the filters, if the listing is paged.
    /// An offset without a limit pages with an unbounded limit.
    pub(crate) fn paging(&self) -> Option<(i64, i64)> {
        match self.limit {
            Some(limit) => Some((limit, self.offset)),
            None if self.offset > 0 => Some((i64::MAX, self.offset)),
            None => None,
        }
    }
}

/// A bind parameter of a dynamically built query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum QueryValue<'a> {
    Text(&'a str),
    Int(i64),
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn instant() -> impl Strategy<Value = DateTime<Utc>> {
        (0i64..2_000_000_000).prop_map(|secs| {
            DateTime::from_timestamp(secs, 0).unwrap_or_default()
        })
    }

    proptest! {
        /// Without a caller-supplied date, both dates equal the modified
        /// stamps and every GMT column is the UTC conversion of its local
        /// counterpart.
        #[test]
        fn unset_dates_follow_modified(
            now in instant(),
            offset in -840i32..=840,
        ) {
            let clock = SiteClock::new(offset).unwrap();
            let mut post = Post::new(1, "t", "c");

            post.stamp(&clock, now);

            let modified = post.post_modified.unwrap();
            prop_assert_eq!(post.post_date, Some(modified));
            prop_assert_eq!(post.post_modified_gmt, clock.to_gmt(modified));
            prop_assert_eq!(post.post_date_gmt, clock.to_gmt(modified));
        }

        /// A caller-supplied date survives, and its GMT twin is derived.
        #[test]
        fn caller_dates_survive(
            now in instant(),
            offset in -840i32..=840,
            day in 1u32..=28,
            hour in 0u32..24,
        ) {
            let clock = SiteClock::new(offset).unwrap();
            let date = NaiveDate::from_ymd_opt(2020, 2, day)
                .unwrap()
                .and_hms_opt(hour, 0, 0)
                .unwrap();
            let mut post = Post::new(1, "t", "c");
            post.post_date = Some(date);

            post.stamp(&clock, now);

            prop_assert_eq!(post.post_date, Some(date));
            prop_assert_eq!(post.post_date_gmt, clock.to_gmt(date));
        }
    }
}
