//! Site option model
//!
//! Global key/value settings of an installation (`options` table).

use serde::{Deserialize, Serialize};

/// A row of the `options` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteOption {
    pub option_id: i64,
    /// Unique option key
    pub option_name: String,
    pub option_value: String,
    /// "yes" when the platform preloads the option on every request
    pub autoload: String,
}

impl SiteOption {
    pub fn new(option_name: impl Into<String>, option_value: impl Into<String>) -> Self {
        Self {
            option_id: 0,
            option_name: option_name.into(),
            option_value: option_value.into(),
            autoload: "yes".to_string(),
        }
    }

    pub fn autoloads(&self) -> bool {
        self.autoload == "yes"
    }
}
