//! Record validation
//!
//! A save runs an explicit, ordered list of checks against the record. Each
//! check either passes or yields one [`FieldError`]; the save collects every
//! failure into [`ValidationErrors`] and writes nothing unless the list is
//! empty. Rules that need the store (uniqueness, parent lookups) are run by
//! the owning service after the pure checks and append to the same list.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Field name used for errors that concern the record as a whole.
pub const BASE: &str = "base";

/// One failed rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Column the rule is about, or [`BASE`]
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.field == BASE {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} {}", self.field, self.message)
        }
    }
}

/// Every failed rule of one save, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.push(FieldError::new(field, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Errors recorded against `field`.
    pub fn on(&self, field: &str) -> Vec<&FieldError> {
        self.errors.iter().filter(|e| e.field == field).collect()
    }

    /// `Ok(())` when nothing failed.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// A single validation rule over a record.
pub type Check<T> = fn(&T) -> Option<FieldError>;

/// Run `checks` in order and collect every failure.
pub fn run_checks<T>(record: &T, checks: &[Check<T>]) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for check in checks {
        if let Some(error) = check(record) {
            errors.push(error);
        }
    }
    errors
}

/// Blank strings count as absent.
pub fn presence(field: &'static str, value: &str) -> Option<FieldError> {
    if value.trim().is_empty() {
        Some(FieldError::new(field, "can't be blank"))
    } else {
        None
    }
}

/// Row references start at 1, so 0 counts as absent.
pub fn presence_of_id(field: &'static str, id: i64) -> Option<FieldError> {
    if id <= 0 {
        Some(FieldError::new(field, "can't be blank"))
    } else {
        None
    }
}

pub fn presence_of_time(
    field: &'static str,
    value: Option<NaiveDateTime>,
) -> Option<FieldError> {
    match value {
        Some(_) => None,
        None => Some(FieldError::new(field, "can't be blank")),
    }
}
