//! Field rules for books.
//!
//! The rules live in a single table so the server (request validation) and the
//! client (pre-flight form checks) run the exact same checks.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::book::{normalize_isbn, BookFields, FieldError};

/// Earliest accepted publication year
pub const MIN_PUBLISHED_YEAR: i32 = 1000;

static ISBN_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[0-9]{10}|[0-9]{13})$").expect("ISBN pattern is valid"));

/// Predicate applied to a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    /// Non-empty after trimming
    NonBlank,
    /// Between `MIN_PUBLISHED_YEAR` and the current year, inclusive
    PublishedYear,
    /// 10 or 13 digits once hyphens are removed
    Isbn,
}

/// Borrowed view of a single submitted value
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Year(i32),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    /// Field name as it appears in JSON
    pub field: &'static str,
    pub check: Check,
    pub missing: &'static str,
    pub invalid: &'static str,
}

pub const BOOK_RULES: [FieldRule; 5] = [
    FieldRule {
        field: "title",
        check: Check::NonBlank,
        missing: "Title is required",
        invalid: "Title is required",
    },
    FieldRule {
        field: "author",
        check: Check::NonBlank,
        missing: "Author is required",
        invalid: "Author is required",
    },
    FieldRule {
        field: "description",
        check: Check::NonBlank,
        missing: "Description is required",
        invalid: "Description is required",
    },
    FieldRule {
        field: "publishedYear",
        check: Check::PublishedYear,
        missing: "Published year is required",
        invalid: "Invalid published year",
    },
    FieldRule {
        field: "isbn",
        check: Check::Isbn,
        missing: "ISBN is required",
        invalid: "Invalid ISBN format",
    },
];

/// Whether absent fields are errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Every field must be present (create)
    Complete,
    /// Only present fields are checked (update)
    Patch,
}

/// Current calendar year in UTC
pub fn current_year() -> i32 {
    Utc::now().year()
}

pub fn is_valid_isbn(isbn: &str) -> bool {
    ISBN_DIGITS.is_match(&normalize_isbn(isbn))
}

impl Check {
    pub fn passes(self, value: FieldValue<'_>) -> bool {
        match (self, value) {
            (Check::NonBlank, FieldValue::Text(s)) => !s.trim().is_empty(),
            (Check::PublishedYear, FieldValue::Year(year)) => {
                (MIN_PUBLISHED_YEAR..=current_year()).contains(&year)
            }
            (Check::Isbn, FieldValue::Text(s)) => is_valid_isbn(s),
            _ => false,
        }
    }
}

impl BookFields {
    /// Look up a field by its JSON name
    pub fn value(&self, field: &str) -> Option<FieldValue<'_>> {
        match field {
            "title" => self.title.as_deref().map(FieldValue::Text),
            "author" => self.author.as_deref().map(FieldValue::Text),
            "description" => self.description.as_deref().map(FieldValue::Text),
            "publishedYear" => self.published_year.map(FieldValue::Year),
            "isbn" => self.isbn.as_deref().map(FieldValue::Text),
            _ => None,
        }
    }
}

/// Run every rule against `fields`, collecting all violations in table order.
pub fn validate(fields: &BookFields, mode: Mode) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = BOOK_RULES
        .iter()
        .filter_map(|rule| {
            if fields.rejected.contains(&rule.field) {
                return Some(FieldError::new(rule.field, rule.invalid));
            }
            match fields.value(rule.field) {
                Some(value) if rule.check.passes(value) => None,
                Some(_) => Some(FieldError::new(rule.field, rule.invalid)),
                None if mode == Mode::Complete => Some(FieldError::new(rule.field, rule.missing)),
                None => None,
            }
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
