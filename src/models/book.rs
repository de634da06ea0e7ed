//! Book model and related types.
//!
//! `Book` is the persisted record. `BookFields` is what clients submit: every
//! field is optional so the same type serves both create (all required) and
//! update (any subset).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// Full book record (DB + API)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    /// Free text, may span several lines
    pub description: String,
    #[schema(example = 2020)]
    pub published_year: i32,
    /// ISBN-10 or ISBN-13, digits only
    #[schema(example = "9780261103573")]
    pub isbn: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Candidate field set for create and update requests.
///
/// Deserialization never fails on a field's type: a value that cannot be read
/// (e.g. `"publishedYear": "abc"`) is recorded in `rejected` and reported by
/// validation together with every other field error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct BookFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_year: Option<i32>,
    /// Hyphens are accepted and stripped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// JSON names of submitted fields whose value had an unusable type
    #[serde(skip)]
    pub rejected: Vec<&'static str>,
}

/// Strings as is, numbers in their decimal form
fn read_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Integers, or strings holding an integer
fn read_year(value: Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Take `field` out of the body. Absent and `null` both mean "not supplied".
fn read_field<T>(
    body: &mut Map<String, Value>,
    field: &'static str,
    parse: fn(Value) -> Option<T>,
    rejected: &mut Vec<&'static str>,
) -> Option<T> {
    let value = body.remove(field).filter(|v| !v.is_null())?;
    let parsed = parse(value);
    if parsed.is_none() {
        rejected.push(field);
    }
    parsed
}

/// Only a JSON object deserializes into a `Map`, so arrays and scalars are
/// still rejected as a malformed body.
impl From<Map<String, Value>> for BookFields {
    fn from(mut body: Map<String, Value>) -> Self {
        let mut rejected = Vec::new();
        Self {
            title: read_field(&mut body, "title", read_text, &mut rejected),
            author: read_field(&mut body, "author", read_text, &mut rejected),
            description: read_field(&mut body, "description", read_text, &mut rejected),
            published_year: read_field(&mut body, "publishedYear", read_year, &mut rejected),
            isbn: read_field(&mut body, "isbn", read_text, &mut rejected),
            rejected,
        }
    }
}

/// Validated data for a book that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub description: String,
    pub published_year: i32,
    pub isbn: String,
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Remove every hyphen from an ISBN as typed by a user
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars().filter(|c| *c != '-').collect()
}

impl BookFields {
    /// Canonical form used for validation and storage: strings trimmed,
    /// hyphens stripped from the ISBN.
    pub fn normalized(self) -> Self {
        let trim = |s: String| s.trim().to_string();
        Self {
            title: self.title.map(trim),
            author: self.author.map(trim),
            description: self.description.map(trim),
            published_year: self.published_year,
            isbn: self.isbn.map(|s| normalize_isbn(&s)),
            rejected: self.rejected,
        }
    }

    /// Build a `NewBook` when every field is present.
    /// Callers are expected to have run complete-mode validation first.
    pub fn into_new_book(self) -> Option<NewBook> {
        Some(NewBook {
            title: self.title?,
            author: self.author?,
            description: self.description?,
            published_year: self.published_year?,
            isbn: self.isbn?,
        })
    }
}

impl Book {
    /// Overwrite the fields present in `fields`, leaving the others untouched.
    /// Timestamps are owned by the store.
    pub fn apply(&mut self, fields: BookFields) {
        if let Some(title) = fields.title {
            self.title = title;
        }
        if let Some(author) = fields.author {
            self.author = author;
        }
        if let Some(description) = fields.description {
            self.description = description;
        }
        if let Some(year) = fields.published_year {
            self.published_year = year;
        }
        if let Some(isbn) = fields.isbn {
            self.isbn = isbn;
        }
    }
}

impl From<&Book> for BookFields {
    fn from(book: &Book) -> Self {
        Self {
            title: Some(book.title.clone()),
            author: Some(book.author.clone()),
            description: Some(book.description.clone()),
            published_year: Some(book.published_year),
            isbn: Some(book.isbn.clone()),
            rejected: Vec::new(),
        }
    }
}
