//! HTTP client for the books API.
//!
//! This is what a front end talks to: the five book calls, the same field
//! rules the server applies (run before anything is sent), and the list
//! filter used by the search box.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::{
    api::books::DeleteResponse,
    error::ErrorResponse,
    models::book::{Book, BookFields, FieldError},
    validation::{self, Mode},
};

#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally, nothing was sent
    #[error("Invalid book fields: {} field(s) rejected", .0.len())]
    Invalid(Vec<FieldError>),

    #[error("API error {status}: {}", .body.message)]
    Api {
        status: reqwest::StatusCode,
        body: ErrorResponse,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Invalid(_) => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Typed access to `/api/books`
#[derive(Clone, Debug)]
pub struct BookClient {
    http: Client,
    base_url: String,
}

impl BookClient {
    /// `base_url` is the API root, e.g. `http://localhost:5000/api`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn books_url(&self) -> String {
        format!("{}/books", self.base_url)
    }

    fn book_url(&self, id: &str) -> String {
        format!("{}/books/{}", self.base_url, id)
    }

    pub async fn list_books(&self) -> ClientResult<Vec<Book>> {
        let response = self.http.get(self.books_url()).send().await?;
        decode(response).await
    }

    pub async fn get_book(&self, id: &str) -> ClientResult<Book> {
        let response = self.http.get(self.book_url(id)).send().await?;
        decode(response).await
    }

    pub async fn create_book(&self, fields: &BookFields) -> ClientResult<Book> {
        check(fields, Mode::Complete)?;
        let response = self.http.post(self.books_url()).json(fields).send().await?;
        decode(response).await
    }

    pub async fn update_book(&self, id: &str, fields: &BookFields) -> ClientResult<Book> {
        check(fields, Mode::Patch)?;
        let response = self.http.put(self.book_url(id)).json(fields).send().await?;
        decode(response).await
    }

    pub async fn delete_book(&self, id: &str) -> ClientResult<()> {
        let response = self.http.delete(self.book_url(id)).send().await?;
        let _: DeleteResponse = decode(response).await?;
        Ok(())
    }
}

fn check(fields: &BookFields, mode: Mode) -> ClientResult<()> {
    validation::validate(&fields.clone().normalized(), mode).map_err(ClientError::Invalid)
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let text = response.text().await?;
    let body = serde_json::from_str::<ErrorResponse>(&text)
        .unwrap_or_else(|_| ErrorResponse::new(if text.is_empty() { status.to_string() } else { text }));
    tracing::debug!("Books API returned {}: {}", status, body.message);
    Err(ClientError::Api { status, body })
}

/// Books whose title or author contains `query`, ignoring case.
/// A blank query keeps everything. Order is preserved.
pub fn filter_books<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let needle = query.trim().to_lowercase();
    books
        .iter()
        .filter(|book| {
            needle.is_empty()
                || book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
        })
        .collect()
}
