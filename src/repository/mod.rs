//! Repository layer for book persistence

pub mod books;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::book::{Book, NewBook},
};

/// Storage backend for books.
///
/// Implementations own ISBN uniqueness: a write that would duplicate an ISBN
/// fails with `AppError::Conflict`, whatever the backend reports internally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, newest first
    async fn list(&self) -> AppResult<Vec<Book>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Book>>;

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;

    /// Persist a new book under `id`, stamping both timestamps
    async fn insert(&self, id: Uuid, book: NewBook) -> AppResult<Book>;

    /// Write every field of `book` and bump `updated_at`
    async fn update(&self, book: Book) -> AppResult<Book>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Round trip to the backend
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding the book store
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
}

impl Repository {
    /// Create a new repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool)),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        Self {
            books: Arc::new(memory::InMemoryBooks::default()),
        }
    }

    pub fn with_store(store: impl BookStore + 'static) -> Self {
        Self {
            books: Arc::new(store),
        }
    }
}
