//! In-memory books store, used by tests and local runs without a database

use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::BookStore;
use crate::{
    error::{AppError, AppResult, DUPLICATE_ISBN_DETAIL},
    models::book::{Book, NewBook},
};

/// Books kept in insertion order, which is also creation order.
#[derive(Default)]
pub struct InMemoryBooks {
    books: RwLock<IndexMap<Uuid, Book>>,
}

impl InMemoryBooks {
    pub fn new() -> Self {
        Self::default()
    }
}

fn isbn_taken(books: &IndexMap<Uuid, Book>, isbn: &str, except: Option<Uuid>) -> bool {
    books
        .values()
        .any(|b| b.isbn == isbn && Some(b.id) != except)
}

#[async_trait]
impl BookStore for InMemoryBooks {
    async fn list(&self) -> AppResult<Vec<Book>> {
        let books = self.books.read().await;
        Ok(books.values().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<Book>> {
        Ok(self.books.read().await.get(&id).cloned())
    }

    async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn insert(&self, id: Uuid, book: NewBook) -> AppResult<Book> {
        let mut books = self.books.write().await;
        if isbn_taken(&books, &book.isbn, None) {
            return Err(AppError::Conflict(DUPLICATE_ISBN_DETAIL.to_string()));
        }
        if books.contains_key(&id) {
            return Err(AppError::Internal(format!("Book id {} already assigned", id)));
        }

        let now = Utc::now();
        let created = Book {
            id,
            title: book.title,
            author: book.author,
            description: book.description,
            published_year: book.published_year,
            isbn: book.isbn,
            created_at: now,
            updated_at: now,
        };
        books.insert(id, created.clone());
        Ok(created)
    }

    async fn update(&self, mut book: Book) -> AppResult<Book> {
        let mut books = self.books.write().await;
        if isbn_taken(&books, &book.isbn, Some(book.id)) {
            return Err(AppError::Conflict(DUPLICATE_ISBN_DETAIL.to_string()));
        }
        let slot = books
            .get_mut(&book.id)
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))?;

        book.created_at = slot.created_at;
        book.updated_at = Utc::now();
        *slot = book.clone();
        Ok(book)
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.books
            .write()
            .await
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
