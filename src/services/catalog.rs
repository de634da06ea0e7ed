//! Catalog management service

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult, DUPLICATE_ISBN_DETAIL},
    models::book::{Book, BookFields},
    repository::Repository,
    validation::{self, Mode},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

/// Parse a path identifier, rejecting anything that is not a UUID
pub fn parse_book_id(id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::InvalidId(id.to_string()))
}

fn not_found() -> AppError {
    AppError::NotFound("Book not found".to_string())
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List every book, newest first
    pub async fn list_books(&self) -> AppResult<Vec<Book>> {
        self.repository.books.list().await
    }

    /// Get a book by its identifier
    pub async fn get_book(&self, id: &str) -> AppResult<Book> {
        let id = parse_book_id(id)?;
        self.repository.books.get(id).await?.ok_or_else(not_found)
    }

    /// Create a new book. ISBN uniqueness is enforced by the store.
    pub async fn create_book(&self, fields: BookFields) -> AppResult<Book> {
        let fields = fields.normalized();
        validation::validate(&fields, Mode::Complete).map_err(AppError::Validation)?;

        let new_book = fields
            .into_new_book()
            .ok_or_else(|| AppError::Internal("validated book is missing fields".to_string()))?;

        let created = self
            .repository
            .books
            .insert(Uuid::new_v4(), new_book)
            .await
            .map_err(|e| {
                if let AppError::Conflict(_) = e {
                    tracing::debug!("Catalog create: rejected duplicate ISBN");
                }
                e
            })?;

        tracing::info!("Catalog create: book id={} isbn={}", created.id, created.isbn);
        Ok(created)
    }

    /// Update an existing book with the supplied fields only
    pub async fn update_book(&self, id: &str, fields: BookFields) -> AppResult<Book> {
        let id = parse_book_id(id)?;
        let mut book = self.repository.books.get(id).await?.ok_or_else(not_found)?;

        let fields = fields.normalized();
        validation::validate(&fields, Mode::Patch).map_err(AppError::Validation)?;

        // Resubmitting the stored ISBN is not a conflict
        if let Some(ref isbn) = fields.isbn {
            if *isbn != book.isbn && self.repository.books.find_by_isbn(isbn).await?.is_some() {
                tracing::debug!("Catalog update: ISBN {} already used, book id={}", isbn, id);
                return Err(AppError::Conflict(DUPLICATE_ISBN_DETAIL.to_string()));
            }
        }

        book.apply(fields);
        let updated = self.repository.books.update(book).await?;

        tracing::info!("Catalog update: book id={}", updated.id);
        Ok(updated)
    }

    /// Permanently delete a book
    pub async fn delete_book(&self, id: &str) -> AppResult<()> {
        let id = parse_book_id(id)?;
        self.repository.books.get(id).await?.ok_or_else(not_found)?;
        self.repository.books.delete(id).await?;

        tracing::info!("Catalog delete: book id={}", id);
        Ok(())
    }

    /// Check the store is reachable
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.ping().await
    }
}
