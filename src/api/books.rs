//! Book endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult, ErrorResponse},
    models::book::{Book, BookFields},
};

/// Confirmation returned by a successful delete
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
}

/// List all books, newest first
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    responses(
        (status = 200, description = "List of books", body = Vec<Book>),
        (status = 500, description = "Store failure", body = ErrorResponse)
    )
)]
pub async fn list_books(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_books().await?;
    Ok(Json(books))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID (UUID)")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 400, description = "Invalid book ID format", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_book(&id).await?;
    Ok(Json(book))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body = BookFields,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Validation error or ISBN already exists", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    WithRejection(Json(fields), _): WithRejection<Json<BookFields>, AppError>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.catalog.create_book(fields).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book. Fields left out of the body keep their value.
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID (UUID)")
    ),
    request_body = BookFields,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid ID, validation error or ISBN already exists", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    WithRejection(Json(fields), _): WithRejection<Json<BookFields>, AppError>,
) -> AppResult<Json<Book>> {
    let updated = state.services.catalog.update_book(&id, fields).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    params(
        ("id" = String, Path, description = "Book ID (UUID)")
    ),
    responses(
        (status = 200, description = "Book deleted", body = DeleteResponse),
        (status = 400, description = "Invalid book ID format", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state.services.catalog.delete_book(&id).await?;
    Ok(Json(DeleteResponse {
        message: "Book deleted successfully".to_string(),
    }))
}
