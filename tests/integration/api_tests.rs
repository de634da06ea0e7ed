//! API integration tests
//!
//! Each test starts the real router on an ephemeral port, backed by the
//! in-memory store, and talks to it over HTTP.

use bookshelf_server::{
    api,
    client::{filter_books, BookClient, ClientError},
    models::BookFields,
    repository::Repository,
    validation::current_year,
    AppState,
};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

/// Start a server and return its API base URL
async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");

    let app = api::create_router(AppState::new(Repository::in_memory()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    format!("http://{}/api", addr)
}

fn sample_book() -> Value {
    json!({
        "title": "T",
        "author": "A",
        "description": "D",
        "publishedYear": 2020,
        "isbn": "1234567890"
    })
}

async fn create(client: &Client, base: &str, body: &Value) -> reqwest::Response {
    client
        .post(format!("{}/books", base))
        .json(body)
        .send()
        .await
        .expect("Failed to send request")
}

#[tokio::test]
async fn test_health_check() {
    let base = spawn_server().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", base))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_create_then_get_round_trip() {
    let base = spawn_server().await;
    let client = Client::new();

    let response = create(&client, &base, &sample_book()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created: Value = response.json().await.expect("Failed to parse response");
    let id = created["id"].as_str().expect("No book ID");

    let response = client
        .get(format!("{}/books/{}", base, id))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let fetched: Value = response.json().await.expect("Failed to parse response");
    for field in ["title", "author", "description", "publishedYear", "isbn"] {
        assert_eq!(fetched[field], sample_book()[field], "field {}", field);
    }
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_published_year_boundaries() {
    let base = spawn_server().await;
    let client = Client::new();
    let year = current_year();

    let cases = [
        (999, "1000000001", StatusCode::BAD_REQUEST),
        (year + 1, "1000000002", StatusCode::BAD_REQUEST),
        (1000, "1000000003", StatusCode::CREATED),
        (year, "1000000004", StatusCode::CREATED),
    ];

    for (published_year, isbn, expected) in cases {
        let mut body = sample_book();
        body["publishedYear"] = json!(published_year);
        body["isbn"] = json!(isbn);
        let response = create(&client, &base, &body).await;
        assert_eq!(response.status(), expected, "year {}", published_year);
    }
}

#[tokio::test]
async fn test_isbn_formats() {
    let base = spawn_server().await;
    let client = Client::new();

    let mut body = sample_book();
    body["isbn"] = json!("12345");
    let response = create(&client, &base, &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(error["errors"][0]["field"], "isbn");

    body["isbn"] = json!("123-456-7890");
    let response = create(&client, &base, &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    body["isbn"] = json!("978-0-261-10357-3");
    let response = create(&client, &base, &body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_duplicate_isbn_keeps_one_record() {
    let base = spawn_server().await;
    let client = Client::new();

    let response = create(&client, &base, &sample_book()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let mut dup = sample_book();
    dup["title"] = json!("Another title");
    dup["isbn"] = json!("123-456-7890");
    let response = create(&client, &base, &dup).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "ISBN already exists");

    let books: Vec<Value> = client
        .get(format!("{}/books", base))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "T");
}

#[tokio::test]
async fn test_concurrent_creates_with_same_isbn() {
    let base = spawn_server().await;
    let client = Client::new();

    let attempts = (0..8).map(|i| {
        let client = client.clone();
        let base = base.clone();
        async move {
            let mut body = sample_book();
            body["title"] = json!(format!("Copy {}", i));
            create(&client, &base, &body).await.status()
        }
    });
    let mut handles = Vec::new();
    for attempt in attempts {
        handles.push(tokio::spawn(attempt));
    }

    let mut created = 0;
    for handle in handles {
        match handle.await.expect("Task panicked") {
            StatusCode::CREATED => created += 1,
            status => assert_eq!(status, StatusCode::BAD_REQUEST),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let base = spawn_server().await;
    let client = Client::new();

    for (i, isbn) in ["1111111111", "2222222222", "3333333333"].iter().enumerate() {
        let mut body = sample_book();
        body["title"] = json!(format!("Book {}", i));
        body["isbn"] = json!(isbn);
        create(&client, &base, &body).await;
    }

    let books: Vec<Value> = client
        .get(format!("{}/books", base))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse response");
    let titles: Vec<&str> = books.iter().filter_map(|b| b["title"].as_str()).collect();
    assert_eq!(titles, vec!["Book 2", "Book 1", "Book 0"]);
}

#[tokio::test]
async fn test_malformed_and_unknown_ids() {
    let base = spawn_server().await;
    let client = Client::new();
    let unknown = uuid::Uuid::new_v4().to_string();

    for (id, expected) in [
        ("not-an-id", StatusCode::BAD_REQUEST),
        (unknown.as_str(), StatusCode::NOT_FOUND),
    ] {
        let url = format!("{}/books/{}", base, id);
        let get = client.get(&url).send().await.expect("Failed to send request");
        let put = client
            .put(&url)
            .json(&json!({}))
            .send()
            .await
            .expect("Failed to send request");
        let delete = client.delete(&url).send().await.expect("Failed to send request");

        assert_eq!(get.status(), expected);
        assert_eq!(put.status(), expected);
        assert_eq!(delete.status(), expected);
    }
}

#[tokio::test]
async fn test_client_crud_flow() {
    let base = spawn_server().await;
    let books = BookClient::new(base);

    let created = books
        .create_book(&BookFields {
            title: Some("The Dispossessed".into()),
            author: Some("Ursula K. Le Guin".into()),
            description: Some("An ambiguous utopia.\nSecond line.".into()),
            published_year: Some(1974),
            isbn: Some("978-0-06-051275-3".into()),
            ..Default::default()
        })
        .await
        .expect("Create failed");
    assert_eq!(created.isbn, "9780060512753");
    let id = created.id.to_string();

    let unchanged = books
        .update_book(&id, &BookFields::default())
        .await
        .expect("Empty update failed");
    assert_eq!(unchanged.title, created.title);
    assert_eq!(unchanged.isbn, created.isbn);
    assert_eq!(unchanged.created_at, created.created_at);

    let renamed = books
        .update_book(
            &id,
            &BookFields {
                title: Some("The Dispossessed: An Ambiguous Utopia".into()),
                ..Default::default()
            },
        )
        .await
        .expect("Update failed");
    assert_eq!(renamed.author, "Ursula K. Le Guin");

    let listed = books.list_books().await.expect("List failed");
    assert_eq!(filter_books(&listed, "ambiguous").len(), 1);
    assert!(filter_books(&listed, "herbert").is_empty());

    books.delete_book(&id).await.expect("Delete failed");
    let err = books.get_book(&id).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    match err {
        ClientError::Api { body, .. } => assert_eq!(body.message, "Book not found"),
        other => panic!("expected API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_client_surfaces_conflict() {
    let base = spawn_server().await;
    let books = BookClient::new(base);

    let fields = BookFields {
        title: Some("T".into()),
        author: Some("A".into()),
        description: Some("D".into()),
        published_year: Some(2020),
        isbn: Some("1234567890".into()),
        ..Default::default()
    };
    books.create_book(&fields).await.expect("Create failed");

    match books.create_book(&fields).await.unwrap_err() {
        ClientError::Api { status, body } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body.message, "ISBN already exists");
            assert!(body.error.is_some());
        }
        other => panic!("expected API error, got {:?}", other),
    }
}
