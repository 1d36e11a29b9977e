//! End-to-end HTTP behavior of the books endpoints through the full router
//! (middleware included), backed by the in-memory repository.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use bookshelf_app::modules::{
    self,
    books::{
        memory::InMemoryBookRepository,
        models::{Book, BookInput},
        repository::{BookRepository, RepositoryResult},
    },
};
use bookshelf_kernel::{settings::ServerSettings, ModuleRegistry};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    repo: Arc<InMemoryBookRepository>,
}

fn full_router(repo: Arc<dyn BookRepository>, settings: &ServerSettings) -> Router {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, repo).unwrap();
    bookshelf_http::build_router(&registry, settings)
}

impl TestApp {
    fn new() -> Self {
        let repo = Arc::new(InMemoryBookRepository::new());
        let router = full_router(repo.clone(), &ServerSettings::default());
        Self { router, repo }
    }

    async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(&self, title: &str, author: &str) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/books",
                Some(json!({"title": title, "author": author})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }
}

fn timestamp(value: &Value) -> OffsetDateTime {
    OffsetDateTime::parse(value.as_str().unwrap(), &Rfc3339).unwrap()
}

#[tokio::test]
async fn dune_lifecycle() {
    let app = TestApp::new();

    let created = app.create("Dune", "Herbert").await;
    assert_eq!(created["title"], "Dune");
    assert_eq!(created["author"], "Herbert");
    let id = created["id"].as_i64().expect("numeric id");
    let uri = format!("/books/{id}");

    let (status, fetched) = app.call(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = app
        .call(
            Method::PUT,
            &uri,
            Some(json!({"title": "Dune", "author": "F. Herbert"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], created["id"]);
    assert_eq!(updated["author"], "F. Herbert");
    assert_eq!(updated["created_at"], created["created_at"]);
    assert!(timestamp(&updated["updated_at"]) > timestamp(&created["updated_at"]));

    let (status, body) = app.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = app.call(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "book not found"}));
}

#[tokio::test]
async fn created_record_has_equal_timestamps() {
    let app = TestApp::new();

    let created = app.create("Neuromancer", "Gibson").await;
    assert_eq!(created["created_at"], created["updated_at"]);
    // RFC3339 on the wire
    timestamp(&created["created_at"]);
}

#[tokio::test]
async fn empty_list_is_ok() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn list_is_ascending_by_id() {
    let app = TestApp::new();
    for (title, author) in [("Zed", "a"), ("Alpha", "b"), ("Mid", "c")] {
        app.create(title, author).await;
    }

    let (status, body) = app.call(Method::GET, "/books", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["id"].as_i64().unwrap())
        .collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids, sorted);
}

#[tokio::test]
async fn empty_title_inserts_nothing() {
    let app = TestApp::new();
    app.create("Dune", "Herbert").await;

    let (status, body) = app
        .call(Method::POST, "/books", Some(json!({"title": "", "author": "X"})))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "title and author are required"}));
    assert_eq!(app.repo.len().await, 1);
}

#[tokio::test]
async fn non_numeric_id_is_400() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::GET, "/books/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "invalid id"}));
}

#[tokio::test]
async fn deleting_twice_is_not_found() {
    let app = TestApp::new();
    let id = app.create("Dune", "Herbert").await["id"].as_i64().unwrap();
    let uri = format!("/books/{id}");

    let (status, _) = app.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.call(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "book not found"}));

    let (status, _) = app.call(Method::DELETE, "/books/987654", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_is_405() {
    let app = TestApp::new();

    let (status, body) = app.call(Method::PATCH, "/books", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "method not allowed"}));
}

#[tokio::test]
async fn openapi_document_lists_book_routes() {
    let app = TestApp::new();

    let (status, doc) = app.call(Method::GET, "/docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc.pointer("/paths/~1books/post").is_some());
    assert!(doc.pointer("/paths/~1books~1{id}/delete").is_some());
}

/// Never answers, like a query stuck behind a row lock
struct StalledRepository;

impl StalledRepository {
    async fn stall<T>(&self) -> RepositoryResult<T> {
        std::future::pending().await
    }
}

#[async_trait::async_trait]
impl BookRepository for StalledRepository {
    async fn list(&self) -> RepositoryResult<Vec<Book>> {
        self.stall().await
    }

    async fn get(&self, _id: i64) -> RepositoryResult<Book> {
        self.stall().await
    }

    async fn create(&self, _input: &BookInput) -> RepositoryResult<Book> {
        self.stall().await
    }

    async fn update(&self, _id: i64, _input: &BookInput) -> RepositoryResult<Book> {
        self.stall().await
    }

    async fn delete(&self, _id: i64) -> RepositoryResult<()> {
        self.stall().await
    }
}

#[tokio::test]
async fn stalled_storage_is_500_at_the_deadline() {
    let settings = ServerSettings {
        request_timeout_ms: 100,
        ..ServerSettings::default()
    };
    let router = full_router(Arc::new(StalledRepository), &settings);

    for (method, uri, body) in [
        (Method::GET, "/books", None),
        (Method::GET, "/books/1", None),
        (Method::POST, "/books", Some(r#"{"title":"Dune","author":"Herbert"}"#)),
        (Method::DELETE, "/books/1", None),
    ] {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(body.map(Body::from).unwrap_or_default())
            .unwrap();

        let started = std::time::Instant::now();
        let response = router.clone().oneshot(request).await.unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(2));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
        assert_eq!(response.headers()["content-type"], "application/json");
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"error": "internal server error"}));
    }
}

#[tokio::test]
async fn unsupported_methods_advertise_allowed_ones() {
    let app = TestApp::new();

    for (uri, allowed) in [("/books", "GET, POST"), ("/books/1", "GET, PUT, DELETE")] {
        let request = Request::builder()
            .method(Method::PATCH)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["allow"], allowed);
    }
}
