//! HTTP adapters translating requests into [`BookStore`] calls.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use shelf_http::{ApiResponse, AppError};
use tokio::sync::Mutex;

use super::models::{BookDetail, BookFilter, BookList, BookPayload, CreatedBook, Flag};
use super::store::{BookStore, BookStoreError};

/// The store behind a single lock held for the whole of each operation
pub type SharedStore = Arc<Mutex<BookStore>>;

const BOOK_ADDED: &str = "Buku berhasil ditambahkan";
const BOOK_UPDATED: &str = "Buku berhasil diperbarui";
const BOOK_DELETED: &str = "Buku berhasil dihapus";
const BOOK_NOT_FOUND: &str = "Buku tidak ditemukan";
const ADD_FAILED: &str = "Buku gagal ditambahkan";
const UPDATE_NOT_FOUND: &str = "Gagal memperbarui buku. Id tidak ditemukan";
const DELETE_NOT_FOUND: &str = "Buku gagal dihapus. Id tidak ditemukan";

/// Which write a validation failure belongs to; the client messages differ.
#[derive(Debug, Clone, Copy)]
enum WriteOp {
    Add,
    Update,
}

impl WriteOp {
    fn prefix(self) -> &'static str {
        match self {
            WriteOp::Add => "Gagal menambahkan buku",
            WriteOp::Update => "Gagal memperbarui buku",
        }
    }

    fn reject(self, err: BookStoreError) -> AppError {
        match (self, err) {
            (_, BookStoreError::MissingName) => {
                AppError::validation(format!("{}. Mohon isi nama buku", self.prefix()))
            }
            (_, BookStoreError::ReadPageExceedsPageCount { .. }) => AppError::validation(format!(
                "{}. readPage tidak boleh lebih besar dari pageCount",
                self.prefix()
            )),
            (WriteOp::Update, BookStoreError::NotFound(_)) => AppError::not_found(UPDATE_NOT_FOUND),
            (WriteOp::Add, BookStoreError::GenericInsertFailure) => AppError::internal(ADD_FAILED),
            // insert never looks an id up and update never generates one
            (op, err @ BookStoreError::NotFound(_))
            | (op, err @ BookStoreError::GenericInsertFailure) => AppError::Unexpected(
                anyhow::anyhow!("{:?} produced an impossible store error: {}", op, err),
            ),
        }
    }

    fn malformed(self, rejection: JsonRejection) -> AppError {
        AppError::bad_request(format!(
            "{}. Payload tidak valid: {}",
            self.prefix(),
            rejection.body_text()
        ))
    }
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/books", post(create_book).get(list_books))
        .route(
            "/books/{book_id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(store)
}

async fn create_book(
    State(store): State<SharedStore>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<ApiResponse<CreatedBook>, AppError> {
    let Json(payload) = payload.map_err(|rejection| WriteOp::Add.malformed(rejection))?;

    let book_id = store
        .lock()
        .await
        .insert(payload.into())
        .map_err(|err| WriteOp::Add.reject(err))?;

    tracing::info!(book_id = %book_id, "book added");
    Ok(ApiResponse::created(BOOK_ADDED, CreatedBook { book_id }))
}

/// Raw list query. Empty values count as not supplied; for a repeated key
/// the first occurrence wins.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub name: Option<String>,
    pub reading: Option<String>,
    pub finished: Option<String>,
}

impl ListQuery {
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "name" => &mut query.name,
                "reading" => &mut query.reading,
                "finished" => &mut query.finished,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        query
    }

    fn into_filter(self) -> Option<BookFilter> {
        let name = self.name.filter(|name| !name.is_empty());
        BookFilter::first_of(name, parse_flag(self.reading), parse_flag(self.finished))
    }
}

fn parse_flag(value: Option<String>) -> Option<Flag> {
    match value.as_deref() {
        None | Some("") => None,
        Some("0") => Some(Flag::Set(false)),
        Some("1") => Some(Flag::Set(true)),
        Some(_) => Some(Flag::Invalid),
    }
}

async fn list_books(
    State(store): State<SharedStore>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResponse<BookList> {
    let filter = ListQuery::from_pairs(pairs).into_filter();
    let books = store.lock().await.list(filter.as_ref());

    tracing::debug!(?filter, count = books.len(), "books listed");
    ApiResponse::ok(BookList { books })
}

async fn get_book(
    State(store): State<SharedStore>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<BookDetail>, AppError> {
    let book = store
        .lock()
        .await
        .get_by_id(&book_id)
        .cloned()
        .map_err(|_| AppError::not_found(BOOK_NOT_FOUND))?;

    Ok(ApiResponse::ok(BookDetail { book }))
}

async fn update_book(
    State(store): State<SharedStore>,
    Path(book_id): Path<String>,
    payload: Result<Json<BookPayload>, JsonRejection>,
) -> Result<ApiResponse<()>, AppError> {
    let Json(payload) = payload.map_err(|rejection| WriteOp::Update.malformed(rejection))?;

    store
        .lock()
        .await
        .update(&book_id, payload.into())
        .map_err(|err| WriteOp::Update.reject(err))?;

    tracing::info!(book_id = %book_id, "book updated");
    Ok(ApiResponse::message(BOOK_UPDATED))
}

async fn delete_book(
    State(store): State<SharedStore>,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    store
        .lock()
        .await
        .delete_by_id(&book_id)
        .map_err(|_| AppError::not_found(DELETE_NOT_FOUND))?;

    tracing::info!(book_id = %book_id, "book deleted");
    Ok(ApiResponse::message(BOOK_DELETED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::store::tests::{fixed_id_store, test_store};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> (Router, SharedStore) {
        let store: SharedStore = Arc::new(Mutex::new(test_store()));
        (router(Arc::clone(&store)), store)
    }

    fn book_json(name: Option<&str>, page_count: u32, read_page: u32, reading: bool) -> Value {
        let mut body = json!({
            "year": 2010,
            "author": "John Doe",
            "summary": "Lorem ipsum dolor sit amet",
            "publisher": "Dicoding Indonesia",
            "pageCount": page_count,
            "readPage": read_page,
            "reading": reading
        });
        if let Some(name) = name {
            body["name"] = json!(name);
        }
        body
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn create(router: &Router, name: &str, page_count: u32, read_page: u32, reading: bool) -> String {
        let (status, body) = send(
            router,
            Method::POST,
            "/books",
            Some(book_json(Some(name), page_count, read_page, reading)),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["data"]["bookId"].as_str().unwrap().to_string()
    }

    fn names(body: &Value) -> Vec<&str> {
        body["data"]["books"]
            .as_array()
            .unwrap()
            .iter()
            .map(|book| book["name"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn create_returns_201_with_book_id() {
        let (router, store) = app();

        let (status, body) = send(
            &router,
            Method::POST,
            "/books",
            Some(book_json(Some("Gemini"), 200, 200, false)),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "message": "Buku berhasil ditambahkan",
                "data": {"bookId": "book-1"}
            })
        );
        assert_eq!(store.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn create_without_name_is_rejected() {
        let (router, store) = app();

        let (status, body) = send(
            &router,
            Method::POST,
            "/books",
            Some(book_json(None, 200, 100, false)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"status": "fail", "message": "Gagal menambahkan buku. Mohon isi nama buku"})
        );
        assert!(store.lock().await.is_empty());
    }

    #[tokio::test]
    async fn create_with_read_page_over_page_count_is_rejected() {
        let (router, _) = app();

        let (status, body) = send(
            &router,
            Method::POST,
            "/books",
            Some(book_json(Some("Gemini"), 80, 90, false)),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert_eq!(
            body["message"],
            "Gagal menambahkan buku. readPage tidak boleh lebih besar dari pageCount"
        );
    }

    #[tokio::test]
    async fn create_with_malformed_payload_is_bad_request() {
        let (router, _) = app();

        let (status, body) = send(
            &router,
            Method::POST,
            "/books",
            Some(json!({"name": "Gemini", "pageCount": -1})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "fail");
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Gagal menambahkan buku. Payload tidak valid"));
    }

    #[tokio::test]
    async fn list_returns_summaries_in_insertion_order() {
        let (router, _) = app();
        create(&router, "Gemini", 200, 200, false).await;
        create(&router, "Tau", 200, 100, true).await;

        let (status, body) = send(&router, Method::GET, "/books", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "status": "success",
                "data": {"books": [
                    {"id": "book-1", "name": "Gemini", "publisher": "Dicoding Indonesia"},
                    {"id": "book-2", "name": "Tau", "publisher": "Dicoding Indonesia"}
                ]}
            })
        );
    }

    #[tokio::test]
    async fn list_on_empty_store_is_success() {
        let (router, _) = app();

        let (status, body) = send(&router, Method::GET, "/books", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["books"], json!([]));
    }

    #[tokio::test]
    async fn list_filters_by_finished_and_reading() {
        let (router, _) = app();
        create(&router, "Gemini", 200, 200, false).await;
        create(&router, "Tau", 200, 100, true).await;

        let (_, finished) = send(&router, Method::GET, "/books?finished=1", None).await;
        let (_, unfinished) = send(&router, Method::GET, "/books?finished=0", None).await;
        let (_, reading) = send(&router, Method::GET, "/books?reading=1", None).await;

        assert_eq!(names(&finished), vec!["Gemini"]);
        assert_eq!(names(&unfinished), vec!["Tau"]);
        assert_eq!(names(&reading), vec!["Tau"]);
    }

    #[tokio::test]
    async fn list_filters_by_name_case_insensitively() {
        let (router, _) = app();
        create(&router, "Gemini Girl", 10, 0, false).await;
        create(&router, "Tau", 10, 0, false).await;
        create(&router, "Gemini Boy", 10, 0, false).await;

        let (_, body) = send(&router, Method::GET, "/books?name=gemini", None).await;

        assert_eq!(names(&body), vec!["Gemini Girl", "Gemini Boy"]);
    }

    #[tokio::test]
    async fn name_filter_takes_precedence_and_empty_values_are_ignored() {
        let (router, _) = app();
        create(&router, "Gemini", 200, 200, false).await;
        create(&router, "Tau", 200, 100, true).await;

        let (_, by_name) = send(&router, Method::GET, "/books?name=tau&finished=1", None).await;
        let (_, blank_name) = send(&router, Method::GET, "/books?name=&finished=1", None).await;

        assert_eq!(names(&by_name), vec!["Tau"]);
        assert_eq!(names(&blank_name), vec!["Gemini"]);
    }

    #[tokio::test]
    async fn list_with_unusable_flag_is_empty_success() {
        let (router, _) = app();
        create(&router, "Gemini", 200, 200, true).await;
        create(&router, "Tau", 200, 100, false).await;

        for uri in ["/books?reading=true", "/books?finished=2", "/books?reading=yes&finished=1"] {
            let (status, body) = send(&router, Method::GET, uri, None).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(
                body,
                json!({"status": "success", "data": {"books": []}}),
                "{uri}"
            );
        }

        let (_, by_name) = send(&router, Method::GET, "/books?name=tau&reading=true", None).await;
        assert_eq!(names(&by_name), vec!["Tau"]);
    }

    #[tokio::test]
    async fn list_with_repeated_key_uses_first_value() {
        let (router, _) = app();
        create(&router, "Gemini", 200, 200, false).await;
        create(&router, "Tau", 200, 100, true).await;

        let (status, by_name) = send(&router, Method::GET, "/books?name=tau&name=gemini", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(by_name["status"], "success");
        assert_eq!(names(&by_name), vec!["Tau"]);

        let (status, finished) = send(&router, Method::GET, "/books?finished=1&finished=0", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(names(&finished), vec!["Gemini"]);
    }

    #[tokio::test]
    async fn create_with_colliding_id_is_500_and_nothing_stored() {
        let store: SharedStore = Arc::new(Mutex::new(fixed_id_store("same")));
        let router = router(Arc::clone(&store));
        create(&router, "Gemini", 200, 200, false).await;

        let (status, body) = send(
            &router,
            Method::POST,
            "/books",
            Some(book_json(Some("Tau"), 200, 100, false)),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({"status": "fail", "message": "Buku gagal ditambahkan"})
        );
        assert_eq!(store.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn get_returns_full_book() {
        let (router, _) = app();
        let id = create(&router, "Gemini", 200, 200, true).await;

        let (status, body) = send(&router, Method::GET, &format!("/books/{}", id), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        let book = &body["data"]["book"];
        assert_eq!(book["id"], id.as_str());
        assert_eq!(book["name"], "Gemini");
        assert_eq!(book["year"], 2010);
        assert_eq!(book["pageCount"], 200);
        assert_eq!(book["readPage"], 200);
        assert_eq!(book["finished"], true);
        assert_eq!(book["reading"], true);
        assert_eq!(book["insertedAt"], "2024-01-01T00:00:00Z");
        assert_eq!(book["updatedAt"], book["insertedAt"]);
    }

    #[tokio::test]
    async fn get_unknown_id_is_404() {
        let (router, _) = app();

        let (status, body) = send(&router, Method::GET, "/books/xxxxx", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({"status": "fail", "message": "Buku tidak ditemukan"})
        );
    }

    #[tokio::test]
    async fn update_replaces_book_and_refreshes_updated_at() {
        let (router, _) = app();
        let id = create(&router, "Tau", 200, 100, false).await;
        let uri = format!("/books/{}", id);

        let (status, body) = send(
            &router,
            Method::PUT,
            &uri,
            Some(book_json(Some("Tau Revisited"), 200, 200, true)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "success", "message": "Buku berhasil diperbarui"})
        );

        let (_, fetched) = send(&router, Method::GET, &uri, None).await;
        let book = &fetched["data"]["book"];
        assert_eq!(book["name"], "Tau Revisited");
        assert_eq!(book["finished"], true);
        assert_eq!(book["reading"], true);
        assert_ne!(book["updatedAt"], book["insertedAt"]);
    }

    #[tokio::test]
    async fn update_validation_messages() {
        let (router, _) = app();
        let id = create(&router, "Tau", 200, 100, false).await;
        let uri = format!("/books/{}", id);

        let (status, missing_name) = send(&router, Method::PUT, &uri, Some(book_json(None, 10, 1, false))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            missing_name["message"],
            "Gagal memperbarui buku. Mohon isi nama buku"
        );

        let (status, too_far) = send(
            &router,
            Method::PUT,
            &uri,
            Some(book_json(Some("Tau"), 10, 11, false)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            too_far["message"],
            "Gagal memperbarui buku. readPage tidak boleh lebih besar dari pageCount"
        );
    }

    #[tokio::test]
    async fn update_unknown_id_is_404_and_store_unchanged() {
        let (router, store) = app();
        create(&router, "Tau", 200, 100, false).await;
        let before = store.lock().await.list(None);

        let (status, body) = send(
            &router,
            Method::PUT,
            "/books/xxxxx",
            Some(book_json(Some("Gemini"), 10, 10, false)),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Gagal memperbarui buku. Id tidak ditemukan");
        assert_eq!(store.lock().await.list(None), before);
    }

    #[tokio::test]
    async fn delete_removes_book() {
        let (router, _) = app();
        let id = create(&router, "Tau", 200, 100, false).await;
        let uri = format!("/books/{}", id);

        let (status, body) = send(&router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"status": "success", "message": "Buku berhasil dihapus"})
        );

        let (status, _) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(&router, Method::DELETE, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Buku gagal dihapus. Id tidak ditemukan");
    }

    #[test]
    fn parse_flag_sets_only_zero_and_one() {
        assert_eq!(parse_flag(None), None);
        assert_eq!(parse_flag(Some(String::new())), None);
        assert_eq!(parse_flag(Some("0".into())), Some(Flag::Set(false)));
        assert_eq!(parse_flag(Some("1".into())), Some(Flag::Set(true)));
        assert_eq!(parse_flag(Some("true".into())), Some(Flag::Invalid));
    }

    #[test]
    fn list_query_ignores_unknown_keys_and_later_repeats() {
        let pairs = vec![
            ("page".to_string(), "2".to_string()),
            ("reading".to_string(), "1".to_string()),
            ("reading".to_string(), "0".to_string()),
        ];

        assert_eq!(
            ListQuery::from_pairs(pairs),
            ListQuery {
                reading: Some("1".to_string()),
                ..ListQuery::default()
            }
        );
    }

    #[test]
    fn impossible_store_errors_become_500() {
        let missing = WriteOp::Add.reject(BookStoreError::NotFound("x".into()));
        let collision = WriteOp::Update.reject(BookStoreError::GenericInsertFailure);

        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(collision.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(matches!(
            WriteOp::Update.reject(BookStoreError::NotFound("x".into())),
            AppError::NotFound { .. }
        ));
    }
}
