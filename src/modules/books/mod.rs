pub mod models;
pub mod providers;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Module};
use tokio::sync::Mutex;

use routes::SharedStore;
use store::BookStore;

/// Books module: owns the in-memory book store and serves `/books`
pub struct BooksModule {
    store: SharedStore,
}

impl BooksModule {
    pub fn new() -> Self {
        Self::with_store(BookStore::new())
    }

    pub fn with_store(store: BookStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }
}

impl Default for BooksModule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(Arc::clone(&self.store))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(openapi_fragment())
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        let books = self.store.lock().await.len();
        tracing::info!(module = self.name(), books, "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        // Nothing is persisted; whatever is still held goes away with the process
        let books = self.store.lock().await.len();
        tracing::info!(
            module = self.name(),
            discarded = books,
            "books module stopped"
        );
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(BooksModule::new())
}

fn fail_response(description: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "$ref": "#/components/schemas/FailResponse"
                }
            }
        }
    })
}

fn success_response(description: &str, schema: &str) -> serde_json::Value {
    json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": {
                    "$ref": format!("#/components/schemas/{}", schema)
                }
            }
        }
    })
}

fn openapi_fragment() -> serde_json::Value {
    json!({
        "paths": {
            "/books": collection_paths(),
            "/books/{bookId}": item_paths()
        },
        "components": {
            "schemas": schemas()
        }
    })
}

fn payload_body() -> serde_json::Value {
    json!({
        "required": true,
        "content": {
            "application/json": {
                "schema": {"$ref": "#/components/schemas/BookPayload"}
            }
        }
    })
}

fn flag_param(name: &str, description: &str) -> serde_json::Value {
    json!({
        "name": name,
        "in": "query",
        "required": false,
        "description": description,
        "schema": {"type": "string", "enum": ["0", "1"]}
    })
}

fn collection_paths() -> serde_json::Value {
    let create = json!({
        "summary": "Add a book",
        "tags": ["Books"],
        "requestBody": payload_body(),
        "responses": {
            "201": success_response("Book added", "BookCreatedResponse"),
            "400": fail_response("Missing name, readPage over pageCount, or malformed payload"),
            "500": fail_response("Book could not be stored")
        }
    });

    let name_param = json!({
        "name": "name",
        "in": "query",
        "required": false,
        "description": "Case-insensitive substring of the book name",
        "schema": {"type": "string"}
    });

    let list = json!({
        "summary": "List books",
        "tags": ["Books"],
        "description": "At most one filter applies: name, then reading, then finished. A flag other than 0 or 1 matches no book; a repeated key keeps its first value.",
        "parameters": [
            name_param,
            flag_param("reading", "1 for books being read, 0 otherwise"),
            flag_param("finished", "1 for finished books, 0 otherwise")
        ],
        "responses": {
            "200": success_response("Book summaries", "BookListResponse")
        }
    });

    json!({"post": create, "get": list})
}

fn item_paths() -> serde_json::Value {
    let book_id_param = json!({
        "name": "bookId",
        "in": "path",
        "required": true,
        "schema": {"type": "string"}
    });

    let get = json!({
        "summary": "Get a book",
        "tags": ["Books"],
        "parameters": [book_id_param.clone()],
        "responses": {
            "200": success_response("The book", "BookDetailResponse"),
            "404": fail_response("Book not found")
        }
    });

    let put = json!({
        "summary": "Replace a book",
        "tags": ["Books"],
        "parameters": [book_id_param.clone()],
        "requestBody": payload_body(),
        "responses": {
            "200": success_response("Book updated", "MessageResponse"),
            "400": fail_response("Missing name, readPage over pageCount, or malformed payload"),
            "404": fail_response("Book not found")
        }
    });

    let delete = json!({
        "summary": "Delete a book",
        "tags": ["Books"],
        "parameters": [book_id_param],
        "responses": {
            "200": success_response("Book deleted", "MessageResponse"),
            "404": fail_response("Book not found")
        }
    });

    json!({"get": get, "put": put, "delete": delete})
}

fn success_envelope(data: Option<serde_json::Value>, with_message: bool) -> serde_json::Value {
    let mut properties = serde_json::Map::new();
    let mut required = vec![json!("status")];
    properties.insert(
        "status".to_string(),
        json!({"type": "string", "enum": ["success"]}),
    );
    if with_message {
        properties.insert("message".to_string(), json!({"type": "string"}));
        required.push(json!("message"));
    }
    if let Some(data) = data {
        properties.insert("data".to_string(), data);
        required.push(json!("data"));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

fn schemas() -> serde_json::Value {
    let book = json!({
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "name": {"type": "string"},
            "year": {"type": "integer"},
            "author": {"type": "string"},
            "summary": {"type": "string"},
            "publisher": {"type": "string"},
            "pageCount": {"type": "integer", "minimum": 0},
            "readPage": {"type": "integer", "minimum": 0},
            "finished": {"type": "boolean", "description": "pageCount == readPage"},
            "reading": {"type": "boolean"},
            "insertedAt": {"type": "string", "format": "date-time"},
            "updatedAt": {"type": "string", "format": "date-time"}
        },
        "required": [
            "id", "name", "year", "author", "summary", "publisher",
            "pageCount", "readPage", "finished", "reading",
            "insertedAt", "updatedAt"
        ]
    });

    let payload = json!({
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "year": {"type": "integer"},
            "author": {"type": "string"},
            "summary": {"type": "string"},
            "publisher": {"type": "string"},
            "pageCount": {"type": "integer", "minimum": 0},
            "readPage": {"type": "integer", "minimum": 0},
            "reading": {"type": "boolean"}
        },
        "required": [
            "year", "author", "summary", "publisher",
            "pageCount", "readPage", "reading"
        ]
    });

    let summary = json!({
        "type": "object",
        "properties": {
            "id": {"type": "string"},
            "name": {"type": "string"},
            "publisher": {"type": "string"}
        },
        "required": ["id", "name", "publisher"]
    });

    let created_data = json!({
        "type": "object",
        "properties": {"bookId": {"type": "string"}},
        "required": ["bookId"]
    });
    let list_data = json!({
        "type": "object",
        "properties": {
            "books": {
                "type": "array",
                "items": {"$ref": "#/components/schemas/BookSummary"}
            }
        },
        "required": ["books"]
    });
    let detail_data = json!({
        "type": "object",
        "properties": {"book": {"$ref": "#/components/schemas/Book"}},
        "required": ["book"]
    });

    json!({
        "Book": book,
        "BookPayload": payload,
        "BookSummary": summary,
        "BookCreatedResponse": success_envelope(Some(created_data), true),
        "BookListResponse": success_envelope(Some(list_data), false),
        "BookDetailResponse": success_envelope(Some(detail_data), false),
        "MessageResponse": success_envelope(None, true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_kernel::settings::Settings;

    #[tokio::test]
    async fn lifecycle_hooks_succeed() {
        let module = BooksModule::new();
        let settings = Settings::default();
        let ctx = InitCtx {
            settings: &settings,
        };

        module.init(&ctx).await.unwrap();
        module.start(&ctx).await.unwrap();
        module.stop().await.unwrap();
    }

    #[test]
    fn openapi_fragment_documents_every_route() {
        let fragment = BooksModule::new().openapi().unwrap();
        let paths = &fragment["paths"];

        assert!(paths["/books"]["post"].is_object());
        assert!(paths["/books"]["get"].is_object());
        for method in ["get", "put", "delete"] {
            assert!(paths["/books/{bookId}"][method].is_object(), "{method}");
        }
        assert!(fragment["components"]["schemas"]["Book"].is_object());
    }

    #[test]
    fn list_documents_no_failure_response() {
        let fragment = BooksModule::new().openapi().unwrap();
        let responses = fragment["paths"]["/books"]["get"]["responses"]
            .as_object()
            .unwrap();

        assert_eq!(responses.keys().collect::<Vec<_>>(), vec!["200"]);
    }
}
