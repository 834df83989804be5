//! Integration tests for the Inkpress backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::config::{Config, TranslateConfig};
use crate::db::{init_database, Repository};
use crate::errors::AppError;
use crate::translate::{TranslationEngine, Translator};
use crate::{create_router, AppState};

/// In-process engine double: counts calls and "translates" by rewriting a
/// known word, so tests can assert both output and call counts.
struct FakeEngine {
    calls: Arc<AtomicUsize>,
    fail: bool,
}

#[async_trait]
impl TranslationEngine for FakeEngine {
    async fn localize_html(
        &self,
        html: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Translation("engine down".to_string()));
        }
        if source_locale == target_locale {
            return Ok(html.to_string());
        }
        Ok(html.replace("Hello", "Hola"))
    }
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    engine_calls: Arc<AtomicUsize>,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::build(Some("test-api-key".to_string()), false).await
    }

    async fn with_failing_engine() -> Self {
        Self::build(Some("test-api-key".to_string()), true).await
    }

    async fn build(psk: Option<String>, engine_fails: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        // Initialize database
        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        // Wire the fake engine into the translation pipeline
        let engine_calls = Arc::new(AtomicUsize::new(0));
        let engine = Arc::new(FakeEngine {
            calls: engine_calls.clone(),
            fail: engine_fails,
        });
        let translator = Arc::new(Translator::new(repo.clone(), engine));

        // Create config
        let config = Config {
            api_psk: psk.clone(),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
            translate: TranslateConfig {
                endpoint: "http://127.0.0.1:9/unused".to_string(),
                api_key: String::new(),
                timeout_secs: 5,
            },
        };

        let state = AppState {
            repo,
            translator,
            config: Arc::new(config),
        };

        let app = create_router(state);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        // Spawn server
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            engine_calls,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn engine_call_count(&self) -> usize {
        self.engine_calls.load(Ordering::SeqCst)
    }

    /// Create a document and return its id.
    async fn create_document(&self, content: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/documents"))
            .json(&json!({
                "ownerId": "author-1",
                "title": "Test Document",
                "content": content
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Publish a document under a slug.
    async fn publish(&self, id: &str, slug: &str) {
        let resp = self
            .client
            .post(self.url(&format!("/api/documents/{}/publish", id)))
            .json(&json!({ "slug": slug }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }
}

const HELLO_DOC: &str = r#"[{"type":"paragraph","content":"Hello"}]"#;

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let fixture = TestFixture::new().await;

    // Fresh client without the default PSK header
    let client = Client::new();
    let resp = client
        .get(fixture.url("/api/documents"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let fixture = TestFixture::new().await;

    let client = Client::new();
    let resp = client
        .get(fixture.url("/api/documents"))
        .header("x-api-key", "wrong-key")
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_public_routes_need_no_auth() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "open-page").await;

    // Anonymous client
    let client = Client::new();
    let resp = client
        .get(fixture.url("/pages/open-page"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_document_crud() {
    let fixture = TestFixture::new().await;

    // Create document
    let create_resp = fixture
        .client
        .post(fixture.url("/api/documents"))
        .json(&json!({
            "ownerId": "author-1",
            "title": "My Article",
            "content": HELLO_DOC,
            "sourceLocale": "en"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(create_body["success"], true);
    let doc_id = create_body["data"]["id"].as_str().unwrap();
    assert_eq!(create_body["data"]["title"], "My Article");
    assert_eq!(create_body["data"]["published"], false);
    assert_eq!(create_body["data"]["version"], 1);

    // Get document
    let get_resp = fixture
        .client
        .get(fixture.url(&format!("/api/documents/{}", doc_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(get_resp.status(), 200);
    let get_body: Value = get_resp.json().await.unwrap();
    assert_eq!(get_body["data"]["content"], HELLO_DOC);

    // Update document
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/documents/{}", doc_id)))
        .json(&json!({
            "title": "My Updated Article",
            "expectedVersion": 1
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["title"], "My Updated Article");
    assert_eq!(update_body["data"]["version"], 2);

    // List documents by owner
    let list_resp = fixture
        .client
        .get(fixture.url("/api/documents?ownerId=author-1"))
        .send()
        .await
        .unwrap();

    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);

    // Another owner sees nothing
    let other_resp = fixture
        .client
        .get(fixture.url("/api/documents?ownerId=author-2"))
        .send()
        .await
        .unwrap();
    let other_body: Value = other_resp.json().await.unwrap();
    assert!(other_body["data"].as_array().unwrap().is_empty());

    // Delete document
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/documents/{}", doc_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(delete_resp.status(), 200);

    // Verify deleted
    let get_deleted_resp = fixture
        .client
        .get(fixture.url(&format!("/api/documents/{}", doc_id)))
        .send()
        .await
        .unwrap();

    assert_eq!(get_deleted_resp.status(), 404);
}

#[tokio::test]
async fn test_create_document_validation() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/documents"))
        .json(&json!({
            "ownerId": "author-1",
            "title": "   ",
            "content": HELLO_DOC
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_optimistic_concurrency_conflict() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;

    // Update with wrong version
    let conflict_resp = fixture
        .client
        .put(fixture.url(&format!("/api/documents/{}", id)))
        .json(&json!({
            "title": "Should Fail",
            "expectedVersion": 999
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(conflict_resp.status(), 409);
    let conflict_body: Value = conflict_resp.json().await.unwrap();
    assert_eq!(conflict_body["success"], false);
    assert_eq!(conflict_body["error"]["code"], "VERSION_MISMATCH");
    assert!(conflict_body["error"]["details"]["currentVersion"].is_number());
}

#[tokio::test]
async fn test_publish_flow() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;

    // Unpublished documents are not visible publicly
    let before_resp = fixture
        .client
        .get(fixture.url("/pages/my-page"))
        .send()
        .await
        .unwrap();
    assert_eq!(before_resp.status(), 404);

    // Invalid slug is rejected
    let bad_slug_resp = fixture
        .client
        .post(fixture.url(&format!("/api/documents/{}/publish", id)))
        .json(&json!({ "slug": "Not A Slug" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_slug_resp.status(), 400);

    // Publish
    let publish_resp = fixture
        .client
        .post(fixture.url(&format!("/api/documents/{}/publish", id)))
        .json(&json!({ "slug": "my-page" }))
        .send()
        .await
        .unwrap();
    assert_eq!(publish_resp.status(), 200);
    let publish_body: Value = publish_resp.json().await.unwrap();
    assert_eq!(publish_body["data"]["slug"], "my-page");
    assert_eq!(publish_body["data"]["published"], true);

    // Public page view serves the source-locale HTML
    let page_resp = fixture
        .client
        .get(fixture.url("/pages/my-page"))
        .send()
        .await
        .unwrap();
    assert_eq!(page_resp.status(), 200);
    let page_body: Value = page_resp.json().await.unwrap();
    assert_eq!(page_body["data"]["html"], "<p>Hello</p>");
    assert_eq!(page_body["data"]["title"], "Test Document");
    assert_eq!(page_body["data"]["hasForm"], false);

    // Unpublish takes the page down
    let unpublish_resp = fixture
        .client
        .post(fixture.url(&format!("/api/documents/{}/unpublish", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(unpublish_resp.status(), 200);

    let after_resp = fixture
        .client
        .get(fixture.url("/pages/my-page"))
        .send()
        .await
        .unwrap();
    assert_eq!(after_resp.status(), 404);
}

#[tokio::test]
async fn test_duplicate_slug_rejected() {
    let fixture = TestFixture::new().await;
    let first = fixture.create_document(HELLO_DOC).await;
    let second = fixture.create_document(HELLO_DOC).await;

    fixture.publish(&first, "taken").await;

    let resp = fixture
        .client
        .post(fixture.url(&format!("/api/documents/{}/publish", second)))
        .json(&json!({ "slug": "taken" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_translated_html_is_cached() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "hello-page").await;

    // First request translates and caches
    let first_resp = fixture
        .client
        .get(fixture.url("/pages/hello-page/html?locale=es"))
        .send()
        .await
        .unwrap();
    assert_eq!(first_resp.status(), 200);
    let first_body: Value = first_resp.json().await.unwrap();
    assert_eq!(first_body["data"]["html"], "<p>Hola</p>");
    assert_eq!(fixture.engine_call_count(), 1);

    // Second request is served from the cache
    let second_resp = fixture
        .client
        .get(fixture.url("/pages/hello-page/html?locale=es"))
        .send()
        .await
        .unwrap();
    let second_body: Value = second_resp.json().await.unwrap();
    assert_eq!(second_body["data"]["html"], "<p>Hola</p>");
    assert_eq!(fixture.engine_call_count(), 1);

    // Editing the content makes the cache stale
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/documents/{}", id)))
        .json(&json!({
            "content": r#"[{"type":"paragraph","content":"Hello again"}]"#
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);

    let third_resp = fixture
        .client
        .get(fixture.url("/pages/hello-page/html?locale=es"))
        .send()
        .await
        .unwrap();
    let third_body: Value = third_resp.json().await.unwrap();
    assert_eq!(third_body["data"]["html"], "<p>Hola again</p>");
    assert_eq!(fixture.engine_call_count(), 2);
}

#[tokio::test]
async fn test_page_html_defaults_to_source_locale() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "default-locale").await;

    let resp = fixture
        .client
        .get(fixture.url("/pages/default-locale/html"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["html"], "<p>Hello</p>");
}

#[tokio::test]
async fn test_translation_failure_presents_unavailable() {
    let fixture = TestFixture::with_failing_engine().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "broken").await;

    let resp = fixture
        .client
        .get(fixture.url("/pages/broken/html?locale=es"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 502);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "TRANSLATION_UNAVAILABLE");
    assert_eq!(body["error"]["message"], "Translation unavailable");
}

#[tokio::test]
async fn test_form_lifecycle_and_csv_export() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "with-form").await;

    // Attach a form
    let put_resp = fixture
        .client
        .put(fixture.url(&format!("/api/documents/{}/form", id)))
        .json(&json!({
            "fields": [
                { "name": "email", "type": "text", "required": true },
                { "name": "note", "type": "textarea" }
            ]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(put_resp.status(), 200);
    let put_body: Value = put_resp.json().await.unwrap();
    assert_eq!(put_body["data"]["version"], 1);

    // Replacing bumps the version, same document key
    let replace_resp = fixture
        .client
        .put(fixture.url(&format!("/api/documents/{}/form", id)))
        .json(&json!({
            "fields": [
                { "name": "email", "type": "text", "required": true },
                { "name": "note", "type": "textarea" },
                { "name": "rating", "type": "select" }
            ]
        }))
        .send()
        .await
        .unwrap();
    let replace_body: Value = replace_resp.json().await.unwrap();
    assert_eq!(replace_body["data"]["version"], 2);

    // Public page now reports the form
    let page_resp = fixture
        .client
        .get(fixture.url("/pages/with-form"))
        .send()
        .await
        .unwrap();
    let page_body: Value = page_resp.json().await.unwrap();
    assert_eq!(page_body["data"]["hasForm"], true);

    // Anonymous visitor submits a response
    let client = Client::new();
    let submit_resp = client
        .post(fixture.url("/pages/with-form/form/responses"))
        .json(&json!({
            "answers": { "email": "reader@example.com", "note": "hi, there", "rating": 5 }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(submit_resp.status(), 200);

    // Non-object answers are rejected
    let bad_submit_resp = client
        .post(fixture.url("/pages/with-form/form/responses"))
        .json(&json!({ "answers": "just text" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_submit_resp.status(), 400);

    // Owner lists responses
    let list_resp = fixture
        .client
        .get(fixture.url(&format!("/api/documents/{}/responses", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    assert_eq!(list_body["data"].as_array().unwrap().len(), 1);
    assert_eq!(list_body["data"][0]["answers"]["email"], "reader@example.com");

    // CSV export
    let export_resp = fixture
        .client
        .get(fixture.url(&format!("/api/documents/{}/responses/export", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(export_resp.status(), 200);
    assert!(export_resp
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    let csv = export_resp.text().await.unwrap();
    assert!(csv.starts_with("submittedAt,email,note,rating\r\n"));
    assert!(csv.contains("reader@example.com"));
    assert!(csv.contains("\"hi, there\""));

    // Delete the form; responses go with it
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/documents/{}/form", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let get_form_resp = fixture
        .client
        .get(fixture.url(&format!("/api/documents/{}/form", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(get_form_resp.status(), 404);
}

#[tokio::test]
async fn test_submit_response_needs_a_form() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "formless").await;

    let client = Client::new();
    let resp = client
        .post(fixture.url("/pages/formless/form/responses"))
        .json(&json!({ "answers": { "email": "x@y.z" } }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_delete_document_removes_public_page() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document(HELLO_DOC).await;
    fixture.publish(&id, "short-lived").await;

    // Warm the translation cache
    let warm_resp = fixture
        .client
        .get(fixture.url("/pages/short-lived/html?locale=es"))
        .send()
        .await
        .unwrap();
    assert_eq!(warm_resp.status(), 200);

    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/documents/{}", id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    let page_resp = fixture
        .client
        .get(fixture.url("/pages/short-lived/html?locale=es"))
        .send()
        .await
        .unwrap();
    assert_eq!(page_resp.status(), 404);
}

#[tokio::test]
async fn test_malformed_content_renders_as_plain_paragraph() {
    let fixture = TestFixture::new().await;
    let id = fixture.create_document("not json").await;
    fixture.publish(&id, "fallback").await;

    let resp = fixture
        .client
        .get(fixture.url("/pages/fallback/html"))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["html"], "<p>not json</p>");
}
