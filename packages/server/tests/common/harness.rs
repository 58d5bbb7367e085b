//! Test harness: an in-memory catalog wired into the HTTP router.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use catalog::testing::offering_spec;
use catalog::{ingest, CatalogStore, MemoryStore, Modality};
use server_core::server::build_app;

pub struct TestHarness {
    pub store: Arc<dyn CatalogStore>,
    pub app: Router,
}

impl TestHarness {
    /// Empty catalog.
    pub fn new() -> Self {
        let store: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
        let app = build_app(store.clone(), &[]);
        Self { store, app }
    }

    /// Catalog with three active offerings and one inactive one.
    ///
    /// | api name      | provider | input | output | modalities  |
    /// |---------------|----------|-------|--------|-------------|
    /// | acme/small    | Acme     | 1     | 2      | text        |
    /// | acme/vision   | Acme     | 5     | 15     | text, image |
    /// | zenith/large  | Zenith   | 10    | 30     | text        |
    /// | zenith/legacy | Zenith   | 0.5   | 0.5    | text (off)  |
    pub async fn seeded() -> Self {
        let harness = Self::new();
        let specs = vec![
            offering_spec("Acme", "Small", "acme/small", 1.0, 2.0),
            offering_spec("Acme", "Vision", "acme/vision", 5.0, 15.0)
                .with_modalities([Modality::Text, Modality::Image])
                .with_context_window(128_000),
            offering_spec("Zenith", "Large", "zenith/large", 10.0, 30.0).with_tools(true),
            offering_spec("Zenith", "Legacy", "zenith/legacy", 0.5, 0.5).with_active(false),
        ];
        let report = ingest(harness.store.as_ref(), "fixture", &specs).await;
        assert!(report.is_success(), "fixture ingest failed: {:?}", report.failures);
        harness
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}
