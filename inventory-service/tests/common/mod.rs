#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use inventory_service::api::{create_router, AppState};
use inventory_service::models::{NewProduct, Product};
use inventory_service::store::ProductStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::subscriber::DefaultGuard;

/// Store that keeps rows in memory and hands out ids and timestamps the way
/// a `SERIAL` / `DEFAULT NOW()` table would.
pub struct MemoryProductStore {
    inner: Mutex<Inner>,
    calls: AtomicUsize,
}

struct Inner {
    rows: Vec<Product>,
    next_id: i32,
    clock: DateTime<Utc>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                rows: Vec::new(),
                next_id: 1,
                clock: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of store operations issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Inserts a row with an explicit `created_at`, bypassing the clock.
    pub fn seed(&self, name: &str, created_at: DateTime<Utc>) -> Product {
        let mut inner = self.inner.lock().unwrap();
        let product = Product {
            id: inner.next_id,
            name: name.to_string(),
            description: None,
            quantity: 1,
            price: 1.into(),
            created_at,
        };
        inner.next_id += 1;
        inner.rows.push(product.clone());
        product
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        self.record_call();
        let mut rows = self.inner.lock().unwrap().rows.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get(&self, id: i32) -> Result<Option<Product>> {
        self.record_call();
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.iter().find(|p| p.id == id).cloned())
    }

    async fn create(&self, product: NewProduct) -> Result<Product> {
        self.record_call();
        let mut inner = self.inner.lock().unwrap();
        inner.clock = inner.clock + Duration::seconds(1);
        let created = Product {
            id: inner.next_id,
            name: product.name,
            description: product.description,
            quantity: product.quantity,
            price: product.price,
            created_at: inner.clock,
        };
        inner.next_id += 1;
        inner.rows.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i32, product: NewProduct) -> Result<Option<Product>> {
        self.record_call();
        let mut inner = self.inner.lock().unwrap();
        let Some(row) = inner.rows.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        row.name = product.name;
        row.description = product.description;
        row.quantity = product.quantity;
        row.price = product.price;
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool> {
        self.record_call();
        let mut inner = self.inner.lock().unwrap();
        let before = inner.rows.len();
        inner.rows.retain(|p| p.id != id);
        Ok(inner.rows.len() < before)
    }
}

pub const FAILURE_DETAIL: &str = "connection refused: password authentication failed for user \"inventory_user\"";

/// Store whose every operation fails like an unreachable database.
pub struct FailingProductStore;

#[async_trait]
impl ProductStore for FailingProductStore {
    async fn list(&self) -> Result<Vec<Product>> {
        Err(anyhow!(FAILURE_DETAIL))
    }

    async fn get(&self, _id: i32) -> Result<Option<Product>> {
        Err(anyhow!(FAILURE_DETAIL))
    }

    async fn create(&self, _product: NewProduct) -> Result<Product> {
        Err(anyhow!(FAILURE_DETAIL))
    }

    async fn update(&self, _id: i32, _product: NewProduct) -> Result<Option<Product>> {
        Err(anyhow!(FAILURE_DETAIL))
    }

    async fn delete(&self, _id: i32) -> Result<bool> {
        Err(anyhow!(FAILURE_DETAIL))
    }
}

pub fn memory_app() -> (Router, Arc<MemoryProductStore>) {
    let store = Arc::new(MemoryProductStore::new());
    let app = create_router(AppState::new(store.clone()));
    (app, store)
}

pub fn failing_app() -> Router {
    create_router(AppState::new(Arc::new(FailingProductStore)))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("response body is not valid JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("response body is not UTF-8")
    }
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    send_request(app, request).await
}

pub async fn send_request(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

/// Collects formatted log lines emitted on the current thread.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Routes this thread's events into a buffer until the guard drops. Pair it
/// with the default current-thread `#[tokio::test]` runtime.
pub fn capture_logs() -> (LogBuffer, DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
