#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use catalog_api::auth::password::hash_password;
use catalog_api::auth::sign_token;
use catalog_api::config::AppConfig;
use catalog_api::database::{Document, DocumentStore, MemoryStore};
use catalog_api::types::{Collection, Role};
use catalog_api::{app, AppState};

pub const PASSWORD: &str = "correct horse battery";

/// In-process application over a fresh memory store
pub struct TestApp {
    pub state: AppState,
    router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::development())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let state = AppState::new(store, config);
        let router = app(state.clone());
        Self { state, router }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.state.store.as_ref()
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);
        TestResponse {
            status,
            headers,
            body,
            raw,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None).await
    }

    /// Insert a user directly and return `(id, token)`
    pub async fn seed_user(&self, name: &str, email: &str, role: Role) -> (String, String) {
        let doc = document(json!({
            "name": name,
            "email": email,
            "password": hash_password(PASSWORD).unwrap(),
            "role": role.as_str(),
        }));
        let user = self.store().insert(Collection::Users, doc).await.unwrap();
        let id = user["_id"].as_str().unwrap().to_string();
        let token = sign_token(&id, &self.state.config.security).unwrap();
        (id, token)
    }

    pub async fn admin_token(&self) -> String {
        self.seed_user("Admin", "admin@example.com", Role::Admin).await.1
    }

    pub async fn user_token(&self) -> String {
        self.seed_user("Ursula", "ursula@example.com", Role::User).await.1
    }

    pub async fn seed_category(&self, name: &str) -> String {
        let category = self
            .store()
            .insert(Collection::Categories, document(json!({ "name": name })))
            .await
            .unwrap();
        category["_id"].as_str().unwrap().to_string()
    }

    pub async fn seed_product(&self, name: &str, price: f64, quantity: i64, category: &str) -> String {
        let product = self
            .store()
            .insert(
                Collection::Products,
                document(json!({
                    "name": name,
                    "description": format!("{} description", name),
                    "price": price,
                    "category": category,
                    "inStock": true,
                    "quantity": quantity,
                    "imageUrl": "default-product.jpg",
                })),
            )
            .await
            .unwrap();
        product["_id"].as_str().unwrap().to_string()
    }
}

pub fn document(value: Value) -> Document {
    value.as_object().cloned().expect("object literal")
}

/// Names of the products in a listing response, in order
pub fn product_names(body: &Value) -> Vec<String> {
    body["data"]["products"]
        .as_array()
        .expect("products array")
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

/// The server binary running against an in-memory store on a free port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub fn spawn(admin_email: &str, admin_password: &str) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_catalog-api"));
        cmd.env("APP_ENV", "development")
            .env("CATALOG_API_PORT", port.to_string())
            .env("STORE_BACKEND", "memory")
            .env("ADMIN_EMAIL", admin_email)
            .env("ADMIN_PASSWORD", admin_password)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            child,
        })
    }

    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
