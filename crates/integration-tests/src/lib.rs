//! Integration test helpers for Bazaar.
//!
//! The tests in `tests/` talk to a running storefront over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! cargo run -p bazaar-storefront &
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_TEST_URL` overrides the default `http://localhost:3000`.
//!
//! Each [`TestClient`] keeps its own session cookie and claims its own
//! client address through `X-Forwarded-For`, so the login rate limit is
//! not shared between tests.

#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode, redirect};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every test account.
pub const PASSWORD: &str = "integration-pass";

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_TEST_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// A unique name with the given prefix.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// A browser-like client: cookie store, no automatic redirects.
pub struct TestClient {
    client: Client,
    base_url: String,
    pub username: Option<String>,
}

impl TestClient {
    /// An anonymous client with a fresh session.
    #[must_use]
    pub fn new() -> Self {
        let bytes = *Uuid::new_v4().as_bytes();
        let ip = format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2]);

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_str(&ip).expect("valid header"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url(),
            username: None,
        }
    }

    /// Register (and log in) a fresh account with `role`.
    pub async fn registered(role: &str) -> Self {
        let mut client = Self::new();
        let username = unique(role);
        let email = format!("{username}@example.com");

        let resp = client
            .post_form(
                "/register",
                &[
                    ("username", username.as_str()),
                    ("email", email.as_str()),
                    ("password", PASSWORD),
                    ("password_confirm", PASSWORD),
                    ("role", role),
                ],
            )
            .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER, "registration failed");

        client.username = Some(username);
        client
    }

    /// Register a vendor.
    pub async fn vendor() -> Self {
        Self::registered("vendor").await
    }

    /// Register a buyer.
    pub async fn buyer() -> Self {
        Self::registered("buyer").await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str) -> Response {
        self.client
            .post(self.url(path))
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed")
    }

    /// GET a JSON document, asserting 200.
    pub async fn get_json(&self, path: &str) -> Value {
        let resp = self.get(path).await;
        assert_eq!(resp.status(), StatusCode::OK, "GET {path}");
        resp.json().await.expect("invalid JSON")
    }

    /// Create a store through the API and return its id.
    pub async fn create_store(&self, name: &str) -> i64 {
        let resp = self.post_json("/api/stores", &json!({ "name": name })).await;
        assert_eq!(resp.status(), StatusCode::CREATED, "store creation failed");
        id_of(&resp.json().await.expect("invalid JSON"))
    }

    /// Create a product through the API and return its id.
    pub async fn create_product(&self, store: i64, name: &str, price: &str, stock: i64) -> i64 {
        let resp = self
            .post_json(
                "/api/products",
                &json!({
                    "store": store,
                    "name": name,
                    "description": "Made for tests",
                    "price": price,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED, "product creation failed");
        id_of(&resp.json().await.expect("invalid JSON"))
    }

    /// Add one unit of `product` to the session cart.
    pub async fn add_to_cart(&self, product: i64) {
        let resp = self.post(&format!("/cart/add/{product}")).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }

    /// Current stock of `product` according to the API.
    pub async fn stock_of(&self, product: i64) -> i64 {
        self.get_json(&format!("/api/products/{product}")).await["stock"]
            .as_i64()
            .expect("stock missing")
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// The `id` field of an API object.
#[must_use]
pub fn id_of(value: &Value) -> i64 {
    value["id"].as_i64().expect("id missing")
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(resp: &Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}
