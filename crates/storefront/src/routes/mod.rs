//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                              - Home page (latest products)
//!
//! # Catalog
//! GET  /products                      - All products
//! GET  /product/{id}                  - Product detail with reviews
//! GET  /product/{id}/review           - Review form (requires auth)
//! POST /product/{id}/review           - Submit review (requires auth)
//!
//! # Cart (session)
//! GET  /cart                          - Cart page
//! POST /cart/add/{id}                 - Add one unit
//! POST /cart/remove/{id}              - Remove line
//! POST /cart/update/{id}              - Set quantity (0 removes)
//!
//! # Checkout (buyers)
//! GET  /checkout, POST /checkout      - Place order from cart
//! GET  /orders                        - Order history
//!
//! # Vendor
//! GET  /manage-store                  - Own stores
//! GET  /store/create                  - New store form
//! POST /store/create                  - Create store
//! GET  /store/{id}/products           - Products of an own store
//! GET  /store/{id}/product/create     - New product form
//! POST /store/{id}/product/create     - Create product
//! GET  /vendor-orders                 - Sales of own products
//!
//! # Auth
//! GET  /register, POST /register
//! GET  /login, POST /login
//! POST /logout
//!
//! # Twitter OAuth 2.0
//! GET  /twitter/login                 - Redirect to Twitter
//! GET  /twitter/callback              - Store the user token
//!
//! # JSON API (see `api`)
//! /api/stores, /api/products, /api/reviews
//! ```

pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod home;
pub mod products;
pub mod reviews;
pub mod twitter;
pub mod vendor;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    routing::{get, post},
};
use tower_sessions::Session;

use bazaar_core::{Cart, Role};

use crate::middleware::{OptionalAuth, api_rate_limiter, auth_rate_limiter};
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Per-request data every page template needs for the header.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    pub cart_count: u64,
}

impl PageContext {
    #[must_use]
    pub fn is_vendor(&self) -> bool {
        matches!(&self.user, Some(user) if user.role == Role::Vendor)
    }

    #[must_use]
    pub fn is_buyer(&self) -> bool {
        matches!(&self.user, Some(user) if user.role == Role::Buyer)
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let OptionalAuth(user) = OptionalAuth::from_request_parts(parts, state).await?;
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                user,
                cart_count: 0,
            });
        };

        let cart_count = session
            .get::<Cart>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .map_or(0, |cart| cart.item_count());

        Ok(Self { user, cart_count })
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add/{id}", post(cart::add))
        .route("/remove/{id}", post(cart::remove))
        .route("/update/{id}", post(cart::update))
}

/// Create the vendor routes router.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/manage-store", get(vendor::manage_store))
        .route(
            "/store/create",
            get(vendor::create_store_page).post(vendor::create_store),
        )
        .route("/store/{id}/products", get(vendor::store_products))
        .route(
            "/store/{id}/product/create",
            get(vendor::create_product_page).post(vendor::create_product),
        )
        .route("/vendor-orders", get(vendor::vendor_orders))
}

/// Create the auth routes router (rate limited).
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
}

/// Create the Twitter OAuth routes router.
pub fn twitter_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(twitter::login))
        .route("/callback", get(twitter::callback))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .route("/products", get(products::index))
        .route("/product/{id}", get(products::show))
        .route(
            "/product/{id}/review",
            get(reviews::review_page).post(reviews::submit),
        )
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout accepts GET as well as POST
        .route(
            "/checkout",
            get(checkout::checkout).post(checkout::checkout),
        )
        .route("/orders", get(checkout::orders))
        // Vendor pages
        .merge(vendor_routes())
        // Auth routes
        .merge(auth_routes())
        // Twitter account connection
        .nest("/twitter", twitter_routes())
        // JSON API
        .nest("/api", api::routes().layer(api_rate_limiter()))
}
