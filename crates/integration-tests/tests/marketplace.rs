//! End-to-end marketplace tests.
//!
//! These tests require:
//! - A running `PostgreSQL` database with migrations applied (`bazaar migrate`)
//! - The storefront server running (`cargo run -p bazaar-storefront`)
//!
//! Run with: `cargo test -p bazaar-integration-tests -- --ignored`

#![allow(clippy::unwrap_used)]

use bazaar_integration_tests::{TestClient, id_of, location, unique};
use reqwest::StatusCode;
use serde_json::json;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_health_endpoints() {
    let client = TestClient::new();

    assert_eq!(client.get("/health").await.status(), StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status(), StatusCode::OK);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_vendor_buyer_purchase_and_verified_review() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Teapot", "12.50", 5).await;

    let buyer = TestClient::buyer().await;
    buyer.add_to_cart(product).await;
    buyer.add_to_cart(product).await;

    let cart = buyer.get("/cart").await.text().await.unwrap();
    assert!(cart.contains("Teapot"));
    assert!(cart.contains("25.00"));

    let resp = buyer.post("/checkout").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = resp.text().await.unwrap();
    assert!(page.contains("Order #"));
    assert!(page.contains("25.00"));

    assert_eq!(buyer.stock_of(product).await, 3);

    // The cart is empty after a successful checkout.
    let cart = buyer.get("/cart").await.text().await.unwrap();
    assert!(cart.contains("Your cart is empty"));

    let orders = buyer.get("/orders").await.text().await.unwrap();
    assert!(orders.contains("Teapot"));

    let sales = vendor.get("/vendor-orders").await.text().await.unwrap();
    assert!(sales.contains(buyer.username.as_deref().unwrap()));

    let resp = buyer
        .post_json(
            "/api/reviews",
            &json!({ "product": product, "rating": 5, "comment": "Pours well" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let review: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(review["verified_purchase"], true);
    assert_eq!(review["rating"], 5);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_review_without_purchase_is_not_verified() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Kettle", "30", 2).await;

    let buyer = TestClient::buyer().await;
    let resp = buyer
        .post_form(
            &format!("/product/{product}/review"),
            &[("rating", "3"), ("comment", "Looks nice")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some(format!("/product/{product}").as_str()));

    let detail = buyer.get_json(&format!("/api/products/{product}")).await;
    let reviews = detail["reviews"].as_array().unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0]["verified_purchase"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_empty_cart_conflicts() {
    let buyer = TestClient::buyer().await;

    assert_eq!(buyer.post("/checkout").await.status(), StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_vendor_cannot_checkout() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Cup", "4", 10).await;
    vendor.add_to_cart(product).await;

    assert_eq!(vendor.post("/checkout").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(vendor.stock_of(product).await, 10);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_insufficient_stock_leaves_stock_untouched() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Rare vase", "99.99", 1).await;

    let buyer = TestClient::buyer().await;
    buyer.add_to_cart(product).await;
    let resp = buyer
        .post_form(&format!("/cart/update/{product}"), &[("quantity", "3")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);

    assert_eq!(buyer.post("/checkout").await.status(), StatusCode::CONFLICT);
    assert_eq!(buyer.stock_of(product).await, 1);

    let orders = buyer.get("/orders").await.text().await.unwrap();
    assert!(orders.contains("No orders yet"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_concurrent_checkouts_do_not_oversell() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Last lamp", "40", 1).await;

    let first = TestClient::buyer().await;
    let second = TestClient::buyer().await;
    first.add_to_cart(product).await;
    second.add_to_cart(product).await;

    let (a, b) = tokio::join!(first.post("/checkout"), second.post("/checkout"));
    let mut statuses = [a.status(), b.status()];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::OK, StatusCode::CONFLICT]);

    assert_eq!(first.stock_of(product).await, 0);
}

// ============================================================================
// Cart
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_quantity_zero_removes_line() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Spoon", "1.25", 50).await;

    let shopper = TestClient::new();
    shopper.add_to_cart(product).await;
    let cart = shopper.get("/cart").await.text().await.unwrap();
    assert!(cart.contains("Spoon"));

    shopper
        .post_form(&format!("/cart/update/{product}"), &[("quantity", "0")])
        .await;
    let cart = shopper.get("/cart").await.text().await.unwrap();
    assert!(cart.contains("Your cart is empty"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_add_missing_product_is_not_found() {
    let shopper = TestClient::new();

    assert_eq!(
        shopper.post("/cart/add/2147483647").await.status(),
        StatusCode::NOT_FOUND
    );
}

// ============================================================================
// Access control
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_vendor_pages_redirect_anonymous_to_login() {
    let anonymous = TestClient::new();

    let resp = anonymous.get("/manage-store").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), Some("/login"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_buyer_cannot_manage_stores() {
    let buyer = TestClient::buyer().await;

    assert_eq!(
        buyer.get("/manage-store").await.status(),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        buyer
            .post_json("/api/stores", &json!({ "name": "Nope" }))
            .await
            .status(),
        StatusCode::FORBIDDEN
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_api_writes_require_authentication() {
    let anonymous = TestClient::new();

    let resp = anonymous
        .post_json("/api/stores", &json!({ "name": "Anon" }))
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = anonymous.get("/api/stores").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_api_writes_are_owner_scoped() {
    let owner = TestClient::vendor().await;
    let store = owner.create_store(&unique("store")).await;
    let product = owner.create_product(store, "Bowl", "8", 3).await;

    let other = TestClient::vendor().await;
    let rename = json!({ "name": "Hijacked" });
    assert_eq!(
        other
            .put_json(&format!("/api/stores/{store}"), &rename)
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        other.delete(&format!("/api/products/{product}")).await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        other
            .post_json(
                "/api/products",
                &json!({ "store": store, "name": "Sneaky", "price": "1", "stock": 1 }),
            )
            .await
            .status(),
        StatusCode::NOT_FOUND
    );

    let resp = owner
        .put_json(&format!("/api/stores/{store}"), &json!({ "name": "Renamed" }))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let detail = owner.get_json(&format!("/api/stores/{store}")).await;
    assert_eq!(detail["name"], "Renamed");
    assert_eq!(id_of(&detail["products"][0]), product);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_vendor_pages_are_owner_scoped() {
    let owner = TestClient::vendor().await;
    let store = owner.create_store(&unique("store")).await;

    let other = TestClient::vendor().await;
    assert_eq!(
        other
            .get(&format!("/store/{store}/products"))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        other
            .get(&format!("/store/{store}/product/create"))
            .await
            .status(),
        StatusCode::NOT_FOUND
    );
    let resp = other
        .post_form(
            &format!("/store/{store}/product/create"),
            &[
                ("name", "Sneaky"),
                ("description", ""),
                ("price", "1.00"),
                ("stock", "1"),
                ("image", ""),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let listing = owner.get_json(&format!("/api/stores/{store}")).await;
    assert_eq!(listing["products"].as_array().map(Vec::len), Some(0));

    assert_eq!(
        owner.get(&format!("/store/{store}/products")).await.status(),
        StatusCode::OK
    );
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_review_edit_is_author_scoped() {
    let vendor = TestClient::vendor().await;
    let store = vendor.create_store(&unique("store")).await;
    let product = vendor.create_product(store, "Jug", "15", 4).await;

    let author = TestClient::buyer().await;
    let resp = author
        .post_json(
            "/api/reviews",
            &json!({ "product": product, "rating": 2, "comment": "Leaks" }),
        )
        .await;
    let review = id_of(&resp.json().await.unwrap());

    let other = TestClient::buyer().await;
    let edit = json!({ "rating": 1, "comment": "Edited by someone else" });
    assert_eq!(
        other
            .put_json(&format!("/api/reviews/{review}"), &edit)
            .await
            .status(),
        StatusCode::NOT_FOUND
    );

    let resp = author
        .put_json(
            &format!("/api/reviews/{review}"),
            &json!({ "rating": 4, "comment": "Fixed the lid" }),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(updated["rating"], 4);

    assert_eq!(
        author
            .delete(&format!("/api/reviews/{review}"))
            .await
            .status(),
        StatusCode::NO_CONTENT
    );
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_logout_round_trip() {
    let user = TestClient::buyer().await;
    let username = user.username.clone().unwrap();

    let resp = user.post("/logout").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(user.get("/orders").await.status(), StatusCode::SEE_OTHER);

    let resp = user
        .post_form(
            "/login",
            &[("username", username.as_str()), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = user
        .post_form(
            "/login",
            &[
                ("username", username.as_str()),
                ("password", bazaar_integration_tests::PASSWORD),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(user.get("/orders").await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_duplicate_username_conflicts() {
    let first = TestClient::buyer().await;
    let username = first.username.clone().unwrap();

    let second = TestClient::new();
    let resp = second
        .post_form(
            "/register",
            &[
                ("username", username.as_str()),
                ("email", "dupe@example.com"),
                ("password", bazaar_integration_tests::PASSWORD),
                ("password_confirm", bazaar_integration_tests::PASSWORD),
                ("role", "buyer"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
