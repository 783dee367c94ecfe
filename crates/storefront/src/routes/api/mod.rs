//! JSON API.
//!
//! ```text
//! GET,POST        /api/stores      GET,PUT,DELETE /api/stores/{id}
//! GET,POST        /api/products    GET,PUT,DELETE /api/products/{id}
//! GET,POST        /api/reviews     GET,PUT,DELETE /api/reviews/{id}
//! ```
//!
//! Reads are open. Writes need a logged-in user and only touch rows the
//! caller owns (stores and products) or wrote (reviews); anything else is a
//! 404. Stores are returned with their products, and products with their
//! reviews.

pub mod products;
pub mod reviews;
pub mod stores;

use std::collections::HashMap;

use axum::{Router, routing::get};

use bazaar_core::{ProductId, StoreId};

use crate::db::{RepositoryError, ReviewRepository};
use crate::models::{Product, ProductWithReviews, Review, Store, StoreWithProducts};
use crate::state::AppState;

/// Build the API router (mounted under `/api`).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stores", get(stores::list).post(stores::create))
        .route(
            "/stores/{id}",
            get(stores::show).put(stores::update).delete(stores::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/reviews", get(reviews::list).post(reviews::create))
        .route(
            "/reviews/{id}",
            get(reviews::show).put(reviews::update).delete(reviews::delete),
        )
}

/// Load the reviews for `products` and attach them, keeping product order.
pub(crate) async fn with_reviews(
    reviews: &ReviewRepository<'_>,
    products: Vec<Product>,
) -> Result<Vec<ProductWithReviews>, RepositoryError> {
    let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let found = reviews.list_for_products(&ids).await?;
    Ok(attach_reviews(products, found))
}

fn attach_reviews(products: Vec<Product>, reviews: Vec<Review>) -> Vec<ProductWithReviews> {
    let mut by_product: HashMap<ProductId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_product.entry(review.product_id).or_default().push(review);
    }

    products
        .into_iter()
        .map(|product| ProductWithReviews {
            reviews: by_product.remove(&product.id).unwrap_or_default(),
            product,
        })
        .collect()
}

/// Group products under their stores, keeping store order.
pub(crate) fn attach_products(
    stores: Vec<Store>,
    products: Vec<ProductWithReviews>,
) -> Vec<StoreWithProducts> {
    let mut by_store: HashMap<StoreId, Vec<ProductWithReviews>> = HashMap::new();
    for product in products {
        by_store
            .entry(product.product.store_id)
            .or_default()
            .push(product);
    }

    stores
        .into_iter()
        .map(|store| StoreWithProducts {
            products: by_store.remove(&store.id).unwrap_or_default(),
            store,
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Price, Rating, ReviewId, UserId};
    use chrono::Utc;

    use super::*;

    fn product(id: i32, store: i32) -> Product {
        Product {
            id: ProductId::new(id),
            store_id: StoreId::new(store),
            name: format!("Product {id}"),
            description: String::new(),
            price: Price::from_cents(100),
            stock: 1,
            image: None,
            created_at: Utc::now(),
        }
    }

    fn review(id: i32, product: i32) -> Review {
        Review {
            id: ReviewId::new(id),
            product_id: ProductId::new(product),
            user_id: UserId::new(1),
            username: "ann".to_string(),
            rating: Rating::new(4).unwrap(),
            comment: "Nice".to_string(),
            verified_purchase: false,
            created_at: Utc::now(),
        }
    }

    fn store(id: i32) -> Store {
        Store {
            id: StoreId::new(id),
            owner_id: UserId::new(1),
            name: format!("Store {id}"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_attach_reviews_groups_by_product() {
        let nested = attach_reviews(
            vec![product(2, 1), product(1, 1)],
            vec![review(10, 1), review(11, 2), review(12, 1)],
        );

        assert_eq!(nested[0].product.id, ProductId::new(2));
        assert_eq!(nested[0].reviews.len(), 1);
        assert_eq!(nested[1].reviews.len(), 2);
    }

    #[test]
    fn test_attach_products_leaves_empty_stores() {
        let nested = attach_products(
            vec![store(1), store(2)],
            attach_reviews(vec![product(1, 2)], Vec::new()),
        );

        assert!(nested[0].products.is_empty());
        assert_eq!(nested[1].products.len(), 1);
    }

    #[test]
    fn test_nested_json_shape() {
        let nested = attach_products(
            vec![store(1)],
            attach_reviews(vec![product(5, 1)], vec![review(9, 5)]),
        );
        let json = serde_json::to_value(&nested[0]).unwrap();

        assert_eq!(json["id"], 1);
        assert_eq!(json["owner"], 1);
        assert_eq!(json["products"][0]["store"], 1);
        assert_eq!(json["products"][0]["reviews"][0]["product"], 5);
        assert_eq!(json["products"][0]["reviews"][0]["rating"], 4);
    }
}
