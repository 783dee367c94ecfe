//! Stores and products.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bazaar_core::{Price, Priced, ProductId, StoreId, UserId};

use super::{Review, ValidationError, required_text};

/// Maximum length of store and product names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum length of a product description.
pub const MAX_DESCRIPTION_LENGTH: usize = 10_000;

/// A vendor's store.
#[derive(Debug, Clone, Serialize)]
pub struct Store {
    pub id: StoreId,
    #[serde(rename = "owner")]
    pub owner_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A product listed in a store.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "store")]
    pub store_id: StoreId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

impl Priced for Product {
    fn product_id(&self) -> ProductId {
        self.id
    }

    fn unit_price(&self) -> Price {
        self.price
    }
}

/// API representation: a product with its reviews.
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithReviews {
    #[serde(flatten)]
    pub product: Product,
    pub reviews: Vec<Review>,
}

/// API representation: a store with its products (and their reviews).
#[derive(Debug, Clone, Serialize)]
pub struct StoreWithProducts {
    #[serde(flatten)]
    pub store: Store,
    pub products: Vec<ProductWithReviews>,
}

/// Validated input for creating or renaming a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStore {
    pub name: String,
}

impl NewStore {
    /// Validate a store name.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name is blank or too long.
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            name: required_text("name", name, MAX_NAME_LENGTH)?,
        })
    }
}

/// Validated input for creating or replacing a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock: u32,
    pub image: Option<String>,
}

impl NewProduct {
    /// Validate product fields as submitted.
    ///
    /// `price` is decimal text such as `"9.99"`. `stock` may be any integer
    /// the form or API sent; negatives are rejected.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn parse(
        name: &str,
        description: Option<&str>,
        price: &str,
        stock: i64,
        image: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let name = required_text("name", name, MAX_NAME_LENGTH)?;

        let description = description.unwrap_or_default().trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(ValidationError::new(
                "description",
                format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
            ));
        }

        let price = Price::parse(price).map_err(|e| ValidationError::new("price", e.to_string()))?;
        if price == Price::ZERO {
            return Err(ValidationError::new("price", "must be greater than zero"));
        }

        if stock < 0 {
            return Err(ValidationError::new("stock", "must be zero or more"));
        }
        // Must also fit the INTEGER column.
        let stock = i32::try_from(stock)
            .ok()
            .and_then(|s| u32::try_from(s).ok())
            .ok_or_else(|| ValidationError::new("stock", "is too large"))?;

        let image = image
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        Ok(Self {
            name,
            description,
            price,
            stock,
            image,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_product_valid() {
        let product = NewProduct::parse("Mug", Some("  Big  "), "9.5", 3, Some("")).unwrap();
        assert_eq!(product.name, "Mug");
        assert_eq!(product.description, "Big");
        assert_eq!(product.price, Price::from_cents(950));
        assert_eq!(product.stock, 3);
        assert_eq!(product.image, None);
    }

    #[test]
    fn test_new_product_rejects_negative_stock() {
        let err = NewProduct::parse("Mug", None, "1", -1, None).unwrap_err();
        assert_eq!(err.field, "stock");
    }

    #[test]
    fn test_new_product_rejects_bad_price() {
        assert_eq!(
            NewProduct::parse("Mug", None, "0", 1, None).unwrap_err().field,
            "price"
        );
        assert_eq!(
            NewProduct::parse("Mug", None, "1.234", 1, None).unwrap_err().field,
            "price"
        );
        assert_eq!(
            NewProduct::parse("Mug", None, "abc", 1, None).unwrap_err().field,
            "price"
        );
    }

    #[test]
    fn test_new_store_name_limit() {
        assert!(NewStore::parse(&"s".repeat(MAX_NAME_LENGTH)).is_ok());
        assert!(NewStore::parse(&"s".repeat(MAX_NAME_LENGTH + 1)).is_err());
        assert!(NewStore::parse("").is_err());
    }
}
