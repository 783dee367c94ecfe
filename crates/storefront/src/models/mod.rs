//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the row types the
//! repositories decode into.

pub mod catalog;
pub mod order;
pub mod review;
pub mod session;
pub mod user;

pub use catalog::{NewProduct, NewStore, Product, ProductWithReviews, Store, StoreWithProducts};
pub use order::{OrderItem, OrderLine, OrderSummary, VendorOrderLine};
pub use review::Review;
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;

/// A form or API field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Trim a required text field and check its length in characters.
///
/// # Errors
///
/// Returns `ValidationError` if the trimmed value is empty or longer than `max`.
pub fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    if value.chars().count() > max {
        return Err(ValidationError::new(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(value.to_string())
}
