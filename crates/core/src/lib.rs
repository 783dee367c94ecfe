//! Bazaar Core - domain types and rules for the marketplace.
//!
//! This crate is shared by the `storefront` server and the `cli` tools.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Everything that decides *whether* an operation is
//! allowed (role capabilities, cart arithmetic, checkout validation, review
//! input rules) lives here so it can be tested without a running Postgres.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, roles and ratings
//! - [`cart`] - Session cart value object and pricing
//! - [`checkout`] - Stock validation and order planning
//! - [`review`] - Review input validation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod review;
pub mod types;

pub use cart::{Cart, CartError, CartLine, CartSummary, Priced};
pub use checkout::{CheckoutError, CheckoutLine, CheckoutPlan, StockedProduct, plan_checkout};
pub use review::{NewReview, ReviewDraft, ReviewError};
pub use types::*;
