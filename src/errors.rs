//! Unified error type for the order desk.
//!
//! Engine-level validation failures live in [`ValidationError`] so callers that only
//! price line items never see storage errors; everything else is folded into [`Error`].

use crate::core::{draft::WizardStep, pricing::ValidationError};
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Invalid amount: {amount}")]
    InvalidAmount { amount: Decimal },

    #[error("Product not found: {name}")]
    ProductNotFound { name: String },

    #[error("Variant {variant_id} not found for product {product_id}")]
    VariantNotFound { product_id: i64, variant_id: i64 },

    #[error("Variant prices of product {product_id} follow the base price")]
    VariantPriceLocked { product_id: i64 },

    #[error("Order not found: {id}")]
    OrderNotFound { id: i64 },

    #[error("Unknown order status: {status}")]
    UnknownStatus { status: String },

    #[error("Cannot move from {from:?} to {to:?}")]
    InvalidTransition { from: WizardStep, to: WizardStep },

    #[error("Draft order is incomplete: {reason}")]
    IncompleteDraft { reason: String },

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Integer conversion error: {0}")]
    IntConversion(#[from] std::num::TryFromIntError),
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
