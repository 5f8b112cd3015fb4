//! Shared test utilities for the order desk.
//!
//! This module provides common helper functions for setting up test databases
//! and creating catalog entries and submissions with sensible defaults.

use crate::{
    config::settings::ShippingZoneConfig,
    core::{
        draft::{CustomerInfo, OrderSubmission},
        pricing::{AdjustmentKind, LineItem, Transaction},
        product::{self, NewProduct, NewVariant},
        shipping::ShippingZones,
    },
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Delivery charge used by [`sample_zones`] and [`submit`].
pub const TEST_DELIVERY_CHARGE: i64 = 100;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Product input with sensible defaults.
///
/// # Defaults
/// * `sku`: `"SKU-<name>"`
/// * `stock_quantity`: 10
/// * `same_price_for_all_variants`: false
pub fn new_product(name: &str, unit_price: Decimal) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        sku: format!("SKU-{name}"),
        unit_price,
        stock_quantity: 10,
        same_price_for_all_variants: false,
    }
}

/// Variant input with custom parameters.
pub fn new_variant(color: &str, size: &str, stock_quantity: u32, unit_price: Option<Decimal>) -> NewVariant {
    NewVariant {
        color: color.to_string(),
        size: size.to_string(),
        stock_quantity,
        unit_price,
    }
}

/// Creates a product (stock 10) with two variants:
/// * Red / M, stock 3, price 450
/// * Blue / L, stock 2, price 520
///
/// With `uniform` set, both variants take the base price instead.
pub async fn create_product_with_variants(
    db: &DatabaseConnection,
    name: &str,
    unit_price: Decimal,
    uniform: bool,
) -> Result<(entities::product::Model, Vec<entities::product_variant::Model>)> {
    let mut input = new_product(name, unit_price);
    input.same_price_for_all_variants = uniform;
    let created = product::create_product(db, input).await?;

    let red = product::add_variant(
        db,
        created.id,
        new_variant("Red", "M", 3, Some(Decimal::from(450))),
    )
    .await?;
    let blue = product::add_variant(
        db,
        created.id,
        new_variant("Blue", "L", 2, Some(Decimal::from(520))),
    )
    .await?;
    Ok((created, vec![red, blue]))
}

/// A complete customer in the "Inside City" zone.
pub fn sample_customer() -> CustomerInfo {
    CustomerInfo {
        name: "Rahim Uddin".to_string(),
        phone: "01700000000".to_string(),
        address: "House 4, Road 2, Dhanmondi".to_string(),
        shipping_zone: Some("Inside City".to_string()),
        note: None,
    }
}

/// A single "Inside City" zone charging [`TEST_DELIVERY_CHARGE`].
pub fn sample_zones() -> ShippingZones {
    ShippingZones::from_config(&[ShippingZoneConfig {
        name: "Inside City".to_string(),
        delivery_charge: Decimal::from(TEST_DELIVERY_CHARGE),
    }])
    .unwrap_or_default()
}

/// Prices `items` with the default delivery charge and wraps them into a submission
/// for [`sample_customer`].
pub fn submit(items: Vec<LineItem>) -> Result<OrderSubmission> {
    let mut transaction = Transaction::new();
    transaction.recompute(&items)?;
    transaction.apply(
        AdjustmentKind::DeliveryCharge,
        Decimal::from(TEST_DELIVERY_CHARGE),
    )?;
    Ok(OrderSubmission {
        customer: sample_customer(),
        items,
        totals: transaction.finalize()?,
    })
}
