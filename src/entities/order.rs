//! Order entity - A submitted customer order with its reconciled totals.
//!
//! `remaining_minor` is stored for listing and reporting, but it is always written
//! from the pricing engine and re-derived when an order is loaded for editing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier, also used for the invoice number
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    /// Shipping zone the delivery charge was defaulted from, if any
    pub shipping_zone: Option<String>,
    pub note: Option<String>,
    /// Order status: `"pending"`, `"confirmed"`, `"shipped"`, `"delivered"` or `"cancelled"`
    pub status: String,
    /// Sum of line totals in minor units
    pub subtotal_minor: i64,
    /// Order-level discount in minor units
    pub discount_minor: i64,
    /// Delivery charge in minor units
    pub delivery_charge_minor: i64,
    /// Amount already paid in minor units
    pub paid_minor: i64,
    /// Balance still due in minor units
    pub remaining_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// An order has one or more line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
