//! Order item entity - One priced line of an order.
//!
//! Name, color, size and prices are copied from the catalog at order time so later
//! catalog edits do not rewrite order history.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order this line belongs to
    pub order_id: i64,
    /// Catalog product, if the line was built from one
    pub product_id: Option<i64>,
    /// Catalog variant, if one was selected
    pub variant_id: Option<i64>,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    /// Charged unit price (the variant's when selected) in minor units
    pub unit_price_minor: i64,
    pub quantity: i64,
    pub line_discount_minor: i64,
    pub line_total_minor: i64,
    /// Position of the line within the order
    pub sort_order: i32,
}

/// Defines relationships between OrderItem and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
