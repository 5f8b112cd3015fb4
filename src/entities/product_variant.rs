//! Product variant entity - A color/size combination with its own price and stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product variant database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Product this variant belongs to
    pub product_id: i64,
    pub color: String,
    pub size: String,
    /// Units in stock for this variant
    pub stock_quantity: i64,
    /// Price per unit in minor units
    pub unit_price_minor: i64,
    pub updated_at: DateTime,
}

/// Defines relationships between ProductVariant and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each variant belongs to one product
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
