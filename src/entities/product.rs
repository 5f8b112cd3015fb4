//! Product entity - A catalog item that can be added to orders.
//!
//! A product has a base price and stock. When it has variants, the variant's own
//! price and stock apply to order lines instead. With `same_price_for_all_variants`
//! set, every variant price follows the base price.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Cotton Shirt")
    pub name: String,
    /// Stock keeping unit
    pub sku: String,
    /// Base price per unit in minor units
    pub unit_price_minor: i64,
    /// Units in stock for the base product
    pub stock_quantity: i64,
    /// When true, variant prices are kept equal to the base price
    pub same_price_for_all_variants: bool,
    /// Soft delete flag - if true, product is hidden but order history is preserved
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTime,
    /// When the product was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A product has any number of color/size variants
    #[sea_orm(has_many = "super::product_variant::Entity")]
    Variants,
}

impl Related<super::product_variant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
