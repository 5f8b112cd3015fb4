//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Monetary columns hold integer minor units; see `core::money`.

pub mod order;
pub mod order_item;
pub mod product;
pub mod product_variant;

// Re-export specific types to avoid conflicts
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel};
pub use order_item::{Column as OrderItemColumn, Entity as OrderItem, Model as OrderItemModel};
pub use product::{Column as ProductColumn, Entity as Product, Model as ProductModel};
pub use product_variant::{
    Column as ProductVariantColumn, Entity as ProductVariant, Model as ProductVariantModel,
};
