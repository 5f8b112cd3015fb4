//! Core business logic - framework-agnostic pricing, draft orders, catalog and order storage.

pub mod draft;
pub mod invoice;
pub mod money;
pub mod order;
pub mod pricing;
pub mod product;
pub mod search;
pub mod shipping;
