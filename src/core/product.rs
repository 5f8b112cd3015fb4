//! Product catalog business logic.
//!
//! Products carry a base price and stock; variants carry their own. The
//! "same price for all variants" toggle makes the base price authoritative: while it
//! is on, every base price change is copied to the variants and variant prices
//! cannot be edited on their own. Propagation only ever runs base → variants.

use crate::{
    config::settings::ProductSeed,
    core::{
        money::{from_minor_units, to_minor_units},
        pricing::{LineItem, ValidationError, Variant},
    },
    entities::{Product, ProductVariant, product, product_variant},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use tracing::{info, instrument};

/// A product together with its variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductWithVariants {
    pub product: product::Model,
    pub variants: Vec<product_variant::Model>,
}

impl ProductWithVariants {
    /// Looks up one of this product's variants by id.
    #[must_use]
    pub fn variant(&self, variant_id: i64) -> Option<&product_variant::Model> {
        self.variants.iter().find(|variant| variant.id == variant_id)
    }
}

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub stock_quantity: u32,
    pub same_price_for_all_variants: bool,
}

/// Input for adding a variant. With uniform pricing on, `unit_price` is ignored.
#[derive(Debug, Clone)]
pub struct NewVariant {
    pub color: String,
    pub size: String,
    pub stock_quantity: u32,
    pub unit_price: Option<Decimal>,
}

/// Builds a pricing line item for a product, with the given variant selected.
///
/// # Errors
/// - `VariantNotFound` if `variant_id` does not belong to the product
/// - `IntConversion` if stored stock is negative or too large
pub fn line_item_for(
    product: &ProductWithVariants,
    variant_id: Option<i64>,
    quantity: u32,
    line_discount: Decimal,
) -> Result<LineItem> {
    let mut item = LineItem::new(
        product.product.name.clone(),
        from_minor_units(product.product.unit_price_minor),
        u32::try_from(product.product.stock_quantity)?,
        quantity,
    )
    .with_discount(line_discount);
    item.product_id = Some(product.product.id);

    if let Some(variant_id) = variant_id {
        let variant = product.variant(variant_id).ok_or(Error::VariantNotFound {
            product_id: product.product.id,
            variant_id,
        })?;
        item = item.with_variant(Some(variant_id), variant_to_pricing(variant)?);
    }

    Ok(item)
}

/// Converts a stored variant into the pricing engine's representation.
///
/// # Errors
/// Returns `IntConversion` if the stored stock does not fit a `u32`.
pub fn variant_to_pricing(variant: &product_variant::Model) -> Result<Variant> {
    Ok(Variant {
        color: variant.color.clone(),
        size: variant.size.clone(),
        stock_quantity: u32::try_from(variant.stock_quantity)?,
        unit_price: from_minor_units(variant.unit_price_minor),
    })
}

fn check_price(price: Decimal) -> Result<i64> {
    if price < Decimal::ZERO {
        return Err(ValidationError::InvalidPrice { price }.into());
    }
    to_minor_units(price)
}

fn product_not_found(product_id: i64) -> Error {
    Error::ProductNotFound {
        name: product_id.to_string(),
    }
}

/// Retrieves all active (non-deleted) products, ordered alphabetically by name.
pub async fn get_all_active_products<C>(db: &C) -> Result<Vec<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id, deleted or not.
pub async fn get_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds an active product by exact name.
pub async fn get_product_by_name<C>(db: &C, name: &str) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find()
        .filter(product::Column::Name.eq(name))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Variants of a product, ordered by color then size.
pub async fn get_variants<C>(db: &C, product_id: i64) -> Result<Vec<product_variant::Model>>
where
    C: ConnectionTrait,
{
    ProductVariant::find()
        .filter(product_variant::Column::ProductId.eq(product_id))
        .order_by_asc(product_variant::Column::Color)
        .order_by_asc(product_variant::Column::Size)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads an active product with all of its variants.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist or is deleted.
pub async fn get_product_with_variants<C>(db: &C, product_id: i64) -> Result<ProductWithVariants>
where
    C: ConnectionTrait,
{
    let product = get_product_by_id(db, product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| product_not_found(product_id))?;
    let variants = get_variants(db, product_id).await?;
    Ok(ProductWithVariants { product, variants })
}

/// Searches active products whose name or SKU contains `query`, with their variants.
///
/// An empty query returns no results rather than the whole catalog.
#[instrument(skip(db))]
pub async fn search_products<C>(db: &C, query: &str) -> Result<Vec<ProductWithVariants>>
where
    C: ConnectionTrait,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let products = Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .filter(
            Condition::any()
                .add(product::Column::Name.contains(query))
                .add(product::Column::Sku.contains(query)),
        )
        .order_by_asc(product::Column::Name)
        .all(db)
        .await?;

    let mut results = Vec::with_capacity(products.len());
    for product in products {
        let variants = get_variants(db, product.id).await?;
        results.push(ProductWithVariants { product, variants });
    }
    tracing::debug!(count = results.len(), "Product search finished");
    Ok(results)
}

/// Creates a new product after validating name and price.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative
/// - The database insert operation fails
pub async fn create_product<C>(db: &C, input: NewProduct) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    if input.name.trim().is_empty() {
        return Err(Error::Config {
            message: "Product name cannot be empty".to_string(),
        });
    }
    let unit_price_minor = check_price(input.unit_price)?;
    let now = chrono::Utc::now().naive_utc();

    let product = product::ActiveModel {
        name: Set(input.name.trim().to_string()),
        sku: Set(input.sku.trim().to_string()),
        unit_price_minor: Set(unit_price_minor),
        stock_quantity: Set(i64::from(input.stock_quantity)),
        same_price_for_all_variants: Set(input.same_price_for_all_variants),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Adds a color/size variant to a product.
///
/// When the product uses one price for all variants, the variant gets the base
/// price; otherwise its own price is required.
///
/// # Errors
/// - `ProductNotFound` if the product does not exist or is deleted
/// - `Config` if color/size are empty or no price is given for an independently priced variant
/// - `InvalidPrice` for a negative price
pub async fn add_variant<C>(
    db: &C,
    product_id: i64,
    input: NewVariant,
) -> Result<product_variant::Model>
where
    C: ConnectionTrait,
{
    if input.color.trim().is_empty() || input.size.trim().is_empty() {
        return Err(Error::Config {
            message: "Variant color and size cannot be empty".to_string(),
        });
    }

    let product = get_product_by_id(db, product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| product_not_found(product_id))?;

    let unit_price_minor = if product.same_price_for_all_variants {
        product.unit_price_minor
    } else {
        let price = input.unit_price.ok_or_else(|| Error::Config {
            message: "Variant price is required when variants are priced individually"
                .to_string(),
        })?;
        check_price(price)?
    };

    let variant = product_variant::ActiveModel {
        product_id: Set(product_id),
        color: Set(input.color.trim().to_string()),
        size: Set(input.size.trim().to_string()),
        stock_quantity: Set(i64::from(input.stock_quantity)),
        unit_price_minor: Set(unit_price_minor),
        updated_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    };
    variant.insert(db).await.map_err(Into::into)
}

/// Changes the base price of a product, copying it to all variants when the
/// product uses one price for all variants.
///
/// # Errors
/// - `InvalidPrice` for a negative price
/// - `ProductNotFound` if the product does not exist or is deleted
#[instrument(skip(db))]
pub async fn update_unit_price(
    db: &DatabaseConnection,
    product_id: i64,
    new_price: Decimal,
) -> Result<ProductWithVariants> {
    let price_minor = check_price(new_price)?;
    let txn = db.begin().await?;

    let product = get_product_by_id(&txn, product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| product_not_found(product_id))?;
    let uniform = product.same_price_for_all_variants;

    let mut active: product::ActiveModel = product.into();
    active.unit_price_minor = Set(price_minor);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(&txn).await?;

    if uniform {
        let updated = propagate_base_price(&txn, product_id, price_minor).await?;
        info!(product_id, updated, "Base price propagated to variants");
    }

    let result = get_product_with_variants(&txn, product_id).await?;
    txn.commit().await?;
    Ok(result)
}

/// Changes the price of a single variant.
///
/// # Errors
/// - `VariantPriceLocked` if the product uses one price for all variants
/// - `VariantNotFound` / `ProductNotFound` for unknown ids
/// - `InvalidPrice` for a negative price
pub async fn set_variant_price<C>(
    db: &C,
    product_id: i64,
    variant_id: i64,
    new_price: Decimal,
) -> Result<product_variant::Model>
where
    C: ConnectionTrait,
{
    let price_minor = check_price(new_price)?;
    let product = get_product_with_variants(db, product_id).await?;
    if product.product.same_price_for_all_variants {
        return Err(Error::VariantPriceLocked { product_id });
    }

    let variant = product
        .variant(variant_id)
        .cloned()
        .ok_or(Error::VariantNotFound {
            product_id,
            variant_id,
        })?;
    let mut active: product_variant::ActiveModel = variant.into();
    active.unit_price_minor = Set(price_minor);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Turns the "same price for all variants" toggle on or off.
///
/// Turning it on immediately copies the base price to every variant. Turning it
/// off keeps the current variant prices, which then become editable.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist or is deleted.
#[instrument(skip(db))]
pub async fn set_same_price_for_all_variants(
    db: &DatabaseConnection,
    product_id: i64,
    enabled: bool,
) -> Result<ProductWithVariants> {
    let txn = db.begin().await?;

    let product = get_product_by_id(&txn, product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| product_not_found(product_id))?;
    let base_price_minor = product.unit_price_minor;

    let mut active: product::ActiveModel = product.into();
    active.same_price_for_all_variants = Set(enabled);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(&txn).await?;

    if enabled {
        propagate_base_price(&txn, product_id, base_price_minor).await?;
    }

    let result = get_product_with_variants(&txn, product_id).await?;
    txn.commit().await?;
    Ok(result)
}

/// Copies the base price to every variant of the product. This is the only place
/// variant prices follow the base price.
async fn propagate_base_price<C>(db: &C, product_id: i64, price_minor: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    let result = ProductVariant::update_many()
        .col_expr(
            product_variant::Column::UnitPriceMinor,
            Expr::value(price_minor),
        )
        .col_expr(
            product_variant::Column::UpdatedAt,
            Expr::value(chrono::Utc::now().naive_utc()),
        )
        .filter(product_variant::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Adds `delta` to the stock of a product or, when `variant_id` is set, of that variant.
///
/// Used by the order store to reserve (negative delta) and release (positive delta)
/// stock. Stock never goes below zero.
///
/// # Errors
/// - `InvalidQuantity` if the reservation exceeds the available stock
/// - `ProductNotFound` / `VariantNotFound` for unknown ids
pub async fn adjust_stock<C>(
    db: &C,
    product_id: i64,
    variant_id: Option<i64>,
    delta: i64,
) -> Result<i64>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now().naive_utc();
    if let Some(variant_id) = variant_id {
        let variant = ProductVariant::find_by_id(variant_id)
            .one(db)
            .await?
            .filter(|v| v.product_id == product_id)
            .ok_or(Error::VariantNotFound {
                product_id,
                variant_id,
            })?;
        let new_stock = checked_stock(variant.stock_quantity, delta)?;
        let mut active: product_variant::ActiveModel = variant.into();
        active.stock_quantity = Set(new_stock);
        active.updated_at = Set(now);
        active.update(db).await?;
        Ok(new_stock)
    } else {
        let product = get_product_by_id(db, product_id)
            .await?
            .ok_or_else(|| product_not_found(product_id))?;
        let new_stock = checked_stock(product.stock_quantity, delta)?;
        let mut active: product::ActiveModel = product.into();
        active.stock_quantity = Set(new_stock);
        active.updated_at = Set(now);
        active.update(db).await?;
        Ok(new_stock)
    }
}

fn checked_stock(current: i64, delta: i64) -> Result<i64> {
    let new_stock = current + delta;
    if new_stock < 0 {
        return Err(ValidationError::InvalidQuantity {
            requested: u32::try_from(-delta).unwrap_or(u32::MAX),
            available: u32::try_from(current.max(0)).unwrap_or(u32::MAX),
        }
        .into());
    }
    Ok(new_stock)
}

/// Soft deletes a product, preserving order history.
///
/// # Errors
/// Returns `ProductNotFound` if the product does not exist or is already deleted.
pub async fn delete_product<C>(db: &C, product_id: i64) -> Result<product::Model>
where
    C: ConnectionTrait,
{
    let product = get_product_by_id(db, product_id)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| product_not_found(product_id))?;

    let mut active: product::ActiveModel = product.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(chrono::Utc::now().naive_utc());
    active.update(db).await.map_err(Into::into)
}

/// Inserts configured products that are not in the catalog yet.
///
/// Products are matched by name; existing ones are left untouched. Returns the
/// number of products created.
pub async fn seed_catalog<C>(db: &C, seeds: &[ProductSeed]) -> Result<usize>
where
    C: ConnectionTrait,
{
    let mut created = 0;
    for seed in seeds {
        if get_product_by_name(db, seed.name.trim()).await?.is_some() {
            continue;
        }

        let product = create_product(
            db,
            NewProduct {
                name: seed.name.clone(),
                sku: seed.sku.clone(),
                unit_price: seed.unit_price,
                stock_quantity: seed.stock_quantity,
                same_price_for_all_variants: seed.same_price_for_all_variants,
            },
        )
        .await?;

        for variant in &seed.variants {
            add_variant(
                db,
                product.id,
                NewVariant {
                    color: variant.color.clone(),
                    size: variant.size.clone(),
                    stock_quantity: variant.stock_quantity,
                    unit_price: variant.unit_price.or(Some(seed.unit_price)),
                },
            )
            .await?;
        }
        created += 1;
    }

    if created > 0 {
        info!("Seeded {created} products into the catalog");
    }
    Ok(created)
}
