//! Order store - persists submitted orders and reloads them for editing.
//!
//! Creating or updating an order touches three things at once: the order row with
//! its reconciled totals, its line items, and catalog stock. Each operation runs in
//! one database transaction so a failure (typically stock that ran out since the
//! draft was priced) leaves nothing half-written.

use crate::{
    core::{
        draft::{CustomerInfo, OrderSubmission},
        money::{from_minor_units, to_minor_units},
        pricing::{FinalTotals, LineItem, Transaction, Variant, compute_line_total},
        product::{adjust_stock, get_product_by_id, get_variants, variant_to_pricing},
    },
    entities::{Order, OrderItem, order, order_item},
    errors::{Error, Result},
};
use sea_orm::{Condition, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{info, instrument, warn};

/// Lifecycle status of a persisted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the order still holds its stock reservation and may be edited.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(Error::UnknownStatus {
                status: other.to_string(),
            }),
        }
    }
}

/// An order with its line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderWithItems {
    pub order: order::Model,
    pub items: Vec<order_item::Model>,
}

/// A persisted order rebuilt into pricing values for editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditableOrder {
    pub order: order::Model,
    pub items: Vec<LineItem>,
    pub transaction: Transaction,
}

/// One page of the order list.
#[derive(Debug, Clone)]
pub struct OrderPage {
    pub orders: Vec<order::Model>,
    /// Zero-based page index
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// Reads the stored totals of an order back into a transaction.
#[must_use]
pub fn stored_transaction(order: &order::Model) -> Transaction {
    Transaction::from_stored(
        from_minor_units(order.subtotal_minor),
        from_minor_units(order.delivery_charge_minor),
        from_minor_units(order.discount_minor),
        from_minor_units(order.paid_minor),
    )
}

fn order_not_found(id: i64) -> Error {
    Error::OrderNotFound { id }
}

/// Persists a submitted order, reserving stock for every line.
///
/// The subtotal is recomputed from the submitted items and the adjustment fields
/// are checked against it again, so the stored totals always match the lines.
///
/// # Errors
/// - validation errors if the items or adjustment fields are out of bounds
/// - `InvalidQuantity` if stock for a product or variant ran out since the draft was priced
/// - `ProductNotFound` / `VariantNotFound` if a catalog entry disappeared
/// - `Database` for storage failures; nothing is written in any error case
#[instrument(skip(db, submission), fields(customer = %submission.customer.name))]
pub async fn create_order(
    db: &DatabaseConnection,
    submission: &OrderSubmission,
) -> Result<OrderWithItems> {
    let submitted = &submission.totals;
    let totals = reconcile(
        &submission.items,
        Transaction::from_stored(
            submitted.subtotal(),
            submitted.delivery_charge(),
            submitted.discount(),
            submitted.paid(),
        ),
    )?;

    let txn = db.begin().await?;
    let now = chrono::Utc::now();

    let mut active = order::ActiveModel {
        status: Set(OrderStatus::Pending.as_str().to_string()),
        created_at: Set(now),
        ..Default::default()
    };
    fill_customer(&mut active, &submission.customer);
    fill_totals(&mut active, &totals)?;
    active.updated_at = Set(now);
    let order = active.insert(&txn).await?;

    reserve_stock(&txn, &submission.items).await?;
    let items = insert_items(&txn, order.id, &submission.items).await?;

    txn.commit().await?;
    info!(order_id = order.id, lines = items.len(), "Order created");
    Ok(OrderWithItems { order, items })
}

/// Retrieves an order by id.
pub async fn get_order_by_id<C>(db: &C, order_id: i64) -> Result<Option<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find_by_id(order_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Line items of an order in insertion order.
pub async fn get_order_items<C>(db: &C, order_id: i64) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::SortOrder)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Loads an order with its items.
///
/// # Errors
/// Returns `OrderNotFound` if there is no such order.
pub async fn get_order_with_items<C>(db: &C, order_id: i64) -> Result<OrderWithItems>
where
    C: ConnectionTrait,
{
    let order = get_order_by_id(db, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    let items = get_order_items(db, order_id).await?;
    Ok(OrderWithItems { order, items })
}

/// Rebuilds an order into line items and a transaction for the edit panel.
///
/// Stock ceilings include the quantity this order already holds, so the user can
/// keep (or lower) the ordered quantity even when the shelf is now empty. Lines
/// whose product was removed from the catalog keep exactly their ordered quantity.
///
/// # Errors
/// Returns `OrderNotFound` if there is no such order.
pub async fn load_order_for_edit<C>(db: &C, order_id: i64) -> Result<EditableOrder>
where
    C: ConnectionTrait,
{
    let OrderWithItems { order, items } = get_order_with_items(db, order_id).await?;

    let mut line_items = Vec::with_capacity(items.len());
    for stored in &items {
        line_items.push(rebuild_line_item(db, stored).await?);
    }

    let transaction = stored_transaction(&order);
    Ok(EditableOrder {
        order,
        items: line_items,
        transaction,
    })
}

async fn rebuild_line_item<C>(db: &C, stored: &order_item::Model) -> Result<LineItem>
where
    C: ConnectionTrait,
{
    let held = u32::try_from(stored.quantity)?;
    let unit_price = from_minor_units(stored.unit_price_minor);
    let mut item = LineItem::new(stored.name.clone(), unit_price, held, held)
        .with_discount(from_minor_units(stored.line_discount_minor));
    item.product_id = stored.product_id;

    let Some(product_id) = stored.product_id else {
        return Ok(item);
    };
    let Some(product) = get_product_by_id(db, product_id).await? else {
        warn!(product_id, "Ordered product no longer exists");
        return Ok(item);
    };

    item.stock_quantity = u32::try_from(product.stock_quantity)?.saturating_add(held);

    if let Some(variant_id) = stored.variant_id {
        let variants = get_variants(db, product_id).await?;
        if let Some(stored_variant) = variants.iter().find(|v| v.id == variant_id) {
            let mut variant = variant_to_pricing(stored_variant)?;
            variant.stock_quantity = variant.stock_quantity.saturating_add(held);
            // The price the customer was charged stays, catalog changes do not reprice the order
            variant.unit_price = unit_price;
            item = item.with_variant(Some(variant_id), variant);
        } else {
            warn!(product_id, variant_id, "Ordered variant no longer exists");
            item.variant_id = Some(variant_id);
            item.variant = Some(Variant {
                color: stored.color.clone().unwrap_or_default(),
                size: stored.size.clone().unwrap_or_default(),
                stock_quantity: held,
                unit_price,
            });
        }
    }

    Ok(item)
}

/// Replaces the items and totals of an open order.
///
/// The old stock reservation is released and the new one taken in the same
/// database transaction. The subtotal is recomputed from `items`; the adjustment
/// fields come from `transaction` and must still be within bounds.
///
/// # Errors
/// - `OrderNotFound` if there is no such order
/// - `Config` if the order is no longer open
/// - validation errors from the pricing engine or stock reservation
#[instrument(skip(db, items, transaction))]
pub async fn update_order(
    db: &DatabaseConnection,
    order_id: i64,
    items: &[LineItem],
    transaction: &Transaction,
) -> Result<OrderWithItems> {
    let totals = reconcile(items, *transaction)?;

    let txn = db.begin().await?;
    let existing = get_order_by_id(&txn, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    ensure_open(&existing)?;

    let old_items = get_order_items(&txn, order_id).await?;
    release_stock(&txn, &old_items).await?;
    OrderItem::delete_many()
        .filter(order_item::Column::OrderId.eq(order_id))
        .exec(&txn)
        .await?;

    reserve_stock(&txn, items).await?;
    let new_items = insert_items(&txn, order_id, items).await?;

    let mut active: order::ActiveModel = existing.into();
    fill_totals(&mut active, &totals)?;
    active.updated_at = Set(chrono::Utc::now());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    info!(order_id, lines = new_items.len(), "Order updated");
    Ok(OrderWithItems {
        order,
        items: new_items,
    })
}

/// Changes the status of an order.
///
/// Cancelling an open order returns its stock. A shipped order no longer holds a
/// reservation, so cancelling it leaves the catalog stock alone.
///
/// # Errors
/// - `OrderNotFound` if there is no such order
/// - `Config` if the order is already cancelled or delivered
#[instrument(skip(db))]
pub async fn update_order_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let existing = get_order_by_id(&txn, order_id)
        .await?
        .ok_or_else(|| order_not_found(order_id))?;
    let current: OrderStatus = existing.status.parse()?;

    if matches!(current, OrderStatus::Cancelled | OrderStatus::Delivered) {
        return Err(Error::Config {
            message: format!("Order {order_id} is {current} and can no longer change"),
        });
    }

    if status == OrderStatus::Cancelled && current.is_open() {
        let items = get_order_items(&txn, order_id).await?;
        release_stock(&txn, &items).await?;
    }

    let mut active: order::ActiveModel = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(chrono::Utc::now());
    let order = active.update(&txn).await?;

    txn.commit().await?;
    info!(order_id, from = %current, to = %status, "Order status changed");
    Ok(order)
}

/// Lists orders newest first, one zero-based page at a time.
///
/// # Errors
/// Returns `Config` if `per_page` is zero.
pub async fn list_orders<C>(db: &C, page: u64, per_page: u64) -> Result<OrderPage>
where
    C: ConnectionTrait,
{
    if per_page == 0 {
        return Err(Error::Config {
            message: "Page size must be at least 1".to_string(),
        });
    }

    let paginator = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .paginate(db, per_page);
    let counts = paginator.num_items_and_pages().await?;
    let orders = paginator.fetch_page(page).await?;

    Ok(OrderPage {
        orders,
        page,
        per_page,
        total_items: counts.number_of_items,
        total_pages: counts.number_of_pages,
    })
}

/// Searches orders by customer name or phone (substring), or by exact order id
/// when the query is a number. Newest first.
#[instrument(skip(db))]
pub async fn search_orders<C>(db: &C, query: &str) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let mut condition = Condition::any()
        .add(order::Column::CustomerName.contains(query))
        .add(order::Column::CustomerPhone.contains(query));
    if let Ok(id) = query.trim_start_matches('#').parse::<i64>() {
        condition = condition.add(order::Column::Id.eq(id));
    }

    Order::find()
        .filter(condition)
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

fn ensure_open(order: &order::Model) -> Result<()> {
    let status: OrderStatus = order.status.parse()?;
    if status.is_open() {
        Ok(())
    } else {
        Err(Error::Config {
            message: format!("Order {} is {status} and cannot be edited", order.id),
        })
    }
}

/// Derives the subtotal from `items` and freezes the totals once every bound holds.
fn reconcile(items: &[LineItem], mut transaction: Transaction) -> Result<FinalTotals> {
    transaction.recompute(items)?;
    Ok(transaction.finalize()?)
}

fn fill_customer(active: &mut order::ActiveModel, customer: &CustomerInfo) {
    active.customer_name = Set(customer.name.trim().to_string());
    active.customer_phone = Set(customer.phone.trim().to_string());
    active.customer_address = Set(customer.address.trim().to_string());
    active.shipping_zone = Set(customer.shipping_zone.clone());
    active.note = Set(customer.note.clone());
}

fn fill_totals(active: &mut order::ActiveModel, totals: &FinalTotals) -> Result<()> {
    active.subtotal_minor = Set(to_minor_units(totals.subtotal())?);
    active.discount_minor = Set(to_minor_units(totals.discount())?);
    active.delivery_charge_minor = Set(to_minor_units(totals.delivery_charge())?);
    active.paid_minor = Set(to_minor_units(totals.paid())?);
    active.remaining_minor = Set(to_minor_units(totals.remaining())?);
    Ok(())
}

async fn reserve_stock<C>(db: &C, items: &[LineItem]) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in items {
        if let Some(product_id) = item.product_id {
            adjust_stock(db, product_id, item.variant_id, -i64::from(item.quantity)).await?;
        }
    }
    Ok(())
}

async fn release_stock<C>(db: &C, items: &[order_item::Model]) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in items {
        let Some(product_id) = item.product_id else {
            continue;
        };
        match adjust_stock(db, product_id, item.variant_id, item.quantity).await {
            Ok(_) => {}
            Err(Error::ProductNotFound { .. } | Error::VariantNotFound { .. }) => {
                warn!(product_id, "Cannot return stock to a removed catalog entry");
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

async fn insert_items<C>(
    db: &C,
    order_id: i64,
    items: &[LineItem],
) -> Result<Vec<order_item::Model>>
where
    C: ConnectionTrait,
{
    let mut inserted = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let line_total = compute_line_total(item)?;
        let active = order_item::ActiveModel {
            order_id: Set(order_id),
            product_id: Set(item.product_id),
            variant_id: Set(item.variant_id),
            name: Set(item.name.clone()),
            color: Set(item.variant.as_ref().map(|v| v.color.clone())),
            size: Set(item.variant.as_ref().map(|v| v.size.clone())),
            unit_price_minor: Set(to_minor_units(item.resolved_unit_price())?),
            quantity: Set(i64::from(item.quantity)),
            line_discount_minor: Set(to_minor_units(item.line_discount)?),
            line_total_minor: Set(to_minor_units(line_total)?),
            sort_order: Set(i32::try_from(position)?),
            ..Default::default()
        };
        inserted.push(active.insert(db).await?);
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            draft::DraftOrder,
            pricing::{AdjustmentKind, ValidationError},
            product::{get_product_with_variants, line_item_for},
        },
        test_utils::*,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_order_reserves_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variants) =
            create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let red = variants[0].id;

        let catalog = get_product_with_variants(&db, product.id).await?;
        let submission = submit(vec![
            line_item_for(&catalog, None, 2, Decimal::ZERO)?,
            line_item_for(&catalog, Some(red), 3, Decimal::ZERO)?,
        ])?;
        let created = create_order(&db, &submission).await?;

        assert_eq!(created.order.status, "pending");
        assert_eq!(created.order.subtotal_minor, 235_000);
        assert_eq!(created.order.delivery_charge_minor, 10_000);
        assert_eq!(created.order.remaining_minor, 245_000);
        assert_eq!(created.items.len(), 2);
        assert_eq!(created.items[1].unit_price_minor, 45_000);
        assert_eq!(created.items[1].color.as_deref(), Some("Red"));

        let catalog = get_product_with_variants(&db, product.id).await?;
        assert_eq!(catalog.product.stock_quantity, 8);
        assert_eq!(catalog.variant(red).unwrap().stock_quantity, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_is_atomic_when_stock_ran_out() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variants) =
            create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let red = variants[0].id;
        let catalog = get_product_with_variants(&db, product.id).await?;
        let submission = submit(vec![
            line_item_for(&catalog, None, 1, Decimal::ZERO)?,
            line_item_for(&catalog, Some(red), 3, Decimal::ZERO)?,
        ])?;

        // Someone else bought the red shirts after the draft was priced
        adjust_stock(&db, product.id, Some(red), -2).await?;

        let result = create_order(&db, &submission).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation(ValidationError::InvalidQuantity { .. })
        ));

        let catalog = get_product_with_variants(&db, product.id).await?;
        assert_eq!(catalog.product.stock_quantity, 10);
        assert_eq!(list_orders(&db, 0, 10).await?.total_items, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_order_for_edit() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variants) =
            create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let red = variants[0].id;
        let catalog = get_product_with_variants(&db, product.id).await?;
        let created = create_order(
            &db,
            &submit(vec![line_item_for(&catalog, Some(red), 3, dec!(50))?])?,
        )
        .await?;

        // Catalog price changes do not reprice the existing order
        crate::core::product::set_variant_price(&db, product.id, red, dec!(999)).await?;

        let editable = load_order_for_edit(&db, created.order.id).await?;
        assert_eq!(editable.items.len(), 1);
        let line = &editable.items[0];
        assert_eq!(line.variant_id, Some(red));
        assert_eq!(line.resolved_unit_price(), dec!(450));
        // Shelf is empty but the order already holds 3
        assert_eq!(line.stock_ceiling(), 3);
        assert_eq!(compute_line_total(line)?, dec!(1300));
        assert_eq!(editable.transaction.subtotal(), dec!(1300));
        assert_eq!(editable.transaction.remaining()?, dec!(1400));

        let result = load_order_for_edit(&db, 999).await;
        assert!(matches!(result.unwrap_err(), Error::OrderNotFound { id: 999 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_order_rebalances_stock_and_totals() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, variants) =
            create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let red = variants[0].id;
        let catalog = get_product_with_variants(&db, product.id).await?;
        let created = create_order(
            &db,
            &submit(vec![line_item_for(&catalog, Some(red), 2, Decimal::ZERO)?])?,
        )
        .await?;

        let mut editable = load_order_for_edit(&db, created.order.id).await?;
        editable.items[0].quantity = 3;
        editable
            .transaction
            .apply(AdjustmentKind::Paid, dec!(400))?;

        let updated =
            update_order(&db, created.order.id, &editable.items, &editable.transaction).await?;
        assert_eq!(updated.order.subtotal_minor, 135_000);
        assert_eq!(updated.order.paid_minor, 40_000);
        assert_eq!(updated.order.remaining_minor, 105_000);
        assert_eq!(updated.items.len(), 1);
        assert_eq!(updated.items[0].quantity, 3);

        let catalog = get_product_with_variants(&db, product.id).await?;
        assert_eq!(catalog.variant(red).unwrap().stock_quantity, 0);

        // Asking for more than stock plus the held quantity fails and changes nothing
        editable.items[0].quantity = 4;
        assert!(update_order(&db, created.order.id, &editable.items, &editable.transaction)
            .await
            .is_err());
        let stored = get_order_with_items(&db, created.order.id).await?;
        assert_eq!(stored.items[0].quantity, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_returns_stock_and_locks_order() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, _) = create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let catalog = get_product_with_variants(&db, product.id).await?;
        let created = create_order(
            &db,
            &submit(vec![line_item_for(&catalog, None, 4, Decimal::ZERO)?])?,
        )
        .await?;

        let cancelled = update_order_status(&db, created.order.id, OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, "cancelled");
        let catalog = get_product_with_variants(&db, product.id).await?;
        assert_eq!(catalog.product.stock_quantity, 10);

        let editable = load_order_for_edit(&db, created.order.id).await?;
        let result =
            update_order(&db, created.order.id, &editable.items, &editable.transaction).await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
        let result = update_order_status(&db, created.order.id, OrderStatus::Shipped).await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_after_shipping_keeps_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, _) = create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let catalog = get_product_with_variants(&db, product.id).await?;
        let created = create_order(
            &db,
            &submit(vec![line_item_for(&catalog, None, 4, Decimal::ZERO)?])?,
        )
        .await?;

        update_order_status(&db, created.order.id, OrderStatus::Shipped).await?;
        let cancelled = update_order_status(&db, created.order.id, OrderStatus::Cancelled).await?;
        assert_eq!(cancelled.status, "cancelled");

        // The goods left with the courier; nothing returns to the shelf
        let catalog = get_product_with_variants(&db, product.id).await?;
        assert_eq!(catalog.product.stock_quantity, 6);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_recomputes_totals_from_items() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, _) = create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let catalog = get_product_with_variants(&db, product.id).await?;

        // Totals priced for one shirt, items swapped for two afterwards
        let mut submission = submit(vec![line_item_for(&catalog, None, 1, Decimal::ZERO)?])?;
        submission.items = vec![line_item_for(&catalog, None, 2, Decimal::ZERO)?];
        let created = create_order(&db, &submission).await?;
        assert_eq!(created.order.subtotal_minor, 100_000);
        assert_eq!(created.order.delivery_charge_minor, 10_000);
        assert_eq!(created.order.remaining_minor, 110_000);

        // Paid for two shirts, then one removed: the payment exceeds the new total
        let mut transaction = Transaction::new();
        transaction.recompute(&[line_item_for(&catalog, None, 2, Decimal::ZERO)?])?;
        transaction.apply(AdjustmentKind::Paid, dec!(1000))?;
        let mut overpaid = submit(vec![line_item_for(&catalog, None, 2, Decimal::ZERO)?])?;
        overpaid.totals = transaction.finalize()?;
        overpaid.items = vec![line_item_for(&catalog, None, 1, Decimal::ZERO)?];

        let result = create_order(&db, &overpaid).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation(ValidationError::InvalidPaidAmount { .. })
        ));
        assert_eq!(list_orders(&db, 0, 10).await?.total_items, 1);
        assert_eq!(get_product_with_variants(&db, product.id).await?.product.stock_quantity, 8);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_search_orders() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, _) = create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let catalog = get_product_with_variants(&db, product.id).await?;

        let mut ids = Vec::new();
        for (name, phone) in [
            ("Rahim Uddin", "01711111111"),
            ("Karim Mia", "01822222222"),
            ("Rahima Begum", "01933333333"),
        ] {
            let mut submission = submit(vec![line_item_for(&catalog, None, 1, Decimal::ZERO)?])?;
            submission.customer.name = name.to_string();
            submission.customer.phone = phone.to_string();
            ids.push(create_order(&db, &submission).await?.order.id);
        }

        let first = list_orders(&db, 0, 2).await?;
        assert_eq!(first.total_items, 3);
        assert_eq!(first.total_pages, 2);
        assert_eq!(first.orders.len(), 2);
        assert_eq!(first.orders[0].id, ids[2]);
        let second = list_orders(&db, 1, 2).await?;
        assert_eq!(second.orders.len(), 1);
        assert_eq!(second.orders[0].id, ids[0]);
        assert!(list_orders(&db, 0, 0).await.is_err());

        assert_eq!(search_orders(&db, "Rahim").await?.len(), 2);
        assert_eq!(search_orders(&db, "0182").await?.len(), 1);
        let by_id = search_orders(&db, &format!("#{}", ids[1])).await?;
        assert!(by_id.iter().any(|o| o.id == ids[1]));
        assert!(search_orders(&db, "").await?.is_empty());
        Ok(())
    }

    #[test]
    fn test_order_status_parsing() {
        assert_eq!("shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
        assert!(!OrderStatus::Delivered.is_open());
        assert!(matches!(
            "lost".parse::<OrderStatus>().unwrap_err(),
            Error::UnknownStatus { .. }
        ));
    }

    #[tokio::test]
    async fn test_wizard_submission_end_to_end() -> Result<()> {
        let db = setup_test_db().await?;
        let (product, _) = create_product_with_variants(&db, "Shirt", dec!(500), false).await?;
        let catalog = get_product_with_variants(&db, product.id).await?;

        let mut draft = DraftOrder::new();
        draft.add_item(line_item_for(&catalog, None, 2, Decimal::ZERO)?)?;
        draft.next()?;
        draft.set_customer(sample_customer(), &sample_zones())?;
        draft.next()?;
        draft.adjust(AdjustmentKind::Discount, dec!(100))?;
        draft.adjust(AdjustmentKind::Paid, dec!(500))?;

        let submission = draft.begin_submission()?;
        let outcome = create_order(&db, &submission).await;
        draft.finish_submission(outcome.is_ok())?;
        let created = outcome?;

        assert_eq!(created.order.remaining_minor, 50_000);
        assert_eq!(stored_transaction(&created.order).remaining()?, dec!(500));
        Ok(())
    }
}
