//! Order pricing and transaction reconciliation.
//!
//! Every screen that shows order totals (order creation, order edit, quantity edit)
//! derives them through this module. There is exactly one formula for the remaining
//! balance, [`compute_remaining`], and it never returns a negative amount.
//!
//! Line-level rules:
//! - a selected variant supplies the unit price and the stock ceiling, the base
//!   product's values are ignored;
//! - the quantity is at least 1 and at most the resolved stock;
//! - the line discount is between zero and `unit_price * quantity`.
//!
//! Order-level rules:
//! - `0 <= discount <= subtotal`
//! - `0 <= delivery_charge`
//! - `0 <= paid <= subtotal + delivery_charge - discount`

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures reported back to the caller for inline display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Quantity is zero or exceeds the stock of the product/variant.
    #[error("Quantity {requested} is not available (in stock: {available})")]
    InvalidQuantity { requested: u32, available: u32 },

    /// A line or order discount is negative or larger than the amount it applies to.
    #[error("Discount {discount} must be between 0 and {limit}")]
    InvalidDiscount { discount: Decimal, limit: Decimal },

    /// Delivery charge is negative.
    #[error("Delivery charge {amount} cannot be negative")]
    InvalidDeliveryCharge { amount: Decimal },

    /// Paid amount is negative or larger than the grand total.
    #[error("Paid amount {paid} must be between 0 and {limit}")]
    InvalidPaidAmount { paid: Decimal, limit: Decimal },

    /// Unit price is negative.
    #[error("Unit price {price} cannot be negative")]
    InvalidPrice { price: Decimal },

    /// An amount grew past what a `Decimal` can hold.
    #[error("Amount is too large to calculate")]
    AmountOverflow,
}

/// A color/size combination of a product with its own price and stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub color: String,
    pub size: String,
    pub stock_quantity: u32,
    pub unit_price: Decimal,
}

/// One product (optionally a specific variant) and its quantity within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog product this line was built from, if any
    pub product_id: Option<i64>,
    /// Catalog variant id of the selected variant, if any
    pub variant_id: Option<i64>,
    /// Display name of the product
    pub name: String,
    /// Base product unit price
    pub unit_price: Decimal,
    /// Base product stock
    pub stock_quantity: u32,
    /// Selected quantity
    pub quantity: u32,
    /// Selected variant; overrides price and stock of the base product
    pub variant: Option<Variant>,
    /// Discount on this line as an absolute amount
    pub line_discount: Decimal,
}

impl LineItem {
    /// Creates a line item for a product without variant and without discount.
    pub fn new(name: impl Into<String>, unit_price: Decimal, stock_quantity: u32, quantity: u32) -> Self {
        Self {
            product_id: None,
            variant_id: None,
            name: name.into(),
            unit_price,
            stock_quantity,
            quantity,
            variant: None,
            line_discount: Decimal::ZERO,
        }
    }

    #[must_use]
    pub fn with_variant(mut self, variant_id: Option<i64>, variant: Variant) -> Self {
        self.variant_id = variant_id;
        self.variant = Some(variant);
        self
    }

    #[must_use]
    pub fn with_discount(mut self, line_discount: Decimal) -> Self {
        self.line_discount = line_discount;
        self
    }

    /// Unit price actually charged: the variant's when one is selected.
    #[must_use]
    pub fn resolved_unit_price(&self) -> Decimal {
        self.variant
            .as_ref()
            .map_or(self.unit_price, |variant| variant.unit_price)
    }

    /// Stock ceiling for the quantity: the variant's when one is selected.
    #[must_use]
    pub fn stock_ceiling(&self) -> u32 {
        self.variant
            .as_ref()
            .map_or(self.stock_quantity, |variant| variant.stock_quantity)
    }
}

/// Computes `resolved_unit_price * quantity - line_discount` for a line item.
///
/// # Errors
/// - `InvalidQuantity` if the quantity is zero or exceeds the resolved stock
/// - `InvalidPrice` if the resolved unit price is negative
/// - `InvalidDiscount` if the line discount is negative or exceeds the line amount
/// - `AmountOverflow` if `unit_price * quantity` is not representable
pub fn compute_line_total(item: &LineItem) -> Result<Decimal, ValidationError> {
    let available = item.stock_ceiling();
    if item.quantity == 0 || item.quantity > available {
        return Err(ValidationError::InvalidQuantity {
            requested: item.quantity,
            available,
        });
    }

    let unit_price = item.resolved_unit_price();
    if unit_price.is_sign_negative() && !unit_price.is_zero() {
        return Err(ValidationError::InvalidPrice { price: unit_price });
    }

    let gross = unit_price
        .checked_mul(Decimal::from(item.quantity))
        .ok_or(ValidationError::AmountOverflow)?;
    if item.line_discount < Decimal::ZERO || item.line_discount > gross {
        return Err(ValidationError::InvalidDiscount {
            discount: item.line_discount,
            limit: gross,
        });
    }

    Ok(gross - item.line_discount)
}

/// Sums the line totals of all items. An empty list yields zero.
///
/// # Errors
/// Propagates the first line-level failure from [`compute_line_total`], or
/// `AmountOverflow` if the sum is not representable.
pub fn compute_subtotal(items: &[LineItem]) -> Result<Decimal, ValidationError> {
    items.iter().try_fold(Decimal::ZERO, |sum, item| {
        sum.checked_add(compute_line_total(item)?)
            .ok_or(ValidationError::AmountOverflow)
    })
}

/// `subtotal + delivery_charge - discount`.
///
/// # Errors
/// Returns `AmountOverflow` if the result is not representable.
pub fn grand_total(
    subtotal: Decimal,
    delivery_charge: Decimal,
    discount: Decimal,
) -> Result<Decimal, ValidationError> {
    subtotal
        .checked_add(delivery_charge)
        .and_then(|sum| sum.checked_sub(discount))
        .ok_or(ValidationError::AmountOverflow)
}

/// Balance still due: `max(subtotal + delivery_charge - discount - paid, 0)`.
///
/// Overpayment is clamped to zero here; it is rejected earlier by
/// [`validate_adjustment`] with [`AdjustmentKind::Paid`].
///
/// # Errors
/// Returns `AmountOverflow` if an intermediate amount is not representable.
pub fn compute_remaining(
    subtotal: Decimal,
    delivery_charge: Decimal,
    discount: Decimal,
    paid: Decimal,
) -> Result<Decimal, ValidationError> {
    grand_total(subtotal, delivery_charge, discount)?
        .checked_sub(paid)
        .map(|due| due.max(Decimal::ZERO))
        .ok_or(ValidationError::AmountOverflow)
}

/// The order-level fields a user can edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Discount,
    DeliveryCharge,
    Paid,
}

/// Checks a proposed value for one adjustment field against the current totals.
///
/// `paid` is the currently recorded payment; no bound depends on it, it is accepted
/// so every call site passes the same full set of totals.
///
/// # Errors
/// - `InvalidDiscount` if a discount is negative or exceeds the subtotal
/// - `InvalidDeliveryCharge` if a delivery charge is negative
/// - `InvalidPaidAmount` if a payment is negative or exceeds the grand total
/// - `AmountOverflow` if the resulting grand total is not representable
pub fn validate_adjustment(
    kind: AdjustmentKind,
    value: Decimal,
    subtotal: Decimal,
    delivery_charge: Decimal,
    discount: Decimal,
    _paid: Decimal,
) -> Result<(), ValidationError> {
    match kind {
        AdjustmentKind::Discount => {
            if value < Decimal::ZERO || value > subtotal {
                return Err(ValidationError::InvalidDiscount {
                    discount: value,
                    limit: subtotal,
                });
            }
            grand_total(subtotal, delivery_charge, value)?;
        }
        AdjustmentKind::DeliveryCharge => {
            if value < Decimal::ZERO {
                return Err(ValidationError::InvalidDeliveryCharge { amount: value });
            }
            grand_total(subtotal, value, discount)?;
        }
        AdjustmentKind::Paid => {
            let limit = grand_total(subtotal, delivery_charge, discount)?;
            if value < Decimal::ZERO || value > limit {
                return Err(ValidationError::InvalidPaidAmount { paid: value, limit });
            }
        }
    }
    Ok(())
}

/// Running financial summary of an order being created or edited.
///
/// `remaining` and `grand_total` are always derived; there is no way to set them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    subtotal: Decimal,
    discount: Decimal,
    delivery_charge: Decimal,
    paid: Decimal,
}

impl Transaction {
    /// A zeroed transaction, as at the start of an order-creation flow.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a transaction from the totals stored with an existing order.
    #[must_use]
    pub const fn from_stored(
        subtotal: Decimal,
        delivery_charge: Decimal,
        discount: Decimal,
        paid: Decimal,
    ) -> Self {
        Self {
            subtotal,
            discount,
            delivery_charge,
            paid,
        }
    }

    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    #[must_use]
    pub const fn delivery_charge(&self) -> Decimal {
        self.delivery_charge
    }

    #[must_use]
    pub const fn paid(&self) -> Decimal {
        self.paid
    }

    /// # Errors
    /// Returns `AmountOverflow` if the total is not representable.
    pub fn grand_total(&self) -> Result<Decimal, ValidationError> {
        grand_total(self.subtotal, self.delivery_charge, self.discount)
    }

    /// # Errors
    /// Returns `AmountOverflow` if the balance is not representable.
    pub fn remaining(&self) -> Result<Decimal, ValidationError> {
        compute_remaining(self.subtotal, self.delivery_charge, self.discount, self.paid)
    }

    /// Re-derives the subtotal from the current line items.
    ///
    /// # Errors
    /// Returns the line-level failure; the transaction is left untouched.
    pub fn recompute(&mut self, items: &[LineItem]) -> Result<Decimal, ValidationError> {
        self.subtotal = compute_subtotal(items)?;
        Ok(self.subtotal)
    }

    /// Validates and applies a new value for one adjustment field.
    ///
    /// # Errors
    /// Returns the validation failure; nothing is changed in that case.
    pub fn apply(&mut self, kind: AdjustmentKind, value: Decimal) -> Result<(), ValidationError> {
        validate_adjustment(
            kind,
            value,
            self.subtotal,
            self.delivery_charge,
            self.discount,
            self.paid,
        )?;
        match kind {
            AdjustmentKind::Discount => self.discount = value,
            AdjustmentKind::DeliveryCharge => self.delivery_charge = value,
            AdjustmentKind::Paid => self.paid = value,
        }
        Ok(())
    }

    /// Checks every bound at once.
    ///
    /// Field edits are validated one at a time, so a later change (fewer items, a
    /// bigger discount) can leave an earlier value out of range; this catches that
    /// before the order moves on.
    ///
    /// # Errors
    /// Returns the first violated bound, checking discount, delivery charge, then paid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (kind, value) in [
            (AdjustmentKind::Discount, self.discount),
            (AdjustmentKind::DeliveryCharge, self.delivery_charge),
            (AdjustmentKind::Paid, self.paid),
        ] {
            validate_adjustment(
                kind,
                value,
                self.subtotal,
                self.delivery_charge,
                self.discount,
                self.paid,
            )?;
        }
        Ok(())
    }

    /// Freezes the transaction once all bounds hold.
    ///
    /// # Errors
    /// Returns the first violated bound from [`Transaction::validate`].
    pub fn finalize(self) -> Result<FinalTotals, ValidationError> {
        self.validate()?;
        Ok(FinalTotals {
            subtotal: self.subtotal,
            discount: self.discount,
            delivery_charge: self.delivery_charge,
            paid: self.paid,
            grand_total: self.grand_total()?,
            remaining: self.remaining()?,
        })
    }
}

/// Read-only totals of a submitted order.
///
/// Only [`Transaction::finalize`] produces these, so every set of totals has passed
/// the order-level bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinalTotals {
    subtotal: Decimal,
    discount: Decimal,
    delivery_charge: Decimal,
    paid: Decimal,
    grand_total: Decimal,
    remaining: Decimal,
}

impl FinalTotals {
    #[must_use]
    pub const fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    #[must_use]
    pub const fn discount(&self) -> Decimal {
        self.discount
    }

    #[must_use]
    pub const fn delivery_charge(&self) -> Decimal {
        self.delivery_charge
    }

    #[must_use]
    pub const fn paid(&self) -> Decimal {
        self.paid
    }

    #[must_use]
    pub const fn grand_total(&self) -> Decimal {
        self.grand_total
    }

    #[must_use]
    pub const fn remaining(&self) -> Decimal {
        self.remaining
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use rust_decimal_macros::dec;

    fn item(unit_price: Decimal, quantity: u32) -> LineItem {
        LineItem::new("Shirt", unit_price, 10, quantity)
    }

    #[test]
    fn test_line_total_without_variant() {
        let line = item(dec!(500), 2).with_discount(dec!(50));
        assert_eq!(compute_line_total(&line).unwrap(), dec!(950));
    }

    #[test]
    fn test_variant_price_and_stock_take_precedence() {
        let variant = Variant {
            color: "Red".to_string(),
            size: "M".to_string(),
            stock_quantity: 3,
            unit_price: dec!(450),
        };
        let line = item(dec!(500), 3).with_variant(Some(7), variant);
        assert_eq!(compute_line_total(&line).unwrap(), dec!(1350));

        // Base stock is 10 but the variant only has 3
        let mut too_many = line.clone();
        too_many.quantity = 4;
        assert_eq!(
            compute_line_total(&too_many).unwrap_err(),
            ValidationError::InvalidQuantity {
                requested: 4,
                available: 3
            }
        );
    }

    #[test]
    fn test_line_quantity_bounds() {
        let zero = item(dec!(100), 0);
        assert!(matches!(
            compute_line_total(&zero).unwrap_err(),
            ValidationError::InvalidQuantity { requested: 0, .. }
        ));

        let over = item(dec!(100), 11);
        assert!(matches!(
            compute_line_total(&over).unwrap_err(),
            ValidationError::InvalidQuantity {
                requested: 11,
                available: 10
            }
        ));

        let exact = item(dec!(100), 10);
        assert_eq!(compute_line_total(&exact).unwrap(), dec!(1000));
    }

    #[test]
    fn test_line_discount_bounds() {
        let full = item(dec!(100), 2).with_discount(dec!(200));
        assert_eq!(compute_line_total(&full).unwrap(), Decimal::ZERO);

        let over = item(dec!(100), 2).with_discount(dec!(200.01));
        assert_eq!(
            compute_line_total(&over).unwrap_err(),
            ValidationError::InvalidDiscount {
                discount: dec!(200.01),
                limit: dec!(200)
            }
        );

        let negative = item(dec!(100), 2).with_discount(dec!(-1));
        assert!(matches!(
            compute_line_total(&negative).unwrap_err(),
            ValidationError::InvalidDiscount { .. }
        ));
    }

    #[test]
    fn test_negative_price_rejected() {
        let line = item(dec!(-5), 1);
        assert_eq!(
            compute_line_total(&line).unwrap_err(),
            ValidationError::InvalidPrice { price: dec!(-5) }
        );
    }

    #[test]
    fn test_subtotal_is_sum_of_line_totals() {
        assert_eq!(compute_subtotal(&[]).unwrap(), Decimal::ZERO);

        let items = vec![
            item(dec!(500), 2),
            item(dec!(120.50), 1).with_discount(dec!(20.50)),
            item(dec!(9.99), 3),
        ];
        let expected: Decimal = items.iter().map(|i| compute_line_total(i).unwrap()).sum();
        assert_eq!(compute_subtotal(&items).unwrap(), expected);
        assert_eq!(expected, dec!(1129.97));

        // Recomputing does not alter the input
        let before = items.clone();
        assert_eq!(compute_subtotal(&items).unwrap(), expected);
        assert_eq!(items, before);
    }

    #[test]
    fn test_subtotal_propagates_line_failure() {
        let items = vec![item(dec!(500), 2), item(dec!(100), 50)];
        assert!(matches!(
            compute_subtotal(&items).unwrap_err(),
            ValidationError::InvalidQuantity { requested: 50, .. }
        ));
    }

    #[test]
    fn test_remaining_scenarios() {
        // delivery 100, no discount, nothing paid
        assert_eq!(
            compute_remaining(dec!(1000), dec!(100), Decimal::ZERO, Decimal::ZERO).unwrap(),
            dec!(1100)
        );
        // discount 100, paid 500
        assert_eq!(
            compute_remaining(dec!(1000), dec!(100), dec!(100), dec!(500)).unwrap(),
            dec!(500)
        );
        // overpayment clamps to zero
        assert_eq!(
            compute_remaining(dec!(1000), dec!(100), Decimal::ZERO, dec!(1500)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_remaining_never_negative_within_bounds() {
        let subtotals = [dec!(0), dec!(1), dec!(99.99), dec!(1000)];
        let deliveries = [dec!(0), dec!(60), dec!(120)];
        for subtotal in subtotals {
            for delivery in deliveries {
                for discount in [Decimal::ZERO, subtotal / dec!(2), subtotal] {
                    let total = grand_total(subtotal, delivery, discount).unwrap();
                    for paid in [Decimal::ZERO, total / dec!(3), total] {
                        let remaining =
                            compute_remaining(subtotal, delivery, discount, paid).unwrap();
                        assert!(remaining >= Decimal::ZERO);
                        assert_eq!(remaining, total - paid);
                    }
                }
            }
        }
    }

    #[test]
    fn test_validate_adjustment() {
        let ok = |kind, value| {
            validate_adjustment(kind, value, dec!(1000), dec!(100), Decimal::ZERO, Decimal::ZERO)
        };

        assert!(ok(AdjustmentKind::Discount, dec!(1000)).is_ok());
        assert_eq!(
            ok(AdjustmentKind::Discount, dec!(1200)).unwrap_err(),
            ValidationError::InvalidDiscount {
                discount: dec!(1200),
                limit: dec!(1000)
            }
        );
        assert!(ok(AdjustmentKind::Discount, dec!(-1)).is_err());

        assert!(ok(AdjustmentKind::DeliveryCharge, dec!(0)).is_ok());
        assert_eq!(
            ok(AdjustmentKind::DeliveryCharge, dec!(-10)).unwrap_err(),
            ValidationError::InvalidDeliveryCharge { amount: dec!(-10) }
        );

        assert!(ok(AdjustmentKind::Paid, dec!(1100)).is_ok());
        assert_eq!(
            ok(AdjustmentKind::Paid, dec!(1500)).unwrap_err(),
            ValidationError::InvalidPaidAmount {
                paid: dec!(1500),
                limit: dec!(1100)
            }
        );
        assert!(ok(AdjustmentKind::Paid, dec!(-0.01)).is_err());
    }

    #[test]
    fn test_transaction_lifecycle() {
        let mut transaction = Transaction::new();
        assert_eq!(transaction.remaining().unwrap(), Decimal::ZERO);

        transaction.recompute(&[item(dec!(500), 2)]).unwrap();
        transaction
            .apply(AdjustmentKind::DeliveryCharge, dec!(100))
            .unwrap();
        assert_eq!(transaction.subtotal(), dec!(1000));
        assert_eq!(transaction.remaining().unwrap(), dec!(1100));

        transaction.apply(AdjustmentKind::Discount, dec!(100)).unwrap();
        transaction.apply(AdjustmentKind::Paid, dec!(500)).unwrap();
        assert_eq!(transaction.grand_total().unwrap(), dec!(1000));
        assert_eq!(transaction.remaining().unwrap(), dec!(500));

        let totals = transaction.finalize().unwrap();
        assert_eq!(totals.grand_total(), dec!(1000));
        assert_eq!(totals.remaining(), dec!(500));
    }

    #[test]
    fn test_rejected_adjustment_is_not_applied() {
        let mut transaction = Transaction::new();
        transaction.recompute(&[item(dec!(500), 2)]).unwrap();
        transaction
            .apply(AdjustmentKind::DeliveryCharge, dec!(100))
            .unwrap();
        let before = transaction;

        assert!(transaction.apply(AdjustmentKind::Paid, dec!(1500)).is_err());
        assert!(transaction.apply(AdjustmentKind::Discount, dec!(1200)).is_err());
        assert_eq!(transaction, before);

        // A failing recompute keeps the old subtotal
        assert!(transaction.recompute(&[item(dec!(500), 20)]).is_err());
        assert_eq!(transaction, before);
    }

    #[test]
    fn test_validate_catches_stale_values() {
        let mut transaction = Transaction::new();
        transaction.recompute(&[item(dec!(500), 2)]).unwrap();
        transaction.apply(AdjustmentKind::Paid, dec!(1000)).unwrap();
        assert!(transaction.validate().is_ok());

        // Removing an item shrinks the grand total below what was paid
        transaction.recompute(&[item(dec!(500), 1)]).unwrap();
        assert_eq!(transaction.remaining().unwrap(), Decimal::ZERO);
        assert!(matches!(
            transaction.validate().unwrap_err(),
            ValidationError::InvalidPaidAmount { .. }
        ));
        assert!(transaction.finalize().is_err());
    }

    #[test]
    fn test_from_stored_rederives_remaining() {
        let transaction =
            Transaction::from_stored(dec!(1000), dec!(100), dec!(100), dec!(500));
        assert_eq!(transaction.remaining().unwrap(), dec!(500));
        assert_eq!(transaction.grand_total().unwrap(), dec!(1000));
    }

    #[test]
    fn test_oversized_amounts_report_overflow() {
        let gold = LineItem::new("Gold", Decimal::MAX, 10, 2);
        assert_eq!(
            compute_line_total(&gold).unwrap_err(),
            ValidationError::AmountOverflow
        );

        let half = Decimal::MAX / dec!(2) + Decimal::ONE;
        let items = vec![item(half, 1), item(half, 1)];
        assert_eq!(
            compute_subtotal(&items).unwrap_err(),
            ValidationError::AmountOverflow
        );

        assert_eq!(
            compute_remaining(Decimal::MAX, Decimal::ONE, Decimal::ZERO, Decimal::ZERO)
                .unwrap_err(),
            ValidationError::AmountOverflow
        );

        let mut transaction = Transaction::new();
        transaction.recompute(&[item(Decimal::MAX, 1)]).unwrap();
        assert_eq!(
            transaction
                .apply(AdjustmentKind::DeliveryCharge, Decimal::ONE)
                .unwrap_err(),
            ValidationError::AmountOverflow
        );
        assert_eq!(transaction.delivery_charge(), Decimal::ZERO);
    }
}
