//! Draft orders and the order-creation wizard.
//!
//! A [`DraftOrder`] is the whole order-in-progress as one serializable value: line
//! items, customer details, the running [`Transaction`] and the wizard step. It is
//! passed from step to step instead of each screen holding its own copy of the
//! totals.
//!
//! The wizard is linear:
//!
//! ```text
//! SelectingProducts -> EnteringCustomerInfo -> ReviewingOrder -> Submitting -> Succeeded
//!                                                                           \-> Failed
//! ```
//!
//! `back()` only returns to the immediately preceding step. A failed submission goes
//! back to `ReviewingOrder` so the user can submit again.

use crate::{
    core::{
        pricing::{AdjustmentKind, FinalTotals, LineItem, Transaction, Variant, compute_line_total},
        shipping::ShippingZones,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Steps of the order-creation wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    SelectingProducts,
    EnteringCustomerInfo,
    ReviewingOrder,
    Submitting,
    Succeeded,
    Failed,
}

impl WizardStep {
    /// Step reached by going forward, if any. Leaving `Submitting` depends on the outcome.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::SelectingProducts => Some(Self::EnteringCustomerInfo),
            Self::EnteringCustomerInfo => Some(Self::ReviewingOrder),
            Self::ReviewingOrder => Some(Self::Submitting),
            Self::Submitting | Self::Succeeded | Self::Failed => None,
        }
    }

    /// Step reached by going back, if allowed.
    #[must_use]
    pub const fn previous(self) -> Option<Self> {
        match self {
            Self::EnteringCustomerInfo => Some(Self::SelectingProducts),
            Self::ReviewingOrder => Some(Self::EnteringCustomerInfo),
            Self::Failed => Some(Self::ReviewingOrder),
            Self::SelectingProducts | Self::Submitting | Self::Succeeded => None,
        }
    }

    const fn allows_item_edits(self) -> bool {
        matches!(self, Self::SelectingProducts | Self::ReviewingOrder)
    }
}

/// Customer and delivery details entered in the second wizard step.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub shipping_zone: Option<String>,
    pub note: Option<String>,
}

impl CustomerInfo {
    fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            Some("customer name")
        } else if self.phone.trim().is_empty() {
            Some("customer phone")
        } else if self.address.trim().is_empty() {
            Some("delivery address")
        } else {
            None
        }
    }
}

/// Everything the order store needs to persist a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSubmission {
    pub customer: CustomerInfo,
    pub items: Vec<LineItem>,
    pub totals: FinalTotals,
}

/// An order being assembled through the wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftOrder {
    items: Vec<LineItem>,
    customer: Option<CustomerInfo>,
    transaction: Transaction,
    delivery_overridden: bool,
    step: WizardStep,
}

impl Default for DraftOrder {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftOrder {
    /// Starts an empty draft with a zeroed transaction.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            customer: None,
            transaction: Transaction::new(),
            delivery_overridden: false,
            step: WizardStep::SelectingProducts,
        }
    }

    #[must_use]
    pub const fn step(&self) -> WizardStep {
        self.step
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub const fn customer(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    #[must_use]
    pub const fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    #[must_use]
    pub const fn delivery_overridden(&self) -> bool {
        self.delivery_overridden
    }

    /// Adds a line item and recomputes the subtotal.
    ///
    /// # Errors
    /// Fails if items cannot be edited in the current step or the line is invalid.
    pub fn add_item(&mut self, item: LineItem) -> Result<&mut Self> {
        let mut items = self.items.clone();
        items.push(item);
        self.replace_items(items)?;
        Ok(self)
    }

    /// Changes the quantity of the line at `index`.
    ///
    /// # Errors
    /// Fails if the index is out of range, editing is not allowed, or the new
    /// quantity exceeds the stock of the selected product/variant.
    pub fn set_quantity(&mut self, index: usize, quantity: u32) -> Result<&mut Self> {
        self.edit_item(index, |item| item.quantity = quantity)
    }

    /// Selects (or clears) the variant of the line at `index`.
    ///
    /// # Errors
    /// Fails if the index is out of range, editing is not allowed, or the current
    /// quantity exceeds the stock of the newly selected variant.
    pub fn select_variant(
        &mut self,
        index: usize,
        variant: Option<(i64, Variant)>,
    ) -> Result<&mut Self> {
        self.edit_item(index, |item| match variant {
            Some((variant_id, variant)) => {
                item.variant_id = Some(variant_id);
                item.variant = Some(variant);
            }
            None => {
                item.variant_id = None;
                item.variant = None;
            }
        })
    }

    /// Sets the per-line discount of the line at `index`.
    ///
    /// # Errors
    /// Fails if the index is out of range, editing is not allowed, or the discount
    /// is outside `0..=unit_price * quantity`.
    pub fn set_line_discount(&mut self, index: usize, discount: Decimal) -> Result<&mut Self> {
        self.edit_item(index, |item| item.line_discount = discount)
    }

    /// Removes the line at `index`.
    ///
    /// # Errors
    /// Fails if the index is out of range or editing is not allowed.
    pub fn remove_item(&mut self, index: usize) -> Result<LineItem> {
        self.ensure_item_edits()?;
        let mut items = self.items.clone();
        let removed = take_index(&mut items, index)?;
        self.replace_items(items)?;
        Ok(removed)
    }

    /// Stores customer details and pre-fills the delivery charge from the shipping
    /// zone unless the user already entered one by hand.
    ///
    /// # Errors
    /// Fails outside the customer-information step.
    pub fn set_customer(&mut self, info: CustomerInfo, zones: &ShippingZones) -> Result<&mut Self> {
        self.ensure_step(WizardStep::EnteringCustomerInfo)?;

        if !self.delivery_overridden {
            let zone_charge = info
                .shipping_zone
                .as_deref()
                .and_then(|zone| zones.delivery_charge_for(zone));
            if let Some(charge) = zone_charge {
                self.transaction
                    .apply(AdjustmentKind::DeliveryCharge, charge)?;
                tracing::debug!(%charge, "Delivery charge defaulted from shipping zone");
            }
        }

        self.customer = Some(info);
        Ok(self)
    }

    /// Applies a discount, delivery charge or payment through the pricing engine.
    ///
    /// A delivery charge entered here counts as a manual override and is no longer
    /// replaced by the shipping-zone default.
    ///
    /// # Errors
    /// Returns the validation failure; the draft is unchanged in that case.
    pub fn adjust(&mut self, kind: AdjustmentKind, value: Decimal) -> Result<&mut Self> {
        if matches!(
            self.step,
            WizardStep::Submitting | WizardStep::Succeeded
        ) {
            return Err(Error::InvalidTransition {
                from: self.step,
                to: self.step,
            });
        }
        self.transaction.apply(kind, value)?;
        if kind == AdjustmentKind::DeliveryCharge {
            self.delivery_overridden = true;
        }
        Ok(self)
    }

    /// Moves to the next step when the current one is complete.
    ///
    /// Leaving `ReviewingOrder` this way is not possible; use
    /// [`DraftOrder::begin_submission`].
    ///
    /// # Errors
    /// - `InvalidTransition` if there is no next step from here
    /// - `IncompleteDraft` if the current step is incomplete
    /// - a validation error if a line or an adjustment field is out of bounds
    pub fn next(&mut self) -> Result<WizardStep> {
        let to = match self.step.next() {
            Some(step) if step != WizardStep::Submitting => step,
            other => {
                return Err(Error::InvalidTransition {
                    from: self.step,
                    to: other.unwrap_or(self.step),
                });
            }
        };

        self.check_current_step()?;
        tracing::debug!(from = ?self.step, to = ?to, "Draft order advanced");
        self.step = to;
        Ok(to)
    }

    /// Returns to the immediately preceding step.
    ///
    /// # Errors
    /// Returns `InvalidTransition` when going back is not allowed from here.
    pub fn back(&mut self) -> Result<WizardStep> {
        let to = self.step.previous().ok_or(Error::InvalidTransition {
            from: self.step,
            to: self.step,
        })?;
        self.step = to;
        Ok(to)
    }

    /// Finalizes the totals and enters `Submitting`.
    ///
    /// # Errors
    /// Fails outside `ReviewingOrder` or when any part of the draft is invalid.
    pub fn begin_submission(&mut self) -> Result<OrderSubmission> {
        self.ensure_step(WizardStep::ReviewingOrder)?;
        self.check_items()?;
        let customer = self.checked_customer()?.clone();
        let totals = self.transaction.finalize()?;

        self.step = WizardStep::Submitting;
        Ok(OrderSubmission {
            customer,
            items: self.items.clone(),
            totals,
        })
    }

    /// Records the outcome of the order submission.
    ///
    /// # Errors
    /// Returns `InvalidTransition` if no submission is in progress.
    pub fn finish_submission(&mut self, succeeded: bool) -> Result<WizardStep> {
        let to = if succeeded {
            WizardStep::Succeeded
        } else {
            WizardStep::Failed
        };
        if self.step != WizardStep::Submitting {
            return Err(Error::InvalidTransition {
                from: self.step,
                to,
            });
        }
        self.step = to;
        Ok(to)
    }

    fn check_current_step(&self) -> Result<()> {
        self.transaction.validate()?;
        match self.step {
            WizardStep::SelectingProducts => self.check_items(),
            WizardStep::EnteringCustomerInfo => self.checked_customer().map(|_| ()),
            _ => Ok(()),
        }
    }

    fn check_items(&self) -> Result<()> {
        if self.items.is_empty() {
            return Err(Error::IncompleteDraft {
                reason: "no products selected".to_string(),
            });
        }
        for item in &self.items {
            compute_line_total(item)?;
        }
        Ok(())
    }

    fn checked_customer(&self) -> Result<&CustomerInfo> {
        let customer = self.customer.as_ref().ok_or_else(|| Error::IncompleteDraft {
            reason: "customer information missing".to_string(),
        })?;
        if let Some(field) = customer.missing_field() {
            return Err(Error::IncompleteDraft {
                reason: format!("{field} is required"),
            });
        }
        Ok(customer)
    }

    fn edit_item<F>(&mut self, index: usize, edit: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut LineItem),
    {
        self.ensure_item_edits()?;
        let mut items = self.items.clone();
        let item = items.get_mut(index).ok_or_else(|| Error::IncompleteDraft {
            reason: format!("no line item at position {index}"),
        })?;
        edit(item);
        compute_line_total(item)?;
        self.replace_items(items)?;
        Ok(self)
    }

    fn replace_items(&mut self, items: Vec<LineItem>) -> Result<()> {
        self.ensure_item_edits()?;
        self.transaction.recompute(&items)?;
        self.items = items;
        Ok(())
    }

    fn ensure_item_edits(&self) -> Result<()> {
        if self.step.allows_item_edits() {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.step,
                to: WizardStep::SelectingProducts,
            })
        }
    }

    fn ensure_step(&self, expected: WizardStep) -> Result<()> {
        if self.step == expected {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                from: self.step,
                to: expected,
            })
        }
    }
}

fn take_index(items: &mut Vec<LineItem>, index: usize) -> Result<LineItem> {
    if index < items.len() {
        Ok(items.remove(index))
    } else {
        Err(Error::IncompleteDraft {
            reason: format!("no line item at position {index}"),
        })
    }
}
