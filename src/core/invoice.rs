//! Invoice generation.
//!
//! Builds the document model for a persisted order and lays it out as fixed-width
//! text. Rendering to PDF is left to whatever consumes [`Invoice`]; the totals here
//! always come from the pricing engine so the printed balance matches the order
//! screens.

use crate::{
    core::{
        money::{format_money, from_minor_units},
        order::{OrderWithItems, get_order_with_items, stored_transaction},
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ConnectionTrait;
use std::fmt::Write;

const LINE_WIDTH: usize = 64;

/// One printed line of an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Everything printed on an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub number: String,
    pub issued_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub delivery_charge: Decimal,
    pub grand_total: Decimal,
    pub paid: Decimal,
    pub remaining: Decimal,
    pub currency: String,
}

/// Invoice number for an order id, e.g. `INV-000042`.
#[must_use]
pub fn invoice_number(order_id: i64) -> String {
    format!("INV-{order_id:06}")
}

/// Builds the invoice document from an order and its items.
///
/// # Errors
/// Returns `AmountOverflow` if the stored totals cannot be reconciled.
pub fn invoice_from_order(order: &OrderWithItems, currency: &str) -> Result<Invoice> {
    let transaction = stored_transaction(&order.order);

    let lines = order
        .items
        .iter()
        .map(|item| {
            let variant = match (item.color.as_deref(), item.size.as_deref()) {
                (Some(color), Some(size)) => format!(" ({color} / {size})"),
                _ => String::new(),
            };
            InvoiceLine {
                description: format!("{}{variant}", item.name),
                quantity: item.quantity,
                unit_price: from_minor_units(item.unit_price_minor),
                discount: from_minor_units(item.line_discount_minor),
                total: from_minor_units(item.line_total_minor),
            }
        })
        .collect();

    Ok(Invoice {
        number: invoice_number(order.order.id),
        issued_at: order.order.created_at,
        customer_name: order.order.customer_name.clone(),
        customer_phone: order.order.customer_phone.clone(),
        customer_address: order.order.customer_address.clone(),
        lines,
        subtotal: transaction.subtotal(),
        discount: transaction.discount(),
        delivery_charge: transaction.delivery_charge(),
        grand_total: transaction.grand_total()?,
        paid: transaction.paid(),
        remaining: transaction.remaining()?,
        currency: currency.to_string(),
    })
}

/// Loads an order and builds its invoice.
///
/// # Errors
/// Returns `OrderNotFound` if there is no such order.
pub async fn build_invoice<C>(db: &C, order_id: i64, currency: &str) -> Result<Invoice>
where
    C: ConnectionTrait,
{
    let order = get_order_with_items(db, order_id).await?;
    invoice_from_order(&order, currency)
}

/// Lays the invoice out as fixed-width plain text.
///
/// # Errors
/// Returns `Fmt` if writing a line fails.
pub fn render_text(invoice: &Invoice) -> Result<String> {
    let money = |amount: Decimal| format_money(amount, &invoice.currency);
    let rule = "-".repeat(LINE_WIDTH);
    let mut out = String::new();

    writeln!(out, "INVOICE {}", invoice.number)?;
    writeln!(out, "Date: {}", invoice.issued_at.format("%Y-%m-%d"))?;
    writeln!(out, "Bill to: {}", invoice.customer_name)?;
    writeln!(out, "         {}", invoice.customer_phone)?;
    writeln!(out, "         {}", invoice.customer_address)?;
    writeln!(out, "{rule}")?;
    writeln!(out, "{:<28}{:>6}{:>15}{:>15}", "Item", "Qty", "Unit", "Total")?;
    writeln!(out, "{rule}")?;

    for line in &invoice.lines {
        writeln!(
            out,
            "{:<28}{:>6}{:>15}{:>15}",
            truncate(&line.description, 27),
            line.quantity,
            money(line.unit_price),
            money(line.total)
        )?;
        if !line.discount.is_zero() {
            writeln!(out, "{:<34}{:>30}", "  line discount", format!("-{}", money(line.discount)))?;
        }
    }

    writeln!(out, "{rule}")?;
    for (label, amount) in [
        ("Subtotal", money(invoice.subtotal)),
        ("Delivery charge", money(invoice.delivery_charge)),
        ("Discount", format!("-{}", money(invoice.discount))),
        ("Grand total", money(invoice.grand_total)),
        ("Paid", money(invoice.paid)),
        ("Due", money(invoice.remaining)),
    ] {
        writeln!(out, "{label:<34}{amount:>30}")?;
    }

    Ok(out)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}
