//! Checkout receipts.
//!
//! A receipt is produced once at checkout and handed back to the caller. It
//! is never persisted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::Cart;
use super::id::{ProductId, TransactionId};
use super::money::round_to_cents;

/// Status label stamped on every receipt. No payment is taken.
pub const RECEIPT_STATUS: &str = "Purchase Completed (Mock)";

/// A purchased line, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub qty: u32,
}

/// Summary returned to the shopper after checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_id: TransactionId,
    pub customer_name: String,
    pub customer_email: String,
    pub items_purchased: Vec<ReceiptLine>,
    /// Cart total rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub final_total: Decimal,
    pub timestamp: DateTime<Utc>,
    pub status: String,
}

impl Receipt {
    /// Build a receipt from the current cart contents.
    #[must_use]
    pub fn for_cart(
        cart: &Cart,
        customer_name: String,
        customer_email: String,
        transaction_id: TransactionId,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let items_purchased = cart
            .items
            .iter()
            .map(|item| ReceiptLine {
                id: item.product.id,
                name: item.product.name.clone(),
                price: item.product.price,
                qty: item.qty,
            })
            .collect();

        Self {
            transaction_id,
            customer_name,
            customer_email,
            items_purchased,
            final_total: round_to_cents(cart.total()),
            timestamp,
            status: RECEIPT_STATUS.to_string(),
        }
    }
}
