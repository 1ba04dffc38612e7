use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::parse_unit_price;

/// A single billable row on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Opaque identifier, generated locally.
    pub id: Uuid,
    /// What is being billed. Required before submission.
    pub description: String,
    /// Number of units. Never below 1 once committed; `0` counts as `1`.
    pub quantity: u32,
    /// Unit price as typed; parsed on every computation.
    pub unit_price: String,
}

impl LineItem {
    /// A fresh row: empty description, quantity 1, no price.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: String::new(),
            quantity: 1,
            unit_price: String::new(),
        }
    }

    /// Quantity used for totals.
    pub fn effective_quantity(&self) -> u32 {
        self.quantity.max(1)
    }

    /// Parsed unit price; malformed or negative text counts as zero.
    pub fn unit_price_value(&self) -> Decimal {
        parse_unit_price(&self.unit_price).unwrap_or(Decimal::ZERO)
    }

    /// `quantity × unit price`.
    pub fn amount(&self) -> Decimal {
        Decimal::from(self.effective_quantity())
            .checked_mul(self.unit_price_value())
            .unwrap_or(Decimal::ZERO)
    }
}

impl Default for LineItem {
    fn default() -> Self {
        Self::new()
    }
}

/// Field-level change to a line item. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPatch {
    pub description: Option<String>,
    pub quantity: Option<u32>,
    pub unit_price: Option<String>,
}

/// Reference to the customer an invoice is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
}

impl CustomerRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Derived invoice totals. Always recomputed from items and settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of all line amounts.
    pub subtotal: Decimal,
    /// Sales tax on the subtotal (zero when disabled).
    pub tax_amount: Decimal,
    /// VAT on the subtotal (zero when disabled).
    pub vat_amount: Decimal,
    /// Fixed discount (zero when disabled).
    pub discount: Decimal,
    /// `subtotal + tax_amount + vat_amount - discount`.
    pub total: Decimal,
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    CreditCard,
    BankTransfer,
    Cash,
    Check,
    Other,
}

impl PaymentMethod {
    /// Wire spelling, e.g. "credit-card".
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditCard => "credit-card",
            Self::BankTransfer => "bank-transfer",
            Self::Cash => "cash",
            Self::Check => "check",
            Self::Other => "other",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "credit-card" => Some(Self::CreditCard),
            "bank-transfer" => Some(Self::BankTransfer),
            "cash" => Some(Self::Cash),
            "check" => Some(Self::Check),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// A recorded payment against an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    /// Identifier assigned by the backend.
    pub id: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub memo: Option<String>,
    /// Invoice balance just before this payment was recorded.
    pub balance_before: Decimal,
    /// Invoice balance just after this payment was recorded (may be negative).
    pub balance_after: Decimal,
    /// `max(0, balance_after)` at recording time.
    pub remaining_balance: Decimal,
}

/// User input for a new payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub memo: Option<String>,
}

impl PaymentDraft {
    pub fn new(amount: Decimal, date: NaiveDate, method: PaymentMethod) -> Self {
        Self {
            amount,
            date,
            method,
            memo: None,
        }
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// A validated payment with its audit snapshot, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub amount: Decimal,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub memo: Option<String>,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
    pub remaining_balance: Decimal,
}

impl NewPayment {
    /// The stored entry once the backend has assigned an id.
    pub fn into_payment(self, id: impl Into<String>) -> Payment {
        Payment {
            id: id.into(),
            amount: self.amount,
            date: self.date,
            method: self.method,
            memo: self.memo,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            remaining_balance: self.remaining_balance,
        }
    }
}

/// Changes to an existing payment. `memo: Some(None)` clears the memo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub amount: Option<Decimal>,
    pub date: Option<NaiveDate>,
    pub method: Option<PaymentMethod>,
    pub memo: Option<Option<String>>,
}

impl PaymentUpdate {
    /// Apply the update to a copy of `payment`. Audit snapshots are kept.
    pub fn apply_to(&self, payment: &Payment) -> Payment {
        let mut updated = payment.clone();
        if let Some(amount) = self.amount {
            updated.amount = amount;
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(method) = self.method {
            updated.method = method;
        }
        if let Some(memo) = &self.memo {
            updated.memo = memo.clone();
        }
        updated
    }
}
