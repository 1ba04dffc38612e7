use thiserror::Error;

use super::lifecycle::{InvoiceStatus, LifecycleEvent};

/// Errors that can occur while editing, submitting or settling an invoice.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InvoiceError {
    /// One or more local validation rules failed. The action did not proceed.
    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    /// The backend rejected the request because of a state mismatch
    /// (e.g. the invoice number was taken after the local check).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The referenced invoice or payment does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network or server failure. In-memory state was left unchanged.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The backend answered but declined the action (e.g. send returned false).
    #[error("rejected: {0}")]
    Rejected(String),

    /// The requested status transition is not legal from the current status.
    #[error("cannot {event} an invoice that is {from}")]
    IllegalTransition {
        from: InvoiceStatus,
        event: LifecycleEvent,
    },

    /// Line items and settings can only change while the invoice is a draft.
    #[error("invoice is {0}; reopen it before editing")]
    ReadOnly(InvoiceStatus),

    /// The action needs an invoice that has been created on the backend.
    #[error("invoice has not been created yet")]
    NotPersisted,

    /// Settings defaults could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl InvoiceError {
    /// Whether retrying the same action may succeed without user changes.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Validation errors carried by this error, if any.
    pub fn validation_errors(&self) -> &[ValidationError] {
        match self {
            Self::Validation(errors) => errors,
            _ => &[],
        }
    }
}

impl From<ValidationError> for InvoiceError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Rule that a [`ValidationError`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationRule {
    /// No customer is attached.
    MissingCustomer,
    /// The invoice has no line items.
    NoLineItems,
    /// A line item has an empty description.
    EmptyDescription,
    /// A unit price is not a parsable number in `0..=MAX_AMOUNT`.
    InvalidUnitPrice,
    /// The invoice number is empty.
    EmptyInvoiceNumber,
    /// The invoice number is already in use.
    InvoiceNumberTaken,
    /// A sales tax or VAT rate lies outside 0..=100.
    RateOutOfRange,
    /// The discount amount is negative.
    NegativeDiscount,
    /// The discount exceeds subtotal plus taxes.
    NegativeTotal,
    /// The due date lies before the issue date.
    DueBeforeIssue,
    /// A payment amount is zero or negative.
    NonPositivePayment,
    /// A payment amount exceeds the largest accepted amount.
    PaymentTooLarge,
    /// The backend reported a validation failure.
    Backend,
}

impl ValidationRule {
    /// Stable identifier for the rule, suitable for UI lookup tables.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCustomer => "missing-customer",
            Self::NoLineItems => "no-line-items",
            Self::EmptyDescription => "empty-description",
            Self::InvalidUnitPrice => "invalid-unit-price",
            Self::EmptyInvoiceNumber => "empty-invoice-number",
            Self::InvoiceNumberTaken => "invoice-number-taken",
            Self::RateOutOfRange => "rate-out-of-range",
            Self::NegativeDiscount => "negative-discount",
            Self::NegativeTotal => "negative-total",
            Self::DueBeforeIssue => "due-before-issue",
            Self::NonPositivePayment => "non-positive-payment",
            Self::PaymentTooLarge => "payment-too-large",
            Self::Backend => "backend",
        }
    }
}

/// A single validation error with field path, message and rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "items[2].unit_price").
    pub field: String,
    /// Human-readable, actionable description.
    pub message: String,
    /// The rule that was violated.
    pub rule: ValidationRule,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule.code(), self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(rule: ValidationRule, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rule,
        }
    }
}
