//! The external system of record for invoices and payments.
//!
//! [`InvoiceBackend`] is the contract the core consumes; transport is up to
//! the implementation. [`InMemoryBackend`] keeps everything in process and
//! `RestBackend` (feature `rest`) talks JSON over HTTP.

mod memory;
#[cfg(feature = "rest")]
mod rest;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{
    InvoiceError, InvoiceRecord, InvoiceSettings, LedgerSnapshot, NewPayment, Payment,
    PaymentUpdate, ValidationError, ValidationRule,
};

pub use memory::InMemoryBackend;
#[cfg(feature = "rest")]
pub use rest::RestBackend;

/// Failure reported by a backend call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// The request was understood but its content is invalid.
    #[error("validation error: {0}")]
    Validation(String),
    /// The request conflicts with current server state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The referenced invoice or payment does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Network, timeout or server failure.
    #[error("transient error: {0}")]
    Transient(String),
}

impl From<BackendError> for InvoiceError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::Validation(msg) => InvoiceError::Validation(vec![
                ValidationError::new(ValidationRule::Backend, "invoice", msg),
            ]),
            BackendError::Conflict(msg) => InvoiceError::Conflict(msg),
            BackendError::NotFound(msg) => InvoiceError::NotFound(msg),
            BackendError::Transient(msg) => InvoiceError::Transient(msg),
        }
    }
}

/// Operations the invoice core needs from the system of record.
#[async_trait]
pub trait InvoiceBackend: Send + Sync {
    /// Whether `number` is already used by another invoice of the tenant.
    async fn invoice_number_exists(&self, number: &str) -> Result<bool, BackendError>;

    /// Persist a new invoice; the response carries the generated id.
    async fn create_invoice(&self, invoice: &InvoiceRecord) -> Result<InvoiceRecord, BackendError>;

    /// Persist changes to an existing invoice.
    async fn update_invoice(
        &self,
        id: &str,
        invoice: &InvoiceRecord,
    ) -> Result<InvoiceRecord, BackendError>;

    /// Deliver the invoice to the customer. `Ok(false)` means the backend
    /// declined without an error.
    async fn send_invoice(&self, id: &str, message: Option<&str>) -> Result<bool, BackendError>;

    async fn list_payments(&self, invoice_id: &str) -> Result<LedgerSnapshot, BackendError>;

    async fn record_payment(
        &self,
        invoice_id: &str,
        payment: &NewPayment,
    ) -> Result<Payment, BackendError>;

    async fn edit_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Payment, BackendError>;

    async fn delete_payment(&self, invoice_id: &str, payment_id: &str)
    -> Result<(), BackendError>;

    /// Settings of the most recently created invoice, used as the first
    /// layer when resolving settings for a new one.
    async fn last_used_settings(&self) -> Result<Option<InvoiceSettings>, BackendError> {
        Ok(None)
    }
}
