use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::{BackendError, InvoiceBackend};
use crate::core::{
    InvoiceRecord, InvoiceSettings, InvoiceStatus, LedgerSnapshot, NewPayment, Payment,
    PaymentLedger, PaymentUpdate,
};

/// In-process backend holding invoices and payments in a map.
///
/// Behaves like a well-formed server: enforces invoice-number uniqueness,
/// assigns ids and timestamps, and rejects non-positive payment amounts.
/// Failures can be injected with [`InMemoryBackend::fail_next`].
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    invoices: HashMap<String, InvoiceRecord>,
    payments: HashMap<String, Vec<Payment>>,
    sent: Vec<(String, Option<String>)>,
    last_settings: Option<InvoiceSettings>,
    failures: VecDeque<BackendError>,
    decline_sends: usize,
    next_id: u64,
}

impl State {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }

    fn number_taken(&self, number: &str, except_id: Option<&str>) -> bool {
        self.invoices
            .values()
            .any(|inv| inv.invoice_number == number && inv.id.as_deref() != except_id)
    }

    fn invoice(&self, id: &str) -> Result<&InvoiceRecord, BackendError> {
        self.invoices
            .get(id)
            .ok_or_else(|| BackendError::NotFound(format!("invoice {id}")))
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`. Calls queue up in order.
    pub fn fail_next(&self, error: BackendError) {
        self.lock().failures.push_back(error);
    }

    /// Make the next send answer `Ok(false)`.
    pub fn decline_next_send(&self) {
        self.lock().decline_sends += 1;
    }

    /// Store an invoice directly, e.g. to occupy an invoice number.
    pub fn insert_invoice(&self, mut record: InvoiceRecord) -> String {
        let mut state = self.lock();
        let id = match record.id.clone() {
            Some(id) => id,
            None => state.next_id("inv"),
        };
        record.id = Some(id.clone());
        state.invoices.insert(id.clone(), record);
        id
    }

    pub fn set_last_used_settings(&self, settings: InvoiceSettings) {
        self.lock().last_settings = Some(settings);
    }

    pub fn invoice(&self, id: &str) -> Option<InvoiceRecord> {
        self.lock().invoices.get(id).cloned()
    }

    pub fn payments(&self, invoice_id: &str) -> Vec<Payment> {
        self.lock()
            .payments
            .get(invoice_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Invoice ids and messages of every successful send, in order.
    pub fn sent(&self) -> Vec<(String, Option<String>)> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // a panicking test thread must not take the backend down with it
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn begin(&self) -> Result<MutexGuard<'_, State>, BackendError> {
        let mut state = self.lock();
        match state.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn check_amount(amount: Decimal) -> Result<(), BackendError> {
    if amount <= Decimal::ZERO {
        return Err(BackendError::Validation(format!(
            "payment amount must be positive, got {amount}"
        )));
    }
    Ok(())
}

#[async_trait]
impl InvoiceBackend for InMemoryBackend {
    async fn invoice_number_exists(&self, number: &str) -> Result<bool, BackendError> {
        let state = self.begin()?;
        Ok(state.number_taken(number, None))
    }

    async fn create_invoice(&self, invoice: &InvoiceRecord) -> Result<InvoiceRecord, BackendError> {
        let mut state = self.begin()?;
        if state.number_taken(&invoice.invoice_number, None) {
            return Err(BackendError::Conflict(format!(
                "invoice number '{}' already exists",
                invoice.invoice_number
            )));
        }

        let id = state.next_id("inv");
        let now = Utc::now();
        let mut created = invoice.clone();
        created.id = Some(id.clone());
        created.created_at = Some(now);
        created.updated_at = Some(now);

        state.last_settings = Some(created.settings.clone());
        state.invoices.insert(id, created.clone());
        Ok(created)
    }

    async fn update_invoice(
        &self,
        id: &str,
        invoice: &InvoiceRecord,
    ) -> Result<InvoiceRecord, BackendError> {
        let mut state = self.begin()?;
        let created_at = state.invoice(id)?.created_at;
        if state.number_taken(&invoice.invoice_number, Some(id)) {
            return Err(BackendError::Conflict(format!(
                "invoice number '{}' already exists",
                invoice.invoice_number
            )));
        }

        let mut updated = invoice.clone();
        updated.id = Some(id.to_string());
        updated.created_at = created_at;
        updated.updated_at = Some(Utc::now());
        state.invoices.insert(id.to_string(), updated.clone());
        Ok(updated)
    }

    async fn send_invoice(&self, id: &str, message: Option<&str>) -> Result<bool, BackendError> {
        let mut state = self.begin()?;
        state.invoice(id)?;
        if state.decline_sends > 0 {
            state.decline_sends -= 1;
            return Ok(false);
        }
        if let Some(record) = state.invoices.get_mut(id) {
            record.status = InvoiceStatus::Sent;
            record.updated_at = Some(Utc::now());
        }
        state
            .sent
            .push((id.to_string(), message.map(str::to_string)));
        Ok(true)
    }

    async fn list_payments(&self, invoice_id: &str) -> Result<LedgerSnapshot, BackendError> {
        let state = self.begin()?;
        let total = state.invoice(invoice_id)?.totals.total;
        let history = state.payments.get(invoice_id).cloned().unwrap_or_default();
        Ok(PaymentLedger::from_history(history).snapshot(total))
    }

    async fn record_payment(
        &self,
        invoice_id: &str,
        payment: &NewPayment,
    ) -> Result<Payment, BackendError> {
        let mut state = self.begin()?;
        state.invoice(invoice_id)?;
        check_amount(payment.amount)?;

        let stored = payment.clone().into_payment(state.next_id("pay"));
        state
            .payments
            .entry(invoice_id.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn edit_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Payment, BackendError> {
        let mut state = self.begin()?;
        state.invoice(invoice_id)?;
        if let Some(amount) = update.amount {
            check_amount(amount)?;
        }

        let payment = state
            .payments
            .get_mut(invoice_id)
            .and_then(|list| list.iter_mut().find(|p| p.id == payment_id))
            .ok_or_else(|| BackendError::NotFound(format!("payment {payment_id}")))?;
        *payment = update.apply_to(payment);
        Ok(payment.clone())
    }

    async fn delete_payment(
        &self,
        invoice_id: &str,
        payment_id: &str,
    ) -> Result<(), BackendError> {
        let mut state = self.begin()?;
        state.invoice(invoice_id)?;

        let list = state.payments.entry(invoice_id.to_string()).or_default();
        let before = list.len();
        list.retain(|p| p.id != payment_id);
        if list.len() == before {
            return Err(BackendError::NotFound(format!("payment {payment_id}")));
        }
        Ok(())
    }

    async fn last_used_settings(&self) -> Result<Option<InvoiceSettings>, BackendError> {
        let state = self.begin()?;
        Ok(state.last_settings.clone())
    }
}
