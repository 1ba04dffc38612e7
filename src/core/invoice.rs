//! The invoice aggregate.
//!
//! [`Invoice`] owns its line items, settings, cached totals, payment ledger
//! and status. Every mutating command recomputes totals before returning,
//! and every ledger change re-derives the status from the balance.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::InvoiceError;
use super::ledger::{LedgerSnapshot, PaymentLedger};
use super::lifecycle::{self, InvoiceStatus, LifecycleEvent};
use super::line_items::LineItems;
use super::money::Decimals;
use super::settings::{DiscountSetting, InvoiceSettings, RateSetting};
use super::totals::compute_totals;
use super::types::*;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    id: Option<String>,
    invoice_number: String,
    customer: Option<CustomerRef>,
    items: LineItems,
    settings: InvoiceSettings,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    totals: Totals,
    payments: PaymentLedger,
    status: InvoiceStatus,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

/// Invoice as exchanged with the backend. The payment ledger travels
/// separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    pub id: Option<String>,
    pub invoice_number: String,
    pub customer: Option<CustomerRef>,
    pub items: Vec<LineItem>,
    pub settings: InvoiceSettings,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub totals: Totals,
    pub status: InvoiceStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// What the customer gets to see. Team notes are never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub invoice_number: String,
    pub customer: Option<CustomerRef>,
    pub items: Vec<LineItem>,
    pub currency: String,
    pub decimals: Decimals,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub totals: Totals,
    pub amount_paid: Decimal,
    pub current_balance: Decimal,
    pub status: InvoiceStatus,
    pub notes: Option<String>,
    pub logo: Option<String>,
}

impl Invoice {
    /// A new, empty draft with default settings.
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self::with_settings(number, issue_date, InvoiceSettings::default())
    }

    /// A new, empty draft with the given (usually resolved) settings.
    pub fn with_settings(
        number: impl Into<String>,
        issue_date: NaiveDate,
        settings: InvoiceSettings,
    ) -> Self {
        let mut invoice = Self {
            id: None,
            invoice_number: number.into(),
            customer: None,
            items: LineItems::new(),
            settings,
            issue_date,
            due_date: None,
            totals: Totals::default(),
            payments: PaymentLedger::new(),
            status: InvoiceStatus::Draft,
            created_at: None,
            updated_at: None,
        };
        invoice.recompute();
        invoice
    }

    /// Rebuild an invoice from a backend record and its payment history.
    ///
    /// Totals are recomputed from items and settings; the stored totals
    /// only serve as a consistency check.
    pub fn from_record(record: InvoiceRecord, payments: Vec<Payment>) -> Self {
        let mut invoice = Self {
            id: record.id,
            invoice_number: record.invoice_number,
            customer: record.customer,
            items: LineItems::from(record.items),
            settings: record.settings,
            issue_date: record.issue_date,
            due_date: record.due_date,
            totals: Totals::default(),
            payments: PaymentLedger::from_history(payments),
            status: record.status.stored(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        invoice.recompute();
        if invoice.totals != record.totals {
            warn!(
                invoice_number = %invoice.invoice_number,
                stored_total = %record.totals.total,
                computed_total = %invoice.totals.total,
                "stored totals differ from recomputed totals"
            );
        }
        invoice.reconcile_status();
        invoice
    }

    /// Snapshot for create/update calls.
    pub fn to_record(&self) -> InvoiceRecord {
        InvoiceRecord {
            id: self.id.clone(),
            invoice_number: self.invoice_number.clone(),
            customer: self.customer.clone(),
            items: self.items.as_slice().to_vec(),
            settings: self.settings.clone(),
            issue_date: self.issue_date,
            due_date: self.due_date,
            totals: self.totals,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Take over identity and timestamps from an authoritative backend
    /// response. Local content stays as is.
    pub fn adopt_record(&mut self, record: &InvoiceRecord) {
        if record.id.is_some() {
            self.id = record.id.clone();
        }
        self.created_at = record.created_at.or(self.created_at);
        self.updated_at = record.updated_at.or(self.updated_at);
    }

    pub fn customer_view(&self) -> CustomerView {
        CustomerView {
            invoice_number: self.invoice_number.clone(),
            customer: self.customer.clone(),
            items: self.items.as_slice().to_vec(),
            currency: self.settings.currency.clone(),
            decimals: self.settings.decimals,
            issue_date: self.issue_date,
            due_date: self.due_date,
            totals: self.totals,
            amount_paid: self.amount_paid(),
            current_balance: self.current_balance(),
            status: self.status,
            notes: self.settings.notes.clone(),
            logo: self.settings.logo.clone(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn number(&self) -> &str {
        &self.invoice_number
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn items(&self) -> &LineItems {
        &self.items
    }

    pub fn settings(&self) -> &InvoiceSettings {
        &self.settings
    }

    pub fn issue_date(&self) -> NaiveDate {
        self.issue_date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn payments(&self) -> &PaymentLedger {
        &self.payments
    }

    /// Stored status. Never `Overdue`; see [`Invoice::display_status`].
    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn amount_paid(&self) -> Decimal {
        self.payments.amount_paid()
    }

    /// `total − Σ payments`, recomputed on every call.
    pub fn current_balance(&self) -> Decimal {
        self.payments.current_balance(self.totals.total)
    }

    pub fn available_credits(&self) -> Decimal {
        self.payments.available_credits(self.totals.total)
    }

    pub fn payment_summary(&self) -> LedgerSnapshot {
        self.payments.snapshot(self.totals.total)
    }

    pub fn display_status(&self, today: NaiveDate) -> InvoiceStatus {
        lifecycle::display_status(self.status, self.due_date, self.current_balance(), today)
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.display_status(today) == InvoiceStatus::Overdue
    }

    // ── Draft editing ────────────────────────────────────────────────

    pub fn set_number(&mut self, number: impl Into<String>) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        self.invoice_number = number.into();
        Ok(())
    }

    pub fn set_customer(&mut self, customer: Option<CustomerRef>) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        self.customer = customer;
        Ok(())
    }

    pub fn set_issue_date(&mut self, date: NaiveDate) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        self.issue_date = date;
        Ok(())
    }

    pub fn set_due_date(&mut self, date: Option<NaiveDate>) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        self.due_date = date;
        Ok(())
    }

    /// Append a blank line item and return its id.
    pub fn add_item(&mut self) -> Result<Uuid, InvoiceError> {
        self.edit_items(|items| Ok(items.add_blank()))
    }

    pub fn add_line(&mut self, line: LineItem) -> Result<Uuid, InvoiceError> {
        self.edit_items(|items| Ok(items.push(line)))
    }

    pub fn update_item(&mut self, id: Uuid, patch: LineItemPatch) -> Result<(), InvoiceError> {
        self.edit_items(|items| items.update(id, patch).map(|_| ()))
    }

    pub fn set_description(
        &mut self,
        id: Uuid,
        description: impl Into<String>,
    ) -> Result<(), InvoiceError> {
        self.update_item(
            id,
            LineItemPatch {
                description: Some(description.into()),
                ..Default::default()
            },
        )
    }

    /// Commit a typed quantity. Zero is raised to the minimum of 1.
    pub fn set_quantity(&mut self, id: Uuid, quantity: u32) -> Result<(), InvoiceError> {
        self.update_item(
            id,
            LineItemPatch {
                quantity: Some(quantity),
                ..Default::default()
            },
        )
    }

    pub fn set_unit_price(&mut self, id: Uuid, text: impl Into<String>) -> Result<(), InvoiceError> {
        self.update_item(
            id,
            LineItemPatch {
                unit_price: Some(text.into()),
                ..Default::default()
            },
        )
    }

    pub fn increment_quantity(&mut self, id: Uuid) -> Result<u32, InvoiceError> {
        self.edit_items(|items| items.increment(id))
    }

    pub fn decrement_quantity(&mut self, id: Uuid) -> Result<u32, InvoiceError> {
        self.edit_items(|items| items.decrement(id))
    }

    pub fn remove_item(&mut self, id: Uuid) -> Result<LineItem, InvoiceError> {
        self.edit_items(|items| items.remove(id))
    }

    pub fn move_item(&mut self, id: Uuid, to: usize) -> Result<(), InvoiceError> {
        self.edit_items(|items| items.move_to(id, to))
    }

    /// Change any settings at once; totals are recomputed afterwards.
    pub fn update_settings(
        &mut self,
        change: impl FnOnce(&mut InvoiceSettings),
    ) -> Result<(), InvoiceError> {
        self.ensure_editable()?;
        change(&mut self.settings);
        self.recompute();
        Ok(())
    }

    pub fn set_sales_tax(&mut self, sales_tax: RateSetting) -> Result<(), InvoiceError> {
        self.update_settings(|s| s.sales_tax = sales_tax)
    }

    pub fn set_vat(&mut self, vat: RateSetting) -> Result<(), InvoiceError> {
        self.update_settings(|s| s.vat = vat)
    }

    pub fn set_discount(&mut self, discount: DiscountSetting) -> Result<(), InvoiceError> {
        self.update_settings(|s| s.discount = discount)
    }

    /// Team notes are internal and can be edited in any status.
    pub fn set_team_notes(&mut self, notes: Option<String>) {
        self.settings.team_notes = notes;
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Status `event` would lead to, without changing anything.
    pub fn check_transition(&self, event: LifecycleEvent) -> Result<InvoiceStatus, InvoiceError> {
        self.status.apply(event)
    }

    /// Record that the backend confirmed the invoice was sent.
    ///
    /// Payments kept across a reopen may already cover the new total, in
    /// which case the invoice goes straight on to `Paid`.
    pub fn mark_sent(&mut self) -> Result<(), InvoiceError> {
        self.transition(LifecycleEvent::Send)?;
        self.reconcile_status();
        Ok(())
    }

    /// Deliberately re-open a sent invoice for editing.
    pub fn reopen(&mut self) -> Result<(), InvoiceError> {
        self.transition(LifecycleEvent::Reopen)
    }

    pub fn cancel(&mut self) -> Result<(), InvoiceError> {
        self.transition(LifecycleEvent::Cancel)
    }

    // ── Payments ─────────────────────────────────────────────────────

    /// Fail unless payments may be changed in the current status.
    pub fn ensure_accepts_payments(&self) -> Result<(), InvoiceError> {
        if self.status.accepts_payments() {
            Ok(())
        } else {
            Err(InvoiceError::Rejected(format!(
                "payments cannot be changed while the invoice is {}",
                self.status
            )))
        }
    }

    /// Validate a payment and compute its audit snapshot. Nothing changes.
    pub fn prepare_payment(&self, draft: PaymentDraft) -> Result<NewPayment, InvoiceError> {
        self.ensure_accepts_payments()?;
        self.payments.prepare(self.totals.total, draft)
    }

    /// Validate a payment edit. Nothing changes.
    pub fn preview_payment_edit(
        &self,
        payment_id: &str,
        update: &PaymentUpdate,
    ) -> Result<Payment, InvoiceError> {
        self.ensure_accepts_payments()?;
        self.payments.preview_edit(payment_id, update)
    }

    /// Apply a payment the backend has recorded.
    pub fn apply_recorded_payment(&mut self, payment: Payment) {
        self.payments.insert(payment);
        self.reconcile_status();
    }

    /// Apply a payment edit the backend has confirmed.
    pub fn apply_edited_payment(&mut self, payment: Payment) -> Result<(), InvoiceError> {
        self.payments.replace(payment)?;
        self.reconcile_status();
        Ok(())
    }

    /// Apply a deletion the backend has confirmed.
    pub fn apply_deleted_payment(&mut self, payment_id: &str) -> Result<Payment, InvoiceError> {
        let removed = self.payments.remove(payment_id)?;
        self.reconcile_status();
        Ok(removed)
    }

    /// Replace the whole ledger with the backend's history.
    pub fn replace_payments(&mut self, payments: Vec<Payment>) {
        self.payments = PaymentLedger::from_history(payments);
        self.reconcile_status();
    }

    // ── Internals ────────────────────────────────────────────────────

    pub(crate) fn restore_draft_fields(
        &mut self,
        customer: Option<CustomerRef>,
        due_date: Option<NaiveDate>,
        lines: Vec<LineItem>,
    ) {
        self.customer = customer;
        self.due_date = due_date;
        for line in lines {
            self.items.push(line);
        }
        self.recompute();
    }

    fn ensure_editable(&self) -> Result<(), InvoiceError> {
        if self.status.is_editable() {
            Ok(())
        } else {
            Err(InvoiceError::ReadOnly(self.status))
        }
    }

    fn edit_items<T>(
        &mut self,
        edit: impl FnOnce(&mut LineItems) -> Result<T, InvoiceError>,
    ) -> Result<T, InvoiceError> {
        self.ensure_editable()?;
        let result = edit(&mut self.items);
        self.recompute();
        result
    }

    fn recompute(&mut self) {
        self.totals = compute_totals(self.items.as_slice(), &self.settings);
        debug!(
            invoice_number = %self.invoice_number,
            subtotal = %self.totals.subtotal,
            total = %self.totals.total,
            "totals recomputed"
        );
    }

    fn transition(&mut self, event: LifecycleEvent) -> Result<(), InvoiceError> {
        let next = self.status.apply(event)?;
        info!(
            invoice_number = %self.invoice_number,
            from = %self.status,
            to = %next,
            %event,
            "invoice status changed"
        );
        self.status = next;
        Ok(())
    }

    /// Keep `Paid` consistent with the balance after any ledger change.
    fn reconcile_status(&mut self) {
        let balance = self.current_balance();
        if let Some(event) = lifecycle::settlement_event(self.status, balance) {
            // settlement_event only yields transitions legal from the current status
            if let Err(e) = self.transition(event) {
                warn!(error = %e, "settlement transition rejected");
            }
        }
    }
}
