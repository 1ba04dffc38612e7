//! Network-backed invoice commands.
//!
//! An [`InvoiceSession`] pairs one in-memory [`Invoice`] with the
//! [`InvoiceBackend`] that persists it. Every command follows the same
//! shape: check locally, await the backend, and only apply the change in
//! memory once the backend has confirmed it. A failed or abandoned call
//! leaves the invoice exactly as it was.
//!
//! Commands take `&mut self`, so a second submission cannot start while
//! one is still in flight.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::backend::InvoiceBackend;
use crate::core::{
    Invoice, InvoiceError, InvoiceNumberSequence, InvoiceRecord, InvoiceStatus, LedgerSnapshot,
    LifecycleEvent, Payment, PaymentDraft, PaymentUpdate, SettingsOverlay, invoice_number_taken,
    resolve_settings, validate_for_submission,
};

/// Outcome of an invoice-number availability lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberCheck {
    Available,
    Taken,
    /// The lookup failed. Does not block submission on its own.
    Unknown,
}

pub struct InvoiceSession {
    backend: Arc<dyn InvoiceBackend>,
    invoice: Invoice,
    /// Number the backend currently has on record for this invoice.
    persisted_number: Option<String>,
}

impl std::fmt::Debug for InvoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvoiceSession")
            .field("invoice", &self.invoice)
            .field("persisted_number", &self.persisted_number)
            .finish_non_exhaustive()
    }
}

impl InvoiceSession {
    /// Wrap an invoice that has not been created yet.
    pub fn new(backend: Arc<dyn InvoiceBackend>, invoice: Invoice) -> Self {
        let persisted_number = invoice
            .is_persisted()
            .then(|| invoice.number().to_string());
        Self {
            backend,
            invoice,
            persisted_number,
        }
    }

    /// Start a new draft with settings resolved from the last invoice the
    /// user created, then `workspace`, then the hardcoded defaults.
    ///
    /// If the last-used settings cannot be fetched, that layer is skipped.
    #[instrument(skip(backend, workspace), fields(invoice_number = %number))]
    pub async fn start_draft(
        backend: Arc<dyn InvoiceBackend>,
        number: &str,
        issue_date: NaiveDate,
        workspace: Option<&SettingsOverlay>,
    ) -> Self {
        let last_used = match backend.last_used_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "could not load last-used settings, skipping that layer");
                None
            }
        };
        let settings = resolve_settings(last_used.as_ref(), workspace);
        let invoice = Invoice::with_settings(number, issue_date, settings);
        Self::new(backend, invoice)
    }

    /// Open a persisted invoice together with its payment history.
    #[instrument(skip(backend, record), fields(invoice_number = %record.invoice_number))]
    pub async fn open(
        backend: Arc<dyn InvoiceBackend>,
        record: InvoiceRecord,
    ) -> Result<Self, InvoiceError> {
        let id = record.id.clone().ok_or(InvoiceError::NotPersisted)?;
        let snapshot = backend.list_payments(&id).await?;
        let invoice = Invoice::from_record(record, snapshot.payment_history);
        Ok(Self::new(backend, invoice))
    }

    pub fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    /// Synchronous edits: line items, settings, dates, customer.
    pub fn invoice_mut(&mut self) -> &mut Invoice {
        &mut self.invoice
    }

    pub fn backend(&self) -> &Arc<dyn InvoiceBackend> {
        &self.backend
    }

    pub fn into_invoice(self) -> Invoice {
        self.invoice
    }

    /// Abandon the session. Nothing beyond what the backend already
    /// confirmed is persisted.
    pub fn discard(self) {
        debug!(
            invoice_number = %self.invoice.number(),
            persisted = self.invoice.is_persisted(),
            "session discarded"
        );
    }

    pub fn payment_summary(&self) -> LedgerSnapshot {
        self.invoice.payment_summary()
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Ask the backend whether the current number is already in use.
    pub async fn check_invoice_number(&self) -> NumberCheck {
        let number = self.invoice.number().trim();
        if number.is_empty() {
            return NumberCheck::Unknown;
        }
        if !self.number_changed() {
            return NumberCheck::Available;
        }
        match self.backend.invoice_number_exists(number).await {
            Ok(true) => NumberCheck::Taken,
            Ok(false) => NumberCheck::Available,
            Err(e) => {
                warn!(invoice_number = %number, error = %e, "invoice number check failed");
                NumberCheck::Unknown
            }
        }
    }

    /// All local rules plus invoice-number uniqueness.
    pub async fn validate(&self) -> Result<(), InvoiceError> {
        let mut errors = validate_for_submission(&self.invoice);
        if self.check_invoice_number().await == NumberCheck::Taken {
            errors.push(invoice_number_taken(self.invoice.number()));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(InvoiceError::Validation(errors))
        }
    }

    // ── Invoice commands ─────────────────────────────────────────────

    /// Create the invoice on the backend and adopt the assigned id. Only a
    /// draft can be created.
    #[instrument(skip(self), fields(invoice_number = %self.invoice.number()))]
    pub async fn create(&mut self) -> Result<(), InvoiceError> {
        if self.invoice.is_persisted() {
            return Err(InvoiceError::Rejected("invoice has already been created".into()));
        }
        if !self.invoice.status().is_editable() {
            return Err(InvoiceError::ReadOnly(self.invoice.status()));
        }
        self.validate().await?;
        self.push_create().await
    }

    /// Persist edits to an already created draft.
    #[instrument(skip(self), fields(invoice_id = ?self.invoice.id()))]
    pub async fn save(&mut self) -> Result<(), InvoiceError> {
        if !self.invoice.status().is_editable() {
            return Err(InvoiceError::ReadOnly(self.invoice.status()));
        }
        self.validate().await?;
        self.push_update(self.invoice.status()).await
    }

    /// Persist the draft (creating it if needed) and deliver it. The
    /// invoice becomes `Sent` only after the backend confirms delivery.
    #[instrument(skip(self, message), fields(invoice_number = %self.invoice.number()))]
    pub async fn send(&mut self, message: Option<&str>) -> Result<(), InvoiceError> {
        self.invoice.check_transition(LifecycleEvent::Send)?;
        self.validate().await?;

        if self.invoice.is_persisted() {
            self.push_update(self.invoice.status()).await?;
        } else {
            self.push_create().await?;
        }

        self.deliver(message).await?;
        self.invoice.mark_sent()
    }

    /// Deliver again. A reopened draft is saved and sent; a sent invoice
    /// is re-delivered without changes.
    #[instrument(skip(self, message), fields(invoice_id = ?self.invoice.id()))]
    pub async fn resend(&mut self, message: Option<&str>) -> Result<(), InvoiceError> {
        match self.invoice.status() {
            InvoiceStatus::Draft => self.send(message).await,
            InvoiceStatus::Sent => self.deliver(message).await,
            from => Err(InvoiceError::IllegalTransition {
                from,
                event: LifecycleEvent::Send,
            }),
        }
    }

    /// Move a sent invoice back to draft so it can be edited.
    #[instrument(skip(self), fields(invoice_id = ?self.invoice.id()))]
    pub async fn reopen(&mut self) -> Result<(), InvoiceError> {
        let next = self.invoice.check_transition(LifecycleEvent::Reopen)?;
        self.push_update(next).await?;
        self.invoice.reopen()
    }

    /// Cancel the invoice. A persisted invoice is cancelled on the backend
    /// first.
    #[instrument(skip(self), fields(invoice_id = ?self.invoice.id()))]
    pub async fn cancel(&mut self) -> Result<(), InvoiceError> {
        let next = self.invoice.check_transition(LifecycleEvent::Cancel)?;
        if self.invoice.is_persisted() {
            self.push_update(next).await?;
        }
        self.invoice.cancel()
    }

    // ── Payment commands ─────────────────────────────────────────────

    #[instrument(skip(self, draft), fields(invoice_id = ?self.invoice.id(), amount = %draft.amount))]
    pub async fn record_payment(&mut self, draft: PaymentDraft) -> Result<Payment, InvoiceError> {
        let invoice_id = self.require_id()?;
        let new = self.invoice.prepare_payment(draft)?;

        let payment = self
            .backend
            .record_payment(&invoice_id, &new)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to record payment"))?;

        self.invoice.apply_recorded_payment(payment.clone());
        info!(
            payment_id = %payment.id,
            balance = %self.invoice.current_balance(),
            "payment recorded"
        );
        Ok(payment)
    }

    #[instrument(skip(self, update), fields(invoice_id = ?self.invoice.id()))]
    pub async fn edit_payment(
        &mut self,
        payment_id: &str,
        update: PaymentUpdate,
    ) -> Result<Payment, InvoiceError> {
        let invoice_id = self.require_id()?;
        self.invoice.preview_payment_edit(payment_id, &update)?;

        let payment = self
            .backend
            .edit_payment(&invoice_id, payment_id, &update)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to edit payment"))?;

        self.invoice.apply_edited_payment(payment.clone())?;
        info!(balance = %self.invoice.current_balance(), "payment edited");
        Ok(payment)
    }

    #[instrument(skip(self), fields(invoice_id = ?self.invoice.id()))]
    pub async fn delete_payment(&mut self, payment_id: &str) -> Result<Payment, InvoiceError> {
        let invoice_id = self.require_id()?;
        self.invoice.ensure_accepts_payments()?;
        if self.invoice.payments().get(payment_id).is_none() {
            return Err(InvoiceError::NotFound(format!("payment {payment_id}")));
        }

        self.backend
            .delete_payment(&invoice_id, payment_id)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to delete payment"))?;

        let removed = self.invoice.apply_deleted_payment(payment_id)?;
        info!(balance = %self.invoice.current_balance(), "payment deleted");
        Ok(removed)
    }

    /// Replace the ledger with the backend's history.
    #[instrument(skip(self), fields(invoice_id = ?self.invoice.id()))]
    pub async fn refresh_payments(&mut self) -> Result<LedgerSnapshot, InvoiceError> {
        let invoice_id = self.require_id()?;
        let remote = self.backend.list_payments(&invoice_id).await?;
        let reported_balance = remote.current_balance;

        self.invoice.replace_payments(remote.payment_history);
        let local = self.invoice.payment_summary();
        if local.current_balance != reported_balance {
            warn!(
                reported = %reported_balance,
                computed = %local.current_balance,
                "backend balance differs from recomputed balance"
            );
        }
        Ok(local)
    }

    // ── Internals ────────────────────────────────────────────────────

    fn number_changed(&self) -> bool {
        self.persisted_number.as_deref() != Some(self.invoice.number())
    }

    fn require_id(&self) -> Result<String, InvoiceError> {
        self.invoice
            .id()
            .map(str::to_string)
            .ok_or(InvoiceError::NotPersisted)
    }

    async fn push_create(&mut self) -> Result<(), InvoiceError> {
        let record = self.invoice.to_record();
        let created = self
            .backend
            .create_invoice(&record)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to create invoice"))?;

        self.invoice.adopt_record(&created);
        self.persisted_number = Some(record.invoice_number);
        info!(invoice_id = ?created.id, "invoice created");
        Ok(())
    }

    /// Persist the current content with `status` as the stored status.
    async fn push_update(&mut self, status: InvoiceStatus) -> Result<(), InvoiceError> {
        let invoice_id = self.require_id()?;
        let mut record = self.invoice.to_record();
        record.status = status;

        let updated = self
            .backend
            .update_invoice(&invoice_id, &record)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to update invoice"))?;

        self.invoice.adopt_record(&updated);
        self.persisted_number = Some(record.invoice_number);
        Ok(())
    }

    async fn deliver(&mut self, message: Option<&str>) -> Result<(), InvoiceError> {
        let invoice_id = self.require_id()?;
        let delivered = self
            .backend
            .send_invoice(&invoice_id, message)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to send invoice"))?;

        if !delivered {
            warn!("backend declined to send invoice");
            return Err(InvoiceError::Rejected("the invoice could not be sent".into()));
        }
        Ok(())
    }
}

/// First number from `sequence` the backend does not know yet.
///
/// Gives up with [`InvoiceError::Conflict`] after `max_attempts` taken
/// numbers. A failed lookup is returned as is.
pub async fn suggest_invoice_number(
    backend: &dyn InvoiceBackend,
    sequence: &mut InvoiceNumberSequence,
    max_attempts: usize,
) -> Result<String, InvoiceError> {
    for _ in 0..max_attempts {
        let candidate = sequence.next_number();
        if !backend.invoice_number_exists(&candidate).await? {
            return Ok(candidate);
        }
        debug!(%candidate, "invoice number taken, trying next");
    }
    Err(InvoiceError::Conflict(format!(
        "no free invoice number after {max_attempts} attempts"
    )))
}
