//! Payment ledger for a single invoice.
//!
//! The balance is never tracked incrementally: it is always
//! `total − Σ payments.amount`, summed from scratch over the current
//! history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::{InvoiceError, ValidationError, ValidationRule};
use super::money::MAX_AMOUNT;
use super::types::{NewPayment, Payment, PaymentDraft, PaymentUpdate};

/// Payment history plus derived balance figures, as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    /// Payments ordered by date ascending.
    pub payment_history: Vec<Payment>,
    pub current_balance: Decimal,
    /// Overpayment, `max(0, -current_balance)`.
    pub available_credits: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentLedger {
    payments: Vec<Payment>,
}

/// Accept payment amounts in `(0, MAX_AMOUNT]`.
pub fn validate_payment_amount(amount: Decimal) -> Result<(), ValidationError> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::new(
            ValidationRule::NonPositivePayment,
            "amount",
            format!("payment amount must be greater than zero, got {amount}"),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::new(
            ValidationRule::PaymentTooLarge,
            "amount",
            format!("payment amount must not exceed {MAX_AMOUNT}, got {amount}"),
        ));
    }
    Ok(())
}

impl PaymentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_history(payments: Vec<Payment>) -> Self {
        Self { payments }
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Payment> {
        self.payments.iter().find(|p| p.id == id)
    }

    /// Payments in recording order.
    pub fn entries(&self) -> &[Payment] {
        &self.payments
    }

    /// Payments ordered by date ascending; same-day payments keep recording order.
    pub fn by_date(&self) -> Vec<Payment> {
        let mut sorted = self.payments.clone();
        sorted.sort_by_key(|p| p.date);
        sorted
    }

    /// Sum of all entries, saturating at `Decimal::MAX`.
    pub fn amount_paid(&self) -> Decimal {
        self.payments
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(p.amount))
            .unwrap_or(Decimal::MAX)
    }

    /// `total − amount_paid`, saturating at `Decimal::MIN`.
    pub fn current_balance(&self, total: Decimal) -> Decimal {
        total.checked_sub(self.amount_paid()).unwrap_or(Decimal::MIN)
    }

    pub fn available_credits(&self, total: Decimal) -> Decimal {
        (-self.current_balance(total)).max(Decimal::ZERO)
    }

    pub fn snapshot(&self, total: Decimal) -> LedgerSnapshot {
        LedgerSnapshot {
            payment_history: self.by_date(),
            current_balance: self.current_balance(total),
            available_credits: self.available_credits(total),
        }
    }

    /// Validate a draft and attach its audit snapshot against `total`.
    /// The ledger itself is not modified.
    pub fn prepare(&self, total: Decimal, draft: PaymentDraft) -> Result<NewPayment, InvoiceError> {
        validate_payment_amount(draft.amount)?;
        let balance_before = self.current_balance(total);
        let balance_after = balance_before.checked_sub(draft.amount).ok_or_else(|| {
            ValidationError::new(
                ValidationRule::PaymentTooLarge,
                "amount",
                format!("payment of {} leaves a balance out of range", draft.amount),
            )
        })?;
        Ok(NewPayment {
            amount: draft.amount,
            date: draft.date,
            method: draft.method,
            memo: draft.memo,
            balance_before,
            balance_after,
            remaining_balance: balance_after.max(Decimal::ZERO),
        })
    }

    /// Validate an edit against an existing entry. Returns the entry as it
    /// would look after the edit; the ledger itself is not modified.
    pub fn preview_edit(&self, id: &str, update: &PaymentUpdate) -> Result<Payment, InvoiceError> {
        if let Some(amount) = update.amount {
            validate_payment_amount(amount)?;
        }
        let existing = self
            .get(id)
            .ok_or_else(|| InvoiceError::NotFound(format!("payment {id}")))?;
        Ok(update.apply_to(existing))
    }

    /// Append a recorded entry. An entry with an id already present
    /// replaces it instead, so replaying a backend response is harmless.
    pub fn insert(&mut self, payment: Payment) {
        match self.payments.iter_mut().find(|p| p.id == payment.id) {
            Some(existing) => *existing = payment,
            None => self.payments.push(payment),
        }
    }

    /// Replace an existing entry by id.
    pub fn replace(&mut self, payment: Payment) -> Result<(), InvoiceError> {
        let existing = self
            .payments
            .iter_mut()
            .find(|p| p.id == payment.id)
            .ok_or_else(|| InvoiceError::NotFound(format!("payment {}", payment.id)))?;
        *existing = payment;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Payment, InvoiceError> {
        let index = self
            .payments
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| InvoiceError::NotFound(format!("payment {id}")))?;
        Ok(self.payments.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::PaymentMethod;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn record(ledger: &mut PaymentLedger, total: Decimal, id: &str, amount: Decimal, day: u32) {
        let new = ledger
            .prepare(total, PaymentDraft::new(amount, date(day), PaymentMethod::BankTransfer))
            .unwrap();
        ledger.insert(new.into_payment(id));
    }

    #[test]
    fn audit_snapshot_at_recording_time() {
        let mut ledger = PaymentLedger::new();
        record(&mut ledger, dec!(100), "p1", dec!(30), 1);
        record(&mut ledger, dec!(100), "p2", dec!(90), 2);

        let p1 = ledger.get("p1").unwrap();
        assert_eq!(p1.balance_before, dec!(100));
        assert_eq!(p1.balance_after, dec!(70));
        assert_eq!(p1.remaining_balance, dec!(70));

        let p2 = ledger.get("p2").unwrap();
        assert_eq!(p2.balance_before, dec!(70));
        assert_eq!(p2.balance_after, dec!(-20));
        assert_eq!(p2.remaining_balance, dec!(0));

        assert_eq!(ledger.current_balance(dec!(100)), dec!(-20));
        assert_eq!(ledger.available_credits(dec!(100)), dec!(20));
    }

    #[test]
    fn non_positive_amounts_rejected() {
        let ledger = PaymentLedger::new();
        for amount in [dec!(0), dec!(-5)] {
            let err = ledger
                .prepare(dec!(100), PaymentDraft::new(amount, date(1), PaymentMethod::Cash))
                .unwrap_err();
            assert_eq!(err.validation_errors()[0].rule, ValidationRule::NonPositivePayment);
        }
        assert!(ledger.is_empty());
    }

    #[test]
    fn oversized_amounts_rejected() {
        let ledger = PaymentLedger::new();
        for amount in [MAX_AMOUNT + dec!(0.01), Decimal::MAX] {
            let err = ledger
                .prepare(dec!(100), PaymentDraft::new(amount, date(1), PaymentMethod::Cash))
                .unwrap_err();
            assert_eq!(err.validation_errors()[0].rule, ValidationRule::PaymentTooLarge);
        }
        assert!(validate_payment_amount(MAX_AMOUNT).is_ok());
    }

    #[test]
    fn balance_saturates_instead_of_overflowing() {
        let mut ledger = PaymentLedger::new();
        record(&mut ledger, dec!(100), "p1", MAX_AMOUNT, 1);
        record(&mut ledger, dec!(100), "p2", MAX_AMOUNT, 2);

        assert_eq!(ledger.amount_paid(), MAX_AMOUNT * dec!(2));
        assert_eq!(ledger.current_balance(Decimal::MIN), Decimal::MIN);
        assert_eq!(ledger.available_credits(Decimal::MIN), Decimal::MAX);

        let err = ledger
            .prepare(Decimal::MIN, PaymentDraft::new(dec!(1), date(3), PaymentMethod::Cash))
            .unwrap_err();
        assert_eq!(err.validation_errors()[0].rule, ValidationRule::PaymentTooLarge);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn edit_preview_validates_and_leaves_ledger() {
        let mut ledger = PaymentLedger::new();
        record(&mut ledger, dec!(100), "p1", dec!(40), 1);

        let bad = PaymentUpdate {
            amount: Some(dec!(0)),
            ..Default::default()
        };
        assert!(ledger.preview_edit("p1", &bad).is_err());

        let good = PaymentUpdate {
            amount: Some(dec!(60)),
            ..Default::default()
        };
        let edited = ledger.preview_edit("p1", &good).unwrap();
        assert_eq!(edited.amount, dec!(60));
        assert_eq!(ledger.amount_paid(), dec!(40));

        ledger.replace(edited).unwrap();
        assert_eq!(ledger.current_balance(dec!(100)), dec!(40));
    }

    #[test]
    fn listing_is_date_ordered() {
        let mut ledger = PaymentLedger::new();
        record(&mut ledger, dec!(100), "late", dec!(10), 20);
        record(&mut ledger, dec!(100), "early", dec!(10), 3);
        record(&mut ledger, dec!(100), "early-2", dec!(10), 3);

        let ids: Vec<_> = ledger.by_date().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["early", "early-2", "late"]);
        assert_eq!(ledger.entries()[0].id, "late");
    }

    #[test]
    fn remove_unknown_payment() {
        let mut ledger = PaymentLedger::new();
        assert!(matches!(
            ledger.remove("nope"),
            Err(InvoiceError::NotFound(_))
        ));
    }

    #[test]
    fn insert_is_idempotent_by_id() {
        let mut ledger = PaymentLedger::new();
        record(&mut ledger, dec!(100), "p1", dec!(10), 1);
        let again = ledger.get("p1").unwrap().clone();
        ledger.insert(again);
        assert_eq!(ledger.len(), 1);
    }
}
