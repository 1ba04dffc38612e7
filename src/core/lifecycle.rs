//! Invoice status state machine.
//!
//! ```text
//!            send               settle
//!   Draft ─────────▶ Sent ────────────▶ Paid
//!     ▲               │  ◀────────────
//!     └── reopen ─────┘     unsettle
//!   Draft / Sent ── cancel ──▶ Cancelled
//! ```
//!
//! `Overdue` is never stored: it is derived on read from a `Sent` invoice
//! whose due date has passed with a positive balance.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::InvoiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    Overdue,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Overdue => "overdue",
            Self::Paid => "paid",
            Self::Cancelled => "cancelled",
        }
    }

    /// Paid and cancelled accept no explicit command. A paid invoice only
    /// leaves `Paid` when a ledger change raises its balance again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Paid | Self::Cancelled)
    }

    /// Line items and pricing settings may only change in `Draft`.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Whether payments may be recorded, edited or deleted.
    pub fn accepts_payments(&self) -> bool {
        matches!(self, Self::Sent | Self::Overdue | Self::Paid)
    }

    /// The stored form of a status: `Overdue` is kept as `Sent`.
    pub fn stored(self) -> Self {
        match self {
            Self::Overdue => Self::Sent,
            other => other,
        }
    }

    /// Next status after `event`, or an error if the transition is illegal.
    pub fn apply(self, event: LifecycleEvent) -> Result<InvoiceStatus, InvoiceError> {
        use InvoiceStatus::*;
        use LifecycleEvent::*;

        match (self, event) {
            (Draft, Send) => Ok(Sent),
            (Sent | Overdue, Reopen) => Ok(Draft),
            (Sent | Overdue, Settle) => Ok(Paid),
            (Paid, Unsettle) => Ok(Sent),
            (Draft | Sent | Overdue, Cancel) => Ok(Cancelled),
            (from, event) => Err(InvoiceError::IllegalTransition { from, event }),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that moves an invoice between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEvent {
    /// The backend confirmed the invoice was sent.
    Send,
    /// Editing is deliberately re-opened on a sent invoice.
    Reopen,
    /// A ledger change brought the balance to zero or below.
    Settle,
    /// A ledger change raised the balance of a paid invoice above zero.
    Unsettle,
    /// Explicit cancellation.
    Cancel,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Send => "send",
            Self::Reopen => "reopen",
            Self::Settle => "settle",
            Self::Unsettle => "unsettle",
            Self::Cancel => "cancel",
        })
    }
}

/// Status as shown to users on `today`.
///
/// `Overdue` ⇔ stored status is `Sent`, `today` is after the due date and
/// the balance is still positive.
pub fn display_status(
    status: InvoiceStatus,
    due_date: Option<NaiveDate>,
    current_balance: Decimal,
    today: NaiveDate,
) -> InvoiceStatus {
    match (status.stored(), due_date) {
        (InvoiceStatus::Sent, Some(due)) if today > due && current_balance > Decimal::ZERO => {
            InvoiceStatus::Overdue
        }
        (stored, _) => stored,
    }
}

/// Event required to keep `status` consistent with `current_balance`.
pub fn settlement_event(status: InvoiceStatus, current_balance: Decimal) -> Option<LifecycleEvent> {
    match status {
        InvoiceStatus::Sent | InvoiceStatus::Overdue if current_balance <= Decimal::ZERO => {
            Some(LifecycleEvent::Settle)
        }
        InvoiceStatus::Paid if current_balance > Decimal::ZERO => Some(LifecycleEvent::Unsettle),
        _ => None,
    }
}
