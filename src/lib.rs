//! # billfold
//!
//! Invoice financial core: line-item totals, sales tax / VAT / discount
//! application, payment-ledger reconciliation and the invoice lifecycle
//! (draft → sent → paid / overdue / cancelled).
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//! Totals are always derived from line items and settings; they are
//! recomputed after every mutating command and never stored independently.
//!
//! ## Quick Start
//!
//! ```rust
//! use billfold::core::*;
//! use chrono::NaiveDate;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new("INV-0001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
//!     .customer(CustomerRef::new("cus_1", "Kunde AG"))
//!     .add_line(LineItemBuilder::new("Consulting", 2, dec!(50)).build())
//!     .add_line(LineItemBuilder::new("Hosting", 1, dec!(25)).build())
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(invoice.totals().subtotal, dec!(125));
//! assert_eq!(invoice.totals().total, dec!(125));
//! assert_eq!(format_amount(invoice.totals().total, Decimals::Yes), "125.00");
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Totals, ledger, lifecycle, validation, backend trait, session |
//! | `rest` | HTTP implementation of [`backend::InvoiceBackend`] |
//! | `config` | Load workspace settings defaults from file / environment |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod backend;

#[cfg(feature = "core")]
pub mod session;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
