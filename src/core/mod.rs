//! Invoice financial core: money, line items, totals, lifecycle, payment
//! ledger, validation and the invoice aggregate.
//!
//! Everything in this module is synchronous and free of I/O. Network-backed
//! commands live in [`crate::session`].

mod builder;
pub mod currencies;
mod error;
mod invoice;
mod ledger;
mod lifecycle;
mod line_items;
mod money;
mod numbering;
mod settings;
mod totals;
mod types;
mod validation;

pub use builder::*;
pub use error::*;
pub use invoice::*;
pub use ledger::*;
pub use lifecycle::*;
pub use line_items::*;
pub use money::*;
pub use numbering::*;
pub use settings::*;
pub use totals::*;
pub use types::*;
pub use validation::*;
