use rust_decimal::Decimal;

use super::settings::InvoiceSettings;
use super::types::{LineItem, Totals};

/// Derive totals from line items and settings.
///
/// The order is fixed: subtotal first, then sales tax and VAT each on the
/// subtotal (never compounded), then the discount is subtracted. Malformed
/// unit prices count as zero and quantities below 1 count as 1. A sum that
/// `Decimal` cannot hold is dropped rather than wrapped.
pub fn compute_totals(items: &[LineItem], settings: &InvoiceSettings) -> Totals {
    let subtotal = items
        .iter()
        .map(LineItem::amount)
        .fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount).unwrap_or(acc));
    let tax_amount = settings.sales_tax.apply(subtotal);
    let vat_amount = settings.vat.apply(subtotal);
    let discount = settings.discount.effective_amount();
    let total = subtotal
        .checked_add(tax_amount)
        .and_then(|v| v.checked_add(vat_amount))
        .and_then(|v| v.checked_sub(discount))
        .unwrap_or(Decimal::ZERO);

    Totals {
        subtotal,
        tax_amount,
        vat_amount,
        discount,
        total,
    }
}

impl Totals {
    /// Every component rounded for display.
    pub fn rounded(&self, decimals: super::money::Decimals) -> Totals {
        use super::money::round_amount;
        Totals {
            subtotal: round_amount(self.subtotal, decimals),
            tax_amount: round_amount(self.tax_amount, decimals),
            vat_amount: round_amount(self.vat_amount, decimals),
            discount: round_amount(self.discount, decimals),
            total: round_amount(self.total, decimals),
        }
    }
}
