use rust_decimal::Decimal;

use super::error::{ValidationError, ValidationRule};
use super::invoice::Invoice;
use super::money::{MAX_AMOUNT, parse_unit_price};
use super::settings::{InvoiceSettings, RateSetting};
use super::types::LineItem;

/// Validate an invoice before it is created or sent.
/// Returns all validation errors found (not just the first).
///
/// Invoice-number uniqueness needs the backend and is checked by
/// [`crate::session::InvoiceSession`]; everything else is local.
pub fn validate_for_submission(invoice: &Invoice) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if invoice.number().trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationRule::EmptyInvoiceNumber,
            "invoice_number",
            "invoice number must not be empty",
        ));
    }

    if invoice.customer().is_none() {
        errors.push(ValidationError::new(
            ValidationRule::MissingCustomer,
            "customer",
            "select a customer before submitting the invoice",
        ));
    }

    if invoice.items().is_empty() {
        errors.push(ValidationError::new(
            ValidationRule::NoLineItems,
            "items",
            "invoice must have at least one line item",
        ));
    }

    for (i, item) in invoice.items().iter().enumerate() {
        validate_line(item, i, &mut errors);
    }

    errors.extend(validate_settings(invoice.settings()));

    if let Some(due) = invoice.due_date() {
        if due < invoice.issue_date() {
            errors.push(ValidationError::new(
                ValidationRule::DueBeforeIssue,
                "due_date",
                format!(
                    "due date {due} must not be before issue date {}",
                    invoice.issue_date()
                ),
            ));
        }
    }

    let total = invoice.totals().total;
    if total.is_sign_negative() && !total.is_zero() {
        errors.push(ValidationError::new(
            ValidationRule::NegativeTotal,
            "settings.discount.amount",
            format!("discount makes the invoice total negative ({total})"),
        ));
    }

    errors
}

/// Validate rates and discount. Returns all errors found.
pub fn validate_settings(settings: &InvoiceSettings) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    validate_rate(&settings.sales_tax, "settings.sales_tax.rate", "sales tax", &mut errors);
    validate_rate(&settings.vat, "settings.vat.rate", "VAT", &mut errors);

    if settings.discount.amount.is_sign_negative() && !settings.discount.amount.is_zero() {
        errors.push(ValidationError::new(
            ValidationRule::NegativeDiscount,
            "settings.discount.amount",
            "discount amount must not be negative",
        ));
    }

    errors
}

/// Error reported when the backend says the number is already used.
pub fn invoice_number_taken(number: &str) -> ValidationError {
    ValidationError::new(
        ValidationRule::InvoiceNumberTaken,
        "invoice_number",
        format!("invoice number '{number}' is already in use; choose another"),
    )
}

fn validate_rate(
    setting: &RateSetting,
    field: &str,
    label: &str,
    errors: &mut Vec<ValidationError>,
) {
    if setting.rate < Decimal::ZERO || setting.rate > Decimal::ONE_HUNDRED {
        errors.push(ValidationError::new(
            ValidationRule::RateOutOfRange,
            field,
            format!("{label} rate must be between 0 and 100, got {}", setting.rate),
        ));
    }
}

fn validate_line(item: &LineItem, index: usize, errors: &mut Vec<ValidationError>) {
    let prefix = format!("items[{index}]");

    if item.description.trim().is_empty() {
        errors.push(ValidationError::new(
            ValidationRule::EmptyDescription,
            format!("{prefix}.description"),
            format!("line {} needs a description", index + 1),
        ));
    }

    if parse_unit_price(&item.unit_price).is_none() {
        errors.push(ValidationError::new(
            ValidationRule::InvalidUnitPrice,
            format!("{prefix}.unit_price"),
            format!(
                "line {} unit price '{}' must be a number from 0 to {MAX_AMOUNT}",
                index + 1,
                item.unit_price
            ),
        ));
    }
}
