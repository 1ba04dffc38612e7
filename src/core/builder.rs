use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::error::InvoiceError;
use super::invoice::Invoice;
use super::settings::InvoiceSettings;
use super::types::{CustomerRef, LineItem};
use super::validation;

/// Builder for draft invoices.
///
/// ```
/// use billfold::core::*;
/// use rust_decimal_macros::dec;
/// use chrono::NaiveDate;
///
/// let invoice = InvoiceBuilder::new("INV-0001", NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
///     .due_date(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap())
///     .customer(CustomerRef::new("cus_42", "Kunde AG"))
///     .add_line(LineItemBuilder::new("Consulting", 10, dec!(150.00)).build())
///     .build()
///     .unwrap();
/// assert_eq!(invoice.status(), InvoiceStatus::Draft);
/// ```
pub struct InvoiceBuilder {
    number: String,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    customer: Option<CustomerRef>,
    settings: InvoiceSettings,
    lines: Vec<LineItem>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            number: number.into(),
            issue_date,
            due_date: None,
            customer: None,
            settings: InvoiceSettings::default(),
            lines: Vec::new(),
        }
    }

    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn customer(mut self, customer: CustomerRef) -> Self {
        self.customer = Some(customer);
        self
    }

    pub fn settings(mut self, settings: InvoiceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn add_line(mut self, line: LineItem) -> Self {
        self.lines.push(line);
        self
    }

    /// Build the draft and run submission validation.
    /// Returns all validation errors (not just the first).
    pub fn build(self) -> Result<Invoice, InvoiceError> {
        let invoice = self.build_unchecked();
        let errors = validation::validate_for_submission(&invoice);
        if !errors.is_empty() {
            return Err(InvoiceError::Validation(errors));
        }
        Ok(invoice)
    }

    /// Build without validation, e.g. for a draft still being filled in.
    pub fn build_unchecked(self) -> Invoice {
        let mut invoice = Invoice::with_settings(self.number, self.issue_date, self.settings);
        invoice.restore_draft_fields(self.customer, self.due_date, self.lines);
        invoice
    }
}

/// Builder for LineItem.
pub struct LineItemBuilder {
    id: Uuid,
    description: String,
    quantity: u32,
    unit_price: String,
}

impl LineItemBuilder {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: description.into(),
            quantity,
            unit_price: unit_price.to_string(),
        }
    }

    pub fn id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    /// Use the price exactly as a user typed it.
    pub fn unit_price_text(mut self, text: impl Into<String>) -> Self {
        self.unit_price = text.into();
        self
    }

    pub fn build(self) -> LineItem {
        LineItem {
            id: self.id,
            description: self.description,
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}
