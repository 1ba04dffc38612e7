use chrono::NaiveDate;
use billfold::core::*;
use rust_decimal_macros::dec;

fn main() {
    let settings = InvoiceSettings {
        currency: "EUR".into(),
        date_format: "DD.MM.YYYY".into(),
        sales_tax: RateSetting::enabled(dec!(13)),
        vat: RateSetting::enabled(dec!(20)),
        discount: DiscountSetting::enabled(dec!(10)),
        notes: Some("Payable within 30 days".into()),
        ..Default::default()
    };

    let mut invoice = InvoiceBuilder::new("INV-0001", NaiveDate::from_ymd_opt(2024, 6, 15).unwrap())
        .due_date(NaiveDate::from_ymd_opt(2024, 7, 15).unwrap())
        .customer(CustomerRef::new("cus_1", "Kunde AG").with_email("billing@kunde.example"))
        .settings(settings)
        .add_line(LineItemBuilder::new("Frontend development", 2, dec!(30)).build())
        .add_line(LineItemBuilder::new("Hosting (monthly)", 1, dec!(40)).build())
        .build()
        .expect("invoice should be valid");

    // quantity controls recompute immediately
    let hosting = invoice.items().as_slice()[1].id;
    invoice.increment_quantity(hosting).unwrap();
    invoice.decrement_quantity(hosting).unwrap();

    let s = invoice.settings().clone();
    let money = |v| format_money(v, s.decimals, &s.currency);

    println!("Invoice: {}", invoice.number());
    println!("Date:    {}", s.format_date(invoice.issue_date()));
    if let Some(due) = invoice.due_date() {
        println!("Due:     {}", s.format_date(due));
    }
    println!("---");
    for line in invoice.items() {
        println!(
            "  {} x {} @ {} = {}",
            line.effective_quantity(),
            line.description,
            money(line.unit_price_value()),
            money(line.amount())
        );
    }
    let totals = invoice.totals();
    println!("---");
    println!("Subtotal:  {}", money(totals.subtotal));
    println!("Sales tax: {}", money(totals.tax_amount));
    println!("VAT:       {}", money(totals.vat_amount));
    println!("Discount: -{}", money(totals.discount));
    println!("Total:     {}", money(totals.total));
}
