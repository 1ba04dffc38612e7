use std::sync::Arc;

use billfold::backend::InMemoryBackend;
use billfold::core::*;
use billfold::session::InvoiceSession;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> Result<(), InvoiceError> {
    let backend = Arc::new(InMemoryBackend::new());
    let issued = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();

    let mut session = InvoiceSession::start_draft(backend.clone(), "INV-0001", issued, None).await;
    {
        let invoice = session.invoice_mut();
        invoice.set_customer(Some(CustomerRef::new("cus_1", "Kunde AG")))?;
        invoice.set_due_date(NaiveDate::from_ymd_opt(2024, 7, 15))?;
        invoice.add_line(LineItemBuilder::new("Consulting", 1, dec!(100)).build())?;
        invoice.set_sales_tax(RateSetting::enabled(dec!(13)))?;
        invoice.set_vat(RateSetting::enabled(dec!(20)))?;
        invoice.set_discount(DiscountSetting::enabled(dec!(10)))?;
    }

    session.send(Some("Thank you for your business")).await?;
    println!(
        "{} sent, total {}",
        session.invoice().number(),
        session.invoice().totals().total
    );

    let paid_on = NaiveDate::from_ymd_opt(2024, 6, 20).unwrap();
    let payment = session
        .record_payment(PaymentDraft::new(dec!(123), paid_on, PaymentMethod::BankTransfer))
        .await?;
    println!(
        "payment {} recorded: balance {} -> {}, status {}",
        payment.id,
        payment.balance_before,
        session.invoice().current_balance(),
        session.invoice().status()
    );

    session.delete_payment(&payment.id).await?;
    let today = NaiveDate::from_ymd_opt(2024, 8, 1).unwrap();
    println!(
        "payment deleted: balance {}, status on {today}: {}",
        session.invoice().current_balance(),
        session.invoice().display_status(today)
    );

    match session
        .record_payment(PaymentDraft::new(dec!(-5), paid_on, PaymentMethod::Cash))
        .await
    {
        Err(e) => println!("rejected: {e}"),
        Ok(p) => println!("unexpectedly recorded {}", p.id),
    }

    let summary = session.payment_summary();
    println!(
        "{} payments, balance {}, credits {}",
        summary.payment_history.len(),
        summary.current_balance,
        summary.available_credits
    );
    Ok(())
}
