use chrono::NaiveDate;
use billfold::core::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn customer() -> CustomerRef {
    CustomerRef::new("cus_1", "Kunde AG").with_email("billing@kunde.example")
}

fn settings(tax: Decimal, vat: Decimal, discount: Decimal) -> InvoiceSettings {
    InvoiceSettings {
        sales_tax: RateSetting::enabled(tax),
        vat: RateSetting::enabled(vat),
        discount: DiscountSetting::enabled(discount),
        ..Default::default()
    }
}

// --- Totals ---

#[test]
fn two_lines_without_adjustments() {
    let inv = InvoiceBuilder::new("INV-0001", date(2024, 6, 15))
        .customer(customer())
        .add_line(LineItemBuilder::new("Consulting", 2, dec!(50)).build())
        .add_line(LineItemBuilder::new("Hosting", 1, dec!(25)).build())
        .build()
        .unwrap();

    let totals = inv.totals();
    assert_eq!(totals.subtotal, dec!(125));
    assert_eq!(totals.tax_amount, dec!(0));
    assert_eq!(totals.vat_amount, dec!(0));
    assert_eq!(totals.total, dec!(125));
}

#[test]
fn tax_vat_and_discount() {
    let inv = InvoiceBuilder::new("INV-0002", date(2024, 6, 15))
        .customer(customer())
        .settings(settings(dec!(13), dec!(20), dec!(10)))
        .add_line(LineItemBuilder::new("Design", 4, dec!(25)).build())
        .build()
        .unwrap();

    let totals = inv.totals();
    assert_eq!(totals.subtotal, dec!(100));
    assert_eq!(totals.tax_amount, dec!(13));
    assert_eq!(totals.vat_amount, dec!(20));
    assert_eq!(totals.discount, dec!(10));
    assert_eq!(totals.total, dec!(123));
}

#[test]
fn disabled_settings_keep_their_values_but_contribute_nothing() {
    let mut s = settings(dec!(13), dec!(20), dec!(10));
    s.sales_tax.status = Toggle::Disable;
    s.discount.status = Toggle::Disable;

    let items = vec![LineItemBuilder::new("Design", 1, dec!(100)).build()];
    let totals = compute_totals(&items, &s);
    assert_eq!(totals.tax_amount, dec!(0));
    assert_eq!(totals.vat_amount, dec!(20));
    assert_eq!(totals.discount, dec!(0));
    assert_eq!(totals.total, dec!(120));
    assert_eq!(s.sales_tax.rate, dec!(13));
}

#[test]
fn zero_quantity_counts_as_one() {
    let mut zero = LineItemBuilder::new("Setup", 1, dec!(10)).build();
    zero.quantity = 0;
    let items = vec![LineItemBuilder::new("Licence", 3, dec!(10)).build(), zero];

    let totals = compute_totals(&items, &InvoiceSettings::default());
    assert_eq!(totals.subtotal, dec!(40));
}

#[test]
fn malformed_price_counts_as_zero() {
    let items = vec![
        LineItemBuilder::new("Priced", 1, dec!(10)).build(),
        LineItemBuilder::new("Typo", 2, dec!(0)).unit_price_text("12,50").build(),
        LineItemBuilder::new("Negative", 1, dec!(0)).unit_price_text("-4").build(),
        LineItemBuilder::new("Blank", 1, dec!(0)).unit_price_text("").build(),
    ];
    let totals = compute_totals(&items, &InvoiceSettings::default());
    assert_eq!(totals.subtotal, dec!(10));
}

#[test]
fn discount_larger_than_subtotal_goes_negative() {
    let items = vec![LineItemBuilder::new("Small", 1, dec!(5)).build()];
    let totals = compute_totals(&items, &settings(dec!(0), dec!(0), dec!(20)));
    assert_eq!(totals.total, dec!(-15));
}

#[test]
fn rounded_totals_for_display() {
    let items = vec![LineItemBuilder::new("Item", 1, dec!(19.99)).build()];
    let s = settings(dec!(8.875), dec!(0), dec!(0));
    let totals = compute_totals(&items, &s).rounded(Decimals::Yes);
    assert_eq!(totals.tax_amount, dec!(1.77));
    assert_eq!(totals.total, dec!(21.76));
    assert_eq!(
        format_money(totals.total, Decimals::Yes, "USD"),
        "$21.76"
    );
}

// --- Line item editing ---

#[test]
fn line_item_commands_recompute() {
    let mut inv = InvoiceBuilder::new("INV-0003", date(2024, 6, 15))
        .customer(customer())
        .build_unchecked();
    assert_eq!(inv.totals().total, dec!(0));

    let a = inv.add_item().unwrap();
    inv.set_description(a, "Workshop").unwrap();
    inv.set_unit_price(a, "200").unwrap();
    assert_eq!(inv.totals().subtotal, dec!(200));

    inv.set_quantity(a, 0).unwrap();
    assert_eq!(inv.items().get(a).unwrap().quantity, 1);

    inv.increment_quantity(a).unwrap();
    inv.increment_quantity(a).unwrap();
    assert_eq!(inv.totals().subtotal, dec!(600));
    assert_eq!(inv.decrement_quantity(a).unwrap(), 2);

    let b = inv
        .add_line(LineItemBuilder::new("Travel", 1, dec!(80)).build())
        .unwrap();
    inv.move_item(b, 0).unwrap();
    assert_eq!(inv.items().position(b), Some(0));
    assert_eq!(inv.totals().subtotal, dec!(480));

    inv.remove_item(a).unwrap();
    assert_eq!(inv.totals().subtotal, dec!(80));
    assert!(matches!(
        inv.remove_item(a).unwrap_err(),
        InvoiceError::NotFound(_)
    ));
}

#[test]
fn decrement_stops_at_one() {
    let mut inv = InvoiceBuilder::new("INV-0004", date(2024, 6, 15)).build_unchecked();
    let id = inv.add_item().unwrap();
    assert_eq!(inv.decrement_quantity(id).unwrap(), 1);
    assert_eq!(inv.decrement_quantity(id).unwrap(), 1);
}

// --- Validation ---

#[test]
fn build_reports_every_failing_rule() {
    let err = InvoiceBuilder::new("", date(2024, 6, 15))
        .due_date(date(2024, 6, 1))
        .add_line(LineItemBuilder::new("", 1, dec!(0)).unit_price_text("abc").build())
        .build()
        .unwrap_err();

    let rules: Vec<_> = err.validation_errors().iter().map(|e| e.rule).collect();
    assert!(rules.contains(&ValidationRule::EmptyInvoiceNumber));
    assert!(rules.contains(&ValidationRule::MissingCustomer));
    assert!(rules.contains(&ValidationRule::EmptyDescription));
    assert!(rules.contains(&ValidationRule::InvalidUnitPrice));
    assert!(rules.contains(&ValidationRule::DueBeforeIssue));

    let price = err
        .validation_errors()
        .iter()
        .find(|e| e.rule == ValidationRule::InvalidUnitPrice)
        .unwrap();
    assert_eq!(price.field, "items[0].unit_price");
}

#[test]
fn rates_and_discount_are_checked() {
    let errors = validate_settings(&settings(dec!(120), dec!(-1), dec!(-5)));
    let rules: Vec<_> = errors.iter().map(|e| e.rule).collect();
    assert_eq!(
        rules,
        vec![
            ValidationRule::RateOutOfRange,
            ValidationRule::RateOutOfRange,
            ValidationRule::NegativeDiscount
        ]
    );
}

#[test]
fn negative_total_is_flagged() {
    let err = InvoiceBuilder::new("INV-0005", date(2024, 6, 15))
        .customer(customer())
        .settings(settings(dec!(0), dec!(0), dec!(50)))
        .add_line(LineItemBuilder::new("Small", 1, dec!(5)).build())
        .build()
        .unwrap_err();
    assert_eq!(err.validation_errors()[0].rule, ValidationRule::NegativeTotal);
}

#[test]
fn validation_error_display() {
    let err = invoice_number_taken("INV-0001");
    assert_eq!(
        err.to_string(),
        "[invoice-number-taken] invoice_number: invoice number 'INV-0001' is already in use; choose another"
    );
}

// --- Lifecycle ---

#[test]
fn lifecycle_table() {
    use InvoiceStatus::*;
    use LifecycleEvent::*;

    assert_eq!(Draft.apply(Send).unwrap(), Sent);
    assert_eq!(Sent.apply(Settle).unwrap(), Paid);
    assert_eq!(Paid.apply(Unsettle).unwrap(), Sent);
    assert_eq!(Sent.apply(Reopen).unwrap(), Draft);
    assert_eq!(Draft.apply(Cancel).unwrap(), Cancelled);

    for (from, event) in [(Paid, Cancel), (Cancelled, Send), (Draft, Settle), (Paid, Reopen)] {
        let err = from.apply(event).unwrap_err();
        assert!(matches!(err, InvoiceError::IllegalTransition { .. }), "{from} + {event}");
    }
}

#[test]
fn overdue_is_derived_on_read() {
    let due = date(2024, 7, 15);
    let balance = dec!(50);
    assert_eq!(
        display_status(InvoiceStatus::Sent, Some(due), balance, date(2024, 7, 15)),
        InvoiceStatus::Sent
    );
    assert_eq!(
        display_status(InvoiceStatus::Sent, Some(due), balance, date(2024, 7, 16)),
        InvoiceStatus::Overdue
    );
    assert_eq!(
        display_status(InvoiceStatus::Sent, Some(due), dec!(0), date(2024, 8, 1)),
        InvoiceStatus::Sent
    );
    assert_eq!(
        display_status(InvoiceStatus::Draft, Some(due), balance, date(2024, 8, 1)),
        InvoiceStatus::Draft
    );
    assert_eq!(
        display_status(InvoiceStatus::Sent, None, balance, date(2030, 1, 1)),
        InvoiceStatus::Sent
    );
}

// --- Ledger ---

#[test]
fn ledger_lists_by_date() {
    let mut ledger = PaymentLedger::new();
    let later = ledger
        .prepare(dec!(100), PaymentDraft::new(dec!(30), date(2024, 7, 1), PaymentMethod::Cash))
        .unwrap()
        .into_payment("p1");
    ledger.insert(later);
    let earlier = ledger
        .prepare(dec!(100), PaymentDraft::new(dec!(20), date(2024, 6, 1), PaymentMethod::Check))
        .unwrap()
        .into_payment("p2");
    ledger.insert(earlier);

    let snapshot = ledger.snapshot(dec!(100));
    let ids: Vec<_> = snapshot.payment_history.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p2", "p1"]);
    assert_eq!(snapshot.current_balance, dec!(50));
    assert_eq!(snapshot.available_credits, dec!(0));
}

#[test]
fn ledger_snapshot_wire_format() {
    let mut ledger = PaymentLedger::new();
    let payment = ledger
        .prepare(
            dec!(10),
            PaymentDraft::new(dec!(12.5), date(2024, 6, 20), PaymentMethod::CreditCard).memo("card"),
        )
        .unwrap()
        .into_payment("p1");
    ledger.insert(payment);

    let json = serde_json::to_value(ledger.snapshot(dec!(10))).unwrap();
    assert_eq!(json["currentBalance"], "-2.5");
    assert_eq!(json["availableCredits"], "2.5");
    assert_eq!(json["paymentHistory"][0]["method"], "credit-card");
    assert_eq!(json["paymentHistory"][0]["remainingBalance"], "0");
}

// --- Settings, formatting, numbering ---

#[test]
fn settings_resolution_order() {
    let last_used = InvoiceSettings {
        currency: "EUR".into(),
        decimals: Decimals::No,
        ..Default::default()
    };
    let workspace = SettingsOverlay {
        currency: Some("CHF".into()),
        logo: Some("https://cdn.example/logo.png".into()),
        ..Default::default()
    };

    let resolved = resolve_settings(Some(&last_used), Some(&workspace));
    assert_eq!(resolved.currency, "EUR");
    assert_eq!(resolved.decimals, Decimals::No);
    assert_eq!(resolved.logo.as_deref(), Some("https://cdn.example/logo.png"));

    let resolved = resolve_settings(None, Some(&workspace));
    assert_eq!(resolved.currency, "CHF");
    assert_eq!(resolved.date_format, "MM/DD/YYYY");
}

#[test]
fn settings_wire_format() {
    let json = serde_json::to_value(settings(dec!(13), dec!(20), dec!(10))).unwrap();
    assert_eq!(json["salesTax"]["status"], "enable");
    assert_eq!(json["salesTax"]["rate"], "13");
    assert_eq!(json["decimals"], "yes");
    assert_eq!(json["dateFormat"], "MM/DD/YYYY");
}

#[test]
fn date_and_money_formatting() {
    let s = InvoiceSettings {
        date_format: "DD.MM.YYYY".into(),
        ..Default::default()
    };
    assert_eq!(s.format_date(date(2024, 6, 5)), "05.06.2024");
    assert_eq!(format_money(dec!(1234.5), Decimals::Yes, "EUR"), "€1234.50");
    assert_eq!(format_money(dec!(-10), Decimals::Yes, "usd"), "-$10.00");
    assert_eq!(format_money(dec!(99.5), Decimals::No, "XYZ"), "XYZ100");
    assert_eq!(format_text("not a number", Decimals::Yes), "0.00");
    assert_eq!(format_f64(Some(f64::NAN), Decimals::No), "0");
}

#[test]
fn numbering_continues_from_last() {
    let mut seq = InvoiceNumberSequence::after("INV-0099");
    assert_eq!(seq.next_number(), "INV-0100");
    assert_eq!(seq.peek(), "INV-0101");
}
