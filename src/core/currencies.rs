//! Currency code → display symbol lookup.
//!
//! Invoice settings store the currency either as an ISO 4217 code ("EUR")
//! or directly as a symbol ("€"). Known codes map to their symbol; anything
//! else is displayed as given.

/// Symbol for a known ISO 4217 code.
pub fn symbol_for_code(code: &str) -> Option<&'static str> {
    CURRENCY_SYMBOLS
        .binary_search_by_key(&code, |&(c, _)| c)
        .ok()
        .map(|i| CURRENCY_SYMBOLS[i].1)
}

/// Check whether `code` is a known ISO 4217 currency code.
pub fn is_known_currency_code(code: &str) -> bool {
    symbol_for_code(code).is_some()
}

/// Display symbol for a currency setting (code or symbol).
pub fn display_symbol(currency: &str) -> &str {
    let trimmed = currency.trim();
    symbol_for_code(&trimmed.to_ascii_uppercase()).unwrap_or(trimmed)
}

/// Sorted by code for binary search.
static CURRENCY_SYMBOLS: &[(&str, &str)] = &[
    ("AED", "AED"),
    ("AUD", "A$"),
    ("BRL", "R$"),
    ("CAD", "C$"),
    ("CHF", "CHF"),
    ("CNY", "¥"),
    ("CZK", "Kč"),
    ("DKK", "kr"),
    ("EUR", "€"),
    ("GBP", "£"),
    ("HKD", "HK$"),
    ("HUF", "Ft"),
    ("IDR", "Rp"),
    ("ILS", "₪"),
    ("INR", "₹"),
    ("JPY", "¥"),
    ("KRW", "₩"),
    ("MXN", "MX$"),
    ("MYR", "RM"),
    ("NGN", "₦"),
    ("NOK", "kr"),
    ("NZD", "NZ$"),
    ("PHP", "₱"),
    ("PLN", "zł"),
    ("SEK", "kr"),
    ("SGD", "S$"),
    ("THB", "฿"),
    ("TRY", "₺"),
    ("UAH", "₴"),
    ("USD", "$"),
    ("VND", "₫"),
    ("ZAR", "R"),
];
