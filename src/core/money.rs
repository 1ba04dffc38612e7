//! Rounding and formatting of monetary amounts.
//!
//! Every function here is total: malformed input is treated as zero and
//! nothing panics or returns an error.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::currencies::display_symbol;

/// Largest unit price or single payment amount accepted.
///
/// A line at this price with the largest possible quantity stays below
/// `1e25`, so line amounts, totals and their two-decimal rendering never
/// leave the range `Decimal` can represent exactly.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000000);

/// Whether amounts are shown with two fractional digits or as integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decimals {
    /// Two fractional digits.
    #[default]
    Yes,
    /// Whole numbers.
    No,
}

impl Decimals {
    /// Number of fractional digits this setting renders.
    pub fn places(&self) -> u32 {
        match self {
            Self::Yes => 2,
            Self::No => 0,
        }
    }
}

/// Round half-up (commercial rounding) to the places `decimals` asks for.
///
/// The result carries exactly `decimals.places()` fractional digits for
/// any `|value|` below `7.9e26`. Beyond that `Decimal` has no room for the
/// extra digits and the value is returned with as many as fit.
pub fn round_amount(value: Decimal, decimals: Decimals) -> Decimal {
    let dp = decimals.places();
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(dp);
    rounded
}

/// Format an amount: `Yes` → exactly two fractional digits, `No` → integer.
pub fn format_amount(value: Decimal, decimals: Decimals) -> String {
    round_amount(value, decimals).to_string()
}

/// Format a possibly missing or non-finite float; NaN and `None` become `0`.
pub fn format_f64(value: Option<f64>, decimals: Decimals) -> String {
    let value = value
        .and_then(|v| Decimal::try_from(v).ok())
        .unwrap_or(Decimal::ZERO);
    format_amount(value, decimals)
}

/// Format amount text as typed by a user; unparsable text becomes `0`.
pub fn format_text(text: &str, decimals: Decimals) -> String {
    format_amount(parse_amount(text).unwrap_or(Decimal::ZERO), decimals)
}

/// Format with the currency symbol in front, e.g. `€1234.50` or `-$10.00`.
pub fn format_money(value: Decimal, decimals: Decimals, currency: &str) -> String {
    let rounded = round_amount(value, decimals);
    let symbol = display_symbol(currency);
    if rounded.is_sign_negative() {
        format!("-{symbol}{}", rounded.abs())
    } else {
        format!("{symbol}{rounded}")
    }
}

/// Parse a user-entered amount. Surrounding whitespace and a leading `+`
/// are accepted; anything else that is not a plain decimal yields `None`.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Parse a unit price: a parsable amount in `0..=MAX_AMOUNT`.
///
/// Both validation and the totals calculator use this, so they agree on
/// what a valid price is.
pub fn parse_unit_price(text: &str) -> Option<Decimal> {
    parse_amount(text).filter(|v| (!v.is_sign_negative() || v.is_zero()) && *v <= MAX_AMOUNT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn two_decimals_half_up() {
        assert_eq!(format_amount(dec!(125), Decimals::Yes), "125.00");
        assert_eq!(format_amount(dec!(1.005), Decimals::Yes), "1.01");
        assert_eq!(format_amount(dec!(1.004), Decimals::Yes), "1.00");
        assert_eq!(format_amount(dec!(-2.345), Decimals::Yes), "-2.35");
    }

    #[test]
    fn unit_price_bounds() {
        assert_eq!(parse_unit_price("1000000000000000"), Some(MAX_AMOUNT));
        assert_eq!(parse_unit_price("1000000000000000.01"), None);
        assert_eq!(parse_unit_price("79228162514264337593543950335"), None);
        assert_eq!(parse_unit_price("-0"), Some(Decimal::ZERO));
    }

    #[test]
    fn largest_line_amount_keeps_two_decimals() {
        let largest = MAX_AMOUNT * Decimal::from(u32::MAX);
        let formatted = format_amount(largest, Decimals::Yes);
        assert!(formatted.ends_with(".00"), "{formatted}");
        assert_eq!(formatted, "4294967295000000000000000.00");

        let beyond = format_amount(Decimal::MAX, Decimals::Yes);
        assert!(beyond.starts_with("79228162514264337593543950335"), "{beyond}");
    }

    #[test]
    fn integer_rounding() {
        assert_eq!(format_amount(dec!(122.5), Decimals::No), "123");
        assert_eq!(format_amount(dec!(122.49), Decimals::No), "122");
        assert_eq!(format_amount(dec!(7.00), Decimals::No), "7");
    }

    #[test]
    fn negative_zero_is_normalized() {
        assert_eq!(format_amount(dec!(-0.001), Decimals::Yes), "0.00");
        assert_eq!(format_amount(dec!(-0.4), Decimals::No), "0");
    }

    #[test]
    fn nan_and_missing_become_zero() {
        assert_eq!(format_f64(Some(f64::NAN), Decimals::Yes), "0.00");
        assert_eq!(format_f64(None, Decimals::No), "0");
        assert_eq!(format_f64(Some(19.999), Decimals::Yes), "20.00");
    }

    #[test]
    fn text_input() {
        assert_eq!(format_text(" 12.5 ", Decimals::Yes), "12.50");
        assert_eq!(format_text("abc", Decimals::Yes), "0.00");
        assert_eq!(format_text("", Decimals::No), "0");
    }

    #[test]
    fn unit_price_parsing() {
        assert_eq!(parse_unit_price("50"), Some(dec!(50)));
        assert_eq!(parse_unit_price("+0.5"), Some(dec!(0.5)));
        assert_eq!(parse_unit_price("0"), Some(dec!(0)));
        assert_eq!(parse_unit_price("-1"), None);
        assert_eq!(parse_unit_price("1,5"), None);
        assert_eq!(parse_unit_price("   "), None);
    }

    #[test]
    fn money_with_symbol() {
        assert_eq!(format_money(dec!(1234.5), Decimals::Yes, "EUR"), "€1234.50");
        assert_eq!(format_money(dec!(-10), Decimals::Yes, "USD"), "-$10.00");
        assert_eq!(format_money(dec!(99.6), Decimals::No, "kr"), "kr100");
    }
}
