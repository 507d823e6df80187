//! Money and number formatting.
//!
//! Monetary values travel through the document as strings. They are parsed
//! into exact decimals for arithmetic and formatted back exactly once, at
//! the edge, using en-US digit grouping.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Decimal places kept for stored monetary amounts
pub const MONEY_SCALE: u32 = 2;

/// Maximum fraction digits shown by [`format_number`]
const DISPLAY_FRACTION_DIGITS: u32 = 3;

/// Parses a possibly grouped decimal string (`"1,234.50"`)
///
/// Returns `None` for blank or non-numeric input.
pub fn parse_decimal(input: &str) -> Option<Decimal> {
    let cleaned: String = input.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Parses a grouped string back to a number, treating anything unparseable as zero
pub fn parse_formatted_number(input: &str) -> Decimal {
    parse_decimal(input).unwrap_or(Decimal::ZERO)
}

/// Rounds to two decimal places, halves away from zero
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats a value as a fixed two-decimal string without grouping (`"1234.50"`)
///
/// This is the storage form used for `amount` and `totalAmount`.
pub fn to_fixed(value: Decimal) -> String {
    let mut rounded = round_money(value);
    rounded.rescale(MONEY_SCALE);
    rounded.to_string()
}

/// True when `value` can be stored as a fixed two-decimal amount
pub fn fits_money(value: Decimal) -> bool {
    let mut rounded = round_money(value);
    rounded.rescale(MONEY_SCALE);
    rounded.scale() == MONEY_SCALE
}

/// Sums `values`, returning `None` on overflow
pub fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Option<Decimal> {
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, value| acc.checked_add(value))
}

/// Sums `values`, clamping at the representable range instead of overflowing
pub fn saturating_sum<I: IntoIterator<Item = Decimal>>(values: I) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, value| acc.saturating_add(value))
}

/// Formats a number with grouping separators and up to three fraction digits
///
/// Trailing fraction zeros are dropped: `1234.50` becomes `"1,234.5"`.
pub fn format_number(value: Decimal) -> String {
    let rounded = value
        .round_dp_with_strategy(DISPLAY_FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    group(&rounded.to_string())
}

/// Formats a monetary value for display: `$1,234.50`
pub fn format_money(value: Decimal) -> String {
    let fixed = to_fixed(value);
    match fixed.strip_prefix('-') {
        Some(unsigned) => format!("-${}", group(unsigned)),
        None => format!("${}", group(&fixed)),
    }
}

/// Inserts thousands separators into the integer part of a plain decimal string
fn group(plain: &str) -> String {
    let (sign, unsigned) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (unsigned, None),
    };

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("1,234.50"), Some(dec("1234.50")));
        assert_eq!(parse_decimal("  42 "), Some(dec("42")));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("   "), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn test_parse_formatted_number_defaults_to_zero() {
        assert_eq!(parse_formatted_number("12,000"), dec("12000"));
        assert_eq!(parse_formatted_number("n/a"), Decimal::ZERO);
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec("38.985")), dec("38.99"));
        assert_eq!(round_money(dec("0.005")), dec("0.01"));
        assert_eq!(round_money(dec("2.004")), dec("2.00"));
    }

    #[test]
    fn test_sums_do_not_overflow() {
        let values = [Decimal::MAX, Decimal::ONE];
        assert_eq!(checked_sum(values), None);
        assert_eq!(saturating_sum(values), Decimal::MAX);
        assert_eq!(checked_sum([dec("1.50"), dec("2.25")]), Some(dec("3.75")));
    }

    #[test]
    fn test_fits_money() {
        assert!(fits_money(dec("1234567.89")));
        assert!(fits_money(dec("0.005")));
        assert!(!fits_money(Decimal::MAX));
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(dec("5")), "5.00");
        assert_eq!(to_fixed(dec("12.5")), "12.50");
        assert_eq!(to_fixed(dec("38.985")), "38.99");
        assert_eq!(to_fixed(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(dec("1234.50")), "1,234.5");
        assert_eq!(format_number(dec("1000000")), "1,000,000");
        assert_eq!(format_number(dec("999")), "999");
        assert_eq!(format_number(dec("0.1234")), "0.123");
        assert_eq!(format_number(dec("-4500")), "-4,500");
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(dec("1234.5")), "$1,234.50");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
        assert_eq!(format_money(dec("-1200")), "-$1,200.00");
    }

    #[test]
    fn test_format_then_parse() {
        let value = dec("98765.43");
        assert_eq!(parse_formatted_number(&format_number(value)), value);
    }
}
