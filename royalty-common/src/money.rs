//! Exact decimal helpers for royalty amounts
//!
//! All monetary values are [`Decimal`]s. Parsing never fails: anything that
//! cannot be read as a number degrades to zero, so a malformed cell in a
//! statement can never poison a running total.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Fractional digits kept for distribution percentages and per-stream rates
pub const RATIO_SCALE: u32 = 6;

/// Fractional digits kept for currency amounts shown to users
pub const CURRENCY_SCALE: u32 = 2;

/// Parse a currency amount as it appears in a royalty export.
///
/// Accepts thousands separators, currency glyphs and codes (`$1,234.50`,
/// `EUR 12.00`, `£3`) and scientific notation. Amounts are non-negative:
/// negatives, including accounting negatives (`(12.50)`), contribute `0`.
/// Blank, unreadable or out-of-range input yields `0`.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    if let Ok(value) = Decimal::from_str(trimmed) {
        return non_negative(value);
    }

    if trimmed.starts_with('(') && trimmed.ends_with(')') {
        return Decimal::ZERO;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == 'e' || *c == 'E')
        .collect();

    let value = if let Ok(value) = Decimal::from_str(&cleaned) {
        value
    } else if has_exponent(&cleaned) {
        Decimal::from_scientific(&cleaned).unwrap_or(Decimal::ZERO)
    } else {
        // Letters from currency codes ("EUR", "Euro") can leave a stray 'e' behind
        let digits: String = cleaned.chars().filter(|c| !matches!(c, 'e' | 'E')).collect();
        Decimal::from_str(&digits).unwrap_or(Decimal::ZERO)
    };

    non_negative(value)
}

/// `<mantissa>e<exponent>` with digits on both sides of the `e`
fn has_exponent(cleaned: &str) -> bool {
    let Some(pos) = cleaned.find(|c| c == 'e' || c == 'E') else {
        return false;
    };
    let mantissa = &cleaned[..pos];
    let exponent = &cleaned[pos + 1..];
    let exponent = exponent.strip_prefix('-').unwrap_or(exponent);

    mantissa.bytes().any(|b| b.is_ascii_digit())
        && !exponent.is_empty()
        && exponent.bytes().all(|b| b.is_ascii_digit())
}

fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Parse a usage count as a non-negative integer.
///
/// Thousands separators are ignored; a decimal count is truncated. Negative
/// or non-numeric input yields `0`.
pub fn parse_count(raw: &str) -> u64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();

    if cleaned.is_empty() {
        return 0;
    }

    if let Ok(count) = cleaned.parse::<u64>() {
        return count;
    }

    match Decimal::from_str(&cleaned) {
        Ok(value) if value > Decimal::ZERO => value.trunc().to_u64().unwrap_or(0),
        _ => 0,
    }
}

/// Round half away from zero to `scale` fractional digits
pub fn round_to(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

/// Divide, yielding `0` for a zero denominator or an overflowing quotient
pub fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
}

/// Lossy conversion for JSON number output (values are already rounded)
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_sum_is_exact() {
        let total = parse_amount("10.10") + parse_amount("20.20") + parse_amount("0.003");
        assert_eq!(total, dec("30.303"));
        assert_eq!(total.to_string(), "30.303");
    }

    #[test]
    fn test_parse_amount_strips_decorations() {
        assert_eq!(parse_amount("$1,234.50"), dec("1234.50"));
        assert_eq!(parse_amount(" £3 "), dec("3"));
        assert_eq!(parse_amount("EUR 12.00"), dec("12.00"));
        assert_eq!(parse_amount("12.00 €"), dec("12.00"));
        assert_eq!(parse_amount("12.00 EUR"), dec("12.00"));
        assert_eq!(parse_amount("Euro 3.50"), dec("3.50"));
        assert_eq!(parse_amount("1.5e2"), dec("150"));
        assert_eq!(parse_amount("2.5E-3"), dec("0.0025"));
    }

    #[test]
    fn test_negative_amounts_contribute_zero() {
        assert_eq!(parse_amount("(7.25)"), Decimal::ZERO);
        assert_eq!(parse_amount("($7.25)"), Decimal::ZERO);
        assert_eq!(parse_amount("-0.5"), Decimal::ZERO);
        assert_eq!(parse_amount("-$1,200.00"), Decimal::ZERO);
        assert_eq!(parse_amount("-1e2"), Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_exponent_is_zero() {
        assert_eq!(parse_amount("1e100"), Decimal::ZERO);
        assert_eq!(parse_amount("2.5E40"), Decimal::ZERO);
        assert_eq!(parse_amount("$1e100"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_amount_degrades_to_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("   "), Decimal::ZERO);
        assert_eq!(parse_amount("abc"), Decimal::ZERO);
        assert_eq!(parse_amount("N/A"), Decimal::ZERO);
        assert_eq!(parse_amount("1.2.3"), Decimal::ZERO);
        assert_eq!(parse_amount("$"), Decimal::ZERO);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count("42"), 42);
        assert_eq!(parse_count("1,024"), 1024);
        assert_eq!(parse_count(" 7 "), 7);
        assert_eq!(parse_count("12.9"), 12);
        assert_eq!(parse_count("abc"), 0);
        assert_eq!(parse_count("-5"), 0);
        assert_eq!(parse_count(""), 0);
    }

    #[test]
    fn test_round_to_half_away_from_zero() {
        assert_eq!(round_to(dec("0.6666666"), RATIO_SCALE), dec("0.666667"));
        assert_eq!(round_to(dec("2.345"), CURRENCY_SCALE), dec("2.35"));
        assert_eq!(round_to(dec("-2.345"), CURRENCY_SCALE), dec("-2.35"));
    }

    #[test]
    fn test_ratio_guards_zero_denominator() {
        assert_eq!(ratio(dec("10"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ratio(dec("1"), dec("4")), dec("0.25"));
    }
}
