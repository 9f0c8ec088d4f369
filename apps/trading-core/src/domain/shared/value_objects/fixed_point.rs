//! Shared machinery for the integer-backed fixed-point value types.
//!
//! `Price` and `Quantity` store a scaled integer plus a decimal precision;
//! parsing, formatting, and rounding live here so both types agree on the
//! rules.

use std::cmp::Ordering;

/// Maximum supported decimal precision for fixed-point values.
pub const FIXED_PRECISION_MAX: u8 = 9;

/// `10^precision` as `i64`. Valid for `precision <= FIXED_PRECISION_MAX`.
pub(crate) const fn pow10_i64(precision: u8) -> i64 {
    10i64.pow(precision as u32)
}

/// `10^precision` as `u64`. Valid for `precision <= FIXED_PRECISION_MAX`.
pub(crate) const fn pow10_u64(precision: u8) -> u64 {
    10u64.pow(precision as u32)
}

/// `10^precision` as `i128`. Valid for `precision <= 2 * FIXED_PRECISION_MAX`.
pub(crate) const fn pow10_i128(precision: u8) -> i128 {
    10i128.pow(precision as u32)
}

/// Integer division rounding half to even (banker's rounding).
///
/// The denominator must be positive.
pub(crate) fn div_half_even(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder == 0 {
        return quotient;
    }
    let bump = match (remainder.unsigned_abs() * 2).cmp(&denominator.unsigned_abs()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        // Tie: round so the quotient ends up even.
        Ordering::Equal => quotient % 2 != 0,
    };
    if bump {
        if numerator < 0 {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

/// Parse a displayed decimal form (e.g., `"-1.2345"`) into a scaled integer
/// and its precision.
///
/// The precision is the number of digits after the decimal point.
pub(crate) fn parse_fixed(s: &str) -> Result<(i128, u8), String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty string".to_string());
    }

    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(format!("'{s}' is not a decimal number"));
    }
    if !int_part.chars().all(|c| c.is_ascii_digit())
        || !frac_part.chars().all(|c| c.is_ascii_digit())
    {
        return Err(format!("'{s}' is not a decimal number"));
    }

    let precision = frac_part.len();
    if precision > usize::from(FIXED_PRECISION_MAX) {
        return Err(format!(
            "precision {precision} exceeds maximum {FIXED_PRECISION_MAX}"
        ));
    }
    #[allow(clippy::cast_possible_truncation)]
    let precision = precision as u8;

    let mut raw: i128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        raw = raw
            .checked_mul(10)
            .and_then(|v| v.checked_add(i128::from(c as u8 - b'0')))
            .ok_or_else(|| format!("'{s}' is out of range"))?;
    }
    if negative {
        raw = -raw;
    }

    Ok((raw, precision))
}

/// Format a scaled integer at the given precision into its displayed form.
pub(crate) fn format_fixed(
    raw: i128,
    precision: u8,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    let abs = raw.unsigned_abs();
    let sign = if raw < 0 { "-" } else { "" };
    if precision == 0 {
        return write!(f, "{sign}{abs}");
    }
    let scale = pow10_i128(precision).unsigned_abs();
    let int_part = abs / scale;
    let frac_part = abs % scale;
    write!(
        f,
        "{sign}{int_part}.{frac_part:0width$}",
        width = usize::from(precision)
    )
}

/// Reduce a scaled integer to its canonical form by stripping trailing
/// decimal zeros. Used to keep `Hash` consistent with precision-insensitive
/// equality.
pub(crate) fn canonicalize(mut raw: i128, mut precision: u8) -> (i128, u8) {
    while precision > 0 && raw % 10 == 0 {
        raw /= 10;
        precision -= 1;
    }
    (raw, precision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple() {
        assert_eq!(parse_fixed("1.2345").unwrap(), (12345, 4));
        assert_eq!(parse_fixed("100").unwrap(), (100, 0));
        assert_eq!(parse_fixed("-0.5").unwrap(), (-5, 1));
        assert_eq!(parse_fixed("+2.50").unwrap(), (250, 2));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_fixed("").is_err());
        assert!(parse_fixed("abc").is_err());
        assert!(parse_fixed("1.2.3").is_err());
        assert!(parse_fixed(".").is_err());
        assert!(parse_fixed("1e5").is_err());
    }

    #[test]
    fn parse_rejects_excess_precision() {
        assert!(parse_fixed("0.1234567890").is_err());
        assert!(parse_fixed("0.123456789").is_ok());
    }

    #[test]
    fn div_half_even_ties_go_to_even() {
        assert_eq!(div_half_even(25, 10), 2);
        assert_eq!(div_half_even(35, 10), 4);
        assert_eq!(div_half_even(-25, 10), -2);
        assert_eq!(div_half_even(-35, 10), -4);
    }

    #[test]
    fn div_half_even_non_ties() {
        assert_eq!(div_half_even(26, 10), 3);
        assert_eq!(div_half_even(24, 10), 2);
        assert_eq!(div_half_even(-26, 10), -3);
    }

    #[test]
    fn canonicalize_strips_trailing_zeros() {
        assert_eq!(canonicalize(1000, 3), (1, 0));
        assert_eq!(canonicalize(1010, 3), (101, 1));
        assert_eq!(canonicalize(0, 5), (0, 0));
        assert_eq!(canonicalize(7, 0), (7, 0));
    }
}
