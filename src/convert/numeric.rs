//! Integer and fraction grammars shared by the EXIF, IPTC and XMP rules.

use crate::error::{Error, Result};
use crate::rational::Rational;
use crate::value::Value;

/// Parse a base-10 integer: an optional leading sign followed by digits only.
///
/// Rejects empty input, separators, decimal points, exponents, and a sign
/// anywhere but the first position.
pub(crate) fn parse_integer(target: &str, raw: &str) -> Result<i64> {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::conversion(target, raw));
    }
    raw.parse::<i64>().map_err(|_| Error::conversion(target, raw))
}

/// Parse an integer and check it against `[min, max]`. Unsigned ranges
/// take no `-` at all, so `-0` is rejected too.
pub(crate) fn parse_in_range(target: &str, raw: &str, min: i64, max: i64) -> Result<i64> {
    if min >= 0 && raw.starts_with('-') {
        return Err(Error::conversion(target, raw));
    }
    let n = parse_integer(target, raw)?;
    if n < min || n > max {
        return Err(Error::conversion(target, raw));
    }
    Ok(n)
}

/// Format an integer value that must fall in `[min, max]`.
pub(crate) fn format_in_range(target: &str, value: &Value, min: i64, max: i64) -> Result<String> {
    match value {
        Value::Integer(n) if (min..=max).contains(n) => Ok(n.to_string()),
        other => Err(Error::conversion(target, other.to_string())),
    }
}

/// Parse `<num>/<den>` with no surrounding whitespace and a positive
/// denominator. Only the numerator may carry a `-`, and only when `signed`.
pub(crate) fn parse_fraction(target: &str, raw: &str, signed: bool) -> Result<Rational> {
    let err = || Error::conversion(target, raw);
    let (num, den) = raw.split_once('/').ok_or_else(err)?;

    let num_digits = match num.strip_prefix('-') {
        Some(rest) if signed => rest,
        Some(_) => return Err(err()),
        None => num,
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(num_digits) || !all_digits(den) {
        return Err(err());
    }

    let numerator = num.parse::<i64>().map_err(|_| err())?;
    let denominator = den.parse::<i64>().map_err(|_| err())?;
    if denominator <= 0 {
        return Err(err());
    }
    Rational::new(numerator, denominator)
}

/// Format a fraction value; unsigned targets reject any negative component.
pub(crate) fn format_fraction(target: &str, value: &Value, signed: bool) -> Result<String> {
    match value {
        Value::Rational(r) if r.denominator() > 0 && (signed || r.numerator() >= 0) => {
            Ok(r.to_string())
        }
        other => Err(Error::conversion(target, other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── parse_integer ─────────────────────────────────────────────────

    #[test]
    fn integer_accepts_signs() {
        assert_eq!(parse_integer("t", "8").unwrap(), 8);
        assert_eq!(parse_integer("t", "+5628").unwrap(), 5628);
        assert_eq!(parse_integer("t", "-437").unwrap(), -437);
    }

    #[test]
    fn integer_rejects_malformed() {
        for raw in ["", "+", "abc", "5,64", "47.0001", "1E3", "1-2", "+-3", " 4", "4 "] {
            assert!(parse_integer("t", raw).is_err(), "expected failure for {raw:?}");
        }
    }

    #[test]
    fn integer_range() {
        assert_eq!(parse_in_range("Short", "65535", 0, 65535).unwrap(), 65535);
        assert!(parse_in_range("Short", "65536", 0, 65535).is_err());
        assert!(parse_in_range("Short", "-1", 0, 65535).is_err());
        assert!(parse_in_range("Short", "-0", 0, 65535).is_err());
        assert_eq!(parse_in_range("Short", "+0", 0, 65535).unwrap(), 0);
        assert_eq!(parse_in_range("SLong", "-0", i64::from(i32::MIN), i64::from(i32::MAX)).unwrap(), 0);
        assert!(parse_in_range("t", "99999999999999999999", 0, i64::MAX).is_err());
    }

    // ── parse_fraction ────────────────────────────────────────────────

    #[test]
    fn fraction_unsigned() {
        assert_eq!(parse_fraction("Rational", "5/3", false).unwrap(), Rational::new(5, 3).unwrap());
        for raw in ["invalid", "-5/3", "5 / 3", "5/-3", "5/0", "5/3/2", "/3", "5/"] {
            assert!(parse_fraction("Rational", raw, false).is_err(), "expected failure for {raw:?}");
        }
    }

    #[test]
    fn fraction_signed() {
        assert_eq!(
            parse_fraction("SRational", "-5/3", true).unwrap(),
            Rational::new(-5, 3).unwrap()
        );
        assert!(parse_fraction("SRational", "5/-3", true).is_err());
        assert!(parse_fraction("SRational", "5 / 3", true).is_err());
    }

    #[test]
    fn fraction_format() {
        let neg = Value::Rational(Rational::new(-5, 3).unwrap());
        assert!(format_fraction("Rational", &neg, false).is_err());
        assert_eq!(format_fraction("SRational", &neg, true).unwrap(), "-5/3");
        assert!(format_fraction("Rational", &Value::from("invalid"), false).is_err());
    }
}
