//! XMP value kinds and their raw/native conversion rules.
//!
//! XMP conversion dispatches first on the structural kind of a property
//! (simple, array or language alternative) and then on the scalar type of
//! its items.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::iptc::{format_offset, parse_offset};
use super::numeric::{format_fraction, parse_fraction, parse_integer};
use crate::error::{Error, Result};
use crate::value::Value;

/// Scalar XMP value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XmpType {
    /// Text, including proper names, URIs and locales.
    Text,
    Boolean,
    Integer,
    Rational,
    Date,
    MimeType,
}

/// The structural kind of an XMP property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum XmpKind {
    Simple(XmpType),
    Bag(XmpType),
    Seq(XmpType),
    Alt(XmpType),
    LangAlt,
}

/// The raw form of an XMP property as stored by the image accessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XmpRawValue {
    Text(String),
    Array(Vec<String>),
    LangAlt(BTreeMap<String, String>),
}

impl fmt::Display for XmpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Display for XmpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            XmpKind::Simple(t) => write!(f, "{t}"),
            XmpKind::Bag(t) => write!(f, "bag {t}"),
            XmpKind::Seq(t) => write!(f, "seq {t}"),
            XmpKind::Alt(t) => write!(f, "alt {t}"),
            XmpKind::LangAlt => f.write_str("Lang Alt"),
        }
    }
}

impl XmpKind {
    /// Infer a kind from a raw value's shape, for keys outside the registry.
    pub fn infer(raw: &XmpRawValue) -> Self {
        match raw {
            XmpRawValue::Text(_) => XmpKind::Simple(XmpType::Text),
            XmpRawValue::Array(_) => XmpKind::Bag(XmpType::Text),
            XmpRawValue::LangAlt(_) => XmpKind::LangAlt,
        }
    }

    /// True if `value` has the structural shape this kind expects.
    ///
    /// Only the outer shape is checked; item types are the converter's job.
    pub fn accepts_shape(&self, value: &Value) -> bool {
        match (self, value) {
            (XmpKind::LangAlt, Value::LangAlt(_)) => true,
            (XmpKind::Bag(_) | XmpKind::Seq(_) | XmpKind::Alt(_), Value::Array(_)) => true,
            (XmpKind::Simple(t), v) => scalar_shape_matches(*t, v),
            _ => false,
        }
    }
}

fn scalar_shape_matches(t: XmpType, value: &Value) -> bool {
    matches!(
        (t, value),
        (XmpType::Text, Value::Text(_))
            | (XmpType::Boolean, Value::Boolean(_))
            | (XmpType::Integer, Value::Integer(_))
            | (XmpType::Rational, Value::Rational(_))
            | (XmpType::Date, Value::Date(_) | Value::DateTime(_) | Value::ZonedDateTime(_))
            | (XmpType::MimeType, Value::MimeType { .. })
    )
}

/// Convert a raw XMP property to its native value.
pub fn to_native(kind: XmpKind, raw: &XmpRawValue) -> Result<Value> {
    match (kind, raw) {
        (XmpKind::Simple(t), XmpRawValue::Text(s)) => scalar_to_native(t, s),
        (XmpKind::Bag(t) | XmpKind::Seq(t) | XmpKind::Alt(t), XmpRawValue::Array(items)) => items
            .iter()
            .map(|item| scalar_to_native(t, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        (XmpKind::LangAlt, XmpRawValue::LangAlt(map)) => Ok(Value::LangAlt(map.clone())),
        (kind, raw) => Err(Error::conversion(kind.to_string(), format!("{raw:?}"))),
    }
}

/// Convert a native value to the raw XMP form for `kind`.
pub fn to_raw(kind: XmpKind, value: &Value) -> Result<XmpRawValue> {
    match (kind, value) {
        (XmpKind::Simple(t), v) => scalar_to_raw(t, v).map(XmpRawValue::Text),
        (XmpKind::Bag(t) | XmpKind::Seq(t) | XmpKind::Alt(t), Value::Array(items)) => items
            .iter()
            .map(|item| scalar_to_raw(t, item))
            .collect::<Result<Vec<_>>>()
            .map(XmpRawValue::Array),
        (XmpKind::LangAlt, Value::LangAlt(map)) => {
            if map.keys().any(|lang| lang.trim().is_empty()) {
                return Err(Error::conversion(kind.to_string(), value.to_string()));
            }
            Ok(XmpRawValue::LangAlt(map.clone()))
        }
        (kind, other) => Err(Error::conversion(kind.to_string(), other.to_string())),
    }
}

fn scalar_to_native(t: XmpType, raw: &str) -> Result<Value> {
    let err = || Error::conversion(t.to_string(), raw);
    match t {
        XmpType::Text => Ok(Value::Text(raw.to_string())),
        XmpType::Boolean => match raw {
            "True" => Ok(Value::Boolean(true)),
            "False" => Ok(Value::Boolean(false)),
            _ => Err(err()),
        },
        XmpType::Integer => parse_integer(&t.to_string(), raw).map(Value::Integer),
        XmpType::Rational => parse_fraction(&t.to_string(), raw, true).map(Value::Rational),
        XmpType::Date => parse_date(raw).ok_or_else(err),
        XmpType::MimeType => match raw.split_once('/') {
            Some((kind, subtype)) if is_token(kind) && is_token(subtype) => Ok(Value::mime_type(kind, subtype)),
            _ => Err(err()),
        },
    }
}

fn scalar_to_raw(t: XmpType, value: &Value) -> Result<String> {
    let target = t.to_string();
    match (t, value) {
        (XmpType::Text, Value::Text(s)) => Ok(s.clone()),
        (XmpType::Boolean, Value::Boolean(b)) => Ok(if *b { "True" } else { "False" }.to_string()),
        (XmpType::Integer, Value::Integer(i)) => Ok(i.to_string()),
        (XmpType::Rational, v) => format_fraction(&target, v, true),
        (XmpType::Date, Value::Date(d)) => Ok(d.format("%Y-%m-%d").to_string()),
        (XmpType::Date, Value::DateTime(dt)) => Ok(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
        (XmpType::Date, Value::ZonedDateTime(dt)) => {
            let zone = match dt.offset().local_minus_utc() {
                0 => "Z".to_string(),
                _ => format_offset(dt.offset()),
            };
            Ok(format!("{}{zone}", dt.format("%Y-%m-%dT%H:%M:%S")))
        }
        (XmpType::MimeType, Value::MimeType { kind, subtype }) if is_token(kind) && is_token(subtype) => {
            Ok(format!("{kind}/{subtype}"))
        }
        (_, other) => Err(Error::conversion(target, other.to_string())),
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty() && !s.contains('/') && !s.chars().any(char::is_whitespace)
}

/// XMP dates: `YYYY`, `YYYY-MM`, `YYYY-MM-DD`, then
/// `YYYY-MM-DDThh:mm[:ss[.s+]]` with an optional `Z` or `±hh:mm` suffix.
fn parse_date(raw: &str) -> Option<Value> {
    let Some((day, clock)) = raw.split_once('T') else {
        return parse_partial_date(raw).map(Value::Date);
    };
    let day = NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()?;

    let (clock, zone) = if let Some(clock) = clock.strip_suffix('Z') {
        (clock, Some("+00:00"))
    } else {
        match clock.find(['+', '-']) {
            Some(pos) => {
                let (clock, zone) = clock.split_at(pos);
                (clock, Some(zone))
            }
            None => (clock, None),
        }
    };

    let time = ["%H:%M:%S%.f", "%H:%M"]
        .iter()
        .find_map(|format| chrono::NaiveTime::parse_from_str(clock, format).ok())?;
    let naive = NaiveDateTime::new(day, time);

    match zone {
        None => Some(Value::DateTime(naive)),
        Some(zone) => {
            let offset = parse_offset(zone)?;
            let zoned: DateTime<chrono::FixedOffset> = naive.and_local_timezone(offset).single()?;
            Some(Value::ZonedDateTime(zoned))
        }
    }
}

fn parse_partial_date(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split('-');
    let year = parts.next().filter(|y| y.len() == 4)?.parse::<i32>().ok()?;
    let mut field = |default: u32| -> Option<u32> {
        match parts.next() {
            None => Some(default),
            Some(p) if p.len() == 2 => p.parse().ok(),
            Some(_) => None,
        }
    };
    let month = field(1)?;
    let day = field(1)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rational::Rational;
    use chrono::{FixedOffset, TimeZone};

    fn text(s: &str) -> XmpRawValue {
        XmpRawValue::Text(s.to_string())
    }

    // ── simple values ─────────────────────────────────────────────────

    #[test]
    fn simple_scalars() {
        let simple = XmpKind::Simple;
        assert_eq!(to_native(simple(XmpType::Text), &text("hello")).unwrap(), Value::from("hello"));
        assert_eq!(to_native(simple(XmpType::Boolean), &text("True")).unwrap(), Value::from(true));
        assert!(to_native(simple(XmpType::Boolean), &text("yes")).is_err());
        assert_eq!(to_native(simple(XmpType::Integer), &text("-12")).unwrap(), Value::from(-12));
        assert!(to_native(simple(XmpType::Integer), &text("1.5")).is_err());
        assert_eq!(
            to_native(simple(XmpType::Rational), &text("-1/3")).unwrap(),
            Value::from(Rational::new(-1, 3).unwrap())
        );
        assert_eq!(
            to_native(simple(XmpType::MimeType), &text("image/jpeg")).unwrap(),
            Value::mime_type("image", "jpeg")
        );
        assert!(to_native(simple(XmpType::MimeType), &text("image")).is_err());
        assert_eq!(
            to_raw(simple(XmpType::MimeType), &Value::mime_type("image", "png")).unwrap(),
            text("image/png")
        );
        assert_eq!(to_raw(simple(XmpType::Boolean), &Value::from(false)).unwrap(), text("False"));
    }

    #[test]
    fn dates() {
        let date = |y, m, d| Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap());
        let kind = XmpKind::Simple(XmpType::Date);
        assert_eq!(to_native(kind, &text("2009")).unwrap(), date(2009, 1, 1));
        assert_eq!(to_native(kind, &text("2009-03")).unwrap(), date(2009, 3, 1));
        assert_eq!(to_native(kind, &text("2009-03-20")).unwrap(), date(2009, 3, 20));
        assert!(to_native(kind, &text("2009-13")).is_err());
        assert!(to_native(kind, &text("09-03-20")).is_err());

        let naive = to_native(kind, &text("2009-03-20T20:32:00")).unwrap();
        assert!(matches!(naive, Value::DateTime(_)));
        assert_eq!(to_raw(kind, &naive).unwrap(), text("2009-03-20T20:32:00"));

        let zoned = to_native(kind, &text("2009-03-20T20:32:00+01:00")).unwrap();
        let expected = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2009, 3, 20, 20, 32, 0)
            .unwrap();
        assert_eq!(zoned, Value::ZonedDateTime(expected));
        assert_eq!(to_raw(kind, &zoned).unwrap(), text("2009-03-20T20:32:00+01:00"));

        let utc = to_native(kind, &text("2009-03-20T20:32Z")).unwrap();
        assert_eq!(to_raw(kind, &utc).unwrap(), text("2009-03-20T20:32:00Z"));
        assert!(to_native(kind, &text("2009-03-20T25:00Z")).is_err());
    }

    // ── structures ────────────────────────────────────────────────────

    #[test]
    fn arrays() {
        let kind = XmpKind::Bag(XmpType::Text);
        let raw = XmpRawValue::Array(vec!["image".into(), "test".into()]);
        let native = to_native(kind, &raw).unwrap();
        assert_eq!(native, Value::array(["image", "test"]));
        assert_eq!(to_raw(kind, &native).unwrap(), raw);

        let seq = XmpKind::Seq(XmpType::Integer);
        assert!(to_native(seq, &XmpRawValue::Array(vec!["1".into(), "x".into()])).is_err());
        assert!(to_raw(seq, &Value::array(["1"])).is_err());
        assert!(to_raw(kind, &Value::from("image")).is_err());
    }

    #[test]
    fn lang_alts() {
        let value = Value::lang_alt([("x-default", "This is not a title"), ("fr-FR", "Ceci n'est pas un titre")]);
        let raw = to_raw(XmpKind::LangAlt, &value).unwrap();
        assert!(matches!(&raw, XmpRawValue::LangAlt(map) if map.len() == 2));
        assert_eq!(to_native(XmpKind::LangAlt, &raw).unwrap(), value);
        assert!(to_raw(XmpKind::LangAlt, &Value::lang_alt([("", "blank")])).is_err());
        assert!(to_native(XmpKind::LangAlt, &text("plain")).is_err());
    }

    #[test]
    fn shapes() {
        assert!(XmpKind::Bag(XmpType::Text).accepts_shape(&Value::array(["a"])));
        assert!(!XmpKind::Bag(XmpType::Text).accepts_shape(&Value::from("a")));
        let dt = NaiveDate::from_ymd_opt(2009, 4, 21).unwrap().and_hms_opt(20, 11, 0).unwrap();
        assert!(!XmpKind::Bag(XmpType::Text).accepts_shape(&Value::DateTime(dt)));
        assert!(XmpKind::Simple(XmpType::Date).accepts_shape(&Value::DateTime(dt)));
        assert!(XmpKind::LangAlt.accepts_shape(&Value::lang_alt([("x-default", "t")])));
        assert_eq!(XmpKind::infer(&text("x")), XmpKind::Simple(XmpType::Text));
        assert_eq!(XmpKind::Seq(XmpType::Date).to_string(), "seq Date");
    }
}
