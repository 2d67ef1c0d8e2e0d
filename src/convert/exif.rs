//! EXIF type classes and their raw/native conversion rules.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::numeric::{format_fraction, format_in_range, parse_fraction, parse_in_range};
use crate::error::{Error, Result};
use crate::value::Value;

/// Datetime layouts accepted on read, tried in order.
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y:%m:%d %H:%M:%S", "%Y-%m-%dT%H:%M:%SZ"];
const DATE_FORMAT: &str = "%Y:%m:%d";
const RAW_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// The EXIF type classes, one per conversion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeClass {
    Ascii,
    Byte,
    SByte,
    Short,
    Long,
    SLong,
    Rational,
    SRational,
    Undefined,
}

/// Per-key refinement of the Ascii and Undefined rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Semantic {
    /// Free text, or opaque bytes for Undefined.
    #[default]
    Plain,
    /// A datetime, with a date-only fallback.
    DateTime,
    /// A date without a time of day.
    Date,
    /// Four ASCII digit bytes forming a version such as `2.20`.
    Version,
}

impl fmt::Display for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Convert a raw EXIF string to its native value.
pub fn to_native(class: TypeClass, semantic: Semantic, raw: &str) -> Result<Value> {
    let target = class.to_string();
    match class {
        TypeClass::Ascii => Ok(match semantic {
            Semantic::DateTime | Semantic::Date => parse_date_like(raw),
            _ => Value::Text(raw.to_string()),
        }),
        TypeClass::Byte | TypeClass::SByte => Ok(Value::Text(raw.to_string())),
        TypeClass::Short => parse_in_range(&target, raw, 0, i64::from(u16::MAX)).map(Value::Integer),
        TypeClass::Long => parse_in_range(&target, raw, 0, i64::from(u32::MAX)).map(Value::Integer),
        TypeClass::SLong => {
            parse_in_range(&target, raw, i64::from(i32::MIN), i64::from(i32::MAX)).map(Value::Integer)
        }
        TypeClass::Rational => parse_fraction(&target, raw, false).map(Value::Rational),
        TypeClass::SRational => parse_fraction(&target, raw, true).map(Value::Rational),
        TypeClass::Undefined => match semantic {
            Semantic::Version => decode_version(raw).map(Value::Text),
            _ => Ok(Value::Text(raw.to_string())),
        },
    }
}

/// Convert a native value to the raw EXIF string for `class`.
pub fn to_raw(class: TypeClass, semantic: Semantic, value: &Value) -> Result<String> {
    let target = class.to_string();
    match class {
        TypeClass::Ascii => match (semantic, value) {
            (_, Value::Text(s)) => Ok(s.clone()),
            (Semantic::DateTime | Semantic::Date, Value::DateTime(dt)) => {
                Ok(dt.format(RAW_DATETIME_FORMAT).to_string())
            }
            (Semantic::Date, Value::Date(d)) => Ok(d.format(DATE_FORMAT).to_string()),
            (Semantic::DateTime, Value::Date(d)) => Ok(format!("{} 00:00:00", d.format(DATE_FORMAT))),
            (_, other) => Err(Error::conversion(target, other.to_string())),
        },
        TypeClass::Byte | TypeClass::SByte => text_only(&target, value),
        TypeClass::Short => format_in_range(&target, value, 0, i64::from(u16::MAX)),
        TypeClass::Long => format_in_range(&target, value, 0, i64::from(u32::MAX)),
        TypeClass::SLong => format_in_range(&target, value, i64::from(i32::MIN), i64::from(i32::MAX)),
        TypeClass::Rational => format_fraction(&target, value, false),
        TypeClass::SRational => format_fraction(&target, value, true),
        TypeClass::Undefined => {
            let text = text_only(&target, value)?;
            if semantic == Semantic::Version {
                if let Some(encoded) = encode_version(&text) {
                    return Ok(encoded);
                }
            }
            Ok(text)
        }
    }
}

fn text_only(target: &str, value: &Value) -> Result<String> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        other => Err(Error::conversion(target, other.to_string())),
    }
}

/// Datetime, then date, then the raw string unchanged. Never fails.
fn parse_date_like(raw: &str) -> Value {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Value::DateTime(dt);
        }
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(d) => Value::Date(d),
        Err(_) => Value::Text(raw.to_string()),
    }
}

/// `"48 50 50 48 "` → `"2.20"`.
fn decode_version(raw: &str) -> Result<String> {
    let err = || Error::conversion("Undefined (version)", raw);
    let bytes = raw
        .split_whitespace()
        .map(|b| b.parse::<u8>().map_err(|_| err()))
        .collect::<Result<Vec<u8>>>()?;
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        return Err(err());
    }
    let digits: String = bytes.iter().map(|&b| char::from(b)).collect();
    let major: u8 = digits[..2].parse().map_err(|_| err())?;
    Ok(format!("{major}.{}", &digits[2..]))
}

/// `"2.20"` → `"48 50 50 48 "`; `None` when `text` is not a version.
fn encode_version(text: &str) -> Option<String> {
    let (major, minor) = text.split_once('.')?;
    let major: u8 = major.parse().ok().filter(|m| *m < 100)?;
    if minor.len() != 2 || !minor.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let digits = format!("{major:02}{minor}");
    Some(digits.bytes().map(|b| format!("{b} ")).collect())
}
