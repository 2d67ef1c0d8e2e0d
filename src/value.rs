use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeMap;
use std::fmt;

use crate::rational::Rational;

/// Language key used for the default entry of a language-alternative value.
pub const X_DEFAULT: &str = "x-default";

/// A tag value in its native, typed form.
///
/// One union covers all three families; which variants a given tag accepts is
/// decided by its type class (see [`crate::convert`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Integer(i64),
    Rational(Rational),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// A datetime carrying an explicit UTC offset (XMP dates).
    ZonedDateTime(DateTime<FixedOffset>),
    /// A time of day with its UTC offset (IPTC times).
    Time { time: NaiveTime, offset: FixedOffset },
    /// A `type/subtype` pair (XMP `MIMEType`).
    MimeType { kind: String, subtype: String },
    /// Ordered items of an XMP bag, seq or alt.
    Array(Vec<Value>),
    /// Language tag to text, with [`X_DEFAULT`] as the default entry.
    LangAlt(BTreeMap<String, String>),
}

impl Value {
    /// Build an [`Value::Array`] from anything convertible to values.
    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a [`Value::LangAlt`] from `(language, text)` pairs.
    pub fn lang_alt<I, L, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, T)>,
        L: Into<String>,
        T: Into<String>,
    {
        Value::LangAlt(
            entries
                .into_iter()
                .map(|(lang, text)| (lang.into(), text.into()))
                .collect(),
        )
    }

    pub fn mime_type(kind: impl Into<String>, subtype: impl Into<String>) -> Self {
        Value::MimeType {
            kind: kind.into(),
            subtype: subtype.into(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_rational(&self) -> Option<Rational> {
        match self {
            Value::Rational(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_lang_alt(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Value::LangAlt(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Integer(_) => "integer",
            Value::Rational(_) => "rational",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::ZonedDateTime(_) => "zoned datetime",
            Value::Time { .. } => "time",
            Value::MimeType { .. } => "mime type",
            Value::Array(_) => "array",
            Value::LangAlt(_) => "language alternative",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Rational(r) => write!(f, "{r}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            Value::ZonedDateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::Time { time, offset } => write!(f, "{}{offset}", time.format("%H:%M:%S")),
            Value::MimeType { kind, subtype } => write!(f, "{kind}/{subtype}"),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::LangAlt(map) => {
                f.write_str("{")?;
                for (i, (lang, text)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{lang}: {text}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Rational> for Value {
    fn from(r: Rational) -> Self {
        Value::Rational(r)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::ZonedDateTime(dt)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::LangAlt(map)
    }
}
