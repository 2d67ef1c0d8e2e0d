//! IPTC type classes and their raw/native conversion rules.

use chrono::{FixedOffset, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::numeric::{format_in_range, parse_in_range};
use crate::error::{Error, Result};
use crate::value::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IptcType {
    Short,
    String,
    Date,
    Time,
    Undefined,
}

impl fmt::Display for IptcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Convert one raw IPTC dataset to its native value.
pub fn to_native(class: IptcType, raw: &str) -> Result<Value> {
    let target = class.to_string();
    match class {
        IptcType::Short => parse_in_range(&target, raw, 0, i64::from(u16::MAX)).map(Value::Integer),
        IptcType::String | IptcType::Undefined => Ok(Value::Text(raw.to_string())),
        IptcType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|_| Error::conversion(target, raw)),
        IptcType::Time => parse_time(raw).ok_or_else(|| Error::conversion(target, raw)),
    }
}

/// Convert one native value to its raw IPTC dataset.
pub fn to_raw(class: IptcType, value: &Value) -> Result<String> {
    let target = class.to_string();
    match (class, value) {
        (IptcType::Short, _) => format_in_range(&target, value, 0, i64::from(u16::MAX)),
        (IptcType::String | IptcType::Undefined, Value::Text(s)) => Ok(s.clone()),
        (IptcType::Date, Value::Date(d)) => Ok(d.format(DATE_FORMAT).to_string()),
        (IptcType::Date, Value::DateTime(dt)) => Ok(dt.date().format(DATE_FORMAT).to_string()),
        (IptcType::Time, Value::Time { time, offset }) => {
            Ok(format!("{}{}", time.format(TIME_FORMAT), format_offset(offset)))
        }
        (_, other) => Err(Error::conversion(target, other.to_string())),
    }
}

/// `HH:MM:SS±HH:MM`; a missing offset reads as UTC.
fn parse_time(raw: &str) -> Option<Value> {
    let (clock, zone) = match raw.find(['+', '-']) {
        Some(pos) => raw.split_at(pos),
        None => (raw, "+00:00"),
    };
    let time = NaiveTime::parse_from_str(clock, TIME_FORMAT).ok()?;
    let offset = parse_offset(zone)?;
    Some(Value::Time { time, offset })
}

/// `±HH:MM` → offset.
pub(crate) fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let sign = match zone.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let (hours, minutes) = zone[1..].split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub(crate) fn format_offset(offset: &FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.abs();
    format!("{sign}{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_string() {
        assert_eq!(to_native(IptcType::Short, "4").unwrap(), Value::from(4));
        assert!(to_native(IptcType::Short, "1E3").is_err());
        assert!(to_native(IptcType::Short, "-0").is_err());
        assert_eq!(to_raw(IptcType::Short, &Value::from(4)).unwrap(), "4");
        assert_eq!(to_native(IptcType::String, "blabla").unwrap(), Value::from("blabla"));
        assert_eq!(to_raw(IptcType::String, &Value::from("Nobody")).unwrap(), "Nobody");
        assert!(to_raw(IptcType::String, &Value::from(3)).is_err());
    }

    #[test]
    fn dates() {
        let date = NaiveDate::from_ymd_opt(2004, 7, 13).unwrap();
        assert_eq!(to_native(IptcType::Date, "2004-07-13").unwrap(), Value::Date(date));
        assert!(to_native(IptcType::Date, "2004:07:13").is_err());
        assert!(to_native(IptcType::Date, "2004-13-13").is_err());
        assert_eq!(to_raw(IptcType::Date, &Value::Date(date)).unwrap(), "2004-07-13");

        let dt = date.and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(to_raw(IptcType::Date, &Value::DateTime(dt)).unwrap(), "2004-07-13");
        assert!(to_raw(IptcType::Date, &Value::from("2004-07-13")).is_err());
    }

    #[test]
    fn times() {
        let value = to_native(IptcType::Time, "10:52:04+02:00").unwrap();
        let Value::Time { time, offset } = &value else {
            panic!("expected a time, got {value:?}");
        };
        assert_eq!(*time, NaiveTime::from_hms_opt(10, 52, 4).unwrap());
        assert_eq!(offset.local_minus_utc(), 7200);
        assert_eq!(to_raw(IptcType::Time, &value).unwrap(), "10:52:04+02:00");

        let west = to_native(IptcType::Time, "23:00:00-05:30").unwrap();
        assert_eq!(to_raw(IptcType::Time, &west).unwrap(), "23:00:00-05:30");

        let utc = to_native(IptcType::Time, "08:00:00").unwrap();
        assert_eq!(to_raw(IptcType::Time, &utc).unwrap(), "08:00:00+00:00");

        for raw in ["25:00:00+00:00", "10:52:04+2", "noon"] {
            assert!(to_native(IptcType::Time, raw).is_err(), "accepted {raw:?}");
        }
    }
}
