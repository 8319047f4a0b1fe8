//! Lenient decoders for exchange fields.
//!
//! The backend forwards exchange values verbatim, so the same field can
//! arrive as `1234.5`, `"1234.5"` or `""` depending on the account. Empty
//! strings and nulls decode as absent.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde::de::{self, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Number(f64),
    Text(String),
}

impl Raw {
    fn into_f64<E: de::Error>(self) -> Result<Option<f64>, E> {
        match self {
            Raw::Number(value) => Ok(Some(value)),
            Raw::Text(text) if text.trim().is_empty() => Ok(None),
            Raw::Text(text) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("invalid number '{}'", text))),
        }
    }
}

pub fn opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Raw>::deserialize(deserializer)? {
        Some(raw) => raw.into_f64(),
        None => Ok(None),
    }
}

/// Required number; absent values become zero via `#[serde(default)]`.
pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_number(deserializer)?.unwrap_or_default())
}

pub fn opt_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match opt_number(deserializer)? {
        Some(value) if value >= 0.0 && value.fract() == 0.0 => Ok(Some(value as u64)),
        Some(value) => Err(de::Error::custom(format!("invalid count {}", value))),
        None => Ok(None),
    }
}

pub fn number_seq<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<Raw>>>::deserialize(deserializer)?.unwrap_or_default();
    raw.into_iter()
        .map(|item| match item {
            Some(raw) => Ok(raw.into_f64()?.unwrap_or_default()),
            None => Ok(0.0),
        })
        .collect()
}

/// Epoch milliseconds (number or string), RFC 3339, or `YYYY-MM-DD HH:MM:SS`
/// interpreted as UTC.
pub fn opt_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match Option::<Raw>::deserialize(deserializer)? {
        Some(raw) => raw,
        None => return Ok(None),
    };

    match raw {
        Raw::Number(millis) => Ok(from_millis(millis as i64)),
        Raw::Text(text) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            if let Ok(millis) = text.parse::<i64>() {
                return Ok(from_millis(millis));
            }
            if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                return Ok(Some(parsed.with_timezone(&Utc)));
            }
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .map(|naive| Some(Utc.from_utc_datetime(&naive)))
                .map_err(|_| de::Error::custom(format!("invalid timestamp '{}'", text)))
        }
    }
}

fn from_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}
