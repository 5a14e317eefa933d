use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Millis(i64),
    Fractional(f64),
    Text(String),
}

/// Accepts RFC 3339, ISO 8601 without an offset (read as UTC), or epoch milliseconds
/// as a number or a digit string.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Some(naive.and_utc());
    }
    text.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let parsed = match RawTimestamp::deserialize(deserializer)? {
        RawTimestamp::Millis(millis) => DateTime::from_timestamp_millis(millis),
        RawTimestamp::Fractional(millis) if millis.is_finite() => {
            DateTime::from_timestamp_millis(millis as i64)
        }
        RawTimestamp::Fractional(_) => None,
        RawTimestamp::Text(text) => parse_timestamp(&text),
    };
    parsed.ok_or_else(|| de::Error::custom("unrecognised timestamp"))
}
