//! Lenient readers for what browser forms actually send: `""` for an
//! unpicked date or manager, and full ISO timestamps from date pickers.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, de};

/// `YYYY-MM-DD`, or an RFC 3339 timestamp reduced to its calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|_| format!("invalid date '{raw}', expected YYYY-MM-DD or an ISO 8601 timestamp"))
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Optional date where `null` and `""` both mean "no date".
pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match blank_to_none(Option::<String>::deserialize(deserializer)?) {
        Some(raw) => parse_date(&raw).map(Some).map_err(de::Error::custom),
        None => Ok(None),
    }
}

/// Patch form of [`date`]: a present key is `Some`, and `null` or `""`
/// inside it clears the value.
pub fn double_option_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    date(deserializer).map(Some)
}

/// Optional string where `""` (or whitespace) reads as `None`.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(blank_to_none)
}

/// Patch form of [`blank_as_none`].
pub fn double_option_blank<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_as_none(deserializer).map(Some)
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent key
/// (`None`, via `#[serde(default)]`).
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dates_accept_plain_and_timestamp_forms() {
        let may_20 = NaiveDate::from_ymd_opt(1990, 5, 20).unwrap();
        assert_eq!(parse_date("1990-05-20"), Ok(may_20));
        assert_eq!(parse_date("1990-05-20T00:00:00.000Z"), Ok(may_20));
        assert_eq!(parse_date("1990-05-20T23:30:00+05:30"), Ok(may_20));
    }

    #[test]
    fn garbage_dates_name_the_value() {
        let err = parse_date("20/05/1990").unwrap_err();
        assert!(err.contains("20/05/1990"));
    }
}
