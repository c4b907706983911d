use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::notice::Notice;

// search forms submit every input, so an untouched field arrives as an empty string
pub fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty()))
}

// `<input type="date">` sends YYYY-MM-DD
pub fn deserialize_optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match empty_string_as_none(deserializer)? {
        Some(value) => NaiveDate::parse_from_str(&value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                serde::de::Error::invalid_value(
                    serde::de::Unexpected::Str(&value),
                    &"a date formatted as YYYY-MM-DD",
                )
            }),
        None => Ok(None),
    }
}

// notices arrive from our own redirects; anything else is dropped rather than rejected
pub fn deserialize_notice<'de, D>(deserializer: D) -> Result<Option<Notice>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(empty_string_as_none(deserializer)?.and_then(|code| Notice::from_code(&code)))
}
