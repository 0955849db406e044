use std::time::Duration;

use crate::error::ConfigError;

use super::types::DurationValue;

/// Parses `"<digits>[ms|s|m|h]"`; a bare number means seconds. Zero is
/// accepted here; fields that must be positive check that themselves.
pub(super) fn parse_duration_value(value: &str) -> Result<Duration, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::DurationEmpty);
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(ConfigError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ConfigError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    let unit = if unit_part.is_empty() { "s" } else { unit_part.trim() };
    match unit {
        "ms" => Ok(Duration::from_millis(number)),
        "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or(ConfigError::DurationOverflow),
        "h" => number
            .checked_mul(60)
            .and_then(|minutes| minutes.checked_mul(60))
            .map(Duration::from_secs)
            .ok_or(ConfigError::DurationOverflow),
        _ => Err(ConfigError::InvalidDurationUnit {
            unit: unit.to_owned(),
        }),
    }
}

impl DurationValue {
    pub(super) fn to_duration(&self) -> Result<Duration, ConfigError> {
        match self {
            DurationValue::Seconds(secs) => Ok(Duration::from_secs(*secs)),
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}

pub(super) fn optional_duration(
    value: Option<&DurationValue>,
) -> Result<Option<Duration>, ConfigError> {
    value.map(DurationValue::to_duration).transpose()
}

/// Like [`optional_duration`] but rejects an explicit zero.
pub(super) fn positive_duration(
    value: Option<&DurationValue>,
    field: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    match optional_duration(value)? {
        Some(duration) if duration.is_zero() => Err(ConfigError::DurationZero { field }),
        other => Ok(other),
    }
}
