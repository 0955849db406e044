use crate::error::{ConfigError, ValidationError};

/// Parses `name=value`. The value may be empty and may itself contain `=`.
///
/// # Errors
///
/// Returns an error when there is no `=` or the name is empty.
pub fn parse_variable_override(s: &str) -> Result<(String, String), ConfigError> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_owned(), value.to_owned()))
        }
        _ => Err(ConfigError::InvalidVariableOverride {
            value: s.to_owned(),
        }),
    }
}

/// Parses a percentage within `[0, 100]`.
///
/// # Errors
///
/// Returns an error when the value is not a number or out of range.
pub fn parse_threshold(s: &str) -> Result<f64, ValidationError> {
    let invalid = || ValidationError::InvalidThreshold {
        value: s.to_owned(),
    };
    let value: f64 = s.trim().parse().map_err(|_err| invalid())?;
    if (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(invalid())
    }
}
