//! Input parsing for check-in arguments

use crate::errors::InputError;

/// Unit suffixes accepted after a number, longest first
const UNIT_SUFFIXES: &[&str] = &["公斤", "kg", "KG", "Kg", "%", "％"];

/// Parse a user-typed number such as `65.5`, `65.5kg` or `18%`.
///
/// NaN and infinities are rejected; range checks are left to the caller.
pub fn parse_number(input: &str) -> Result<f64, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(InputError::Empty);
    }

    let number = UNIT_SUFFIXES
        .iter()
        .find_map(|suffix| trimmed.strip_suffix(suffix))
        .unwrap_or(trimmed)
        .trim();

    let value: f64 = number.parse().map_err(|_| InputError::NotANumber)?;
    if !value.is_finite() {
        return Err(InputError::NotANumber);
    }
    Ok(value)
}

/// Trim free text and reject it when nothing is left
pub fn non_empty_text(input: &str) -> Result<&str, InputError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        Err(InputError::Empty)
    } else {
        Ok(trimmed)
    }
}
