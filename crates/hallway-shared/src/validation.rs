//! Input validation for user-supplied text fields.
//!
//! Every helper trims its input first and returns the trimmed value on
//! success, so callers persist exactly what was validated.  Lengths are
//! counted in Unicode scalar values, not bytes.

use thiserror::Error;

use crate::constants::{
    ANNOUNCEMENT_MAX, CITY_MAX, CITY_MIN, CONTENT_MAX, CONTENT_MIN, NAME_MAX, NAME_MIN,
    SUGGESTION_MAX, SUGGESTION_MIN,
};

/// A field failed validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} characters")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{0} is required")]
    Required(&'static str),
}

pub type Result<T> = std::result::Result<T, ValidationError>;

fn bounded(value: &str, field: &'static str, min: usize, max: usize) -> Result<String> {
    let trimmed = value.trim();
    let len = trimmed.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length { field, min, max });
    }
    Ok(trimmed.to_string())
}

/// Validate an institution name (3-39 chars).
pub fn institution_name(value: &str) -> Result<String> {
    bounded(value, "name", NAME_MIN, NAME_MAX)
}

/// Validate a city name (3-14 chars).
pub fn city(value: &str) -> Result<String> {
    bounded(value, "city", CITY_MIN, CITY_MAX)
}

/// Validate thread content (10-10000 chars).
pub fn thread_content(value: &str) -> Result<String> {
    bounded(value, "content", CONTENT_MIN, CONTENT_MAX)
}

/// Validate suggestion content (10-500 chars).
pub fn suggestion_content(value: &str) -> Result<String> {
    bounded(value, "content", SUGGESTION_MIN, SUGGESTION_MAX)
}

/// Validate announcement content (up to 200 chars; empty clears it).
pub fn announcement_content(value: &str) -> Result<String> {
    bounded(value, "announcement", 0, ANNOUNCEMENT_MAX)
}

/// Validate an anonymous fingerprint: any non-empty trimmed string.
pub fn fingerprint(value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required("fingerprint"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_nine_chars_rejected() {
        assert!(thread_content("123456789").is_err());
    }

    #[test]
    fn content_ten_chars_accepted() {
        assert_eq!(thread_content("1234567890").unwrap(), "1234567890");
    }

    #[test]
    fn content_trimmed_before_counting() {
        // Nine chars of payload padded with whitespace still fails.
        assert!(thread_content("  123456789  ").is_err());
        assert_eq!(thread_content("  1234567890  ").unwrap(), "1234567890");
    }

    #[test]
    fn content_counts_chars_not_bytes() {
        // Ten multi-byte chars are within bounds.
        assert!(thread_content("अअअअअअअअअअ").is_ok());
    }

    #[test]
    fn name_bounds() {
        assert!(institution_name("ab").is_err());
        assert!(institution_name("abc").is_ok());
        assert!(institution_name(&"x".repeat(40)).is_err());
    }

    #[test]
    fn city_bounds() {
        assert!(city("ab").is_err());
        assert!(city("Chennai").is_ok());
        assert!(city("abcdefghijklmno").is_err());
    }

    #[test]
    fn empty_announcement_allowed() {
        assert_eq!(announcement_content("  ").unwrap(), "");
    }

    #[test]
    fn blank_fingerprint_rejected() {
        assert!(fingerprint("   ").is_err());
        assert_eq!(fingerprint(" fp-1 ").unwrap(), "fp-1");
    }
}
