//! Kazakhstan phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneNumberError {
    /// The input contains no digits.
    #[error("phone number cannot be empty")]
    Empty,
    /// The digits do not form an 11-digit `7XXXXXXXXXX` number.
    #[error("phone number must have 11 digits starting with 7 or 8")]
    InvalidFormat,
}

/// A phone number normalized to `+7XXXXXXXXXX`.
///
/// Any punctuation is stripped. A leading domestic trunk prefix `8` is
/// rewritten to the country code `7`.
///
/// ## Examples
///
/// ```
/// use snacklane_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("8 (701) 123-45-67").unwrap();
/// assert_eq!(phone.as_str(), "+77011234567");
///
/// assert!(PhoneNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Number of digits in a normalized number (without `+`).
    pub const DIGITS: usize = 11;

    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has no digits or does not reduce to an
    /// 11-digit number starting with `7`.
    pub fn parse(s: &str) -> Result<Self, PhoneNumberError> {
        let mut digits: String = s.chars().filter(char::is_ascii_digit).collect();

        if digits.is_empty() {
            return Err(PhoneNumberError::Empty);
        }

        if digits.len() == Self::DIGITS && digits.starts_with('8') {
            digits.replace_range(..1, "7");
        }

        if digits.len() != Self::DIGITS || !digits.starts_with('7') {
            return Err(PhoneNumberError::InvalidFormat);
        }

        Ok(Self(format!("+{digits}")))
    }

    /// Returns the normalized number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `PhoneNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PhoneNumber {
    type Err = PhoneNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_international_format() {
        let phone = PhoneNumber::parse("+7 701 123 45 67").unwrap();
        assert_eq!(phone.as_str(), "+77011234567");
    }

    #[test]
    fn test_parse_domestic_prefix() {
        let phone = PhoneNumber::parse("87011234567").unwrap();
        assert_eq!(phone.as_str(), "+77011234567");
    }

    #[test]
    fn test_parse_with_punctuation() {
        let phone = PhoneNumber::parse("8 (727) 250-00-00").unwrap();
        assert_eq!(phone.to_string(), "+77272500000");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(PhoneNumber::parse("call me"), Err(PhoneNumberError::Empty));
    }

    #[test]
    fn test_parse_wrong_length() {
        assert_eq!(
            PhoneNumber::parse("7011234567"),
            Err(PhoneNumberError::InvalidFormat)
        );
        assert_eq!(
            PhoneNumber::parse("+770112345678"),
            Err(PhoneNumberError::InvalidFormat)
        );
    }

    #[test]
    fn test_parse_wrong_country() {
        assert_eq!(
            PhoneNumber::parse("+1 415 555 0100"),
            Err(PhoneNumberError::InvalidFormat)
        );
    }
}
