//! Kazakhstan business/individual identification number (BIN/IIN).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`BinIin`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BinIinError {
    /// The input contains something other than ASCII digits.
    #[error("BIN/IIN must contain digits only")]
    NonDigit,
    /// The input is not exactly 12 digits long.
    #[error("BIN/IIN must be exactly {expected} digits (got {actual})")]
    WrongLength {
        /// Required number of digits.
        expected: usize,
        /// Number of characters supplied.
        actual: usize,
    },
}

/// A 12-digit BIN (for companies) or IIN (for individual entrepreneurs).
///
/// Surrounding whitespace is trimmed; nothing else is normalized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct BinIin(String);

impl BinIin {
    /// Required length.
    pub const LENGTH: usize = 12;

    /// Parse a BIN/IIN.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is not exactly 12 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, BinIinError> {
        let trimmed = s.trim();

        if !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(BinIinError::NonDigit);
        }

        if trimmed.len() != Self::LENGTH {
            return Err(BinIinError::WrongLength {
                expected: Self::LENGTH,
                actual: trimmed.len(),
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the BIN/IIN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the value and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for BinIin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let bin = BinIin::parse(" 123456789012 ").unwrap();
        assert_eq!(bin.as_str(), "123456789012");
    }

    #[test]
    fn test_parse_rejects_letters() {
        assert_eq!(BinIin::parse("12345678901A"), Err(BinIinError::NonDigit));
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            BinIin::parse("12345"),
            Err(BinIinError::WrongLength {
                expected: 12,
                actual: 5
            })
        );
        assert!(BinIin::parse("").is_err());
    }
}
