//! Strongly-typed identifiers used across the domain.
//!
//! Both identifiers are opaque strings on the wire. Product ids minted by this
//! system are six decimal digits, but legacy and client-supplied ids are kept
//! as-is so carts can reference any catalog entry.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a catalog entry (`productId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

/// Identifier of an authenticated shopper, handed in by the session layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Parse an identifier, trimming surrounding whitespace.
            pub fn parse(raw: impl AsRef<str>) -> Result<Self, DomainError> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(DomainError::invalid_id(concat!($name, " cannot be empty")));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::parse(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

impl_string_newtype!(ProductId, "productId");
impl_string_newtype!(UserId, "userId");

impl ProductId {
    /// Smallest generated product code.
    pub const MIN_CODE: u32 = 100_000;
    /// Largest generated product code.
    pub const MAX_CODE: u32 = 999_999;

    /// Build an id from a six-digit numeric code.
    ///
    /// Returns `None` outside `MIN_CODE..=MAX_CODE`.
    pub fn from_code(code: u32) -> Option<Self> {
        (Self::MIN_CODE..=Self::MAX_CODE)
            .contains(&code)
            .then(|| Self(code.to_string()))
    }

    /// Whether this id has the shape of a generated code (six digits, no leading zero).
    pub fn is_generated_code(&self) -> bool {
        self.0
            .parse::<u32>()
            .ok()
            .and_then(Self::from_code)
            .is_some_and(|p| p.0 == self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_rejects_empty() {
        assert_eq!(ProductId::parse("  p1 ").unwrap().as_str(), "p1");
        assert!(matches!(UserId::parse("   "), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn from_code_enforces_six_digits() {
        assert_eq!(ProductId::from_code(123456).unwrap().as_str(), "123456");
        assert!(ProductId::from_code(99_999).is_none());
        assert!(ProductId::from_code(1_000_000).is_none());
    }

    #[test]
    fn generated_code_shape() {
        assert!(ProductId::parse("654321").unwrap().is_generated_code());
        assert!(!ProductId::parse("012345").unwrap().is_generated_code());
        assert!(!ProductId::parse("p1").unwrap().is_generated_code());
    }

    #[test]
    fn serde_is_a_plain_string() {
        let id: UserId = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");
        assert!(serde_json::from_str::<UserId>("\"\"").is_err());
    }
}
