use chrono::{DateTime, Utc};
use serde::Serialize;

use shopfront_core::{DomainError, DomainResult, UserId};

/// Non-empty, trimmed address text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AddressText(String);

impl AddressText {
    pub fn new(raw: impl AsRef<str>) -> DomainResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("address cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A user's shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub user_id: UserId,
    pub address: AddressText,
    pub updated_at: DateTime<Utc>,
}
