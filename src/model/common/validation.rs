use thiserror::Error;

use super::address::InvalidAddress;

/// A structurally invalid administrative write, naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    /// Attribute an address parse failure to a field.
    pub fn address(field: &'static str, err: InvalidAddress) -> Self {
        Self::new(field, err.to_string())
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "required for this ip_type")
    }
}

/// Trim `value`, rejecting it if nothing is left.
pub fn non_blank(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::new(field, "must not be blank"))
    } else {
        Ok(trimmed.to_string())
    }
}
