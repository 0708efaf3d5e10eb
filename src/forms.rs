//! Presence-only validation for request bodies.
//!
//! Forms are checked before dispatch; a failure never reaches the network.

use crate::api::error::{ApiError, ApiResult};

/// A request body that can be checked for missing required fields.
pub trait Validate {
    fn validate(&self) -> ApiResult<()>;
}

/// Fail with `"<label> is required"` when `value` is blank.
pub fn require(value: &str, label: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{} is required", label)));
    }
    Ok(())
}

/// Same as [`require`] for optional fields that the form still insists on.
pub fn require_some(value: Option<&str>, label: &str) -> ApiResult<()> {
    require(value.unwrap_or_default(), label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("x", "Name").is_ok());
        let err = require("   ", "Name").unwrap_err();
        assert_eq!(err.to_string(), "Name is required");
        assert!(require_some(None, "Email").is_err());
        assert!(require_some(Some("a@b"), "Email").is_ok());
    }
}
