//! Supported currency codes.

use std::borrow::Cow;

use validator::ValidationError;

pub const USD: &str = "USD";
pub const EUR: &str = "EUR";
pub const CAD: &str = "CAD";

/// Currencies accounts may be opened in.
pub const SUPPORTED_CURRENCIES: &[&str] = &[USD, EUR, CAD];

/// Returns true if `currency` is a supported code (case-sensitive).
pub fn is_supported_currency(currency: &str) -> bool {
    SUPPORTED_CURRENCIES.contains(&currency)
}

/// `validator` hook for currency fields.
pub fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if is_supported_currency(currency) {
        return Ok(());
    }

    let mut error = ValidationError::new("currency");
    error.message = Some(Cow::Owned(format!(
        "Unsupported currency, expected one of: {}",
        SUPPORTED_CURRENCIES.join(", ")
    )));
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_currencies() {
        assert!(is_supported_currency("USD"));
        assert!(is_supported_currency("EUR"));
        assert!(is_supported_currency("CAD"));
    }

    #[test]
    fn test_unsupported_currencies() {
        assert!(!is_supported_currency("usd"));
        assert!(!is_supported_currency("GBP"));
        assert!(!is_supported_currency(""));
    }

    #[test]
    fn test_validate_currency_message() {
        let err = validate_currency("XYZ").unwrap_err();

        assert_eq!(err.code, "currency");
        assert!(err.message.unwrap().contains("USD"));
    }
}
