//! Common validation utilities for settings input.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

/// Maximum length of free-form content such as custom CSS or HTML snippets.
pub const MAX_CUSTOM_CONTENT_LENGTH: usize = 100_000;

lazy_static! {
    static ref CURRENCY_CODE_REGEX: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
    static ref DIGITS_REGEX: Regex = Regex::new(r"^\d+$").unwrap();
    static ref TIMEZONE_REGEX: Regex =
        Regex::new(r"^(UTC|[A-Z][A-Za-z_]+(/[A-Z][A-Za-z_\-]+){1,2})$").unwrap();
}

/// Validates that a URL is empty or uses the http/https scheme.
///
/// An empty string clears a previously configured URL.
pub fn validate_http_url_or_empty(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Ok(());
    }

    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') && !url.contains(' ') => Ok(()),
        _ => {
            let mut err = ValidationError::new("http_url");
            err.message = Some("URL must start with http:// or https:// and name a host".into());
            Err(err)
        }
    }
}

/// Validates an ISO 4217 style currency code (three uppercase letters).
pub fn validate_currency_code(code: &str) -> Result<(), ValidationError> {
    if CURRENCY_CODE_REGEX.is_match(code) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency_code");
        err.message = Some("Currency code must be three uppercase letters".into());
        Err(err)
    }
}

/// Validates that an external numeric identifier is empty or digits only.
pub fn validate_numeric_id_or_empty(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || DIGITS_REGEX.is_match(id) {
        Ok(())
    } else {
        let mut err = ValidationError::new("numeric_id");
        err.message = Some("Identifier must contain only digits".into());
        Err(err)
    }
}

/// Validates an IANA timezone name such as `Asia/Dhaka`, or `UTC`.
pub fn validate_timezone(tz: &str) -> Result<(), ValidationError> {
    if TIMEZONE_REGEX.is_match(tz) {
        Ok(())
    } else {
        let mut err = ValidationError::new("timezone");
        err.message = Some("Timezone must be an IANA name like Asia/Dhaka".into());
        Err(err)
    }
}
