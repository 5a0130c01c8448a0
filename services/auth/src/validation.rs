//! Input validation utilities

use common::{ServiceError, ServiceResult};
use regex::Regex;
use std::sync::OnceLock;

/// Unwrap a required text field, rejecting absent or blank values
pub fn required<'a>(value: &'a Option<String>, field: &str) -> ServiceResult<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{} is required", field))),
    }
}

/// Like [`required`], but returns the value untrimmed
pub fn required_secret<'a>(value: &'a Option<String>, field: &str) -> ServiceResult<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{} is required", field))),
    }
}

/// Validate display name
pub fn validate_name(name: &str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::validation("Name is required"));
    }

    if name.chars().count() > 100 {
        return Err(ServiceError::validation(
            "Name must be at most 100 characters long",
        ));
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> ServiceResult<()> {
    if email.is_empty() {
        return Err(ServiceError::validation("Email is required"));
    }

    if email.len() > 254 {
        return Err(ServiceError::validation(
            "Email must be at most 254 characters long",
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(ServiceError::validation("Invalid email format"));
    }

    Ok(())
}

/// Validate password
pub fn validate_password(password: &str) -> ServiceResult<()> {
    if password.is_empty() {
        return Err(ServiceError::validation("Password is required"));
    }

    if password.len() < 8 {
        return Err(ServiceError::validation(
            "Password must be at least 8 characters long",
        ));
    }

    if password.len() > 128 {
        return Err(ServiceError::validation(
            "Password must be at most 128 characters long",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(required(&None, "Email").is_err());
        assert!(required(&Some("   ".to_string()), "Email").is_err());
        assert_eq!(required(&Some(" a ".to_string()), "Email").unwrap(), "a");
    }

    #[test]
    fn email_format() {
        assert!(validate_email("kamal@example.lk").is_ok());
        assert!(validate_email("kamal@").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
        assert!(validate_password(&"x".repeat(129)).is_err());
    }

    #[test]
    fn name_bounds() {
        assert!(validate_name("Kamal").is_ok());
        assert!(validate_name(" ").is_err());
        assert!(validate_name(&"n".repeat(101)).is_err());
    }
}
