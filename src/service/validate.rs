//! Input validation helpers shared by services

use crate::error::AppError;

/// Trim `value` and require 1..=`max_chars` characters.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max_chars: Option<usize>,
) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::field(field, "This field may not be blank."));
    }
    if let Some(max) = max_chars {
        if trimmed.chars().count() > max {
            return Err(AppError::field(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            ));
        }
    }
    Ok(trimmed.to_string())
}

/// Blank optional text becomes `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub(crate) fn username(value: &str) -> Result<String, AppError> {
    let username = required_text("username", value, Some(150))?;
    let valid = username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        return Err(AppError::field(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(username)
}

pub(crate) fn email(value: &str) -> Result<String, AppError> {
    let email = required_text("email", value, Some(254))?;
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::field("email", "Enter a valid email address."));
    }
    Ok(email)
}

pub(crate) fn password(value: &str) -> Result<(), AppError> {
    if value.chars().count() < 8 {
        return Err(AppError::field(
            "password",
            "This password is too short. It must contain at least 8 characters.",
        ));
    }
    Ok(())
}

/// Clamp list pagination: default 20, max 40.
pub(crate) fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(20).clamp(1, 40), offset.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_accepts_allowed_punctuation() {
        assert_eq!(username("  a.b+c-d_e@f ").unwrap(), "a.b+c-d_e@f");
        assert!(username("has space").is_err());
        assert!(username("").is_err());
        assert!(username(&"x".repeat(151)).is_err());
    }

    #[test]
    fn email_requires_local_part_and_dotted_domain() {
        assert!(email("alice@example.com").is_ok());
        assert!(email("@example.com").is_err());
        assert!(email("alice@localhost").is_err());
        assert!(email("alice@@example.com").is_err());
        assert!(email("alice example@example.com").is_err());
    }

    #[test]
    fn password_minimum_length() {
        assert!(password("1234567").is_err());
        assert!(password("12345678").is_ok());
    }

    #[test]
    fn page_defaults_and_clamps() {
        assert_eq!(page(None, None), (20, 0));
        assert_eq!(page(Some(500), Some(3)), (40, 3));
        assert_eq!(page(Some(0), None), (1, 0));
    }
}
