use std::sync::OnceLock;

use regex::Regex;

use crate::mo_api::errors::EngineError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").ok())
        .as_ref()
}

/// Emails are compared case-insensitively, so they are stored trimmed and lower-cased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), EngineError> {
    let valid = match email_regex() {
        Some(re) => re.is_match(email),
        None => email.contains('@') && !email.starts_with('@') && !email.ends_with('@'),
    };
    if valid {
        Ok(())
    } else {
        Err(EngineError::validation(format!("{email} is not a valid email address")))
    }
}

pub fn validate_password(password: &str) -> Result<(), EngineError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(EngineError::validation(format!(
            "Passwords must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn emails() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.example.co").is_ok());
        assert!(validate_email("alice@").is_err());
        assert!(validate_email("alice example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn passwords() {
        assert!(validate_password("123456").is_ok());
        assert!(matches!(validate_password("12345"), Err(EngineError::Validation(_))));
    }
}
