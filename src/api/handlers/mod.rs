//! API handlers and shared request validation.

pub mod auth;
pub mod health;
pub mod root;

use regex::Regex;

/// Lightweight email sanity check used by auth handlers before any store work.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Password length bounds; hashing takes care of the rest.
pub fn valid_password(password: &str) -> bool {
    (8..=128).contains(&password.chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_at() {
        assert!(!valid_email("user.example.com"));
    }

    #[test]
    fn valid_password_accepts_reasonable_length() {
        assert!(valid_password("12345678"));
        assert!(valid_password(&"a".repeat(128)));
    }

    #[test]
    fn valid_password_rejects_out_of_bounds() {
        assert!(!valid_password("1234567"));
        assert!(!valid_password(&"a".repeat(129)));
    }
}
