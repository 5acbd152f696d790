use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::errors::DomainError;

pub const MAX_NAME_CHARS: usize = 50;
const MIN_PHONE_DIGITS: usize = 7;
const MAX_PHONE_DIGITS: usize = 15;

/// Contact slots as collected; any of them may still be missing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Contact block stored on a committed booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub name: String,
    pub phone: String,
    pub email: String,
}

pub fn normalize_name(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if trimmed.chars().count() < 2 {
        return Err(invalid("name", "a name needs at least two characters"));
    }
    Ok(trimmed.chars().take(MAX_NAME_CHARS).collect())
}

pub fn normalize_phone(raw: &str) -> Result<String, DomainError> {
    let trimmed = raw.trim();
    let mut digits = String::with_capacity(trimmed.len());
    for (index, ch) in trimmed.chars().enumerate() {
        match ch {
            '0'..='9' => digits.push(ch),
            '+' if index == 0 => {}
            '-' | ' ' | '(' | ')' | '.' => {}
            _ => return Err(invalid("phone", "a phone number may only contain digits")),
        }
    }

    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.len()) {
        return Err(invalid(
            "phone",
            &format!("a phone number needs {MIN_PHONE_DIGITS} to {MAX_PHONE_DIGITS} digits"),
        ));
    }

    if trimmed.starts_with('+') {
        Ok(format!("+{digits}"))
    } else {
        Ok(digits)
    }
}

pub fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim().to_lowercase();
    if !email.as_str().validate_email() {
        return Err(invalid("email", "that does not look like a valid email address"));
    }
    Ok(email)
}

fn invalid(field: &str, reason: &str) -> DomainError {
    DomainError::InvalidContact { field: field.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::{normalize_email, normalize_name, normalize_phone, MAX_NAME_CHARS};
    use crate::errors::DomainError;

    #[test]
    fn name_is_collapsed_and_capped() {
        assert_eq!(normalize_name("  Asha   Rao ").as_deref(), Ok("Asha Rao"));
        let long = "x".repeat(80);
        assert_eq!(normalize_name(&long).map(|name| name.len()), Ok(MAX_NAME_CHARS));
        assert!(matches!(
            normalize_name("A"),
            Err(DomainError::InvalidContact { ref field, .. }) if field == "name"
        ));
    }

    #[test]
    fn phone_strips_separators_and_keeps_leading_plus() {
        assert_eq!(normalize_phone("+91 98765-43210").as_deref(), Ok("+919876543210"));
        assert_eq!(normalize_phone("(022) 555 0199").as_deref(), Ok("0225550199"));
    }

    #[test]
    fn phone_with_letters_or_wrong_length_is_rejected() {
        assert!(normalize_phone("call me").is_err());
        assert!(normalize_phone("12345").is_err());
        assert!(normalize_phone("1234567890123456").is_err());
    }

    #[test]
    fn email_is_validated_and_lowercased() {
        assert_eq!(
            normalize_email(" Asha.Rao@Example.COM ").as_deref(),
            Ok("asha.rao@example.com")
        );
        assert!(matches!(
            normalize_email("asha at example"),
            Err(DomainError::InvalidContact { ref field, .. }) if field == "email"
        ));
    }
}
