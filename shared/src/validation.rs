//! Input validation and normalization
//!
//! Request types are trimmed first and validated second, so a field made
//! only of whitespace counts as empty.

use crate::types::{PublicationRequest, RegisterRequest, UpdateUserRequest};
use thiserror::Error;
use validator::ValidateEmail;

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Reject empty values
pub fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new(field, format!("The {} field is required", field)));
    }
    Ok(())
}

/// Validate email format
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    validate_required("email", email)?;
    if email.len() > 255 {
        return Err(ValidationError::new("email", "Email too long"));
    }
    if !email.validate_email() {
        return Err(ValidationError::new("email", "Invalid email format"));
    }
    Ok(())
}

/// Any non-empty string is an acceptable password
pub fn validate_password(field: &'static str, password: &str) -> Result<(), ValidationError> {
    validate_required(field, password)
}

fn validate_profile(name: &str, nick: &str, email: &str) -> Result<(), ValidationError> {
    validate_required("name", name)?;
    validate_required("nick", nick)?;
    validate_email(email)
}

impl RegisterRequest {
    /// Trim and validate a registration. The password is left untouched.
    pub fn prepare(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        self.nick = self.nick.trim().to_string();
        self.email = self.email.trim().to_string();

        validate_profile(&self.name, &self.nick, &self.email)?;
        validate_password("password", &self.password)?;
        Ok(self)
    }
}

impl UpdateUserRequest {
    /// Trim and validate a profile edit
    pub fn prepare(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        self.nick = self.nick.trim().to_string();
        self.email = self.email.trim().to_string();

        validate_profile(&self.name, &self.nick, &self.email)?;
        Ok(self)
    }
}

impl PublicationRequest {
    /// Trim and validate a publication body
    pub fn prepare(mut self) -> Result<Self, ValidationError> {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();

        validate_required("title", &self.title)?;
        validate_required("content", &self.content)?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn register(name: &str, nick: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.to_string(),
            nick: nick.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_register_is_trimmed() {
        let req = register("  Ana  ", " ana ", " ana@example.com ", " secret ")
            .prepare()
            .unwrap();

        assert_eq!(req.name, "Ana");
        assert_eq!(req.nick, "ana");
        assert_eq!(req.email, "ana@example.com");
        // Passwords are taken verbatim
        assert_eq!(req.password, " secret ");
    }

    #[rstest]
    #[case("", "ana", "ana@example.com", "pw", "name")]
    #[case("Ana", "   ", "ana@example.com", "pw", "nick")]
    #[case("Ana", "ana", "", "pw", "email")]
    #[case("Ana", "ana", "not-an-email", "pw", "email")]
    #[case("Ana", "ana", "ana@example.com", "", "password")]
    fn test_register_rejects(
        #[case] name: &str,
        #[case] nick: &str,
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
    ) {
        let err = register(name, nick, email, password).prepare().unwrap_err();
        assert_eq!(err.field, field);
    }

    #[test]
    fn test_update_user_does_not_need_password() {
        let req = UpdateUserRequest {
            name: "Ana".to_string(),
            nick: "ana".to_string(),
            email: "ana@example.com".to_string(),
        };
        assert!(req.prepare().is_ok());
    }

    #[rstest]
    #[case("", "body", "title")]
    #[case("title", " \n ", "content")]
    fn test_publication_rejects(#[case] title: &str, #[case] content: &str, #[case] field: &str) {
        let req = PublicationRequest {
            title: title.to_string(),
            content: content.to_string(),
        };
        assert_eq!(req.prepare().unwrap_err().field, field);
    }

    #[test]
    fn test_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&email).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_prepare_is_idempotent(
            name in "[ a-zA-Z]{0,3}[a-zA-Z]{1,12}[ ]{0,3}",
            nick in "[ ]{0,3}[a-z0-9_]{1,12}[ ]{0,3}",
            user in "[a-z]{1,10}",
        ) {
            let once = register(&name, &nick, &format!(" {}@example.com ", user), "pw")
                .prepare()
                .unwrap();
            let twice = once.clone().prepare().unwrap();

            prop_assert_eq!(&once.name, &twice.name);
            prop_assert_eq!(&once.nick, &twice.nick);
            prop_assert_eq!(&once.email, &twice.email);
        }

        #[test]
        fn prop_whitespace_only_fields_rejected(blank in "[ \t\n]{0,8}") {
            let err = register(&blank, "ana", "ana@example.com", "pw").prepare().unwrap_err();
            prop_assert_eq!(err.field, "name");

            let err = register("Ana", &blank, "ana@example.com", "pw").prepare().unwrap_err();
            prop_assert_eq!(err.field, "nick");

            let req = PublicationRequest { title: blank.clone(), content: "body".to_string() };
            prop_assert_eq!(req.prepare().unwrap_err().field, "title");
        }

        #[test]
        fn prop_password_is_never_altered(password in "\\PC{1,40}") {
            let req = register("Ana", "ana", "ana@example.com", &password).prepare().unwrap();
            prop_assert_eq!(req.password, password);
        }
    }
}
