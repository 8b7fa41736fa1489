//! Client-side validation for the auth forms. Each form reports every failing
//! field at once, keyed by the field name the API uses, with the message shown
//! next to the input. Validation is a convenience; the API re-validates.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

pub const USERNAME_MIN_CHARS: usize = 6;
pub const USERNAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 8;

const USERNAME_TOO_SHORT: &str = "Username must be at least 6 characters.";
const USERNAME_TOO_LONG: &str = "Username must be at most 50 characters.";
const PASSWORD_TOO_SHORT: &str = "Password must be at least 8 characters.";
const PASSWORDS_DIFFER: &str = "Passwords do not match";
const TERMS_REQUIRED: &str = "You must accept the Terms of Service and Privacy Policy.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Field errors in the order the fields appear on the form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: &'static str) {
        // one message per field, first rule wins
        if self.get(field).is_none() {
            self.errors.push(FieldError { field, message });
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Message for `field`, if it failed.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|error| error.field == field)
            .map(|error| error.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.errors.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email.trim()))
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn check_password(errors: &mut ValidationErrors, password: &SecretString) {
    if char_len(password.expose_secret()) < PASSWORD_MIN_CHARS {
        errors.push("password", PASSWORD_TOO_SHORT);
    }
}

fn check_confirmation(
    errors: &mut ValidationErrors,
    password: &SecretString,
    confirm_password: &SecretString,
) {
    if char_len(confirm_password.expose_secret()) < PASSWORD_MIN_CHARS {
        errors.push("confirmPassword", PASSWORD_TOO_SHORT);
    } else if password.expose_secret() != confirm_password.expose_secret() {
        errors.push("confirmPassword", PASSWORDS_DIFFER);
    }
}

#[derive(Debug)]
pub struct SignInForm {
    /// Username or email.
    pub username: String,
    pub password: SecretString,
    pub remember: bool,
}

impl SignInForm {
    /// # Errors
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if char_len(&self.username) < USERNAME_MIN_CHARS {
            errors.push("username", USERNAME_TOO_SHORT);
        }
        check_password(&mut errors, &self.password);
        errors.into_result()
    }
}

#[derive(Debug)]
pub struct SignUpForm {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub terms_agreement: bool,
}

impl SignUpForm {
    /// # Errors
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let username = char_len(&self.username);
        if username < USERNAME_MIN_CHARS {
            errors.push("username", USERNAME_TOO_SHORT);
        } else if username > USERNAME_MAX_CHARS {
            errors.push("username", USERNAME_TOO_LONG);
        }

        if !valid_email(&self.email) {
            errors.push("email", "Invalid email address.");
        }

        check_password(&mut errors, &self.password);
        check_confirmation(&mut errors, &self.password, &self.confirm_password);

        if !self.terms_agreement {
            errors.push("termsAgreement", TERMS_REQUIRED);
        }

        errors.into_result()
    }
}

#[derive(Debug)]
pub struct ForgotPasswordForm {
    pub email: String,
}

impl ForgotPasswordForm {
    /// # Errors
    /// Returns the email error when the address is malformed.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if !valid_email(&self.email) {
            errors.push("email", "Invalid email address");
        }
        errors.into_result()
    }
}

#[derive(Debug)]
pub struct ResetPasswordForm {
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl ResetPasswordForm {
    /// # Errors
    /// Returns every failing field.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check_password(&mut errors, &self.password);
        check_confirmation(&mut errors, &self.password, &self.confirm_password);
        errors.into_result()
    }
}
