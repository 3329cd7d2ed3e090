//! HTML form bindings.
//!
//! Each form deserializes from an urlencoded body with every field
//! defaulted, so a missing field is reported as a field error instead of
//! rejecting the request.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::NewAccount;
use crate::errors::FormErrors;

pub const FIELD_REQUIRED: &str = "This field is required.";

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern is valid"));

/// User registration form
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct RegistrationForm {
    #[validate(
        length(max = 150, message = "Ensure this value has at most 150 characters."),
        regex(
            path = *USERNAME_RE,
            message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
        )
    )]
    pub username: String,

    #[validate(length(max = 30, message = "Ensure this value has at most 30 characters."))]
    pub first_name: String,

    #[validate(length(max = 30, message = "Ensure this value has at most 30 characters."))]
    pub last_name: String,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this value has at most 254 characters.")
    )]
    pub email: String,

    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,

    #[validate(must_match(other = "password1", message = "The two password fields must match."))]
    pub password2: String,

    /// HTML checkbox: present ("on") when ticked, absent otherwise
    #[validate(required(message = "You must agree to the terms to register."))]
    pub agree_to_terms: Option<String>,
}

impl RegistrationForm {
    const REQUIRED: [&'static str; 6] = [
        "username",
        "first_name",
        "last_name",
        "email",
        "password1",
        "password2",
    ];

    /// Validate the submission and produce cleaned account data.
    ///
    /// Text fields are trimmed; passwords are taken verbatim. A field that
    /// is missing reports only "required", never its format errors too.
    pub fn clean(&self) -> Result<NewAccount, FormErrors> {
        let trimmed = self.trimmed();
        let mut errors = FormErrors::new();

        for field in Self::REQUIRED {
            if trimmed.value_of(field).is_empty() {
                errors.add(field, FIELD_REQUIRED);
            }
        }

        if let Err(validation) = trimmed.validate() {
            for (field, field_errors) in validation.field_errors() {
                let field: &str = field.as_ref();
                if errors.has(field) && Self::REQUIRED.contains(&field) {
                    continue;
                }
                for error in field_errors {
                    if error.code == "must_match" && trimmed.password1.is_empty() {
                        continue;
                    }
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    errors.add(field, message);
                }
            }
        }

        errors.into_result()?;

        Ok(NewAccount {
            username: trimmed.username,
            email: trimmed.email,
            first_name: trimmed.first_name,
            last_name: trimmed.last_name,
            password: trimmed.password1,
        })
    }

    /// Trimmed username and email worth a uniqueness lookup: present and
    /// free of errors of their own.
    pub fn unique_candidates(&self, errors: &FormErrors) -> (Option<&str>, Option<&str>) {
        let username = self.username.trim();
        let email = self.email.trim();

        (
            (!username.is_empty() && !errors.has("username")).then_some(username),
            (!email.is_empty() && !errors.has("email")).then_some(email),
        )
    }

    /// Copy suitable for re-display: submitted text kept, passwords dropped.
    pub fn without_passwords(&self) -> Self {
        Self {
            password1: String::new(),
            password2: String::new(),
            ..self.trimmed()
        }
    }

    fn trimmed(&self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            password1: self.password1.clone(),
            password2: self.password2.clone(),
            agree_to_terms: self
                .agree_to_terms
                .as_deref()
                .filter(|value| is_checked(value))
                .map(str::to_string),
        }
    }

    fn value_of(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            "first_name" => &self.first_name,
            "last_name" => &self.last_name,
            "email" => &self.email,
            "password1" => &self.password1,
            "password2" => &self.password2,
            _ => "",
        }
    }
}

/// Checkbox semantics: blank, "false" and "0" mean unticked.
fn is_checked(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "false" | "0"
    )
}

/// Login form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// Resend verification form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResendVerificationForm {
    pub email: String,
}
