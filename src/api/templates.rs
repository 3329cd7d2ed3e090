//! Page templates.
//!
//! Every page carries the flash messages pending for the visitor; the base
//! layout renders them above the content.

use askama::Template;
use axum::response::Html;

use super::extractors::FlashMessage;
use super::forms::RegistrationForm;
use crate::errors::{AppResult, FormErrors};

/// Render a template into an HTML response body.
pub fn render<T: Template>(template: &T) -> AppResult<Html<String>> {
    Ok(Html(template.render()?))
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub messages: Vec<FlashMessage>,
}

/// Registration page, either empty or bound to a rejected submission
#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub form: RegistrationForm,
    pub errors: FormErrors,
    pub messages: Vec<FlashMessage>,
}

impl RegisterPage {
    /// Empty form, nothing to report.
    pub fn unbound(messages: Vec<FlashMessage>) -> Self {
        Self {
            form: RegistrationForm::default(),
            errors: FormErrors::new(),
            messages,
        }
    }

    /// Re-display a submission with its errors. Passwords are never echoed.
    pub fn bound(form: &RegistrationForm, errors: FormErrors, messages: Vec<FlashMessage>) -> Self {
        Self {
            form: form.without_passwords(),
            errors,
            messages,
        }
    }
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub username: String,
    pub error: Option<String>,
    pub messages: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "resend_verification.html")]
pub struct ResendVerificationPage {
    pub email: String,
    pub messages: Vec<FlashMessage>,
}

#[derive(Template)]
#[template(path = "verification_sent.html")]
pub struct VerificationSentPage {
    pub messages: Vec<FlashMessage>,
}

/// Rendered for every `AppError` response
#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub status: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::extractors::FlashLevel;

    #[test]
    fn test_home_page_shows_messages() {
        let page = HomePage {
            messages: vec![FlashMessage {
                level: FlashLevel::Info,
                text: "You have been logged out.".to_string(),
            }],
        };
        let html = page.render().unwrap();
        assert!(html.contains("You have been logged out."));
        assert!(html.contains("alert-info"));
    }

    #[test]
    fn test_unbound_register_page_has_no_errors() {
        let html = RegisterPage::unbound(vec![]).render().unwrap();
        assert!(html.contains("name=\"username\""));
        assert!(html.contains("name=\"agree_to_terms\""));
        assert!(!html.contains("invalid-feedback"));
    }

    #[test]
    fn test_bound_register_page_echoes_values_and_errors() {
        let form = RegistrationForm {
            username: "slugger".to_string(),
            email: "not-an-email".to_string(),
            password1: "secret-pass".to_string(),
            ..Default::default()
        };
        let mut errors = FormErrors::new();
        errors.add("email", "Enter a valid email address.");

        let html = RegisterPage::bound(&form, errors, vec![]).render().unwrap();
        assert!(html.contains("value=\"slugger\""));
        assert!(html.contains("Enter a valid email address."));
        assert!(!html.contains("secret-pass"));
    }

    #[test]
    fn test_register_page_escapes_input() {
        let form = RegistrationForm {
            username: "<script>".to_string(),
            ..Default::default()
        };
        let html = RegisterPage::bound(&form, FormErrors::new(), vec![])
            .render()
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_error_page() {
        let html = ErrorPage {
            status: 404,
            message: "Page not found".to_string(),
        }
        .render()
        .unwrap();
        assert!(html.contains("404"));
        assert!(html.contains("Page not found"));
    }
}
