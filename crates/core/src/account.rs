//! Account forms: registration, login, and password change.

use serde::Serialize;
use validator::Validate;

use crate::error::CoreError;
use crate::roles::Role;

/// Minimum password length accepted by registration and password change.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Body of `POST /api/users/register`. Self-registration always creates a
/// plain `USER`; moderators are appointed server-side.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, max = 20, message = "Phone number must be 6-20 characters"))]
    pub phone: Option<String>,
    pub role: Role,
}

impl RegisterRequest {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self, CoreError> {
        let request = Self {
            username: username.into().trim().to_string(),
            email: email.into().trim().to_string(),
            password: password.into(),
            phone: phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
            role: Role::User,
        };
        request.validate().map_err(validation_error)?;
        Ok(request)
    }
}

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, CoreError> {
        let username = username.into().trim().to_string();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(CoreError::Validation(
                "Username and password are required".into(),
            ));
        }
        Ok(Self { username, password })
    }
}

/// Body of `PUT /api/users/update/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub password: String,
}

impl PasswordChange {
    /// Build a password change from the new password and its confirmation.
    pub fn new(new_password: &str, confirmation: &str) -> Result<Self, CoreError> {
        if new_password != confirmation {
            return Err(CoreError::Validation("New passwords do not match".into()));
        }
        validate_password_strength(new_password)?;
        Ok(Self {
            password: new_password.to_string(),
        })
    }
}

/// Enforce the minimum password length.
pub fn validate_password_strength(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}

fn validation_error(errors: validator::ValidationErrors) -> CoreError {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => msg.to_string(),
                None => format!("{field} is invalid"),
            })
        })
        .collect();
    messages.sort();
    CoreError::Validation(messages.join("; "))
}
