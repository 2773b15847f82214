use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Session Schemas ---

/// Role
///
/// The account roles offered by the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Doctor,
    Patient,
}

impl Role {
    /// Human readable label shown in the shell header.
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Doctor => "Doctor",
            Role::Patient => "Patient",
        }
    }
}

/// Identity
///
/// The authenticated user as resolved by the authentication collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Identity {
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// Session
///
/// Snapshot of "who is logged in". The store publishes a fresh snapshot on
/// every committed change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Session {
    pub identity: Option<Identity>,
    pub is_loading: bool,
    // Set together with `identity`, cleared together with it.
    #[ts(type = "string | null")]
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

// --- Request Payloads (Input Schemas) ---

/// LoginRequest
///
/// Body of `POST /api/session`. Missing fields deserialize as empty strings so
/// they surface as a validation message instead of a decoding rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// RegisterUserRequest
///
/// Body of `POST /api/register`, mirroring the registration form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Option<Role>,
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

/// ForgotPasswordRequest
///
/// Body of `POST /api/forgot-password`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

// --- Response Payloads ---

/// RegistrationReceipt
///
/// Acknowledges a registration. The account is not made available to the
/// login collaborator; the client is pointed back at the login view.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegistrationReceipt {
    pub account_id: Uuid,
    pub username: String,
    pub role: Role,
    pub next: String,
}

/// PasswordResetReceipt
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PasswordResetReceipt {
    pub email: String,
    pub message: String,
}

/// ErrorResponse
///
/// Inline error message the auth-only views display under their forms.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

// --- Form Validation ---

/// ValidationError
///
/// Client-form validation failures. The display strings are the messages the
/// views show inline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields")]
    MissingFields,
    #[error("Password confirmation does not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
    #[error("Invalid phone number")]
    InvalidPhone,
    #[error("Invalid email address")]
    InvalidEmail,
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl RegisterUserRequest {
    /// validate
    ///
    /// Applies the registration form rules in the order the form reports them,
    /// returning the selected role on success.
    pub fn validate(&self) -> Result<Role, ValidationError> {
        let required = [
            &self.username,
            &self.password,
            &self.full_name,
            &self.email,
            &self.phone,
        ];
        let role = match self.role {
            Some(role) if required.iter().all(|field| !field.is_empty()) => role,
            _ => return Err(ValidationError::MissingFields),
        };

        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        // Counted in UTF-16 code units, as the browser form measures it.
        if self.password.encode_utf16().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::PasswordTooShort);
        }
        if !is_valid_phone(&self.phone) {
            return Err(ValidationError::InvalidPhone);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(role)
    }
}

impl ForgotPasswordRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::MissingFields);
        }
        if !is_valid_email(&self.email) {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(())
    }
}

/// 10 or 11 ASCII digits.
pub fn is_valid_phone(phone: &str) -> bool {
    (10..=11).contains(&phone.len()) && phone.bytes().all(|b| b.is_ascii_digit())
}

/// is_valid_email
///
/// Accepts `local@domain.tld`: exactly one `@`, no whitespace, a non-empty
/// local part, and a domain containing a dot that is neither its first nor
/// its last character.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let last = domain.len().saturating_sub(1);
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < last)
}
