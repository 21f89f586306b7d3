//! Principal directory types: identifiers, roles and resolved principals.

use std::str::FromStr;

use nerostack_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shortest accepted login name.
pub const USERNAME_MIN_LENGTH: usize = 3;

/// Longest accepted login name.
pub const USERNAME_MAX_LENGTH: usize = 80;

/// Longest accepted email address.
pub const EMAIL_MAX_LENGTH: usize = 120;

/// Longest accepted display name.
pub const DISPLAY_NAME_MAX_LENGTH: usize = 100;

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a user identifier from its transport representation.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::Validation(format!("invalid user id '{value}'")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Privilege level of a principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrincipalRole {
    /// Elevated principal; bypasses access windows entirely.
    Admin,
    /// Regular principal; document access is governed by access windows.
    User,
}

impl PrincipalRole {
    /// Returns the stable storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl FromStr for PrincipalRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown principal role '{value}'"
            ))),
        }
    }
}

/// Principal resolved from the directory for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// Stable user identifier.
    pub user_id: UserId,
    /// Unique login name.
    pub username: String,
    /// Contact email.
    pub email: String,
    /// Human-friendly name.
    pub display_name: String,
    /// Privilege level.
    pub role: PrincipalRole,
    /// Whether the account may act at all.
    pub is_active: bool,
    /// Credential forwarded to the document content provider, when provisioned.
    pub content_token: Option<String>,
}

impl Principal {
    /// Returns whether this principal is elevated.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == PrincipalRole::Admin
    }

    /// Applies a partial update after validating every supplied field.
    pub fn apply_changes(&mut self, changes: PrincipalChanges) -> AppResult<()> {
        let email = changes.email.as_deref().map(normalize_email).transpose()?;
        let display_name = changes
            .display_name
            .as_deref()
            .map(normalize_display_name)
            .transpose()?;

        if let Some(email) = email {
            self.email = email;
        }
        if let Some(display_name) = display_name {
            self.display_name = display_name;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = is_active;
        }
        if let Some(content_token) = changes.content_token {
            self.content_token = content_token.filter(|token| !token.trim().is_empty());
        }

        Ok(())
    }
}

/// Partial update of a principal. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalChanges {
    /// New contact email.
    pub email: Option<String>,
    /// New display name.
    pub display_name: Option<String>,
    /// New privilege level.
    pub role: Option<PrincipalRole>,
    /// New account state.
    pub is_active: Option<bool>,
    /// New provider credential. `Some(None)` removes it.
    pub content_token: Option<Option<String>>,
}

impl PrincipalChanges {
    /// Returns whether the update carries no field at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.display_name.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.content_token.is_none()
    }
}

/// Trims a login name and checks its length.
pub fn normalize_username(value: &str) -> AppResult<String> {
    let username = value.trim();
    let length = username.chars().count();
    if !(USERNAME_MIN_LENGTH..=USERNAME_MAX_LENGTH).contains(&length) {
        return Err(AppError::Validation(format!(
            "username must be between {USERNAME_MIN_LENGTH} and {USERNAME_MAX_LENGTH} characters"
        )));
    }

    if username.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(
            "username must not contain whitespace".to_owned(),
        ));
    }

    Ok(username.to_owned())
}

/// Trims and lowercases an email and checks its shape.
pub fn normalize_email(value: &str) -> AppResult<String> {
    let email = value.trim().to_lowercase();
    let well_formed = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
    });

    if !well_formed || email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(format!("invalid email address '{value}'")));
    }

    if email.chars().count() > EMAIL_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "email must not exceed {EMAIL_MAX_LENGTH} characters"
        )));
    }

    Ok(email)
}

/// Trims a display name and checks its length.
pub fn normalize_display_name(value: &str) -> AppResult<String> {
    let display_name = value.trim();
    if display_name.is_empty() {
        return Err(AppError::Validation(
            "display name must not be empty".to_owned(),
        ));
    }

    if display_name.chars().count() > DISPLAY_NAME_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "display name must not exceed {DISPLAY_NAME_MAX_LENGTH} characters"
        )));
    }

    Ok(display_name.to_owned())
}
