// Session gate over the external identity provider
//
// Sign-in itself happens elsewhere; this only tracks who is signed in
// and refuses evaluation without a user.

use serde::{Deserialize, Serialize};

pub const MIN_DISPLAY_NAME_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: String,
}

impl User {
    pub fn new(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no user is signed in")]
    SignedOut,

    #[error("display name must be at least {MIN_DISPLAY_NAME_CHARS} characters")]
    DisplayNameTooShort,
}

/// Stored name if it has content, otherwise the e-mail local part
pub fn resolve_display_name(stored: Option<&str>, email: &str) -> String {
    match stored.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => email.split('@').next().unwrap_or_default().to_string(),
    }
}

/// Sign-up rule for a chosen display name; returns the trimmed name
pub fn validate_display_name(name: &str) -> Result<String, SessionError> {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_DISPLAY_NAME_CHARS {
        return Err(SessionError::DisplayNameTooShort);
    }
    Ok(trimmed.to_string())
}

/// Who is signed in for the current command or request
#[derive(Debug, Clone, Default)]
pub struct Session {
    user: Option<User>,
    stored_name: Option<String>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user: User) -> Self {
        tracing::info!(uid = %user.uid, "User signed in");
        Self {
            user: Some(user),
            stored_name: None,
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn require_user(&self) -> Result<&User, SessionError> {
        self.current_user().ok_or(SessionError::SignedOut)
    }

    /// Display name as last persisted by the progress ledger
    pub fn restore_display_name(&mut self, stored: Option<String>) {
        self.stored_name = stored;
    }

    /// Validate and adopt a new display name; returns the trimmed name to persist
    pub fn set_display_name(&mut self, name: &str) -> Result<String, SessionError> {
        let name = validate_display_name(name)?;
        self.stored_name = Some(name.clone());
        Ok(name)
    }

    pub fn display_name(&self) -> Option<String> {
        self.current_user()
            .map(|user| resolve_display_name(self.stored_name.as_deref(), &user.email))
    }
}
