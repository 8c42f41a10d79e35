use serde::{Deserialize, Serialize};

/// The persisted form of the access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
        }
    }
}

/// Tokens held for the lifetime of the process.
///
/// Passed by value into `AuthFlow::evaluate` and handed back updated, so the
/// UI layer never shares mutable token state with the flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub request_token: Option<String>,
    pub access_token: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AuthState {
        if self.access_token.is_some() {
            AuthState::Authorized
        } else if self.request_token.is_some() {
            AuthState::PendingAuthorization
        } else {
            AuthState::NoToken
        }
    }
}

/// Where the session is in the authorization flow. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NoToken,
    PendingAuthorization,
    Authorized,
}

impl AuthState {
    /// Short label for status lines
    pub fn label(&self) -> &'static str {
        match self {
            AuthState::NoToken => "Not connected",
            AuthState::PendingAuthorization => "Waiting for approval",
            AuthState::Authorized => "Authorized",
        }
    }
}
