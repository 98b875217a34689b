//! Token payload

use std::fmt;

use zeroize::Zeroize;

/// The sensitive credential pair migrated into token storage.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPayload {
    username: String,
    access_token: String,
}

impl TokenPayload {
    /// Creates a payload from the username and the raw access token.
    #[must_use]
    pub fn new(username: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            access_token: access_token.into(),
        }
    }

    /// Username, possibly empty.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Raw access token, possibly empty.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for TokenPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPayload")
            .field("username", &self.username)
            .field("access_token", &"**redacted**")
            .finish()
    }
}

impl Drop for TokenPayload {
    fn drop(&mut self) {
        self.username.zeroize();
        self.access_token.zeroize();
    }
}
