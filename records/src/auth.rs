//! Bearer-token authentication against a fixed allow-list.
//!
//! The allow-list is built once at startup and never changes for the life of
//! the process. Each entry maps a secret token to the user name that is
//! written into audit entries, so tokens themselves never reach storage.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::Identity;

/// Authorization scheme accepted in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// One allow-list entry.
///
/// This is the shape of the `AUTHORIZED_USERS` JSON array:
///
/// ```json
/// [{"user": "alice", "token": "s3cr3t", "comment": "map editor"}]
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    pub user: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl std::fmt::Debug for AuthorizedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizedUser")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("comment", &self.comment)
            .finish()
    }
}

/// Parses a JSON array of [`AuthorizedUser`] entries.
pub fn parse_authorized_users(json: &str) -> Result<Vec<AuthorizedUser>> {
    serde_json::from_str(json)
        .map_err(|e| Error::InvalidInput(format!("invalid authorized users list: {}", e)))
}

/// Validates bearer credentials and resolves them to an [`Identity`].
///
/// Cheap to clone; clones share the same allow-list.
#[derive(Clone, Default)]
pub struct Authenticator {
    tokens: Arc<HashMap<String, Identity>>,
}

impl Authenticator {
    /// Builds the allow-list. Later entries win when a token repeats.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if any entry has an empty user or token.
    pub fn new(users: impl IntoIterator<Item = AuthorizedUser>) -> Result<Self> {
        let mut tokens = HashMap::new();
        for entry in users {
            if entry.user.trim().is_empty() {
                return Err(Error::InvalidInput(
                    "authorized user name must not be empty".to_string(),
                ));
            }
            if entry.token.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "token for authorized user '{}' must not be empty",
                    entry.user
                )));
            }
            tokens.insert(entry.token, Identity::new(entry.user));
        }
        Ok(Self {
            tokens: Arc::new(tokens),
        })
    }

    /// Number of distinct tokens on the allow-list.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Checks the raw `Authorization` header value.
    ///
    /// `None` stands for an absent or non-UTF-8 header. Every failure mode
    /// (absent, wrong scheme, empty token, unknown token) produces the same
    /// [`Error::Unauthorized`].
    pub fn authenticate(&self, header: Option<&str>) -> Result<Identity> {
        let token = header.and_then(bearer_token).ok_or(Error::Unauthorized)?;
        match self.tokens.get(token) {
            Some(identity) => Ok(identity.clone()),
            None => {
                tracing::debug!("rejected unknown bearer token");
                Err(Error::Unauthorized)
            }
        }
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

/// Extracts the token from `Bearer <token>`.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }
    Some(token)
}
