use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::server::Request;

/// Result of a successful authentication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub user: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<Value>,
}

impl Identity {
    pub fn user(user: Value) -> Self {
        Self {
            user,
            session: None,
        }
    }

    pub fn with_session(mut self, session: Value) -> Self {
        self.session = Some(session);
        self
    }
}

/// Whether a route needs an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthRequirement {
    Required,
    NotRequired,
    /// Use the owning router's setting
    #[default]
    Inherit,
}

impl AuthRequirement {
    pub fn resolve(self, inherited: bool) -> bool {
        match self {
            AuthRequirement::Required => true,
            AuthRequirement::NotRequired => false,
            AuthRequirement::Inherit => inherited,
        }
    }
}

impl From<bool> for AuthRequirement {
    fn from(required: bool) -> Self {
        if required {
            AuthRequirement::Required
        } else {
            AuthRequirement::NotRequired
        }
    }
}

/// Authentication collaborator.
///
/// `Ok(None)` means the credentials were missing or invalid and the request is
/// rejected with 401; `Err` is an infrastructure failure and propagates.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, req: &Request) -> anyhow::Result<Option<Identity>>;
}

/// Validates `Authorization: Bearer <token>` against a static token table.
pub struct BearerTokenAuthenticator {
    tokens: HashMap<String, Identity>,
}

impl BearerTokenAuthenticator {
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(token.into(), identity);
        self
    }

    fn extract_token(req: &Request) -> Option<&str> {
        let header = req.get_header("authorization")?;
        let (scheme, token) = header.split_once(' ')?;
        scheme
            .eq_ignore_ascii_case("bearer")
            .then(|| token.trim())
            .filter(|t| !t.is_empty())
    }
}

impl Default for BearerTokenAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    async fn authenticate(&self, req: &Request) -> anyhow::Result<Option<Identity>> {
        Ok(Self::extract_token(req).and_then(|token| self.tokens.get(token).cloned()))
    }
}
