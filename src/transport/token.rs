//! Bearer token providers.

use crate::error::DocGenError;
use async_trait::async_trait;

/// Supplies the bearer token attached to every request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, DocGenError>;
}

/// Fixed token, e.g. from configuration or the environment.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, DocGenError> {
        if self.token.trim().is_empty() {
            return Err(DocGenError::InvalidConfiguration(
                "access token is empty".to_string(),
            ));
        }
        Ok(self.token.clone())
    }
}
