//! Identity collaborator
//!
//! The wallet trusts whatever user id the provider returns; issuing and
//! refreshing credentials is somebody else's job.

use crate::{config::IdentityConfig, Error, Result};
use std::collections::HashMap;
use wallet_ledger::UserId;

/// Authenticates a bearer credential to a stable user id
pub trait IdentityProvider: Send + Sync {
    /// Fails with [`Error::Unauthorized`] for unknown or malformed credentials
    fn authenticate(&self, bearer: &str) -> Result<UserId>;
}

/// Fixed token table loaded from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    tokens: HashMap<String, UserId>,
}

impl StaticTokenIdentity {
    /// Provider over the configured token table
    pub fn from_config(config: &IdentityConfig) -> Result<Self> {
        let mut tokens = HashMap::with_capacity(config.tokens.len());
        for (token, user_id) in &config.tokens {
            let user_id = UserId::parse(user_id.as_str())
                .map_err(|e| Error::Config(format!("identity token {}: {}", token, e)))?;
            tokens.insert(token.clone(), user_id);
        }
        Ok(Self { tokens })
    }

    /// Register one token
    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

impl IdentityProvider for StaticTokenIdentity {
    fn authenticate(&self, bearer: &str) -> Result<UserId> {
        let token = bearer.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(Error::Unauthorized("missing bearer token".to_string()));
        }

        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Error::Unauthorized("unknown bearer token".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authenticate() {
        let identity = StaticTokenIdentity::default().with_token("t-1", UserId::new("u-alice"));

        assert_eq!(identity.authenticate("t-1").unwrap(), UserId::new("u-alice"));
        assert_eq!(
            identity.authenticate("Bearer t-1").unwrap(),
            UserId::new("u-alice")
        );
        assert!(matches!(identity.authenticate("t-2"), Err(Error::Unauthorized(_))));
        assert!(matches!(identity.authenticate(" "), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_from_config_rejects_blank_user() {
        let mut config = IdentityConfig::default();
        config.tokens.insert("t-1".to_string(), "  ".to_string());
        assert!(matches!(
            StaticTokenIdentity::from_config(&config),
            Err(Error::Config(_))
        ));
    }
}
