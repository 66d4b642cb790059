//! Inbound caller authentication and tenant resolution.
//!
//! Two credential strategies are supported: the shared internal secret used by
//! the chat bot (tenant taken from a header) and end-user bearer tokens.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use shiftledger_core::{AppError, AppResult, TenantContext, TenantId};

/// Port that validates a bearer token and returns the tenant it was issued to.
pub trait BearerTokenVerifier: Send + Sync {
    /// Verifies the token signature and expiry.
    fn verify(&self, token: &str) -> AppResult<TenantId>;
}

/// Credentials presented by one inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantCredentials {
    /// Shared secret of an internal caller plus the tenant it acts for.
    InternalSecret {
        /// Secret presented by the caller.
        presented_secret: String,
        /// Raw tenant header, if present.
        tenant_header: Option<String>,
    },
    /// End-user bearer token.
    BearerToken(String),
}

/// Resolves presented credentials into exactly one tenant.
#[derive(Clone)]
pub struct TenantResolver {
    internal_secret_digest: [u8; 32],
    bearer_token_verifier: Arc<dyn BearerTokenVerifier>,
}

impl TenantResolver {
    /// Creates a resolver for the configured internal secret.
    #[must_use]
    pub fn new(internal_secret: &str, bearer_token_verifier: Arc<dyn BearerTokenVerifier>) -> Self {
        Self {
            internal_secret_digest: digest(internal_secret),
            bearer_token_verifier,
        }
    }

    /// Tries each credential in order and returns the first resolved tenant.
    ///
    /// A valid internal secret without a tenant header falls through to the
    /// next credential.
    pub fn resolve(&self, credentials: &[TenantCredentials]) -> AppResult<TenantContext> {
        for credential in credentials {
            match credential {
                TenantCredentials::InternalSecret {
                    presented_secret,
                    tenant_header,
                } => {
                    if digest(presented_secret) != self.internal_secret_digest {
                        continue;
                    }

                    if let Some(tenant_header) = tenant_header {
                        let tenant_id = tenant_header.parse::<TenantId>().map_err(|error| {
                            AppError::Unauthorized(format!("invalid tenant header: {error}"))
                        })?;
                        return Ok(TenantContext::new(tenant_id));
                    }
                }
                TenantCredentials::BearerToken(token) => {
                    if let Ok(tenant_id) = self.bearer_token_verifier.verify(token) {
                        return Ok(TenantContext::new(tenant_id));
                    }
                }
            }
        }

        Err(AppError::Unauthorized("not authenticated".to_owned()))
    }
}

/// Fixed-length digest so comparison cost does not depend on the input.
fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}
