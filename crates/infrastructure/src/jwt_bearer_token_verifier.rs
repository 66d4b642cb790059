//! HS256 JSON Web Token verification for end-user bearer tokens.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use shiftledger_application::BearerTokenVerifier;
use shiftledger_core::{AppError, AppResult, TenantId};

#[derive(Debug, Deserialize)]
struct TenantClaims {
    sub: String,
}

/// Verifies HS256 tokens whose `sub` claim carries the tenant id.
///
/// Expiry is always enforced.
#[derive(Clone)]
pub struct JwtBearerTokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtBearerTokenVerifier {
    /// Creates a verifier for tokens signed with the shared secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl BearerTokenVerifier for JwtBearerTokenVerifier {
    fn verify(&self, token: &str) -> AppResult<TenantId> {
        let token_data = decode::<TenantClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|error| AppError::Unauthorized(format!("invalid bearer token: {error}")))?;

        token_data
            .claims
            .sub
            .parse::<TenantId>()
            .map_err(|error| AppError::Unauthorized(format!("invalid token subject: {error}")))
    }
}
