use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context as _;
use jsonwebtoken::{EncodingKey, Header, encode};

use otpgate_auth_types::token::{JwtClaims, TOKEN_ALGORITHM};

use crate::domain::repository::TokenIssuer;
use crate::domain::types::{Credential, TokenClaims};
use crate::error::AuthServiceError;

/// HS256 access tokens signed with the process-wide auth secret.
#[derive(Clone)]
pub struct JwtTokenIssuer {
    secret: String,
    expiry_period_secs: u64,
}

impl JwtTokenIssuer {
    pub fn new(secret: impl Into<String>, expiry_period_secs: u64) -> Self {
        Self {
            secret: secret.into(),
            expiry_period_secs,
        }
    }
}

fn now_secs() -> Result<u64, AuthServiceError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before UNIX epoch")
        .map_err(AuthServiceError::Token)?;
    Ok(elapsed.as_secs())
}

impl TokenIssuer for JwtTokenIssuer {
    fn generate(&self, claims: &TokenClaims) -> Result<Credential, AuthServiceError> {
        let iat = now_secs()?;
        let jwt_claims = JwtClaims {
            sub: claims.user_id.to_string(),
            role: claims.role.clone(),
            iat,
            exp: iat + self.expiry_period_secs,
        };
        let token = encode(
            &Header::new(TOKEN_ALGORITHM),
            &jwt_claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("sign access token")
        .map_err(AuthServiceError::Token)?;
        Ok(Credential {
            token,
            expires_in: self.expiry_period_secs,
        })
    }
}
