use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Verifies session tokens minted by the hosted identity provider. The
/// provider and this service share a signing secret; the token's `sub` is the
/// provider-side identity, which `auth::ensure_user` maps to an internal row.
#[derive(Clone)]
pub struct JwtService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

impl JwtService {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
        })
    }

    pub fn verify_identity_token(&self, token: &str) -> Result<IdentityClaims> {
        let mut validation = Validation::default();
        validation.set_audience(&[self.audience.clone()]);
        validation.set_issuer(&[self.issuer.clone()]);
        let data = decode::<IdentityClaims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// Mints a token shaped like the identity provider's. Used by local
    /// tooling and the integration tests; production tokens come from the
    /// provider itself.
    pub fn mint_identity_token(
        &self,
        external_id: &str,
        email: &str,
        name: Option<&str>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(1);
        let claims = IdentityClaims {
            sub: external_id.to_owned(),
            email: email.to_owned(),
            name: name.map(str::to_owned),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub sub: String,
    pub email: String,
    pub name: Option<String>,
    pub iss: String,
    pub aud: String,
    pub iat: usize,
    pub exp: usize,
}
