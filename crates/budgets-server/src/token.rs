//! JWT access tokens
//!
//! Tokens are HS256-signed and carry the user id as `sub`. They are issued at
//! registration and login and checked by the auth middleware on every
//! protected route.

use std::time::Duration;

use anyhow::bail;
use budgets_core::User;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Default token lifetime (24 hours)
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Longest accepted token lifetime (10 years)
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Signing configuration for access tokens
#[derive(Clone)]
pub struct JwtConfig {
    secret: Vec<u8>,
    pub token_ttl: Duration,
}

impl JwtConfig {
    pub fn new(secret: &str, token_ttl: Duration) -> anyhow::Result<Self> {
        let secret = secret.trim();
        if secret.len() < MIN_SECRET_LEN {
            bail!("JWT secret must be at least {} bytes", MIN_SECRET_LEN);
        }
        if token_ttl.is_zero() {
            bail!("Token lifetime must be greater than zero");
        }
        if token_ttl > MAX_TOKEN_TTL {
            bail!(
                "Token lifetime must be at most {} seconds",
                MAX_TOKEN_TTL.as_secs()
            );
        }
        Ok(Self {
            secret: secret.as_bytes().to_vec(),
            token_ttl,
        })
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and validates access tokens
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
            token_ttl: config.token_ttl,
        }
    }

    /// Sign a token for `user`
    pub fn issue(&self, user: &User) -> jsonwebtoken::errors::Result<String> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.token_ttl.as_secs()).map_err(|_| ErrorKind::InvalidToken)?;
        let exp = now.checked_add(ttl).ok_or(ErrorKind::InvalidToken)?;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now,
            exp,
        };
        self.sign(&claims)
    }

    pub(crate) fn sign(&self, claims: &Claims) -> jsonwebtoken::errors::Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }

    /// Check signature and expiry, returning the claims
    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const SECRET: &str = "test-secret-that-is-at-least-32-bytes-long";

    fn user() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Tester".to_string(),
            email: "tester@example.com".to_string(),
            password_hash: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_config_rejects_short_secret() {
        assert!(JwtConfig::new("too-short", DEFAULT_TOKEN_TTL).is_err());
        assert!(JwtConfig::new(SECRET, Duration::ZERO).is_err());
        assert!(JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL).is_ok());
        assert!(JwtConfig::new(SECRET, MAX_TOKEN_TTL).is_ok());
        assert!(JwtConfig::new(SECRET, MAX_TOKEN_TTL + Duration::from_secs(1)).is_err());
        assert!(JwtConfig::new(SECRET, Duration::from_secs(1 << 63)).is_err());
        assert!(JwtConfig::new(SECRET, Duration::from_secs(u64::MAX)).is_err());
    }

    #[test]
    fn test_longest_lifetime_token_verifies() {
        let service = TokenService::new(&JwtConfig::new(SECRET, MAX_TOKEN_TTL).unwrap());
        let token = service.issue(&user()).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL.as_secs() as i64);
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(&JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL).unwrap());
        let user = user();

        let token = service.issue(&user).unwrap();
        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.exp - claims.iat, DEFAULT_TOKEN_TTL.as_secs() as i64);
    }

    #[test]
    fn test_verify_rejects_other_secret() {
        let issuer = TokenService::new(&JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL).unwrap());
        let other = TokenService::new(
            &JwtConfig::new("another-secret-that-is-also-32-bytes-long!", DEFAULT_TOKEN_TTL)
                .unwrap(),
        );

        let token = issuer.issue(&user()).unwrap();
        assert!(other.verify(&token).is_err());
        assert!(issuer.verify("not.a.token").is_err());
    }

    #[test]
    fn test_verify_rejects_expired() {
        let service = TokenService::new(&JwtConfig::new(SECRET, DEFAULT_TOKEN_TTL).unwrap());
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            email: "old@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = service.sign(&claims).unwrap();
        assert!(service.verify(&token).is_err());
    }
}
