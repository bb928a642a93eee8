//! ID Token Sign-In
//!
//! The ranking backend trusts an external identity provider (Google via
//! Firebase, Auth0, Supabase...). A sign-in is a provider ID token that
//! validates against the configured key; its `sub` becomes the player's
//! ranking document id.

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Which tokens the ranking backend accepts.
#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    /// Required `iss`, if any.
    pub issuer: Option<String>,
    /// Required `aud`, if any.
    pub audience: Option<String>,
    /// Provider RS256 public key (PEM). Takes precedence over `secret`.
    pub public_key_pem: Option<String>,
    /// HS256 shared secret.
    pub secret: Option<String>,
    /// Accept expired tokens (local testing).
    pub skip_expiry: bool,
}

impl AuthConfig {
    /// Read `AUTH_ISSUER`, `AUTH_AUDIENCE`, `AUTH_PUBLIC_KEY_PEM`,
    /// `AUTH_SECRET` and `AUTH_SKIP_EXPIRY`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            issuer: var("AUTH_ISSUER"),
            audience: var("AUTH_AUDIENCE"),
            public_key_pem: var("AUTH_PUBLIC_KEY_PEM"),
            secret: var("AUTH_SECRET"),
            skip_expiry: matches!(var("AUTH_SKIP_EXPIRY").as_deref(), Some("1" | "true")),
        }
    }

    /// HS256 with a shared secret and no issuer/audience pinning.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// A key is set.
    pub fn is_configured(&self) -> bool {
        self.public_key_pem.is_some() || self.secret.is_some()
    }

    fn key(&self) -> Result<(DecodingKey, Algorithm), AuthError> {
        if let Some(pem) = &self.public_key_pem {
            let key = DecodingKey::from_rsa_pem(pem.as_bytes())
                .map_err(|e| AuthError::InvalidKey(e.to_string()))?;
            return Ok((key, Algorithm::RS256));
        }
        match &self.secret {
            Some(secret) => Ok((DecodingKey::from_secret(secret.as_bytes()), Algorithm::HS256)),
            None => Err(AuthError::NotConfigured),
        }
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.required_spec_claims.clear();
        validation.validate_exp = !self.skip_expiry;
        match &self.audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }
        if let Some(iss) = &self.issuer {
            validation.set_issuer(&[iss]);
        }
        validation
    }
}

/// ID token claims the game reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Provider user id.
    pub sub: String,
    /// Expiry, Unix seconds.
    #[serde(default)]
    pub exp: u64,
    /// Issued at, Unix seconds.
    #[serde(default)]
    pub iat: u64,
    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    /// Audience (string or list).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<serde_json::Value>,
    /// Account display name, e.g. the Google profile name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A signed-in player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Provider user id; also the ranking document id.
    pub uid: String,
    /// Account display name, for the welcome line.
    pub provider_name: Option<String>,
}

impl Identity {
    /// Identity carried by validated claims.
    pub fn from_claims(claims: &TokenClaims) -> Self {
        Self {
            uid: claims.sub.clone(),
            provider_name: claims.name.clone(),
        }
    }

    /// 8 hex chars standing in for the uid in logs.
    pub fn log_id(&self) -> String {
        let digest = Sha256::new()
            .chain_update(b"hue-hunter-player:")
            .chain_update(self.uid.as_bytes())
            .finalize();
        hex::encode(&digest[..4])
    }
}

/// Why a sign-in was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// No key to validate against.
    #[error("authentication not configured")]
    NotConfigured,
    /// The player presented no token.
    #[error("no credential presented")]
    NoCredential,
    /// Configured key could not be parsed.
    #[error("invalid verification key: {0}")]
    InvalidKey(String),
    /// Not a JWT.
    #[error("invalid token format")]
    InvalidFormat,
    /// Signed with some other key.
    #[error("invalid signature")]
    InvalidSignature,
    /// Past `exp`.
    #[error("token expired")]
    Expired,
    /// Wrong `iss`.
    #[error("invalid issuer")]
    InvalidIssuer,
    /// Wrong `aud`.
    #[error("invalid audience")]
    InvalidAudience,
    /// Claim absent or empty.
    #[error("missing required claim: {0}")]
    MissingClaim(&'static str),
    /// Any other decode failure.
    #[error("token rejected: {0}")]
    Rejected(String),
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
            ErrorKind::InvalidAudience => AuthError::InvalidAudience,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) => AuthError::InvalidFormat,
            _ => AuthError::Rejected(err.to_string()),
        }
    }
}

/// Check a token's signature and claims.
pub fn validate_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let (key, algorithm) = config.key()?;
    let claims = decode::<TokenClaims>(token, &key, &config.validation(algorithm))?.claims;
    if claims.sub.is_empty() {
        return Err(AuthError::MissingClaim("sub"));
    }
    Ok(claims)
}

/// Sign a player in from their ID token.
pub fn authenticate(token: &str, config: &AuthConfig) -> Result<Identity, AuthError> {
    validate_token(token, config).map(|claims| Identity::from_claims(&claims))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) const TEST_SECRET: &str = "test-secret-key-256-bits-long!!";

    /// HS256 token over `claims`.
    pub(crate) fn create_test_token(claims: &TokenClaims, secret: &str) -> String {
        encode(&Header::new(Algorithm::HS256), claims, &EncodingKey::from_secret(secret.as_bytes()))
            .unwrap()
    }

    /// Claims for `sub`, valid for the next hour.
    pub(crate) fn test_claims(sub: &str) -> TokenClaims {
        let now = Utc::now().timestamp() as u64;
        TokenClaims {
            sub: sub.into(),
            exp: now + 3600,
            iat: now,
            iss: Some("test-issuer".into()),
            aud: Some(serde_json::json!("test-audience")),
            name: Some("Test Player".into()),
        }
    }

    fn expired(sub: &str) -> TokenClaims {
        TokenClaims { exp: 1, ..test_claims(sub) }
    }

    #[test]
    fn test_token_signs_player_in() {
        let token = create_test_token(&test_claims("google-uid-1"), TEST_SECRET);
        let identity = authenticate(&token, &AuthConfig::with_secret(TEST_SECRET)).unwrap();

        assert_eq!(identity.uid, "google-uid-1");
        assert_eq!(identity.provider_name.as_deref(), Some("Test Player"));
    }

    #[test]
    fn test_refusals() {
        let config = AuthConfig::with_secret(TEST_SECRET);

        let foreign = create_test_token(&test_claims("u"), "another-secret-entirely-123456");
        assert_eq!(authenticate(&foreign, &config), Err(AuthError::InvalidSignature));

        let stale = create_test_token(&expired("u"), TEST_SECRET);
        assert_eq!(authenticate(&stale, &config), Err(AuthError::Expired));

        let anonymous = create_test_token(&test_claims(""), TEST_SECRET);
        assert_eq!(authenticate(&anonymous, &config), Err(AuthError::MissingClaim("sub")));

        assert_eq!(authenticate("not-a-jwt", &config), Err(AuthError::InvalidFormat));
        assert_eq!(
            authenticate(&foreign, &AuthConfig::default()),
            Err(AuthError::NotConfigured)
        );
    }

    #[test]
    fn test_issuer_and_audience_pinning() {
        let token = create_test_token(&test_claims("u"), TEST_SECRET);

        let pinned = AuthConfig {
            issuer: Some("test-issuer".into()),
            audience: Some("test-audience".into()),
            ..AuthConfig::with_secret(TEST_SECRET)
        };
        assert!(validate_token(&token, &pinned).is_ok());

        let other_issuer = AuthConfig { issuer: Some("elsewhere".into()), ..pinned.clone() };
        assert_eq!(validate_token(&token, &other_issuer).err(), Some(AuthError::InvalidIssuer));

        let other_audience = AuthConfig { audience: Some("elsewhere".into()), ..pinned };
        assert_eq!(validate_token(&token, &other_audience).err(), Some(AuthError::InvalidAudience));
    }

    #[test]
    fn test_skip_expiry() {
        let token = create_test_token(&expired("u"), TEST_SECRET);
        let config = AuthConfig { skip_expiry: true, ..AuthConfig::with_secret(TEST_SECRET) };
        assert!(validate_token(&token, &config).is_ok());
    }

    #[test]
    fn test_log_id_short_and_stable() {
        let a = Identity { uid: "user123".into(), provider_name: None };
        let b = Identity { uid: "user456".into(), provider_name: None };

        assert_eq!(a.log_id(), a.log_id());
        assert_ne!(a.log_id(), b.log_id());
        assert_eq!(a.log_id().len(), 8);
    }
}
