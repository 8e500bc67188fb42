//! Authentication and session utilities
//!
//! Provides:
//! - The `AuthProvider` contract over the external identity service
//! - JWT session token generation and validation
//! - The `Session` extractor admin routes require
//!
//! There is no role model: any authenticated principal may use the
//! whole admin surface. Sign-out is session termination on the client
//! side; tokens are not tracked server-side.

use crate::config::AuthConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Shortest secret the providers accept
pub const MIN_SECRET_LEN: usize = 6;

/// An authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

/// Checked before any network call is made
fn check_secret(secret: &str) -> Result<()> {
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(AppError::Validation {
            message: format!("secret must be at least {} characters", MIN_SECRET_LEN),
            field: Some("secret".to_string()),
        });
    }
    Ok(())
}

/// Contract over the external identity service
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal>;
    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<Principal>;
    async fn sign_out(&self, principal: &Principal) -> Result<()>;
}

/// JWT claims carried by a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (principal id)
    pub sub: String,

    /// Principal email
    pub email: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT session token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: expiration_secs as i64,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| AppError::Configuration {
                message: "auth.jwt_secret is required".to_string(),
            })?;
        Ok(Self::new(secret, config.jwt_expiration_secs))
    }

    /// Issue a session token for a signed-in principal
    pub fn issue_token(&self, principal: &Principal) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = SessionClaims {
            sub: principal.id.clone(),
            email: principal.email.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to issue token: {}", e),
        })
    }

    /// Validate and decode a session token
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims> {
        decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Invalid session token".to_string(),
                },
            })
    }
}

/// State that can hand out the JWT manager to the `Session` extractor
pub trait JwtState {
    fn jwt_manager(&self) -> &JwtManager;
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// Per-request session context for admin routes
#[derive(Debug, Clone)]
pub struct Session {
    pub principal: Principal,
}

impl<S> FromRequestParts<S> for Session
where
    S: JwtState + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Missing Authorization header".to_string(),
            })?;

        let token = extract_bearer(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Authorization header must carry a bearer token".to_string(),
        })?;

        let claims = state.jwt_manager().validate_token(token)?;

        Ok(Session {
            principal: Principal {
                id: claims.sub,
                email: claims.email,
            },
        })
    }
}

/// Provider backed by the external identity REST endpoint
pub struct HttpAuthProvider {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct CredentialsBody<'a> {
    identifier: &'a str,
    secret: &'a str,
}

#[derive(Deserialize)]
struct PrincipalResponse {
    id: String,
    email: String,
}

impl HttpAuthProvider {
    pub fn new(config: &AuthConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to build auth client: {}", e),
            })?;
        Ok(Self {
            client,
            base_url: config.provider_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_credentials(
        &self,
        path: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<Principal> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .json(&CredentialsBody { identifier, secret })
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable {
                message: format!("Identity service unreachable: {}", e),
            })?;

        match response.status() {
            s if s.is_success() => {
                let body: PrincipalResponse =
                    response.json().await.map_err(|e| AppError::Internal {
                        message: format!("Malformed identity response: {}", e),
                    })?;
                Ok(Principal {
                    id: body.id,
                    email: body.email,
                })
            }
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(AppError::InvalidCredentials)
            }
            reqwest::StatusCode::CONFLICT => Err(AppError::Validation {
                message: "An account with this identifier already exists".to_string(),
                field: Some("identifier".to_string()),
            }),
            s => Err(AppError::ServiceUnavailable {
                message: format!("Identity service returned {}", s),
            }),
        }
    }
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal> {
        check_secret(secret)?;
        self.post_credentials("sign-in", identifier, secret).await
    }

    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<Principal> {
        check_secret(secret)?;
        self.post_credentials("sign-up", identifier, secret).await
    }

    async fn sign_out(&self, _principal: &Principal) -> Result<()> {
        // Stateless sessions; termination is client-side token disposal
        Ok(())
    }
}

/// Hash a secret for storage
pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// In-memory provider for tests and local runs
#[derive(Default)]
pub struct MemoryAuthProvider {
    accounts: Mutex<HashMap<String, (String, String)>>,
    seq: AtomicU64,
}

impl MemoryAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn sign_in(&self, identifier: &str, secret: &str) -> Result<Principal> {
        check_secret(secret)?;
        let accounts = self
            .accounts
            .lock()
            .map_err(|_| AppError::Internal {
                message: "auth state poisoned".to_string(),
            })?;
        match accounts.get(identifier) {
            Some((id, hash)) if *hash == hash_secret(secret) => Ok(Principal {
                id: id.clone(),
                email: identifier.to_string(),
            }),
            _ => Err(AppError::InvalidCredentials),
        }
    }

    async fn sign_up(&self, identifier: &str, secret: &str) -> Result<Principal> {
        check_secret(secret)?;
        let mut accounts = self
            .accounts
            .lock()
            .map_err(|_| AppError::Internal {
                message: "auth state poisoned".to_string(),
            })?;
        if accounts.contains_key(identifier) {
            return Err(AppError::Validation {
                message: "An account with this identifier already exists".to_string(),
                field: Some("identifier".to_string()),
            });
        }
        let id = format!("user-{}", self.seq.fetch_add(1, Ordering::SeqCst) + 1);
        accounts.insert(
            identifier.to_string(),
            (id.clone(), hash_secret(secret)),
        );
        Ok(Principal {
            id,
            email: identifier.to_string(),
        })
    }

    async fn sign_out(&self, _principal: &Principal) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer("abc.def"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }

    #[test]
    fn test_jwt_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        let principal = Principal {
            id: "user-1".into(),
            email: "admin@example.org".into(),
        };

        let token = manager.issue_token(&principal).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email, "admin@example.org");
    }

    #[test]
    fn test_tampered_token_rejected() {
        let manager = JwtManager::new("test_secret", 3600);
        let other = JwtManager::new("other_secret", 3600);
        let principal = Principal {
            id: "user-1".into(),
            email: "admin@example.org".into(),
        };

        let token = manager.issue_token(&principal).unwrap();
        assert!(other.validate_token(&token).is_err());
    }

    #[tokio::test]
    async fn test_short_secret_rejected_before_any_lookup() {
        let provider = MemoryAuthProvider::new();
        let err = provider.sign_in("a@b.org", "12345").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_secret_length_counts_characters_not_bytes() {
        let provider = MemoryAuthProvider::new();

        // Three characters, six bytes in UTF-8.
        let err = provider.sign_up("a@b.org", "ñññ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));

        assert!(provider.sign_up("a@b.org", "ñññññ1").await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let provider = MemoryAuthProvider::new();
        let created = provider.sign_up("a@b.org", "secret1").await.unwrap();
        let signed_in = provider.sign_in("a@b.org", "secret1").await.unwrap();
        assert_eq!(created, signed_in);
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let provider = MemoryAuthProvider::new();
        provider.sign_up("a@b.org", "secret1").await.unwrap();
        let err = provider.sign_in("a@b.org", "secret2").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let provider = MemoryAuthProvider::new();
        provider.sign_up("a@b.org", "secret1").await.unwrap();
        assert!(provider.sign_up("a@b.org", "secret1").await.is_err());
    }
}
