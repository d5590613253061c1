//! JWT token issuing and validation
//!
//! Access and refresh tokens are HS256-signed JWTs carrying the user id as
//! subject. Each kind has its own secret and lifetime, so a token of one kind
//! never verifies as the other even before the `token_type` claim is checked.
//!
//! # Security
//!
//! - **Algorithm**: HS256 (HMAC with SHA-256)
//! - **Validation**: signature, expiration, not-before, issuer and token kind
//! - **Secrets**: at least 32 bytes each, distinct per kind
//!
//! # Example
//!
//! ```
//! use chrono::Duration;
//! use taskvault_shared::auth::jwt::{TokenConfig, TokenIssuer, TokenType};
//! use taskvault_shared::models::UserId;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = TokenIssuer::new(&TokenConfig {
//!     access_secret: "access-secret-that-is-at-least-32-bytes".to_string(),
//!     access_ttl: Duration::minutes(15),
//!     refresh_secret: "refresh-secret-that-is-at-least-32-bytes".to_string(),
//!     refresh_ttl: Duration::days(10),
//! });
//!
//! let user_id = UserId::new();
//! let pair = issuer.issue_pair(user_id)?;
//!
//! let claims = issuer.verify(&pair.access_token, TokenType::Access)?;
//! assert_eq!(claims.sub, user_id);
//!
//! // A refresh token is not an access token
//! assert!(issuer.verify(&pair.refresh_token, TokenType::Access).is_err());
//! # Ok(())
//! # }
//! ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::UserId;

/// Value of the `iss` claim
pub const ISSUER: &str = "taskvault";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Token kind does not match the expected kind
    #[error("Expected {expected} token, got {actual} token")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Short-lived token authenticating individual requests
    Access,

    /// Long-lived token used to mint a new pair
    Refresh,
}

impl TokenType {
    /// Gets token type as string
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer (always "taskvault")
/// - `iat`: Issued at timestamp
/// - `nbf`: Not before timestamp
/// - `exp`: Expiration timestamp
/// - `jti`: Random token id
///
/// # Custom Claims
///
/// - `token_type`: Access or refresh token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: UserId,

    /// Issuer - Always "taskvault"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Token id, unique per issued token
    pub jti: Uuid,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims valid from now for `expires_in`
    pub fn new(user_id: UserId, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            jti: Uuid::new_v4(),
            token_type,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Secrets and lifetimes for both token kinds
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

/// A freshly minted access + refresh token pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn from_secret(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Mints and verifies access and refresh tokens
///
/// Built once at startup from [`TokenConfig`] and shared read-only afterwards.
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access.ttl)
            .field("refresh_ttl", &self.refresh.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    /// Creates an issuer from configuration
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: SigningKeys::from_secret(&config.access_secret, config.access_ttl),
            refresh: SigningKeys::from_secret(&config.refresh_secret, config.refresh_ttl),
        }
    }

    fn keys(&self, kind: TokenType) -> &SigningKeys {
        match kind {
            TokenType::Access => &self.access,
            TokenType::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given kind
    pub fn ttl(&self, kind: TokenType) -> Duration {
        self.keys(kind).ttl
    }

    /// Signs a token of the given kind for `user_id`
    pub fn issue(&self, user_id: UserId, kind: TokenType) -> Result<String, JwtError> {
        let keys = self.keys(kind);
        let claims = Claims::new(user_id, kind, keys.ttl);
        sign(&claims, &keys.encoding)
    }

    /// Signs a short-lived access token
    pub fn issue_access_token(&self, user_id: UserId) -> Result<String, JwtError> {
        self.issue(user_id, TokenType::Access)
    }

    /// Signs a long-lived refresh token
    pub fn issue_refresh_token(&self, user_id: UserId) -> Result<String, JwtError> {
        self.issue(user_id, TokenType::Refresh)
    }

    /// Signs a fresh access + refresh pair
    pub fn issue_pair(&self, user_id: UserId) -> Result<TokenPair, JwtError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    /// Validates a token of the expected kind and returns its claims
    ///
    /// Verifies:
    /// - Signature under the secret of `expected`
    /// - Token hasn't expired and is not used before `nbf`
    /// - Issuer is "taskvault"
    /// - `token_type` equals `expected`
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let claims = validate(token, &self.keys(expected).decoding)?;

        if claims.token_type != expected {
            return Err(JwtError::WrongType {
                expected: expected.as_str(),
                actual: claims.token_type.as_str(),
            });
        }

        Ok(claims)
    }
}

fn sign(claims: &Claims, key: &EncodingKey) -> Result<String, JwtError> {
    encode(&Header::new(Algorithm::HS256), claims, key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

fn validate(token: &str, key: &DecodingKey) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &str = "access-secret-key-at-least-32-bytes-long";
    const REFRESH_SECRET: &str = "refresh-secret-key-at-least-32-bytes-long";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&TokenConfig {
            access_secret: ACCESS_SECRET.to_string(),
            access_ttl: Duration::minutes(15),
            refresh_secret: REFRESH_SECRET.to_string(),
            refresh_ttl: Duration::days(10),
        })
    }

    #[test]
    fn test_claims_creation() {
        let user_id = UserId::new();
        let claims = Claims::new(user_id, TokenType::Access, Duration::hours(1));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "taskvault");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_issue_and_verify_pair() {
        let issuer = issuer();
        let user_id = UserId::new();
        let pair = issuer.issue_pair(user_id).expect("Should issue pair");

        let access = issuer.verify(&pair.access_token, TokenType::Access).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.token_type, TokenType::Access);
        assert_eq!(access.exp - access.iat, 15 * 60);

        let refresh = issuer.verify(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert_eq!(refresh.sub, user_id);
        assert_eq!(refresh.exp - refresh.iat, 10 * 24 * 3600);
    }

    #[test]
    fn test_tokens_minted_in_same_second_differ() {
        let issuer = issuer();
        let user_id = UserId::new();

        let first = issuer.issue_refresh_token(user_id).unwrap();
        let second = issuer.issue_refresh_token(user_id).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_kinds_are_not_interchangeable() {
        let issuer = issuer();
        let pair = issuer.issue_pair(UserId::new()).unwrap();

        assert!(issuer.verify(&pair.access_token, TokenType::Refresh).is_err());
        assert!(issuer.verify(&pair.refresh_token, TokenType::Access).is_err());
    }

    #[test]
    fn test_wrong_type_detected_with_shared_secret() {
        let issuer = TokenIssuer::new(&TokenConfig {
            access_secret: ACCESS_SECRET.to_string(),
            access_ttl: Duration::minutes(15),
            refresh_secret: ACCESS_SECRET.to_string(),
            refresh_ttl: Duration::days(10),
        });
        let refresh = issuer.issue_refresh_token(UserId::new()).unwrap();

        let err = issuer.verify(&refresh, TokenType::Access).unwrap_err();
        assert!(matches!(
            err,
            JwtError::WrongType {
                expected: "access",
                actual: "refresh"
            }
        ));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let other = TokenIssuer::new(&TokenConfig {
            access_secret: "a-completely-different-access-secret!!".to_string(),
            access_ttl: Duration::minutes(15),
            refresh_secret: REFRESH_SECRET.to_string(),
            refresh_ttl: Duration::days(10),
        });
        let token = other.issue_access_token(UserId::new()).unwrap();

        assert!(matches!(
            issuer().verify(&token, TokenType::Access),
            Err(JwtError::ValidationError(_))
        ));
    }

    #[test]
    fn test_verify_expired_token() {
        let claims = Claims::new(UserId::new(), TokenType::Access, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = sign(&claims, &EncodingKey::from_secret(ACCESS_SECRET.as_bytes())).unwrap();
        let result = issuer().verify(&token, TokenType::Access);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_verify_rejects_foreign_issuer() {
        let mut claims = Claims::new(UserId::new(), TokenType::Access, Duration::minutes(5));
        claims.iss = "someone-else".to_string();

        let token = sign(&claims, &EncodingKey::from_secret(ACCESS_SECRET.as_bytes())).unwrap();
        assert!(issuer().verify(&token, TokenType::Access).is_err());
    }

    #[test]
    fn test_verify_malformed() {
        let issuer = issuer();
        assert!(issuer.verify("", TokenType::Access).is_err());
        assert!(issuer.verify("not.a.jwt", TokenType::Access).is_err());
    }
}
