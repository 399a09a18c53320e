/// JWT token generation and validation
///
/// Tokens are signed with HS256 (HMAC-SHA256) and carry the user id, the
/// user's role, and the token type. Verification is stateless: nothing is
/// persisted, and a token stays valid until its natural expiry.
///
/// # Token Types
///
/// - **Access token**: short-lived (minutes), used for API authentication
/// - **Refresh token**: long-lived (days), exchanged for a fresh pair
///
/// # Example
///
/// ```
/// use teamline_shared::auth::jwt::{create_token, validate_token, Claims, TokenType};
/// use teamline_shared::models::user::Role;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let claims = Claims::new(user_id, Role::Employee, TokenType::Access, Duration::minutes(15));
/// let token = create_token(&claims, "your-secret-key-at-least-32-bytes")?;
///
/// let validated = validate_token(&token, "your-secret-key-at-least-32-bytes")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::Role;

/// Issuer claim embedded in every token
const ISSUER: &str = "teamline";

/// Error type for JWT operations
///
/// Verification failures are classified so the caller can distinguish an
/// expired token from a forged or garbled one.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    Create(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature does not verify against the configured secret
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token is structurally invalid (bad encoding, missing claims, wrong issuer)
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Token verified but is of the wrong type for this operation
    #[error("Expected {expected} token, got {actual}")]
    WrongType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token (short-lived)
    Access,

    /// Refresh token (long-lived)
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
/// - `iss`: Issuer (always "teamline")
/// - `iat`: Issued at timestamp
/// - `exp`: Expiration timestamp
/// - `nbf`: Not before timestamp
///
/// # Custom Claims
///
/// - `role`: The user's role at issue time
/// - `token_type`: Access or refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "teamline"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// User role (custom claim)
    pub role: Role,

    /// Token type (custom claim)
    pub token_type: TokenType,
}

impl Claims {
    /// Creates new claims expiring `expires_in` from now
    ///
    /// The expiry is computed at issue time from the configured duration
    /// (access tokens: minutes, refresh tokens: days).
    pub fn new(user_id: Uuid, role: Role, token_type: TokenType, expires_in: Duration) -> Self {
        let now = Utc::now();
        let expiration = now + expires_in;

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            nbf: now.timestamp(),
            role,
            token_type,
        }
    }

    /// Checks if token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// An access + refresh token pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Access token
    pub access_token: String,

    /// Refresh token
    pub refresh_token: String,
}

/// Creates a JWT token from claims
///
/// Signs the token using HS256 with the provided secret.
///
/// # Errors
///
/// Returns `JwtError::Create` if token encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| JwtError::Create(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT token and extracts claims
///
/// Verifies the signature, the expiry, the not-before bound, and the issuer.
///
/// # Errors
///
/// - `JwtError::Expired` if the token is past its expiry
/// - `JwtError::InvalidSignature` if the signature doesn't match
/// - `JwtError::Malformed` for anything else (bad encoding, wrong issuer,
///   missing claims)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::Malformed(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Validates a token and checks it's an access token
///
/// Refresh tokens are rejected so they can never be used to call protected
/// endpoints directly.
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Access {
        return Err(JwtError::WrongType {
            expected: TokenType::Access.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and checks it's a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != TokenType::Refresh {
        return Err(JwtError::WrongType {
            expected: TokenType::Refresh.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Issues an access + refresh token pair for a user
///
/// # Arguments
///
/// * `user_id` - Subject of both tokens
/// * `role` - Role claim embedded in both tokens
/// * `secret` - HS256 signing secret
/// * `access_ttl` - Access token lifetime
/// * `refresh_ttl` - Refresh token lifetime
pub fn issue_pair(
    user_id: Uuid,
    role: Role,
    secret: &str,
    access_ttl: Duration,
    refresh_ttl: Duration,
) -> Result<TokenPair, JwtError> {
    let access_claims = Claims::new(user_id, role, TokenType::Access, access_ttl);
    let refresh_claims = Claims::new(user_id, role, TokenType::Refresh, refresh_ttl);

    Ok(TokenPair {
        access_token: create_token(&access_claims, secret)?,
        refresh_token: create_token(&refresh_claims, secret)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, Role::Employee, TokenType::Access, Duration::minutes(15));

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, "teamline");
        assert_eq!(claims.role, Role::Employee);
        assert_eq!(claims.token_type, TokenType::Access);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();

        let claims = Claims::new(user_id, Role::Manager, TokenType::Access, Duration::minutes(15));
        let token = create_token(&claims, SECRET).expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.role, Role::Manager);
        assert_eq!(validated.token_type, TokenType::Access);
        assert_eq!(validated.iss, "teamline");
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), Role::Employee, TokenType::Access, Duration::minutes(15));
        let token = create_token(&claims, "secret-one-for-signing-this-token").expect("Should create token");

        let result = validate_token(&token, "wrong-secret-for-validation-here");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_validate_expired_token() {
        // Issued already past its expiry; signature is still valid.
        let claims = Claims::new(
            Uuid::new_v4(),
            Role::Employee,
            TokenType::Access,
            Duration::seconds(-3600),
        );

        assert!(claims.is_expired());

        let token = create_token(&claims, SECRET).expect("Should create token");
        let result = validate_token(&token, SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_validate_garbage_token() {
        let result = validate_token("not-a-jwt-at-all", SECRET);
        assert!(matches!(result, Err(JwtError::Malformed(_))));
    }

    #[test]
    fn test_validate_access_token_rejects_refresh() {
        let refresh_claims = Claims::new(Uuid::new_v4(), Role::Employee, TokenType::Refresh, Duration::days(30));
        let refresh_token = create_token(&refresh_claims, SECRET).unwrap();

        assert!(matches!(
            validate_access_token(&refresh_token, SECRET),
            Err(JwtError::WrongType { .. })
        ));

        let access_claims = Claims::new(Uuid::new_v4(), Role::Employee, TokenType::Access, Duration::minutes(15));
        let access_token = create_token(&access_claims, SECRET).unwrap();
        assert!(validate_access_token(&access_token, SECRET).is_ok());
    }

    #[test]
    fn test_validate_refresh_token_rejects_access() {
        let access_claims = Claims::new(Uuid::new_v4(), Role::Employee, TokenType::Access, Duration::minutes(15));
        let access_token = create_token(&access_claims, SECRET).unwrap();

        assert!(matches!(
            validate_refresh_token(&access_token, SECRET),
            Err(JwtError::WrongType { .. })
        ));
    }

    #[test]
    fn test_issue_pair() {
        let user_id = Uuid::new_v4();

        let pair = issue_pair(
            user_id,
            Role::Administrator,
            SECRET,
            Duration::minutes(15),
            Duration::days(30),
        )
        .expect("Should issue pair");

        let access = validate_access_token(&pair.access_token, SECRET).unwrap();
        assert_eq!(access.sub, user_id);
        assert_eq!(access.role, Role::Administrator);

        let refresh = validate_refresh_token(&pair.refresh_token, SECRET).unwrap();
        assert_eq!(refresh.sub, user_id);
        assert_eq!(refresh.role, Role::Administrator);
    }
}
