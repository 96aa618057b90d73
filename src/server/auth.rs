//! JWT authentication
//!
//! Bearer-token authentication over the configured user table. Page and form
//! routes are public; a valid access token upgrades the request with an
//! authenticated identity, its absence leaves the request anonymous. The
//! content/progress core never sees tokens, only the resolved username.

use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

use crate::config::{AuthConfig, UserEntry};

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
    /// User roles
    pub roles: Vec<String>,
    /// Token ID for revocation
    pub jti: String,
}

/// Token type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Resolved request identity, inserted by `identity_middleware` on every
/// page/form route. `None` means anonymous, never an error.
#[derive(Debug, Clone, Default)]
pub struct Identity(pub Option<String>);

impl Identity {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Login failure modes surfaced to the login handler
#[derive(Debug, Clone, Error)]
pub enum LoginError {
    #[error("account locked, retry in {0} minutes")]
    Locked(i64),
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Authentication state
pub struct AuthState {
    config: AuthConfig,
    jwt_secret: String,
    /// Configured accounts keyed by username
    users: HashMap<String, UserEntry>,
    /// Revoked token IDs (for logout)
    revoked_tokens: RwLock<HashMap<String, DateTime<Utc>>>,
    /// Failed login attempts
    login_attempts: RwLock<HashMap<String, (u32, DateTime<Utc>)>>,
}

impl AuthState {
    /// Create auth state from config with a resolved JWT secret
    pub fn new(config: AuthConfig, jwt_secret: String) -> Arc<Self> {
        let users = config
            .users
            .iter()
            .map(|u| (u.username.clone(), u.clone()))
            .collect();
        Arc::new(Self {
            config,
            jwt_secret,
            users,
            revoked_tokens: RwLock::new(HashMap::new()),
            login_attempts: RwLock::new(HashMap::new()),
        })
    }

    /// Verify credentials against the user table, tracking failed attempts.
    /// Returns the user's roles on success.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Vec<String>, LoginError> {
        if let Some(remaining) = self.lockout_remaining(username) {
            return Err(LoginError::Locked(remaining.num_minutes().max(1)));
        }

        let valid = self
            .users
            .get(username)
            .map(|user| verify_password(password, &user.password_hash))
            .unwrap_or(false);

        if !valid {
            self.record_failed_login(username);
            return Err(LoginError::InvalidCredentials);
        }

        self.clear_login_attempts(username);
        Ok(self.users[username].roles.clone())
    }

    pub fn access_token_expiry_minutes(&self) -> i64 {
        self.config.access_token_expiry_minutes
    }

    /// Generate access token for a user
    pub fn generate_access_token(&self, username: &str, roles: &[String]) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::minutes(self.config.access_token_expiry_minutes);
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            token_type: TokenType::Access,
            roles: roles.to_vec(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .context("Failed to encode JWT")
    }

    /// Generate refresh token
    pub fn generate_refresh_token(&self, username: &str) -> Result<String> {
        let now = Utc::now();
        let expiry = now + Duration::days(self.config.refresh_token_expiry_days);
        let claims = Claims {
            sub: username.to_string(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            token_type: TokenType::Refresh,
            roles: vec![],
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .context("Failed to encode refresh token")
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let jti = self.extract_jti(token)?;
        if self.is_token_revoked(&jti) {
            bail!("Token has been revoked");
        }

        let validation = Validation::new(Algorithm::HS256);
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .context("Invalid token")?;

        Ok(token_data.claims)
    }

    /// Extract JTI from a token without expiry validation
    pub fn extract_jti(&self, token: &str) -> Result<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .context("Failed to decode token")?;

        Ok(token_data.claims.jti)
    }

    /// Revoke a token (logout)
    pub fn revoke_token(&self, jti: &str) {
        let mut revoked = self.revoked_tokens.write().unwrap();
        revoked.insert(jti.to_string(), Utc::now());
    }

    fn is_token_revoked(&self, jti: &str) -> bool {
        let revoked = self.revoked_tokens.read().unwrap();
        revoked.contains_key(jti)
    }

    fn record_failed_login(&self, username: &str) {
        let mut attempts = self.login_attempts.write().unwrap();
        let entry = attempts.entry(username.to_string()).or_insert((0, Utc::now()));
        entry.0 += 1;
        entry.1 = Utc::now();
    }

    fn lockout_remaining(&self, username: &str) -> Option<Duration> {
        let attempts = self.login_attempts.read().unwrap();
        if let Some((count, last_attempt)) = attempts.get(username) {
            if *count >= self.config.max_login_attempts {
                let lockout_end =
                    *last_attempt + Duration::minutes(self.config.lockout_duration_minutes);
                let now = Utc::now();
                if now < lockout_end {
                    return Some(lockout_end - now);
                }
            }
        }
        None
    }

    fn clear_login_attempts(&self, username: &str) {
        let mut attempts = self.login_attempts.write().unwrap();
        attempts.remove(username);
    }
}

/// Generate a secure JWT secret
pub fn generate_jwt_secret() -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes)
}

/// Hash a password with a random salt
pub fn hash_password(password: &str) -> String {
    use rand::Rng;
    let mut rng = rand::rng();
    let salt: [u8; 16] = rng.random();
    let salt_b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, salt);

    let combined = format!("{}{}", password, salt_b64);
    let hash = Sha256::digest(combined.as_bytes());
    let hash_b64 = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, hash);

    format!("{}${}", salt_b64, hash_b64)
}

/// Verify a password against a stored salted hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Some((salt_b64, expected)) = hash.split_once('$') else {
        return false;
    };

    let combined = format!("{}{}", password, salt_b64);
    let computed_hash = Sha256::digest(combined.as_bytes());
    let computed_b64 =
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, computed_hash);

    computed_b64 == expected
}

/// Axum middleware resolving the optional request identity. A valid bearer
/// access token yields an authenticated username; anything else (no header,
/// expired or revoked token, refresh token) falls through as anonymous.
pub async fn identity_middleware(
    State(state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "));

    let identity = match bearer {
        Some(token) => match state.validate_token(token) {
            Ok(claims) if claims.token_type == TokenType::Access => Identity(Some(claims.sub)),
            _ => Identity(None),
        },
        None => Identity(None),
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

/// Login request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Refresh token request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Logout request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> Arc<AuthState> {
        let config = AuthConfig {
            users: vec![UserEntry {
                username: "learner".to_string(),
                password_hash: hash_password("springboot4"),
                roles: vec!["LEARNER".to_string()],
            }],
            ..AuthConfig::default()
        };
        AuthState::new(config, generate_jwt_secret())
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let state = test_state();

        let token = state
            .generate_access_token("learner", &["LEARNER".to_string()])
            .unwrap();
        let claims = state.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "learner");
        assert_eq!(claims.roles, vec!["LEARNER"]);
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn test_token_revocation() {
        let state = test_state();

        let token = state.generate_access_token("learner", &[]).unwrap();
        let claims = state.validate_token(&token).unwrap();

        state.revoke_token(&claims.jti);

        assert!(state.validate_token(&token).is_err());
    }

    #[test]
    fn test_refresh_token() {
        let state = test_state();

        let token = state.generate_refresh_token("learner").unwrap();
        let claims = state.validate_token(&token).unwrap();

        assert_eq!(claims.token_type, TokenType::Refresh);
    }

    #[test]
    fn test_authenticate_against_user_table() {
        let state = test_state();

        assert!(state.authenticate("learner", "springboot4").is_ok());
        assert!(matches!(
            state.authenticate("learner", "wrong"),
            Err(LoginError::InvalidCredentials)
        ));
        assert!(matches!(
            state.authenticate("ghost", "springboot4"),
            Err(LoginError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_lockout_after_repeated_failures() {
        let state = test_state();

        for _ in 0..5 {
            let _ = state.authenticate("learner", "wrong");
        }
        assert!(matches!(
            state.authenticate("learner", "springboot4"),
            Err(LoginError::Locked(_))
        ));
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("my_secure_password");

        assert!(verify_password("my_secure_password", &hash));
        assert!(!verify_password("wrong_password", &hash));
        assert!(!verify_password("my_secure_password", "not-a-hash"));
    }
}
