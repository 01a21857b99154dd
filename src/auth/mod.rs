pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

/// Upper bound on configured token lifetime (ten years)
const MAX_EXPIRY_HOURS: i64 = 24 * 365 * 10;

/// Token payload: the subject user id plus issue/expiry times
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(id: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let hours = i64::try_from(expiry_hours)
            .unwrap_or(MAX_EXPIRY_HOURS)
            .min(MAX_EXPIRY_HOURS);
        let exp = (now + Duration::hours(hours)).timestamp();

        Self {
            id: id.into(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret is not configured")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),
}

fn secret(security: &SecurityConfig) -> Result<&[u8], JwtError> {
    if security.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(security.jwt_secret.as_bytes())
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret(security)?);
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Sign a token for the given user id with the configured expiry
pub fn sign_token(user_id: &str, security: &SecurityConfig) -> Result<String, JwtError> {
    generate_jwt(&Claims::new(user_id, security.jwt_expiry_hours), security)
}

/// Check signature and expiry; returns the embedded claims
pub fn verify_token(token: &str, security: &SecurityConfig) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret(security)?);
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            _ => JwtError::Invalid(e.to_string()),
        })
}
