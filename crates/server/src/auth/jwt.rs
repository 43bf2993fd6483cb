use chess_core::PlayerId;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: PlayerId,
    pub username: String,
    pub exp: i64,
}

pub fn create_token(
    user_id: PlayerId,
    username: &str,
    secret: &str,
    expire_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        user_id,
        username: username.to_string(),
        exp: (Utc::now() + Duration::hours(expire_hours)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// `None` for a bad signature, a malformed token or an expired one.
pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let token = create_token(42, "alice", "secret", 1).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn test_wrong_secret_and_expiry_rejected() {
        let token = create_token(42, "alice", "secret", 1).unwrap();
        assert!(verify_token(&token, "other").is_none());

        let expired = create_token(42, "alice", "secret", -2).unwrap();
        assert!(verify_token(&expired, "secret").is_none());
        assert!(verify_token("not.a.token", "secret").is_none());
    }
}
