//! Signed bearer tickets (§3 Ticket).
//!
//! A ticket is a JWT (HS256) carrying `sub` (user id), `exp` (seconds since
//! epoch), and `is_superuser`. `jsonwebtoken`'s own expiry validation
//! enforces "exp is in the future"; the "referenced user is active" half
//! of the validity invariant is checked by the caller against the DB,
//! since this crate has no DB access of its own.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
    pub is_superuser: bool,
}

pub fn sign_ticket(
    signing_secret: &[u8; 32],
    user_id: Uuid,
    is_superuser: bool,
    ttl_minutes: i64,
) -> Result<String, AuthError> {
    let claims = Claims {
        sub: user_id.to_string(),
        exp: (Utc::now() + Duration::minutes(ttl_minutes)).timestamp(),
        is_superuser,
    };
    encode(
        &Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_secret),
    )
    .map_err(|_| AuthError::InvalidTicket)
}

/// Verifies signature and expiry only. Caller must separately confirm the
/// referenced user is active (§3 Ticket invariant).
pub fn verify_ticket(signing_secret: &[u8; 32], token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(signing_secret),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TicketExpired,
        _ => AuthError::InvalidTicket,
    })?;
    Ok(data.claims)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_round_trip() {
        let secret = [7u8; 32];
        let user_id = Uuid::new_v4();
        let token = sign_ticket(&secret, user_id, true, 30).unwrap();
        let claims = verify_ticket(&secret, &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert!(claims.is_superuser);
    }

    #[test]
    fn test_expired_ticket_rejected() {
        let secret = [7u8; 32];
        let user_id = Uuid::new_v4();
        let token = sign_ticket(&secret, user_id, false, -1).unwrap();
        let result = verify_ticket(&secret, &token);
        assert!(matches!(result, Err(AuthError::TicketExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let secret = [7u8; 32];
        let other = [9u8; 32];
        let token = sign_ticket(&secret, Uuid::new_v4(), false, 30).unwrap();
        let result = verify_ticket(&other, &token);
        assert!(matches!(result, Err(AuthError::InvalidTicket)));
    }
}
