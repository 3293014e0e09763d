use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Result as JwtResult, DecodingKey, EncodingKey, Header, Validation,
};

use crate::jwt::claims::Claims;

const TOKEN_TTL_HOURS: i64 = 1;

pub fn create_token(email: &str, secret: &[u8]) -> JwtResult<String> {
    let my_claims = Claims {
        sub: email.to_string(),
        exp: (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize,
    };

    encode(&Header::default(), &my_claims, &EncodingKey::from_secret(secret))
}

pub fn verify_token(token: &str, secret: &[u8]) -> Result<Claims, String> {
    decode::<Claims>(token, &DecodingKey::from_secret(secret), &Validation::default())
        .map(|data| data.claims)
        .map_err(|_| "Invalid token".to_string())
}
