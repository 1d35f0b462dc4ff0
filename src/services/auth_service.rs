// src/services/auth_service.rs

use std::env;

use actix_web::HttpRequest;
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::Error as JwtError, DecodingKey, EncodingKey, Header, Validation,
};
use mongodb::bson::{doc, DateTime};
use mongodb::Collection;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::user::UserModel;

/// How long a verification code stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;
/// How long a password-reset token stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// JWT claims. `sub` is the user's id. The role is not embedded;
/// every privileged call re-reads it from the database.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// Verifies a plain password against a bcrypt hash.
pub fn verify_password(plain_password: &str, hashed_password: &str) -> bool {
    verify(plain_password, hashed_password).unwrap_or(false)
}

pub fn get_password_hash(password: &str) -> Result<String, bcrypt::BcryptError> {
    hash(password, DEFAULT_COST)
}

/// Creates an access token (JWT) with the provided claims and optional expiration duration.
/// If no expiration delta is provided, the token will expire in 15 minutes.
pub fn create_access_token(
    mut claims: Claims,
    expires_delta: Option<Duration>,
) -> Result<String, JwtError> {
    let expire = match expires_delta {
        Some(delta) => Utc::now() + delta,
        None => Utc::now() + Duration::minutes(15),
    };
    claims.exp = expire.timestamp() as usize;

    let secret_key = env::var("SECRET_KEY").expect("SECRET_KEY must be set");
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret_key.as_ref()),
    )?;
    Ok(token)
}

/// Verifies a JWT token and returns the decoded claims if valid.
pub fn verify_jwt_token(token: &str) -> Result<Claims, JwtError> {
    let secret_key = env::var("SECRET_KEY").expect("SECRET_KEY must be set");
    let validation = Validation::default();
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret_key.as_ref()),
        &validation,
    )?;
    Ok(token_data.claims)
}

/// Pulls the session token from the `Authorization: Bearer` header or,
/// failing that, the http-only `token` cookie set at login.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let header_token = req
        .headers()
        .get("Authorization")
        .and_then(|hv| hv.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);
    if header_token.is_some() {
        return header_token;
    }
    req.cookie("token").map(|c| c.value().to_string())
}

/// Resolves the request's session to a full user record. Returns `Ok(None)`
/// for a missing/invalid token or an unknown user; the caller answers 401.
pub async fn authenticated_user(
    req: &HttpRequest,
    collection: &Collection<UserModel>,
) -> mongodb::error::Result<Option<UserModel>> {
    let token = match token_from_request(req) {
        Some(t) => t,
        None => return Ok(None),
    };
    let claims = match verify_jwt_token(&token) {
        Ok(c) => c,
        Err(_) => return Ok(None),
    };
    get_user_by_id(collection, &claims.sub).await
}

pub async fn get_user_by_email(
    collection: &Collection<UserModel>,
    email: &str,
) -> mongodb::error::Result<Option<UserModel>> {
    collection
        .find_one(doc! { "email": email.to_lowercase() }, None)
        .await
}

pub async fn get_user_by_id(
    collection: &Collection<UserModel>,
    id: &str,
) -> mongodb::error::Result<Option<UserModel>> {
    collection.find_one(doc! { "_id": id }, None).await
}

/// Inserts a new user with a freshly hashed password. `email_verified`
/// starts false; verification happens through the OTP flow.
pub async fn create_user(
    collection: &Collection<UserModel>,
    mut user: UserModel,
) -> mongodb::error::Result<UserModel> {
    let hashed = get_password_hash(user.password.as_deref().unwrap_or_default()).map_err(|e| {
        mongodb::error::Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;
    user.password = Some(hashed);
    user.email = user.email.to_lowercase();
    user.email_verified = false;

    collection.insert_one(&user, None).await?;
    Ok(user)
}

/// A fresh 6-digit verification code.
pub fn generate_otp() -> String {
    rand::thread_rng().gen_range(100_000..1_000_000).to_string()
}

/// A fresh 32-byte reset token, hex encoded. Only its hash is stored.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 hex of a token, the only form that ever touches the database.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn minutes_from_now(minutes: i64) -> DateTime {
    DateTime::from_millis(DateTime::now().timestamp_millis() + minutes * 60 * 1000)
}

/// Stores a new OTP + expiry window on the user.
pub async fn set_verification_otp(
    collection: &Collection<UserModel>,
    email: &str,
    otp: &str,
) -> mongodb::error::Result<()> {
    collection
        .update_one(
            doc! { "email": email.to_lowercase() },
            doc! { "$set": {
                "email_verification_otp": otp,
                "email_verification_expiry": minutes_from_now(OTP_TTL_MINUTES),
            }},
            None,
        )
        .await?;
    Ok(())
}

/// Marks the email verified and consumes the OTP.
pub async fn mark_email_verified(
    collection: &Collection<UserModel>,
    email: &str,
) -> mongodb::error::Result<bool> {
    let result = collection
        .update_one(
            doc! { "email": email.to_lowercase() },
            doc! {
                "$set": { "email_verified": true },
                "$unset": { "email_verification_otp": "", "email_verification_expiry": "" },
            },
            None,
        )
        .await?;
    Ok(result.modified_count > 0)
}

/// Stores the hash of a fresh reset token with its expiry window.
pub async fn set_reset_token(
    collection: &Collection<UserModel>,
    email: &str,
    token_hash: &str,
) -> mongodb::error::Result<()> {
    collection
        .update_one(
            doc! { "email": email.to_lowercase() },
            doc! { "$set": {
                "password_reset_token": token_hash,
                "password_reset_expiry": minutes_from_now(RESET_TOKEN_TTL_MINUTES),
            }},
            None,
        )
        .await?;
    Ok(())
}

/// Replaces the password and consumes the reset token. The caller has already
/// validated the presented token against the stored hash and expiry.
pub async fn update_password(
    collection: &Collection<UserModel>,
    email: &str,
    new_password: &str,
) -> mongodb::error::Result<bool> {
    let hashed = get_password_hash(new_password).map_err(|e| {
        mongodb::error::Error::from(std::io::Error::new(
            std::io::ErrorKind::Other,
            e.to_string(),
        ))
    })?;
    let result = collection
        .update_one(
            doc! { "email": email.to_lowercase() },
            doc! {
                "$set": { "password": hashed, "updated_at": DateTime::now() },
                "$unset": { "password_reset_token": "", "password_reset_expiry": "" },
            },
            None,
        )
        .await?;
    Ok(result.modified_count > 0)
}

/// True when an expiry stamp is in the past.
pub fn is_expired(expiry: DateTime) -> bool {
    expiry < DateTime::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_secret() {
        env::set_var("SECRET_KEY", "test-secret-key");
    }

    #[test]
    fn password_hash_round_trip() {
        let hashed = get_password_hash("hunter2!").unwrap();
        assert!(verify_password("hunter2!", &hashed));
        assert!(!verify_password("hunter3!", &hashed));
    }

    #[test]
    fn jwt_round_trip_carries_the_subject() {
        set_secret();
        let claims = Claims {
            sub: "64b0c0ffee00000000000001".to_string(),
            exp: 0,
        };
        let token = create_access_token(claims, Some(Duration::minutes(5))).unwrap();
        let decoded = verify_jwt_token(&token).unwrap();
        assert_eq!(decoded.sub, "64b0c0ffee00000000000001");
    }

    #[test]
    fn expired_jwt_is_rejected() {
        set_secret();
        let claims = Claims {
            sub: "x".to_string(),
            exp: 0,
        };
        let token = create_access_token(claims, Some(Duration::minutes(-5))).unwrap();
        assert!(verify_jwt_token(&token).is_err());
    }

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..32 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn reset_token_is_64_hex_chars_and_hash_is_stable() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash_token(&token), hash_token(&token));
        assert_ne!(hash_token(&token), token);
        assert_eq!(hash_token(&token).len(), 64);
    }

    #[test]
    fn expiry_comparison() {
        let past = DateTime::from_millis(DateTime::now().timestamp_millis() - 1000);
        let future = minutes_from_now(10);
        assert!(is_expired(past));
        assert!(!is_expired(future));
    }
}
