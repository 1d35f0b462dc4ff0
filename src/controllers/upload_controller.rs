// src/controllers/upload_controller.rs

use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde_json::json;
use sha1::Sha1;

use crate::services::auth_service;
use crate::state::AppState;

type HmacSha1 = Hmac<Sha1>;

/// Upload token lifetime in seconds.
const UPLOAD_TOKEN_TTL_SECS: i64 = 10 * 60;

/// HMAC-SHA1 over `token + expire`, hex encoded, as the ImageKit client
/// upload API expects.
fn imagekit_signature(private_key: &str, token: &str, expire: i64) -> String {
    let mut mac = HmacSha1::new_from_slice(private_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}{}", token, expire).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// GET /uploads/imagekit-auth
/// Hands an authenticated client short-lived signing material for a direct
/// browser upload to ImageKit. The private key never leaves the server.
#[get("/imagekit-auth")]
pub async fn imagekit_auth(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if user.is_none() {
        return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" })));
    }

    let keys = match &data.imagekit {
        Some(keys) => keys,
        None => {
            log::error!("ImageKit auth requested but environment variables are not configured");
            return Ok(HttpResponse::InternalServerError().json(json!({
                "detail": "ImageKit is not configured"
            })));
        }
    };

    let mut token_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut token_bytes);
    let token = hex::encode(token_bytes);
    let expire = Utc::now().timestamp() + UPLOAD_TOKEN_TTL_SECS;
    let signature = imagekit_signature(&keys.private_key, &token, expire);

    Ok(HttpResponse::Ok().json(json!({
        "token": token,
        "expire": expire,
        "signature": signature,
        "public_key": keys.public_key,
        "url_endpoint": keys.url_endpoint,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_40_hex_chars_and_deterministic() {
        let sig = imagekit_signature("private_key_test", "aabbccdd", 1700000000);
        assert_eq!(sig.len(), 40);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(
            sig,
            imagekit_signature("private_key_test", "aabbccdd", 1700000000)
        );
    }

    #[test]
    fn signature_depends_on_token_and_expiry() {
        let base = imagekit_signature("private_key_test", "aabbccdd", 1700000000);
        assert_ne!(base, imagekit_signature("private_key_test", "aabbccde", 1700000000));
        assert_ne!(base, imagekit_signature("private_key_test", "aabbccdd", 1700000001));
        assert_ne!(base, imagekit_signature("other_key", "aabbccdd", 1700000000));
    }
}
