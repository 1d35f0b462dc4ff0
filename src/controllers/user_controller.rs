// src/controllers/user_controller.rs

use actix_web::{get, put, web, Error, HttpRequest, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use serde::Deserialize;
use serde_json::json;

use crate::models::user::PublicUser;
use crate::services::auth_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateProfileForm {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub bio: Option<String>,
    pub whatsapp: Option<String>,
}

/// Loose phone shape check: optional leading `+`, then 7 to 15 digits.
fn is_valid_phone(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

/// GET /users/{id}
/// Public profile with the user's listings attached. Sensitive fields never
/// leave the server.
#[get("/{id}")]
pub async fn get_profile(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let user = auth_service::get_user_by_id(&data.users_collection, &id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::NotFound().json(json!({ "detail": "User not found" }))),
    };

    let mut cursor = data
        .listings_collection
        .find(doc! { "seller": &user.id }, None)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let mut listings = Vec::new();
    while let Some(listing) = cursor
        .try_next()
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
    {
        listings.push(listing);
    }

    let mut value = json!(PublicUser::from(&user));
    if let Some(obj) = value.as_object_mut() {
        obj.insert("listings".to_string(), json!(listings));
    }

    Ok(HttpResponse::Ok().json(value))
}

/// PUT /users/{id}
/// Self-service profile edit. Role, counters and verification flags are not
/// client-writable.
#[put("/{id}")]
pub async fn update_profile(
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Json<UpdateProfileForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" }))),
    };

    let id = path.into_inner();
    if user.id != id {
        return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" })));
    }

    let form = form.into_inner();

    if let Some(whatsapp) = form.whatsapp.as_deref() {
        if !whatsapp.is_empty() && !is_valid_phone(whatsapp) {
            return Ok(HttpResponse::BadRequest().json(json!({
                "detail": "Invalid phone number"
            })));
        }
    }

    let mut set = Document::new();
    if let Some(name) = form.name {
        if name.trim().is_empty() {
            return Ok(HttpResponse::BadRequest().json(json!({
                "detail": "Name must not be empty"
            })));
        }
        set.insert("name", name);
    }
    if let Some(avatar) = form.avatar {
        set.insert("avatar", avatar);
    }
    if let Some(bio) = form.bio {
        set.insert("bio", bio);
    }
    if let Some(whatsapp) = form.whatsapp {
        set.insert("whatsapp", whatsapp);
    }

    if set.is_empty() {
        return Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "user": PublicUser::from(&user),
        })));
    }
    set.insert("updated_at", DateTime::now());

    data.users_collection
        .update_one(doc! { "_id": &id }, doc! { "$set": set }, None)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let updated = auth_service::get_user_by_id(&data.users_collection, &id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    match updated {
        Some(u) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "user": PublicUser::from(&u),
        }))),
        None => Ok(HttpResponse::NotFound().json(json!({ "detail": "User not found" }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_phone_numbers() {
        assert!(is_valid_phone("+4915112345678"));
        assert!(is_valid_phone("08031234567"));
        assert!(is_valid_phone("1234567"));
    }

    #[test]
    fn rejects_malformed_phone_numbers() {
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+49 151 1234"));
        assert!(!is_valid_phone("call-me-maybe"));
        assert!(!is_valid_phone("++4915112345678"));
        assert!(!is_valid_phone("12345678901234567890"));
    }
}
