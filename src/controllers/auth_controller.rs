// src/controllers/auth_controller.rs

use actix_web::cookie::Cookie;
use actix_web::{get, post, web, Error, HttpRequest, HttpResponse};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;

use crate::models::user::{PublicUser, Role, UserModel};
use crate::services::auth_service::{self, Claims};
use crate::services::email_service;
use crate::state::AppState;

/// Constant representing the token expiration time in minutes.
const ACCESS_TOKEN_EXPIRE_MINUTES: i64 = 1440;

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpForm {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub token: String,
    pub new_password: String,
    pub password_confirmation: String,
}

/// POST /signup
/// Registers a new user, stores a 6-digit verification code, and sends it by
/// email in a background task.
#[post("/signup")]
pub async fn signup(
    form: web::Json<SignupForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    if form.name.trim().is_empty() || form.email.trim().is_empty() || form.password.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Name, email and password are required"
        })));
    }

    let existing_user = auth_service::get_user_by_email(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if existing_user.is_some() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Email already registered"
        })));
    }

    let new_user = UserModel {
        id: crate::models::user::default_id(),
        name: form.name.clone(),
        email: form.email.clone(),
        // The service hashes this before it is stored.
        password: Some(form.password.clone()),
        avatar: None,
        bio: None,
        whatsapp: None,
        role: Role::User,
        verified: false,
        email_verified: false,
        blocked: false,
        total_listings: 0,
        total_sales: 0,
        total_earnings: 0.0,
        rating: 0.0,
        listings: Vec::new(),
        email_verification_otp: None,
        email_verification_expiry: None,
        password_reset_token: None,
        password_reset_expiry: None,
        created_at: mongodb::bson::DateTime::now(),
        updated_at: mongodb::bson::DateTime::now(),
    };

    let user = auth_service::create_user(&data.users_collection, new_user)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let otp = auth_service::generate_otp();
    auth_service::set_verification_otp(&data.users_collection, &user.email, &otp)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let html = email_service::otp_email(&data.mailer.company_name, &otp);
    email_service::send_in_background(
        data.mailer.clone(),
        user.email.clone(),
        format!("Verify Your Email - {}", data.mailer.company_name),
        html,
    );

    Ok(HttpResponse::Created().json(json!({
        "message": "Account created. Check your email for the verification code.",
        "user": PublicUser::from(&user),
    })))
}

/// POST /login
/// Verifies credentials and issues a JWT, both in the body and as an
/// http-only `token` cookie. The `user_role` cookie is a routing hint for the
/// frontend; authorization never reads it.
#[post("/login")]
pub async fn login(
    form: web::Json<LoginForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::get_user_by_email(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let user = match user {
        Some(u) => u,
        None => {
            return Ok(HttpResponse::Unauthorized().json(json!({
                "detail": "Invalid credentials"
            })))
        }
    };

    let password_ok = user
        .password
        .as_deref()
        .map(|hashed| auth_service::verify_password(&form.password, hashed))
        .unwrap_or(false);
    if !password_ok {
        return Ok(HttpResponse::Unauthorized().json(json!({
            "detail": "Invalid credentials"
        })));
    }

    if user.blocked {
        return Ok(HttpResponse::Forbidden().json(json!({
            "detail": "Account is blocked"
        })));
    }

    if !user.email_verified {
        return Ok(HttpResponse::Forbidden().json(json!({
            "detail": "Email not verified"
        })));
    }

    let claims = Claims {
        sub: user.id.clone(),
        exp: 0, // This field will be set in the service.
    };
    let token = auth_service::create_access_token(
        claims,
        Some(Duration::minutes(ACCESS_TOKEN_EXPIRE_MINUTES)),
    )
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let token_cookie = Cookie::build("token", token.clone())
        .path("/")
        .http_only(true)
        .finish();
    let role_cookie = Cookie::build("user_role", user.role.as_str())
        .path("/")
        .http_only(true)
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(token_cookie)
        .cookie(role_cookie)
        .json(json!({
            "access_token": token,
            "token_type": "bearer",
            "user": PublicUser::from(&user),
        })))
}

/// POST /verify-otp
/// Confirms the emailed code. Codes are single-use and expire after 10 minutes.
#[post("/verify-otp")]
pub async fn verify_otp(
    form: web::Json<VerifyOtpForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::get_user_by_email(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::NotFound().json(json!({ "detail": "User not found" }))),
    };

    let (otp, expiry) = match (&user.email_verification_otp, user.email_verification_expiry) {
        (Some(otp), Some(expiry)) => (otp, expiry),
        _ => {
            return Ok(HttpResponse::UnprocessableEntity().json(json!({
                "detail": "No verification code set for this user"
            })))
        }
    };

    if auth_service::is_expired(expiry) {
        return Ok(HttpResponse::UnprocessableEntity().json(json!({
            "detail": "Verification code expired"
        })));
    }

    if otp != &form.otp {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Incorrect verification code"
        })));
    }

    auth_service::mark_email_verified(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Account verified. You can now log in."
    })))
}

/// POST /resend-otp
/// Regenerates the verification code and re-sends it.
#[post("/resend-otp")]
pub async fn resend_otp(
    form: web::Json<ResendOtpForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::get_user_by_email(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let user = match user {
        Some(u) => u,
        None => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "detail": "Email not registered"
            })))
        }
    };

    if user.email_verified {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Email already verified"
        })));
    }

    let otp = auth_service::generate_otp();
    auth_service::set_verification_otp(&data.users_collection, &user.email, &otp)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let html = email_service::otp_email(&data.mailer.company_name, &otp);
    email_service::send_in_background(
        data.mailer.clone(),
        user.email.clone(),
        format!("Verify Your Email - {}", data.mailer.company_name),
        html,
    );

    Ok(HttpResponse::Ok().json(json!({ "message": "Verification email resent successfully" })))
}

/// POST /forgot-password
/// Stores the hash of a fresh reset token and emails the raw token as a link.
/// Always answers success so the endpoint cannot be used to probe for accounts.
#[post("/forgot-password")]
pub async fn forgot_password(
    form: web::Json<ForgotPasswordForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::get_user_by_email(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    if let Some(user) = user {
        let token = auth_service::generate_reset_token();
        let token_hash = auth_service::hash_token(&token);
        auth_service::set_reset_token(&data.users_collection, &user.email, &token_hash)
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

        let reset_link = format!(
            "{}/reset-password?token={}&email={}",
            data.mailer.app_url, token, user.email
        );
        let html = email_service::password_reset_email(&data.mailer.company_name, &reset_link);
        email_service::send_in_background(
            data.mailer.clone(),
            user.email.clone(),
            format!("Reset Your Password - {}", data.mailer.company_name),
            html,
        );
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "If an account with that email exists, you will receive password reset instructions."
    })))
}

/// POST /reset-password
/// Replaces the password when the presented token hashes to the stored value
/// and the window has not lapsed. Tokens are single-use.
#[post("/reset-password")]
pub async fn reset_password(
    form: web::Json<ResetPasswordForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    if form.new_password != form.password_confirmation {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Passwords do not match"
        })));
    }

    let user = auth_service::get_user_by_email(&data.users_collection, &form.email)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let valid = user.as_ref().map_or(false, |u| {
        match (&u.password_reset_token, u.password_reset_expiry) {
            (Some(stored_hash), Some(expiry)) => {
                !auth_service::is_expired(expiry)
                    && stored_hash == &auth_service::hash_token(&form.token)
            }
            _ => false,
        }
    });

    if !valid {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Reset link is invalid or expired"
        })));
    }

    let updated =
        auth_service::update_password(&data.users_collection, &form.email, &form.new_password)
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    if !updated {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Password update failed"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Password has been reset successfully" })))
}

/// GET /me
/// Returns the account behind the request's session token.
#[get("/me")]
pub async fn me(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    match user {
        Some(u) => Ok(HttpResponse::Ok().json(PublicUser::from(&u))),
        None => Ok(HttpResponse::Unauthorized().json(json!({
            "detail": "Invalid or missing session token"
        }))),
    }
}
