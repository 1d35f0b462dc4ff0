// src/routes/auth_routes.rs

use actix_web::web;

use crate::controllers::auth_controller::{
    forgot_password, login, me, resend_otp, reset_password, signup, verify_otp,
};

/// Initializes the credential lifecycle routes within the `/auth` scope.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(signup)
            .service(login)
            .service(verify_otp)
            .service(resend_otp)
            .service(forgot_password)
            .service(reset_password)
            .service(me),
    );
}
