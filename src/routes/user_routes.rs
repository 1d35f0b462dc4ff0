// src/routes/user_routes.rs

use actix_web::web;

use crate::controllers::user_controller::{get_profile, update_profile};

/// Initializes the public profile routes within the `/users` scope.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(get_profile)
            .service(update_profile),
    );
}
