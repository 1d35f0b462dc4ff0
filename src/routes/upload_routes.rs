// src/routes/upload_routes.rs

use actix_web::web;

use crate::controllers::upload_controller::imagekit_auth;

/// Initializes the upload handshake routes within the `/uploads` scope.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/uploads").service(imagekit_auth));
}
