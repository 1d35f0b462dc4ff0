// src/routes/admin_routes.rs

use actix_web::web;

use crate::controllers::admin_controller::{
    list_listings, list_users, update_listing, update_user,
};

/// Initializes the moderation routes within the `/admin` scope. Every handler
/// re-checks the admin role against the database.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(list_users)
            .service(update_user)
            .service(list_listings)
            .service(update_listing),
    );
}
