use actix_web::web;

mod admin_routes; // Module for admin moderation endpoints
mod auth_routes; // Module for credential lifecycle endpoints
mod bid_routes; // Module for bidding endpoints
mod listing_routes; // Module for listing endpoints
mod upload_routes; // Module for upload handshake endpoints
mod user_routes; // Module for profile endpoints

pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth_routes::init)
            .configure(listing_routes::init)
            .configure(bid_routes::init)
            .configure(user_routes::init)
            .configure(admin_routes::init)
            .configure(upload_routes::init),
    );
}
