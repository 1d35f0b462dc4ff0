// src/routes/listing_routes.rs

use actix_web::web;

use crate::controllers::listing_controller::{
    create_listing, delete_listing, get_listing, list_listings, update_listing,
};

/// Initializes the listing CRUD routes within the `/listings` scope.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/listings")
            .service(list_listings)
            .service(create_listing)
            .service(get_listing)
            .service(update_listing)
            .service(delete_listing),
    );
}
