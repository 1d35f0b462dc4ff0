// src/routes/bid_routes.rs

use actix_web::web;

use crate::controllers::bid_controller::{list_bids, place_bid};

/// Initializes the bidding routes within the `/bids` scope.
pub fn init(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/bids").service(place_bid).service(list_bids));
}
