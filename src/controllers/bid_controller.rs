// src/controllers/bid_controller.rs

use actix_web::{get, post, web, Error, HttpRequest, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::models::user::SellerSummary;
use crate::services::auth_service;
use crate::services::bid_service::{self, BidRejection, PlaceBidOutcome};
use crate::services::listing_service;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PlaceBidForm {
    pub listing_id: String,
    pub amount: f64,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BidsQuery {
    pub listing_id: String,
}

/// POST /bids
/// Places a bid on a listing for the authenticated user. The amount must meet
/// the listing's bid floor; the seller is notified by email.
#[post("")]
pub async fn place_bid(
    req: HttpRequest,
    form: web::Json<PlaceBidForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" }))),
    };

    if form.amount <= 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Bid amount must be positive"
        })));
    }

    let outcome = bid_service::place_bid(
        &data.listings_collection,
        &data.bids_collection,
        &data.users_collection,
        &data.mailer,
        &form.listing_id,
        &user,
        form.amount,
        form.message.clone(),
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    match outcome {
        PlaceBidOutcome::Placed(bid) => {
            Ok(HttpResponse::Created().json(json!({ "success": true, "bid": bid })))
        }
        PlaceBidOutcome::ListingNotFound => {
            Ok(HttpResponse::NotFound().json(json!({ "detail": "Listing not found" })))
        }
        PlaceBidOutcome::Rejected(BidRejection::BiddingClosed) => {
            Ok(HttpResponse::UnprocessableEntity().json(json!({
                "detail": "Bidding is closed for this listing"
            })))
        }
        PlaceBidOutcome::Rejected(BidRejection::SelfBid) => {
            Ok(HttpResponse::UnprocessableEntity().json(json!({
                "detail": "You cannot bid on your own listing"
            })))
        }
        PlaceBidOutcome::Rejected(BidRejection::BelowFloor { floor }) => {
            Ok(HttpResponse::UnprocessableEntity().json(json!({
                "detail": format!("Bid must be at least {}", floor)
            })))
        }
    }
}

/// GET /bids?listing_id=...
/// All bids on a listing, newest first, with public bidder summaries joined.
#[get("")]
pub async fn list_bids(
    query: web::Query<BidsQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let bids = bid_service::bids_for_listing(&data.bids_collection, &query.listing_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let bidder_ids: Vec<String> = bids.iter().map(|b| b.bidder.clone()).collect();
    let bidders = listing_service::users_by_ids(&data.users_collection, &bidder_ids)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let items: Vec<serde_json::Value> = bids
        .iter()
        .map(|bid| {
            let mut value = json!(bid);
            if let (Some(obj), Some(bidder)) = (value.as_object_mut(), bidders.get(&bid.bidder)) {
                obj.insert("bidder".to_string(), json!(SellerSummary::from(bidder)));
            }
            value
        })
        .collect();

    Ok(HttpResponse::Ok().json(items))
}
