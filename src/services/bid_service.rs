// src/services/bid_service.rs

use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::FindOptions;
use mongodb::Collection;

use crate::models::bid::BidModel;
use crate::models::listing::{ListingModel, ListingStatus};
use crate::models::user::UserModel;
use crate::services::email_service::{self, Mailer};

/// Why a bid was refused before anything was written.
#[derive(Debug, PartialEq)]
pub enum BidRejection {
    /// Listing is not active, or the seller disabled bidding.
    BiddingClosed,
    /// Sellers cannot bid on their own listings.
    SelfBid,
    /// Amount is below the listing's minimum acceptable bid.
    BelowFloor { floor: f64 },
}

/// Validates a bid against the listing. The floor is `min_bid_amount` when
/// set, otherwise the asking price, and the bid must meet or exceed it.
pub fn validate_bid(
    listing: &ListingModel,
    bidder_id: &str,
    amount: f64,
) -> Result<(), BidRejection> {
    if listing.status != ListingStatus::Active || !listing.allow_bidding {
        return Err(BidRejection::BiddingClosed);
    }
    if listing.seller == bidder_id {
        return Err(BidRejection::SelfBid);
    }
    let floor = listing.bid_floor();
    if amount < floor {
        return Err(BidRejection::BelowFloor { floor });
    }
    Ok(())
}

pub enum PlaceBidOutcome {
    Placed(BidModel),
    ListingNotFound,
    Rejected(BidRejection),
}

/// Creates a bid and appends it to the listing's bid list.
///
/// The two writes are kept consistent by compensation: if the append fails
/// (or the listing vanished in between), the inserted bid is deleted again so
/// no orphan survives. The seller notification is best-effort and spawned off
/// the request path.
pub async fn place_bid(
    listings: &Collection<ListingModel>,
    bids: &Collection<BidModel>,
    users: &Collection<UserModel>,
    mailer: &Mailer,
    listing_id: &str,
    bidder: &UserModel,
    amount: f64,
    message: Option<String>,
) -> mongodb::error::Result<PlaceBidOutcome> {
    let listing = match listings.find_one(doc! { "_id": listing_id }, None).await? {
        Some(l) => l,
        None => return Ok(PlaceBidOutcome::ListingNotFound),
    };

    if let Err(rejection) = validate_bid(&listing, &bidder.id, amount) {
        return Ok(PlaceBidOutcome::Rejected(rejection));
    }

    let bid = BidModel::new(listing_id, &bidder.id, amount, message);
    bids.insert_one(&bid, None).await?;

    let push = listings
        .update_one(
            doc! { "_id": listing_id },
            doc! { "$push": { "bids": &bid.id } },
            None,
        )
        .await;

    match push {
        Ok(result) if result.matched_count > 0 => {}
        Ok(_) => {
            // listing deleted between the lookup and the append
            bids.delete_one(doc! { "_id": &bid.id }, None).await?;
            return Ok(PlaceBidOutcome::ListingNotFound);
        }
        Err(e) => {
            if let Err(cleanup) = bids.delete_one(doc! { "_id": &bid.id }, None).await {
                log::error!("Orphaned bid {} could not be removed: {}", bid.id, cleanup);
            }
            return Err(e);
        }
    }

    log::info!(
        "Bid {} of {} placed on listing {} by {}",
        bid.id,
        amount,
        listing_id,
        bidder.id
    );

    match crate::services::auth_service::get_user_by_id(users, &listing.seller).await {
        Ok(Some(seller)) => {
            let html = email_service::new_bid_email(
                &mailer.company_name,
                &listing.title,
                &bidder.name,
                amount,
            );
            email_service::send_in_background(
                mailer.clone(),
                seller.email,
                format!("New bid on {}", listing.title),
                html,
            );
        }
        Ok(None) => log::error!("Seller {} missing for listing {}", listing.seller, listing.id),
        Err(e) => log::error!("Seller lookup failed for bid notification: {}", e),
    }

    Ok(PlaceBidOutcome::Placed(bid))
}

/// All bids on a listing, newest first.
pub async fn bids_for_listing(
    bids: &Collection<BidModel>,
    listing_id: &str,
) -> mongodb::error::Result<Vec<BidModel>> {
    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let mut cursor = bids
        .find(doc! { "listing": listing_id }, options)
        .await?;
    let mut items = Vec::new();
    while let Some(bid) = cursor.try_next().await? {
        items.push(bid);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: f64, min_bid: f64) -> ListingModel {
        let mut listing: ListingModel = serde_json::from_value(serde_json::json!({
            "title": "Cooking channel",
            "description": "120k subscribers",
            "category": "YouTube Channel",
            "price": price,
            "seller": "seller-1",
            "status": "active",
        }))
        .unwrap();
        listing.min_bid_amount = min_bid;
        listing
    }

    #[test]
    fn bid_below_asking_price_is_rejected() {
        let l = listing(1000.0, 0.0);
        assert_eq!(
            validate_bid(&l, "buyer-1", 900.0),
            Err(BidRejection::BelowFloor { floor: 1000.0 })
        );
    }

    #[test]
    fn bid_at_or_above_the_floor_is_accepted() {
        let l = listing(1000.0, 0.0);
        assert_eq!(validate_bid(&l, "buyer-1", 1000.0), Ok(()));
        assert_eq!(validate_bid(&l, "buyer-1", 1100.0), Ok(()));
    }

    #[test]
    fn explicit_minimum_overrides_the_asking_price() {
        let l = listing(1000.0, 400.0);
        assert_eq!(validate_bid(&l, "buyer-1", 500.0), Ok(()));
        assert_eq!(
            validate_bid(&l, "buyer-1", 300.0),
            Err(BidRejection::BelowFloor { floor: 400.0 })
        );
    }

    #[test]
    fn seller_cannot_bid_on_own_listing() {
        let l = listing(1000.0, 0.0);
        assert_eq!(validate_bid(&l, "seller-1", 2000.0), Err(BidRejection::SelfBid));
    }

    #[test]
    fn inactive_or_closed_listings_take_no_bids() {
        let mut l = listing(1000.0, 0.0);
        l.status = ListingStatus::Pending;
        assert_eq!(validate_bid(&l, "buyer-1", 2000.0), Err(BidRejection::BiddingClosed));

        let mut l = listing(1000.0, 0.0);
        l.allow_bidding = false;
        assert_eq!(validate_bid(&l, "buyer-1", 2000.0), Err(BidRejection::BiddingClosed));
    }
}
