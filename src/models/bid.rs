use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::user::default_id;

/// Bid lifecycle states. Only `Active` is ever written: there is no
/// acceptance or settlement flow, so the rest of the enum is reserved.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    #[default]
    Active,
    Accepted,
    Rejected,
    Withdrawn,
}

/// An offer a buyer has made on a listing. Append-only: bids are never
/// updated or withdrawn once placed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BidModel {
    #[serde(rename = "_id", default = "default_id")]
    pub id: String,

    /// Id of the listing the bid targets.
    pub listing: String,

    /// Id of the bidding user.
    pub bidder: String,

    pub amount: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default)]
    pub status: BidStatus,

    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,
}

impl BidModel {
    pub fn new(listing: &str, bidder: &str, amount: f64, message: Option<String>) -> Self {
        BidModel {
            id: default_id(),
            listing: listing.to_string(),
            bidder: bidder.to_string(),
            amount,
            message,
            status: BidStatus::Active,
            created_at: DateTime::now(),
        }
    }
}
