// src/state.rs

use mongodb::Collection;

use crate::models::bid::BidModel;
use crate::models::listing::ListingModel;
use crate::models::user::UserModel;
use crate::services::email_service::Mailer;

/// Signing material for the ImageKit client-upload handshake.
#[derive(Clone)]
pub struct ImageKitKeys {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
}

#[derive(Clone)]
pub struct AppState {
    pub users_collection: Collection<UserModel>,
    pub listings_collection: Collection<ListingModel>,
    pub bids_collection: Collection<BidModel>,
    pub mailer: Mailer,
    /// `None` when the ImageKit environment variables are not configured.
    pub imagekit: Option<ImageKitKeys>,
}
