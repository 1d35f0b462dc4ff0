// src/controllers/listing_controller.rs

use actix_web::{delete, get, post, put, web, Error, HttpRequest, HttpResponse};
use mongodb::bson::Document;
use serde::Deserialize;
use serde_json::json;

use crate::models::listing::{
    Category, ListingDetails, ListingMetrics, ListingModel, ListingStatus,
};
use crate::models::user::{Role, SellerSummary, UserModel};
use crate::services::auth_service;
use crate::services::listing_service::{self, TransitionOutcome, PAGE_SIZE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    pub category: Option<String>,
    /// Case-insensitive title search.
    pub q: Option<String>,
    pub page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateListingForm {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub price: f64,
    #[serde(default)]
    pub metrics: Option<ListingMetrics>,
    #[serde(default)]
    pub details: Option<ListingDetails>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub allow_bidding: Option<bool>,
    #[serde(default)]
    pub min_bid_amount: Option<f64>,
    /// Create as a private draft instead of submitting for review.
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateListingForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub price: Option<f64>,
    pub metrics: Option<ListingMetrics>,
    pub details: Option<ListingDetails>,
    pub images: Option<Vec<String>>,
    pub allow_bidding: Option<bool>,
    pub min_bid_amount: Option<f64>,
    /// Status changes go through the lifecycle state machine.
    pub status: Option<ListingStatus>,
}

/// Serializes a listing with its seller id replaced by a public summary.
fn with_seller(listing: &ListingModel, seller: Option<&UserModel>) -> serde_json::Value {
    let mut value = json!(listing);
    if let (Some(obj), Some(seller)) = (value.as_object_mut(), seller) {
        obj.insert("seller".to_string(), json!(SellerSummary::from(seller)));
    }
    value
}

/// GET /listings
/// Public marketplace feed: active listings only, filtered and paginated
/// server-side.
#[get("")]
pub async fn list_listings(
    query: web::Query<ListingsQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let page = query.page.unwrap_or(1).max(1);
    let (listings, total) = listing_service::find_active_listings(
        &data.listings_collection,
        query.category.as_deref(),
        query.q.as_deref(),
        page,
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let seller_ids: Vec<String> = listings.iter().map(|l| l.seller.clone()).collect();
    let sellers = listing_service::users_by_ids(&data.users_collection, &seller_ids)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let items: Vec<serde_json::Value> = listings
        .iter()
        .map(|l| with_seller(l, sellers.get(&l.seller)))
        .collect();

    let pages = (total + PAGE_SIZE as u64 - 1) / PAGE_SIZE as u64;
    Ok(HttpResponse::Ok().json(json!({
        "listings": items,
        "pagination": {
            "total": total,
            "pages": pages,
            "current": page,
        },
    })))
}

/// POST /listings
/// Creates a listing for the authenticated seller. New listings start as
/// `pending` (awaiting moderation) or `draft` when requested.
#[post("")]
pub async fn create_listing(
    req: HttpRequest,
    form: web::Json<CreateListingForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" }))),
    };

    if form.title.trim().is_empty() || form.description.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Title and description are required"
        })));
    }
    if form.price < 0.0 {
        return Ok(HttpResponse::BadRequest().json(json!({
            "detail": "Price must not be negative"
        })));
    }

    let form = form.into_inner();
    let images = form.images.unwrap_or_default();
    let listing = ListingModel {
        id: crate::models::user::default_id(),
        title: form.title,
        description: form.description,
        category: form.category,
        price: form.price,
        seller: user.id.clone(),
        thumbnail: images.first().cloned(),
        images,
        status: if form.draft {
            ListingStatus::Draft
        } else {
            ListingStatus::Pending
        },
        metrics: form.metrics.unwrap_or_default(),
        details: form.details.unwrap_or_default(),
        views: 0,
        favorites: Vec::new(),
        featured: false,
        bids: Vec::new(),
        allow_bidding: form.allow_bidding.unwrap_or(true),
        min_bid_amount: form.min_bid_amount.unwrap_or(0.0),
        created_at: mongodb::bson::DateTime::now(),
        updated_at: mongodb::bson::DateTime::now(),
    };

    let listing =
        listing_service::create_listing(&data.listings_collection, &data.users_collection, listing)
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Created().json(json!({ "success": true, "listing": listing })))
}

/// GET /listings/{id}
/// Public detail view; counts the view atomically.
#[get("/{id}")]
pub async fn get_listing(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let id = path.into_inner();
    let listing = listing_service::get_listing_counting_view(&data.listings_collection, &id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let listing = match listing {
        Some(l) => l,
        None => return Ok(HttpResponse::NotFound().json(json!({ "detail": "Listing not found" }))),
    };

    let seller = auth_service::get_user_by_id(&data.users_collection, &listing.seller)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(with_seller(&listing, seller.as_ref())))
}

/// Transitions into `active` from review, and any rejection, are moderation
/// calls; owners handle the rest of their listing's lifecycle themselves.
fn is_moderation_edge(from: ListingStatus, to: ListingStatus) -> bool {
    matches!(
        (from, to),
        (ListingStatus::Pending, ListingStatus::Active) | (_, ListingStatus::Rejected)
    ) || from.is_terminal()
}

/// PUT /listings/{id}
/// Field edits for the owner (or an admin). A `status` in the payload is
/// routed through the state machine instead of being written raw.
#[put("/{id}")]
pub async fn update_listing(
    req: HttpRequest,
    path: web::Path<String>,
    form: web::Json<UpdateListingForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" }))),
    };

    let id = path.into_inner();
    let listing = listing_service::get_listing(&data.listings_collection, &id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let listing = match listing {
        Some(l) => l,
        None => return Ok(HttpResponse::NotFound().json(json!({ "detail": "Listing not found" }))),
    };

    if listing.seller != user.id && user.role != Role::Admin {
        return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" })));
    }

    let form = form.into_inner();

    if let Some(price) = form.price {
        if price < 0.0 {
            return Ok(HttpResponse::BadRequest().json(json!({
                "detail": "Price must not be negative"
            })));
        }
    }

    let mut set = Document::new();
    if let Some(title) = form.title {
        set.insert("title", title);
    }
    if let Some(description) = form.description {
        set.insert("description", description);
    }
    if let Some(category) = form.category {
        set.insert("category", category.as_str());
    }
    if let Some(price) = form.price {
        set.insert("price", price);
    }
    if let Some(metrics) = form.metrics {
        let value = mongodb::bson::to_bson(&metrics)
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
        set.insert("metrics", value);
    }
    if let Some(details) = form.details {
        let value = mongodb::bson::to_bson(&details)
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
        set.insert("details", value);
    }
    if let Some(images) = form.images {
        set.insert("thumbnail", images.first().cloned());
        set.insert("images", images);
    }
    if let Some(allow_bidding) = form.allow_bidding {
        set.insert("allow_bidding", allow_bidding);
    }
    if let Some(min_bid_amount) = form.min_bid_amount {
        set.insert("min_bid_amount", min_bid_amount);
    }

    let mut current = listing;
    if !set.is_empty() {
        let updated =
            listing_service::update_listing_fields(&data.listings_collection, &id, set)
                .await
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
        current = match updated {
            Some(l) => l,
            None => {
                return Ok(
                    HttpResponse::NotFound().json(json!({ "detail": "Listing not found" }))
                )
            }
        };
    }

    if let Some(next) = form.status {
        if is_moderation_edge(current.status, next) && user.role != Role::Admin {
            return Ok(HttpResponse::Unauthorized().json(json!({
                "detail": "Only an admin can perform this status change"
            })));
        }

        let outcome = listing_service::transition_status(
            &data.listings_collection,
            &data.users_collection,
            &data.mailer,
            current,
            next,
            &user,
            None,
        )
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

        current = match outcome {
            TransitionOutcome::Applied(l) | TransitionOutcome::NoOp(l) => *l,
            TransitionOutcome::Illegal { from, to } => {
                return Ok(HttpResponse::UnprocessableEntity().json(json!({
                    "detail": format!(
                        "Cannot change status from {} to {}",
                        from.as_str(),
                        to.as_str()
                    )
                })))
            }
        };
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true, "listing": current })))
}

/// DELETE /listings/{id}
/// Owner or admin. Removes the listing, its bids, and the seller's
/// back-reference.
#[delete("/{id}")]
pub async fn delete_listing(
    req: HttpRequest,
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let user = auth_service::authenticated_user(&req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let user = match user {
        Some(u) => u,
        None => return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" }))),
    };

    let id = path.into_inner();
    let listing = listing_service::get_listing(&data.listings_collection, &id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let listing = match listing {
        Some(l) => l,
        None => return Ok(HttpResponse::NotFound().json(json!({ "detail": "Listing not found" }))),
    };

    if listing.seller != user.id && user.role != Role::Admin {
        return Ok(HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" })));
    }

    listing_service::delete_listing(
        &data.listings_collection,
        &data.users_collection,
        &data.bids_collection,
        &listing,
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_edges_are_admin_only() {
        assert!(is_moderation_edge(ListingStatus::Pending, ListingStatus::Active));
        assert!(is_moderation_edge(ListingStatus::Active, ListingStatus::Rejected));
        assert!(is_moderation_edge(ListingStatus::Pending, ListingStatus::Rejected));
        // reopening a terminal listing is moderation
        assert!(is_moderation_edge(ListingStatus::Sold, ListingStatus::Active));
    }

    #[test]
    fn owner_edges_are_not_moderation() {
        assert!(!is_moderation_edge(ListingStatus::Draft, ListingStatus::Pending));
        assert!(!is_moderation_edge(ListingStatus::Active, ListingStatus::Inactive));
        assert!(!is_moderation_edge(ListingStatus::Inactive, ListingStatus::Active));
        assert!(!is_moderation_edge(ListingStatus::Active, ListingStatus::Sold));
    }
}
