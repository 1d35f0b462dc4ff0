// src/controllers/admin_controller.rs
//
// Every handler here re-reads the caller's user record and checks its role
// before acting. Client-supplied role claims (cookies, token contents) are
// never trusted for authorization.

use actix_web::{get, put, web, Error, HttpRequest, HttpResponse};
use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime};
use mongodb::options::FindOptions;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::models::listing::{ListingModel, ListingStatus};
use crate::models::user::{Role, UserModel};
use crate::services::auth_service;
use crate::services::listing_service::{self, TransitionOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AdminListingsQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserActionForm {
    pub user_id: String,
    /// One of: verify, unverify, block, unblock.
    pub action: String,
}

#[derive(Debug, Deserialize)]
pub struct ListingActionForm {
    pub listing_id: String,
    /// One of: approve, reject, deactivate, activate, sold, delete.
    pub action: String,
    /// Optional moderator note, relayed to the seller in the status email.
    #[serde(default)]
    pub note: Option<String>,
}

/// The projection of a user an admin sees in the moderation table.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminUserRow {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub total_listings: i64,
    #[serde(default)]
    pub total_sales: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,
}

/// Resolves the caller and requires the admin role, straight from the
/// database.
async fn require_admin(
    req: &HttpRequest,
    data: &AppState,
) -> Result<Result<UserModel, HttpResponse>, Error> {
    let user = auth_service::authenticated_user(req, &data.users_collection)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    match user {
        Some(u) if u.role == Role::Admin => Ok(Ok(u)),
        _ => Ok(Err(
            HttpResponse::Unauthorized().json(json!({ "detail": "Unauthorized" }))
        )),
    }
}

/// GET /admin/users
/// All users, newest first, sensitive fields projected away server-side.
#[get("/users")]
pub async fn list_users(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, Error> {
    if let Err(resp) = require_admin(&req, &data).await? {
        return Ok(resp);
    }

    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .projection(doc! {
            "name": 1,
            "email": 1,
            "verified": 1,
            "blocked": 1,
            "total_listings": 1,
            "total_sales": 1,
            "rating": 1,
            "created_at": 1,
        })
        .build();

    let rows_collection = data.users_collection.clone_with_type::<AdminUserRow>();
    let mut cursor = rows_collection
        .find(None, options)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let mut users = Vec::new();
    while let Some(row) = cursor
        .try_next()
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
    {
        users.push(row);
    }

    Ok(HttpResponse::Ok().json(users))
}

/// PUT /admin/users
/// Moderation actions on a user. Blocking also pulls the user's active
/// listings off the marketplace through the lifecycle state machine.
#[put("/users")]
pub async fn update_user(
    req: HttpRequest,
    form: web::Json<UserActionForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let admin = match require_admin(&req, &data).await? {
        Ok(admin) => admin,
        Err(resp) => return Ok(resp),
    };

    let target = auth_service::get_user_by_id(&data.users_collection, &form.user_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    if target.is_none() {
        return Ok(HttpResponse::NotFound().json(json!({ "detail": "User not found" })));
    }

    let set = match form.action.as_str() {
        "verify" => doc! { "verified": true },
        "unverify" => doc! { "verified": false },
        "block" => doc! { "blocked": true },
        "unblock" => doc! { "blocked": false },
        other => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "detail": format!("Unknown action: {}", other)
            })))
        }
    };

    data.users_collection
        .update_one(doc! { "_id": &form.user_id }, doc! { "$set": set }, None)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    if form.action == "block" {
        let mut cursor = data
            .listings_collection
            .find(
                doc! { "seller": &form.user_id, "status": ListingStatus::Active.as_str() },
                None,
            )
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
        while let Some(listing) = cursor
            .try_next()
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        {
            listing_service::transition_status(
                &data.listings_collection,
                &data.users_collection,
                &data.mailer,
                listing,
                ListingStatus::Inactive,
                &admin,
                Some("Your account has been blocked".to_string()),
            )
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
        }
        log::info!("Admin {} blocked user {}", admin.id, form.user_id);
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// GET /admin/listings
/// All listings, optionally filtered by status, with seller contact joined.
#[get("/listings")]
pub async fn list_listings(
    req: HttpRequest,
    query: web::Query<AdminListingsQuery>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    if let Err(resp) = require_admin(&req, &data).await? {
        return Ok(resp);
    }

    let filter = match query.status.as_deref() {
        Some(raw) => match ListingStatus::parse(raw) {
            Some(status) => doc! { "status": status.as_str() },
            None => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "detail": format!("Unknown status: {}", raw)
                })))
            }
        },
        None => doc! {},
    };

    let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
    let mut cursor = data
        .listings_collection
        .find(filter, options)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let mut listings: Vec<ListingModel> = Vec::new();
    while let Some(listing) = cursor
        .try_next()
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
    {
        listings.push(listing);
    }

    let seller_ids: Vec<String> = listings.iter().map(|l| l.seller.clone()).collect();
    let sellers = listing_service::users_by_ids(&data.users_collection, &seller_ids)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    let items: Vec<serde_json::Value> = listings
        .iter()
        .map(|listing| {
            let mut value = json!(listing);
            if let (Some(obj), Some(seller)) =
                (value.as_object_mut(), sellers.get(&listing.seller))
            {
                obj.insert(
                    "seller".to_string(),
                    json!({ "id": seller.id, "name": seller.name, "email": seller.email }),
                );
            }
            value
        })
        .collect();

    Ok(HttpResponse::Ok().json(items))
}

/// PUT /admin/listings
/// Moderation actions on a listing; all status changes flow through the
/// lifecycle state machine so the transition rules and seller emails apply.
#[put("/listings")]
pub async fn update_listing(
    req: HttpRequest,
    form: web::Json<ListingActionForm>,
    data: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let admin = match require_admin(&req, &data).await? {
        Ok(admin) => admin,
        Err(resp) => return Ok(resp),
    };

    let listing = listing_service::get_listing(&data.listings_collection, &form.listing_id)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
    let listing = match listing {
        Some(l) => l,
        None => return Ok(HttpResponse::NotFound().json(json!({ "detail": "Listing not found" }))),
    };

    let next = match form.action.as_str() {
        "approve" | "activate" => ListingStatus::Active,
        "reject" => ListingStatus::Rejected,
        "deactivate" => ListingStatus::Inactive,
        "sold" => ListingStatus::Sold,
        "delete" => {
            listing_service::delete_listing(
                &data.listings_collection,
                &data.users_collection,
                &data.bids_collection,
                &listing,
            )
            .await
            .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            log::info!("Admin {} deleted listing {}", admin.id, listing.id);
            return Ok(HttpResponse::Ok().json(json!({ "success": true })));
        }
        other => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "detail": format!("Unknown action: {}", other)
            })))
        }
    };

    let outcome = listing_service::transition_status(
        &data.listings_collection,
        &data.users_collection,
        &data.mailer,
        listing,
        next,
        &admin,
        form.note.clone(),
    )
    .await
    .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;

    match outcome {
        TransitionOutcome::Applied(listing) | TransitionOutcome::NoOp(listing) => {
            Ok(HttpResponse::Ok().json(json!({ "success": true, "listing": listing })))
        }
        TransitionOutcome::Illegal { from, to } => {
            Ok(HttpResponse::UnprocessableEntity().json(json!({
                "detail": format!("Cannot change status from {} to {}", from.as_str(), to.as_str())
            })))
        }
    }
}
