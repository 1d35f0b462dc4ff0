// src/services/listing_service.rs

use std::collections::HashMap;

use futures::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument};
use mongodb::Collection;

use crate::models::listing::{ListingModel, ListingStatus};
use crate::models::user::{Role, UserModel};
use crate::services::email_service::{self, Mailer};

/// Fixed page size for the public marketplace feed.
pub const PAGE_SIZE: i64 = 12;

/// What a requested status change amounts to, before touching the database.
#[derive(Debug, PartialEq, Eq)]
pub enum TransitionDecision {
    /// Target equals current status: accept, write nothing, send nothing.
    NoOp,
    /// A legal edge of the transition table.
    Apply,
    /// Terminal state reopened by an admin; logged at WARN by the caller.
    AdminOverride,
    /// Not a legal edge and no override applies.
    Illegal,
}

/// Applies the transition table. Admins may reopen a terminal listing back to
/// `active`; nobody else can leave a terminal state.
pub fn decide_transition(
    current: ListingStatus,
    next: ListingStatus,
    actor_role: Role,
) -> TransitionDecision {
    if current == next {
        return TransitionDecision::NoOp;
    }
    if current.can_transition(next) {
        return TransitionDecision::Apply;
    }
    if actor_role == Role::Admin && current.is_terminal() && next == ListingStatus::Active {
        return TransitionDecision::AdminOverride;
    }
    TransitionDecision::Illegal
}

/// Outcome of a status change request, after the database write.
pub enum TransitionOutcome {
    Applied(Box<ListingModel>),
    NoOp(Box<ListingModel>),
    Illegal {
        from: ListingStatus,
        to: ListingStatus,
    },
}

/// Moves a listing through the state machine and notifies the seller.
///
/// The email is spawned off the request path and its failure never rolls back
/// the status write. A no-op transition (same status) sends no email.
pub async fn transition_status(
    listings: &Collection<ListingModel>,
    users: &Collection<UserModel>,
    mailer: &Mailer,
    listing: ListingModel,
    next: ListingStatus,
    actor: &UserModel,
    note: Option<String>,
) -> mongodb::error::Result<TransitionOutcome> {
    match decide_transition(listing.status, next, actor.role) {
        TransitionDecision::NoOp => return Ok(TransitionOutcome::NoOp(Box::new(listing))),
        TransitionDecision::Illegal => {
            return Ok(TransitionOutcome::Illegal {
                from: listing.status,
                to: next,
            })
        }
        TransitionDecision::AdminOverride => {
            log::warn!(
                "Admin {} reopened terminal listing {} ({} -> {})",
                actor.id,
                listing.id,
                listing.status.as_str(),
                next.as_str()
            );
        }
        TransitionDecision::Apply => {}
    }

    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    let updated = listings
        .find_one_and_update(
            doc! { "_id": &listing.id },
            doc! { "$set": { "status": next.as_str(), "updated_at": DateTime::now() } },
            options,
        )
        .await?;

    let updated = match updated {
        Some(l) => l,
        // deleted out from under us between fetch and update
        None => {
            return Ok(TransitionOutcome::Illegal {
                from: listing.status,
                to: next,
            })
        }
    };

    log::info!(
        "Listing {} status: {} -> {} (by {})",
        updated.id,
        listing.status.as_str(),
        next.as_str(),
        actor.id
    );

    match crate::services::auth_service::get_user_by_id(users, &updated.seller).await {
        Ok(Some(seller)) => {
            let html = email_service::listing_status_email(
                &mailer.company_name,
                &updated.title,
                next.as_str(),
                note.as_deref(),
            );
            email_service::send_in_background(
                mailer.clone(),
                seller.email,
                format!("Your listing is now {}", next.as_str()),
                html,
            );
        }
        Ok(None) => log::error!("Seller {} missing for listing {}", updated.seller, updated.id),
        Err(e) => log::error!("Seller lookup failed for listing {}: {}", updated.id, e),
    }

    Ok(TransitionOutcome::Applied(Box::new(updated)))
}

pub async fn get_listing(
    listings: &Collection<ListingModel>,
    id: &str,
) -> mongodb::error::Result<Option<ListingModel>> {
    listings.find_one(doc! { "_id": id }, None).await
}

/// Fetches a listing and counts the view, atomically, returning the updated
/// document.
pub async fn get_listing_counting_view(
    listings: &Collection<ListingModel>,
    id: &str,
) -> mongodb::error::Result<Option<ListingModel>> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    listings
        .find_one_and_update(doc! { "_id": id }, doc! { "$inc": { "views": 1 } }, options)
        .await
}

/// Server-side marketplace query: active listings only, optional category and
/// case-insensitive title search, newest first, fixed-size pages.
pub async fn find_active_listings(
    listings: &Collection<ListingModel>,
    category: Option<&str>,
    search: Option<&str>,
    page: i64,
) -> mongodb::error::Result<(Vec<ListingModel>, u64)> {
    let mut filter = doc! { "status": ListingStatus::Active.as_str() };
    if let Some(category) = category {
        filter.insert("category", category);
    }
    if let Some(q) = search {
        filter.insert("title", doc! { "$regex": q, "$options": "i" });
    }

    let page = page.max(1);
    let options = FindOptions::builder()
        .sort(doc! { "created_at": -1 })
        .skip(((page - 1) * PAGE_SIZE) as u64)
        .limit(PAGE_SIZE)
        .build();

    let mut cursor = listings.find(filter.clone(), options).await?;
    let mut items = Vec::new();
    while let Some(listing) = cursor.try_next().await? {
        items.push(listing);
    }
    let total = listings.count_documents(filter, None).await?;
    Ok((items, total))
}

/// Inserts a listing and wires it into the seller's account.
pub async fn create_listing(
    listings: &Collection<ListingModel>,
    users: &Collection<UserModel>,
    listing: ListingModel,
) -> mongodb::error::Result<ListingModel> {
    listings.insert_one(&listing, None).await?;
    users
        .update_one(
            doc! { "_id": &listing.seller },
            doc! {
                "$push": { "listings": &listing.id },
                "$inc": { "total_listings": 1 },
            },
            None,
        )
        .await?;
    Ok(listing)
}

/// Applies a `$set` of plain field edits (never the status; status changes go
/// through [`transition_status`]).
pub async fn update_listing_fields(
    listings: &Collection<ListingModel>,
    id: &str,
    mut set: Document,
) -> mongodb::error::Result<Option<ListingModel>> {
    set.insert("updated_at", DateTime::now());
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    listings
        .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
        .await
}

/// Deletes a listing together with its bids and the seller's back-references.
pub async fn delete_listing(
    listings: &Collection<ListingModel>,
    users: &Collection<UserModel>,
    bids: &Collection<crate::models::bid::BidModel>,
    listing: &ListingModel,
) -> mongodb::error::Result<()> {
    listings.delete_one(doc! { "_id": &listing.id }, None).await?;
    users
        .update_one(
            doc! { "_id": &listing.seller },
            doc! {
                "$pull": { "listings": &listing.id },
                "$inc": { "total_listings": -1 },
            },
            None,
        )
        .await?;
    bids.delete_many(doc! { "listing": &listing.id }, None).await?;
    Ok(())
}

/// Batch-fetches users by id, keyed for joining summaries onto responses.
pub async fn users_by_ids(
    users: &Collection<UserModel>,
    ids: &[String],
) -> mongodb::error::Result<HashMap<String, UserModel>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let mut cursor = users.find(doc! { "_id": { "$in": ids } }, None).await?;
    let mut map = HashMap::new();
    while let Some(user) = cursor.try_next().await? {
        map.insert(user.id.clone(), user);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ListingStatus::*;

    #[test]
    fn same_status_is_a_no_op() {
        assert_eq!(decide_transition(Active, Active, Role::User), TransitionDecision::NoOp);
        assert_eq!(decide_transition(Sold, Sold, Role::Admin), TransitionDecision::NoOp);
    }

    #[test]
    fn legal_edges_apply_for_any_role() {
        assert_eq!(decide_transition(Pending, Active, Role::Admin), TransitionDecision::Apply);
        assert_eq!(decide_transition(Draft, Pending, Role::User), TransitionDecision::Apply);
        assert_eq!(decide_transition(Active, Sold, Role::Admin), TransitionDecision::Apply);
    }

    #[test]
    fn terminal_states_reopen_only_for_admins_and_only_to_active() {
        assert_eq!(
            decide_transition(Sold, Active, Role::Admin),
            TransitionDecision::AdminOverride
        );
        assert_eq!(
            decide_transition(Rejected, Active, Role::Admin),
            TransitionDecision::AdminOverride
        );
        assert_eq!(decide_transition(Sold, Active, Role::User), TransitionDecision::Illegal);
        assert_eq!(decide_transition(Sold, Pending, Role::Admin), TransitionDecision::Illegal);
        assert_eq!(decide_transition(Rejected, Pending, Role::Admin), TransitionDecision::Illegal);
    }

    #[test]
    fn illegal_edges_stay_illegal_for_admins() {
        // a sold listing cannot be walked back to pending, even by an admin
        assert_eq!(decide_transition(Sold, Pending, Role::Admin), TransitionDecision::Illegal);
        assert_eq!(decide_transition(Pending, Sold, Role::Admin), TransitionDecision::Illegal);
        assert_eq!(decide_transition(Inactive, Rejected, Role::Admin), TransitionDecision::Illegal);
    }
}
