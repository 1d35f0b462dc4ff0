use mongodb::bson::oid::ObjectId;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// Returns a new ObjectId as a hex string. This is used as the default for the `id` field.
pub fn default_id() -> String {
    ObjectId::new().to_hex()
}

/// Account role. Authorization always re-reads this from the database;
/// the `user_role` cookie is a routing hint only.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// A marketplace account.
///
/// Note:
/// - The `_id` field is renamed to `id` here, stored as a `String` (hex representation of ObjectId).
/// - `verified` is the admin-granted seller badge; `email_verified` is set by OTP confirmation.
/// - The OTP and reset-token fields are absent except while a verification or
///   reset is in flight; both are single-use and expire.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserModel {
    #[serde(rename = "_id", default = "default_id")]
    pub id: String,

    pub name: String,

    /// Stored lowercased; unique across the collection.
    pub email: String,

    /// The bcrypt hash of the user's password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,

    #[serde(default)]
    pub role: Role,

    #[serde(default)]
    pub verified: bool,

    #[serde(default)]
    pub email_verified: bool,

    /// Set by admin moderation; a blocked account cannot log in.
    #[serde(default)]
    pub blocked: bool,

    #[serde(default)]
    pub total_listings: i64,

    #[serde(default)]
    pub total_sales: i64,

    #[serde(default)]
    pub total_earnings: f64,

    /// Seller rating, 0 to 5.
    #[serde(default)]
    pub rating: f64,

    /// Ids of listings owned by this user.
    #[serde(default)]
    pub listings: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verification_otp: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verification_expiry: Option<DateTime>,

    /// SHA-256 hex of the raw reset token; the raw token is only ever emailed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_expiry: Option<DateTime>,

    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,

    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime,
}

/// The slice of a user that is safe to return to any caller.
/// Password, OTP and reset-token fields never leave the server.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    pub role: Role,
    pub verified: bool,
    pub total_listings: i64,
    pub total_sales: i64,
    pub rating: f64,
    pub listings: Vec<String>,
}

impl From<&UserModel> for PublicUser {
    fn from(user: &UserModel) -> Self {
        PublicUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
            whatsapp: user.whatsapp.clone(),
            role: user.role,
            verified: user.verified,
            total_listings: user.total_listings,
            total_sales: user.total_sales,
            rating: user.rating,
            listings: user.listings.clone(),
        }
    }
}

/// A compact seller summary attached to listing and bid responses.
#[derive(Debug, Serialize, Clone)]
pub struct SellerSummary {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub rating: f64,
}

impl From<&UserModel> for SellerSummary {
    fn from(user: &UserModel) -> Self {
        SellerSummary {
            id: user.id.clone(),
            name: user.name.clone(),
            avatar: user.avatar.clone(),
            bio: user.bio.clone(),
            rating: user.rating,
        }
    }
}
