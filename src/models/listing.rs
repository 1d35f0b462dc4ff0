use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::user::default_id;

/// Closed set of asset categories a listing can be filed under.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Website,
    #[serde(rename = "YouTube Channel")]
    YoutubeChannel,
    #[serde(rename = "Facebook Page")]
    FacebookPage,
    #[serde(rename = "Instagram Page")]
    InstagramPage,
    #[serde(rename = "TikTok Account")]
    TiktokAccount,
    #[serde(rename = "Twitter Account")]
    TwitterAccount,
    #[serde(rename = "Play Console")]
    PlayConsole,
    #[serde(rename = "AdSense Dashboard")]
    AdsenseDashboard,
    #[serde(rename = "Shopify Store")]
    ShopifyStore,
    #[serde(rename = "Dropshipping Store")]
    DropshippingStore,
    #[serde(rename = "SaaS")]
    Saas,
    #[serde(rename = "Mobile App")]
    MobileApp,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Website => "Website",
            Category::YoutubeChannel => "YouTube Channel",
            Category::FacebookPage => "Facebook Page",
            Category::InstagramPage => "Instagram Page",
            Category::TiktokAccount => "TikTok Account",
            Category::TwitterAccount => "Twitter Account",
            Category::PlayConsole => "Play Console",
            Category::AdsenseDashboard => "AdSense Dashboard",
            Category::ShopifyStore => "Shopify Store",
            Category::DropshippingStore => "Dropshipping Store",
            Category::Saas => "SaaS",
            Category::MobileApp => "Mobile App",
            Category::Other => "Other",
        }
    }
}

/// Listing lifecycle states, governed by an explicit transition table.
///
/// ```text
/// pending  -> active | rejected
/// active   -> sold | inactive | rejected
/// inactive -> active
/// draft    -> pending
/// sold, rejected: terminal (admin override only)
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Pending,
    Active,
    Sold,
    Draft,
    Rejected,
    Inactive,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Pending => "pending",
            ListingStatus::Active => "active",
            ListingStatus::Sold => "sold",
            ListingStatus::Draft => "draft",
            ListingStatus::Rejected => "rejected",
            ListingStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<ListingStatus> {
        match s {
            "pending" => Some(ListingStatus::Pending),
            "active" => Some(ListingStatus::Active),
            "sold" => Some(ListingStatus::Sold),
            "draft" => Some(ListingStatus::Draft),
            "rejected" => Some(ListingStatus::Rejected),
            "inactive" => Some(ListingStatus::Inactive),
            _ => None,
        }
    }

    /// No further non-override transitions leave these states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ListingStatus::Sold | ListingStatus::Rejected)
    }

    /// The allowed-transitions table. Self-transitions are handled separately
    /// as no-ops by the lifecycle service.
    pub fn can_transition(&self, next: ListingStatus) -> bool {
        use ListingStatus::*;
        matches!(
            (self, next),
            (Pending, Active)
                | (Pending, Rejected)
                | (Active, Sold)
                | (Active, Inactive)
                | (Active, Rejected)
                | (Inactive, Active)
                | (Draft, Pending)
        )
    }
}

/// Quantitative figures a seller reports about the asset.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ListingMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_traffic: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscribers: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<f64>,
    /// Asset age in months.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

/// Free-form descriptive fields.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ListingDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub niche: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monetization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traffic_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_potential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_received: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

fn default_true() -> bool {
    true
}

/// A digital asset offered for sale by exactly one seller.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ListingModel {
    #[serde(rename = "_id", default = "default_id")]
    pub id: String,

    pub title: String,

    pub description: String,

    pub category: Category,

    /// Asking price; non-negative.
    pub price: f64,

    /// Id of the owning user.
    pub seller: String,

    #[serde(default)]
    pub images: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,

    #[serde(default)]
    pub status: ListingStatus,

    #[serde(default)]
    pub metrics: ListingMetrics,

    #[serde(default)]
    pub details: ListingDetails,

    #[serde(default)]
    pub views: i64,

    /// Ids of users who favorited this listing.
    #[serde(default)]
    pub favorites: Vec<String>,

    #[serde(default)]
    pub featured: bool,

    /// Ids of bids placed on this listing.
    #[serde(default)]
    pub bids: Vec<String>,

    #[serde(default = "default_true")]
    pub allow_bidding: bool,

    /// Explicit bid floor; 0 means the asking price is the floor.
    #[serde(default)]
    pub min_bid_amount: f64,

    #[serde(default = "DateTime::now")]
    pub created_at: DateTime,

    #[serde(default = "DateTime::now")]
    pub updated_at: DateTime,
}

impl ListingModel {
    /// The minimum acceptable bid for this listing.
    pub fn bid_floor(&self) -> f64 {
        if self.min_bid_amount > 0.0 {
            self.min_bid_amount
        } else {
            self.price
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_allows_the_documented_edges() {
        use ListingStatus::*;
        assert!(Pending.can_transition(Active));
        assert!(Pending.can_transition(Rejected));
        assert!(Active.can_transition(Sold));
        assert!(Active.can_transition(Inactive));
        assert!(Active.can_transition(Rejected));
        assert!(Inactive.can_transition(Active));
        assert!(Draft.can_transition(Pending));
    }

    #[test]
    fn transition_table_rejects_everything_else() {
        use ListingStatus::*;
        // sold and rejected are terminal
        for next in [Pending, Active, Sold, Draft, Rejected, Inactive] {
            assert!(!Sold.can_transition(next));
            assert!(!Rejected.can_transition(next));
        }
        // a sold listing cannot quietly reappear as pending
        assert!(!Sold.can_transition(Pending));
        assert!(!Pending.can_transition(Sold));
        assert!(!Inactive.can_transition(Sold));
        assert!(!Draft.can_transition(Active));
    }

    #[test]
    fn terminal_states() {
        assert!(ListingStatus::Sold.is_terminal());
        assert!(ListingStatus::Rejected.is_terminal());
        assert!(!ListingStatus::Active.is_terminal());
        assert!(!ListingStatus::Pending.is_terminal());
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ListingStatus::Pending,
            ListingStatus::Active,
            ListingStatus::Sold,
            ListingStatus::Draft,
            ListingStatus::Rejected,
            ListingStatus::Inactive,
        ] {
            assert_eq!(ListingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(ListingStatus::parse("archived"), None);
    }

    #[test]
    fn bid_floor_prefers_explicit_minimum() {
        let mut listing: ListingModel =
            serde_json::from_value(serde_json::json!({
                "title": "Tech blog",
                "description": "A niche tech blog",
                "category": "Website",
                "price": 1000.0,
                "seller": "abc",
            }))
            .unwrap();
        assert_eq!(listing.bid_floor(), 1000.0);
        listing.min_bid_amount = 250.0;
        assert_eq!(listing.bid_floor(), 250.0);
    }

    #[test]
    fn category_names_match_their_serde_form() {
        let cat: Category = serde_json::from_value(serde_json::json!("YouTube Channel")).unwrap();
        assert_eq!(cat, Category::YoutubeChannel);
        assert_eq!(cat.as_str(), "YouTube Channel");
        assert!(serde_json::from_value::<Category>(serde_json::json!("Newsletter")).is_err());
    }
}
