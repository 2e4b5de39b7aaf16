use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "listing_status", rename_all = "lowercase")]
pub enum ListingStatus {
    Draft,
    Pending,
    Approved,
    Hidden,
    Sold,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Pending => "pending",
            ListingStatus::Approved => "approved",
            ListingStatus::Hidden => "hidden",
            ListingStatus::Sold => "sold",
        }
    }

    /// Moderation state machine. `sold` is terminal; everything else moves
    /// forward through review, with `hidden` reversible by an admin.
    pub fn can_transition_to(&self, to: ListingStatus) -> bool {
        use ListingStatus::*;
        matches!(
            (self, to),
            (Draft, Pending) | (Pending, Approved) | (Pending, Hidden) | (Approved, Sold) | (Approved, Hidden) | (Hidden, Approved)
        )
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_vnd: i64,
    pub brand_id: i32,
    pub model_id: i32,
    pub year: i32,
    pub mileage_km: Option<i32>,
    pub gearbox: Option<String>,
    pub fuel: Option<String>,
    pub body_type: Option<String>,
    pub seats: Option<i32>,
    pub color_ext: Option<String>,
    pub color_int: Option<String>,
    pub origin: Option<String>,
    pub description: Option<String>,
    pub province_id: Option<i32>,
    pub district_id: Option<i32>,
    pub address_line: Option<String>,
    pub video_url: Option<String>,
    pub status: ListingStatus,
    pub views_count: i32,
    pub edits_count: i32,
    pub reports_count: i32,
    pub version: i32,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListingImage {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub file_key: String,
    pub public_url: String,
    pub is_approved: bool,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields a seller supplies when creating a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub price_vnd: i64,
    pub brand_id: i32,
    pub model_id: i32,
    pub year: i32,
    pub mileage_km: Option<i32>,
    pub gearbox: Option<String>,
    pub fuel: Option<String>,
    pub body_type: Option<String>,
    pub seats: Option<i32>,
    pub color_ext: Option<String>,
    pub color_int: Option<String>,
    pub origin: Option<String>,
    pub description: Option<String>,
    pub province_id: Option<i32>,
    pub district_id: Option<i32>,
    pub address_line: Option<String>,
    pub video_url: Option<String>,
}

/// Partial update for a listing. The field set is closed: only these
/// columns can ever reach the UPDATE statement, whatever a caller sends.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub price_vnd: Option<i64>,
    pub brand_id: Option<i32>,
    pub model_id: Option<i32>,
    pub year: Option<i32>,
    pub mileage_km: Option<i32>,
    pub gearbox: Option<String>,
    pub fuel: Option<String>,
    pub body_type: Option<String>,
    pub seats: Option<i32>,
    pub color_ext: Option<String>,
    pub color_int: Option<String>,
    pub origin: Option<String>,
    pub description: Option<String>,
    pub province_id: Option<i32>,
    pub district_id: Option<i32>,
    pub address_line: Option<String>,
    pub video_url: Option<String>,
}

impl ListingPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.price_vnd.is_none()
            && self.brand_id.is_none()
            && self.model_id.is_none()
            && self.year.is_none()
            && self.mileage_km.is_none()
            && self.gearbox.is_none()
            && self.fuel.is_none()
            && self.body_type.is_none()
            && self.seats.is_none()
            && self.color_ext.is_none()
            && self.color_int.is_none()
            && self.origin.is_none()
            && self.description.is_none()
            && self.province_id.is_none()
            && self.district_id.is_none()
            && self.address_line.is_none()
            && self.video_url.is_none()
    }

    /// Compact JSON of the supplied fields, recorded as audit metadata.
    pub fn to_metadata(&self) -> serde_json::Value {
        let mut changes = serde_json::Map::new();
        macro_rules! put {
            ($field:ident) => {
                if let Some(ref v) = self.$field {
                    changes.insert(stringify!($field).to_string(), serde_json::json!(v));
                }
            };
        }
        put!(title);
        put!(price_vnd);
        put!(brand_id);
        put!(model_id);
        put!(year);
        put!(mileage_km);
        put!(gearbox);
        put!(fuel);
        put!(body_type);
        put!(seats);
        put!(color_ext);
        put!(color_int);
        put!(origin);
        put!(description);
        put!(province_id);
        put!(district_id);
        put!(address_line);
        put!(video_url);
        serde_json::Value::Object(changes)
    }
}

/// A raw image payload to attach to a listing.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: bytes::Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_allows_the_moderation_path() {
        assert!(ListingStatus::Draft.can_transition_to(ListingStatus::Pending));
        assert!(ListingStatus::Pending.can_transition_to(ListingStatus::Approved));
        assert!(ListingStatus::Pending.can_transition_to(ListingStatus::Hidden));
        assert!(ListingStatus::Approved.can_transition_to(ListingStatus::Sold));
        assert!(ListingStatus::Approved.can_transition_to(ListingStatus::Hidden));
        assert!(ListingStatus::Hidden.can_transition_to(ListingStatus::Approved));
    }

    #[test]
    fn transition_table_rejects_backwards_and_terminal_moves() {
        assert!(!ListingStatus::Approved.can_transition_to(ListingStatus::Pending));
        assert!(!ListingStatus::Sold.can_transition_to(ListingStatus::Approved));
        assert!(!ListingStatus::Sold.can_transition_to(ListingStatus::Hidden));
        assert!(!ListingStatus::Draft.can_transition_to(ListingStatus::Approved));
        assert!(!ListingStatus::Pending.can_transition_to(ListingStatus::Pending));
    }

    #[test]
    fn patch_metadata_only_contains_supplied_fields() {
        let patch = ListingPatch {
            price_vnd: Some(480_000_000),
            ..Default::default()
        };
        let meta = patch.to_metadata();
        assert_eq!(meta["price_vnd"], 480_000_000);
        assert!(meta.get("title").is_none());
        assert_eq!(meta.as_object().unwrap().len(), 1);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ListingPatch::default().is_empty());
        let patch = ListingPatch {
            title: Some("Toyota Camry".into()),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
