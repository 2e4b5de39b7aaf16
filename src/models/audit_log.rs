use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub action: String,
    pub target_type: String,
    pub target_id: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewAuditLog {
    pub actor_id: Option<Uuid>,
    pub action: AuditAction,
    pub target_type: TargetType,
    pub target_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Dotted action taxonomy, one name per auditable mutation.
#[derive(Debug, Clone, Copy)]
pub enum AuditAction {
    ListingCreate,
    ListingUpdate,
    ListingStatusChange,
    ListingDelete,
    ListingView,
    ReportCreate,
    ReportUpdate,
    UserStatusChange,
    FavoriteAdd,
    ComparisonAdd,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::ListingCreate => "listing.create",
            AuditAction::ListingUpdate => "listing.update",
            AuditAction::ListingStatusChange => "listing.status.change",
            AuditAction::ListingDelete => "listing.delete",
            AuditAction::ListingView => "listing.view",
            AuditAction::ReportCreate => "report.create",
            AuditAction::ReportUpdate => "report.update",
            AuditAction::UserStatusChange => "user.status.change",
            AuditAction::FavoriteAdd => "favorite.add",
            AuditAction::ComparisonAdd => "comparison.add",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Listing,
    Report,
    User,
    Comparison,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Listing => "listing",
            TargetType::Report => "report",
            TargetType::User => "user",
            TargetType::Comparison => "comparison",
        }
    }
}
