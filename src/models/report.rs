use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "report_type", rename_all = "snake_case")]
pub enum ReportType {
    Fraud,
    Unreachable,
    WrongPrice,
    Duplicate,
    Sold,
    IncorrectInfo,
    Other,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Fraud => "fraud",
            ReportType::Unreachable => "unreachable",
            ReportType::WrongPrice => "wrong_price",
            ReportType::Duplicate => "duplicate",
            ReportType::Sold => "sold",
            ReportType::IncorrectInfo => "incorrect_info",
            ReportType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "report_status", rename_all = "lowercase")]
pub enum ReportStatus {
    New,
    Reviewing,
    Valid,
    Invalid,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::New => "new",
            ReportStatus::Reviewing => "reviewing",
            ReportStatus::Valid => "valid",
            ReportStatus::Invalid => "invalid",
            ReportStatus::Resolved => "resolved",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub reporter_id: Option<Uuid>,
    pub reporter_phone: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub note: Option<String>,
    pub status: ReportStatus,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
