use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::ReportType;
use crate::services::{NewReport, ReportService};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub listing_id: Uuid,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    #[validate(length(min = 8, max = 20, message = "reporter_phone must be 8-20 characters"))]
    pub reporter_phone: Option<String>,
    #[validate(length(max = 1000, message = "note must be at most 1000 characters"))]
    pub note: Option<String>,
}

/// Public report submission. Authenticated callers are attributed through
/// their token; anonymous callers must leave a phone number.
pub async fn create_report(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ReportService::new(state.db.clone());
    let report = service
        .create(NewReport {
            listing_id: payload.listing_id,
            reporter_id: current_user.map(|Extension(u)| u.id),
            reporter_phone: payload.reporter_phone,
            report_type: payload.report_type,
            note: payload.note,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Report created successfully",
            "id": report.id,
        })),
    ))
}
