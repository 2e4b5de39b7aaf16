use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::api::listings::parse_listing_id;
use crate::api::Paginated;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{
    AuditLog, ListingPatch, ListingStatus, ReportStatus, TargetType, User, UserStatus,
};
use crate::services::{
    AdminService, AdminUserSummary, AuditService, ListingService, ModerationListing,
    ReportService, ReportWithReporter, Stats, StatsPeriod, StatsService,
};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/listings", get(list_listings))
        .route(
            "/listings/:id",
            axum::routing::patch(update_listing).delete(delete_listing),
        )
        .route("/listings/:id/status", post(update_listing_status))
        .route("/listings/:id/reports", get(get_listing_reports))
        .route("/reports/:id/status", post(update_report_status))
        .route("/users", get(list_users))
        .route("/users/:id/status", post(update_user_status))
        .route("/stats", get(get_stats))
        .route("/audit-logs", get(list_audit_logs))
}

#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ListingStatus>,
}

async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Paginated<ModerationListing>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let service = AdminService::new(state.db.clone());
    let (items, total) = service.list_listings(query.status, page, limit).await?;

    Ok(Json(Paginated::new(items, total, page, limit)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateListingRequest {
    #[serde(flatten)]
    pub patch: ListingPatch,
    pub expected_version: Option<i32>,
}

/// Direct field correction by an admin: same pipeline as a seller edit,
/// minus the image diff.
async fn update_listing(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateListingRequest>,
) -> Result<Json<crate::models::Listing>> {
    let listing_id = parse_listing_id(&id)?;

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let listing = service
        .edit(
            listing_id,
            payload.patch,
            Vec::new(),
            Vec::new(),
            current_user.id,
            None,
            payload.expected_version,
        )
        .await?;

    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct UpdateListingStatusRequest {
    pub status: ListingStatus,
    pub expected_version: Option<i32>,
}

async fn update_listing_status(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateListingStatusRequest>,
) -> Result<Json<crate::models::Listing>> {
    let listing_id = parse_listing_id(&id)?;

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let listing = service
        .change_status(
            listing_id,
            payload.status,
            current_user.id,
            payload.expected_version,
        )
        .await?;

    Ok(Json(listing))
}

async fn delete_listing(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let listing_id = parse_listing_id(&id)?;

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    service.delete(listing_id, current_user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Listing {} has been deleted", id),
    })))
}

async fn get_listing_reports(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ReportWithReporter>>> {
    let listing_id = parse_listing_id(&id)?;

    let service = ReportService::new(state.db.clone());
    let reports = service.list_by_listing(listing_id).await?;

    Ok(Json(reports))
}

#[derive(Debug, Deserialize)]
pub struct UpdateReportStatusRequest {
    pub status: ReportStatus,
}

async fn update_report_status(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateReportStatusRequest>,
) -> Result<Json<crate::models::Report>> {
    let report_id =
        Uuid::parse_str(&id).map_err(|_| AppError::Validation("Invalid report ID".to_string()))?;

    let service = ReportService::new(state.db.clone());
    let report = service
        .update_status(report_id, payload.status, Some(current_user.id))
        .await?;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct AdminUsersQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<UserStatus>,
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<AdminUsersQuery>,
) -> Result<Json<Paginated<AdminUserSummary>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    let service = AdminService::new(state.db.clone());
    let (items, total) = service.list_users(query.status, page, limit).await?;

    Ok(Json(Paginated::new(items, total, page, limit)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserStatusRequest {
    pub status: UserStatus,
}

async fn update_user_status(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserStatusRequest>,
) -> Result<Json<User>> {
    let user_id =
        Uuid::parse_str(&id).map_err(|_| AppError::Validation("Invalid user ID".to_string()))?;

    let service = AdminService::new(state.db.clone());
    let user = service
        .update_user_status(user_id, payload.status, current_user.id)
        .await?;

    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub period: Option<StatsPeriod>,
    pub date_filter: Option<DateTime<Utc>>,
}

async fn get_stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<Stats>> {
    let service = StatsService::new(state.db.clone());
    let stats = service
        .get_stats(query.period.unwrap_or(StatsPeriod::Day), query.date_filter)
        .await?;

    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
pub struct AuditLogsQuery {
    pub limit: Option<i64>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
}

async fn list_audit_logs(
    State(state): State<AppState>,
    Query(query): Query<AuditLogsQuery>,
) -> Result<Json<Vec<AuditLog>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);

    let service = AuditService::new(state.db.clone());
    let logs = match (query.target_type, query.target_id) {
        (Some(target_type), Some(target_id)) => {
            service.list_by_target(target_type, &target_id, limit).await?
        }
        _ => service.list_recent(limit).await?,
    };

    Ok(Json(logs))
}
