use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{AuditAction, NewAuditLog, Report, ReportStatus, ReportType, TargetType};
use crate::services::audit_service;

pub struct ReportService {
    db: Database,
}

/// Report joined with the reporter's display name when known.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportWithReporter {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub report: Report,
    pub reporter_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub listing_id: Uuid,
    pub reporter_id: Option<Uuid>,
    pub reporter_phone: Option<String>,
    pub report_type: ReportType,
    pub note: Option<String>,
}

impl ReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// File a report against a listing. The listing's cached report count
    /// and the audit entry ride the same transaction as the insert; an
    /// anonymous-by-phone report is audited with no actor.
    pub async fn create(&self, data: NewReport) -> Result<Report> {
        let reporter_phone = data
            .reporter_phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from);

        if data.reporter_id.is_none() && reporter_phone.is_none() {
            return Err(AppError::Validation(
                "Either reporter_id or reporter_phone is required".to_string(),
            ));
        }

        let mut tx = self.db.pg.begin().await?;

        let listing_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM listings WHERE id = $1)")
                .bind(data.listing_id)
                .fetch_one(&mut *tx)
                .await?;
        if !listing_exists {
            return Err(AppError::Validation("Unknown listing".to_string()));
        }

        let report: Report = sqlx::query_as(
            r#"
            INSERT INTO reports (listing_id, reporter_id, reporter_phone, type, note)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.listing_id)
        .bind(data.reporter_id)
        .bind(&reporter_phone)
        .bind(data.report_type)
        .bind(&data.note)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE listings SET reports_count = reports_count + 1 WHERE id = $1")
            .bind(data.listing_id)
            .execute(&mut *tx)
            .await?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: data.reporter_id,
                action: AuditAction::ReportCreate,
                target_type: TargetType::Report,
                target_id: Some(report.id.to_string()),
                metadata: Some(serde_json::json!({
                    "listing_id": data.listing_id,
                    "type": data.report_type.as_str(),
                })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            report_id = %report.id,
            listing_id = %data.listing_id,
            report_type = data.report_type.as_str(),
            "Report created"
        );

        Ok(report)
    }

    pub async fn list_by_listing(&self, listing_id: Uuid) -> Result<Vec<ReportWithReporter>> {
        let reports: Vec<ReportWithReporter> = sqlx::query_as(
            r#"
            SELECT r.*, u.name AS reporter_name
            FROM reports r
            LEFT JOIN users u ON r.reporter_id = u.id
            WHERE r.listing_id = $1
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.db.pg)
        .await?;

        Ok(reports)
    }

    /// Admin triage: move a report through its status lifecycle.
    pub async fn update_status(
        &self,
        report_id: Uuid,
        new_status: ReportStatus,
        reviewer_id: Option<Uuid>,
    ) -> Result<Report> {
        let mut tx = self.db.pg.begin().await?;

        let report: Report = sqlx::query_as(
            r#"
            UPDATE reports
            SET status = $2, reviewed_at = NOW(), reviewed_by = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(report_id)
        .bind(new_status)
        .bind(reviewer_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found".to_string()))?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: reviewer_id,
                action: AuditAction::ReportUpdate,
                target_type: TargetType::Report,
                target_id: Some(report_id.to_string()),
                metadata: Some(serde_json::json!({ "new_status": new_status.as_str() })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            report_id = %report_id,
            new_status = new_status.as_str(),
            "Report reviewed"
        );

        Ok(report)
    }
}
