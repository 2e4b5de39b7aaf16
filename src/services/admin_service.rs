use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{AuditAction, ListingStatus, NewAuditLog, TargetType, User, UserStatus};
use crate::services::audit_service;

pub struct AdminService {
    db: Database,
}

/// Listing row for the moderation queue, with its live report count.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModerationListing {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_vnd: i64,
    pub status: ListingStatus,
    pub views_count: i32,
    pub edits_count: i32,
    pub version: i32,
    pub seller_name: Option<String>,
    pub reports_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct PagedModerationRow {
    #[sqlx(flatten)]
    listing: ModerationListing,
    total_count: i64,
}

/// User row for the admin user view.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AdminUserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: UserStatus,
    pub total_listings: i64,
}

#[derive(Debug, FromRow)]
struct PagedUserRow {
    #[sqlx(flatten)]
    user: AdminUserSummary,
    total_count: i64,
}

impl AdminService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Moderation queue: listings joined with seller name and report count.
    /// `status = None` means all statuses.
    pub async fn list_listings(
        &self,
        status: Option<ListingStatus>,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<ModerationListing>, i64)> {
        let offset = ((page.max(1) - 1) * per_page) as i64;

        let rows: Vec<PagedModerationRow> = sqlx::query_as(
            r#"
            SELECT
                l.id,
                l.seller_id,
                l.title,
                l.price_vnd,
                l.status,
                l.views_count,
                l.edits_count,
                l.version,
                u.name AS seller_name,
                COALESCE(r.cnt, 0) AS reports_count,
                l.created_at,
                COUNT(*) OVER() AS total_count
            FROM listings l
            JOIN users u ON l.seller_id = u.id
            LEFT JOIN (
                SELECT listing_id, COUNT(*) AS cnt FROM reports GROUP BY listing_id
            ) r ON l.id = r.listing_id
            WHERE ($1::listing_status IS NULL OR l.status = $1)
            ORDER BY l.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.db.pg)
        .await?;

        let total = rows.first().map(|r| r.total_count).unwrap_or(0);
        Ok((rows.into_iter().map(|r| r.listing).collect(), total))
    }

    /// Admin user view with per-user listing totals.
    pub async fn list_users(
        &self,
        status: Option<UserStatus>,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<AdminUserSummary>, i64)> {
        let offset = ((page.max(1) - 1) * per_page) as i64;

        let rows: Vec<PagedUserRow> = sqlx::query_as(
            r#"
            SELECT
                u.id,
                u.name,
                u.phone,
                u.address,
                u.status,
                COALESCE(COUNT(l.id), 0) AS total_listings,
                COUNT(*) OVER() AS total_count
            FROM users u
            LEFT JOIN listings l ON l.seller_id = u.id
            WHERE u.is_admin = FALSE
              AND ($1::user_status IS NULL OR u.status = $1)
            GROUP BY u.id, u.name, u.phone, u.address, u.status, u.created_at
            ORDER BY total_listings DESC, u.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.db.pg)
        .await?;

        let total = rows.first().map(|r| r.total_count).unwrap_or(0);
        Ok((rows.into_iter().map(|r| r.user).collect(), total))
    }

    /// Lock or reactivate an account. Same shape as the listing status
    /// command: update + audit entry, one transaction.
    pub async fn update_user_status(
        &self,
        user_id: Uuid,
        new_status: UserStatus,
        admin_id: Uuid,
    ) -> Result<User> {
        let mut tx = self.db.pg.begin().await?;

        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(new_status)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(admin_id),
                action: AuditAction::UserStatusChange,
                target_type: TargetType::User,
                target_id: Some(user_id.to_string()),
                metadata: Some(serde_json::json!({ "new_status": new_status.as_str() })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id = %user_id,
            new_status = new_status.as_str(),
            admin_id = %admin_id,
            "User status changed"
        );

        Ok(user)
    }
}
