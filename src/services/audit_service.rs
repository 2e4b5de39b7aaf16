use sqlx::PgExecutor;
use uuid::Uuid;

use crate::db::Database;
use crate::error::Result;
use crate::models::{AuditLog, NewAuditLog, TargetType};

/// Append one audit entry using the caller's executor. Mutating services
/// pass their open transaction so the entry commits or rolls back together
/// with the business write.
pub async fn record<'e, E>(executor: E, entry: NewAuditLog) -> Result<AuditLog>
where
    E: PgExecutor<'e>,
{
    let log: AuditLog = sqlx::query_as(
        r#"
        INSERT INTO audit_logs (id, actor_id, action, target_type, target_id, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.actor_id)
    .bind(entry.action.as_str())
    .bind(entry.target_type.as_str())
    .bind(entry.target_id)
    .bind(entry.metadata.unwrap_or_else(|| serde_json::json!({})))
    .fetch_one(executor)
    .await?;

    Ok(log)
}

pub struct AuditService {
    db: Database,
}

impl AuditService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_recent(&self, limit: i64) -> Result<Vec<AuditLog>> {
        let logs: Vec<AuditLog> =
            sqlx::query_as("SELECT * FROM audit_logs ORDER BY created_at DESC LIMIT $1")
                .bind(limit)
                .fetch_all(&self.db.pg)
                .await?;

        Ok(logs)
    }

    pub async fn list_by_target(
        &self,
        target_type: TargetType,
        target_id: &str,
        limit: i64,
    ) -> Result<Vec<AuditLog>> {
        let logs: Vec<AuditLog> = sqlx::query_as(
            r#"
            SELECT * FROM audit_logs
            WHERE target_type = $1 AND target_id = $2
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(target_type.as_str())
        .bind(target_id)
        .bind(limit)
        .fetch_all(&self.db.pg)
        .await?;

        Ok(logs)
    }
}
