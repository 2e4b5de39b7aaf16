use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::Result;

pub struct StatsService {
    db: Database,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsPeriod {
    Day,
    Month,
    Year,
}

impl StatsPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsPeriod::Day => "day",
            StatsPeriod::Month => "month",
            StatsPeriod::Year => "year",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub period: StatsPeriod,
    pub total_listings: i64,
    pub approved_listings: i64,
    pub total_reports: i64,
    pub date_filter: Option<DateTime<Utc>>,
}

impl StatsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Aggregate listing/report counts, optionally restricted to the
    /// day/month/year containing `date_filter`.
    pub async fn get_stats(
        &self,
        period: StatsPeriod,
        date_filter: Option<DateTime<Utc>>,
    ) -> Result<Stats> {
        let total_listings: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM listings
            WHERE ($1::timestamptz IS NULL OR DATE_TRUNC($2, created_at) = DATE_TRUNC($2, $1))
            "#,
        )
        .bind(date_filter)
        .bind(period.as_str())
        .fetch_one(&self.db.pg)
        .await?;

        let approved_listings: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM listings
            WHERE status = 'approved'
              AND ($1::timestamptz IS NULL OR DATE_TRUNC($2, created_at) = DATE_TRUNC($2, $1))
            "#,
        )
        .bind(date_filter)
        .bind(period.as_str())
        .fetch_one(&self.db.pg)
        .await?;

        let total_reports: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM reports
            WHERE ($1::timestamptz IS NULL OR DATE_TRUNC($2, created_at) = DATE_TRUNC($2, $1))
            "#,
        )
        .bind(date_filter)
        .bind(period.as_str())
        .fetch_one(&self.db.pg)
        .await?;

        Ok(Stats {
            period,
            total_listings,
            approved_listings,
            total_reports,
            date_filter,
        })
    }
}
