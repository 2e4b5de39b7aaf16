use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{
    AuditAction, Listing, ListingImage, ListingPatch, ListingStatus, NewAuditLog, NewImage,
    NewListing, TargetType,
};
use crate::services::audit_service;
use crate::services::storage_service::BlobStore;

/// Canonical order of patchable listing columns. Clause building and value
/// binding both expand from this list, so the two can never drift apart.
macro_rules! for_each_patch_field {
    ($apply:ident) => {
        $apply!(title);
        $apply!(price_vnd);
        $apply!(brand_id);
        $apply!(model_id);
        $apply!(year);
        $apply!(mileage_km);
        $apply!(gearbox);
        $apply!(fuel);
        $apply!(body_type);
        $apply!(seats);
        $apply!(color_ext);
        $apply!(color_int);
        $apply!(origin);
        $apply!(description);
        $apply!(province_id);
        $apply!(district_id);
        $apply!(address_line);
        $apply!(video_url);
    };
}

pub struct ListingService {
    db: Database,
    storage: Arc<dyn BlobStore>,
}

/// Listing row joined with catalog and seller names.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListingDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub listing: Listing,
    pub brand: String,
    pub model: String,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingWithImages {
    #[serde(flatten)]
    pub detail: ListingDetail,
    pub thumbnail_url: Option<String>,
    pub images: Vec<ListingImage>,
}

/// Summary row for catalog pages.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ListingSummary {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price_vnd: i64,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub mileage_km: Option<i32>,
    pub body_type: Option<String>,
    pub fuel: Option<String>,
    pub gearbox: Option<String>,
    pub status: ListingStatus,
    pub views_count: i32,
    pub reports_count: i32,
    pub created_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub seller_name: Option<String>,
    pub seller_phone: Option<String>,
}

#[derive(Debug, FromRow)]
struct PagedListingRow {
    #[sqlx(flatten)]
    summary: ListingSummary,
    total_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    MostViewed,
}

impl ListingSort {
    fn order_by(&self) -> &'static str {
        match self {
            ListingSort::Newest => "ORDER BY l.created_at DESC",
            ListingSort::PriceAsc => "ORDER BY l.price_vnd ASC, l.created_at DESC",
            ListingSort::PriceDesc => "ORDER BY l.price_vnd DESC, l.created_at DESC",
            ListingSort::MostViewed => "ORDER BY l.views_count DESC, l.created_at DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilters {
    pub status: Option<ListingStatus>,
    pub seller_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub body_type: Option<String>,
    pub q: Option<String>,
    pub sort: ListingSort,
}

const LISTING_SUMMARY_COLUMNS: &str = r#"
    l.id,
    l.seller_id,
    l.title,
    l.price_vnd,
    b.name AS brand,
    m.name AS model,
    l.year,
    l.mileage_km,
    l.body_type,
    l.fuel,
    l.gearbox,
    l.status,
    l.views_count,
    l.reports_count,
    l.created_at,
    (
        SELECT li.public_url
        FROM listing_images li
        WHERE li.listing_id = l.id
        ORDER BY li.position ASC, li.created_at ASC
        LIMIT 1
    ) AS thumbnail_url,
    u.name AS seller_name,
    u.phone AS seller_phone,
    COUNT(*) OVER() AS total_count
"#;

impl ListingService {
    pub fn new(db: Database, storage: Arc<dyn BlobStore>) -> Self {
        Self { db, storage }
    }

    /// Create a listing with its initial image set in one transaction.
    pub async fn create(
        &self,
        seller_id: Uuid,
        data: NewListing,
        images: Vec<NewImage>,
    ) -> Result<Listing> {
        validate_new_listing(&data)?;

        let mut tx = self.db.pg.begin().await?;

        let listing: Listing = sqlx::query_as(
            r#"
            INSERT INTO listings (
                seller_id, title, price_vnd, brand_id, model_id, year, mileage_km, gearbox,
                fuel, body_type, seats, color_ext, color_int, origin, description,
                province_id, district_id, address_line, video_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING *
            "#,
        )
        .bind(seller_id)
        .bind(&data.title)
        .bind(data.price_vnd)
        .bind(data.brand_id)
        .bind(data.model_id)
        .bind(data.year)
        .bind(data.mileage_km)
        .bind(&data.gearbox)
        .bind(&data.fuel)
        .bind(&data.body_type)
        .bind(data.seats)
        .bind(&data.color_ext)
        .bind(&data.color_int)
        .bind(&data.origin)
        .bind(&data.description)
        .bind(data.province_id)
        .bind(data.district_id)
        .bind(&data.address_line)
        .bind(&data.video_url)
        .fetch_one(&mut *tx)
        .await?;

        self.attach_images(&mut tx, listing.id, images).await?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(seller_id),
                action: AuditAction::ListingCreate,
                target_type: TargetType::Listing,
                target_id: Some(listing.id.to_string()),
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(listing_id = %listing.id, seller_id = %seller_id, "Listing created");

        Ok(listing)
    }

    /// Edit a listing and diff its image set, all-or-nothing.
    ///
    /// `owner` restricts the update to that seller's row; admins pass `None`.
    /// `expected_version` turns the update into a compare-and-swap.
    pub async fn edit(
        &self,
        listing_id: Uuid,
        patch: ListingPatch,
        new_images: Vec<NewImage>,
        delete_image_ids: Vec<Uuid>,
        actor_id: Uuid,
        owner: Option<Uuid>,
        expected_version: Option<i32>,
    ) -> Result<Listing> {
        if patch.is_empty() && new_images.is_empty() && delete_image_ids.is_empty() {
            return Err(AppError::Validation("Nothing to update".to_string()));
        }
        validate_patch(&patch)?;

        let mut tx = self.db.pg.begin().await?;

        let set_clauses = patch_set_clauses(&patch);
        let id_p = set_clauses.len() + 1;
        let ver_p = set_clauses.len() + 2;
        let owner_p = set_clauses.len() + 3;
        let sets = set_clauses
            .iter()
            .map(String::as_str)
            .chain([
                "updated_at = NOW()",
                "edits_count = edits_count + 1",
                "version = version + 1",
            ])
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE listings SET {sets} \
             WHERE id = ${id_p} \
               AND (${ver_p}::int IS NULL OR version = ${ver_p}) \
               AND (${owner_p}::uuid IS NULL OR seller_id = ${owner_p}) \
             RETURNING *"
        );

        let mut query = sqlx::query_as::<_, Listing>(&sql);
        macro_rules! bind_field {
            ($f:ident) => {
                if let Some(value) = patch.$f.clone() {
                    query = query.bind(value);
                }
            };
        }
        for_each_patch_field!(bind_field);
        query = query.bind(listing_id).bind(expected_version).bind(owner);

        let listing = match query.fetch_optional(&mut *tx).await? {
            Some(listing) => listing,
            None => {
                return Err(self
                    .classify_missed_update(&mut tx, listing_id, owner)
                    .await?);
            }
        };

        if !delete_image_ids.is_empty() {
            // Ownership is the WHERE clause: ids belonging to other listings
            // simply match nothing.
            sqlx::query("DELETE FROM listing_images WHERE id = ANY($1) AND listing_id = $2")
                .bind(&delete_image_ids)
                .bind(listing_id)
                .execute(&mut *tx)
                .await?;
        }

        let added = self.attach_images(&mut tx, listing_id, new_images).await?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(actor_id),
                action: AuditAction::ListingUpdate,
                target_type: TargetType::Listing,
                target_id: Some(listing_id.to_string()),
                metadata: Some(serde_json::json!({
                    "changes": patch.to_metadata(),
                    "new_images": added.len(),
                    "deleted_images": delete_image_ids.len(),
                })),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(listing)
    }

    /// Move a listing through the moderation state machine.
    pub async fn change_status(
        &self,
        listing_id: Uuid,
        new_status: ListingStatus,
        actor_id: Uuid,
        expected_version: Option<i32>,
    ) -> Result<Listing> {
        let mut tx = self.db.pg.begin().await?;

        let current: Option<(ListingStatus, i32)> =
            sqlx::query_as("SELECT status, version FROM listings WHERE id = $1 FOR UPDATE")
                .bind(listing_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (current_status, version) = match current {
            Some(row) => row,
            None => return Err(AppError::NotFound("Listing not found".to_string())),
        };

        if let Some(expected) = expected_version {
            if expected != version {
                return Err(AppError::Conflict(
                    "Listing was modified concurrently".to_string(),
                ));
            }
        }

        if !current_status.can_transition_to(new_status) {
            return Err(AppError::InvalidTransition {
                from: current_status.as_str().to_string(),
                to: new_status.as_str().to_string(),
            });
        }

        let listing: Listing = sqlx::query_as(
            r#"
            UPDATE listings
            SET status = $2,
                approved_at = CASE WHEN $2 = 'approved'::listing_status THEN NOW() ELSE approved_at END,
                approved_by = CASE WHEN $2 = 'approved'::listing_status THEN $3 ELSE approved_by END,
                updated_at = NOW(),
                version = version + 1
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(listing_id)
        .bind(new_status)
        .bind(actor_id)
        .fetch_one(&mut *tx)
        .await?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(actor_id),
                action: AuditAction::ListingStatusChange,
                target_type: TargetType::Listing,
                target_id: Some(listing_id.to_string()),
                metadata: Some(serde_json::json!({ "new_status": new_status.as_str() })),
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            listing_id = %listing_id,
            from = current_status.as_str(),
            to = new_status.as_str(),
            "Listing status changed"
        );

        Ok(listing)
    }

    /// Hard delete; image rows cascade. Objects in the blob store may leak.
    pub async fn delete(&self, listing_id: Uuid, actor_id: Uuid) -> Result<()> {
        let mut tx = self.db.pg.begin().await?;

        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(listing_id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Listing not found".to_string()));
        }

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(actor_id),
                action: AuditAction::ListingDelete,
                target_type: TargetType::Listing,
                target_id: Some(listing_id.to_string()),
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        tracing::info!(listing_id = %listing_id, actor_id = %actor_id, "Listing deleted");

        Ok(())
    }

    /// Pure read: listing joined with catalog/seller names and its gallery.
    pub async fn get_by_id(&self, listing_id: Uuid) -> Result<ListingWithImages> {
        let detail: ListingDetail = sqlx::query_as(
            r#"
            SELECT l.*, b.name AS brand, m.name AS model, u.name AS seller_name, u.phone AS seller_phone
            FROM listings l
            JOIN brands b ON l.brand_id = b.id
            JOIN models m ON l.model_id = m.id
            LEFT JOIN users u ON u.id = l.seller_id
            WHERE l.id = $1
            "#,
        )
        .bind(listing_id)
        .fetch_optional(&self.db.pg)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

        let images: Vec<ListingImage> = sqlx::query_as(
            r#"
            SELECT * FROM listing_images
            WHERE listing_id = $1
            ORDER BY position ASC, created_at ASC
            "#,
        )
        .bind(listing_id)
        .fetch_all(&self.db.pg)
        .await?;

        Ok(ListingWithImages {
            thumbnail_url: images.first().map(|i| i.public_url.clone()),
            detail,
            images,
        })
    }

    /// Best-effort view tracking, detached from the read path.
    pub fn spawn_view_tracking(&self, listing_id: Uuid, viewer_id: Option<Uuid>) {
        let pool = self.db.pg.clone();
        tokio::spawn(async move {
            if let Err(err) = track_view(&pool, listing_id, viewer_id).await {
                tracing::debug!(%listing_id, "view tracking failed: {}", err);
            }
        });
    }

    /// Filtered, paginated catalog page. Returns `(items, total)`.
    pub async fn list(
        &self,
        filters: &ListingFilters,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<ListingSummary>, i64)> {
        let offset = ((page.max(1) - 1) * per_page) as i64;
        let keyword = filters
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q));

        let sql = format!(
            r#"
            SELECT {LISTING_SUMMARY_COLUMNS}
            FROM listings l
            JOIN brands b ON l.brand_id = b.id
            JOIN models m ON l.model_id = m.id
            JOIN users u ON u.id = l.seller_id
            WHERE ($1::listing_status IS NULL OR l.status = $1)
              AND ($2::uuid IS NULL OR l.seller_id = $2)
              AND ($3::bigint IS NULL OR l.price_vnd >= $3)
              AND ($4::bigint IS NULL OR l.price_vnd <= $4)
              AND ($5::text IS NULL OR l.body_type ILIKE $5)
              AND ($6::text IS NULL OR l.title ILIKE $6 OR l.description ILIKE $6
                   OR b.name ILIKE $6 OR m.name ILIKE $6)
            {order_by}
            LIMIT $7 OFFSET $8
            "#,
            order_by = filters.sort.order_by(),
        );

        let rows: Vec<PagedListingRow> = sqlx::query_as(&sql)
            .bind(filters.status)
            .bind(filters.seller_id)
            .bind(filters.min_price)
            .bind(filters.max_price)
            .bind(&filters.body_type)
            .bind(keyword)
            .bind(per_page as i64)
            .bind(offset)
            .fetch_all(&self.db.pg)
            .await?;

        Ok(split_paged(rows))
    }

    pub async fn add_favorite(&self, user_id: Uuid, listing_id: Uuid) -> Result<()> {
        let mut tx = self.db.pg.begin().await?;

        sqlx::query("INSERT INTO favorites (user_id, listing_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(listing_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    AppError::Conflict("Listing is already in favorites".to_string())
                }
                sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                    AppError::NotFound("Listing not found".to_string())
                }
                _ => AppError::from(e),
            })?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(user_id),
                action: AuditAction::FavoriteAdd,
                target_type: TargetType::Listing,
                target_id: Some(listing_id.to_string()),
                metadata: None,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }

    pub async fn list_favorites(
        &self,
        user_id: Uuid,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<ListingSummary>, i64)> {
        let offset = ((page.max(1) - 1) * per_page) as i64;

        let sql = format!(
            r#"
            SELECT {LISTING_SUMMARY_COLUMNS}
            FROM favorites f
            JOIN listings l ON l.id = f.listing_id
            JOIN brands b ON l.brand_id = b.id
            JOIN models m ON l.model_id = m.id
            JOIN users u ON u.id = l.seller_id
            WHERE f.user_id = $1
            ORDER BY f.created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        let rows: Vec<PagedListingRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(per_page as i64)
            .bind(offset)
            .fetch_all(&self.db.pg)
            .await?;

        Ok(split_paged(rows))
    }

    pub async fn add_comparison(
        &self,
        user_id: Uuid,
        left_listing_id: Uuid,
        right_listing_id: Uuid,
    ) -> Result<Uuid> {
        if left_listing_id == right_listing_id {
            return Err(AppError::Validation(
                "Cannot compare a listing with itself".to_string(),
            ));
        }

        let mut tx = self.db.pg.begin().await?;

        let comparison_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO comparisons (user_id, left_listing_id, right_listing_id)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(left_listing_id)
        .bind(right_listing_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                AppError::NotFound("Listing not found".to_string())
            }
            _ => AppError::from(e),
        })?;

        audit_service::record(
            &mut *tx,
            NewAuditLog {
                actor_id: Some(user_id),
                action: AuditAction::ComparisonAdd,
                target_type: TargetType::Comparison,
                target_id: Some(comparison_id.to_string()),
                metadata: Some(serde_json::json!({
                    "left": left_listing_id,
                    "right": right_listing_id,
                })),
            },
        )
        .await?;

        tx.commit().await?;

        Ok(comparison_id)
    }

    /// Upload and insert new images after the current highest position.
    async fn attach_images(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        listing_id: Uuid,
        images: Vec<NewImage>,
    ) -> Result<Vec<ListingImage>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        let max_position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position), 0) FROM listing_images WHERE listing_id = $1",
        )
        .bind(listing_id)
        .fetch_one(&mut **tx)
        .await?;

        let mut inserted = Vec::with_capacity(images.len());
        for (i, image) in images.into_iter().enumerate() {
            let ext = Path::new(&image.file_name)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("jpg");
            let key = format!("listings/{}/{}.{}", listing_id, Uuid::new_v4(), ext);

            let public_url = self
                .storage
                .put(&key, image.bytes, &image.content_type)
                .await?;

            let row: ListingImage = sqlx::query_as(
                r#"
                INSERT INTO listing_images (listing_id, file_key, public_url, position)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(listing_id)
            .bind(&key)
            .bind(&public_url)
            .bind(max_position + 1 + i as i32)
            .fetch_one(&mut **tx)
            .await?;

            inserted.push(row);
        }

        Ok(inserted)
    }

    /// A zero-row CAS update means one of three things; tell them apart.
    async fn classify_missed_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        listing_id: Uuid,
        owner: Option<Uuid>,
    ) -> Result<AppError> {
        let row: Option<(Uuid, i32)> =
            sqlx::query_as("SELECT seller_id, version FROM listings WHERE id = $1")
                .bind(listing_id)
                .fetch_optional(&mut **tx)
                .await?;

        Ok(match row {
            None => AppError::NotFound("Listing not found".to_string()),
            Some((seller_id, _)) if owner.is_some_and(|o| o != seller_id) => AppError::Forbidden,
            Some(_) => AppError::Conflict("Listing was modified concurrently".to_string()),
        })
    }
}

async fn track_view(pool: &PgPool, listing_id: Uuid, viewer_id: Option<Uuid>) -> Result<()> {
    let updated = sqlx::query("UPDATE listings SET views_count = views_count + 1 WHERE id = $1")
        .bind(listing_id)
        .execute(pool)
        .await?;

    if updated.rows_affected() == 0 {
        return Ok(());
    }

    audit_service::record(
        pool,
        NewAuditLog {
            actor_id: viewer_id,
            action: AuditAction::ListingView,
            target_type: TargetType::Listing,
            target_id: Some(listing_id.to_string()),
            metadata: None,
        },
    )
    .await?;

    Ok(())
}

fn split_paged(rows: Vec<PagedListingRow>) -> (Vec<ListingSummary>, i64) {
    let total = rows.first().map(|r| r.total_count).unwrap_or(0);
    (rows.into_iter().map(|r| r.summary).collect(), total)
}

/// Numbered SET fragments for the supplied patch fields, starting at `$1`.
fn patch_set_clauses(patch: &ListingPatch) -> Vec<String> {
    let mut clauses = Vec::new();
    macro_rules! add_clause {
        ($f:ident) => {
            if patch.$f.is_some() {
                clauses.push(format!("{} = ${}", stringify!($f), clauses.len() + 1));
            }
        };
    }
    for_each_patch_field!(add_clause);
    clauses
}

fn validate_new_listing(data: &NewListing) -> Result<()> {
    if data.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if data.price_vnd <= 0 {
        return Err(AppError::Validation(
            "Price must be greater than 0".to_string(),
        ));
    }
    if data.year < 1900 {
        return Err(AppError::Validation("Year must be >= 1900".to_string()));
    }
    if data.mileage_km.is_some_and(|m| m < 0) {
        return Err(AppError::Validation("Mileage must be >= 0".to_string()));
    }
    validate_colors(data.color_ext.as_deref(), data.color_int.as_deref())
}

fn validate_patch(patch: &ListingPatch) -> Result<()> {
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if patch.price_vnd.is_some_and(|p| p <= 0) {
        return Err(AppError::Validation(
            "Price must be greater than 0".to_string(),
        ));
    }
    if patch.year.is_some_and(|y| y < 1900) {
        return Err(AppError::Validation("Year must be >= 1900".to_string()));
    }
    if patch.mileage_km.is_some_and(|m| m < 0) {
        return Err(AppError::Validation("Mileage must be >= 0".to_string()));
    }
    validate_colors(patch.color_ext.as_deref(), patch.color_int.as_deref())
}

fn validate_colors(color_ext: Option<&str>, color_int: Option<&str>) -> Result<()> {
    if color_ext.is_some_and(|c| !is_hex_color(c)) {
        return Err(AppError::Validation(
            "Exterior color must be hex #RRGGBB".to_string(),
        ));
    }
    if color_int.is_some_and(|c| !is_hex_color(c)) {
        return Err(AppError::Validation(
            "Interior color must be hex #RRGGBB".to_string(),
        ));
    }
    Ok(())
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_listing() -> NewListing {
        NewListing {
            title: "Toyota Camry".to_string(),
            price_vnd: 500_000_000,
            brand_id: 1,
            model_id: 1,
            year: 2020,
            mileage_km: Some(40_000),
            gearbox: None,
            fuel: None,
            body_type: None,
            seats: None,
            color_ext: None,
            color_int: None,
            origin: None,
            description: None,
            province_id: None,
            district_id: None,
            address_line: None,
            video_url: None,
        }
    }

    #[test]
    fn new_listing_passes_validation() {
        assert!(validate_new_listing(&valid_listing()).is_ok());
    }

    #[test]
    fn blank_title_is_rejected() {
        let mut data = valid_listing();
        data.title = "   ".to_string();
        assert!(matches!(
            validate_new_listing(&data),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut data = valid_listing();
        data.price_vnd = 0;
        assert!(matches!(
            validate_new_listing(&data),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn pre_1900_year_is_rejected() {
        let mut data = valid_listing();
        data.year = 1899;
        assert!(matches!(
            validate_new_listing(&data),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn malformed_color_is_rejected() {
        let mut data = valid_listing();
        data.color_ext = Some("red".to_string());
        assert!(matches!(
            validate_new_listing(&data),
            Err(AppError::Validation(_))
        ));
        data.color_ext = Some("#A1B2C3".to_string());
        assert!(validate_new_listing(&data).is_ok());
    }

    #[test]
    fn patch_clauses_cover_only_supplied_fields() {
        let patch = ListingPatch {
            price_vnd: Some(480_000_000),
            description: Some("Well maintained".to_string()),
            ..Default::default()
        };
        let clauses = patch_set_clauses(&patch);
        assert_eq!(clauses, vec!["price_vnd = $1", "description = $2"]);
    }

    #[test]
    fn empty_patch_produces_no_clauses() {
        assert!(patch_set_clauses(&ListingPatch::default()).is_empty());
    }

    #[test]
    fn hex_color_check_requires_full_form() {
        assert!(is_hex_color("#00FFaa"));
        assert!(!is_hex_color("00FFaa"));
        assert!(!is_hex_color("#00FFa"));
        assert!(!is_hex_color("#00FFaaZ"));
        assert!(!is_hex_color("#00FFZZ"));
    }
}
