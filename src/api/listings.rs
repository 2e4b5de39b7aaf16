use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::api::Paginated;
use crate::error::{AppError, Result};
use crate::middleware::CurrentUser;
use crate::models::{ListingPatch, ListingStatus, NewImage, NewListing};
use crate::services::{ListingFilters, ListingService, ListingSort, ListingSummary, ListingWithImages};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListListingsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ListingStatus>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub body_type: Option<String>,
    pub q: Option<String>,
    pub sort: Option<ListingSort>,
}

pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListListingsQuery>,
) -> Result<Json<Paginated<ListingSummary>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(12).clamp(1, 60);

    let filters = ListingFilters {
        // The public catalog only ever shows approved listings by default.
        status: Some(query.status.unwrap_or(ListingStatus::Approved)),
        seller_id: None,
        min_price: query.min_price,
        max_price: query.max_price,
        body_type: query.body_type,
        q: query.q,
        sort: query.sort.unwrap_or_default(),
    };

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let (items, total) = service.list(&filters, page, limit).await?;

    Ok(Json(Paginated::new(items, total, page, limit)))
}

pub async fn get_listing(
    State(state): State<AppState>,
    current_user: Option<Extension<CurrentUser>>,
    Path(id): Path<String>,
) -> Result<Json<ListingWithImages>> {
    let listing_id = parse_listing_id(&id)?;

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let listing = service.get_by_id(listing_id).await?;

    service.spawn_view_tracking(listing_id, current_user.map(|Extension(u)| u.id));

    Ok(Json(listing))
}

pub async fn create_listing(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<crate::models::Listing>)> {
    let form = collect_form(multipart).await?;
    let data = new_listing_from_form(&form.fields)?;

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let listing = service.create(current_user.id, data, form.images).await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

pub async fn edit_listing(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<crate::models::Listing>> {
    let listing_id = parse_listing_id(&id)?;
    let form = collect_form(multipart).await?;
    let patch = patch_from_form(&form.fields)?;
    let expected_version = parse_optional::<i32>(&form.fields, "expected_version")?;

    let owner = if current_user.is_admin {
        None
    } else {
        Some(current_user.id)
    };

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let listing = service
        .edit(
            listing_id,
            patch,
            form.images,
            form.delete_image_ids,
            current_user.id,
            owner,
            expected_version,
        )
        .await?;

    Ok(Json(listing))
}

#[derive(Debug, Deserialize)]
pub struct MyListingsQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<ListingStatus>,
}

pub async fn my_listings(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<MyListingsQuery>,
) -> Result<Json<Paginated<ListingSummary>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(9).clamp(1, 60);

    let filters = ListingFilters {
        status: query.status,
        seller_id: Some(current_user.id),
        ..Default::default()
    };

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let (items, total) = service.list(&filters, page, limit).await?;

    Ok(Json(Paginated::new(items, total, page, limit)))
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn my_favorites(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Paginated<ListingSummary>>> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 60);

    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let (items, total) = service.list_favorites(current_user.id, page, limit).await?;

    Ok(Json(Paginated::new(items, total, page, limit)))
}

#[derive(Debug, Deserialize)]
pub struct AddFavoriteRequest {
    pub listing_id: Uuid,
}

pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<AddFavoriteRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let service = ListingService::new(state.db.clone(), state.storage.clone());
    service
        .add_favorite(current_user.id, payload.listing_id)
        .await?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true }))))
}

#[derive(Debug, Deserialize)]
pub struct AddComparisonRequest {
    pub left_listing_id: Uuid,
    pub right_listing_id: Uuid,
}

pub async fn add_comparison(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(payload): Json<AddComparisonRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    let service = ListingService::new(state.db.clone(), state.storage.clone());
    let comparison_id = service
        .add_comparison(
            current_user.id,
            payload.left_listing_id,
            payload.right_listing_id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "id": comparison_id })),
    ))
}

pub(crate) fn parse_listing_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::Validation("Invalid listing ID".to_string()))
}

/// Collected multipart form: text fields plus image payloads.
struct ListingForm {
    fields: HashMap<String, String>,
    images: Vec<NewImage>,
    delete_image_ids: Vec<Uuid>,
}

async fn collect_form(mut multipart: Multipart) -> Result<ListingForm> {
    let mut form = ListingForm {
        fields: HashMap::new(),
        images: Vec::new(),
        delete_image_ids: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "images" => {
                let file_name = field.file_name().unwrap_or("upload.jpg").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(bad_multipart)?;
                form.images.push(NewImage {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "delete_image_ids" => {
                let text = field.text().await.map_err(bad_multipart)?;
                for part in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                    let image_id = Uuid::parse_str(part).map_err(|_| {
                        AppError::Validation("delete_image_ids must contain UUIDs".to_string())
                    })?;
                    form.delete_image_ids.push(image_id);
                }
            }
            _ => {
                form.fields
                    .insert(name, field.text().await.map_err(bad_multipart)?);
            }
        }
    }

    Ok(form)
}

fn bad_multipart(err: axum::extract::multipart::MultipartError) -> AppError {
    AppError::Validation(format!("Malformed multipart request: {err}"))
}

fn new_listing_from_form(fields: &HashMap<String, String>) -> Result<NewListing> {
    Ok(NewListing {
        title: required(fields, "title")?.to_string(),
        price_vnd: parse_required(fields, "price_vnd")?,
        brand_id: parse_required(fields, "brand_id")?,
        model_id: parse_required(fields, "model_id")?,
        year: parse_required(fields, "year")?,
        mileage_km: parse_optional(fields, "mileage_km")?,
        gearbox: optional(fields, "gearbox"),
        fuel: optional(fields, "fuel"),
        body_type: optional(fields, "body_type"),
        seats: parse_optional(fields, "seats")?,
        color_ext: optional(fields, "color_ext"),
        color_int: optional(fields, "color_int"),
        origin: optional(fields, "origin"),
        description: optional(fields, "description"),
        province_id: parse_optional(fields, "province_id")?,
        district_id: parse_optional(fields, "district_id")?,
        address_line: optional(fields, "address_line"),
        video_url: optional(fields, "video_url"),
    })
}

fn patch_from_form(fields: &HashMap<String, String>) -> Result<ListingPatch> {
    Ok(ListingPatch {
        title: optional(fields, "title"),
        price_vnd: parse_optional(fields, "price_vnd")?,
        brand_id: parse_optional(fields, "brand_id")?,
        model_id: parse_optional(fields, "model_id")?,
        year: parse_optional(fields, "year")?,
        mileage_km: parse_optional(fields, "mileage_km")?,
        gearbox: optional(fields, "gearbox"),
        fuel: optional(fields, "fuel"),
        body_type: optional(fields, "body_type"),
        seats: parse_optional(fields, "seats")?,
        color_ext: optional(fields, "color_ext"),
        color_int: optional(fields, "color_int"),
        origin: optional(fields, "origin"),
        description: optional(fields, "description"),
        province_id: parse_optional(fields, "province_id")?,
        district_id: parse_optional(fields, "district_id")?,
        address_line: optional(fields, "address_line"),
        video_url: optional(fields, "video_url"),
    })
}

fn required<'a>(fields: &'a HashMap<String, String>, name: &str) -> Result<&'a str> {
    fields
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn optional(fields: &HashMap<String, String>, name: &str) -> Option<String> {
    fields
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn parse_required<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<T> {
    required(fields, name)?
        .trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{name} must be a number")))
}

fn parse_optional<T: FromStr>(fields: &HashMap<String, String>, name: &str) -> Result<Option<T>> {
    match optional(fields, name) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{name} must be a number"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn new_listing_requires_title_and_numbers() {
        let form = fields(&[
            ("title", "Toyota Camry"),
            ("price_vnd", "500000000"),
            ("brand_id", "1"),
            ("model_id", "2"),
            ("year", "2020"),
        ]);
        let data = new_listing_from_form(&form).unwrap();
        assert_eq!(data.title, "Toyota Camry");
        assert_eq!(data.price_vnd, 500_000_000);
        assert_eq!(data.year, 2020);
    }

    #[test]
    fn missing_required_field_is_a_validation_error() {
        let form = fields(&[("price_vnd", "500000000")]);
        assert!(matches!(
            new_listing_from_form(&form),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn non_numeric_price_is_a_validation_error() {
        let form = fields(&[
            ("title", "Toyota Camry"),
            ("price_vnd", "five hundred"),
            ("brand_id", "1"),
            ("model_id", "2"),
            ("year", "2020"),
        ]);
        assert!(matches!(
            new_listing_from_form(&form),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn patch_only_picks_supplied_fields() {
        let form = fields(&[("price_vnd", "480000000"), ("description", " clean ")]);
        let patch = patch_from_form(&form).unwrap();
        assert_eq!(patch.price_vnd, Some(480_000_000));
        assert_eq!(patch.description.as_deref(), Some("clean"));
        assert!(patch.title.is_none());
    }

    #[test]
    fn empty_strings_are_treated_as_absent() {
        let form = fields(&[("gearbox", "  ")]);
        let patch = patch_from_form(&form).unwrap();
        assert!(patch.gearbox.is_none());
        assert!(patch.is_empty());
    }
}
