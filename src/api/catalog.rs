use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::Result;
use crate::models::{Brand, CarModel, District, Province};
use crate::services::CatalogService;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/brands", get(list_brands))
        .route("/models", get(list_models))
        .route("/provinces", get(list_provinces))
        .route("/districts", get(list_districts))
}

async fn list_brands(State(state): State<AppState>) -> Result<Json<Vec<Brand>>> {
    Ok(Json(CatalogService::new(state.db.clone()).list_brands().await?))
}

#[derive(Debug, Deserialize)]
struct ModelsQuery {
    brand_id: i32,
}

async fn list_models(
    State(state): State<AppState>,
    Query(query): Query<ModelsQuery>,
) -> Result<Json<Vec<CarModel>>> {
    Ok(Json(
        CatalogService::new(state.db.clone())
            .list_models_by_brand(query.brand_id)
            .await?,
    ))
}

async fn list_provinces(State(state): State<AppState>) -> Result<Json<Vec<Province>>> {
    Ok(Json(
        CatalogService::new(state.db.clone()).list_provinces().await?,
    ))
}

#[derive(Debug, Deserialize)]
struct DistrictsQuery {
    province_id: i32,
}

async fn list_districts(
    State(state): State<AppState>,
    Query(query): Query<DistrictsQuery>,
) -> Result<Json<Vec<District>>> {
    Ok(Json(
        CatalogService::new(state.db.clone())
            .list_districts_by_province(query.province_id)
            .await?,
    ))
}
