mod admin;
mod catalog;
mod listings;
mod reports;

use axum::{middleware, Router};
use serde::Serialize;

use crate::middleware as mw;
use crate::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/listings", axum::routing::get(listings::list_listings))
        .route("/listings/:id", axum::routing::get(listings::get_listing))
        .route("/reports", axum::routing::post(reports::create_report))
        .nest("/catalog", catalog::routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw::optional_auth,
        ));

    let authenticated = Router::new()
        .route("/listings", axum::routing::post(listings::create_listing))
        .route("/listings/:id", axum::routing::patch(listings::edit_listing))
        .route("/me/listings", axum::routing::get(listings::my_listings))
        .route("/me/favorites", axum::routing::get(listings::my_favorites))
        .route("/favorites", axum::routing::post(listings::add_favorite))
        .route("/comparisons", axum::routing::post(listings::add_comparison))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw::require_auth,
        ));

    let admin = admin::routes()
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw::require_admin,
        ))
        .route_layer(middleware::from_fn_with_state(state, mw::require_auth));

    Router::new()
        .merge(public)
        .merge(authenticated)
        .nest("/admin", admin)
}

/// Paginated list envelope shared by every list endpoint.
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            1
        } else {
            ((total + limit as i64 - 1) / limit as i64).max(1)
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}
