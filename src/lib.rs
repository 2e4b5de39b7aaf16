/// XeVip marketplace backend library
///
/// # Modules
///
/// - `api`: HTTP request handlers and routing
/// - `models`: Listings, reports, users, audit entries
/// - `services`: Business logic layer (listing lifecycle, moderation, reports, audit)
/// - `db`: Database connection pool and migrations
/// - `middleware`: Token verification and role checks
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

pub use config::Config;
pub use error::{AppError, Result};

use crate::db::Database;
use crate::services::BlobStore;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Config,
    pub storage: Arc<dyn BlobStore>,
}
