pub mod admin_service;
pub mod audit_service;
pub mod catalog_service;
pub mod listing_service;
pub mod report_service;
pub mod stats_service;
pub mod storage_service;

pub use admin_service::{AdminService, AdminUserSummary, ModerationListing};
pub use audit_service::AuditService;
pub use catalog_service::CatalogService;
pub use listing_service::{
    ListingDetail, ListingFilters, ListingService, ListingSort, ListingSummary, ListingWithImages,
};
pub use report_service::{NewReport, ReportService, ReportWithReporter};
pub use stats_service::{Stats, StatsPeriod, StatsService};
pub use storage_service::{BlobStore, HttpBlobStore};
