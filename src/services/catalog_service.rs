use crate::db::Database;
use crate::error::Result;
use crate::models::{Brand, CarModel, District, Province};

pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list_brands(&self) -> Result<Vec<Brand>> {
        Ok(
            sqlx::query_as("SELECT id, name FROM brands ORDER BY name")
                .fetch_all(&self.db.pg)
                .await?,
        )
    }

    pub async fn list_models_by_brand(&self, brand_id: i32) -> Result<Vec<CarModel>> {
        Ok(
            sqlx::query_as("SELECT id, brand_id, name FROM models WHERE brand_id = $1 ORDER BY name")
                .bind(brand_id)
                .fetch_all(&self.db.pg)
                .await?,
        )
    }

    pub async fn list_provinces(&self) -> Result<Vec<Province>> {
        Ok(
            sqlx::query_as("SELECT id, name FROM provinces ORDER BY name")
                .fetch_all(&self.db.pg)
                .await?,
        )
    }

    pub async fn list_districts_by_province(&self, province_id: i32) -> Result<Vec<District>> {
        Ok(sqlx::query_as(
            "SELECT id, province_id, name FROM districts WHERE province_id = $1 ORDER BY name",
        )
        .bind(province_id)
        .fetch_all(&self.db.pg)
        .await?)
    }
}
