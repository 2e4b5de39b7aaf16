use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Brand {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CarModel {
    pub id: i32,
    pub brand_id: i32,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Province {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct District {
    pub id: i32,
    pub province_id: i32,
    pub name: String,
}
