//! Room listing entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "room_listings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub price: f64,
    pub bills_included: bool,
    pub room_type: String, // "private", "shared" or "pg"
    pub available_from: Option<String>,
    pub minimum_stay: Option<String>,
    pub amenities_json: String, // JSON array of amenity labels
    pub photos_json: String,    // JSON array of public photo addresses
    pub ai_score: Option<f64>,
    pub ai_analysis_json: Option<String>,
    pub status: String, // "draft" or "published"
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
