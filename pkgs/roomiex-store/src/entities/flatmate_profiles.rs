//! Flatmate profile entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "flatmate_profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub looking_for_room: bool,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub preferred_location: Option<String>,
    pub move_in_date: Option<String>, // YYYY-MM-DD
    pub occupation: Option<String>,
    pub age_range: Option<String>,
    pub bio: Option<String>,
    pub lifestyle_json: String, // JSON object, category -> choice
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
