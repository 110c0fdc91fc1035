//! Booking entity

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub room_id: String,
    pub user_id: String,  // requester
    pub owner_id: String, // room owner
    pub booking_type: String, // "viewing" or "trial_stay"
    pub preferred_date: String, // YYYY-MM-DD
    pub preferred_time: String,
    pub message: Option<String>,
    pub status: String, // "pending", "confirmed" or "cancelled"
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
