//! Viewing and trial-stay bookings

use chrono::{Local, NaiveDate, Utc};
use sea_orm::{
    prelude::Expr, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use tracing::{info, instrument};

use crate::entities::bookings;
use crate::error::{Result, StoreError};
use crate::records::{Booking, BookingRequest, BookingStatus};

/// Slots offered in the booking form
pub const TIME_SLOTS: [&str; 9] = [
    "09:00 AM", "10:00 AM", "11:00 AM", "12:00 PM", "02:00 PM", "03:00 PM", "04:00 PM",
    "05:00 PM", "06:00 PM",
];

/// Check a request against the form rules, relative to `today`
pub fn validate(request: &BookingRequest, today: NaiveDate) -> Result<()> {
    if request.requester_id == request.owner_id {
        return Err(StoreError::Invalid(
            "owners cannot book their own room".to_string(),
        ));
    }
    if request.preferred_date < today {
        return Err(StoreError::Invalid(format!(
            "preferred date {} is in the past",
            request.preferred_date
        )));
    }
    if !TIME_SLOTS.contains(&request.preferred_time.as_str()) {
        return Err(StoreError::Invalid(format!(
            "unknown time slot {}",
            request.preferred_time
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct BookingManager {
    db: DatabaseConnection,
}

impl BookingManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(room = %request.room_id))]
    pub async fn request(&self, request: BookingRequest) -> Result<Booking> {
        validate(&request, Local::now().date_naive())?;

        let now = Utc::now().timestamp_millis();
        let model = bookings::Model {
            id: uuid::Uuid::new_v4().to_string(),
            room_id: request.room_id,
            user_id: request.requester_id,
            owner_id: request.owner_id,
            booking_type: request.booking_type.as_str().to_string(),
            preferred_date: request.preferred_date.format("%Y-%m-%d").to_string(),
            preferred_time: request.preferred_time,
            message: request.message.filter(|m| !m.trim().is_empty()),
            status: BookingStatus::Pending.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };

        let active = bookings::ActiveModel {
            id: Set(model.id.clone()),
            room_id: Set(model.room_id.clone()),
            user_id: Set(model.user_id.clone()),
            owner_id: Set(model.owner_id.clone()),
            booking_type: Set(model.booking_type.clone()),
            preferred_date: Set(model.preferred_date.clone()),
            preferred_time: Set(model.preferred_time.clone()),
            message: Set(model.message.clone()),
            status: Set(model.status.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        bookings::Entity::insert(active)
            .exec_without_returning(&self.db)
            .await?;

        info!("Booking {} requested", model.id);
        let requester = model.user_id.clone();
        Booking::from_model(model, &requester)
    }

    /// Bookings where the viewer is requester or owner, newest first
    pub async fn list_for(&self, viewer_id: &str) -> Result<Vec<Booking>> {
        let rows = bookings::Entity::find()
            .filter(
                Condition::any()
                    .add(bookings::Column::UserId.eq(viewer_id))
                    .add(bookings::Column::OwnerId.eq(viewer_id)),
            )
            .order_by_desc(bookings::Column::CreatedAt)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|row| Booking::from_model(row, viewer_id))
            .collect()
    }

    /// Confirm (owner only) or cancel (either party) a booking
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        viewer_id: &str,
        booking_id: &str,
        status: BookingStatus,
    ) -> Result<Booking> {
        let model = bookings::Entity::find_by_id(booking_id.to_string())
            .one(&self.db)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("booking {}", booking_id)))?;

        let allowed = match status {
            BookingStatus::Confirmed => model.owner_id == viewer_id,
            BookingStatus::Cancelled => model.owner_id == viewer_id || model.user_id == viewer_id,
            BookingStatus::Pending => {
                return Err(StoreError::Invalid(
                    "a booking cannot be reset to pending".to_string(),
                ))
            }
        };
        if !allowed {
            return Err(StoreError::Forbidden(format!(
                "cannot mark booking {} as {}",
                booking_id,
                status.as_str()
            )));
        }

        let now = Utc::now().timestamp_millis();
        bookings::Entity::update_many()
            .col_expr(bookings::Column::Status, Expr::value(status.as_str()))
            .col_expr(bookings::Column::UpdatedAt, Expr::value(now))
            .filter(bookings::Column::Id.eq(booking_id))
            .exec(&self.db)
            .await?;

        info!("Booking {} is now {}", booking_id, status.as_str());
        let mut updated = model;
        updated.status = status.as_str().to_string();
        updated.updated_at = now;
        Booking::from_model(updated, viewer_id)
    }
}
