//! Flatmate profiles: people looking for a room and what they are like

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use tracing::{debug, info, warn};

use crate::backend::Directory;
use crate::directory::DbDirectory;
use crate::entities::flatmate_profiles;
use crate::error::{Result, StoreError};
use crate::records::{FlatmateDetails, FlatmateProfile};

/// Shown when the profile owner has no display name
pub const UNNAMED_FLATMATE: &str = "Flatmate";

pub const AGE_RANGES: [&str; 5] = ["18-24", "25-30", "31-35", "36-40", "40+"];

/// Lifestyle categories and the choices offered for each
pub const LIFESTYLE_OPTIONS: [(&str, [&str; 3]); 4] = [
    ("schedule", ["Early Bird", "Night Owl", "Flexible"]),
    ("cleanliness", ["Very Clean", "Moderately Tidy", "Relaxed"]),
    ("social", ["Social Butterfly", "Occasionally Social", "Private"]),
    ("noise", ["Quiet Environment", "Moderate Noise", "Lively"]),
];

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trim free text and check the fixed-choice fields
pub fn normalize(mut details: FlatmateDetails) -> Result<FlatmateDetails> {
    details.preferred_location = non_blank(details.preferred_location);
    details.occupation = non_blank(details.occupation);
    details.bio = non_blank(details.bio);
    details.age_range = non_blank(details.age_range);

    for budget in [details.budget_min, details.budget_max].into_iter().flatten() {
        if !budget.is_finite() || budget < 0.0 {
            return Err(StoreError::Invalid(format!("budget {}", budget)));
        }
    }
    if let (Some(min), Some(max)) = (details.budget_min, details.budget_max) {
        if min > max {
            return Err(StoreError::Invalid(format!(
                "minimum budget {} is above maximum {}",
                min, max
            )));
        }
    }

    if let Some(age_range) = &details.age_range {
        if !AGE_RANGES.contains(&age_range.as_str()) {
            return Err(StoreError::Invalid(format!("age range {}", age_range)));
        }
    }

    for (category, choice) in &details.lifestyle {
        let Some((_, choices)) = LIFESTYLE_OPTIONS.iter().find(|(c, _)| c == category) else {
            return Err(StoreError::Invalid(format!("lifestyle category {}", category)));
        };
        if !choices.contains(&choice.as_str()) {
            return Err(StoreError::Invalid(format!(
                "{} is not a {} choice",
                choice, category
            )));
        }
    }

    Ok(details)
}

#[derive(Clone)]
pub struct FlatmateManager {
    db: DatabaseConnection,
    directory: DbDirectory,
}

impl FlatmateManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            directory: DbDirectory::new(db.clone()),
            db,
        }
    }

    async fn name_of(&self, user_id: &str) -> String {
        match self.directory.display_name(user_id).await {
            Ok(Some(name)) => name,
            Ok(None) => UNNAMED_FLATMATE.to_string(),
            Err(e) => {
                warn!("Name lookup failed for {}: {}", user_id, e);
                UNNAMED_FLATMATE.to_string()
            }
        }
    }

    /// Create or replace the viewer's own flatmate profile
    pub async fn save(&self, user_id: &str, details: FlatmateDetails) -> Result<FlatmateProfile> {
        let details = normalize(details)?;
        let existing = flatmate_profiles::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?;

        let now = Utc::now().timestamp_millis();
        let active = flatmate_profiles::ActiveModel {
            user_id: Set(user_id.to_string()),
            looking_for_room: Set(details.looking_for_room),
            budget_min: Set(details.budget_min),
            budget_max: Set(details.budget_max),
            preferred_location: Set(details.preferred_location.clone()),
            move_in_date: Set(details
                .move_in_date
                .map(|d| d.format("%Y-%m-%d").to_string())),
            occupation: Set(details.occupation.clone()),
            age_range: Set(details.age_range.clone()),
            bio: Set(details.bio.clone()),
            lifestyle_json: Set(serde_json::to_string(&details.lifestyle)?),
            created_at: Set(existing.as_ref().map_or(now, |m| m.created_at)),
            updated_at: Set(now),
        };

        let model = if existing.is_some() {
            let model = active.update(&self.db).await?;
            info!("Updated flatmate profile for {}", user_id);
            model
        } else {
            let model = active.insert(&self.db).await?;
            info!("Created flatmate profile for {}", user_id);
            model
        };

        let name = self.name_of(user_id).await;
        FlatmateProfile::from_model(model, name)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<FlatmateProfile>> {
        let Some(model) = flatmate_profiles::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        let name = self.name_of(user_id).await;
        FlatmateProfile::from_model(model, name).map(Some)
    }

    /// People currently looking for a room, newest profile first. A non-blank
    /// `location` keeps profiles whose preferred location contains it,
    /// ignoring case.
    pub async fn browse(&self, location: &str) -> Result<Vec<FlatmateProfile>> {
        let rows = flatmate_profiles::Entity::find()
            .filter(flatmate_profiles::Column::LookingForRoom.eq(true))
            .order_by_desc(flatmate_profiles::Column::CreatedAt)
            .order_by_asc(flatmate_profiles::Column::UserId)
            .all(&self.db)
            .await?;

        let needle = location.trim().to_lowercase();
        let mut out = Vec::new();
        for row in rows {
            if !needle.is_empty() {
                let matches = row
                    .preferred_location
                    .as_deref()
                    .is_some_and(|l| l.to_lowercase().contains(&needle));
                if !matches {
                    continue;
                }
            }
            let name = self.name_of(&row.user_id).await;
            out.push(FlatmateProfile::from_model(row, name)?);
        }

        debug!("Found {} flatmate(s) for {:?}", out.len(), location);
        Ok(out)
    }
}
