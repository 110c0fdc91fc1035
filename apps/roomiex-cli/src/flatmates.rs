use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use roomiex_auth::Viewer;
use roomiex_store::{FlatmateDetails, FlatmateProfile, AGE_RANGES, LIFESTYLE_OPTIONS};
use tracing::info;

use crate::app::App;

/// Fields of the flatmate profile form; anything omitted keeps its saved value
#[derive(Debug, Clone, Default, clap::Args)]
pub struct FlatmateArgs {
    /// Print the saved profile without changing it
    #[arg(long)]
    pub show: bool,

    /// Hide the profile from flatmate search
    #[arg(long, conflicts_with = "looking")]
    pub not_looking: bool,

    /// Show the profile in flatmate search again
    #[arg(long)]
    pub looking: bool,

    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub budget_min: Option<f64>,

    #[arg(long)]
    pub budget_max: Option<f64>,

    /// Move-in date, YYYY-MM-DD
    #[arg(long)]
    pub move_in: Option<NaiveDate>,

    #[arg(long)]
    pub occupation: Option<String>,

    /// 18-24, 25-30, 31-35, 36-40 or 40+
    #[arg(long)]
    pub age_range: Option<String>,

    #[arg(long)]
    pub bio: Option<String>,

    /// Lifestyle choice as category=option, e.g. schedule="Night Owl" (repeatable)
    #[arg(long = "lifestyle")]
    pub lifestyle: Vec<String>,
}

impl FlatmateArgs {
    /// Overlay the given flags on `details`
    pub fn apply(&self, mut details: FlatmateDetails) -> Result<FlatmateDetails> {
        if self.not_looking {
            details.looking_for_room = false;
        }
        if self.looking {
            details.looking_for_room = true;
        }
        if let Some(location) = &self.location {
            details.preferred_location = Some(location.clone());
        }
        if let Some(min) = self.budget_min {
            details.budget_min = Some(min);
        }
        if let Some(max) = self.budget_max {
            details.budget_max = Some(max);
        }
        if let Some(date) = self.move_in {
            details.move_in_date = Some(date);
        }
        if let Some(occupation) = &self.occupation {
            details.occupation = Some(occupation.clone());
        }
        if let Some(age_range) = &self.age_range {
            if !AGE_RANGES.contains(&age_range.as_str()) {
                bail!("Pick an age range: {}", AGE_RANGES.join(", "));
            }
            details.age_range = Some(age_range.clone());
        }
        if let Some(bio) = &self.bio {
            details.bio = Some(bio.clone());
        }
        for entry in &self.lifestyle {
            let Some((category, choice)) = entry.split_once('=') else {
                bail!("Expected category=option, got {:?}", entry);
            };
            let category = category.trim().to_lowercase();
            let Some((_, choices)) = LIFESTYLE_OPTIONS.iter().find(|(c, _)| *c == category) else {
                let categories: Vec<&str> = LIFESTYLE_OPTIONS.iter().map(|(c, _)| *c).collect();
                bail!(
                    "Unknown lifestyle category {:?}; expected one of {}",
                    category,
                    categories.join(", ")
                );
            };
            let Some(choice) = choices
                .iter()
                .find(|o| o.eq_ignore_ascii_case(choice.trim()))
            else {
                bail!("Pick a {} option: {}", category, choices.join(", "));
            };
            details.lifestyle.insert(category, choice.to_string());
        }
        Ok(details)
    }
}

fn print_flatmate(flatmate: &FlatmateProfile) {
    let details = &flatmate.details;
    println!(
        "👤 {}{}  ({})",
        flatmate.full_name,
        details
            .occupation
            .as_deref()
            .map(|o| format!(", {}", o))
            .unwrap_or_default(),
        flatmate.user_id
    );
    if let Some(bio) = &details.bio {
        println!("   {}", bio);
    }
    println!(
        "   📍 {}  💰 {}{}",
        details.preferred_location.as_deref().unwrap_or("Anywhere"),
        details.budget_label(),
        details
            .move_in_date
            .map(|d| format!("  📅 Move in: {}", d))
            .unwrap_or_default()
    );
    if let Some(age_range) = &details.age_range {
        println!("   Age {}", age_range);
    }
    if !details.lifestyle.is_empty() {
        let traits: Vec<&str> = details.lifestyle.values().map(String::as_str).collect();
        println!("   {}", traits.join(" · "));
    }
}

pub async fn run_flatmates(app: &App, location: Option<String>) -> Result<()> {
    let flatmates = app
        .flatmates
        .browse(location.as_deref().unwrap_or_default())
        .await
        .context("Failed to load flatmates")?;
    if flatmates.is_empty() {
        println!("No flatmates match. Create your own with `flatmate-profile`.");
    }
    for flatmate in &flatmates {
        print_flatmate(flatmate);
    }
    if !flatmates.is_empty() {
        println!("\nMessage someone with `chat --flatmate <id>`.");
    }
    Ok(())
}

pub async fn run_flatmate_profile(app: &App, viewer: &Viewer, args: &FlatmateArgs) -> Result<()> {
    let existing = app.flatmates.get(&viewer.id).await?;
    if args.show {
        match &existing {
            Some(profile) => print_flatmate(profile),
            None => println!("No flatmate profile yet."),
        }
        return Ok(());
    }

    let base = existing.map(|p| p.details).unwrap_or_default();
    let profile = app
        .flatmates
        .save(&viewer.id, args.apply(base)?)
        .await
        .context("Failed to save flatmate profile")?;
    info!("Saved flatmate profile for {}", viewer.id);
    println!("✅ Profile saved");
    print_flatmate(&profile);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overlays_given_fields() {
        let saved = FlatmateDetails {
            preferred_location: Some("HSR Layout".to_string()),
            budget_max: Some(15000.0),
            ..FlatmateDetails::default()
        };
        let args = FlatmateArgs {
            not_looking: true,
            budget_min: Some(9000.0),
            lifestyle: vec!["Schedule=night owl".to_string()],
            ..FlatmateArgs::default()
        };

        let details = args.apply(saved).unwrap();
        assert!(!details.looking_for_room);
        assert_eq!(details.preferred_location.as_deref(), Some("HSR Layout"));
        assert_eq!(details.budget_min, Some(9000.0));
        assert_eq!(details.budget_max, Some(15000.0));
        assert_eq!(details.lifestyle["schedule"], "Night Owl");
    }

    #[test]
    fn test_apply_rejects_unknown_choices() {
        let args = FlatmateArgs {
            lifestyle: vec!["pets=cats".to_string()],
            ..FlatmateArgs::default()
        };
        assert!(args.apply(FlatmateDetails::default()).is_err());

        let args = FlatmateArgs {
            age_range: Some("17".to_string()),
            ..FlatmateArgs::default()
        };
        assert!(args.apply(FlatmateDetails::default()).is_err());

        let args = FlatmateArgs {
            lifestyle: vec!["noise".to_string()],
            ..FlatmateArgs::default()
        };
        assert!(args.apply(FlatmateDetails::default()).is_err());
    }
}
