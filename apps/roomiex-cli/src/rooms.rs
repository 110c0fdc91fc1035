use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use roomiex_auth::Viewer;
use roomiex_listing::{
    BrowseFilter, GeminiAnalyzer, ListingWizard, Room, RoomAnalysis, RoomAnalyzer, RoomType,
    AMENITIES, MINIMUM_STAYS,
};
use roomiex_store::{Blob, BookingRequest, BookingStatus, BookingType, TIME_SLOTS};
use tracing::{info, instrument};

use crate::app::App;

/// Fields of the listing form, as given on the command line
#[derive(Debug, Clone, clap::Args)]
pub struct PublishArgs {
    /// Room photo (repeat for up to 6); the first one is scored
    #[arg(long = "photo", required = true)]
    pub photos: Vec<PathBuf>,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub location: String,

    /// Monthly rent
    #[arg(long)]
    pub price: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Private Room, Shared Room, PG or Studio
    #[arg(long, default_value = "Private Room")]
    pub room_type: String,

    #[arg(long)]
    pub bills_included: bool,

    #[arg(long)]
    pub available_from: Option<String>,

    #[arg(long, default_value = "No minimum")]
    pub minimum_stay: String,

    /// Amenity from the fixed list (repeatable)
    #[arg(long = "amenity")]
    pub amenities: Vec<String>,
}

fn print_analysis(analysis: &RoomAnalysis) {
    println!(
        "✨ Quality score {:.1}/10 ({})",
        analysis.overall_score,
        analysis.band()
    );
    for (name, category) in analysis.categories() {
        println!("  {:<12} {:>4.1}  {}", name, category.score, category.feedback);
    }
    println!("\n{}", analysis.summary);
    if !analysis.improvements.is_empty() {
        println!("\n💡 Suggestions:");
        for tip in &analysis.improvements {
            println!("  • {}", tip);
        }
    }
}

async fn load_photo(path: &Path) -> Result<Blob> {
    Blob::from_path(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

#[instrument(skip(app))]
pub async fn run_score(app: &App, photo: &Path) -> Result<()> {
    let blob = load_photo(photo).await?;
    let analyzer = GeminiAnalyzer::with_config(app.config.gemini());
    let analysis = analyzer
        .analyze(&blob)
        .await
        .context("Failed to analyze room")?;
    print_analysis(&analysis);
    Ok(())
}

/// Walk the wizard step by step, stopping at the first incomplete step
#[instrument(skip_all)]
pub async fn run_publish(app: &App, args: &PublishArgs) -> Result<()> {
    let mut wizard = ListingWizard::new();

    let mut photos = Vec::with_capacity(args.photos.len());
    for path in &args.photos {
        photos.push(load_photo(path).await?);
    }
    wizard.add_photos(photos)?;
    wizard.next()?;

    wizard.draft.title = args.title.clone();
    wizard.draft.description = args.description.clone();
    wizard.draft.location = args.location.clone();
    wizard.draft.room_type = RoomType::from_label(&args.room_type).with_context(|| {
        format!(
            "Unknown room type {:?}; expected one of {}",
            args.room_type,
            RoomType::ALL.map(|t| t.label()).join(", ")
        )
    })?;
    wizard.draft.available_from = args.available_from.clone();
    if !MINIMUM_STAYS.contains(&args.minimum_stay.as_str()) {
        bail!(
            "Unknown minimum stay {:?}; expected one of {}",
            args.minimum_stay,
            MINIMUM_STAYS.join(", ")
        );
    }
    wizard.draft.minimum_stay = args.minimum_stay.clone();
    for amenity in &args.amenities {
        if !AMENITIES.iter().any(|a| a.eq_ignore_ascii_case(amenity)) {
            bail!(
                "Unknown amenity {:?}; expected one of {}",
                amenity,
                AMENITIES.join(", ")
            );
        }
        let selected = wizard
            .draft
            .amenities()
            .iter()
            .any(|a| a.eq_ignore_ascii_case(amenity));
        if !selected {
            wizard.toggle_amenity(amenity);
        }
    }
    wizard.next()?;

    wizard.draft.price = args.price.clone();
    wizard.draft.bills_included = args.bills_included;
    wizard.next()?;

    println!("🤖 Analyzing the first photo...");
    let analyzer = GeminiAnalyzer::with_config(app.config.gemini());
    let analysis = wizard.analyze(&analyzer).await?.clone();
    print_analysis(&analysis);

    let listing = wizard
        .publish(&app.auth, &app.storage, app.listings.as_ref())
        .await
        .context("Failed to publish listing")?;
    info!("Published listing {}", listing.id);
    println!("\n🏠 \"{}\" is live (id {})", listing.title, listing.id);
    Ok(())
}

fn print_room_line(room: &Room) {
    let score = room
        .quality_score()
        .map(|s| format!("{:.1}", s))
        .unwrap_or_else(|| "-".to_string());
    let tag = if room.is_demo() { " [showcase]" } else { "" };
    println!(
        "{:<38} ₹{:>7.0}/mo  ★{:<4} {}  ({}){}",
        room.id(),
        room.price(),
        score,
        room.title(),
        room.location(),
        tag
    );
}

pub async fn run_rooms(app: &App, query: Option<String>, max_price: Option<f64>) -> Result<()> {
    let filter = BrowseFilter {
        query: query.unwrap_or_default(),
        max_price,
    };
    let rooms = app.rooms.browse(&filter).await?;
    if rooms.is_empty() {
        println!("No rooms match.");
    }
    for room in &rooms {
        print_room_line(room);
    }
    Ok(())
}

pub async fn run_room(app: &App, viewer: Option<&Viewer>, id: &str) -> Result<()> {
    let room = app.rooms.resolve(id).await?;
    print_room_line(&room);

    let owner = app
        .rooms
        .owner_name(&room)
        .await
        .ok()
        .flatten()
        .unwrap_or_else(|| roomiex_chat::UNKNOWN_USER.to_string());
    println!("Listed by {}", owner);
    println!("Type: {}", room.room_type());
    println!("Amenities: {}", room.amenities().join(", "));
    if let Room::Live(listing) = &room {
        if let Some(description) = &listing.description {
            println!("\n{}", description);
        }
        println!("Photos: {}", listing.photos.len());
    }
    if let Room::Demo(demo) = &room {
        println!("\n{}\nAvailable: {}", demo.description, demo.available_from);
    }

    if !room.is_demo() {
        let reviews = app.reviews.list_for_room(room.id()).await?;
        let average = app.reviews.average_rating(room.id()).await?;
        println!("\n⭐ {:.1} from {} review(s)", average, reviews.len());
        for review in reviews {
            println!(
                "  {} ★{} {}",
                review.reviewer_name,
                review.rating,
                review.comment.unwrap_or_default()
            );
        }
    }

    if let Some(viewer) = viewer {
        let saved = app.saved.is_saved(&viewer.id, room.id()).await?;
        println!(
            "\nSaved: {}  Can message: {}  Can book: {}",
            if saved { "yes" } else { "no" },
            room.can_message(&viewer.id),
            room.can_book(&viewer.id)
        );
    }
    Ok(())
}

pub async fn run_save(app: &App, viewer: &Viewer, room_id: &str) -> Result<()> {
    let room = app.rooms.resolve(room_id).await?;
    let saved = app.saved.toggle(&viewer.id, room.id()).await?;
    println!(
        "{} \"{}\"",
        if saved { "❤️  Saved" } else { "Removed" },
        room.title()
    );
    Ok(())
}

pub async fn run_saved(app: &App, viewer: &Viewer) -> Result<()> {
    let ids = app.saved.list(&viewer.id).await?;
    if ids.is_empty() {
        println!("No saved rooms.");
    }
    for id in ids {
        match app.rooms.resolve(&id).await {
            Ok(room) => print_room_line(&room),
            Err(e) => println!("{:<38} ({})", id, e),
        }
    }
    Ok(())
}

pub async fn run_book(
    app: &App,
    viewer: &Viewer,
    room_id: &str,
    date: NaiveDate,
    time: &str,
    trial: bool,
    message: Option<String>,
) -> Result<()> {
    let room = app.rooms.resolve(room_id).await?;
    let Some(owner_id) = room.owner_id().filter(|_| room.can_book(&viewer.id)) else {
        bail!("\"{}\" cannot be booked by you", room.title());
    };
    if !TIME_SLOTS.contains(&time) {
        bail!("Pick a time slot: {}", TIME_SLOTS.join(", "));
    }

    let booking = app
        .bookings
        .request(BookingRequest {
            room_id: room.id().to_string(),
            requester_id: viewer.id.clone(),
            owner_id: owner_id.to_string(),
            booking_type: if trial {
                BookingType::TrialStay
            } else {
                BookingType::Viewing
            },
            preferred_date: date,
            preferred_time: time.to_string(),
            message,
        })
        .await
        .context("Booking request failed")?;
    println!(
        "📅 Requested {} on {} at {} (id {})",
        booking.booking_type.as_str(),
        booking.preferred_date,
        booking.preferred_time,
        booking.id
    );
    Ok(())
}

pub async fn run_bookings(app: &App, viewer: &Viewer) -> Result<()> {
    let bookings = app.bookings.list_for(&viewer.id).await?;
    if bookings.is_empty() {
        println!("No bookings.");
    }
    let today = Local::now().date_naive();
    for booking in bookings {
        let role = if booking.is_owner { "incoming" } else { "outgoing" };
        let title = app
            .rooms
            .resolve(&booking.room_id)
            .await
            .map(|room| room.title().to_string())
            .unwrap_or_else(|_| roomiex_chat::UNKNOWN_ROOM.to_string());
        let past = if booking.preferred_date < today { " (past)" } else { "" };
        println!(
            "{}  {:<9} {:<10} {} {} {}{}  {}",
            booking.id,
            role,
            booking.status.as_str(),
            booking.booking_type.as_str(),
            booking.preferred_date,
            booking.preferred_time,
            past,
            title
        );
    }
    Ok(())
}

pub async fn run_set_booking_status(
    app: &App,
    viewer: &Viewer,
    booking_id: &str,
    status: BookingStatus,
) -> Result<()> {
    let booking = app
        .bookings
        .set_status(&viewer.id, booking_id, status)
        .await
        .with_context(|| format!("Could not mark booking {}", status.as_str()))?;
    println!("Booking {} is now {}", booking.id, booking.status.as_str());
    Ok(())
}

pub async fn run_review(
    app: &App,
    viewer: &Viewer,
    room_id: &str,
    rating: u8,
    comment: Option<String>,
) -> Result<()> {
    let room = app.rooms.resolve(room_id).await?;
    if !room.can_review(&viewer.id) {
        bail!("\"{}\" cannot be reviewed by you", room.title());
    }
    let review = app
        .reviews
        .submit(room.id(), &viewer.id, rating, comment)
        .await
        .context("Review rejected")?;
    println!("⭐ Thanks {}, review {} saved", review.reviewer_name, review.id);
    Ok(())
}
