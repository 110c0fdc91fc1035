mod app;
mod chat;
mod config;
mod flatmates;
mod rooms;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use roomiex_store::BookingStatus;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::app::{App, Credentials};
use crate::chat::Counterpart;
use crate::config::{load_config, DEFAULT_CONFIG_PATH};
use crate::flatmates::FlatmateArgs;
use crate::rooms::PublishArgs;

/// RoomieX - rooms, flatmates and chat from the terminal
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Account email (falls back to ROOMIEX_EMAIL)
    #[arg(long, global = true)]
    email: Option<String>,

    /// Account password (falls back to ROOMIEX_PASSWORD)
    #[arg(long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account
    Signup {
        #[arg(long)]
        name: String,
    },
    /// Open a conversation, direct or about a room
    Chat {
        /// Email of the other person; defaults to the room owner with --room
        #[arg(long)]
        with: Option<String>,
        /// User id from `flatmates`, for a direct conversation
        #[arg(long, conflicts_with = "with")]
        flatmate: Option<String>,
        /// Listing the conversation is about
        #[arg(long)]
        room: Option<String>,
        /// Seconds between re-fetches of the thread
        #[arg(long, default_value = "3")]
        refresh_secs: u64,
    },
    /// List conversations with their last message and unread count
    Inbox {
        #[arg(long)]
        search: Option<String>,
        /// Keep running and print the list again on every change
        #[arg(long)]
        watch: bool,
    },
    /// Score a room photo with the AI analyzer
    Score { photo: PathBuf },
    /// Create a listing through the wizard and publish it
    Publish(PublishArgs),
    /// Browse published listings and showcase rooms
    Rooms {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// Show one room with its reviews
    Room { id: String },
    /// Save or unsave a room
    Save { room_id: String },
    /// List saved rooms
    Saved,
    /// Request a viewing (or a trial stay)
    Book {
        room_id: String,
        /// Preferred date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "10:00 AM")]
        time: String,
        #[arg(long)]
        trial: bool,
        #[arg(long)]
        message: Option<String>,
    },
    /// List bookings you made or received
    Bookings,
    /// Confirm a booking request for your room
    Confirm { booking_id: String },
    /// Cancel a booking
    Cancel { booking_id: String },
    /// Browse people looking for a room
    Flatmates {
        /// Part of the preferred location, e.g. Koramangala
        #[arg(long)]
        location: Option<String>,
    },
    /// Create, update or show your own flatmate profile
    FlatmateProfile(FlatmateArgs),
    /// Review a room (1-5 stars)
    Review {
        room_id: String,
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        debug!("No .env loaded: {}", e);
    }

    let args = Args::parse();
    let mut config = load_config(&args.config);
    config.apply_overrides(|key| std::env::var(key).ok());

    let credentials = Credentials {
        email: args.email.or_else(|| std::env::var("ROOMIEX_EMAIL").ok()),
        password: args
            .password
            .or_else(|| std::env::var("ROOMIEX_PASSWORD").ok()),
    };

    let app = App::open(config).await?;

    match args.command {
        Command::Signup { name } => {
            let viewer = app.sign_up(&credentials, &name).await?;
            println!("✅ Welcome, {} ({})", viewer.full_name, viewer.email);
        }
        Command::Chat {
            with,
            flatmate,
            room,
            refresh_secs,
        } => {
            let viewer = app.sign_in(&credentials).await?;
            let counterpart = Counterpart {
                email: with.as_deref(),
                flatmate: flatmate.as_deref(),
            };
            chat::run_chat(&app, &viewer, counterpart, room.as_deref(), refresh_secs).await?;
        }
        Command::Inbox { search, watch } => {
            app.sign_in(&credentials).await?;
            chat::run_inbox(&app, search.as_deref(), watch).await?;
        }
        Command::Score { photo } => rooms::run_score(&app, &photo).await?,
        Command::Publish(publish) => {
            app.sign_in(&credentials).await?;
            rooms::run_publish(&app, &publish).await?;
        }
        Command::Rooms { query, max_price } => rooms::run_rooms(&app, query, max_price).await?,
        Command::Room { id } => {
            // Signed-in viewers also see their saved state and affordances
            let viewer = if credentials.email.is_some() {
                Some(app.sign_in(&credentials).await?)
            } else {
                None
            };
            rooms::run_room(&app, viewer.as_ref(), &id).await?;
        }
        Command::Save { room_id } => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_save(&app, &viewer, &room_id).await?;
        }
        Command::Saved => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_saved(&app, &viewer).await?;
        }
        Command::Book {
            room_id,
            date,
            time,
            trial,
            message,
        } => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_book(&app, &viewer, &room_id, date, &time, trial, message).await?;
        }
        Command::Bookings => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_bookings(&app, &viewer).await?;
        }
        Command::Confirm { booking_id } => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_set_booking_status(&app, &viewer, &booking_id, BookingStatus::Confirmed)
                .await?;
        }
        Command::Cancel { booking_id } => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_set_booking_status(&app, &viewer, &booking_id, BookingStatus::Cancelled)
                .await?;
        }
        Command::Flatmates { location } => flatmates::run_flatmates(&app, location).await?,
        Command::FlatmateProfile(args) => {
            let viewer = app.sign_in(&credentials).await?;
            flatmates::run_flatmate_profile(&app, &viewer, &args).await?;
        }
        Command::Review {
            room_id,
            rating,
            comment,
        } => {
            let viewer = app.sign_in(&credentials).await?;
            rooms::run_review(&app, &viewer, &room_id, rating, comment).await?;
        }
    }

    Ok(())
}
