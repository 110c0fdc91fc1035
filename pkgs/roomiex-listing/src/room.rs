//! Rooms as shown to a browsing user: built-in showcase fixtures or live listings
//!
//! A room id is classified once, in [`RoomDirectory::resolve`]. Everything
//! downstream matches on [`Room`] instead of looking at the id again.

use std::sync::Arc;

use async_trait::async_trait;
use roomiex_store::{Directory, ListingBackend, RoomListing};
use tracing::{debug, instrument};

use crate::error::{ListingError, Result};

/// A showcase room with no backing account
#[derive(Debug, Clone, PartialEq)]
pub struct DemoRoom {
    pub id: &'static str,
    pub title: &'static str,
    pub location: &'static str,
    pub price: u32,
    pub room_type: &'static str,
    pub quality_score: f64,
    pub amenities: &'static [&'static str],
    pub available_from: &'static str,
    pub owner_name: &'static str,
    pub description: &'static str,
}

pub static DEMO_ROOMS: [DemoRoom; 6] = [
    DemoRoom {
        id: "1",
        title: "Bright Private Room in Koramangala",
        location: "Koramangala, Bangalore",
        price: 12000,
        room_type: "private",
        quality_score: 8.4,
        amenities: &["WiFi", "AC", "Washing Machine", "Kitchen"],
        available_from: "Immediate",
        owner_name: "Priya S.",
        description: "Beautiful sunlit room with large windows, perfect for remote workers. Quiet neighborhood with cafes nearby.",
    },
    DemoRoom {
        id: "2",
        title: "Cozy Studio Space in HSR Layout",
        location: "HSR Layout, Bangalore",
        price: 15000,
        room_type: "private",
        quality_score: 9.1,
        amenities: &["WiFi", "AC", "Gym Access", "Balcony"],
        available_from: "Jan 15",
        owner_name: "Rahul M.",
        description: "Modern studio with dedicated workspace and attached bathroom.",
    },
    DemoRoom {
        id: "3",
        title: "PG Room with Attached Bath",
        location: "Marathahalli, Bangalore",
        price: 9500,
        room_type: "pg",
        quality_score: 7.8,
        amenities: &["WiFi", "Meals Included", "Housekeeping"],
        available_from: "Immediate",
        owner_name: "Suman K.",
        description: "Clean PG accommodation with meals included. Weekly housekeeping service provided.",
    },
    DemoRoom {
        id: "4",
        title: "Premium Co-Living Suite",
        location: "Indiranagar, Bangalore",
        price: 22000,
        room_type: "private",
        quality_score: 9.5,
        amenities: &["WiFi", "AC", "Pool", "Gym", "Workspace", "Events"],
        available_from: "Feb 1",
        owner_name: "CoLive Spaces",
        description: "Co-living with city views, rooftop pool and a fully equipped gym.",
    },
    DemoRoom {
        id: "5",
        title: "Budget-Friendly Student Room",
        location: "BTM Layout, Bangalore",
        price: 7000,
        room_type: "shared",
        quality_score: 7.2,
        amenities: &["WiFi", "Study Table", "Power Backup"],
        available_from: "Immediate",
        owner_name: "Venkat R.",
        description: "Affordable shared room close to colleges and the metro station.",
    },
    DemoRoom {
        id: "6",
        title: "Elegant Room in Whitefield",
        location: "Whitefield, Bangalore",
        price: 16000,
        room_type: "private",
        quality_score: 8.9,
        amenities: &["WiFi", "AC", "Parking", "Garden"],
        available_from: "Jan 20",
        owner_name: "Arjun D.",
        description: "Serene room with attached bathroom and garden access. Secure parking available.",
    },
];

pub fn demo_room(id: &str) -> Option<&'static DemoRoom> {
    DEMO_ROOMS.iter().find(|room| room.id == id)
}

#[derive(Debug, Clone, PartialEq)]
pub enum Room {
    Demo(&'static DemoRoom),
    Live(RoomListing),
}

impl Room {
    pub fn id(&self) -> &str {
        match self {
            Room::Demo(room) => room.id,
            Room::Live(listing) => &listing.id,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Room::Demo(room) => room.title,
            Room::Live(listing) => &listing.title,
        }
    }

    pub fn location(&self) -> &str {
        match self {
            Room::Demo(room) => room.location,
            Room::Live(listing) => &listing.location,
        }
    }

    /// Monthly rent
    pub fn price(&self) -> f64 {
        match self {
            Room::Demo(room) => f64::from(room.price),
            Room::Live(listing) => listing.price,
        }
    }

    pub fn quality_score(&self) -> Option<f64> {
        match self {
            Room::Demo(room) => Some(room.quality_score),
            Room::Live(listing) => listing.ai_score,
        }
    }

    pub fn amenities(&self) -> Vec<&str> {
        match self {
            Room::Demo(room) => room.amenities.to_vec(),
            Room::Live(listing) => listing.amenities.iter().map(String::as_str).collect(),
        }
    }

    pub fn room_type(&self) -> &str {
        match self {
            Room::Demo(room) => room.room_type,
            Room::Live(listing) => &listing.room_type,
        }
    }

    /// Account id of the lister; demo rooms have none
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            Room::Demo(_) => None,
            Room::Live(listing) => Some(&listing.owner_id),
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Room::Demo(_))
    }

    /// Whether `viewer_id` may open a room-scoped chat with the owner
    pub fn can_message(&self, viewer_id: &str) -> bool {
        self.owner_id().is_some_and(|owner| owner != viewer_id)
    }

    pub fn can_book(&self, viewer_id: &str) -> bool {
        self.can_message(viewer_id)
    }

    pub fn can_review(&self, viewer_id: &str) -> bool {
        self.can_message(viewer_id)
    }

    fn matches(&self, filter: &BrowseFilter) -> bool {
        let query = filter.query.trim().to_lowercase();
        let text_match = query.is_empty()
            || self.title().to_lowercase().contains(&query)
            || self.location().to_lowercase().contains(&query);
        let price_match = filter
            .max_price
            .map_or(true, |max| self.price() <= max);

        text_match && price_match
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseFilter {
    /// Case-insensitive substring of the title or location
    pub query: String,
    pub max_price: Option<f64>,
}

impl BrowseFilter {
    pub fn query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            max_price: None,
        }
    }
}

/// Resolves room ids and serves the browse list
#[derive(Clone)]
pub struct RoomDirectory {
    listings: Arc<dyn ListingBackend>,
    people: Arc<dyn Directory>,
}

impl RoomDirectory {
    pub fn new(listings: Arc<dyn ListingBackend>, people: Arc<dyn Directory>) -> Self {
        Self { listings, people }
    }

    async fn lookup(&self, id: &str) -> roomiex_store::Result<Option<Room>> {
        if uuid::Uuid::parse_str(id).is_ok() {
            let listing = self.listings.get_listing(id).await?;
            return Ok(listing.map(Room::Live));
        }
        Ok(demo_room(id).map(Room::Demo))
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, id: &str) -> Result<Room> {
        let room = self
            .lookup(id)
            .await?
            .ok_or_else(|| ListingError::RoomNotFound(id.to_string()))?;
        debug!("Resolved room {} (demo: {})", id, room.is_demo());
        Ok(room)
    }

    /// Published listings newest first, then the showcase rooms
    pub async fn browse(&self, filter: &BrowseFilter) -> Result<Vec<Room>> {
        let live = self.listings.published_listings().await?;
        let rooms = live
            .into_iter()
            .map(Room::Live)
            .chain(DEMO_ROOMS.iter().map(Room::Demo))
            .filter(|room| room.matches(filter))
            .collect();
        Ok(rooms)
    }

    /// Display name of a room's owner
    pub async fn owner_name(&self, room: &Room) -> Result<Option<String>> {
        match room {
            Room::Demo(demo) => Ok(Some(demo.owner_name.to_string())),
            Room::Live(listing) => Ok(self.people.display_name(&listing.owner_id).await?),
        }
    }
}

#[async_trait]
impl Directory for RoomDirectory {
    async fn display_name(&self, user_id: &str) -> roomiex_store::Result<Option<String>> {
        self.people.display_name(user_id).await
    }

    async fn listing_title(&self, room_id: &str) -> roomiex_store::Result<Option<String>> {
        Ok(self
            .lookup(room_id)
            .await?
            .map(|room| room.title().to_string()))
    }
}
