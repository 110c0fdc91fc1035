//! Sea-ORM entities for roomiex-store

pub mod bookings;
pub mod flatmate_profiles;
pub mod messages;
pub mod profiles;
pub mod reviews;
pub mod room_listings;
pub mod saved_rooms;

pub use bookings::Entity as Bookings;
pub use flatmate_profiles::Entity as FlatmateProfiles;
pub use messages::Entity as Messages;
pub use profiles::Entity as Profiles;
pub use reviews::Entity as Reviews;
pub use room_listings::Entity as RoomListings;
pub use saved_rooms::Entity as SavedRooms;
