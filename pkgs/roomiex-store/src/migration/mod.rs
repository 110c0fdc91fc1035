//! Sea-ORM migrations for the RoomieX database schema

pub use sea_orm_migration::prelude::*;

mod m20250301_000002_create_profiles_table;
mod m20250301_000003_create_messages_table;
mod m20250302_000001_create_room_listings_table;
mod m20250303_000001_create_saved_rooms_table;
mod m20250303_000002_create_bookings_table;
mod m20250303_000003_create_reviews_table;
mod m20250304_000001_create_flatmate_profiles_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(roomiex_auth::migration::CreateAccountsTable),
            Box::new(m20250301_000002_create_profiles_table::Migration),
            Box::new(m20250301_000003_create_messages_table::Migration),
            Box::new(m20250302_000001_create_room_listings_table::Migration),
            Box::new(m20250303_000001_create_saved_rooms_table::Migration),
            Box::new(m20250303_000002_create_bookings_table::Migration),
            Box::new(m20250303_000003_create_reviews_table::Migration),
            Box::new(m20250304_000001_create_flatmate_profiles_table::Migration),
        ]
    }
}
