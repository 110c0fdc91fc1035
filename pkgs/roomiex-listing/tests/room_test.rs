// Copyright 2025 RoomieX Team.
//
// Room resolution, browsing and the room-aware directory

mod common;

use common::Harness;
use roomiex_listing::{BrowseFilter, ListingError, Room, RoomDirectory, DEMO_ROOMS};
use roomiex_store::{
    DbDirectory, Directory, ListingBackend, NewListing, RoomListing, STATUS_PUBLISHED,
};
use std::sync::Arc;
use std::time::Duration;

fn directory(h: &Harness) -> RoomDirectory {
    RoomDirectory::new(
        Arc::new(h.listings.clone()),
        Arc::new(DbDirectory::new(h.db.clone())),
    )
}

async fn list_room(h: &Harness, owner_id: &str, title: &str, location: &str, price: f64) -> RoomListing {
    h.listings
        .insert_listing(NewListing {
            owner_id: owner_id.to_string(),
            title: title.to_string(),
            location: location.to_string(),
            price,
            room_type: "private".to_string(),
            status: STATUS_PUBLISHED.to_string(),
            ..NewListing::default()
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_resolve_demo_and_live() {
    let h = Harness::new().await;
    let (_, owner) = h.client("owner@example.com", "Olivia Owner").await;
    let listing = list_room(&h, &owner.id, "Loft with a view", "Indiranagar", 18000.0).await;
    let rooms = directory(&h);

    let demo = rooms.resolve("2").await.unwrap();
    assert!(demo.is_demo());
    assert_eq!(demo.title(), "Cozy Studio Space in HSR Layout");
    assert_eq!(rooms.owner_name(&demo).await.unwrap().as_deref(), Some("Rahul M."));

    let live = rooms.resolve(&listing.id).await.unwrap();
    assert!(matches!(live, Room::Live(_)));
    assert_eq!(live.owner_id(), Some(owner.id.as_str()));
    assert_eq!(
        rooms.owner_name(&live).await.unwrap().as_deref(),
        Some("Olivia Owner")
    );
}

#[tokio::test]
async fn test_resolve_unknown_ids() {
    let h = Harness::new().await;
    let rooms = directory(&h);

    let missing_live = uuid::Uuid::new_v4().to_string();
    assert!(matches!(
        rooms.resolve(&missing_live).await,
        Err(ListingError::RoomNotFound(id)) if id == missing_live
    ));
    assert!(matches!(
        rooms.resolve("42").await,
        Err(ListingError::RoomNotFound(_))
    ));
}

#[tokio::test]
async fn test_live_room_affordances() {
    let h = Harness::new().await;
    let (_, owner) = h.client("owner@example.com", "Olivia Owner").await;
    let (_, renter) = h.client("renter@example.com", "Ravi Renter").await;
    let listing = list_room(&h, &owner.id, "Loft with a view", "Indiranagar", 18000.0).await;

    let room = directory(&h).resolve(&listing.id).await.unwrap();
    assert!(room.can_message(&renter.id));
    assert!(room.can_book(&renter.id));
    assert!(room.can_review(&renter.id));
    assert!(!room.can_message(&owner.id));
    assert!(!room.can_book(&owner.id));
}

#[tokio::test]
async fn test_browse_lists_live_then_demo() {
    let h = Harness::new().await;
    let (_, owner) = h.client("owner@example.com", "Olivia Owner").await;
    let older = list_room(&h, &owner.id, "Garden flat", "Whitefield, Bangalore", 15000.0).await;
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = list_room(&h, &owner.id, "Rooftop studio", "Jayanagar, Bangalore", 21000.0).await;
    let rooms = directory(&h);

    let all = rooms.browse(&BrowseFilter::default()).await.unwrap();
    assert_eq!(all.len(), DEMO_ROOMS.len() + 2);
    assert_eq!(all[0].id(), newer.id);
    assert_eq!(all[1].id(), older.id);
    assert!(all[2..].iter().all(Room::is_demo));

    let whitefield = rooms.browse(&BrowseFilter::query("WHITEFIELD")).await.unwrap();
    let ids: Vec<&str> = whitefield.iter().map(Room::id).collect();
    assert_eq!(ids, vec![older.id.as_str(), "6"]);

    let cheap = rooms
        .browse(&BrowseFilter {
            query: String::new(),
            max_price: Some(10000.0),
        })
        .await
        .unwrap();
    let ids: Vec<&str> = cheap.iter().map(Room::id).collect();
    assert_eq!(ids, vec!["3", "5"]);
}

#[tokio::test]
async fn test_directory_titles_cover_both_kinds() {
    let h = Harness::new().await;
    let (_, owner) = h.client("owner@example.com", "Olivia Owner").await;
    let listing = list_room(&h, &owner.id, "Loft with a view", "Indiranagar", 18000.0).await;
    let rooms = directory(&h);

    assert_eq!(
        rooms.listing_title(&listing.id).await.unwrap().as_deref(),
        Some("Loft with a view")
    );
    assert_eq!(
        rooms.listing_title("4").await.unwrap().as_deref(),
        Some("Premium Co-Living Suite")
    );
    assert_eq!(rooms.listing_title("nope").await.unwrap(), None);
    assert_eq!(
        rooms.display_name(&owner.id).await.unwrap().as_deref(),
        Some("Olivia Owner")
    );
}
