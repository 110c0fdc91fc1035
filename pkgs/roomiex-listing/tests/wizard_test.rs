// Copyright 2025 RoomieX Team.
//
// Listing wizard gating and the publish pipeline

mod common;

use common::{photo, FlakyStorage, Harness, StubAnalyzer};
use roomiex_listing::{ListingError, ListingWizard, RoomType, WizardStep};
use roomiex_store::{ListingBackend, LocalObjectStorage};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A wizard filled in up to the AI score step
fn filled_wizard(photos: usize) -> ListingWizard {
    let mut wizard = ListingWizard::new();
    wizard
        .add_photos((0..photos).map(|i| photo(&format!("room-{i}.jpg"))).collect())
        .unwrap();
    wizard.next().unwrap();

    wizard.draft.title = "Sunny room near the lake".to_string();
    wizard.draft.location = "HSR Layout, Bangalore".to_string();
    wizard.draft.room_type = RoomType::Studio;
    wizard.toggle_amenity("WiFi");
    wizard.toggle_amenity("Balcony");
    wizard.next().unwrap();

    wizard.draft.price = "14500".to_string();
    wizard.draft.bills_included = true;
    assert_eq!(wizard.next().unwrap(), WizardStep::AiScore);
    wizard
}

fn upload_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir.join("rooms"))
        .map(|entries| entries.count())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_advance_requires_a_photo() {
    let mut wizard = ListingWizard::new();
    assert!(!wizard.can_proceed());
    assert!(matches!(
        wizard.next(),
        Err(ListingError::StepIncomplete(WizardStep::Photos))
    ));

    wizard.add_photos(vec![photo("room.jpg")]).unwrap();
    assert_eq!(wizard.next().unwrap(), WizardStep::Details);
}

#[tokio::test]
async fn test_publish_rejected_before_score() {
    let h = Harness::new().await;
    let (auth, _) = h.client("owner@example.com", "Olivia Owner").await;
    let wizard = filled_wizard(2);

    let result = wizard.publish(&auth, &h.storage, &h.listings).await;
    assert!(matches!(
        result,
        Err(ListingError::StepIncomplete(WizardStep::AiScore))
    ));
    assert_eq!(upload_count(h.uploads.path()), 0);
}

#[tokio::test]
async fn test_analyze_uses_first_photo() {
    let mut wizard = filled_wizard(3);
    let analyzer = StubAnalyzer::scoring(8.2);

    let analysis = wizard.analyze(&analyzer).await.unwrap();
    assert_eq!(analysis.overall_score, 8.2);
    assert_eq!(*analyzer.seen.lock(), vec!["room-0.jpg".to_string()]);
    assert_eq!(wizard.ai_score(), Some(8.2));
    assert!(wizard.can_publish());
}

#[tokio::test]
async fn test_failed_analysis_keeps_previous_score() {
    let mut wizard = filled_wizard(1);
    wizard.analyze(&StubAnalyzer::scoring(7.5)).await.unwrap();

    let result = wizard.analyze(&StubAnalyzer::failing()).await;
    assert!(matches!(result, Err(ListingError::Analysis(_))));
    assert_eq!(wizard.ai_score(), Some(7.5));
}

#[tokio::test]
async fn test_analyze_without_photos() {
    let mut wizard = ListingWizard::new();
    let result = wizard.analyze(&StubAnalyzer::scoring(9.0)).await;
    assert!(matches!(result, Err(ListingError::NoPhotos)));
}

#[tokio::test]
async fn test_publish_requires_sign_in() {
    let h = Harness::new().await;
    let (auth, _) = h.client("owner@example.com", "Olivia Owner").await;
    auth.sign_out();

    let mut wizard = filled_wizard(1);
    wizard.analyze(&StubAnalyzer::scoring(8.0)).await.unwrap();

    let result = wizard.publish(&auth, &h.storage, &h.listings).await;
    assert!(matches!(result, Err(ListingError::NotSignedIn)));
}

#[tokio::test]
async fn test_publish_stores_listing() {
    let h = Harness::new().await;
    let (auth, owner) = h.client("owner@example.com", "Olivia Owner").await;

    let mut wizard = filled_wizard(3);
    wizard.analyze(&StubAnalyzer::scoring(8.6)).await.unwrap();

    let listing = wizard.publish(&auth, &h.storage, &h.listings).await.unwrap();
    assert_eq!(listing.owner_id, owner.id);
    assert_eq!(listing.status, "published");
    assert_eq!(listing.room_type, "private");
    assert_eq!(listing.price, 14500.0);
    assert!(listing.bills_included);
    assert_eq!(listing.amenities, vec!["WiFi", "Balcony"]);
    assert_eq!(listing.minimum_stay.as_deref(), Some("No minimum"));
    assert_eq!(listing.ai_score, Some(8.6));
    assert_eq!(
        listing.ai_analysis.as_ref().unwrap()["overallScore"],
        serde_json::json!(8.6)
    );

    assert_eq!(listing.photos.len(), 3);
    for url in &listing.photos {
        assert!(url.starts_with("https://cdn.test/rooms/"), "{}", url);
        assert!(url.ends_with(".jpg"));
    }
    assert_eq!(upload_count(h.uploads.path()), 3);

    let stored = h.listings.get_listing(&listing.id).await.unwrap().unwrap();
    assert_eq!(stored, listing);
}

#[tokio::test]
async fn test_failed_upload_publishes_nothing() {
    let h = Harness::new().await;
    let (auth, owner) = h.client("owner@example.com", "Olivia Owner").await;
    let storage = FlakyStorage {
        inner: LocalObjectStorage::new(h.uploads.path(), "https://cdn.test"),
        allowed: 1,
        calls: AtomicUsize::new(0),
    };

    let mut wizard = filled_wizard(3);
    wizard.analyze(&StubAnalyzer::scoring(8.0)).await.unwrap();

    let result = wizard.publish(&auth, &storage, &h.listings).await;
    assert!(matches!(result, Err(ListingError::Backend(_))));
    assert!(storage.calls.load(Ordering::SeqCst) >= 2);
    assert!(h.listings.listings_by_owner(&owner.id).await.unwrap().is_empty());

    // Wizard is untouched and can retry
    assert_eq!(wizard.step(), WizardStep::AiScore);
    assert_eq!(wizard.photos().len(), 3);
    assert!(wizard.can_publish());

    wizard.publish(&auth, &h.storage, &h.listings).await.unwrap();
    assert_eq!(h.listings.listings_by_owner(&owner.id).await.unwrap().len(), 1);
}
