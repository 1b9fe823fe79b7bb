// SPDX-License-Identifier: MIT

//! Firestore integration tests.
//!
//! These run against the Firestore emulator (set FIRESTORE_EMULATOR_HOST)
//! and are skipped otherwise. Every test namespaces its users with a fresh
//! UUID so tests never see each other's documents.

use chrono::{Duration, Utc};
use hangin_api::error::AppError;
use hangin_api::models::{Coordinates, FriendshipStatus, PinDraft, PinPatch, PrivacyPatch, ProfilePatch};

mod common;

fn uid(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

fn draft(visible_to: Vec<String>) -> PinDraft {
    let now = Utc::now();
    PinDraft {
        title: "Coffee at the park".to_string(),
        note: String::new(),
        location: Coordinates {
            latitude: 37.77,
            longitude: -122.42,
        },
        address: None,
        hangout_time: now,
        expires_at: now + Duration::hours(2),
        visible_to,
        selected_friends: vec![],
    }
}

fn expired_draft(visible_to: Vec<String>) -> PinDraft {
    let now = Utc::now();
    PinDraft {
        expires_at: now - Duration::hours(1),
        hangout_time: now - Duration::hours(3),
        ..draft(visible_to)
    }
}

#[tokio::test]
async fn visibility_union_deduplicates_owner_in_own_visible_to() {
    require_emulator!();
    let db = common::test_db().await;

    let alice = uid("alice");
    let bob = uid("bob");
    let carol = uid("carol");

    // Pin shared with bob only
    let shared = db
        .create_pin(&alice, draft(vec![bob.clone()]))
        .await
        .unwrap();

    // Pin whose owner also appears in its own visible_to: matches both the
    // array-contains and the created-by query
    let self_visible = db
        .create_pin(&alice, draft(vec![alice.clone(), carol.clone()]))
        .await
        .unwrap();

    let for_alice = db.pins_visible_to(&alice).await.unwrap();
    assert_eq!(for_alice.len(), 2);
    assert_eq!(
        for_alice.iter().filter(|p| p.id == self_visible.id).count(),
        1
    );

    let for_bob = db.pins_visible_to(&bob).await.unwrap();
    assert_eq!(for_bob.len(), 1);
    assert_eq!(for_bob[0].id, shared.id);

    let for_carol = db.pins_visible_to(&carol).await.unwrap();
    assert_eq!(for_carol.len(), 1);
    assert_eq!(for_carol[0].id, self_visible.id);
}

#[tokio::test]
async fn expired_pins_stay_active_for_owner_only() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let friend = uid("friend");

    db.create_pin(&owner, expired_draft(vec![friend.clone()]))
        .await
        .unwrap();

    let for_owner = db.active_pins(&owner).await.unwrap();
    assert_eq!(for_owner.len(), 1);

    let for_friend = db.active_pins(&friend).await.unwrap();
    assert!(for_friend.is_empty());
}

#[tokio::test]
async fn check_in_is_idempotent_and_check_out_reverses_it() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let guest = uid("guest");

    let pin = db
        .create_pin(&owner, draft(vec![guest.clone()]))
        .await
        .unwrap();

    let after_first = db.check_in(&pin.id, &guest).await.unwrap();
    assert_eq!(after_first.checked_in_users, vec![guest.clone()]);

    let after_second = db.check_in(&pin.id, &guest).await.unwrap();
    assert_eq!(after_second.checked_in_users, vec![guest.clone()]);

    let after_out = db.check_out(&pin.id, &guest).await.unwrap();
    assert!(after_out.checked_in_users.is_empty());

    // Checking out when not checked in is a no-op
    let after_repeat = db.check_out(&pin.id, &guest).await.unwrap();
    assert!(after_repeat.checked_in_users.is_empty());
}

#[tokio::test]
async fn check_in_requires_visibility() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let guest = uid("guest");
    let stranger = uid("stranger");
    let pin = db
        .create_pin(&owner, draft(vec![guest.clone()]))
        .await
        .unwrap();

    let denied = db.check_in(&pin.id, &stranger).await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

    let fetched = db.get_pin(&pin.id).await.unwrap().unwrap();
    assert!(fetched.checked_in_users.is_empty());

    db.check_in(&pin.id, &guest).await.unwrap();
}

#[tokio::test]
async fn expired_pin_rejects_guest_check_in_but_not_owner() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let guest = uid("guest");

    let pin = db
        .create_pin(&owner, expired_draft(vec![guest.clone()]))
        .await
        .unwrap();

    let denied = db.check_in(&pin.id, &guest).await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

    let allowed = db.check_in(&pin.id, &owner).await.unwrap();
    assert!(allowed.is_checked_in(&owner));
}

#[tokio::test]
async fn only_the_owner_can_delete_a_pin() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let other = uid("other");

    let pin = db
        .create_pin(&owner, draft(vec![other.clone()]))
        .await
        .unwrap();

    let denied = db.delete_pin(&pin.id, &other).await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));
    assert!(db.get_pin(&pin.id).await.unwrap().is_some());

    db.delete_pin(&pin.id, &owner).await.unwrap();
    assert!(db.get_pin(&pin.id).await.unwrap().is_none());
}

#[tokio::test]
async fn update_pin_merges_only_patched_fields() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let pin = db.create_pin(&owner, draft(vec![])).await.unwrap();

    let patch = PinPatch {
        title: Some("Moved to the beach".to_string()),
        ..Default::default()
    };
    let updated = db.update_pin(&pin.id, &patch).await.unwrap();

    assert_eq!(updated.title, "Moved to the beach");
    assert_eq!(updated.note, pin.note);
    assert_eq!(updated.created_by, owner);
    assert!(updated.updated_at > pin.updated_at);

    let missing = db.update_pin("no-such-pin", &patch).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn pins_by_user_returns_newest_first() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let first = db.create_pin(&owner, draft(vec![])).await.unwrap();
    let second = db.create_pin(&owner, draft(vec![])).await.unwrap();
    let third = db.create_pin(&owner, draft(vec![])).await.unwrap();

    let pins = db.pins_by_user(&owner).await.unwrap();
    assert_eq!(pins.len(), 3);
    assert_eq!(pins[0].id, third.id);
    assert_eq!(pins[1].id, second.id);
    assert_eq!(pins[2].id, first.id);
}

#[tokio::test]
async fn friendship_lifecycle() {
    require_emulator!();
    let db = common::test_db().await;

    let alice = uid("alice");
    let bob = uid("bob");
    db.create_user_profile(&alice, "Alice".into(), "a@example.com".into(), String::new())
        .await
        .unwrap();
    db.create_user_profile(&bob, "Bob".into(), "b@example.com".into(), String::new())
        .await
        .unwrap();

    let request = db.send_friend_request(&alice, &bob).await.unwrap();
    assert_eq!(request.status, FriendshipStatus::Pending);

    // A pending request blocks another in either direction
    assert!(matches!(
        db.send_friend_request(&alice, &bob).await,
        Err(AppError::BadRequest(_))
    ));
    assert!(matches!(
        db.send_friend_request(&bob, &alice).await,
        Err(AppError::BadRequest(_))
    ));

    // Only the receiver can respond
    assert!(matches!(
        db.respond_to_friend_request(&request.id, &alice, true).await,
        Err(AppError::PermissionDenied(_))
    ));

    let accepted = db
        .respond_to_friend_request(&request.id, &bob, true)
        .await
        .unwrap();
    assert_eq!(accepted.status, FriendshipStatus::Accepted);

    assert_eq!(db.friend_ids(&alice).await.unwrap(), vec![bob.clone()]);
    assert_eq!(db.friend_ids(&bob).await.unwrap(), vec![alice.clone()]);
    assert_eq!(
        db.friendship_status(&alice, &bob).await.unwrap(),
        Some(FriendshipStatus::Accepted)
    );

    db.remove_friend(&alice, &bob).await.unwrap();
    assert!(db.friend_ids(&alice).await.unwrap().is_empty());
    assert_eq!(db.friendship_status(&alice, &bob).await.unwrap(), None);

    // With the document gone the pair can start over
    db.send_friend_request(&bob, &alice).await.unwrap();
}

#[tokio::test]
async fn rejected_request_blocks_a_new_one_until_removed() {
    require_emulator!();
    let db = common::test_db().await;

    let alice = uid("alice");
    let bob = uid("bob");
    db.create_user_profile(&alice, "Alice".into(), "a@example.com".into(), String::new())
        .await
        .unwrap();
    db.create_user_profile(&bob, "Bob".into(), "b@example.com".into(), String::new())
        .await
        .unwrap();

    let request = db.send_friend_request(&alice, &bob).await.unwrap();
    let rejected = db
        .respond_to_friend_request(&request.id, &bob, false)
        .await
        .unwrap();
    assert_eq!(rejected.status, FriendshipStatus::Rejected);

    // The rejected document still blocks a fresh request
    assert!(matches!(
        db.send_friend_request(&alice, &bob).await,
        Err(AppError::BadRequest(_))
    ));

    db.remove_friend(&alice, &bob).await.unwrap();
    db.send_friend_request(&alice, &bob).await.unwrap();
}

#[tokio::test]
async fn closed_profiles_refuse_friend_requests() {
    require_emulator!();
    let db = common::test_db().await;

    let alice = uid("alice");
    let bob = uid("bob");
    db.create_user_profile(&alice, "Alice".into(), "a@example.com".into(), String::new())
        .await
        .unwrap();
    db.create_user_profile(&bob, "Bob".into(), "b@example.com".into(), String::new())
        .await
        .unwrap();

    db.update_privacy_settings(
        &bob,
        &PrivacyPatch {
            allow_friend_requests: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(matches!(
        db.send_friend_request(&alice, &bob).await,
        Err(AppError::PermissionDenied(_))
    ));
}

#[tokio::test]
async fn pending_requests_are_enriched_with_sender_info() {
    require_emulator!();
    let db = common::test_db().await;

    let alice = uid("alice");
    let bob = uid("bob");
    db.create_user_profile(&alice, "Alice".into(), "a@example.com".into(), String::new())
        .await
        .unwrap();
    db.create_user_profile(&bob, "Bob".into(), "b@example.com".into(), String::new())
        .await
        .unwrap();

    db.send_friend_request(&alice, &bob).await.unwrap();

    let requests = db.friend_requests(&bob).await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].sender_id, alice);
    assert_eq!(requests[0].display_name, "Alice");
    assert_eq!(requests[0].status, FriendshipStatus::Pending);

    // The sender sees no incoming requests
    assert!(db.friend_requests(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn comment_lifecycle_and_permissions() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let guest = uid("guest");
    let pin = db
        .create_pin(&owner, draft(vec![guest.clone()]))
        .await
        .unwrap();

    let first = db
        .add_comment(&pin.id, &guest, "see you there".to_string())
        .await
        .unwrap();
    let second = db
        .add_comment(&pin.id, &owner, "bring snacks".to_string())
        .await
        .unwrap();

    let comments = db.comments_for_pin(&pin.id).await.unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0].id, second.id);
    assert_eq!(comments[1].id, first.id);

    // Only the author can edit or delete
    assert!(matches!(
        db.update_comment(&first.id, &owner, "edited".to_string()).await,
        Err(AppError::PermissionDenied(_))
    ));
    assert!(matches!(
        db.delete_comment(&first.id, &owner).await,
        Err(AppError::PermissionDenied(_))
    ));

    let edited = db
        .update_comment(&first.id, &guest, "running late".to_string())
        .await
        .unwrap();
    assert_eq!(edited.text, "running late");

    db.delete_comment(&first.id, &guest).await.unwrap();
    assert_eq!(db.comments_for_pin(&pin.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn expired_pins_are_read_only_for_guest_comments() {
    require_emulator!();
    let db = common::test_db().await;

    let owner = uid("owner");
    let guest = uid("guest");
    let pin = db
        .create_pin(&owner, expired_draft(vec![guest.clone()]))
        .await
        .unwrap();

    let denied = db
        .add_comment(&pin.id, &guest, "too late".to_string())
        .await;
    assert!(matches!(denied, Err(AppError::PermissionDenied(_))));

    // The owner can still comment on their own expired pin
    db.add_comment(&pin.id, &owner, "wrapping up".to_string())
        .await
        .unwrap();
}

#[tokio::test]
async fn profile_updates_merge_and_privacy_merges() {
    require_emulator!();
    let db = common::test_db().await;

    let user = uid("user");
    let created = db
        .create_user_profile(&user, "Sam".into(), "sam@example.com".into(), String::new())
        .await
        .unwrap();
    assert!(created.privacy_settings.allow_friend_requests);

    let patch = ProfilePatch {
        display_name: Some("Samantha".to_string()),
        ..Default::default()
    };
    let updated = db.update_user_profile(&user, &patch).await.unwrap();
    assert_eq!(updated.display_name, "Samantha");
    assert_eq!(updated.email, "sam@example.com");

    // A single-toggle patch leaves the other toggles at their stored values.
    let with_privacy = db
        .update_privacy_settings(
            &user,
            &PrivacyPatch {
                share_location_with_friends: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(!with_privacy.privacy_settings.share_location_with_friends);
    assert!(with_privacy.privacy_settings.allow_friend_requests);
    assert!(with_privacy.privacy_settings.show_active_status);
    assert_eq!(with_privacy.display_name, "Samantha");

    db.update_last_active(&user).await.unwrap();
    let stamped = db.get_user_profile(&user).await.unwrap().unwrap();
    assert!(stamped.last_active >= created.last_active);

    db.delete_user_profile(&user).await.unwrap();
    assert!(db.get_user_profile(&user).await.unwrap().is_none());
}

#[tokio::test]
async fn user_search_ranks_exact_then_prefix_then_substring() {
    require_emulator!();
    let db = common::test_db().await;

    // A unique needle keeps this test isolated from other users in the
    // shared emulator collection.
    let needle = uuid::Uuid::new_v4().simple().to_string();
    let searcher = uid("searcher");

    let exact = uid("exact");
    let prefix = uid("prefix");
    let substring = uid("substring");

    db.create_user_profile(&exact, needle.clone(), String::new(), String::new())
        .await
        .unwrap();
    db.create_user_profile(
        &prefix,
        format!("{}antha", needle),
        String::new(),
        String::new(),
    )
    .await
    .unwrap();
    db.create_user_profile(
        &substring,
        format!("ro{}", needle),
        String::new(),
        String::new(),
    )
    .await
    .unwrap();

    let results = db.search_users(&needle, &searcher).await.unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec![exact.as_str(), prefix.as_str(), substring.as_str()]);

    // The searcher never appears in their own results
    db.create_user_profile(&searcher, needle.clone(), String::new(), String::new())
        .await
        .unwrap();
    let results = db.search_users(&needle, &searcher).await.unwrap();
    assert!(results.iter().all(|r| r.id != searcher));
}
