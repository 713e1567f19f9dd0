//! End-to-end tests for friend-request negotiation over SurrealDB
//!
//! Each test gets its own in-memory database, wired exactly like `relay::init`
//! does it, plus a raw client handle for inspecting or corrupting rows.

use std::sync::Arc;

use futures::future::join_all;
use relay::RelayError;
use relay::accounts::NewAccount;
use relay::config::ConfigBuilder;
use relay::core::RelayManager;
use relay::models::{RelationshipStatus, User};
use relay::relationships::RequestWithdrawal;
use relay::storage::shared_storage::{SharedStorage, SharedStorageConfig};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Harness {
    relay: RelayManager,
    client: Surreal<Db>,
}

async fn harness() -> Harness {
    let client = Surreal::new::<Mem>(()).await.expect("memory engine");
    let shared = SharedStorageConfig {
        namespace: "test".to_string(),
        database: "engine".to_string(),
        ..Default::default()
    };
    let storage = SharedStorage::new(client.clone(), shared)
        .await
        .expect("shared storage");
    client.use_ns("test").use_db("engine").await.unwrap();

    let config = ConfigBuilder::testing().build().unwrap();
    Harness {
        relay: RelayManager::new(Arc::new(storage), config),
        client,
    }
}

async fn register(relay: &RelayManager, name: &str) -> User {
    relay
        .accounts()
        .register(NewAccount::new(
            name,
            format!("{}@example.com", name),
            "$2b$04$test-hash",
        ))
        .await
        .expect("registration")
}

/// Status each side currently holds, read straight from storage.
async fn statuses(
    relay: &RelayManager,
    a: Uuid,
    b: Uuid,
) -> (Option<RelationshipStatus>, Option<RelationshipStatus>) {
    let of = |rows: Vec<relay::models::Relationship>, other: Uuid| {
        rows.into_iter()
            .find(|r| r.counterparty == other)
            .map(|r| r.status)
    };
    let a_rows = relay.relationships().list_all(a).await.unwrap();
    let b_rows = relay.relationships().list_all(b).await.unwrap();
    (of(a_rows, b), of(b_rows, a))
}

fn assert_complementary(pair: (Option<RelationshipStatus>, Option<RelationshipStatus>)) {
    use RelationshipStatus::*;
    assert!(
        matches!(
            pair,
            (None, None)
                | (Some(Outgoing), Some(Incoming))
                | (Some(Incoming), Some(Outgoing))
                | (Some(Friend), Some(Friend))
        ),
        "rows are not complementary: {:?}",
        pair
    );
}

async fn insert_row(client: &Surreal<Db>, owner: Uuid, counterparty: Uuid, status: &str) {
    client
        .query("CREATE relationship CONTENT { owner: $owner, counterparty: $counterparty, status: $status }")
        .bind(("owner", owner.to_string()))
        .bind(("counterparty", counterparty.to_string()))
        .bind(("status", status.to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();
}

#[tokio::test]
async fn test_request_auto_accept_then_already_friends() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    let sent = relay.relationships().initiate(alice.id, "bob").await.unwrap();
    assert_eq!(sent.owner, alice.id);
    assert_eq!(sent.counterparty, bob.id);
    assert_eq!(sent.status, RelationshipStatus::Outgoing);
    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        (Some(RelationshipStatus::Outgoing), Some(RelationshipStatus::Incoming))
    );

    let accepted = relay.relationships().initiate(bob.id, "alice").await.unwrap();
    assert_eq!(accepted.owner, bob.id);
    assert_eq!(accepted.status, RelationshipStatus::Friend);
    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        (Some(RelationshipStatus::Friend), Some(RelationshipStatus::Friend))
    );
    assert_eq!(relay.relationships().list_all(alice.id).await.unwrap().len(), 1);
    assert_eq!(relay.relationships().list_all(bob.id).await.unwrap().len(), 1);

    let err = relay
        .relationships()
        .initiate(alice.id, "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::Conflict(ref m) if m == "already friends"));
}

#[tokio::test]
async fn test_unknown_handle_creates_nothing() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;

    let err = relay
        .relationships()
        .initiate(alice.id, "ghost")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::NotFound(_)));
    assert!(relay.relationships().list_all(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_self_request_is_bad_request() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;

    let err = relay
        .relationships()
        .initiate(alice.id, "alice")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::BadRequest(_)));
    assert!(relay.relationships().list_all(alice.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_request_is_rejected() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    relay.relationships().initiate(alice.id, "bob").await.unwrap();
    let err = relay
        .relationships()
        .initiate(alice.id, "bob")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Conflict(ref m) if m == "friend request already sent"));
    assert_complementary(statuses(&relay, alice.id, bob.id).await);
}

#[tokio::test]
async fn test_auto_accept_matches_explicit_accept() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;
    let carol = register(&relay, "carol").await;

    relay.relationships().initiate(alice.id, "bob").await.unwrap();
    relay.relationships().initiate(bob.id, "alice").await.unwrap();

    relay.relationships().initiate(alice.id, "carol").await.unwrap();
    relay.relationships().accept(carol.id, alice.id).await.unwrap();

    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        statuses(&relay, alice.id, carol.id).await
    );
}

#[tokio::test]
async fn test_accept_rules() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    let err = relay.relationships().accept(bob.id, alice.id).await.unwrap_err();
    assert!(matches!(err, RelayError::BadRequest(ref m) if m == "no friend request found"));

    relay.relationships().initiate(alice.id, "bob").await.unwrap();

    let err = relay.relationships().accept(alice.id, bob.id).await.unwrap_err();
    assert!(matches!(err, RelayError::BadRequest(_)));

    let err = relay
        .relationships()
        .accept(bob.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RelayError::NotFound(_)));

    let row = relay.relationships().accept(bob.id, alice.id).await.unwrap();
    assert_eq!(row.status, RelationshipStatus::Friend);

    let err = relay.relationships().accept(bob.id, alice.id).await.unwrap_err();
    assert!(matches!(err, RelayError::Conflict(_)));
}

#[tokio::test]
async fn test_cancel_decline_and_remove() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;
    let engine = relay.relationships();

    engine.initiate(alice.id, "bob").await.unwrap();
    assert_eq!(
        engine.cancel_or_decline(alice.id, bob.id).await.unwrap(),
        RequestWithdrawal::Cancelled
    );
    assert_eq!(statuses(&relay, alice.id, bob.id).await, (None, None));

    engine.initiate(alice.id, "bob").await.unwrap();
    assert_eq!(
        engine.cancel_or_decline(bob.id, alice.id).await.unwrap(),
        RequestWithdrawal::Declined
    );
    assert_eq!(statuses(&relay, alice.id, bob.id).await, (None, None));

    let err = engine.remove_friend(alice.id, bob.id).await.unwrap_err();
    assert!(matches!(err, RelayError::BadRequest(_)));

    engine.initiate(alice.id, "bob").await.unwrap();
    engine.initiate(bob.id, "alice").await.unwrap();

    let err = engine.cancel_or_decline(alice.id, bob.id).await.unwrap_err();
    assert!(matches!(err, RelayError::Conflict(_)));

    engine.remove_friend(alice.id, bob.id).await.unwrap();
    assert_eq!(statuses(&relay, alice.id, bob.id).await, (None, None));

    // A removed friendship can be negotiated again from scratch
    engine.initiate(bob.id, "alice").await.unwrap();
    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        (Some(RelationshipStatus::Incoming), Some(RelationshipStatus::Outgoing))
    );
}

#[tokio::test]
async fn test_missing_mirror_row_is_detected_and_left_untouched() {
    let Harness { relay, client } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    // Bob's outgoing row survives without Alice's incoming mirror
    insert_row(&client, bob.id, alice.id, "outgoing").await;

    let err = relay
        .relationships()
        .initiate(alice.id, "bob")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::InvariantViolation(_)), "{:?}", err);
    assert!(!err.is_retryable());
    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        (None, Some(RelationshipStatus::Outgoing))
    );
}

#[tokio::test]
async fn test_reserved_status_is_an_invariant_violation() {
    let Harness { relay, client } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    insert_row(&client, alice.id, bob.id, "blocked").await;

    let err = relay
        .relationships()
        .initiate(alice.id, "bob")
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::InvariantViolation(_)), "{:?}", err);
    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        (Some(RelationshipStatus::Blocked), None)
    );
}

#[tokio::test]
async fn test_concurrent_requests_create_exactly_one_pair() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    let alice_id = alice.id;
    let attempts = (0..8).map(|_| {
        let relay = relay.clone();
        tokio::spawn(async move { relay.relationships().initiate(alice_id, "bob").await })
    });
    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let successes = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "outcomes: {:?}", outcomes);
    for outcome in outcomes.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(outcome, Err(RelayError::Conflict(_))),
            "unexpected failure: {:?}",
            outcome
        );
    }

    assert_eq!(
        statuses(&relay, alice.id, bob.id).await,
        (Some(RelationshipStatus::Outgoing), Some(RelationshipStatus::Incoming))
    );
}

#[tokio::test]
async fn test_crossed_concurrent_requests_stay_complementary() {
    let Harness { relay, .. } = harness().await;
    let alice = register(&relay, "alice").await;
    let bob = register(&relay, "bob").await;

    let (left, right) = tokio::join!(
        relay.relationships().initiate(alice.id, "bob"),
        relay.relationships().initiate(bob.id, "alice"),
    );

    for outcome in [&left, &right] {
        if let Err(err) = outcome {
            assert!(matches!(err, RelayError::Conflict(_)), "{:?}", err);
        }
    }
    assert!(left.is_ok() || right.is_ok());
    assert_complementary(statuses(&relay, alice.id, bob.id).await);
}

const RACE_ROUNDS: usize = 40;

/// A request that lost a race reports Conflict, or BadRequest when it read
/// the state the winner left behind. Anything else is a defect.
fn assert_lost_race_only<T: std::fmt::Debug>(outcome: &relay::Result<T>) {
    match outcome {
        Ok(_) | Err(RelayError::Conflict(_)) | Err(RelayError::BadRequest(_)) => {}
        Err(other) => panic!("race surfaced as {:?}", other),
    }
}

async fn register_pair(relay: &RelayManager, round: usize) -> (User, User) {
    let alice = register(relay, &format!("alice_{}", round)).await;
    let bob = register(relay, &format!("bob_{}", round)).await;
    (alice, bob)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_accept_racing_cancel_never_loses_a_friendship() {
    let Harness { relay, .. } = harness().await;

    for round in 0..RACE_ROUNDS {
        let (alice, bob) = register_pair(&relay, round).await;
        relay
            .relationships()
            .initiate(alice.id, &bob.username)
            .await
            .unwrap();

        let (alice_id, bob_id) = (alice.id, bob.id);
        let canceller = relay.clone();
        let accepter = relay.clone();
        let (cancelled, accepted) = tokio::join!(
            tokio::spawn(async move {
                canceller.relationships().cancel_or_decline(alice_id, bob_id).await
            }),
            tokio::spawn(async move { accepter.relationships().accept(bob_id, alice_id).await }),
        );
        let (cancelled, accepted) = (cancelled.unwrap(), accepted.unwrap());

        assert_lost_race_only(&cancelled);
        assert_lost_race_only(&accepted);
        assert!(
            !(cancelled.is_ok() && accepted.is_ok()),
            "both won: {:?} / {:?}",
            cancelled,
            accepted
        );

        let pair = statuses(&relay, alice.id, bob.id).await;
        assert_complementary(pair);
        if accepted.is_ok() {
            assert_eq!(
                pair,
                (Some(RelationshipStatus::Friend), Some(RelationshipStatus::Friend))
            );
        }
        if cancelled.is_ok() {
            assert_eq!(pair, (None, None));
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_both_sides_removing_a_friend_at_once() {
    let Harness { relay, .. } = harness().await;

    for round in 0..RACE_ROUNDS {
        let (alice, bob) = register_pair(&relay, round).await;
        relay
            .relationships()
            .initiate(alice.id, &bob.username)
            .await
            .unwrap();
        relay.relationships().accept(bob.id, alice.id).await.unwrap();

        let (alice_id, bob_id) = (alice.id, bob.id);
        let left = relay.clone();
        let right = relay.clone();
        let (first, second) = tokio::join!(
            tokio::spawn(async move { left.relationships().remove_friend(alice_id, bob_id).await }),
            tokio::spawn(async move { right.relationships().remove_friend(bob_id, alice_id).await }),
        );
        let (first, second) = (first.unwrap(), second.unwrap());

        assert_lost_race_only(&first);
        assert_lost_race_only(&second);
        assert!(first.is_ok() || second.is_ok(), "{:?} / {:?}", first, second);
        assert_eq!(statuses(&relay, alice.id, bob.id).await, (None, None));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancel_and_decline_at_once() {
    let Harness { relay, .. } = harness().await;

    for round in 0..RACE_ROUNDS {
        let (alice, bob) = register_pair(&relay, round).await;
        relay
            .relationships()
            .initiate(alice.id, &bob.username)
            .await
            .unwrap();

        let (alice_id, bob_id) = (alice.id, bob.id);
        let sender = relay.clone();
        let recipient = relay.clone();
        let (cancelled, declined) = tokio::join!(
            tokio::spawn(async move {
                sender.relationships().cancel_or_decline(alice_id, bob_id).await
            }),
            tokio::spawn(async move {
                recipient.relationships().cancel_or_decline(bob_id, alice_id).await
            }),
        );
        let (cancelled, declined) = (cancelled.unwrap(), declined.unwrap());

        assert_lost_race_only(&cancelled);
        assert_lost_race_only(&declined);
        assert!(cancelled.is_ok() || declined.is_ok());
        if let Ok(outcome) = &cancelled {
            assert_eq!(*outcome, RequestWithdrawal::Cancelled);
        }
        if let Ok(outcome) = &declined {
            assert_eq!(*outcome, RequestWithdrawal::Declined);
        }
        assert_eq!(statuses(&relay, alice.id, bob.id).await, (None, None));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crossed_request_racing_cancel_stays_complementary() {
    let Harness { relay, .. } = harness().await;

    for round in 0..RACE_ROUNDS {
        let (alice, bob) = register_pair(&relay, round).await;
        relay
            .relationships()
            .initiate(alice.id, &bob.username)
            .await
            .unwrap();

        let (alice_id, bob_id) = (alice.id, bob.id);
        let crosser = relay.clone();
        let canceller = relay.clone();
        let alice_name = alice.username.clone();
        let (crossed, cancelled) = tokio::join!(
            tokio::spawn(async move { crosser.relationships().initiate(bob_id, &alice_name).await }),
            tokio::spawn(async move {
                canceller.relationships().cancel_or_decline(alice_id, bob_id).await
            }),
        );
        let (crossed, cancelled) = (crossed.unwrap(), cancelled.unwrap());

        assert_lost_race_only(&crossed);
        assert_lost_race_only(&cancelled);

        let pair = statuses(&relay, alice.id, bob.id).await;
        assert_complementary(pair);
        // Bob holds whatever his request produced: the auto-accepted
        // friendship, or a fresh request made after the cancel
        if let Ok(row) = &crossed {
            assert_eq!(pair.1, Some(row.status), "cancel outcome: {:?}", cancelled);
        }
    }
}
