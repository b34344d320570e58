//! PostgreSQL-backed store tests.
//!
//! These need a live database: set `DATABASE_URL` and run
//! `cargo test -p parking-db -- --ignored`.

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use parking_core::error::CoreError;
use parking_core::lot::ParkingConfig;
use parking_core::store::{CheckOutCredentials, NewOccupancy, ParkingStore};
use parking_db::PgParkingStore;
use sqlx::PgPool;

async fn seeded(pool: PgPool) -> PgParkingStore {
    let store = PgParkingStore::new(pool);
    store
        .seed_spots(&ParkingConfig::default().plan_spots())
        .await
        .unwrap();
    store
}

fn occupancy(name: &str, pin: &str) -> NewOccupancy {
    NewOccupancy {
        occupant_name: name.into(),
        pin: pin.into(),
        entry_time: Utc::now(),
    }
}

/// Flag/ledger agreement and the one-active-row rule, checked in SQL.
async fn assert_invariants(pool: &PgPool) {
    let (disagreeing,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM spots s \
         WHERE s.occupied <> EXISTS ( \
             SELECT 1 FROM occupancies o WHERE o.spot_id = s.id AND o.active)",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    assert_eq!(disagreeing, 0, "occupied flag disagrees with the ledger");

    let (doubled,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM ( \
             SELECT spot_id FROM occupancies WHERE active \
             GROUP BY spot_id HAVING COUNT(*) > 1) d",
    )
    .fetch_one(pool)
    .await
    .unwrap();
    assert_eq!(doubled, 0, "a spot has more than one active occupancy");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn seeding_is_idempotent(pool: PgPool) {
    let store = seeded(pool.clone()).await;
    let tokens: Vec<(String,)> = sqlx::query_as("SELECT link_token FROM spots ORDER BY number")
        .fetch_all(&pool)
        .await
        .unwrap();

    let created = store
        .seed_spots(&ParkingConfig::default().plan_spots())
        .await
        .unwrap();
    assert_eq!(created, 0);

    let again: Vec<(String,)> = sqlx::query_as("SELECT link_token FROM spots ORDER BY number")
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(tokens, again);
    assert_eq!(store.list_spots().await.unwrap().len(), 50);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn check_in_and_out_keep_flag_in_step(pool: PgPool) {
    let store = seeded(pool.clone()).await;

    let record = store.check_in(5, occupancy("Ana", "4321")).await.unwrap();
    assert!(record.active);
    assert_eq!(record.spot_number, 5);
    assert_invariants(&pool).await;

    let view = store.find_spot(5).await.unwrap().unwrap();
    assert!(view.occupied);
    assert_eq!(view.occupant_name.as_deref(), Some("Ana"));

    let creds = CheckOutCredentials {
        occupant_name: "ana",
        pin: Some("4321"),
    };
    let closed = store.check_out(5, creds, Utc::now()).await.unwrap();
    assert!(!closed.active);
    assert!(closed.exit_time.is_some());
    assert!(!store.find_spot(5).await.unwrap().unwrap().occupied);
    assert_invariants(&pool).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn rejected_check_out_leaves_spot_occupied(pool: PgPool) {
    let store = seeded(pool.clone()).await;
    store.check_in(5, occupancy("Ana", "4321")).await.unwrap();

    let wrong_pin = CheckOutCredentials {
        occupant_name: "Ana",
        pin: Some("0000"),
    };
    assert_matches!(
        store.check_out(5, wrong_pin, Utc::now()).await,
        Err(CoreError::Unauthorized(_))
    );

    let wrong_name = CheckOutCredentials {
        occupant_name: "Carlos",
        pin: Some("4321"),
    };
    assert_matches!(
        store.check_out(5, wrong_name, Utc::now()).await,
        Err(CoreError::Unauthorized(_))
    );

    assert!(store.find_spot(5).await.unwrap().unwrap().occupied);
    assert_invariants(&pool).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn concurrent_check_ins_admit_exactly_one(pool: PgPool) {
    let store = Arc::new(seeded(pool.clone()).await);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .check_in(7, occupancy(&format!("driver-{i}"), "1234"))
                    .await
            })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(CoreError::Conflict(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(successes, 1);
    assert_invariants(&pool).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn expiry_closes_only_stale_rows(pool: PgPool) {
    let store = seeded(pool.clone()).await;
    let now = Utc::now();

    let mut stale = occupancy("Ana", "1111");
    stale.entry_time = now - Duration::hours(13);
    store.check_in(5, stale).await.unwrap();

    let mut fresh = occupancy("Bia", "2222");
    fresh.entry_time = now - Duration::hours(1);
    store.check_in(6, fresh).await.unwrap();

    let closed = store
        .expire_before(now - Duration::hours(12), now)
        .await
        .unwrap();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].spot_number, 5);

    assert!(!store.find_spot(5).await.unwrap().unwrap().occupied);
    assert!(store.find_spot(6).await.unwrap().unwrap().occupied);

    // Nothing left to expire; the closed row is not closed again.
    let again = store
        .expire_before(now - Duration::hours(12), now + Duration::minutes(5))
        .await
        .unwrap();
    assert!(again.is_empty());
    assert_invariants(&pool).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires a PostgreSQL DATABASE_URL"]
async fn history_and_status(pool: PgPool) {
    let store = seeded(pool.clone()).await;
    let now = Utc::now();
    for (offset, number) in [(30, 1), (10, 2), (20, 3)] {
        let mut input = occupancy("Ana", "1234");
        input.entry_time = now - Duration::minutes(offset);
        store.check_in(number, input).await.unwrap();
    }

    let status = store.lot_status().await.unwrap();
    assert_eq!((status.total, status.free, status.occupied), (50, 47, 3));

    let numbers: Vec<_> = store
        .history(100)
        .await
        .unwrap()
        .into_iter()
        .map(|o| o.spot_number)
        .collect();
    assert_eq!(numbers, [2, 3, 1]);
}
