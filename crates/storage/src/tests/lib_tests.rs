use super::*;
use std::time::Duration;

async fn count_rows(storage: &Storage) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM counters")
        .fetch_one(&storage.pool)
        .await
        .expect("row count")
}

#[tokio::test]
async fn fetch_reports_absence_until_first_access() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert!(storage.fetch().await.expect("fetch").is_none());
}

#[tokio::test]
async fn get_or_create_seeds_a_single_zero_record() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let counter = storage.get_or_create().await.expect("get or create");
    assert_eq!(counter.value, 0);

    let fetched = storage
        .fetch()
        .await
        .expect("fetch")
        .expect("record exists");
    assert_eq!(fetched.id, counter.id);
    assert_eq!(count_rows(&storage).await, 1);
}

#[tokio::test]
async fn get_or_create_is_idempotent_between_updates() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let first = storage.get_or_create().await.expect("first");
    let second = storage.get_or_create().await.expect("second");
    assert_eq!(first, second);
    assert_eq!(count_rows(&storage).await, 1);
}

#[tokio::test]
async fn apply_seeds_then_increments_on_empty_store() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let counter = storage.apply(Operation::Increment).await.expect("apply");
    assert_eq!(counter.value, 1);
    assert_eq!(count_rows(&storage).await, 1);
}

#[tokio::test]
async fn apply_runs_full_operation_sequence() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let first = storage.apply(Operation::Increment).await.expect("inc");
    assert_eq!(first.value, 1);
    let second = storage.apply(Operation::Increment).await.expect("inc");
    assert_eq!(second.value, 2);
    let third = storage.apply(Operation::Decrement).await.expect("dec");
    assert_eq!(third.value, 1);
    let fourth = storage.apply(Operation::Reset).await.expect("reset");
    assert_eq!(fourth.value, 0);

    assert_eq!(first.id, fourth.id);
    assert_eq!(count_rows(&storage).await, 1);
}

#[tokio::test]
async fn apply_resets_preseeded_value_to_zero() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let seeded = storage.create(42).await.expect("seed");

    let counter = storage.apply(Operation::Reset).await.expect("reset");
    assert_eq!(counter.id, seeded.id);
    assert_eq!(counter.value, 0);
}

#[tokio::test]
async fn decrement_below_zero_is_permitted() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let counter = storage.apply(Operation::Decrement).await.expect("dec");
    assert_eq!(counter.value, -1);
    let counter = storage.apply(Operation::Decrement).await.expect("dec");
    assert_eq!(counter.value, -2);
}

#[tokio::test]
async fn save_overwrites_value_in_place() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let counter = storage.create(5).await.expect("create");

    let saved = storage.save(counter.id, 9).await.expect("save");
    assert_eq!(saved.id, counter.id);
    assert_eq!(saved.value, 9);
}

#[tokio::test]
async fn save_reports_not_found_for_missing_id() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let err = storage
        .save(CounterId(999), 1)
        .await
        .expect_err("should fail");
    assert!(matches!(err, StoreError::NotFound { id: 999 }));
}

#[tokio::test]
async fn mutations_refresh_timestamp_monotonically() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let seeded = storage.get_or_create().await.expect("seed");

    tokio::time::sleep(Duration::from_millis(10)).await;
    let updated = storage.apply(Operation::Increment).await.expect("apply");
    assert!(updated.updated_at > seeded.updated_at);

    tokio::time::sleep(Duration::from_millis(10)).await;
    let saved = storage.save(updated.id, 7).await.expect("save");
    assert!(saved.updated_at > updated.updated_at);
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let suffix = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let temp_root = std::env::temp_dir().join(format!("counter_storage_test_{suffix}"));
    let db_path = temp_root.join("nested").join("counter.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    std::fs::remove_dir_all(temp_root).expect("cleanup");
}
