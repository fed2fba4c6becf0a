use delta_core::{Change, Request, Tracker};
use delta_sqlite::SqliteTracker;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};

async fn pool() -> SqlitePool {
    // one connection so every query sees the same in-memory database
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap()
}

fn change(file_name: &str) -> Change {
    let (created, name) = delta_core::parse_file_name(file_name);

    Change {
        name,
        file: std::path::Path::new("/migrations").join(file_name),
        path: "/migrations".into(),
        extension: "js".to_owned(),
        created,
        ..Change::default()
    }
}

#[tokio::test]
async fn configure_is_idempotent() {
    let pool = pool().await;
    let tracker = SqliteTracker::new(pool.clone());
    let req = Request::default();

    tracker.configure(&req).await.unwrap();
    tracker.configure(&req).await.unwrap();

    let count: i64 = sqlx::query(
        "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = 'migrations'",
    )
    .fetch_one(&pool)
    .await
    .unwrap()
    .try_get("n")
    .unwrap();

    assert_eq!(count, 1);
}

#[tokio::test]
async fn add_list_last_delete_round_trip() {
    let tracker = SqliteTracker::new(pool().await);
    let req = Request::default();

    let a = change("20240101000000.a.commit.js");
    let b = change("20240102000000.b.commit.js");

    let ids = tracker.add(&[a, b], &req).await.unwrap();
    assert_eq!(ids.len(), 2);

    let log = tracker.list(&req).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].name, "a");
    assert_eq!(log[1].name, "b");
    assert!(log.iter().all(|c| c.applied.is_some()));
    assert!(log.iter().all(|c| c.created.is_some()));

    let last = tracker.last(&req).await.unwrap().unwrap();
    assert_eq!(last.name, "b");

    let removed = tracker.delete(&log[..1], &req).await.unwrap();
    assert_eq!(removed, 1);

    let log = tracker.list(&req).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].name, "b");
}

#[tokio::test]
async fn add_rolls_back_the_whole_batch_on_a_row_error() {
    let tracker = SqliteTracker::new(pool().await);
    let req = Request::default();

    let seeded = change("20240101000000.a.commit.js");
    tracker.add(&[seeded], &req).await.unwrap();

    let mut b = change("20240102000000.b.commit.js");
    let mut c = change("20240103000000.c.commit.js");
    b.id = Some("dup".to_owned());
    c.id = Some("dup".to_owned());

    let err = tracker
        .add(&[b, c], &req)
        .await
        .expect_err("duplicate primary key must fail the batch");
    assert!(err.to_string().contains("sqlx"), "{err}");

    // the batch rolled back; only the seeded row remains
    let log = tracker.list(&req).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].name, "a");
}

#[tokio::test]
async fn delete_ignores_changes_without_ids() {
    let tracker = SqliteTracker::new(pool().await);
    let req = Request::default();

    tracker
        .add(&[change("20240101000000.a.commit.js")], &req)
        .await
        .unwrap();

    let removed = tracker
        .delete(&[change("20240101000000.a.commit.js")], &req)
        .await
        .unwrap();

    assert_eq!(removed, 0);
    assert_eq!(tracker.list(&req).await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_add_is_a_success_with_no_ids() {
    let tracker = SqliteTracker::new(pool().await);
    let req = Request::default();

    let ids = tracker.add(&[], &req).await.unwrap();
    assert!(ids.is_empty());
}

#[tokio::test]
async fn missing_reports_lost_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("20240102000000.b.commit.js"), b"// b\n")
        .await
        .unwrap();

    let tracker = SqliteTracker::new(pool().await);
    let req = Request::default().path(dir.path());

    let mut a = change("20240101000000.a.commit.js");
    let mut b = change("20240102000000.b.commit.js");
    a.file = dir.path().join("20240101000000.a.commit.js");
    a.path = dir.path().to_path_buf();
    b.file = dir.path().join("20240102000000.b.commit.js");
    b.path = dir.path().to_path_buf();

    tracker.add(&[a, b], &req).await.unwrap();

    let missing = tracker.missing(&req).await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].name, "a");
}
