//! Integration tests against a live MongoDB.
//!
//! Run with `cargo test -p delta-mongo -- --ignored` and a reachable
//! server in `MDB_URI` (default `mongodb://localhost:27017`).

use delta_core::{Change, Request, Tracker};
use delta_mongo::{MongoTracker, MongoTrackerConfig};
use mongodb::Database;

async fn database(name: &str) -> Database {
    let uri =
        std::env::var("MDB_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_owned());
    let client = mongodb::Client::with_uri_str(&uri).await.unwrap();
    let db = client.database(name);
    db.drop(None).await.unwrap();

    db
}

fn change(dir: &std::path::Path, file_name: &str) -> Change {
    let (created, name) = delta_core::parse_file_name(file_name);

    Change {
        name,
        file: dir.join(file_name),
        path: dir.to_path_buf(),
        extension: "js".to_owned(),
        created,
        ..Change::default()
    }
}

#[tokio::test]
#[ignore = "requires a running mongod"]
async fn configure_is_idempotent() {
    let db = database("delta_configure").await;
    let tracker = MongoTracker::new(db.clone());
    let req = Request::default();

    tracker.configure(&req).await.unwrap();
    tracker.configure(&req).await.unwrap();

    let collections = db.list_collection_names(None).await.unwrap();
    assert_eq!(collections, vec!["delta_migrations".to_owned()]);
}

#[tokio::test]
#[ignore = "requires a running mongod"]
async fn add_list_last_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = database("delta_round_trip").await;
    let tracker = MongoTracker::with_config(
        db,
        MongoTrackerConfig {
            collection: "changelog".to_owned(),
        },
    );
    let req = Request::default().path(dir.path());

    let a = change(dir.path(), "20240101000000.a.commit.js");
    let b = change(dir.path(), "20240102000000.b.commit.js");

    let ids = tracker.add(&[a.clone(), b.clone()], &req).await.unwrap();
    assert_eq!(ids.len(), 2);

    let log = tracker.list(&req).await.unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[0].name, "a");
    assert_eq!(log[1].name, "b");
    assert!(log.iter().all(|c| c.applied.is_some()));

    let last = tracker.last(&req).await.unwrap().unwrap();
    assert_eq!(last.name, "b");

    let removed = tracker.delete(&[a], &req).await.unwrap();
    assert_eq!(removed, 1);

    let log = tracker.list(&req).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].name, "b");
}

#[tokio::test]
#[ignore = "requires a running mongod"]
async fn missing_reports_lost_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    tokio::fs::write(dir.path().join("20240102000000.b.commit.js"), b"// b\n")
        .await
        .unwrap();

    let db = database("delta_missing").await;
    let tracker = MongoTracker::new(db);
    let req = Request::default().path(dir.path());

    tracker
        .add(
            &[
                change(dir.path(), "20240101000000.a.commit.js"),
                change(dir.path(), "20240102000000.b.commit.js"),
            ],
            &req,
        )
        .await
        .unwrap();

    let missing = tracker.missing(&req).await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].name, "a");

    let info = tracker.info(&req).await.unwrap();
    assert!(info.available.is_empty());
    assert_eq!(info.missing.len(), 1);
}
