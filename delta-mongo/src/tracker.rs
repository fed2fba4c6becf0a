//! Applied log persisted in a MongoDB collection.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use delta_core::{scan, Change, Request, Tracker};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, DateTime as BsonDateTime, Document},
    options::{FindOneOptions, FindOptions, IndexOptions, InsertManyOptions},
    Collection, Database, IndexModel,
};

use crate::document::{from_document, rendered_id, to_document};

/// Default collection holding the applied log.
pub const DEFAULT_COLLECTION: &str = "delta_migrations";

#[derive(Debug, Clone)]
pub struct MongoTrackerConfig {
    pub collection: String,
}

impl Default for MongoTrackerConfig {
    fn default() -> Self {
        Self {
            collection: DEFAULT_COLLECTION.to_owned(),
        }
    }
}

/// Tracker backed by a MongoDB collection.
///
/// `configure` creates the collection on first use with a descending
/// index on `created` and an ascending one on `owner`.
pub struct MongoTracker {
    db: Database,
    config: MongoTrackerConfig,
    configured: AtomicBool,
}

impl MongoTracker {
    pub fn new(db: Database) -> Self {
        Self::with_config(db, MongoTrackerConfig::default())
    }

    pub fn with_config(db: Database, config: MongoTrackerConfig) -> Self {
        Self {
            db,
            config,
            configured: AtomicBool::new(false),
        }
    }

    fn collection_name(&self, req: &Request) -> String {
        req.param("collection")
            .map(str::to_owned)
            .unwrap_or_else(|| self.config.collection.clone())
    }

    fn collection(&self, req: &Request) -> Collection<Document> {
        self.db.collection(&self.collection_name(req))
    }
}

#[async_trait]
impl Tracker for MongoTracker {
    async fn configure(&self, req: &Request) -> anyhow::Result<()> {
        if self.configured.load(Ordering::Acquire) {
            return Ok(());
        }

        let name = self.collection_name(req);
        let existing = self.db.list_collection_names(doc! { "name": &name }).await?;

        if existing.is_empty() {
            self.db.create_collection(&name, None).await?;

            let collection = self.db.collection::<Document>(&name);
            collection
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "created": -1 })
                        .options(IndexOptions::builder().name("created_desc".to_owned()).build())
                        .build(),
                    None,
                )
                .await?;
            collection
                .create_index(
                    IndexModel::builder()
                        .keys(doc! { "owner": 1 })
                        .options(IndexOptions::builder().name("owner_asc".to_owned()).build())
                        .build(),
                    None,
                )
                .await?;

            tracing::info!(flow = %req.flow, collection = %name, "created applied-log collection");
        }

        self.configured.store(true, Ordering::Release);

        Ok(())
    }

    async fn add(&self, changes: &[Change], req: &Request) -> anyhow::Result<Vec<String>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        self.configure(req).await?;

        let now = Utc::now();
        let docs: Vec<Document> = changes.iter().map(|c| to_document(c, now)).collect();

        let result = self
            .collection(req)
            .insert_many(
                docs,
                InsertManyOptions::builder().ordered(true).build(),
            )
            .await?;

        let mut inserted: Vec<(usize, String)> = result
            .inserted_ids
            .iter()
            .map(|(index, id)| (*index, rendered_id(id)))
            .collect();
        inserted.sort_by_key(|(index, _)| *index);

        Ok(inserted.into_iter().map(|(_, id)| id).collect())
    }

    async fn delete(&self, changes: &[Change], req: &Request) -> anyhow::Result<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        self.configure(req).await?;

        let pairs: Vec<Document> = changes
            .iter()
            .map(|change| {
                doc! {
                    "file": change.file.to_string_lossy().as_ref(),
                    "name": &change.name,
                }
            })
            .collect();

        let result = self
            .collection(req)
            .delete_many(doc! { "$or": pairs }, None)
            .await?;

        Ok(result.deleted_count)
    }

    async fn list(&self, req: &Request) -> anyhow::Result<Vec<Change>> {
        self.configure(req).await?;

        let options = FindOptions::builder()
            .sort(doc! { "created": 1 })
            .projection(doc! {
                "name": 1,
                "file": 1,
                "path": 1,
                "extension": 1,
                "created": 1,
                "applied": 1,
            })
            .build();

        let mut cursor = self.collection(req).find(None, options).await?;
        let mut changes = Vec::new();

        while let Some(doc) = cursor.try_next().await? {
            changes.push(from_document(&doc)?);
        }

        Ok(changes)
    }

    async fn last(&self, req: &Request) -> anyhow::Result<Option<Change>> {
        self.configure(req).await?;

        let options = FindOneOptions::builder().sort(doc! { "created": -1 }).build();
        let doc = self.collection(req).find_one(None, options).await?;

        Ok(match doc {
            Some(doc) => Some(from_document(&doc)?),
            None => None,
        })
    }

    async fn missing(&self, req: &Request) -> anyhow::Result<Vec<Change>> {
        let last = match self.last(req).await? {
            Some(last) => last,
            None => return Ok(Vec::new()),
        };

        let outcome = scan::scan(
            req,
            |extension| self.accepts_extension(extension, req),
            |_| true,
        )
        .await?;

        let mut query = Document::new();

        if let Some(created) = last.created {
            query.insert("created", doc! { "$lte": BsonDateTime::from_chrono(created) });
        }

        let pairs: Vec<Document> = outcome
            .accepted
            .iter()
            .chain(outcome.rejected.iter())
            .map(|change| {
                doc! {
                    "file": change.file.to_string_lossy().as_ref(),
                    "name": &change.name,
                }
            })
            .collect();

        if !pairs.is_empty() {
            query.insert("$nor", pairs);
        }

        let options = FindOptions::builder().sort(doc! { "created": 1 }).build();
        let mut cursor = self.collection(req).find(query, options).await?;
        let mut missing = Vec::new();

        while let Some(doc) = cursor.try_next().await? {
            missing.push(from_document(&doc)?);
        }

        Ok(missing)
    }

    /// Module artifacts are always eligible regardless of the requested
    /// extension filter.
    fn accepts_extension(&self, extension: &str, req: &Request) -> bool {
        matches!(extension, "js" | "cjs" | "mjs")
            || req
                .extension
                .as_deref()
                .map_or(true, |want| want.eq_ignore_ascii_case(extension))
    }
}
