//! In-memory applied log.
//!
//! Backs the test suites and works as a real tracker for ephemeral
//! targets. The log lives in process memory and dies with it.

use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use ulid::Ulid;

use crate::{
    change::Change,
    request::Request,
    scan::{self, sort_by_created},
    tracker::Tracker,
};

#[derive(Debug, Clone, Default)]
pub struct MemoryTracker(Arc<RwLock<Vec<Change>>>);

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Tracker for MemoryTracker {
    async fn configure(&self, _req: &Request) -> anyhow::Result<()> {
        Ok(())
    }

    async fn add(&self, changes: &[Change], _req: &Request) -> anyhow::Result<Vec<String>> {
        if changes.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut log = self.0.write();
        let mut ids = Vec::with_capacity(changes.len());

        for change in changes {
            let mut entry = change.clone();
            entry.applied.get_or_insert(now);
            let id = entry
                .id
                .get_or_insert_with(|| Ulid::new().to_string())
                .clone();

            log.push(entry);
            ids.push(id);
        }

        Ok(ids)
    }

    async fn delete(&self, changes: &[Change], _req: &Request) -> anyhow::Result<u64> {
        let mut log = self.0.write();
        let before = log.len();

        log.retain(|entry| !changes.iter().any(|change| change == entry));

        Ok((before - log.len()) as u64)
    }

    async fn list(&self, _req: &Request) -> anyhow::Result<Vec<Change>> {
        let mut log = self.0.read().clone();
        sort_by_created(&mut log);

        Ok(log)
    }

    async fn last(&self, req: &Request) -> anyhow::Result<Option<Change>> {
        Ok(self.list(req).await?.pop())
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

        let on_disk: HashSet<(std::path::PathBuf, String)> = outcome
            .accepted
            .iter()
            .chain(outcome.rejected.iter())
            .map(|change| (change.file.clone(), change.name.clone()))
            .collect();

        let missing = self
            .0
            .read()
            .iter()
            .filter(|entry| entry.created <= last.created)
            .filter(|entry| !on_disk.contains(&(entry.file.clone(), entry.name.clone())))
            .cloned()
            .collect();

        Ok(missing)
    }
}
