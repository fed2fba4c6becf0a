//! Module-loader runner: resolves a registered migration by key and runs
//! its hook inside one session transaction per change.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use async_trait::async_trait;
use delta_core::{
    module_key, Change, ChangeKind, CoreError, Direction, Migration, Registry, Request, Runner,
    DEFAULT_KEY_PREFIX,
};
use mongodb::{Client, Database};

use crate::{tool::MongoTool, tracker::DEFAULT_COLLECTION};

#[derive(Debug, Clone)]
pub struct MongoRunnerConfig {
    /// Registry key prefix for migration modules.
    pub key_prefix: String,
    /// Collection exposed through the tool, unless overridden per request.
    pub collection: String,
}

impl Default for MongoRunnerConfig {
    fn default() -> Self {
        Self {
            key_prefix: DEFAULT_KEY_PREFIX.to_owned(),
            collection: DEFAULT_COLLECTION.to_owned(),
        }
    }
}

pub struct MongoRunner {
    client: Client,
    db: Database,
    registry: Arc<Registry<dyn Migration<MongoTool>>>,
    config: MongoRunnerConfig,
    configured: AtomicBool,
}

impl MongoRunner {
    pub fn new(
        client: Client,
        db: Database,
        registry: Arc<Registry<dyn Migration<MongoTool>>>,
    ) -> Self {
        Self::with_config(client, db, registry, MongoRunnerConfig::default())
    }

    pub fn with_config(
        client: Client,
        db: Database,
        registry: Arc<Registry<dyn Migration<MongoTool>>>,
        config: MongoRunnerConfig,
    ) -> Self {
        Self {
            client,
            db,
            registry,
            config,
            configured: AtomicBool::new(false),
        }
    }

    async fn execute(
        &self,
        change: &mut Change,
        req: &Request,
        direction: Direction,
    ) -> anyhow::Result<String> {
        if change.kind != ChangeKind::Module {
            return Err(CoreError::UnsupportedKind.into());
        }

        self.configure(req).await?;

        let prefix = req.prefix.as_deref().unwrap_or(self.config.key_prefix.as_str());
        let key = module_key(Some(prefix), &change.name);
        let migration = self.registry.get(&key)?;

        let collection = req
            .param("collection")
            .unwrap_or(self.config.collection.as_str())
            .to_owned();

        let mut session = self.client.start_session(None).await?;
        session.start_transaction(None).await?;

        let mut tool = MongoTool {
            db: self.db.clone(),
            collection: self.db.collection(&collection),
            session,
        };

        let hook = match direction {
            Direction::Commit => migration.commit(&mut tool).await,
            Direction::Rollback => migration.rollback(&mut tool).await,
        };

        // the session returns to the pool when the tool drops
        match hook {
            Ok(message) => {
                tool.session.commit_transaction().await?;

                if let Some(description) = message
                    .clone()
                    .or_else(|| migration.description().map(str::to_owned))
                {
                    change.description = Some(description);
                }
                change.merge_tags(migration.tags());

                tracing::info!(
                    flow = %req.flow,
                    name = %change.name,
                    hook = direction.as_str(),
                    "migration hook committed"
                );

                Ok(message.unwrap_or_else(|| direction.message().to_owned()))
            }
            Err(err) => {
                if let Err(abort) = tool.session.abort_transaction().await {
                    tracing::warn!(
                        flow = %req.flow,
                        name = %change.name,
                        %abort,
                        "transaction abort failed"
                    );
                }

                Err(err)
            }
        }
    }
}

#[async_trait]
impl Runner for MongoRunner {
    async fn configure(&self, req: &Request) -> anyhow::Result<()> {
        if !self.configured.swap(true, Ordering::AcqRel) {
            tracing::debug!(flow = %req.flow, db = %self.db.name(), "module runner ready");
        }

        Ok(())
    }

    async fn commit(&self, change: &mut Change, req: &Request) -> anyhow::Result<String> {
        self.execute(change, req, Direction::Commit).await
    }

    async fn rollback(&self, change: &mut Change, req: &Request) -> anyhow::Result<String> {
        self.execute(change, req, Direction::Rollback).await
    }
}
