//! delta — change-management engine for document databases.
//!
//! Discovers migration artifacts on the filesystem, tracks which have
//! been applied, and applies or rolls them back in deterministic order
//! with per-migration transactional boundaries where the backend
//! supports them.
//!
//! The engine is the coordinated pair of a tracker (durable applied log
//! and the set algebra over applied/available/missing/ignored) and a
//! runner (executor of individual migrations), sequenced by the
//! [`MigrationService`].
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use delta::{Action, MigrationService, Request};
//! use delta::mongo::{MongoRunner, MongoTracker};
//!
//! let service = MigrationService::new();
//! service.register_tracker("mdb", Arc::new(MongoTracker::new(db.clone())));
//! service.register_runner("mdb", Arc::new(MongoRunner::new(client, db, migrations)));
//!
//! let req = Request::new(Action::Commit)
//!     .path("./migrations")
//!     .extension("js");
//!
//! let report = service.commit(&req).await?;
//! for change in &report.changes {
//!     println!("applied {}", change.name);
//! }
//! ```

mod service;

pub use delta_core::*;
pub use service::{BatchReport, Halt, MigrationService, ServiceConfig};

#[cfg(feature = "mongo")]
pub use delta_mongo as mongo;

#[cfg(feature = "shell")]
pub use delta_shell as shell;

#[cfg(feature = "sqlite")]
pub use delta_sqlite as sqlite;
