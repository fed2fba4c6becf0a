//! MongoDB backend for the delta change-management engine.
//!
//! Ships the document-store [`MongoTracker`] (applied log in a
//! collection, default `delta_migrations`) and the module-loader
//! [`MongoRunner`] (one session + transaction per change, hooks invoked
//! with a [`MongoTool`]).
//!
//! ```rust,ignore
//! use delta_mongo::{MongoRunner, MongoTracker};
//!
//! let client = mongodb::Client::with_uri_str(&uri).await?;
//! let db = client.database("app");
//!
//! let tracker = MongoTracker::new(db.clone());
//! let runner = MongoRunner::new(client, db, migrations);
//! ```

mod document;
mod error;
mod runner;
mod tool;
mod tracker;

pub use error::{MongoError, Result};
pub use runner::{MongoRunner, MongoRunnerConfig};
pub use tool::MongoTool;
pub use tracker::{MongoTracker, MongoTrackerConfig, DEFAULT_COLLECTION};
