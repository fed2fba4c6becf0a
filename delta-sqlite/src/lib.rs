//! SQLite backend for the delta change-management engine.
//!
//! A single-table relational rendition of the applied log, for targets
//! where the migration history should live next to the data it
//! describes.
//!
//! ```rust,ignore
//! use delta_sqlite::SqliteTracker;
//! use sqlx::sqlite::SqlitePoolOptions;
//!
//! let pool = SqlitePoolOptions::new().connect("sqlite://delta.db").await?;
//! let tracker = SqliteTracker::new(pool);
//! ```

mod error;
mod schema;
mod tracker;

pub use error::{Result, SqliteError};
pub use tracker::SqliteTracker;
