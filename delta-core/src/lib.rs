//! Core types and traits for the delta change-management engine.
//!
//! This crate defines the vocabulary shared by every backend: the
//! [`Change`] record and its filename conventions, the [`Request`] and
//! [`Filter`] records scoping one invocation, the [`Tracker`] trait over
//! the durable applied log with its provided set algebra, the [`Runner`]
//! trait executing a single change, the closed [`Migration`] interface
//! user-authored migrations implement, and the [`Registry`] resolving
//! named driver instances.
//!
//! # Trackers and the set algebra
//!
//! A tracker owns the applied log. Its provided operations compose one
//! filesystem scan with the log into four disjoint, `created`-ordered
//! sets:
//!
//! - `available` — on disk, newer than the last applied change, passing
//!   the request filter;
//! - `applied` — on disk but already covered by the log;
//! - `ignored` — dropped by the filter's take-limit or window;
//! - `missing` — in the log but gone from disk.
//!
//! # Runners
//!
//! A runner executes one change against the target backend and reports a
//! message. Batch semantics (stop on first failure, persist the valid
//! prefix) belong to the service driving the pair, not to the runner.
//!
//! ```rust,ignore
//! use delta_core::{MemoryTracker, Request, Tracker};
//!
//! let tracker = MemoryTracker::new();
//! let req = Request::default().path("./migrations").extension("js");
//!
//! let pending = tracker.available(&req).await?;
//! let ids = tracker.add(&pending, &req).await?;
//! ```

mod change;
mod error;
mod filter;
mod memory;
mod migration;
mod registry;
mod request;
mod runner;
pub mod scaffold;
pub mod scan;
mod tracker;

pub use change::{
    parse_file_name, rollback_artifact, Change, ChangeKind, COMMIT_SEGMENT, CREATED_FORMAT,
    ROLLBACK_SEGMENT,
};
pub use error::{CoreError, Result};
pub use filter::{Filter, FilterKind};
pub use memory::MemoryTracker;
pub use migration::{module_key, Migration, DEFAULT_KEY_PREFIX};
pub use registry::Registry;
pub use request::{Action, Request};
pub use runner::{Direction, Runner};
pub use tracker::{StatusReport, Tracker, TrackerInfo};
