//! The migration change record and filename conventions.
//!
//! A [`Change`] is the central value of the engine: a migration artifact
//! discovered on disk, a row of the applied log, or both. Migration file
//! names follow `<YYYYMMDDhhmmss>.<name>.commit.<ext>` (with a paired
//! `.rollback.` artifact); the timestamp prefix orders changes without
//! touching the filesystem metadata.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp layout embedded in migration file names.
pub const CREATED_FORMAT: &str = "%Y%m%d%H%M%S";

/// Marker segment of a commit artifact file name.
pub const COMMIT_SEGMENT: &str = ".commit.";

/// Marker segment of a rollback artifact file name.
pub const ROLLBACK_SEGMENT: &str = ".rollback.";

/// Execution strategy of a change.
///
/// Absent kinds deserialize to [`ChangeKind::Module`], the only kind the
/// module-loader runner accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    #[default]
    Module,
    Script,
    Data,
    Schema,
    Other,
}

/// A single migration unit.
///
/// Born from a filesystem scan or hydrated from the applied log. Two
/// changes are equal when their (`file`, `name`) pair matches, which is
/// the dedup rule of the applied log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Change {
    /// Stable identifier, derived from the filename timestamp when present.
    pub id: Option<String>,
    /// Logical name: the file name without timestamp prefix and extension.
    pub name: String,
    /// Path to the migration artifact.
    pub file: PathBuf,
    /// Containing directory.
    pub path: PathBuf,
    /// File extension without the leading dot.
    pub extension: String,
    #[serde(default)]
    pub kind: ChangeKind,
    pub owner: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub description: Option<String>,
    /// Loaded artifact body, populated on demand by `Runner::content`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Timestamp parsed from the filename prefix, or the file birth time.
    pub created: Option<DateTime<Utc>>,
    /// Stamped when the change is persisted as applied.
    pub applied: Option<DateTime<Utc>>,
    /// Correlation id of the invocation that produced this record.
    pub flow: Option<String>,
}

impl PartialEq for Change {
    fn eq(&self, other: &Self) -> bool {
        self.file == other.file && self.name == other.name
    }
}

impl Change {
    /// File name of the artifact, for human display.
    pub fn basename(&self) -> String {
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Appends tags not already present.
    pub fn merge_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }
}

/// Splits a migration file name into its derivable parts.
///
/// `20240101120000.addUsers.commit.js` parses to the timestamp
/// `2024-01-01T12:00:00Z` and the name `addUsers`. A file name without a
/// parseable timestamp prefix keeps its whole stem as the name and
/// carries no `created`.
pub fn parse_file_name(file_name: &str) -> (Option<DateTime<Utc>>, String) {
    let mut segments = file_name.split('.');

    if let (Some(first), Some(second)) = (segments.next(), segments.next()) {
        if let Ok(naive) = NaiveDateTime::parse_from_str(first, CREATED_FORMAT) {
            return (Some(naive.and_utc()), second.to_owned());
        }
    }

    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file_name,
    };

    (None, stem.to_owned())
}

/// Derives the rollback artifact path paired with a commit artifact.
pub fn rollback_artifact(file: &Path) -> Option<PathBuf> {
    let name = file.file_name()?.to_str()?;

    if !name.contains(COMMIT_SEGMENT) {
        return None;
    }

    Some(file.with_file_name(name.replace(COMMIT_SEGMENT, ROLLBACK_SEGMENT)))
}
