//! Filesystem discovery of migration artifacts.
//!
//! The scan runs once per tracker operation; nothing is cached between
//! calls. Directory-level read failures are not fatal: they degrade to an
//! empty scan with a warning so that a missing migrations directory makes
//! commit a no-op instead of an error.

use chrono::{DateTime, Utc};

use crate::{change::parse_file_name, error::Result, Change, Request};

/// The two bags produced by one scan pass.
///
/// `accepted` holds the changes the per-change predicate kept, ordered by
/// `created` ascending with ties broken by file name. `rejected` holds the
/// entries the predicate turned away; callers give the bag its meaning
/// (the tracker's `info` reads it as already-applied-on-disk).
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub accepted: Vec<Change>,
    pub rejected: Vec<Change>,
}

/// Scans `req.path` for migration artifacts.
///
/// `accepts_extension` filters entries before a [`Change`] is built, so
/// turned-away extensions appear in neither bag. `predicate` routes each
/// built change into `accepted` or `rejected`, reusing the single pass
/// for the set algebra of `info`.
pub async fn scan<E, P>(req: &Request, accepts_extension: E, predicate: P) -> Result<ScanOutcome>
where
    E: Fn(&str) -> bool,
    P: Fn(&Change) -> bool,
{
    let root = req.root();
    let mut outcome = ScanOutcome::default();

    let mut entries = match tokio::fs::read_dir(&root).await {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(
                flow = %req.flow,
                path = %root.display(),
                %err,
                "migration directory is not readable, scan yields nothing"
            );
            return Ok(outcome);
        }
    };

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                tracing::warn!(flow = %req.flow, path = %root.display(), %err, "directory read aborted");
                break;
            }
        };

        let file_name = entry.file_name().to_string_lossy().into_owned();

        let extension = match file_name.rsplit_once('.') {
            Some((_, extension)) => extension.to_owned(),
            None => String::new(),
        };

        if !accepts_extension(&extension) {
            continue;
        }

        let (mut created, name) = parse_file_name(&file_name);

        if created.is_none() || req.stat {
            match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => {
                    if created.is_none() {
                        created = metadata.created().ok().map(DateTime::<Utc>::from);
                    }
                }
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(flow = %req.flow, file = %file_name, %err, "stat failed, entry skipped");
                    continue;
                }
            }
        } else {
            match entry.file_type().await {
                Ok(file_type) if file_type.is_file() => {}
                _ => continue,
            }
        }

        let change = Change {
            name,
            file: entry.path(),
            path: root.clone(),
            extension,
            created,
            flow: Some(req.flow.clone()),
            ..Change::default()
        };

        if predicate(&change) {
            outcome.accepted.push(change);
        } else {
            outcome.rejected.push(change);
        }
    }

    sort_by_created(&mut outcome.accepted);
    sort_by_created(&mut outcome.rejected);

    Ok(outcome)
}

/// Orders changes by `created` ascending, ties broken by file name.
pub fn sort_by_created(changes: &mut [Change]) {
    changes.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.file.cmp(&b.file)));
}
