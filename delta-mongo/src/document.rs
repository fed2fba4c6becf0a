//! Conversion between [`Change`] and the persisted document shape.
//!
//! The applied log stores `{name, file, path, extension, created,
//! applied, description?, tags?, owner?}`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use delta_core::Change;
use mongodb::bson::{doc, Bson, DateTime as BsonDateTime, Document};

use crate::error::Result;

pub(crate) fn to_document(change: &Change, fallback_applied: DateTime<Utc>) -> Document {
    let mut doc = doc! {
        "name": &change.name,
        "file": change.file.to_string_lossy().as_ref(),
        "path": change.path.to_string_lossy().as_ref(),
        "extension": &change.extension,
    };

    if let Some(created) = change.created {
        doc.insert("created", BsonDateTime::from_chrono(created));
    }

    doc.insert(
        "applied",
        BsonDateTime::from_chrono(change.applied.unwrap_or(fallback_applied)),
    );

    if let Some(description) = &change.description {
        doc.insert("description", description);
    }

    if !change.tags.is_empty() {
        doc.insert("tags", change.tags.clone());
    }

    if let Some(owner) = &change.owner {
        doc.insert("owner", owner);
    }

    doc
}

pub(crate) fn from_document(doc: &Document) -> Result<Change> {
    Ok(Change {
        id: doc.get_object_id("_id").ok().map(|id| id.to_hex()),
        name: doc.get_str("name")?.to_owned(),
        file: PathBuf::from(doc.get_str("file")?),
        path: PathBuf::from(doc.get_str("path").unwrap_or_default()),
        extension: doc.get_str("extension").unwrap_or_default().to_owned(),
        created: doc.get_datetime("created").ok().map(|dt| dt.to_chrono()),
        applied: doc.get_datetime("applied").ok().map(|dt| dt.to_chrono()),
        description: doc.get_str("description").ok().map(str::to_owned),
        tags: doc
            .get_array("tags")
            .map(|tags| {
                tags.iter()
                    .filter_map(Bson::as_str)
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default(),
        owner: doc.get_str("owner").ok().map(str::to_owned),
        ..Change::default()
    })
}

pub(crate) fn rendered_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(id) => id.to_hex(),
        Bson::String(id) => id.clone(),
        other => other.to_string(),
    }
}
