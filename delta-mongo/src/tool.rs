//! Backend context handed to migration hooks.

use mongodb::{bson::Document, ClientSession, Collection, Database};

/// Everything a MongoDB migration needs to mutate the target database.
///
/// All writes performed through `session` take part in the per-change
/// transaction the runner opened; the runner commits or aborts it based
/// on the hook's outcome.
pub struct MongoTool {
    pub db: Database,
    pub collection: Collection<Document>,
    pub session: ClientSession,
}
