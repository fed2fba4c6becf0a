//! The closed interface user-authored migrations implement.
//!
//! The original engine located a hook by name on a dynamically loaded
//! module; here a migration is a value registered under its module key
//! and invoked through this trait. `T` is the backend-provided tool the
//! hooks mutate the target database through.

use async_trait::async_trait;

/// Default key prefix under which migration modules are registered.
pub const DEFAULT_KEY_PREFIX: &str = "delta:migration:";

/// A user-authored migration.
///
/// Hooks may return a message that overrides [`Migration::description`]
/// in the persisted change record.
#[async_trait]
pub trait Migration<T: Send>: Send + Sync {
    async fn commit(&self, tool: &mut T) -> anyhow::Result<Option<String>>;

    async fn rollback(&self, tool: &mut T) -> anyhow::Result<Option<String>>;

    fn description(&self) -> Option<&str> {
        None
    }

    fn tags(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Builds the registry key of a migration module.
pub fn module_key(prefix: Option<&str>, name: &str) -> String {
    format!("{}{name}", prefix.unwrap_or(DEFAULT_KEY_PREFIX))
}
