use std::sync::Arc;

use async_trait::async_trait;
use delta::{Change, MemoryTracker, MigrationService, Request, Runner};
use parking_lot::Mutex;

/// Runner double that records every hook invocation and can be told to
/// fail on a named change.
#[derive(Default)]
pub struct RecordingRunner {
    pub fail_on: Option<String>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_owned()),
            ..Self::default()
        }
    }

    /// Invocations as `(hook, change name)` pairs, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    fn invoke(&self, hook: &str, change: &Change) -> anyhow::Result<String> {
        self.calls
            .lock()
            .push((hook.to_owned(), change.name.clone()));

        if self.fail_on.as_deref() == Some(change.name.as_str()) {
            anyhow::bail!("scripted failure on `{}`", change.name);
        }

        Ok(format!("{hook} {}", change.name))
    }
}

#[async_trait]
impl Runner for RecordingRunner {
    async fn commit(&self, change: &mut Change, _req: &Request) -> anyhow::Result<String> {
        self.invoke("commit", change)
    }

    async fn rollback(&self, change: &mut Change, _req: &Request) -> anyhow::Result<String> {
        self.invoke("rollback", change)
    }
}

/// Service wired with a memory tracker and the given runner under the
/// driver name `mem`.
pub fn service(runner: Arc<RecordingRunner>) -> (MigrationService, MemoryTracker) {
    let tracker = MemoryTracker::new();
    let service = MigrationService::new();

    service.register_runner("mem", runner);
    service.register_tracker("mem", Arc::new(tracker.clone()));

    (service, tracker)
}

pub fn request(dir: &std::path::Path) -> Request {
    Request::default()
        .path(dir)
        .runner("mem")
        .tracker("mem")
}

pub async fn write(dir: &std::path::Path, name: &str) {
    tokio::fs::write(dir.join(name), b"// noop\n").await.unwrap();
}

pub fn change(dir: &std::path::Path, file_name: &str) -> Change {
    let (created, name) = delta::parse_file_name(file_name);

    Change {
        name,
        file: dir.join(file_name),
        path: dir.to_path_buf(),
        extension: "js".to_owned(),
        created,
        ..Change::default()
    }
}
