use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use redactor_core::DownloadHandle;

/// Registry of completed results the user can still download.
///
/// Handles are minted when a job finishes and revoked on reset (or when a
/// stale job completes), so content never accumulates across repeated use. A
/// revoked handle simply stops resolving; the corresponding download link
/// goes dead.
#[derive(Default)]
pub struct DownloadRegistry {
    next_id: AtomicU64,
    entries: Mutex<HashMap<u64, String>>,
}

impl DownloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, text: String) -> DownloadHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries
            .lock()
            .expect("lock download registry")
            .insert(id, text);
        DownloadHandle(id)
    }

    pub fn get(&self, handle: DownloadHandle) -> Option<String> {
        self.entries
            .lock()
            .expect("lock download registry")
            .get(&handle.0)
            .cloned()
    }

    pub fn release(&self, handle: DownloadHandle) {
        self.entries
            .lock()
            .expect("lock download registry")
            .remove(&handle.0);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("lock download registry").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
