//! In-memory display-handle registry.

use std::collections::HashMap;
use std::sync::Mutex;

use bytes::Bytes;
use uuid::Uuid;

use fotomap_core::{DisplayHandle, HandleAllocator, HandleError};

#[derive(Default)]
struct Registry {
    live: HashMap<Uuid, usize>,
    allocated: u64,
    released: u64,
}

/// Default allocator: issues `mem://` URLs and tracks live handles so a
/// double release is detected rather than silently ignored. The counters
/// make handle hygiene observable in tests.
#[derive(Default)]
pub struct InMemoryHandles {
    registry: Mutex<Registry>,
}

impl InMemoryHandles {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Handles allocated and never released.
    pub fn live_count(&self) -> usize {
        self.registry().live.len()
    }

    pub fn allocated_total(&self) -> u64 {
        self.registry().allocated
    }

    pub fn released_total(&self) -> u64 {
        self.registry().released
    }

    /// True when every allocation has been matched by exactly one release.
    pub fn is_balanced(&self) -> bool {
        let registry = self.registry();
        registry.live.is_empty() && registry.allocated == registry.released
    }
}

impl HandleAllocator for InMemoryHandles {
    fn allocate(&self, bytes: &Bytes) -> DisplayHandle {
        let id = Uuid::new_v4();
        let mut registry = self.registry();
        registry.live.insert(id, bytes.len());
        registry.allocated += 1;
        tracing::trace!(%id, len = bytes.len(), "allocated display handle");
        DisplayHandle {
            id,
            url: format!("mem://{id}"),
        }
    }

    fn release(&self, handle: &DisplayHandle) -> Result<(), HandleError> {
        let mut registry = self.registry();
        if registry.live.remove(&handle.id).is_none() {
            return Err(HandleError::NotLive(handle.id));
        }
        registry.released += 1;
        tracing::trace!(id = %handle.id, "released display handle");
        Ok(())
    }
}
