//! Conversion cache with a single-flight guarantee.
//!
//! One cache per application instance, shared by `Arc`. Successful
//! conversions are memoized by file identity; concurrent requests for an
//! identity attach to the one in-flight computation. Failures are never
//! cached, so a later retry converts again.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use fotomap_core::{DisplayHandle, FileIdentity, HandleAllocator};
use fotomap_processing::SourceFormat;

use crate::converter::Converter;

/// Memoized conversion output for one file identity.
#[derive(Debug)]
pub struct CacheEntry {
    pub identity: FileIdentity,
    pub original: Bytes,
    pub converted: Bytes,
    /// Owned by the cache; released on eviction, never by entry consumers.
    pub preview: DisplayHandle,
    pub created_at: DateTime<Utc>,
}

/// Cloneable failure delivered to every waiter of one in-flight conversion.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct ConversionFailed(pub String);

type ConversionFuture = Shared<BoxFuture<'static, Result<Arc<CacheEntry>, ConversionFailed>>>;

#[derive(Default)]
struct CacheState {
    ready: HashMap<FileIdentity, Arc<CacheEntry>>,
    in_flight: HashMap<FileIdentity, ConversionFuture>,
}

/// Conversion cache. Construct once, share by `Arc`.
pub struct ConversionCache {
    converter: Arc<dyn Converter>,
    handles: Arc<dyn HandleAllocator>,
    state: Arc<Mutex<CacheState>>,
}

impl ConversionCache {
    pub fn new(converter: Arc<dyn Converter>, handles: Arc<dyn HandleAllocator>) -> Self {
        Self {
            converter,
            handles,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the converted output for `identity`, computing it at most once
    /// even under concurrent requests. A cached identity returns immediately
    /// without re-reading the source bytes.
    pub async fn get_or_convert(
        &self,
        identity: FileIdentity,
        data: Bytes,
        format: SourceFormat,
    ) -> Result<Arc<CacheEntry>, ConversionFailed> {
        let pending = {
            let mut state = self.state();

            if let Some(entry) = state.ready.get(&identity) {
                tracing::debug!(name = %identity.name, "conversion cache hit");
                return Ok(Arc::clone(entry));
            }

            if let Some(pending) = state.in_flight.get(&identity) {
                tracing::debug!(name = %identity.name, "joining in-flight conversion");
                pending.clone()
            } else {
                let pending = self.start_conversion(identity.clone(), data, format);
                state.in_flight.insert(identity, pending.clone());
                pending
            }
        };

        pending.await
    }

    fn start_conversion(
        &self,
        identity: FileIdentity,
        data: Bytes,
        format: SourceFormat,
    ) -> ConversionFuture {
        let converter = Arc::clone(&self.converter);
        let handles = Arc::clone(&self.handles);
        let state = Arc::clone(&self.state);

        async move {
            let result = converter.convert(data.clone(), format).await;

            let mut state = state.lock().unwrap_or_else(|e| e.into_inner());
            state.in_flight.remove(&identity);

            match result {
                Ok(converted) => {
                    let preview = handles.allocate(&converted);
                    let entry = Arc::new(CacheEntry {
                        identity: identity.clone(),
                        original: data,
                        converted,
                        preview,
                        created_at: Utc::now(),
                    });
                    state.ready.insert(identity, Arc::clone(&entry));
                    Ok(entry)
                }
                Err(err) => {
                    tracing::warn!(
                        name = %identity.name,
                        error = %err,
                        "conversion failed, not cached"
                    );
                    Err(ConversionFailed(err.to_string()))
                }
            }
        }
        .boxed()
        .shared()
    }

    /// Cached entry for `identity`, if any. Does not start a conversion.
    pub fn get(&self, identity: &FileIdentity) -> Option<Arc<CacheEntry>> {
        self.state().ready.get(identity).map(Arc::clone)
    }

    pub fn len(&self) -> usize {
        self.state().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().ready.is_empty()
    }

    /// Evict one identity, releasing its preview handle. Returns whether an
    /// entry existed.
    pub fn evict(&self, identity: &FileIdentity) -> bool {
        let entry = self.state().ready.remove(identity);
        match entry {
            Some(entry) => {
                self.release_preview(&entry);
                true
            }
            None => false,
        }
    }

    /// Bulk-evict entries older than `max_age`. Returns the eviction count.
    pub fn evict_older_than(&self, max_age: Duration) -> usize {
        let now = Utc::now();
        let expired: Vec<Arc<CacheEntry>> = {
            let mut state = self.state();
            let keys: Vec<FileIdentity> = state
                .ready
                .iter()
                .filter(|(_, entry)| {
                    (now - entry.created_at).to_std().unwrap_or_default() >= max_age
                })
                .map(|(key, _)| key.clone())
                .collect();
            keys.iter()
                .filter_map(|key| state.ready.remove(key))
                .collect()
        };

        for entry in &expired {
            self.release_preview(entry);
        }
        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "evicted stale conversions");
        }
        expired.len()
    }

    /// Drop every cached entry, releasing all cache-owned handles.
    pub fn clear(&self) {
        let drained: Vec<Arc<CacheEntry>> = {
            let mut state = self.state();
            state.ready.drain().map(|(_, entry)| entry).collect()
        };
        for entry in &drained {
            self.release_preview(entry);
        }
    }

    fn release_preview(&self, entry: &CacheEntry) {
        if let Err(err) = self.handles.release(&entry.preview) {
            tracing::warn!(
                name = %entry.identity.name,
                error = %err,
                "cache preview release failed"
            );
        }
    }
}

impl Drop for ConversionCache {
    fn drop(&mut self) {
        self.clear();
    }
}
