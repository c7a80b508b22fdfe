//! Photo store: the materialization stage.
//!
//! One store per page/session. The list is mutated only through these
//! operations, never spliced by consumers. List operations are synchronous;
//! conversions complete asynchronously and are matched back by file
//! identity, never by object reference.

use std::sync::{Arc, Mutex, MutexGuard};

use bytes::Bytes;
use tokio::sync::mpsc;
use uuid::Uuid;

use fotomap_core::{
    DisplayHandle, FileIdentity, FileRecord, FileRecordView, GpsResult, HandleAllocator,
    SelectedFile, UploadPayload,
};
use fotomap_processing::SourceFormat;

use crate::events::{EventBus, IngestEvent};

#[derive(Default)]
struct StoreState {
    records: Vec<FileRecord>,
    limit_error: Option<String>,
}

/// Client-visible photo list.
pub struct PhotoStore {
    max_files: usize,
    handles: Arc<dyn HandleAllocator>,
    events: EventBus,
    state: Mutex<StoreState>,
}

impl PhotoStore {
    pub fn new(max_files: usize, handles: Arc<dyn HandleAllocator>) -> Self {
        Self {
            max_files,
            handles,
            events: EventBus::new(),
            state: Mutex::new(StoreState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<IngestEvent> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: IngestEvent) {
        self.events.emit(event);
    }

    pub fn len(&self) -> usize {
        self.state().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().records.is_empty()
    }

    /// UI projection of the current list, in insertion order.
    pub fn snapshot(&self) -> Vec<FileRecordView> {
        self.state().records.iter().map(FileRecord::view).collect()
    }

    /// Batch-level error message, if any (capacity overflow).
    pub fn error(&self) -> Option<String> {
        self.state().limit_error.clone()
    }

    pub fn set_limit_error(&self, message: Option<String>) {
        self.state().limit_error = message;
    }

    /// True while any record is still awaiting conversion.
    pub fn is_processing(&self) -> bool {
        self.state()
            .records
            .iter()
            .any(|r| !r.processed && r.error.is_none())
    }

    /// Insert an identified file with a preview over its original bytes.
    /// Records append after existing ones; batch order is the caller's
    /// insertion order.
    pub fn insert(&self, file: &SelectedFile, gps: GpsResult) -> Uuid {
        let preview = self.handles.allocate(&file.data);
        let record = FileRecord::new(file, preview, gps);
        let id = record.id;
        self.state().records.push(record);
        self.emit(IngestEvent::RecordAdded { id });
        id
    }

    /// Apply a completed conversion.
    ///
    /// Matches by identity among records still awaiting conversion, so the
    /// same logical file selected twice consumes one completion per record.
    /// A miss means the record was removed while converting; the result is
    /// discarded.
    pub fn apply_conversion(&self, identity: &FileIdentity, converted: Bytes) {
        let (id, old_preview) = {
            let mut state = self.state();
            let Some(record) = state
                .records
                .iter_mut()
                .find(|r| !r.processed && r.identity == *identity)
            else {
                drop(state);
                tracing::info!(
                    name = %identity.name,
                    "conversion completed for a removed record, discarding"
                );
                return;
            };

            let new_preview = self.handles.allocate(&converted);
            let old_preview = std::mem::replace(&mut record.preview, new_preview);
            record.current = converted;
            record.content_type = SourceFormat::WebP.mime_type().to_string();
            record.processed = true;
            record.error = None;
            // record.gps is untouched: geolocation extracted from the
            // original survives the binary swap
            (record.id, old_preview)
        };

        self.release_quiet(&old_preview);
        self.emit(IngestEvent::RecordConverted { id });
    }

    /// Attach a conversion failure to the matching record. The record stays
    /// unprocessed; a removed record's failure is discarded.
    pub fn mark_failed(&self, identity: &FileIdentity, error: String) {
        let id = {
            let mut state = self.state();
            let Some(record) = state
                .records
                .iter_mut()
                .find(|r| !r.processed && r.error.is_none() && r.identity == *identity)
            else {
                drop(state);
                tracing::info!(
                    name = %identity.name,
                    "conversion failure for a removed record, discarding"
                );
                return;
            };
            record.error = Some(error.clone());
            record.id
        };
        self.emit(IngestEvent::RecordFailed { id, error });
    }

    /// Remove one record by id, releasing its preview handle. Clears the
    /// limit error once the count is back under the maximum.
    pub fn remove(&self, id: Uuid) -> bool {
        let removed = {
            let mut state = self.state();
            let Some(position) = state.records.iter().position(|r| r.id == id) else {
                return false;
            };
            let removed = state.records.remove(position);
            if state.records.len() < self.max_files {
                state.limit_error = None;
            }
            removed
        };

        self.release_quiet(&removed.preview);
        self.emit(IngestEvent::RecordRemoved { id });
        true
    }

    /// Drop every record, releasing all held handles.
    pub fn clear(&self) {
        let drained: Vec<FileRecord> = {
            let mut state = self.state();
            state.limit_error = None;
            state.records.drain(..).collect()
        };

        for record in &drained {
            self.release_quiet(&record.preview);
        }
        self.emit(IngestEvent::Cleared);
    }

    /// Hand-off payloads for the upload layer: available only once every
    /// surviving record has finished converting.
    pub fn ready_payloads(&self) -> Option<Vec<UploadPayload>> {
        let state = self.state();
        if state.records.is_empty() {
            return None;
        }
        if state
            .records
            .iter()
            .any(|r| !r.processed && r.error.is_none())
        {
            return None;
        }

        Some(
            state
                .records
                .iter()
                .filter(|r| r.processed)
                .map(|r| UploadPayload {
                    name: r.identity.name.clone(),
                    content_type: r.content_type.clone(),
                    data: r.current.clone(),
                    gps: r.gps.clone(),
                })
                .collect(),
        )
    }

    fn release_quiet(&self, handle: &DisplayHandle) {
        if let Err(err) = self.handles.release(handle) {
            tracing::warn!(error = %err, "display handle release failed");
        }
    }
}

impl Drop for PhotoStore {
    fn drop(&mut self) {
        let drained: Vec<FileRecord> = {
            let state = self.state.get_mut().unwrap_or_else(|e| e.into_inner());
            state.records.drain(..).collect()
        };
        for record in &drained {
            self.release_quiet(&record.preview);
        }
    }
}
