//! File-shaped models: picker input, pipeline records, UI and upload views.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handle::DisplayHandle;
use crate::models::gps::GpsResult;

/// Composite identity key: filename + byte size + last-modified timestamp.
///
/// Used for conversion-cache lookups and for matching completion results back
/// to records. In-memory deduplication only; not unique across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    pub name: String,
    pub size: u64,
    pub modified_ms: i64,
}

impl FileIdentity {
    pub fn new(name: impl Into<String>, size: u64, modified_ms: i64) -> Self {
        Self {
            name: name.into(),
            size,
            modified_ms,
        }
    }
}

/// A file as it leaves the picker: name, declared MIME type, last-modified
/// timestamp in epoch milliseconds, and content.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: String,
    pub modified_ms: i64,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        modified_ms: i64,
        data: Bytes,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            modified_ms,
            data,
        }
    }

    pub fn identity(&self) -> FileIdentity {
        FileIdentity::new(self.name.clone(), self.data.len() as u64, self.modified_ms)
    }
}

/// The pipeline's unit of work: one selected photo and its derived state.
///
/// Invariants: exactly one live display handle at a time (replacement
/// releases the old one); `gps` is extracted from the original bytes and
/// survives replacement of `current`; `processed` stays false until the
/// required conversion completes.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: Uuid,
    pub identity: FileIdentity,
    pub content_type: String,
    pub original: Bytes,
    pub current: Bytes,
    pub preview: DisplayHandle,
    pub gps: GpsResult,
    pub processed: bool,
    pub error: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl FileRecord {
    pub fn new(file: &SelectedFile, preview: DisplayHandle, gps: GpsResult) -> Self {
        Self {
            id: Uuid::new_v4(),
            identity: file.identity(),
            content_type: file.content_type.clone(),
            original: file.data.clone(),
            current: file.data.clone(),
            preview,
            gps,
            processed: false,
            error: None,
            added_at: Utc::now(),
        }
    }

    pub fn view(&self) -> FileRecordView {
        FileRecordView {
            id: self.id,
            name: self.identity.name.clone(),
            preview_url: self.preview.url.clone(),
            processed: self.processed,
            error: self.error.clone(),
            gps: self.gps.clone(),
        }
    }
}

/// UI-facing projection of a record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecordView {
    pub id: Uuid,
    pub name: String,
    pub preview_url: String,
    pub processed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub gps: GpsResult,
}

/// Hand-off shape for the upload collaborator: the current (post-conversion)
/// bytes plus the geolocation extracted at identification time.
#[derive(Debug, Clone)]
pub struct UploadPayload {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
    pub gps: GpsResult,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_file() -> SelectedFile {
        SelectedFile::new(
            "IMG_0001.heic",
            "image/heic",
            1_700_000_000_000,
            Bytes::from_static(b"fake heic bytes"),
        )
    }

    fn test_handle() -> DisplayHandle {
        let id = Uuid::new_v4();
        DisplayHandle {
            id,
            url: format!("mem://{id}"),
        }
    }

    #[test]
    fn test_identity_from_selected_file() {
        let file = test_file();
        let identity = file.identity();
        assert_eq!(identity.name, "IMG_0001.heic");
        assert_eq!(identity.size, 15);
        assert_eq!(identity.modified_ms, 1_700_000_000_000);
    }

    #[test]
    fn test_identity_is_hashable_by_value() {
        let file = test_file();
        let mut set = HashSet::new();
        set.insert(file.identity());
        // same logical file picked twice yields the same key
        assert!(set.contains(&test_file().identity()));
        assert!(!set.contains(&FileIdentity::new("IMG_0001.heic", 15, 0)));
    }

    #[test]
    fn test_new_record_starts_unprocessed() {
        let file = test_file();
        let record = FileRecord::new(&file, test_handle(), GpsResult::none());
        assert!(!record.processed);
        assert!(record.error.is_none());
        assert_eq!(record.original, record.current);
    }

    #[test]
    fn test_view_projects_record_state() {
        let file = test_file();
        let record = FileRecord::new(&file, test_handle(), GpsResult::new(1.0, 2.0, None));
        let view = record.view();
        assert_eq!(view.id, record.id);
        assert_eq!(view.preview_url, record.preview.url);
        assert!(view.gps.has_gps);

        let json = serde_json::to_string(&view).unwrap();
        // a clean record serializes without an error field
        assert!(!json.contains("\"error\""));
    }
}
