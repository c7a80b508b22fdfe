//! Fotomap Core Library
//!
//! This crate provides the core domain models, error types, configuration,
//! and the display-handle allocator seam shared across the fotomap
//! ingestion crates.

pub mod config;
pub mod error;
pub mod handle;
pub mod models;

// Re-export commonly used types
pub use config::IngestConfig;
pub use error::{AppError, AppResult, ErrorMetadata, LogLevel};
pub use handle::{DisplayHandle, HandleAllocator, HandleError};
pub use models::{
    FileIdentity, FileRecord, FileRecordView, GpsResult, SelectedFile, UploadPayload,
};
