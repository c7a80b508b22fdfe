//! Fotomap Processing Library
//!
//! This crate provides the pure stages of the photo ingestion pipeline:
//! batch selection, per-file validation, source-format classification,
//! EXIF GPS extraction, and WebP conversion. Stateful orchestration (the
//! conversion cache and the photo store) lives in fotomap-ingest.

pub mod conversion;
pub mod exif;
pub mod format;
pub mod identify;
pub mod selection;
pub mod validator;

// Re-export commonly used types
pub use conversion::convert_to_webp;
pub use exif::extract_gps;
pub use format::SourceFormat;
pub use identify::{identify, Identification};
pub use selection::{SelectionGate, SelectionOutcome};
pub use validator::{PhotoValidator, ValidationError};
