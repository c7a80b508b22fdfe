//! Error types module
//!
//! This module provides the core error types used throughout the fotomap
//! ingestion pipeline. All errors are unified under the `AppError` enum,
//! which covers capacity, validation, extraction, conversion, and
//! resource-release failures.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like capacity limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error reporting - defines how an error should be presented.
/// This trait allows errors to self-describe their reporting characteristics.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONVERSION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (the operation can be retried)
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the client
    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Photo limit exceeded: {0}")]
    Capacity(String),

    #[error("Invalid file: {0}")]
    Validation(String),

    #[error("Metadata extraction error: {0}")]
    Extraction(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Conversion timed out after {seconds} seconds")]
    ConversionTimeout { seconds: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Display handle release failed: {0}")]
    HandleRelease(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

// Error conversion implementations following Rust best practices
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
/// Reduces duplication in the ErrorMetadata impl; client_message stays per-variant
/// for dynamic content.
fn app_error_static_metadata(err: &AppError) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        AppError::Capacity(_) => (
            "CAPACITY_EXCEEDED",
            false,
            Some("Deselect some photos and try again"),
            LogLevel::Warn,
        ),
        AppError::Validation(_) => (
            "INVALID_FILE",
            false,
            Some("Check the file type and try a different file"),
            LogLevel::Debug,
        ),
        AppError::Extraction(_) => (
            "EXTRACTION_ERROR",
            true,
            None,
            LogLevel::Debug,
        ),
        AppError::Conversion(_) => (
            "CONVERSION_ERROR",
            true,
            Some("Retry the photo or pick a different file"),
            LogLevel::Warn,
        ),
        AppError::ConversionTimeout { .. } => (
            "CONVERSION_TIMEOUT",
            true,
            Some("Retry the photo"),
            LogLevel::Warn,
        ),
        AppError::NotFound(_) => (
            "NOT_FOUND",
            false,
            Some("Verify the record ID exists"),
            LogLevel::Debug,
        ),
        AppError::HandleRelease(_) => (
            "HANDLE_RELEASE_ERROR",
            false,
            None,
            LogLevel::Warn,
        ),
        AppError::Internal(_) => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            "INTERNAL_ERROR",
            true,
            Some("Retry after a short delay"),
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error reports
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Capacity(_) => "Capacity",
            AppError::Validation(_) => "Validation",
            AppError::Extraction(_) => "Extraction",
            AppError::Conversion(_) => "Conversion",
            AppError::ConversionTimeout { .. } => "ConversionTimeout",
            AppError::NotFound(_) => "NotFound",
            AppError::HandleRelease(_) => "HandleRelease",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including the error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Capacity(ref msg) => msg.clone(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::Extraction(_) => "Could not read photo metadata".to_string(),
            AppError::Conversion(_) => "Failed to process this photo".to_string(),
            AppError::ConversionTimeout { seconds } => {
                format!("Processing this photo took longer than {} seconds", seconds)
            }
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::HandleRelease(_) => "Internal preview error".to_string(),
            AppError::Internal(_) => "Internal error".to_string(),
            AppError::InternalWithSource { .. } => "Internal error".to_string(),
        }
    }
}
