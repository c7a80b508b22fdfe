//! Per-file validation against the configured allowlist.

use std::path::Path;

use fotomap_core::{AppError, IngestConfig};

/// Validation errors for selected photos
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Photo file validator
///
/// Applies the size ceiling and the extension/MIME allowlist. A failing file
/// is excluded from its batch; validation never affects sibling files.
pub struct PhotoValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl PhotoValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &IngestConfig) -> Self {
        Self::new(
            config.max_file_size_bytes,
            config.allowed_extensions.clone(),
            config.allowed_content_types.clone(),
        )
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate file extension
    pub fn validate_extension(&self, filename: &str) -> Result<(), ValidationError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate declared content type. An empty declared type is allowed:
    /// some platforms hand HEIC files over without a MIME type, and format
    /// classification falls back to the filename in that case.
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(());
        }

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate that the declared content type matches the file extension.
    /// This prevents spoofed uploads where the declared type and the actual
    /// file disagree.
    pub fn validate_extension_content_type_match(
        &self,
        filename: &str,
        content_type: &str,
    ) -> Result<(), ValidationError> {
        let normalized = content_type.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(());
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        let expected_content_types: Vec<&str> = match extension.as_str() {
            "jpg" | "jpeg" => vec!["image/jpeg", "image/jpg"],
            "png" => vec!["image/png"],
            "gif" => vec!["image/gif"],
            "webp" => vec!["image/webp"],
            // HEIC and HEIF are declared interchangeably by pickers
            "heic" => vec!["image/heic", "image/heif"],
            "heif" => vec!["image/heif", "image/heic"],
            _ => {
                // Unknown extensions are caught by validate_extension; skip
                // cross-validation here.
                tracing::debug!(
                    extension = %extension,
                    content_type = %content_type,
                    "unknown extension, skipping content-type cross-validation"
                );
                return Ok(());
            }
        };

        if !expected_content_types.iter().any(|ct| ct == &normalized) {
            return Err(ValidationError::InvalidContentType {
                content_type: format!(
                    "{} (does not match extension '{}'. Expected one of: {})",
                    content_type,
                    extension,
                    expected_content_types.join(", ")
                ),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate all aspects of a file, including content-type/extension matching
    pub fn validate(
        &self,
        filename: &str,
        content_type: &str,
        file_size: usize,
    ) -> Result<(), ValidationError> {
        self.validate_file_size(file_size)?;
        self.validate_extension(filename)?;
        self.validate_content_type(content_type)?;
        self.validate_extension_content_type_match(filename, content_type)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> PhotoValidator {
        PhotoValidator::new(
            1024 * 1024, // 1MB
            vec![
                "jpg".to_string(),
                "png".to_string(),
                "heic".to_string(),
            ],
            vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/heic".to_string(),
            ],
        )
    }

    #[test]
    fn test_validate_file_size_ok() {
        let validator = test_validator();
        assert!(validator.validate_file_size(512 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let validator = test_validator();
        assert!(validator.validate_file_size(2 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_validate_file_size_empty() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_extension_ok() {
        let validator = test_validator();
        assert!(validator.validate_extension("test.jpg").is_ok());
        assert!(validator.validate_extension("test.HEIC").is_ok()); // case insensitive
    }

    #[test]
    fn test_validate_extension_invalid() {
        let validator = test_validator();
        assert!(validator.validate_extension("test.bmp").is_err());
        assert!(validator.validate_extension("noextension").is_err());
    }

    #[test]
    fn test_validate_content_type_ok() {
        let validator = test_validator();
        assert!(validator.validate_content_type("image/jpeg").is_ok());
        assert!(validator.validate_content_type("IMAGE/PNG").is_ok()); // case insensitive
    }

    #[test]
    fn test_validate_content_type_invalid() {
        let validator = test_validator();
        assert!(validator.validate_content_type("image/bmp").is_err());
    }

    #[test]
    fn test_validate_empty_content_type_is_allowed() {
        let validator = test_validator();
        assert!(validator.validate_content_type("").is_ok());
        assert!(validator.validate("IMG_1.heic", "", 1024).is_ok());
    }

    #[test]
    fn test_validate_extension_content_type_match() {
        let validator = test_validator();
        assert!(validator
            .validate_extension_content_type_match("test.jpg", "image/jpeg")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("test.jpg", "image/png")
            .is_err());
    }

    #[test]
    fn test_validate_heic_heif_cross_match() {
        let validator = test_validator();
        // pickers declare either MIME for either extension
        assert!(validator
            .validate_extension_content_type_match("a.heic", "image/heif")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("a.heif", "image/heic")
            .is_ok());
        assert!(validator
            .validate_extension_content_type_match("a.heic", "image/jpeg")
            .is_err());
    }

    #[test]
    fn test_validate_all_ok() {
        let validator = test_validator();
        assert!(validator.validate("test.jpg", "image/jpeg", 512 * 1024).is_ok());
    }

    #[test]
    fn test_validate_all_fails_on_size() {
        let validator = test_validator();
        assert!(validator
            .validate("test.jpg", "image/jpeg", 2 * 1024 * 1024)
            .is_err());
    }

    #[test]
    fn test_validate_all_fails_on_extension() {
        let validator = test_validator();
        assert!(validator.validate("test.bmp", "image/bmp", 512).is_err());
    }

    #[test]
    fn test_from_config_uses_allowlist() {
        let validator = PhotoValidator::from_config(&fotomap_core::IngestConfig::default());
        assert!(validator.validate_extension("photo.webp").is_ok());
        assert!(validator.validate_extension("photo.gif").is_ok());
        assert!(validator.validate_extension("photo.tiff").is_err());
    }

    #[test]
    fn test_validation_error_converts_to_app_error() {
        let err: AppError = ValidationError::EmptyFile.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
