//! Configuration module
//!
//! This module provides the configuration for the ingestion pipeline. One
//! authoritative surface: every stage reads its limits and allowlists from
//! `IngestConfig`, never from call-site constants.

use std::env;
use std::time::Duration;

// Common constants
const DEFAULT_MAX_FILES: usize = 30;
const DEFAULT_MAX_FILE_SIZE_MB: usize = 50;
const DEFAULT_WEBP_QUALITY: f32 = 80.0;
const DEFAULT_CONVERSION_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_MAX_AGE_SECS: u64 = 15 * 60;

const DEFAULT_ALLOWED_EXTENSIONS: &str = "jpg,jpeg,png,gif,webp,heic,heif";
const DEFAULT_ALLOWED_CONTENT_TYPES: &str =
    "image/jpeg,image/png,image/gif,image/webp,image/heic,image/heif";

/// Ingestion pipeline configuration
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Maximum number of photos held by the store at once
    pub max_files: usize,
    pub max_file_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    /// WebP re-encode quality (0-100)
    pub webp_quality: f32,
    /// Upper bound on a single conversion; a stalled decode fails the record
    pub conversion_timeout: Duration,
    /// Age past which cached conversions are eligible for bulk eviction
    pub cache_max_age: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_size_bytes: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
            allowed_extensions: split_list(DEFAULT_ALLOWED_EXTENSIONS),
            allowed_content_types: split_list(DEFAULT_ALLOWED_CONTENT_TYPES),
            webp_quality: DEFAULT_WEBP_QUALITY,
            conversion_timeout: Duration::from_secs(DEFAULT_CONVERSION_TIMEOUT_SECS),
            cache_max_age: Duration::from_secs(DEFAULT_CACHE_MAX_AGE_SECS),
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl IngestConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let max_files = env::var("MAX_FILES")
            .unwrap_or_else(|_| DEFAULT_MAX_FILES.to_string())
            .parse::<usize>()?;

        let max_file_size_mb = env::var("MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
            .parse::<usize>()?;

        let allowed_extensions = split_list(
            &env::var("ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_EXTENSIONS.to_string()),
        );

        let allowed_content_types = split_list(
            &env::var("ALLOWED_CONTENT_TYPES")
                .unwrap_or_else(|_| DEFAULT_ALLOWED_CONTENT_TYPES.to_string()),
        );

        let webp_quality = env::var("WEBP_QUALITY")
            .unwrap_or_else(|_| DEFAULT_WEBP_QUALITY.to_string())
            .parse::<f32>()?;

        let conversion_timeout_secs = env::var("CONVERSION_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_CONVERSION_TIMEOUT_SECS.to_string())
            .parse::<u64>()?;

        let cache_max_age_secs = env::var("CACHE_MAX_AGE_SECS")
            .unwrap_or_else(|_| DEFAULT_CACHE_MAX_AGE_SECS.to_string())
            .parse::<u64>()?;

        let config = Self {
            max_files,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            allowed_extensions,
            allowed_content_types,
            webp_quality,
            conversion_timeout: Duration::from_secs(conversion_timeout_secs),
            cache_max_age: Duration::from_secs(cache_max_age_secs),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_files == 0 {
            anyhow::bail!("MAX_FILES must be greater than zero");
        }
        if self.max_file_size_bytes == 0 {
            anyhow::bail!("MAX_FILE_SIZE_MB must be greater than zero");
        }
        if !(0.0..=100.0).contains(&self.webp_quality) {
            anyhow::bail!(
                "WEBP_QUALITY must be between 0 and 100, got {}",
                self.webp_quality
            );
        }
        if self.allowed_extensions.is_empty() {
            anyhow::bail!("ALLOWED_EXTENSIONS must not be empty");
        }
        if self.allowed_content_types.is_empty() {
            anyhow::bail!("ALLOWED_CONTENT_TYPES must not be empty");
        }
        if self.conversion_timeout.is_zero() {
            anyhow::bail!("CONVERSION_TIMEOUT_SECS must be greater than zero");
        }
        Ok(())
    }
}
