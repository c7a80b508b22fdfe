//! Conversion seam between the cache and the processing crate.

use async_trait::async_trait;
use bytes::Bytes;

use fotomap_processing::SourceFormat;

/// Converts source bytes into the web display format.
///
/// The cache guarantees at most one invocation per file identity; the
/// implementation does not need its own memoization.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(&self, data: Bytes, format: SourceFormat) -> anyhow::Result<Bytes>;
}

/// Production converter: WebP re-encode on the blocking pool.
pub struct WebpConverter {
    quality: f32,
}

impl WebpConverter {
    pub fn new(quality: f32) -> Self {
        Self { quality }
    }
}

#[async_trait]
impl Converter for WebpConverter {
    async fn convert(&self, data: Bytes, format: SourceFormat) -> anyhow::Result<Bytes> {
        let quality = self.quality;
        // Image decode/encode is CPU-bound; run off the async pool.
        tokio::task::spawn_blocking(move || {
            fotomap_processing::convert_to_webp(&data, format, quality)
        })
        .await?
    }
}
