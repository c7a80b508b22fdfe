//! Shared fixtures for ingest integration tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use fotomap_core::SelectedFile;
use fotomap_ingest::Converter;
use fotomap_processing::SourceFormat;

/// Install a test subscriber once so `RUST_LOG` controls test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Encode a small solid-color PNG.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Bytes {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)
        .unwrap();
    Bytes::from(buffer)
}

pub fn png_file(name: &str, modified_ms: i64) -> SelectedFile {
    SelectedFile::new(name, "image/png", modified_ms, png_bytes(16, 16, [200, 30, 30]))
}

pub fn is_webp(data: &[u8]) -> bool {
    data.len() > 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}

/// Poll `cond` until it holds or the timeout elapses.
pub async fn wait_until<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

/// Test converter: counts invocations, optionally delays, optionally fails.
pub struct CountingConverter {
    calls: AtomicUsize,
    delay: Duration,
    fail: AtomicBool,
}

impl CountingConverter {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            delay,
            fail: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for CountingConverter {
    async fn convert(&self, data: Bytes, _format: SourceFormat) -> anyhow::Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("synthetic decode failure");
        }
        let mut out = b"RIFF0000WEBP".to_vec();
        out.extend_from_slice(&data);
        Ok(Bytes::from(out))
    }
}
