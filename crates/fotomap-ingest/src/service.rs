//! Ingest service: wires the pipeline stages together.
//!
//! Selection → validation → identification run inline when a batch arrives;
//! conversion continues on spawned tasks and reports back to the store by
//! file identity.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::timeout;
use uuid::Uuid;

use fotomap_core::{AppError, HandleAllocator, IngestConfig, SelectedFile};
use fotomap_processing::{identify, PhotoValidator, SelectionGate, SourceFormat};

use crate::allocator::InMemoryHandles;
use crate::cache::ConversionCache;
use crate::converter::{Converter, WebpConverter};
use crate::events::IngestEvent;
use crate::store::PhotoStore;

/// Synchronously-known outcome of one batch. Conversion results arrive later
/// through the event stream.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub added: Vec<Uuid>,
    pub rejected_over_limit: usize,
    pub rejected_invalid: usize,
    pub message: Option<String>,
}

pub struct IngestService {
    config: IngestConfig,
    gate: SelectionGate,
    validator: PhotoValidator,
    store: Arc<PhotoStore>,
    cache: Arc<ConversionCache>,
}

impl IngestService {
    pub fn new(config: IngestConfig) -> Self {
        let handles: Arc<dyn HandleAllocator> = Arc::new(InMemoryHandles::new());
        let converter: Arc<dyn Converter> = Arc::new(WebpConverter::new(config.webp_quality));
        Self::with_parts(config, handles, converter)
    }

    /// Construction seam: inject the allocator and converter (tests count
    /// allocations and conversions through these).
    pub fn with_parts(
        config: IngestConfig,
        handles: Arc<dyn HandleAllocator>,
        converter: Arc<dyn Converter>,
    ) -> Self {
        let gate = SelectionGate::new(config.max_files);
        let validator = PhotoValidator::from_config(&config);
        let store = Arc::new(PhotoStore::new(config.max_files, Arc::clone(&handles)));
        let cache = Arc::new(ConversionCache::new(converter, handles));
        Self {
            config,
            gate,
            validator,
            store,
            cache,
        }
    }

    pub fn store(&self) -> &Arc<PhotoStore> {
        &self.store
    }

    pub fn cache(&self) -> &Arc<ConversionCache> {
        &self.cache
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<IngestEvent> {
        self.store.subscribe()
    }

    /// Add a batch of picked files. Per-file failures never abort the batch;
    /// the returned report covers what is known synchronously.
    pub async fn add_photos(&self, files: Vec<SelectedFile>) -> BatchReport {
        let outcome = self.gate.admit(self.store.len(), files);

        let mut report = BatchReport {
            rejected_over_limit: outcome.rejected,
            message: outcome.message.clone(),
            ..BatchReport::default()
        };

        if let Some(message) = outcome.message {
            self.store.set_limit_error(Some(message.clone()));
            self.store.emit(IngestEvent::BatchLimited {
                rejected: outcome.rejected,
                message,
            });
        }

        for file in outcome.accepted {
            if let Err(err) = self
                .validator
                .validate(&file.name, &file.content_type, file.data.len())
            {
                tracing::debug!(name = %file.name, error = %err, "file rejected by validator");
                self.store.emit(IngestEvent::RecordRejected {
                    name: file.name.clone(),
                    reason: err.to_string(),
                });
                report.rejected_invalid += 1;
                continue;
            }

            let identification = identify(&file).await;
            let id = self.store.insert(&file, identification.gps);
            report.added.push(id);

            self.spawn_conversion(file, identification.format);
        }

        report
    }

    /// Remove one photo from the list. A conversion still in flight for it
    /// will miss on completion and discard its result.
    pub fn remove_photo(&self, id: Uuid) -> bool {
        self.store.remove(id)
    }

    /// Tear down the visible list, releasing every record handle. The
    /// conversion cache survives: it is session-scoped, not list-scoped.
    pub fn clear(&self) {
        self.store.clear();
    }

    /// Drop cached conversions older than the configured age.
    pub fn evict_stale_cache(&self) -> usize {
        self.cache.evict_older_than(self.config.cache_max_age)
    }

    fn spawn_conversion(&self, file: SelectedFile, format: SourceFormat) {
        let cache = Arc::clone(&self.cache);
        let store = Arc::clone(&self.store);
        let identity = file.identity();
        let data = file.data;
        let limit = self.config.conversion_timeout;

        tokio::spawn(async move {
            match timeout(limit, cache.get_or_convert(identity.clone(), data, format)).await {
                Ok(Ok(entry)) => store.apply_conversion(&identity, entry.converted.clone()),
                Ok(Err(err)) => store.mark_failed(&identity, err.to_string()),
                Err(_) => {
                    tracing::warn!(
                        name = %identity.name,
                        timeout_secs = limit.as_secs(),
                        "conversion timed out"
                    );
                    let err = AppError::ConversionTimeout {
                        seconds: limit.as_secs(),
                    };
                    store.mark_failed(&identity, err.to_string());
                }
            }
        });
    }
}
