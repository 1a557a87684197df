//! Extraction adapter registry for dispatching uploaded documents.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use labrat_core::{
    Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, MediaKind, Result,
};

use crate::adapters::{OfficeConvertAdapter, PdfTextAdapter, TextNativeAdapter};
use crate::detect::detect_kind;

/// Registry mapping extraction strategies to their adapter implementations.
pub struct ExtractionRegistry {
    adapters: HashMap<ExtractionStrategy, Arc<dyn ExtractionAdapter>>,
}

impl ExtractionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with the plain text, PDF and word-processing adapters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextNativeAdapter));
        registry.register(Arc::new(PdfTextAdapter));
        registry.register(Arc::new(OfficeConvertAdapter));
        registry
    }

    /// Register an adapter. Replaces any existing adapter for the same strategy.
    pub fn register(&mut self, adapter: Arc<dyn ExtractionAdapter>) {
        self.adapters.insert(adapter.strategy(), adapter);
    }

    /// Extract content using the adapter registered for `strategy`.
    pub async fn extract(
        &self,
        strategy: ExtractionStrategy,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionResult> {
        let adapter = self.adapters.get(&strategy).ok_or_else(|| {
            Error::UnreadableDocument(format!(
                "No extraction adapter registered for {}",
                strategy.as_str()
            ))
        })?;
        adapter.extract(data, filename, mime_type).await
    }

    /// Detect the document kind and extract with the matching adapter.
    #[instrument(skip(self, data), fields(subsystem = "documents", op = "extract", size_bytes = data.len()))]
    pub async fn extract_document(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionResult> {
        let kind = detect_kind(data, filename, mime_type);
        let strategy = ExtractionStrategy::for_media(kind).ok_or_else(|| match kind {
            MediaKind::Image(_) => Error::UnreadableDocument(format!(
                "File '{}' is an image, not a document",
                filename
            )),
            _ => Error::UnreadableDocument(format!(
                "Unsupported file type for '{}' ({})",
                filename,
                if mime_type.is_empty() { "unknown" } else { mime_type }
            )),
        })?;

        debug!(strategy = strategy.as_str(), "Dispatching document extraction");
        self.extract(strategy, data, filename, mime_type).await
    }

    /// List all strategies that have registered adapters.
    pub fn available_strategies(&self) -> Vec<ExtractionStrategy> {
        self.adapters.keys().copied().collect()
    }

    /// Check if an adapter is registered for the given strategy.
    pub fn has_adapter(&self, strategy: ExtractionStrategy) -> bool {
        self.adapters.contains_key(&strategy)
    }

    /// Run health checks on all registered adapters.
    pub async fn health_check_all(&self) -> HashMap<ExtractionStrategy, bool> {
        let mut results = HashMap::new();
        for (strategy, adapter) in &self.adapters {
            let healthy = adapter.health_check().await.unwrap_or(false);
            results.insert(*strategy, healthy);
        }
        results
    }
}

impl Default for ExtractionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
