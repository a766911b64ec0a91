//! Extractor registry for routing files to content extractors.

use docchat_core::{ContentExtractor, ExtractError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Registry of content extractors.
pub struct ExtractorRegistry {
    /// Named extractors
    extractors: HashMap<String, Arc<dyn ContentExtractor>>,
    /// File extension to extractor name mapping
    extension_mapping: HashMap<String, String>,
}

impl ExtractorRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
            extension_mapping: HashMap::new(),
        }
    }

    /// Register an extractor.
    pub fn register<E: ContentExtractor + 'static>(&mut self, name: &str, extractor: E) {
        let extractor = Arc::new(extractor);
        for ext in extractor.supported_extensions() {
            self.extension_mapping
                .insert((*ext).to_string(), name.to_string());
        }
        self.extractors.insert(name.to_string(), extractor);
    }

    /// Get an extractor for a file extension (lowercase, no dot).
    #[must_use]
    pub fn get_for_extension(&self, extension: &str) -> Option<Arc<dyn ContentExtractor>> {
        self.extension_mapping
            .get(extension)
            .and_then(|name| self.extractors.get(name))
            .cloned()
    }

    /// Get an extractor that can handle a file.
    #[must_use]
    pub fn get_for_file(&self, path: &Path) -> Option<Arc<dyn ContentExtractor>> {
        // First try by extension mapping
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some(extractor) = self.get_for_extension(&ext.to_ascii_lowercase()) {
                return Some(extractor);
            }
        }

        // Then ask each extractor directly
        for extractor in self.extractors.values() {
            if extractor.can_extract(path) {
                return Some(extractor.clone());
            }
        }

        None
    }

    /// Extension names this registry currently routes.
    #[must_use]
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.extension_mapping.keys().cloned().collect();
        extensions.sort();
        extensions
    }

    /// Extract text content from a file.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extractor = self.get_for_file(path).ok_or_else(|| {
            let shown = path
                .extension()
                .and_then(|e| e.to_str())
                .map_or_else(|| path.display().to_string(), str::to_string);
            ExtractError::UnsupportedType(shown)
        })?;

        extractor.extract(path).await
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
