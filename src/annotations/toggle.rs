//! Per-document toggle over a lazily created annotation provider

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::config::IndicatorSettings;

use super::provider::AnnotationProvider;

pub type ProviderFactory = Box<dyn FnOnce() -> Box<dyn AnnotationProvider> + Send>;

pub struct AnnotationToggle {
    factory: Option<ProviderFactory>,
    provider: Option<Box<dyn AnnotationProvider>>,
    enabled: BTreeSet<String>,
    feature_enabled: bool,
}

impl AnnotationToggle {
    pub fn new(factory: ProviderFactory, feature_enabled: bool) -> Self {
        Self {
            factory: Some(factory),
            provider: None,
            enabled: BTreeSet::new(),
            feature_enabled,
        }
    }

    fn provider(&mut self) -> Option<&mut Box<dyn AnnotationProvider>> {
        if self.provider.is_none() {
            if let Some(factory) = self.factory.take() {
                info!("Creating annotation provider");
                self.provider = Some(factory());
            }
        }
        self.provider.as_mut()
    }

    pub fn is_created(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_enabled(&self, document: &str) -> bool {
        self.enabled.contains(document)
    }

    /// Flip annotations for a document; returns whether they are now on
    pub fn toggle(&mut self, document: &str) -> bool {
        if !self.feature_enabled {
            debug!("Annotations are disabled, ignoring toggle for {}", document);
            return false;
        }

        if self.enabled.remove(document) {
            if let Some(provider) = self.provider.as_deref_mut() {
                provider.detach(document);
            }
            return false;
        }

        match self.provider() {
            Some(provider) => {
                provider.attach(document);
                self.enabled.insert(document.to_string());
                true
            }
            None => false,
        }
    }

    /// Detach every annotated document
    pub fn clear(&mut self) {
        let documents = std::mem::take(&mut self.enabled);
        if let Some(provider) = self.provider.as_deref_mut() {
            for document in &documents {
                provider.detach(document);
            }
        }
        if !documents.is_empty() {
            debug!("Cleared annotations from {} documents", documents.len());
        }
    }

    pub fn on_settings_changed(&mut self, settings: &IndicatorSettings) {
        let enabled = settings.annotations.enabled;
        if self.feature_enabled && !enabled {
            info!("Annotations disabled");
            self.clear();
        }
        self.feature_enabled = enabled;
    }
}
