//! Annotation providers

use std::{
    collections::BTreeSet,
    sync::{Arc, Mutex},
};

use tracing::{debug, warn};

/// Attaches inline annotations to documents
pub trait AnnotationProvider: Send {
    fn attach(&mut self, document: &str);
    fn detach(&mut self, document: &str);
}

/// Host provider that tracks annotated documents in a shared set
#[derive(Debug, Clone, Default)]
pub struct InlineAnnotations {
    annotated: Arc<Mutex<BTreeSet<String>>>,
}

impl InlineAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents currently annotated, sorted
    pub fn annotated(&self) -> Vec<String> {
        match self.annotated.lock() {
            Ok(set) => set.iter().cloned().collect(),
            Err(_) => {
                warn!("Failed to lock annotated documents");
                Vec::new()
            }
        }
    }
}

impl AnnotationProvider for InlineAnnotations {
    fn attach(&mut self, document: &str) {
        if let Ok(mut set) = self.annotated.lock() {
            set.insert(document.to_string());
            debug!("Annotations attached to {}", document);
        }
    }

    fn detach(&mut self, document: &str) {
        if let Ok(mut set) = self.annotated.lock() {
            set.remove(document);
            debug!("Annotations detached from {}", document);
        }
    }
}
