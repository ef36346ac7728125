//! Inline annotation toggling
//!
//! The annotation provider is heavier than the indicator itself, so it is
//! only constructed the first time a document is toggled on.

pub mod provider;
pub mod toggle;

pub use provider::{AnnotationProvider, InlineAnnotations};
pub use toggle::{AnnotationToggle, ProviderFactory};
