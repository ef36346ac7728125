//! External collaborators module
//!
//! The data provider interface, the in-memory feed implementing it, and
//! the integration connection registry.

pub mod feed;
pub mod integrations;
pub mod provider;

// Re-export main types
pub use feed::FeedProvider;
pub use integrations::{ConnectionChange, IntegrationRegistry};
pub use provider::DataProvider;
