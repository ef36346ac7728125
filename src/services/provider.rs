//! Interface to whatever fetches and categorizes launchpad items

use tokio::sync::broadcast;

use crate::{
    error::IndicatorResult,
    state::{IntegrationId, LaunchpadSnapshot},
};

/// Data source the indicator polls.
///
/// `request_refresh` only triggers a refresh; its result arrives later on
/// the channel returned by `subscribe`.
pub trait DataProvider: Send + Sync {
    fn has_connected_integration(&self) -> bool;

    fn request_refresh(&self, force: bool);

    fn subscribe(&self) -> broadcast::Receiver<LaunchpadSnapshot>;

    /// Run the connect flow of an integration
    fn connect(&self, integration: IntegrationId) -> IndicatorResult<()>;
}
