//! Commands the indicator exposes to the host

use serde::{Deserialize, Serialize};

use crate::state::IntegrationId;

/// Closed set of indicator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum IndicatorAction {
    /// Hide the indicator after confirmation and persist the choice
    Hide,
    /// Run the connect flow of an integration
    Connect { integration: IntegrationId },
    /// Request a forced refresh
    Refresh,
}

impl IndicatorAction {
    pub fn command_id(&self) -> &'static str {
        match self {
            IndicatorAction::Hide => "launchpad.indicator.hide",
            IndicatorAction::Connect { .. } => "launchpad.indicator.connect",
            IndicatorAction::Refresh => "launchpad.indicator.refresh",
        }
    }

    /// Link target for tooltip markdown
    pub fn command_uri(&self) -> String {
        match self {
            IndicatorAction::Connect { integration } => {
                format!("command:{}?{}", self.command_id(), integration)
            }
            _ => format!("command:{}", self.command_id()),
        }
    }
}

/// What executing an action did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionOutcome {
    Hidden,
    HideDeclined,
    ConnectRequested,
    RefreshRequested,
    /// The action does not apply in the current state
    Ignored,
}

/// Host-side confirmation prompt
pub trait Confirm {
    fn confirm(&self, message: &str) -> bool;
}

/// Answer decided before the prompt is shown, e.g. by the caller of an
/// HTTP command
#[derive(Debug, Clone, Copy)]
pub struct Preconfirmed(pub bool);

impl Confirm for Preconfirmed {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_uris() {
        assert_eq!(
            IndicatorAction::Hide.command_uri(),
            "command:launchpad.indicator.hide"
        );
        assert_eq!(
            IndicatorAction::Connect {
                integration: IntegrationId::GitLab
            }
            .command_uri(),
            "command:launchpad.indicator.connect?gitlab"
        );
    }

    #[test]
    fn test_action_json_is_tagged() {
        let action: IndicatorAction =
            serde_json::from_str(r#"{"action":"connect","integration":"github"}"#).unwrap();
        assert_eq!(
            action,
            IndicatorAction::Connect {
                integration: IntegrationId::GitHub
            }
        );
    }
}
