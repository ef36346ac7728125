//! Indicator state and the data it renders

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IndicatorError;

/// Connected service accounts that gate whether items can be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationId {
    GitHub,
    GitLab,
}

impl IntegrationId {
    pub const ALL: [IntegrationId; 2] = [IntegrationId::GitHub, IntegrationId::GitLab];

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationId::GitHub => "github",
            IntegrationId::GitLab => "gitlab",
        }
    }
}

impl fmt::Display for IntegrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegrationId {
    type Err = IndicatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(IntegrationId::GitHub),
            "gitlab" => Ok(IntegrationId::GitLab),
            other => Err(IndicatorError::UnknownIntegration(other.to_string())),
        }
    }
}

/// Actionability bucket an item has been sorted into by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Mergeable,
    Blocked,
    FollowUp,
    NeedsReview,
    WaitingForReview,
    Draft,
    Other,
    Snoozed,
}

impl Category {
    /// Categories that can be configured as indicator groups
    pub const ATTENTION: [Category; 4] = [
        Category::Mergeable,
        Category::Blocked,
        Category::FollowUp,
        Category::NeedsReview,
    ];

    pub fn is_attention(&self) -> bool {
        Self::ATTENTION.contains(self)
    }
}

/// A single categorized item from the notification feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchpadItem {
    pub repository: String,
    pub number: u64,
    pub title: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Items delivered by one completed refresh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchpadSnapshot {
    pub items: Vec<LaunchpadItem>,
    pub refreshed_at: DateTime<Utc>,
}

impl LaunchpadSnapshot {
    pub fn new(items: Vec<LaunchpadItem>) -> Self {
        Self {
            items,
            refreshed_at: Utc::now(),
        }
    }
}

/// The single active state of the indicator
#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorState {
    /// Indicator hidden or polling disabled
    Idle,
    /// No integration connected
    Disconnected,
    /// First fetch pending
    Loading,
    /// Rendered from the latest payload
    Load(LaunchpadSnapshot),
}

impl IndicatorState {
    pub fn name(&self) -> &'static str {
        match self {
            IndicatorState::Idle => "idle",
            IndicatorState::Disconnected => "disconnected",
            IndicatorState::Loading => "loading",
            IndicatorState::Load(_) => "load",
        }
    }

    /// Loading and load are the states that keep the refresh schedule alive
    pub fn is_polling(&self) -> bool {
        matches!(self, IndicatorState::Loading | IndicatorState::Load(_))
    }

    pub fn same_kind(&self, other: &IndicatorState) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Default for IndicatorState {
    fn default() -> Self {
        IndicatorState::Idle
    }
}
