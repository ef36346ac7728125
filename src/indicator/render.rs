//! Maps indicator state and settings to what the surface displays

use serde::Serialize;

use crate::{
    config::{IconMode, IndicatorSettings, LabelMode},
    state::{Category, IndicatorState, IntegrationId, LaunchpadItem},
};

use super::actions::IndicatorAction;

pub const LAUNCHPAD_ICON: &str = "$(rocket)";
const LOADING_ICON: &str = "$(loading~spin)";
const TITLE_MAX_CHARS: usize = 24;

/// Theme colors the surface can paint the indicator with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IndicatorColor {
    Mergeable,
    Blocked,
    Attention,
}

impl IndicatorColor {
    pub fn theme_id(&self) -> &'static str {
        match self {
            IndicatorColor::Mergeable => "launchpadIndicator.mergeableColor",
            IndicatorColor::Blocked => "launchpadIndicator.blockedColor",
            IndicatorColor::Attention => "launchpadIndicator.attentionColor",
        }
    }
}

/// Display payload handed to the presentation surface
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderOutput {
    pub text: String,
    pub tooltip: String,
    pub color: Option<IndicatorColor>,
    /// Command bound to clicking the indicator
    pub command: Option<IndicatorAction>,
}

struct GroupStyle {
    icon: &'static str,
    color: IndicatorColor,
    singular: &'static str,
    plural: &'static str,
}

fn group_style(category: Category) -> GroupStyle {
    match category {
        Category::Mergeable => GroupStyle {
            icon: "$(git-merge)",
            color: IndicatorColor::Mergeable,
            singular: "can be merged",
            plural: "can be merged",
        },
        Category::Blocked => GroupStyle {
            icon: "$(error)",
            color: IndicatorColor::Blocked,
            singular: "is blocked",
            plural: "are blocked",
        },
        Category::FollowUp => GroupStyle {
            icon: "$(report)",
            color: IndicatorColor::Attention,
            singular: "requires follow-up",
            plural: "require follow-up",
        },
        _ => GroupStyle {
            icon: "$(comment-unresolved)",
            color: IndicatorColor::Attention,
            singular: "needs your review",
            plural: "need your review",
        },
    }
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn truncate(title: &str) -> String {
    if title.chars().count() <= TITLE_MAX_CHARS {
        return title.to_string();
    }
    let mut cut: String = title.chars().take(TITLE_MAX_CHARS - 1).collect();
    cut.push('…');
    cut
}

fn tooltip(body: &str, links: &[(&str, IndicatorAction)]) -> String {
    let mut out = format!("**Launchpad**\n\n{body}");
    if !links.is_empty() {
        let rendered: Vec<String> = links
            .iter()
            .map(|(label, action)| format!("[{label}]({})", action.command_uri()))
            .collect();
        out.push_str("\n\n---\n\n");
        out.push_str(&rendered.join(" | "));
    }
    out
}

/// Render the indicator. Deterministic for identical inputs.
pub fn render(state: &IndicatorState, settings: &IndicatorSettings) -> RenderOutput {
    match state {
        IndicatorState::Idle => RenderOutput {
            text: LAUNCHPAD_ICON.to_string(),
            tooltip: tooltip(
                "Polling is turned off. Pull requests will not refresh automatically.",
                &[("Hide", IndicatorAction::Hide)],
            ),
            color: None,
            command: None,
        },
        IndicatorState::Disconnected => {
            let links: Vec<(String, IndicatorAction)> = IntegrationId::ALL
                .iter()
                .map(|integration| {
                    (
                        format!("Connect {}", display_name(*integration)),
                        IndicatorAction::Connect {
                            integration: *integration,
                        },
                    )
                })
                .collect();
            let mut links: Vec<(&str, IndicatorAction)> =
                links.iter().map(|(label, action)| (label.as_str(), *action)).collect();
            links.push(("Hide", IndicatorAction::Hide));

            RenderOutput {
                text: format!("{LAUNCHPAD_ICON} Connect"),
                tooltip: tooltip(
                    "Connect an integration to see pull requests that need your attention.",
                    &links,
                ),
                color: None,
                command: Some(IndicatorAction::Connect {
                    integration: IntegrationId::GitHub,
                }),
            }
        }
        IndicatorState::Loading => RenderOutput {
            text: format!("{LAUNCHPAD_ICON} {LOADING_ICON}"),
            tooltip: tooltip("Loading…", &[("Hide", IndicatorAction::Hide)]),
            color: None,
            command: Some(IndicatorAction::Refresh),
        },
        IndicatorState::Load(snapshot) => render_items(&snapshot.items, settings),
    }
}

fn display_name(integration: IntegrationId) -> &'static str {
    match integration {
        IntegrationId::GitHub => "GitHub",
        IntegrationId::GitLab => "GitLab",
    }
}

fn render_items(items: &[LaunchpadItem], settings: &IndicatorSettings) -> RenderOutput {
    let links = [
        ("Refresh", IndicatorAction::Refresh),
        ("Hide", IndicatorAction::Hide),
    ];
    let groups = settings.group_order();

    let visible: Vec<&LaunchpadItem> = items
        .iter()
        .filter(|item| item.category != Category::Snoozed)
        .collect();

    let grouped: Vec<(Category, Vec<&LaunchpadItem>)> = groups
        .iter()
        .map(|category| {
            let members = visible
                .iter()
                .copied()
                .filter(|item| item.category == *category)
                .collect::<Vec<_>>();
            (*category, members)
        })
        .filter(|(_, members)| !members.is_empty())
        .collect();

    if visible.is_empty() {
        return RenderOutput {
            text: LAUNCHPAD_ICON.to_string(),
            tooltip: tooltip("You are all caught up!", &links),
            color: None,
            command: Some(IndicatorAction::Refresh),
        };
    }

    let Some((top_category, top_items)) = grouped.first() else {
        let body = format!(
            "No pull requests need your attention\n\n({} other {})",
            visible.len(),
            if visible.len() == 1 { "pull request" } else { "pull requests" }
        );
        return RenderOutput {
            text: LAUNCHPAD_ICON.to_string(),
            tooltip: tooltip(&body, &links),
            color: None,
            command: Some(IndicatorAction::Refresh),
        };
    };

    let top_style = group_style(*top_category);
    let lead = match settings.icon_mode() {
        IconMode::Default => LAUNCHPAD_ICON,
        IconMode::Group => top_style.icon,
    };

    let text = match settings.label_mode() {
        LabelMode::Item => {
            let top = top_items[0];
            format!("{lead} {}#{} {}", top.repository, top.number, truncate(&top.title))
        }
        LabelMode::Counts => {
            let counts: Vec<String> = grouped
                .iter()
                .map(|(category, members)| format!("{} {}", group_style(*category).icon, members.len()))
                .collect();
            match settings.icon_mode() {
                IconMode::Default => format!("{LAUNCHPAD_ICON} {}", counts.join("  ")),
                IconMode::Group => counts.join("  "),
            }
        }
    };

    let summary: Vec<String> = grouped
        .iter()
        .map(|(category, members)| {
            let style = group_style(*category);
            let verb = if members.len() == 1 { style.singular } else { style.plural };
            format!("{} {} {}", style.icon, pluralize(members.len(), "pull request"), verb)
        })
        .collect();

    RenderOutput {
        text,
        tooltip: tooltip(&summary.join("\n\n"), &links),
        color: settings.use_colors.then_some(top_style.color),
        command: Some(IndicatorAction::Refresh),
    }
}
