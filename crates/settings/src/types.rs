use std::collections::HashSet;

use chatplus_routing::{ChatTab, ChatWindow, DEFAULT_MAX_MESSAGES, RouterContext, TabRule};
use serde::{Deserialize, Serialize};

pub const MIN_MAX_MESSAGES: usize = 1_000;
pub const MAX_MAX_MESSAGES: usize = 10_000_000;
pub const DEFAULT_TAB_NAME: &str = "All";
pub const DEFAULT_WINDOW_NAME: &str = "Main";

/// How a tab interprets its `pattern` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    #[default]
    Regex,
    Substring,
    /// Comma separated whole-word keywords.
    Keywords,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSettings {
    pub name: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub match_kind: MatchKind,
    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub always_add: bool,
    #[serde(default)]
    pub skip_others: bool,
}

impl Default for TabSettings {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_NAME, "")
    }
}

impl TabSettings {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            match_kind: MatchKind::Regex,
            case_sensitive: default_case_sensitive(),
            priority: 0,
            always_add: false,
            skip_others: false,
        }
    }

    fn normalized(mut self) -> Option<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return None;
        }

        Some(self)
    }

    pub fn to_rule(&self) -> TabRule {
        match self.match_kind {
            MatchKind::Regex => TabRule::pattern(self.pattern.as_str(), self.case_sensitive),
            MatchKind::Substring => TabRule::substring(self.pattern.as_str(), self.case_sensitive),
            MatchKind::Keywords => TabRule::keywords(self.pattern.split(','), self.case_sensitive),
        }
    }

    fn build_error(&self) -> Option<String> {
        self.to_rule().build_error().map(str::to_string)
    }

    pub fn to_tab(&self, max_messages: usize) -> ChatTab {
        ChatTab::new(self.name.as_str(), self.to_rule())
            .with_priority(self.priority)
            .with_always_add(self.always_add)
            .with_skip_others(self.skip_others)
            .with_max_messages(max_messages)
    }
}

/// Configured tab whose rule failed to build and will never match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokenTab {
    /// `None` for the default tab.
    pub window: Option<String>,
    pub tab: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tabs: Vec<TabSettings>,
    /// Evaluate tabs by descending priority instead of listed order.
    #[serde(default)]
    pub sort_tabs_by_priority: bool,
}

impl WindowSettings {
    pub fn new(name: impl Into<String>, tabs: Vec<TabSettings>) -> Self {
        Self {
            name: name.into(),
            tabs,
            sort_tabs_by_priority: false,
        }
    }

    fn normalized(mut self, position: usize) -> Self {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            self.name = format!("Window {}", position + 1);
        }

        // Tab logs are carried across edits by name, so names must stay unique.
        let mut seen = HashSet::new();
        self.tabs = self
            .tabs
            .into_iter()
            .filter_map(TabSettings::normalized)
            .filter(|tab| {
                let fresh = seen.insert(tab.name.clone());
                if !fresh {
                    tracing::warn!(
                        "dropping duplicate tab '{}' in window '{}'",
                        tab.name,
                        self.name
                    );
                }
                fresh
            })
            .collect();
        self
    }

    pub fn to_window(&self, max_messages: usize) -> ChatWindow {
        let mut window = ChatWindow::new(self.name.as_str());
        for tab in &self.tabs {
            window.push_tab(tab.to_tab(max_messages));
        }
        if self.sort_tabs_by_priority {
            window.sort_tabs_by_priority();
        }
        window
    }
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_NAME, vec![TabSettings::default()])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPlusSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_enabled")]
    pub chat_windows_tabs_enabled: bool,
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    #[serde(default)]
    pub default_tab: TabSettings,
    #[serde(default = "default_windows")]
    pub windows: Vec<WindowSettings>,
}

impl Default for ChatPlusSettings {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            chat_windows_tabs_enabled: default_enabled(),
            max_messages: default_max_messages(),
            default_tab: TabSettings::default(),
            windows: default_windows(),
        }
    }
}

impl ChatPlusSettings {
    pub fn normalized(mut self) -> Self {
        self.max_messages = self.max_messages.clamp(MIN_MAX_MESSAGES, MAX_MAX_MESSAGES);
        self.default_tab = self.default_tab.normalized().unwrap_or_default();
        self.windows = self
            .windows
            .into_iter()
            .enumerate()
            .map(|(position, window)| window.normalized(position))
            .collect();
        self
    }

    /// Tabs whose pattern or keywords do not compile.
    pub fn broken_tabs(&self) -> Vec<BrokenTab> {
        let default_tab = self
            .default_tab
            .build_error()
            .map(|reason| BrokenTab {
                window: None,
                tab: self.default_tab.name.clone(),
                reason,
            });

        let window_tabs = self.windows.iter().flat_map(|window| {
            window.tabs.iter().filter_map(|tab| {
                tab.build_error().map(|reason| BrokenTab {
                    window: Some(window.name.clone()),
                    tab: tab.name.clone(),
                    reason,
                })
            })
        });

        default_tab.into_iter().chain(window_tabs).collect()
    }

    /// Builds a fresh routing context with empty tab logs.
    pub fn build_context(&self) -> RouterContext {
        let mut context = RouterContext::new(self.default_tab.to_tab(self.max_messages));
        self.apply_to(&mut context);
        context
    }

    /// Applies these settings to a live context, keeping the logs of tabs
    /// that survive the edit.
    pub fn apply_to(&self, context: &mut RouterContext) {
        context.set_enabled(self.enabled);
        context.set_windows_tabs_enabled(self.chat_windows_tabs_enabled);
        context.replace_default_tab(self.default_tab.to_tab(self.max_messages));
        context.replace_windows(
            self.windows
                .iter()
                .map(|window| window.to_window(self.max_messages))
                .collect(),
        );
    }
}

fn default_enabled() -> bool {
    true
}

fn default_case_sensitive() -> bool {
    true
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}

fn default_windows() -> Vec<WindowSettings> {
    vec![WindowSettings::default()]
}
