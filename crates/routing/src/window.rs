use crate::error::{NotFoundSnafu, RoutingResult};
use crate::tab::ChatTab;

/// Independently configured group of tabs.
///
/// Tab order is the display order and also the order the router evaluates
/// tabs in.
#[derive(Debug, Clone, Default)]
pub struct ChatWindow {
    name: String,
    tabs: Vec<ChatTab>,
}

impl ChatWindow {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tabs: Vec::new(),
        }
    }

    pub fn with_tab(mut self, tab: ChatTab) -> Self {
        self.tabs.push(tab);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tabs in evaluation order.
    pub fn sorted_tabs(&self) -> &[ChatTab] {
        &self.tabs
    }

    pub fn tab(&self, index: usize) -> Option<&ChatTab> {
        self.tabs.get(index)
    }

    pub fn tab_mut(&mut self, index: usize) -> Option<&mut ChatTab> {
        self.tabs.get_mut(index)
    }

    pub fn find_tab(&self, name: &str) -> Option<&ChatTab> {
        self.tabs.iter().find(|tab| tab.name() == name)
    }

    pub fn push_tab(&mut self, tab: ChatTab) {
        self.tabs.push(tab);
    }

    pub fn remove_tab(&mut self, name: &str) -> RoutingResult<ChatTab> {
        let index = self
            .tabs
            .iter()
            .position(|tab| tab.name() == name)
            .ok_or_else(|| {
                NotFoundSnafu {
                    stage: "remove-window-tab",
                    entity: "tab",
                    name: name.to_string(),
                }
                .build()
            })?;
        Ok(self.tabs.remove(index))
    }

    /// Reorders tabs by descending priority; equal priorities keep their order.
    pub fn sort_tabs_by_priority(&mut self) {
        self.tabs
            .sort_by(|left, right| right.priority().cmp(&left.priority()));
    }

    pub(crate) fn into_tabs(self) -> Vec<ChatTab> {
        self.tabs
    }
}
