use std::collections::HashMap;

use crate::error::{NotFoundSnafu, RoutingResult};
use crate::event::{HandlerId, HandlerResult, RoutingEvent, RoutingHandlers, TabRef};
use crate::matcher::TabMatcher;
use crate::message::{IncomingMessage, SequenceId};
use crate::tab::ChatTab;
use crate::window::ChatWindow;

/// Configuration and tab registry the router reads from and delivers into.
#[derive(Debug, Clone)]
pub struct RouterContext {
    enabled: bool,
    windows_tabs_enabled: bool,
    windows: Vec<ChatWindow>,
    default_tab: ChatTab,
}

impl RouterContext {
    /// Creates an enabled context in single-tab mode.
    pub fn new(default_tab: ChatTab) -> Self {
        Self {
            enabled: true,
            windows_tabs_enabled: false,
            windows: Vec::new(),
            default_tab,
        }
    }

    pub fn with_windows(mut self, windows: Vec<ChatWindow>) -> Self {
        self.windows = windows;
        self.windows_tabs_enabled = true;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn windows_tabs_enabled(&self) -> bool {
        self.windows_tabs_enabled
    }

    pub fn set_windows_tabs_enabled(&mut self, enabled: bool) {
        self.windows_tabs_enabled = enabled;
    }

    pub fn windows(&self) -> &[ChatWindow] {
        &self.windows
    }

    pub fn window_mut(&mut self, index: usize) -> Option<&mut ChatWindow> {
        self.windows.get_mut(index)
    }

    pub fn find_window(&self, name: &str) -> Option<&ChatWindow> {
        self.windows.iter().find(|window| window.name() == name)
    }

    pub fn push_window(&mut self, window: ChatWindow) {
        self.windows.push(window);
    }

    pub fn remove_window(&mut self, name: &str) -> RoutingResult<ChatWindow> {
        let index = self
            .windows
            .iter()
            .position(|window| window.name() == name)
            .ok_or_else(|| {
                NotFoundSnafu {
                    stage: "remove-chat-window",
                    entity: "window",
                    name: name.to_string(),
                }
                .build()
            })?;
        Ok(self.windows.remove(index))
    }

    /// Replaces the window layout after a configuration edit.
    ///
    /// Tabs that keep their window and tab name keep their message log.
    pub fn replace_windows(&mut self, windows: Vec<ChatWindow>) {
        let mut previous_tabs = HashMap::new();
        for window in std::mem::take(&mut self.windows) {
            let window_name = window.name().to_string();
            for tab in window.into_tabs() {
                previous_tabs
                    .entry((window_name.clone(), tab.name().to_string()))
                    .or_insert(tab);
            }
        }

        self.windows = windows;
        for window in &mut self.windows {
            let window_name = window.name().to_string();
            let mut index = 0;
            while let Some(tab) = window.tab_mut(index) {
                if let Some(previous) =
                    previous_tabs.remove(&(window_name.clone(), tab.name().to_string()))
                {
                    tab.adopt_messages(previous);
                }
                index += 1;
            }
        }
    }

    pub fn default_tab(&self) -> &ChatTab {
        &self.default_tab
    }

    /// Replaces the default tab's settings, keeping its message log.
    pub fn replace_default_tab(&mut self, tab: ChatTab) {
        let previous = std::mem::replace(&mut self.default_tab, tab);
        self.default_tab.adopt_messages(previous);
    }

    pub fn tab(&self, target: TabRef) -> Option<&ChatTab> {
        match target {
            TabRef::Default => Some(&self.default_tab),
            TabRef::Window { window, tab } => {
                self.windows.get(window).and_then(|window| window.tab(tab))
            }
        }
    }

    pub fn tab_mut(&mut self, target: TabRef) -> Option<&mut ChatTab> {
        match target {
            TabRef::Default => Some(&mut self.default_tab),
            TabRef::Window { window, tab } => self
                .windows
                .get_mut(window)
                .and_then(|window| window.tab_mut(tab)),
        }
    }

    /// The default tab, then every window tab in window and tab order.
    pub fn tabs(&self) -> impl Iterator<Item = (TabRef, &ChatTab)> {
        let window_tabs = self.windows.iter().enumerate().flat_map(|(window_index, window)| {
            window
                .sorted_tabs()
                .iter()
                .enumerate()
                .map(move |(tab_index, tab)| {
                    let target = TabRef::Window {
                        window: window_index,
                        tab: tab_index,
                    };
                    (target, tab)
                })
        });
        std::iter::once((TabRef::Default, &self.default_tab)).chain(window_tabs)
    }

    /// Flips the deletable flag on every delivered copy of `sequence_id` and
    /// returns how many tabs held one.
    pub fn set_deletable(&mut self, sequence_id: SequenceId, deletable: bool) -> usize {
        let mut changed = usize::from(self.default_tab.set_deletable(sequence_id, deletable));
        for window in &mut self.windows {
            let mut index = 0;
            while let Some(tab) = window.tab_mut(index) {
                changed += usize::from(tab.set_deletable(sequence_id, deletable));
                index += 1;
            }
        }
        changed
    }
}

/// Chooses the destination tabs for one message text.
///
/// In multi-window mode every window is scanned in order with its own priority
/// watermark. A tab is skipped without evaluating its rule when a tab matched
/// earlier in the same window with a strictly higher priority, unless the tab
/// is `always_add`. A matching `skip_others` tab ends its window's scan.
pub fn select_destinations(context: &RouterContext, text: &str) -> Vec<TabRef> {
    if !context.windows_tabs_enabled {
        return vec![TabRef::Default];
    }

    let mut destinations = Vec::new();
    for (window_index, window) in context.windows.iter().enumerate() {
        let mut last_priority: Option<i32> = None;
        for (tab_index, tab) in window.sorted_tabs().iter().enumerate() {
            let priority = tab.priority();
            if last_priority.is_some_and(|last| last > priority) && !tab.always_add() {
                continue;
            }
            if !tab.matches(text) {
                continue;
            }

            destinations.push(TabRef::Window {
                window: window_index,
                tab: tab_index,
            });
            if tab.skip_others() {
                break;
            }
            if !tab.always_add() {
                last_priority = Some(priority);
            }
        }
    }
    destinations
}

/// What one `route` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Disabled,
    NoDestinations,
    Suppressed,
    Delivered { tabs: usize },
}

/// Routes chat lines into tabs and owns the routing handler registry.
#[derive(Debug, Default)]
pub struct MessageRouter {
    handlers: RoutingHandlers,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handlers(&self) -> &RoutingHandlers {
        &self.handlers
    }

    pub fn handlers_mut(&mut self) -> &mut RoutingHandlers {
        &mut self.handlers
    }

    pub fn register_handler<F>(&mut self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&mut RoutingEvent) -> HandlerResult + Send + 'static,
    {
        self.handlers.register(name, handler)
    }

    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        self.handlers.unregister(id)
    }

    /// Routes one incoming chat line.
    ///
    /// Delivery is all-or-nothing: a suppressing handler cancels it for every
    /// destination, otherwise each destination gets exactly one copy.
    pub fn route(
        &mut self,
        context: &mut RouterContext,
        incoming: IncomingMessage,
    ) -> RouteOutcome {
        if !context.enabled {
            return RouteOutcome::Disabled;
        }

        let destinations = select_destinations(context, &incoming.content);
        if destinations.is_empty() {
            tracing::debug!("message {} matched no tab", incoming.sequence_id.0);
            return RouteOutcome::NoDestinations;
        }

        let mut event = RoutingEvent::new(incoming.into(), destinations);
        self.handlers.publish(&mut event);
        if event.is_suppressed() {
            tracing::debug!(
                "message {} suppressed by a routing handler",
                event.message().sequence_id().0
            );
            return RouteOutcome::Suppressed;
        }

        let (message, destinations) = event.into_delivery();
        let mut delivered = 0;
        for destination in destinations {
            match context.tab_mut(destination) {
                Some(tab) => {
                    tab.add_message(message.clone());
                    delivered += 1;
                }
                None => tracing::warn!("destination {:?} vanished before delivery", destination),
            }
        }

        tracing::debug!(
            "message {} delivered to {} tab(s)",
            message.sequence_id().0,
            delivered
        );
        RouteOutcome::Delivered { tabs: delivered }
    }
}
