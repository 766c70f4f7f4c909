use crate::event::{HandlerId, HandlerResult, RoutingEvent};
use crate::message::IncomingMessage;
use crate::router::{MessageRouter, RouteOutcome, RouterContext};
use crate::tab::ChatTab;
use crate::window::ChatWindow;

/// Draws the current window and tab state.
pub trait Renderer {
    fn draw_window(&mut self, index: usize, window: &ChatWindow);
    fn draw_tab(&mut self, tab: &ChatTab);
}

/// The two points where the host hands control to the overlay.
pub trait Router {
    /// Draws every chat window. Returns false when the overlay is disabled and
    /// the host should draw its own chat instead.
    fn render_all(&self, renderer: &mut dyn Renderer) -> bool;

    /// Called once per incoming chat line.
    fn route(&mut self, incoming: IncomingMessage);
}

/// Routing context plus router, wired to the host through `Router`.
#[derive(Debug)]
pub struct ChatOverlay {
    context: RouterContext,
    router: MessageRouter,
}

impl ChatOverlay {
    pub fn new(context: RouterContext) -> Self {
        Self {
            context,
            router: MessageRouter::new(),
        }
    }

    pub fn context(&self) -> &RouterContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut RouterContext {
        &mut self.context
    }

    pub fn register_handler<F>(&mut self, name: impl Into<String>, handler: F) -> HandlerId
    where
        F: FnMut(&mut RoutingEvent) -> HandlerResult + Send + 'static,
    {
        self.router.register_handler(name, handler)
    }

    pub fn register_handler_with_priority<F>(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        handler: F,
    ) -> HandlerId
    where
        F: FnMut(&mut RoutingEvent) -> HandlerResult + Send + 'static,
    {
        self.router
            .handlers_mut()
            .register_with_priority(name, priority, handler)
    }

    pub fn unregister_handler(&mut self, id: HandlerId) -> bool {
        self.router.unregister_handler(id)
    }

    /// Same as `Router::route`, but reports what happened.
    pub fn route_message(&mut self, incoming: IncomingMessage) -> RouteOutcome {
        self.router.route(&mut self.context, incoming)
    }
}

impl Router for ChatOverlay {
    fn render_all(&self, renderer: &mut dyn Renderer) -> bool {
        if !self.context.is_enabled() {
            return false;
        }

        if self.context.windows_tabs_enabled() {
            for (index, window) in self.context.windows().iter().enumerate() {
                renderer.draw_window(index, window);
            }
        } else {
            renderer.draw_tab(self.context.default_tab());
        }
        true
    }

    fn route(&mut self, incoming: IncomingMessage) {
        self.route_message(incoming);
    }
}
