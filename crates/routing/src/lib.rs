#![deny(unsafe_code)]

//! Multi-window chat tab routing.
//!
//! Incoming chat lines are matched against the tabs of every chat window,
//! filtered by per-window priority rules, offered to routing handlers that may
//! rewrite or veto them, and finally appended to each destination tab's log.

pub mod error;
/// Routing event and its handler registry.
pub mod event;
pub mod matcher;
/// Chat line values as received and as delivered.
pub mod message;
pub mod overlay;
pub mod router;
pub mod tab;
pub mod window;

pub use error::{RoutingError, RoutingResult};
pub use event::{
    HandlerError, HandlerId, HandlerResult, RoutingEvent, RoutingHandlers, TabRef,
};
pub use matcher::{KeywordRule, PatternRule, TabMatcher, TabRule};
pub use message::{IncomingMessage, Message, MessageSignature, MessageTag, SequenceId};
pub use overlay::{ChatOverlay, Renderer, Router};
pub use router::{MessageRouter, RouteOutcome, RouterContext, select_destinations};
pub use tab::{ChatTab, DEFAULT_MAX_MESSAGES};
pub use window::ChatWindow;
