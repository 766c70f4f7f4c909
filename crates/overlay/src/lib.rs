#![deny(unsafe_code)]

/// Terminal host: argument parsing and the stdin message loop.
pub mod host;
pub mod renderer;
/// Sender detection for incoming chat lines.
pub mod sender;

pub use host::{
    DELETABLE_COMMAND, FIND_COMMAND, HostArgs, HostSummary, OverlayError, RELOAD_COMMAND,
    RENDER_COMMAND, run,
};
pub use renderer::TextRenderer;
pub use sender::{SENDER_HANDLER_NAME, detect_sender, sender_handler};
