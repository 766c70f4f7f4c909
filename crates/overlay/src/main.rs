use std::io;
use std::process::ExitCode;

use chatplus::{HostArgs, SENDER_HANDLER_NAME, run, sender_handler};
use chatplus_routing::ChatOverlay;
use chatplus_settings::SettingsStore;

/// Terminal host for the chat overlay.
///
/// 1. Loads settings (defaults when the file is missing or malformed)
/// 2. Builds the routing context and registers the sender handler
/// 3. Routes every stdin line as one chat message
/// 4. Draws all chat windows to stdout on `::render` and at end of input
/// 5. Re-applies the settings file on `::reload`, keeping tab logs
fn main() -> ExitCode {
    // Logs go to stderr so stdout only carries rendered chat.
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let args = match HostArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(error) => {
            tracing::error!("{}", error);
            eprintln!("usage: chatplus [--settings <path>]");
            return ExitCode::FAILURE;
        }
    };

    let store = match args.settings_path {
        Some(path) => SettingsStore::open(path),
        None => SettingsStore::open_default(),
    };
    tracing::info!("using settings from {:?}", store.config_path());

    let mut overlay = ChatOverlay::new(store.settings().build_context());
    overlay.register_handler(SENDER_HANDLER_NAME, sender_handler());

    let stdin = io::stdin();
    let stdout = io::stdout();
    match run(&mut overlay, Some(&store), stdin.lock(), stdout.lock()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!("{}", error);
            ExitCode::FAILURE
        }
    }
}
