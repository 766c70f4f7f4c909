#![deny(unsafe_code)]

/// Settings file loading and reload.
pub mod state;
pub mod types;

pub use state::{SETTINGS_DIRECTORY_NAME, SETTINGS_FILE_NAME, SettingsError, SettingsStore};
pub use types::{
    BrokenTab, ChatPlusSettings, DEFAULT_TAB_NAME, DEFAULT_WINDOW_NAME, MAX_MAX_MESSAGES,
    MIN_MAX_MESSAGES, MatchKind, TabSettings, WindowSettings,
};
