use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Format, Json, Serialized},
};
use snafu::{ResultExt, Snafu};

use crate::types::ChatPlusSettings;

pub const SETTINGS_DIRECTORY_NAME: &str = "chatplus";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Chat layout loaded from a JSON file, re-readable while the overlay runs.
///
/// The snapshot only changes when the file parses; a missing or malformed file
/// during `reload` keeps the layout the overlay is already routing with.
pub struct SettingsStore {
    settings: ArcSwap<ChatPlusSettings>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".chatplus"))
            .join(SETTINGS_FILE_NAME)
    }

    /// Opens `config_path`. On first run the defaults are written there so the
    /// layout has a file to edit; a malformed file is left untouched.
    pub fn open(config_path: PathBuf) -> Self {
        let settings = match read_settings(&config_path) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::info!("settings file not found at {:?}, using defaults", config_path);
                let defaults = ChatPlusSettings::default();
                if let Err(error) = write_settings(&config_path, &defaults) {
                    tracing::warn!("could not write default settings: {}", error);
                }
                defaults
            }
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    config_path,
                    error
                );
                ChatPlusSettings::default()
            }
        };

        Self {
            settings: ArcSwap::from_pointee(settings),
            config_path,
        }
    }

    pub fn open_default() -> Self {
        Self::open(Self::default_config_path())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> Arc<ChatPlusSettings> {
        self.settings.load_full()
    }

    /// Re-reads the settings file after it was edited and returns the snapshot
    /// now in effect.
    pub fn reload(&self) -> Arc<ChatPlusSettings> {
        match read_settings(&self.config_path) {
            Ok(Some(settings)) => {
                tracing::info!("reloaded settings from {:?}", self.config_path);
                self.settings.store(Arc::new(settings));
            }
            Ok(None) => {
                tracing::warn!(
                    "settings file {:?} disappeared, keeping current layout",
                    self.config_path
                );
            }
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. keeping current layout",
                    self.config_path,
                    error
                );
            }
        }
        self.settings()
    }
}

/// `Ok(None)` when there is no file yet.
fn read_settings(path: &Path) -> Result<Option<ChatPlusSettings>, figment::Error> {
    if !path.exists() {
        return Ok(None);
    }

    let settings = Figment::from(Serialized::defaults(ChatPlusSettings::default()))
        .merge(Json::file(path))
        .extract::<ChatPlusSettings>()?
        .normalized();

    for broken in settings.broken_tabs() {
        let location = match &broken.window {
            Some(window) => format!("window '{window}'"),
            None => "single-tab mode".to_string(),
        };
        tracing::warn!(
            "tab '{}' in {} of {:?} will never match: {}",
            broken.tab,
            location,
            path,
            broken.reason
        );
    }
    Ok(Some(settings))
}

fn write_settings(path: &Path, settings: &ChatPlusSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context(CreateDirSnafu {
            stage: "create-settings-directory",
            path: parent.to_path_buf(),
        })?;
    }

    let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
        stage: "serialize-settings-json",
    })?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, content).context(WriteFileSnafu {
        stage: "write-temporary-settings-file",
        path: temp_path.clone(),
    })?;

    std::fs::rename(&temp_path, path).context(RenameTempFileSnafu {
        stage: "rename-temporary-settings-file",
        from: temp_path,
        to: path.to_path_buf(),
    })?;

    tracing::info!("wrote settings to {:?}", path);
    Ok(())
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}
