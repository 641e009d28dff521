use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use chrono::FixedOffset;
use queueboard_core::{MatchSettings, LOBBY_CREATE_TIMEOUT_KEY, LOBBY_JOIN_TIMEOUT_KEY};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Config file looked up in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG_PATH: &str = "queueboard.toml";

const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;

/// Errors raised while loading the TOML config.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("display.utc_offset_hours = {hours} is outside -23..=23")]
    InvalidOffset { hours: i32 },
}

/// Contents of `queueboard.toml`. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    pub(crate) window: WindowConfig,
    pub(crate) display: DisplayConfig,
    pub(crate) sources: SourcesConfig,
    pub(crate) assets: AssetsConfig,
    /// Raw key/value settings, resolved through [`MatchSettings::from_lookup`].
    pub(crate) settings: BTreeMap<String, toml::Value>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct WindowConfig {
    pub(crate) title: String,
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) vsync: bool,
    pub(crate) show_fps: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Queue Board".to_owned(),
            width: 1280,
            height: 800,
            vsync: true,
            show_fps: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct DisplayConfig {
    /// Offset applied to displayed timestamps.
    pub(crate) utc_offset_hours: i32,
    pub(crate) grid_spacing: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            grid_spacing: 40.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SourcesConfig {
    /// JSON file holding the latest queue snapshot.
    pub(crate) snapshot: Option<PathBuf>,
    /// JSON file holding the current match, if any.
    pub(crate) match_info: Option<PathBuf>,
    pub(crate) poll_interval_ms: u64,
    /// Seed for the simulated queue.
    pub(crate) seed: Option<u64>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            match_info: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            seed: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct AssetsConfig {
    /// TTF font able to render Japanese labels.
    pub(crate) font: Option<PathBuf>,
    /// Directory holding `roles/<role>.png` or an `icons.toml` manifest.
    pub(crate) icon_dir: Option<PathBuf>,
}

impl Config {
    /// Loads the config at `path`, or [`DEFAULT_CONFIG_PATH`] when none is given.
    ///
    /// A missing file yields the defaults. Relative paths inside the file are
    /// resolved against the file's directory.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path.is_some();
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                if explicit {
                    warn!(path = %path.display(), "config file not found; using defaults");
                } else {
                    debug!(path = %path.display(), "no config file; using defaults");
                }
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut config = Self::parse(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub(crate) fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.sources.snapshot,
            &mut self.sources.match_info,
            &mut self.assets.font,
            &mut self.assets.icon_dir,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Offset applied to displayed timestamps.
    pub(crate) fn display_offset(&self) -> Result<FixedOffset, ConfigError> {
        let hours = self.display.utc_offset_hours;
        if !(-23..=23).contains(&hours) {
            return Err(ConfigError::InvalidOffset { hours });
        }
        FixedOffset::east_opt(hours * 3_600).ok_or(ConfigError::InvalidOffset { hours })
    }

    /// `[settings]` entries rendered as strings. Tables and arrays are skipped.
    pub(crate) fn settings_lookup(&self) -> Vec<(String, String)> {
        self.settings
            .iter()
            .filter_map(|(key, value)| {
                let text = match value {
                    toml::Value::String(text) => text.clone(),
                    toml::Value::Integer(number) => number.to_string(),
                    toml::Value::Float(number) => number.to_string(),
                    toml::Value::Boolean(flag) => flag.to_string(),
                    toml::Value::Datetime(datetime) => datetime.to_string(),
                    toml::Value::Array(_) | toml::Value::Table(_) => {
                        warn!(key = %key, "ignoring non-scalar setting");
                        return None;
                    }
                };
                Some((key.clone(), text))
            })
            .collect()
    }

    /// Lobby timeouts, falling back to the defaults for unusable values.
    pub(crate) fn match_settings(&self) -> MatchSettings {
        let lookup = self.settings_lookup();
        for (key, value) in &lookup {
            let known = key == LOBBY_CREATE_TIMEOUT_KEY || key == LOBBY_JOIN_TIMEOUT_KEY;
            if known && MatchSettings::parse_timeout(value).is_none() {
                warn!(key = %key, value = %value, "rejected timeout setting; using the default");
            }
        }
        MatchSettings::from_lookup(lookup)
    }
}
