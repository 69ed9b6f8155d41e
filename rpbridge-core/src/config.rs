//! # Configuration Module
//!
//! Handles loading the ReportPortal connection and launch settings from an
//! optional `rpbridge.toml` file and from `REPORT_PORTAL_*` environment
//! variables.
//!
//! ## Configuration Loading Flow (block diagram)
//!
//! ```text
//! +-------------------+     +-------------------+     +-------------------+
//! | .env file         | --> | dotenv            | --> | process env       |
//! | (optional)        |     |                   |     |                   |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!                                                              v
//! +-------------------+     +-------------------+     +-------------------+
//! | RPBRIDGE_CONFIG   | --> | rpbridge.toml     | --> | Config struct     |
//! | or ./rpbridge.toml|     | (deserialization) |     | (file values)     |
//! +-------------------+     +-------------------+     +-------------------+
//!                                                              |
//!                                                              v
//!                           +-------------------+     +-------------------+
//!                           | REPORT_PORTAL_*   | --> | Config struct     |
//!                           | env overrides     |     | (final values)    |
//!                           +-------------------+     +-------------------+
//! ```
//!
//! ## Environment Variables
//!
//! | Variable                      | Setting       |
//! |-------------------------------|---------------|
//! | `REPORT_PORTAL_BASE_URL`      | `base_url`    |
//! | `REPORT_PORTAL_TOKEN`         | `token`       |
//! | `REPORT_PORTAL_PROJECT_NAME`  | `project`     |
//! | `REPORT_PORTAL_LAUNCH_NAME`   | `launch`      |
//! | `REPORT_PORTAL_DESCRIPTION`   | `description` |
//! | `REPORT_PORTAL_TAGS`          | `tags`        |
//!
//! `REPORT_PORTAL_TAGS` is a comma-separated list, e.g. `smoke,ci`.
//!
//! ## Config File
//!
//! ```toml
//! base_url = "https://reportportal.example.com"
//! project = "default_personal"
//! launch = "nightly"
//! description = "nightly regression run"
//! tags = ["nightly", "regression"]
//! ```

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::{io::Read, path::Path};
use tracing::*;

use crate::{Error, Result};

/// Environment variable name for specifying the config file path.
const RPBRIDGE_CONFIG_ENV: &str = "RPBRIDGE_CONFIG";

/// Prefix shared by every setting read from the environment.
const ENV_PREFIX: &str = "REPORT_PORTAL_";

/// Path segment appended to `base_url` to reach the API.
const API_PATH: &str = "/api/v1";

static CONFIG: Lazy<Config> = Lazy::new(|| {
    let _ = dotenv::dotenv();
    Config::load().unwrap_or_else(|e| {
        error!("{e}; falling back to environment only");
        let mut cfg = Config::default();
        cfg.load_env();
        cfg
    })
});

/// Get the process-wide configuration. It is loaded on first access.
pub fn get_config() -> &'static Config {
    &CONFIG
}

/// rpbridge's configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// Base URL of the ReportPortal server, without the API path.
    #[serde(default)]
    pub base_url: Option<String>,
    /// API access token.
    #[serde(default)]
    pub token: Option<String>,
    /// ReportPortal project name.
    #[serde(default)]
    pub project: Option<String>,
    /// Launch name. Falls back to the project name when unset.
    #[serde(default)]
    pub launch: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Launch tags. Entries read from `REPORT_PORTAL_TAGS` are trimmed and
    /// empty ones dropped, so an empty variable yields an empty list.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Config {
    /// Load configuration from path. A missing file yields the defaults.
    fn load_from(path: &Path) -> Result<Config> {
        let Ok(mut file) = std::fs::File::open(path) else {
            let mut cfg = Config::default();
            cfg.load_env();
            return Ok(cfg);
        };

        let mut buf = String::new();
        file.read_to_string(&mut buf)
            .map_err(|e| Error::LoadError(e.to_string()))?;

        let mut cfg: Config = toml::from_str(&buf).map_err(|e| {
            Error::LoadError(format!(
                "failed to deserialize rpbridge.toml into rpbridge::Config: {e}"
            ))
        })?;

        debug!("rpbridge.toml was successfully loaded: {cfg:#?}");

        cfg.load_env();

        Ok(cfg)
    }

    /// Load configuration.
    ///
    /// Loading order:
    /// 1. If `RPBRIDGE_CONFIG` env var is set, load from that path
    /// 2. Otherwise, load from `rpbridge.toml` in the current directory
    /// 3. Apply `REPORT_PORTAL_*` environment overrides
    pub fn load() -> Result<Config> {
        match std::env::var(RPBRIDGE_CONFIG_ENV) {
            Ok(path) => {
                let path = Path::new(&path);

                // Detect misuse: if it doesn't look like a file path, error out
                if path.extension().is_none_or(|ext| ext != "toml")
                    && !path.to_string_lossy().contains(std::path::MAIN_SEPARATOR)
                    && !path.to_string_lossy().contains('/')
                {
                    return Err(Error::LoadError(format!(
                        "{RPBRIDGE_CONFIG_ENV} should be a path to a config file, not a config value. \
                         Got: {path:?}. Use {ENV_PREFIX}<KEY>=value for settings instead."
                    )));
                }

                if !path.exists() {
                    return Err(Error::LoadError(format!(
                        "Config file specified by {RPBRIDGE_CONFIG_ENV} not found: {path:?}"
                    )));
                }

                debug!("Loading config from {RPBRIDGE_CONFIG_ENV}={path:?}");
                Config::load_from(path)
            }
            Err(_) => Config::load_from(Path::new("rpbridge.toml")),
        }
    }

    /// Apply `REPORT_PORTAL_*` variables from the process environment.
    fn load_env(&mut self) {
        debug!("Loading configuration from env");
        self.apply_env(std::env::vars());
    }

    /// Apply `REPORT_PORTAL_*` overrides from the given key/value pairs.
    /// Unknown keys are ignored.
    pub fn apply_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(setting) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match setting {
                "BASE_URL" => self.base_url = Some(value),
                "TOKEN" => self.token = Some(value),
                "PROJECT_NAME" => self.project = Some(value),
                "LAUNCH_NAME" => self.launch = Some(value),
                "DESCRIPTION" => self.description = Some(value),
                "TAGS" => self.tags = Some(split_tags(&value)),
                _ => trace!("ignoring unknown setting {key}"),
            }
        }
    }

    /// API endpoint, i.e. `base_url` followed by `/api/v1`.
    pub fn endpoint(&self) -> Result<String> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| Error::ValueNotFound("base_url".into()))?;
        Ok(format!("{}{API_PATH}", base_url.trim_end_matches('/')))
    }

    /// Launch name, falling back to the project name when the launch name is unset or empty.
    pub fn launch_name(&self) -> Option<&str> {
        self.launch
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.project.as_deref())
    }
}

fn split_tags(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
