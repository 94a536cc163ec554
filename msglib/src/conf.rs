/*
 * msgview - configuration
 *
 * Copyright 2024 msgview contributors
 *
 * This file is part of msgview.
 *
 * msgview is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * msgview is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with msgview. If not, see <http://www.gnu.org/licenses/>.
 */

//! Configuration file parsing.
//!
//! ```toml
//! [accounts.work]
//! identity = "me@example.com"
//! root = "~/Mail/work"
//! default = true
//!
//! [log]
//! maximum_level = "DEBUG"
//!
//! [attachments]
//! download_dir = "~/Downloads"
//! ```

use std::{
    env,
    path::{Path, PathBuf},
    sync::Arc,
};

use indexmap::IndexMap;

use crate::{
    error::{Error, ErrorKind, Result, ResultIntoError},
    utils::{
        files::MAX_UNIQUE_FILE_ATTEMPTS,
        logging::{LogLevel, StderrLogger},
        shellexpand::ShellExpandTrait,
    },
};

pub const CONFIG_ENV_VAR: &str = "MSGVIEW_CONFIG";
pub const DOWNLOAD_DIR_ENV_VAR: &str = "MSGVIEW_DOWNLOAD_DIR";

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileAccount {
    pub identity: String,
    #[serde(default)]
    pub display_name: Option<String>,
    /// Root directory of the account's message store.
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub default: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    #[serde(default)]
    pub maximum_level: LogLevel,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AttachmentSettings {
    /// Where saved attachments go. Defaults to `$MSGVIEW_DOWNLOAD_DIR`, or
    /// `downloads` in the XDG data directory.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    #[serde(default = "max_unique_attempts_default")]
    pub max_unique_attempts: usize,
}

fn max_unique_attempts_default() -> usize {
    MAX_UNIQUE_FILE_ATTEMPTS
}

impl Default for AttachmentSettings {
    fn default() -> Self {
        Self {
            download_dir: None,
            max_unique_attempts: max_unique_attempts_default(),
        }
    }
}

impl AttachmentSettings {
    pub fn download_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.download_dir {
            return Ok(dir.expand());
        }
        if let Ok(dir) = env::var(DOWNLOAD_DIR_ENV_VAR) {
            return Ok(Path::new(&dir).expand());
        }
        let xdg_dirs = xdg::BaseDirectories::with_prefix("msgview")?;
        xdg_dirs
            .create_data_directory("downloads")
            .chain_err_summary(|| {
                format!(
                    "Cannot create download directory in {}",
                    xdg_dirs.get_data_home().display()
                )
            })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    #[serde(default)]
    pub accounts: IndexMap<String, FileAccount>,
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub attachments: AttachmentSettings,
}

pub fn get_config_file() -> Result<PathBuf> {
    if let Ok(path) = env::var(CONFIG_ENV_VAR) {
        return Ok(Path::new(&path).expand());
    }
    let xdg_dirs = xdg::BaseDirectories::with_prefix("msgview")?;
    xdg_dirs
        .place_config_file("config.toml")
        .chain_err_summary(|| {
            format!(
                "Cannot create configuration directory in {}",
                xdg_dirs.get_config_home().display()
            )
        })
        .chain_err_kind(ErrorKind::Configuration)
}

impl FileSettings {
    /// Load settings from [`get_config_file`]. A missing file yields the
    /// defaults.
    pub fn new() -> Result<Self> {
        let config_path = get_config_file()?;
        if !config_path.exists() {
            log::debug!(
                "No configuration file at {}, using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::validate(&config_path)
    }

    pub fn validate(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path)
            .chain_err_summary(|| format!("Could not read configuration file {}", path.display()))?;
        Self::validate_string(&s)
            .chain_err_summary(|| format!("Invalid configuration file {}", path.display()))
    }

    /// Validate configuration from `input` string.
    pub fn validate_string(s: &str) -> Result<Self> {
        let _: toml::value::Table =
            serde_path_to_error::deserialize(toml::Deserializer::new(s)).map_err(|err| {
                Error::new("Config file is invalid TOML")
                    .set_source(Some(Arc::new(err)))
                    .set_kind(ErrorKind::Configuration)
            })?;

        let s: Self =
            serde_path_to_error::deserialize(toml::Deserializer::new(s)).map_err(|err| {
                Error::new(format!("Input contains errors at `{}`", err.path()))
                    .set_source(Some(Arc::new(err)))
                    .set_kind(ErrorKind::Configuration)
            })?;

        let defaults = s
            .accounts
            .iter()
            .filter(|(_, acc)| acc.default)
            .map(|(name, _)| name.as_str())
            .collect::<Vec<&str>>();
        if defaults.len() > 1 {
            return Err(Error::new(format!(
                "Only one account can be the default, found: {}",
                defaults.join(", ")
            ))
            .set_kind(ErrorKind::Configuration));
        }
        if s.attachments.max_unique_attempts == 0 {
            return Err(
                Error::new("`attachments.max_unique_attempts` must be at least 1.")
                    .set_kind(ErrorKind::Configuration),
            );
        }
        Ok(s)
    }

    /// Install the global logger according to the `[log]` section.
    pub fn init_logging(&self) -> Result<StderrLogger> {
        let logger = StderrLogger::new(self.log.maximum_level);
        if let Some(ref log_path) = self.log.log_file {
            logger.change_log_dest(log_path.expand())?;
        }
        Ok(logger)
    }
}
