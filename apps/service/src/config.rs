use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file")]
    ReadFailed,
    #[error("failed to write config file")]
    WriteFailed,
    #[error("failed to parse config file")]
    ParseFailed,
    #[error("no usable config path (set XDG_CONFIG_HOME or HOME)")]
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub database: Database,
    pub probe: Probe,
    pub sweep: Sweep,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Database {
    pub path: String,
}

impl Default for Database {
    fn default() -> Self {
        Self { path: "upcheck.db".into() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Probe {
    pub timeout_ms: u64,
    pub max_redirects: usize,
}

impl Default for Probe {
    fn default() -> Self {
        Self {
            timeout_ms: upcheck::DEFAULT_TIMEOUT_MS,
            max_redirects: upcheck::DEFAULT_MAX_REDIRECTS,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Sweep {
    pub enabled: bool,
    pub auto_start: bool,
    pub interval_ms: u64,
    pub concurrency: usize,
    pub stale_threshold_ms: u64,
    pub check_all: bool,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_start: true,
            interval_ms: 60_000,
            concurrency: upcheck::DEFAULT_CONCURRENCY,
            stale_threshold_ms: 300_000,
            check_all: false,
        }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/upcheck/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("upcheck/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_title_1(f, "Probe")?;
        write_1(f, "Timeout (ms)", &self.probe.timeout_ms)?;
        write_1(f, "Max Redirects", &self.probe.max_redirects)?;
        write_title_1(f, "Sweep")?;
        write_1(f, "Enabled", &self.sweep.enabled)?;
        write_1(f, "Auto Start", &self.sweep.auto_start)?;
        write_1(f, "Interval (ms)", &self.sweep.interval_ms)?;
        write_1(f, "Concurrency", &self.sweep.concurrency)?;
        write_1(f, "Stale Threshold (ms)", &self.sweep.stale_threshold_ms)?;
        write_1(f, "Check All", &self.sweep.check_all)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/upcheck/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string =
                fs::read_to_string(&config_path).map_err(|_err| Error::ReadFailed)?;
            toml::from_str(raw_string.as_str()).map_err(|_err| Error::ParseFailed)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &std::path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|_err| Error::ParseFailed)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_err| Error::WriteFailed)?;
        }

        std::fs::write(path, config_str).map_err(|_err| Error::WriteFailed)
    }

    /// Sweep section translated into the controller's configuration
    pub fn sweep_config(&self) -> upcheck::SweepConfig {
        upcheck::SweepConfig {
            enabled: self.sweep.enabled,
            auto_start: self.sweep.auto_start,
            interval: std::time::Duration::from_millis(self.sweep.interval_ms),
            concurrency: self.sweep.concurrency,
            stale_threshold: std::time::Duration::from_millis(self.sweep.stale_threshold_ms),
            check_all: self.sweep.check_all,
        }
    }

    /// Probe section translated into the prober's configuration
    pub fn prober_config(&self) -> upcheck::ProberConfig {
        upcheck::ProberConfig {
            timeout: std::time::Duration::from_millis(self.probe.timeout_ms),
            max_redirects: self.probe.max_redirects,
            ..upcheck::ProberConfig::default()
        }
    }
}
