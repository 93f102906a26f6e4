//! Configuration management for audiotally.
//!
//! Configuration loads through figment from defaults, a TOML config file and
//! environment variables. Unlike most of the settings, the sample rate is
//! written back to the file whenever the user changes it, so the next run
//! starts with the last-used rate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name under the platform config dir.
const CONFIG_DIR_NAME: &str = "audiotally";

/// Default project sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48000;

/// Sample rates the DAW offers as project rates, for help text and display.
pub const KNOWN_SAMPLE_RATES: [u32; 8] = [
    8000, 16000, 22050, 32000, 44100, 48000, 96000, 192_000,
];

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `AUDIOTALLY_`, sections split
///    with `__`, e.g. `AUDIOTALLY_CALCULATOR__SAMPLE_RATE`)
/// 2. TOML config file at `~/.config/audiotally/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Calculator configuration.
    pub calculator: CalculatorConfig,
    /// Watch-loop configuration.
    pub watch: WatchConfig,
}

/// Calculator-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Project sample rate in Hz used to convert samples to time.
    /// Persisted across runs whenever the user changes it.
    pub sample_rate: u32,
}

/// Watch-loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Interval between clipboard polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Delay between detection and calculation in milliseconds.
    /// Purely perceptual; 0 is valid.
    pub detect_delay_ms: u64,
    /// How long the "just calculated" highlight lasts in milliseconds.
    pub phase_delay_ms: u64,
    /// Bound on a single clipboard read in milliseconds.
    pub read_timeout_ms: u64,
    /// Restore the original clipboard contents after a calculation so the
    /// DAW paste keeps working.
    pub restore_clipboard: bool,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 300,
            detect_delay_ms: 150,
            phase_delay_ms: 1000,
            read_timeout_ms: 500,
            restore_clipboard: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("AUDIOTALLY_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.calculator.sample_rate == 0 {
            return Err(Error::ConfigValidation {
                message: "sample_rate must be greater than 0".to_string(),
            });
        }

        if self.watch.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.watch.read_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "read_timeout_ms must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Write the configuration to the default config path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::default_config_path();
        self.save_to(&path)?;
        Ok(path)
    }

    /// Write the configuration to the given path, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let rendered = toml::to_string_pretty(self).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        std::fs::write(path, rendered).map_err(|e| Error::ConfigWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Change the project sample rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate is zero.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::ConfigValidation {
                message: "sample_rate must be greater than 0".to_string(),
            });
        }
        self.calculator.sample_rate = sample_rate;
        Ok(())
    }

    /// The project sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> u32 {
        self.calculator.sample_rate
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.watch.poll_interval_ms)
    }

    /// Get the detect delay as a Duration.
    #[must_use]
    pub fn detect_delay(&self) -> Duration {
        Duration::from_millis(self.watch.detect_delay_ms)
    }

    /// Get the phase delay as a Duration.
    #[must_use]
    pub fn phase_delay(&self) -> Duration {
        Duration::from_millis(self.watch.phase_delay_ms)
    }

    /// Get the clipboard read timeout as a Duration.
    #[must_use]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.watch.read_timeout_ms)
    }
}
