use crate::Result;
use camino::Utf8Path;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

/// Name of the configuration file looked up in the base directory
pub const CONFIG_FILE_NAME: &str = "ratemeter.toml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MeterConfig {
    /// Minimum time between redraws (raised to 500ms on GUI surfaces)
    #[serde(default = "default_min_interval", with = "humantime_serde")]
    pub min_interval: Duration,

    /// History kept on the plot when the total is unknown
    #[serde(default = "default_window", with = "humantime_serde")]
    pub window: Duration,

    /// Fill colour of the plot progress span
    #[serde(default = "default_colour")]
    pub colour: String,

    /// Take modal input grab on widget surfaces
    #[serde(default)]
    pub grab: bool,

    /// Keep the final frame showing after close
    #[serde(default = "default_leave")]
    pub leave: bool,

    /// Suppress all output
    #[serde(default)]
    pub disable: bool,

    /// Unit name used in rates
    #[serde(default = "default_unit")]
    pub unit: String,

    /// Group digits in counts
    #[serde(default)]
    pub unit_scale: bool,

    /// Description shown with the meter
    #[serde(default)]
    pub desc: String,

    /// Widget text template override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bar_format: Option<String>,
}

const fn default_min_interval() -> Duration {
    Duration::from_millis(100)
}

const fn default_window() -> Duration {
    Duration::from_secs(66)
}

fn default_colour() -> String {
    "g".to_string()
}

const fn default_leave() -> bool {
    true
}

fn default_unit() -> String {
    "it".to_string()
}

impl MeterConfig {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `ratemeter.toml` in `base_dir` is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading ratemeter configuration file '{path}'"))?;
            (path.to_path_buf(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading ratemeter configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range
    pub fn validate(&self) -> Result<()> {
        if self.window.is_zero() {
            return Err(app_err!("window must be greater than zero"));
        }

        if self.colour.trim().is_empty() {
            return Err(app_err!("colour must not be empty"));
        }

        if self.unit.trim().is_empty() {
            return Err(app_err!("unit must not be empty"));
        }

        if let Some(format) = &self.bar_format
            && format.trim().is_empty()
        {
            return Err(app_err!("bar_format must not be empty when set"));
        }

        Ok(())
    }
}

impl Default for MeterConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to MeterConfig")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("temp dir should be UTF-8");
        (dir, path)
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = MeterConfig::default();
        config.validate().unwrap();
        assert_eq!(config.min_interval, Duration::from_millis(100));
        assert_eq!(config.window, Duration::from_secs(66));
        assert_eq!(config.colour, "g");
        assert!(config.leave);
        assert!(!config.grab);
        assert!(config.bar_format.is_none());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let (_guard, dir) = temp_dir();
        let config = MeterConfig::load(&dir, None).unwrap();
        assert_eq!(config, MeterConfig::default());
    }

    #[test]
    fn test_file_in_base_dir_is_used() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join(CONFIG_FILE_NAME), "leave = false\nmin_interval = \"2s\"\n").unwrap();

        let config = MeterConfig::load(&dir, None).unwrap();
        assert!(!config.leave);
        assert_eq!(config.min_interval, Duration::from_secs(2));
        assert_eq!(config.unit, "it");
    }

    #[test]
    fn test_explicit_path() {
        let (_guard, dir) = temp_dir();
        let path = dir.join("custom.toml");
        fs::write(&path, "bar_format = \"{count}\"\ncolour = \"r\"\n").unwrap();

        let config = MeterConfig::load(&dir, Some(&path)).unwrap();
        assert_eq!(config.bar_format.as_deref(), Some("{count}"));
        assert_eq!(config.colour, "r");
    }

    #[test]
    fn test_explicit_path_missing_is_error() {
        let (_guard, dir) = temp_dir();
        let path = dir.join("nope.toml");
        let _ = MeterConfig::load(&dir, Some(&path)).unwrap_err();
    }

    #[test]
    fn test_unknown_field_rejected() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join(CONFIG_FILE_NAME), "bogus = 1\n").unwrap();
        let _ = MeterConfig::load(&dir, None).unwrap_err();
    }

    #[test]
    fn test_zero_window_rejected() {
        let (_guard, dir) = temp_dir();
        fs::write(dir.join(CONFIG_FILE_NAME), "window = \"0s\"\n").unwrap();
        let err = MeterConfig::load(&dir, None).unwrap_err();
        assert!(format!("{err}").contains("window"));
    }

    #[test]
    fn test_save_default_round_trips() {
        let (_guard, dir) = temp_dir();
        let path = dir.join(CONFIG_FILE_NAME);
        MeterConfig::save_default(&path).unwrap();
        assert_eq!(MeterConfig::load(&dir, None).unwrap(), MeterConfig::default());
    }
}
