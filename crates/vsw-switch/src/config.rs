//! Switch configuration file support.
//!
//! Configuration is TOML:
//!
//! ```toml
//! [switch]
//! name = "ethsw0"
//! num_ports = 4
//! monitoring_enabled = true
//!
//! [clock]
//! precision = -12
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::clock::TimePrecision;
use crate::error::{Result, SwitchError};

/// `[switch]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchSection {
    /// Instance name used in logs
    #[serde(default = "default_name")]
    pub name: String,

    /// Number of receive/transmit port pairs
    #[serde(default = "default_num_ports")]
    pub num_ports: usize,

    /// Emit a monitor record on every hop
    #[serde(default)]
    pub monitoring_enabled: bool,
}

/// `[clock]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockSection {
    /// Simulator time precision exponent (0 = 1 s ... -15 = 1 fs)
    #[serde(default = "default_precision")]
    pub precision: i8,
}

/// Complete switch configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    #[serde(default)]
    pub switch: SwitchSection,

    #[serde(default)]
    pub clock: ClockSection,
}

fn default_name() -> String {
    "ethsw".to_string()
}

fn default_num_ports() -> usize {
    4
}

fn default_precision() -> i8 {
    -12
}

impl Default for SwitchSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            num_ports: default_num_ports(),
            monitoring_enabled: false,
        }
    }
}

impl Default for ClockSection {
    fn default() -> Self {
        Self {
            precision: default_precision(),
        }
    }
}

impl SwitchConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SwitchError::configuration(format!("failed to parse config: {}", e)))
    }

    /// Loads configuration from file, falling back to defaults if not found.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SwitchError::configuration(format!(
                    "failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SwitchError::Io(e)),
        }
    }

    /// Saves configuration to file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| SwitchError::configuration(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Clock precision as a validated value.
    pub fn precision(&self) -> Result<TimePrecision> {
        TimePrecision::new(self.clock.precision)
    }

    /// Validates configuration.
    pub fn validate(&self) -> Result<()> {
        if self.switch.num_ports == 0 {
            return Err(SwitchError::configuration("num_ports must be > 0"));
        }
        if self.switch.name.trim().is_empty() {
            return Err(SwitchError::configuration("name must not be empty"));
        }
        self.precision()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = SwitchConfig::default();
        assert_eq!(config.switch.name, "ethsw");
        assert_eq!(config.switch.num_ports, 4);
        assert!(!config.switch.monitoring_enabled);
        assert_eq!(config.clock.precision, -12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let config = SwitchConfig::from_toml(
            r#"
[switch]
num_ports = 8
monitoring_enabled = true
"#,
        )
        .unwrap();
        assert_eq!(config.switch.num_ports, 8);
        assert!(config.switch.monitoring_enabled);
        // Unspecified values should use defaults
        assert_eq!(config.switch.name, "ethsw");
        assert_eq!(config.clock.precision, -12);
    }

    #[test]
    fn test_validate_zero_ports() {
        let mut config = SwitchConfig::default();
        config.switch.num_ports = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_precision() {
        let mut config = SwitchConfig::default();
        config.clock.precision = 3;
        assert!(config.validate().is_err());
        config.clock.precision = -9;
        assert_eq!(config.precision().unwrap(), TimePrecision::NS);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(SwitchConfig::from_toml("[switch\nnum_ports = ").is_err());
    }

    #[test]
    fn test_load_nonexistent_file_defaults() {
        let config = SwitchConfig::load_or_default("/nonexistent/vsw.toml").unwrap();
        assert_eq!(config, SwitchConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vsw.toml");

        let mut config = SwitchConfig::default();
        config.switch.num_ports = 6;
        config.switch.monitoring_enabled = true;
        config.save(&path).unwrap();

        let loaded = SwitchConfig::load_or_default(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
