use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub git: GitConfig,
    pub behavior: BehaviorConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitConfig {
    /// Name or path of the git executable
    pub program: String,
    pub timeout_ms: u64,
    /// Fetch/pull/push/clone are bounded by remote latency, not disk
    pub network_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BehaviorConfig {
    pub log_commands: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            git: GitConfig {
                program: "git".to_string(),
                timeout_ms: 30_000,
                network_timeout_ms: 120_000,
            },
            behavior: BehaviorConfig {
                log_commands: false,
            },
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::DirectoryNotFound)?;
        Ok(PathBuf::from(home).join(".config").join("gitscope"))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Load configuration from a specific file
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<(), ConfigError> {
        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)?;

        self.save_to(Self::config_path()?)
    }

    /// Save configuration to a specific file
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;

        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;

        // 600: the file may name a non-default git binary
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path.as_ref())?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path.as_ref(), perms)?;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.git.program.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "git.program must not be empty".to_string(),
            ));
        }
        if self.git.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "git.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.git.network_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "git.network_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.git.program, "git");
        assert_eq!(config.git.timeout_ms, 30_000);
        assert_eq!(config.git.network_timeout_ms, 120_000);
        assert!(!config.behavior.log_commands);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.git.timeout_ms = 5_000;
        config.behavior.log_commands = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.git.timeout_ms, 5_000);
        assert!(loaded.behavior.log_commands);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.git.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_empty_program_rejected() {
        let mut config = Config::default();
        config.git.program = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(&path, "not [valid toml").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        Config::default().save_to(&path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
