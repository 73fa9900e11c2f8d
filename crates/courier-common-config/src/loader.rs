//! Configuration file loading and parsing.

use crate::types::CourierConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },
}

/// Directory, relative to the project root, holding `config.yaml`.
pub const CONFIG_DIR: &str = ".courier";

fn env_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("static env pattern is valid")
    })
}

/// Configuration loader.
pub struct ConfigLoader {
    base_path: PathBuf,
}

impl ConfigLoader {
    /// Create a loader for the given project directory.
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            base_path: project_dir.as_ref().to_path_buf(),
        }
    }

    /// Path of the config file this loader reads.
    pub fn config_path(&self) -> PathBuf {
        self.base_path.join(CONFIG_DIR).join("config.yaml")
    }

    /// Load configuration from `.courier/config.yaml`.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<CourierConfig, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Ok(CourierConfig::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;
        self.parse(&contents)
    }

    /// Parse and validate YAML text, expanding environment references first.
    pub fn parse(&self, contents: &str) -> Result<CourierConfig, ConfigError> {
        let expanded = self.expand_env_vars(contents)?;

        let config: CourierConfig =
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;

        self.validate(&config)?;
        Ok(config)
    }

    /// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
    fn expand_env_vars(&self, content: &str) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(content.len());
        let mut last = 0;

        for cap in env_pattern().captures_iter(content) {
            let Some(full_match) = cap.get(0) else {
                continue;
            };
            let var_name = &cap[1];
            let default = cap.get(2).map(|m| m.as_str());

            let value = match (std::env::var(var_name), default) {
                (Ok(v), _) => v,
                (Err(_), Some(d)) => d.to_string(),
                (Err(_), None) => {
                    return Err(ConfigError::EnvVarNotFound {
                        var: var_name.to_string(),
                    })
                }
            };

            result.push_str(&content[last..full_match.start()]);
            result.push_str(&value);
            last = full_match.end();
        }

        result.push_str(&content[last..]);
        Ok(result)
    }

    /// Validate configuration values.
    fn validate(&self, config: &CourierConfig) -> Result<(), ConfigError> {
        if config.http.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "http.connect_timeout_secs must be greater than 0".to_string(),
            });
        }

        if config.http.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "http.request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if let Some(base_url) = &config.base_url {
            let parsed = url::Url::parse(base_url).map_err(|e| ConfigError::ValidationError {
                message: format!("base_url {base_url:?} is not an absolute URL: {e}"),
            })?;
            if parsed.cannot_be_a_base() {
                return Err(ConfigError::ValidationError {
                    message: format!("base_url {base_url:?} cannot be used as a base"),
                });
            }
        }

        Ok(())
    }

    /// Save configuration to file.
    pub fn save(&self, config: &CourierConfig) -> Result<(), ConfigError> {
        let config_dir = self.base_path.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir)?;

        let yaml = serde_yaml::to_string(config).map_err(|e| ConfigError::ParseError {
            line: None,
            message: e.to_string(),
        })?;

        std::fs::write(self.config_path(), yaml)?;
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new(std::env::current_dir().unwrap_or_default())
    }
}
