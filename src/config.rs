use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base URL of the EFA installation, without the request name
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Whole-request timeout for upstream calls
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Hours added to upstream timestamps before they are displayed
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default)]
    pub stops: Vec<StopConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopConfig {
    pub stop_id: String,
    pub name: Option<String>,
    pub short_name: Option<String>,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_endpoint() -> String {
    "https://efa.rvv.de/efa".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_utc_offset_hours() -> i32 {
    2
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_poll_interval_secs() -> u64 {
    120
}

fn default_max_results() -> u32 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            utc_offset_hours: default_utc_offset_hours(),
            bind_address: default_bind_address(),
            stops: Vec::new(),
        }
    }
}

impl StopConfig {
    pub fn new(stop_id: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            name: None,
            short_name: None,
            poll_interval_secs: default_poll_interval_secs(),
            max_results: default_max_results(),
        }
    }

    /// Full display name, falling back to the stop id
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.stop_id)
    }

    /// Short display name used in sensor names
    pub fn display_short_name(&self) -> &str {
        self.short_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or(&self.stop_id)
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        if !(-14..=14).contains(&self.utc_offset_hours) {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_hours out of range: {}",
                self.utc_offset_hours
            )));
        }

        let mut seen = HashSet::new();
        for stop in &self.stops {
            if stop.stop_id.trim().is_empty() {
                return Err(ConfigError::Invalid("stop_id must not be empty".to_string()));
            }
            if !seen.insert(stop.stop_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate stop_id: {}",
                    stop.stop_id
                )));
            }
            if stop.poll_interval_secs == 0 {
                return Err(ConfigError::Invalid(format!(
                    "poll_interval_secs must be greater than 0 for {}",
                    stop.stop_id
                )));
            }
            if stop.max_results == 0 {
                return Err(ConfigError::Invalid(format!(
                    "max_results must be greater than 0 for {}",
                    stop.stop_id
                )));
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
    #[error("Invalid config: {0}")]
    Invalid(String),
}
