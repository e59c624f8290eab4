//! Server configuration management
//!
//! Handles loading configuration from environment variables, TOML files, and CLI arguments.

use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid port number: {0}. Must be between 1 and 65535")]
    InvalidPort(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid environment: {0}. Must be one of: development, staging, production")]
    InvalidEnvironment(String),

    #[error("Invalid poll interval: {0} seconds. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("Configuration file error: {0}")]
    FileError(String),
}

/// Log levels supported by the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidLogLevel(s.to_string())),
        }
    }
}

impl LogLevel {
    /// Convert log level to tracing filter string
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Environment types for configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl Environment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Staging => write!(f, "staging"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Server configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
    /// Environment (development, staging, production)
    #[serde(deserialize_with = "deserialize_environment")]
    pub environment: Environment,
    /// Whether the SIP and payout schedulers run in this process
    pub schedulers_enabled: bool,
    /// SIP scheduler polling interval in seconds
    pub sip_poll_interval_secs: u64,
    /// Payout scheduler polling interval in seconds
    pub payout_poll_interval_secs: u64,
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    LogLevel::from_str(&s).map_err(serde::de::Error::custom)
}

fn deserialize_environment<'de, D>(deserializer: D) -> Result<Environment, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Environment::from_str(&s).map_err(serde::de::Error::custom)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: LogLevel::Info,
            environment: Environment::Development,
            schedulers_enabled: true,
            sip_poll_interval_secs: 120,
            payout_poll_interval_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Create a new ServerConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = std::env::var("LEDGER_SERVER_HOST") {
            config.host = host;
        }
        if let Ok(port_str) = std::env::var("LEDGER_SERVER_PORT") {
            config.port = port_str.parse().map_err(|_| ConfigError::InvalidPort(0))?;
        }
        if let Ok(log_level) = std::env::var("LEDGER_LOG_LEVEL") {
            config.log_level = LogLevel::from_str(&log_level)?;
        }
        if let Ok(env) = std::env::var("LEDGER_ENV") {
            config.environment = Environment::from_str(&env)?;
        }
        if let Ok(enabled) = std::env::var("LEDGER_SCHEDULERS_ENABLED") {
            config.schedulers_enabled = enabled.to_lowercase() == "true";
        }
        if let Ok(secs) = std::env::var("LEDGER_SIP_POLL_INTERVAL_SECS") {
            config.sip_poll_interval_secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidPollInterval(0))?;
        }
        if let Ok(secs) = std::env::var("LEDGER_PAYOUT_POLL_INTERVAL_SECS") {
            config.payout_poll_interval_secs = secs
                .parse()
                .map_err(|_| ConfigError::InvalidPollInterval(0))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileError(format!("Failed to read config file: {}", e)))?;

        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::FileError(format!("Failed to parse TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }
        if self.sip_poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(self.sip_poll_interval_secs));
        }
        if self.payout_poll_interval_secs == 0 {
            return Err(ConfigError::InvalidPollInterval(
                self.payout_poll_interval_secs,
            ));
        }
        Ok(())
    }

    /// SIP scheduler polling interval
    pub fn sip_poll_interval(&self) -> Duration {
        Duration::from_secs(self.sip_poll_interval_secs)
    }

    /// Payout scheduler polling interval
    pub fn payout_poll_interval(&self) -> Duration {
        Duration::from_secs(self.payout_poll_interval_secs)
    }

    /// Merge with CLI arguments (CLI takes precedence)
    pub fn merge_with_cli(&mut self, cli: &CliArgs) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(log_level) = &cli.log_level {
            if let Ok(level) = LogLevel::from_str(log_level) {
                self.log_level = level;
            }
        }
    }
}

/// CLI arguments structure
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Config file path
    pub config_file: Option<PathBuf>,
    /// Host address override
    pub host: Option<String>,
    /// Port override
    pub port: Option<u16>,
    /// Log level override
    pub log_level: Option<String>,
}

/// Build configuration from all sources
///
/// Priority (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables
/// 3. Config file
/// 4. Default values
pub fn build_config(cli: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let mut config = if let Some(config_path) = &cli.config_file {
        ServerConfig::from_file(config_path)?
    } else {
        ServerConfig::default()
    };

    if let Ok(env_config) = ServerConfig::from_env() {
        if std::env::var("LEDGER_SERVER_HOST").is_ok() {
            config.host = env_config.host;
        }
        if std::env::var("LEDGER_SERVER_PORT").is_ok() {
            config.port = env_config.port;
        }
        if std::env::var("LEDGER_LOG_LEVEL").is_ok() {
            config.log_level = env_config.log_level;
        }
        if std::env::var("LEDGER_ENV").is_ok() {
            config.environment = env_config.environment;
        }
        if std::env::var("LEDGER_SCHEDULERS_ENABLED").is_ok() {
            config.schedulers_enabled = env_config.schedulers_enabled;
        }
        if std::env::var("LEDGER_SIP_POLL_INTERVAL_SECS").is_ok() {
            config.sip_poll_interval_secs = env_config.sip_poll_interval_secs;
        }
        if std::env::var("LEDGER_PAYOUT_POLL_INTERVAL_SECS").is_ok() {
            config.payout_poll_interval_secs = env_config.payout_poll_interval_secs;
        }
    }

    config.merge_with_cli(cli);
    config.validate()?;
    Ok(config)
}
