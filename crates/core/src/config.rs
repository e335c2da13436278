use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub swarm: SwarmConfig,
    pub agent: AgentConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct SwarmConfig {
    /// Upper bound on simultaneously active negotiations.
    pub max_concurrency: usize,
    /// Wall-clock bound per provider negotiation.
    pub negotiation_timeout_secs: u64,
}

impl SwarmConfig {
    pub fn negotiation_timeout(&self) -> Duration {
        Duration::from_secs(self.negotiation_timeout_secs)
    }
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Which negotiation transport the orchestrator is built with. An
    /// explicit configuration value; the core never inspects ambient
    /// process state to decide this.
    pub mode: AgentMode,
    pub endpoint: Option<String>,
    pub api_key: Option<SecretString>,
    pub request_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct DataConfig {
    pub providers_path: PathBuf,
    pub calendar_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentMode {
    Simulated,
    Http,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub agent_mode: Option<AgentMode>,
    pub agent_endpoint: Option<String>,
    pub providers_path: Option<PathBuf>,
    pub calendar_path: Option<PathBuf>,
    pub max_concurrency: Option<usize>,
    pub negotiation_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 5000 },
            swarm: SwarmConfig { max_concurrency: 5, negotiation_timeout_secs: 25 },
            agent: AgentConfig {
                mode: AgentMode::Simulated,
                endpoint: None,
                api_key: None,
                request_timeout_secs: 20,
            },
            data: DataConfig {
                providers_path: PathBuf::from("data/providers.json"),
                calendar_path: PathBuf::from("data/calendar.json"),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for AgentMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simulated" | "mock" => Ok(Self::Simulated),
            "http" => Ok(Self::Http),
            other => Err(ConfigError::Validation(format!(
                "unsupported agent mode `{other}` (expected simulated|http)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Load configuration with the precedence defaults < file < env <
    /// programmatic overrides, then validate.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("callpilot.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(swarm) = patch.swarm {
            if let Some(max_concurrency) = swarm.max_concurrency {
                self.swarm.max_concurrency = max_concurrency;
            }
            if let Some(negotiation_timeout_secs) = swarm.negotiation_timeout_secs {
                self.swarm.negotiation_timeout_secs = negotiation_timeout_secs;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(mode) = agent.mode {
                self.agent.mode = mode;
            }
            if let Some(endpoint) = agent.endpoint {
                self.agent.endpoint = Some(endpoint);
            }
            if let Some(api_key_value) = agent.api_key {
                self.agent.api_key = Some(api_key_value.into());
            }
            if let Some(request_timeout_secs) = agent.request_timeout_secs {
                self.agent.request_timeout_secs = request_timeout_secs;
            }
        }

        if let Some(data) = patch.data {
            if let Some(providers_path) = data.providers_path {
                self.data.providers_path = providers_path;
            }
            if let Some(calendar_path) = data.calendar_path {
                self.data.calendar_path = calendar_path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CALLPILOT_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CALLPILOT_SERVER_PORT") {
            self.server.port = parse_u16("CALLPILOT_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("CALLPILOT_SWARM_MAX_CONCURRENCY") {
            self.swarm.max_concurrency = parse_usize("CALLPILOT_SWARM_MAX_CONCURRENCY", &value)?;
        }
        if let Some(value) = read_env("CALLPILOT_SWARM_NEGOTIATION_TIMEOUT_SECS") {
            self.swarm.negotiation_timeout_secs =
                parse_u64("CALLPILOT_SWARM_NEGOTIATION_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CALLPILOT_AGENT_MODE") {
            self.agent.mode = value.parse()?;
        }
        if let Some(value) = read_env("CALLPILOT_AGENT_ENDPOINT") {
            self.agent.endpoint = Some(value);
        }
        if let Some(value) = read_env("CALLPILOT_AGENT_API_KEY") {
            self.agent.api_key = Some(value.into());
        }
        if let Some(value) = read_env("CALLPILOT_AGENT_REQUEST_TIMEOUT_SECS") {
            self.agent.request_timeout_secs =
                parse_u64("CALLPILOT_AGENT_REQUEST_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CALLPILOT_DATA_PROVIDERS_PATH") {
            self.data.providers_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("CALLPILOT_DATA_CALENDAR_PATH") {
            self.data.calendar_path = PathBuf::from(value);
        }

        let log_level =
            read_env("CALLPILOT_LOGGING_LEVEL").or_else(|| read_env("CALLPILOT_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("CALLPILOT_LOGGING_FORMAT").or_else(|| read_env("CALLPILOT_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(agent_mode) = overrides.agent_mode {
            self.agent.mode = agent_mode;
        }
        if let Some(agent_endpoint) = overrides.agent_endpoint {
            self.agent.endpoint = Some(agent_endpoint);
        }
        if let Some(providers_path) = overrides.providers_path {
            self.data.providers_path = providers_path;
        }
        if let Some(calendar_path) = overrides.calendar_path {
            self.data.calendar_path = calendar_path;
        }
        if let Some(max_concurrency) = overrides.max_concurrency {
            self.swarm.max_concurrency = max_concurrency;
        }
        if let Some(negotiation_timeout_secs) = overrides.negotiation_timeout_secs {
            self.swarm.negotiation_timeout_secs = negotiation_timeout_secs;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port must be greater than zero".to_string(),
            ));
        }

        if self.swarm.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "swarm.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.swarm.negotiation_timeout_secs == 0 || self.swarm.negotiation_timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "swarm.negotiation_timeout_secs must be in range 1..=300".to_string(),
            ));
        }

        if self.agent.request_timeout_secs == 0 || self.agent.request_timeout_secs > 300 {
            return Err(ConfigError::Validation(
                "agent.request_timeout_secs must be in range 1..=300".to_string(),
            ));
        }
        if self.agent.mode == AgentMode::Http {
            let valid_endpoint = self
                .agent
                .endpoint
                .as_deref()
                .map(|url| url.starts_with("http://") || url.starts_with("https://"))
                .unwrap_or(false);
            if !valid_endpoint {
                return Err(ConfigError::Validation(
                    "agent.endpoint must be an http(s) URL when agent.mode is `http`".to_string(),
                ));
            }
        }

        let level = self.logging.level.trim().to_ascii_lowercase();
        match level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Validation(
                    "logging.level must be one of trace|debug|info|warn|error".to_string(),
                ))
            }
        }

        Ok(())
    }

    /// Redacted view of the agent API key for config inspection output.
    pub fn redacted_api_key(&self) -> &'static str {
        match &self.agent.api_key {
            Some(key) if !key.expose_secret().is_empty() => "***redacted***",
            _ => "(unset)",
        }
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("callpilot.toml"), PathBuf::from("config/callpilot.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    server: Option<ServerPatch>,
    swarm: Option<SwarmPatch>,
    agent: Option<AgentPatch>,
    data: Option<DataPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct SwarmPatch {
    max_concurrency: Option<usize>,
    negotiation_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    mode: Option<AgentMode>,
    endpoint: Option<String>,
    api_key: Option<String>,
    request_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    providers_path: Option<PathBuf>,
    calendar_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
