use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use callpilot_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    let mut push = |key: &str, value: &str, env_key: &str| {
        lines.push(render_line(
            key,
            value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    };

    push("server.bind_address", &config.server.bind_address, "CALLPILOT_SERVER_BIND_ADDRESS");
    push("server.port", &config.server.port.to_string(), "CALLPILOT_SERVER_PORT");

    push(
        "swarm.max_concurrency",
        &config.swarm.max_concurrency.to_string(),
        "CALLPILOT_SWARM_MAX_CONCURRENCY",
    );
    push(
        "swarm.negotiation_timeout_secs",
        &config.swarm.negotiation_timeout_secs.to_string(),
        "CALLPILOT_SWARM_NEGOTIATION_TIMEOUT_SECS",
    );

    push("agent.mode", &format!("{:?}", config.agent.mode), "CALLPILOT_AGENT_MODE");
    push(
        "agent.endpoint",
        config.agent.endpoint.as_deref().unwrap_or("<unset>"),
        "CALLPILOT_AGENT_ENDPOINT",
    );
    push("agent.api_key", config.redacted_api_key(), "CALLPILOT_AGENT_API_KEY");
    push(
        "agent.request_timeout_secs",
        &config.agent.request_timeout_secs.to_string(),
        "CALLPILOT_AGENT_REQUEST_TIMEOUT_SECS",
    );

    push(
        "data.providers_path",
        &config.data.providers_path.display().to_string(),
        "CALLPILOT_DATA_PROVIDERS_PATH",
    );
    push(
        "data.calendar_path",
        &config.data.calendar_path.display().to_string(),
        "CALLPILOT_DATA_CALENDAR_PATH",
    );

    push("logging.level", &config.logging.level, "CALLPILOT_LOGGING_LEVEL");
    push("logging.format", &format!("{:?}", config.logging.format), "CALLPILOT_LOGGING_FORMAT");

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("callpilot.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/callpilot.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
