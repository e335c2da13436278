use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use serde::Deserialize;

use callpilot_agent::negotiator_from_config;
use callpilot_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use callpilot_core::{BookingRequest, Provider, TimeWindow};
use callpilot_swarm::{orchestrate, orchestrate_stream, SwarmEvent, SwarmLimits};

use crate::commands::CommandResult;

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Service to book, e.g. dentist")]
    pub service: String,
    #[arg(long, help = "Preferred date (YYYY-MM-DD)")]
    pub date: Option<String>,
    #[arg(long, help = "Earliest acceptable time (HH:MM)")]
    pub start: Option<String>,
    #[arg(long, help = "Latest acceptable time (HH:MM)")]
    pub end: Option<String>,
    #[arg(long, help = "Provider directory JSON path, overriding the configured one")]
    pub providers: Option<PathBuf>,
    #[arg(long, default_value_t = 15, help = "Maximum number of providers to contact")]
    pub limit: usize,
    #[arg(long, help = "Print one JSON event per line as the swarm progresses")]
    pub stream: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersFile {
    #[serde(default)]
    providers: Vec<Provider>,
}

pub fn run(args: RunArgs) -> CommandResult {
    let options = LoadOptions {
        overrides: ConfigOverrides {
            providers_path: args.providers.clone(),
            ..ConfigOverrides::default()
        },
        ..LoadOptions::default()
    };
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("run", "config_validation", error.to_string(), 2)
        }
    };

    let providers = match load_providers(&config.data.providers_path, &args.service, args.limit) {
        Ok(providers) => providers,
        Err(message) => return CommandResult::failure("run", "provider_directory", message, 3),
    };
    if providers.is_empty() {
        return CommandResult::failure("run", "provider_directory", "no providers available", 3);
    }

    let negotiator = match negotiator_from_config(&config) {
        Ok(negotiator) => negotiator,
        Err(error) => return CommandResult::failure("run", "transport", error.to_string(), 5),
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "run",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                1,
            )
        }
    };

    let request = build_request(&args);
    let limits = SwarmLimits::from(&config.swarm);

    if args.stream {
        run_streaming(runtime, negotiator, request, providers, limits)
    } else {
        run_batch(runtime, negotiator, request, providers, limits)
    }
}

fn build_request(args: &RunArgs) -> BookingRequest {
    let has_window = args.date.is_some() || args.start.is_some() || args.end.is_some();
    BookingRequest {
        service: args.service.clone(),
        time_window: has_window.then(|| TimeWindow {
            date: args.date.clone(),
            start: args.start.clone(),
            end: args.end.clone(),
        }),
        preferences: None,
    }
}

fn run_batch(
    runtime: tokio::runtime::Runtime,
    negotiator: Arc<dyn callpilot_swarm::Negotiator>,
    request: BookingRequest,
    providers: Vec<Provider>,
    limits: SwarmLimits,
) -> CommandResult {
    let outcome =
        runtime.block_on(orchestrate(negotiator, &request, providers, limits));

    match outcome {
        Ok(outcome) => {
            let output = serde_json::to_string_pretty(&outcome)
                .unwrap_or_else(|error| format!("{{\"error\":\"{error}\"}}"));
            CommandResult { exit_code: 0, output }
        }
        Err(error) => CommandResult::failure("run", "invalid_request", error.to_string(), 4),
    }
}

/// Print each swarm event as its own JSON line while the run is live,
/// then return a one-line human summary.
fn run_streaming(
    runtime: tokio::runtime::Runtime,
    negotiator: Arc<dyn callpilot_swarm::Negotiator>,
    request: BookingRequest,
    providers: Vec<Provider>,
    limits: SwarmLimits,
) -> CommandResult {
    let result = runtime.block_on(async move {
        let mut rx = orchestrate_stream(negotiator, request, providers, limits)?;

        let mut summary = "no provider could offer a slot".to_string();
        while let Some(event) = rx.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{line}");
            }
            if let SwarmEvent::Complete { best: Some(best), .. } = &event {
                summary = format!(
                    "booked {} at {} (score {})",
                    best.provider.name,
                    best.slot.as_deref().unwrap_or("unknown"),
                    best.score
                );
            }
        }
        Ok::<String, callpilot_core::DomainError>(summary)
    });

    match result {
        Ok(summary) => CommandResult { exit_code: 0, output: summary },
        Err(error) => CommandResult::failure("run", "invalid_request", error.to_string(), 4),
    }
}

fn load_providers(path: &Path, service: &str, limit: usize) -> Result<Vec<Provider>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read provider directory `{}`: {error}", path.display()))?;
    let file: ProvidersFile = serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse provider directory `{}`: {error}", path.display()))?;

    // Same match-or-fallback rule as the server: an unmatched service
    // still gets the full directory.
    let mut providers: Vec<Provider> = file
        .providers
        .iter()
        .filter(|provider| provider.matches_service(service))
        .cloned()
        .collect();
    if providers.is_empty() {
        providers = file.providers;
    }
    providers.truncate(limit);
    Ok(providers)
}
