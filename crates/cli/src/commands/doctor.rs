use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use callpilot_core::config::{AgentMode, AppConfig, LoadOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_provider_directory(&config));
            checks.push(check_calendar_file(&config));
            checks.push(check_transport_readiness(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["provider_directory", "calendar_file", "transport_readiness"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersFile {
    #[serde(default)]
    providers: Vec<serde_json::Value>,
}

fn check_provider_directory(config: &AppConfig) -> DoctorCheck {
    let name = "provider_directory";
    let path = &config.data.providers_path;

    match read_json::<ProvidersFile>(path) {
        Ok(file) if file.providers.is_empty() => DoctorCheck {
            name,
            status: CheckStatus::Fail,
            details: format!("`{}` contains no providers", path.display()),
        },
        Ok(file) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("{} providers in `{}`", file.providers.len(), path.display()),
        },
        Err(details) => DoctorCheck { name, status: CheckStatus::Fail, details },
    }
}

#[derive(Debug, Default, Deserialize)]
struct CalendarFileShape {
    #[serde(default)]
    user_calendar: UserCalendarShape,
}

#[derive(Debug, Default, Deserialize)]
struct UserCalendarShape {
    #[serde(default)]
    busy_slots: Vec<serde_json::Value>,
}

fn check_calendar_file(config: &AppConfig) -> DoctorCheck {
    let name = "calendar_file";
    let path = &config.data.calendar_path;

    // A missing calendar is a valid empty calendar; only a present but
    // malformed file fails the check.
    if !path.exists() {
        return DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!("`{}` absent; treated as an empty calendar", path.display()),
        };
    }

    match read_json::<CalendarFileShape>(path) {
        Ok(file) => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!(
                "{} busy slots in `{}`",
                file.user_calendar.busy_slots.len(),
                path.display()
            ),
        },
        Err(details) => DoctorCheck { name, status: CheckStatus::Fail, details },
    }
}

fn check_transport_readiness(config: &AppConfig) -> DoctorCheck {
    let name = "transport_readiness";
    match config.agent.mode {
        AgentMode::Simulated => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: "simulated transport needs no external endpoint".to_string(),
        },
        // Validation already guarantees an http(s) endpoint here.
        AgentMode::Http => DoctorCheck {
            name,
            status: CheckStatus::Pass,
            details: format!(
                "http transport configured for `{}`",
                config.agent.endpoint.as_deref().unwrap_or("<unset>")
            ),
        },
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path)
        .map_err(|error| format!("could not read `{}`: {error}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|error| format!("could not parse `{}`: {error}", path.display()))
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
