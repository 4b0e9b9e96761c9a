use salesdesk_core::config::{AppConfig, CrmBackend, LoadOptions};
use salesdesk_core::ServiceKind;
use salesdesk_crm::{DataverseClient, DataverseSettings};
use serde::Serialize;

use crate::commands::{escape_json, CommandResult, EXIT_CONFIG};

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

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { EXIT_CONFIG };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                concat!(
                    "{{\"overall_status\":\"fail\",",
                    "\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}"
                ),
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: format!("configuration loaded for the {} service", config.server.service),
            });
            checks.push(check_crm_settings(&config));
            checks.push(check_tool_registry(config.server.service));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("crm_settings"));
            checks.push(skipped("tool_registry"));
        }
    }

    let failed = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if failed { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if failed {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_crm_settings(config: &AppConfig) -> DoctorCheck {
    if !config.server.service.uses_crm() {
        return DoctorCheck {
            name: "crm_settings",
            status: CheckStatus::Skipped,
            details: format!("the {} service does not read the CRM", config.server.service),
        };
    }

    match config.crm.backend {
        CrmBackend::Mock => DoctorCheck {
            name: "crm_settings",
            status: CheckStatus::Pass,
            details: "mock backend serves the seeded demo opportunities".to_string(),
        },
        CrmBackend::Dataverse => {
            match DataverseSettings::from_config(&config.crm).and_then(DataverseClient::new) {
                Ok(client) => DoctorCheck {
                    name: "crm_settings",
                    status: CheckStatus::Pass,
                    details: format!(
                        "dataverse client ready for {} (scope `{}`, api {})",
                        client.settings().base_url,
                        client.settings().scope,
                        client.settings().api_version
                    ),
                },
                Err(error) => DoctorCheck {
                    name: "crm_settings",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
            }
        }
    }
}

fn check_tool_registry(service: ServiceKind) -> DoctorCheck {
    let names = salesdesk_mcp::tool_names(service);
    let status = if names.len() == 4 { CheckStatus::Pass } else { CheckStatus::Fail };
    DoctorCheck {
        name: "tool_registry",
        status,
        details: format!("{} tools: {}", names.len(), names.join(", ")),
    }
}

fn skipped(name: &'static str) -> DoctorCheck {
    DoctorCheck {
        name,
        status: CheckStatus::Skipped,
        details: "skipped because configuration did not load".to_string(),
    }
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
