use std::sync::Arc;
use std::time::Instant;

use crate::commands::{escape_json, runtime, CommandResult, EXIT_SMOKE_FAILURE};
use salesdesk_core::config::{AppConfig, LoadOptions};
use salesdesk_core::{CallerIdentity, ServiceKind};
use salesdesk_crm::fixtures::DEMO_OPPORTUNITY_ID;
use salesdesk_crm::InMemoryCrm;
use salesdesk_mcp::{service_for, ToolServices, ALL_TOOL_NAMES};
use serde::Serialize;
use serde_json::Value;

const DEMO_COMPANY: &str = "Contoso Ltd";
const DEMO_LEAD_ID: &str = "6f9619ff-8b86-d011-b42d-00cf4fc964ff";
const DEMO_QUOTE_ID: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: String,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

/// Validates the config, then calls every tool once against the seeded
/// in-memory CRM. The configured CRM backend is never contacted.
pub fn run() -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config_started = Instant::now();
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => checks.push(SmokeCheck {
            name: "config_validation".to_string(),
            status: SmokeStatus::Pass,
            elapsed_ms: elapsed_ms(config_started),
            message: format!("configuration loaded for the {} service", config.server.service),
        }),
        Err(error) => {
            checks.push(SmokeCheck {
                name: "config_validation".to_string(),
                status: SmokeStatus::Fail,
                elapsed_ms: elapsed_ms(config_started),
                message: error.to_string(),
            });
            checks.extend(ALL_TOOL_NAMES.iter().map(|tool| skipped(tool)));
            return finalize_report(checks, elapsed_ms(started));
        }
    }

    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "runtime".to_string(),
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            return finalize_report(checks, elapsed_ms(started));
        }
    };

    let services = ToolServices::new(Arc::new(InMemoryCrm::seeded()));
    for tool in ALL_TOOL_NAMES {
        let tool_started = Instant::now();
        let call = services.call(tool, demo_argument(tool), CallerIdentity::anonymous());
        let body = runtime.block_on(call);
        checks.push(tool_check(tool, body, elapsed_ms(tool_started)));
    }

    finalize_report(checks, elapsed_ms(started))
}

fn demo_argument(tool: &str) -> &'static str {
    if tool == "getCompanyProfile" {
        return DEMO_COMPANY;
    }
    match service_for(tool) {
        Some(ServiceKind::Opportunity) => DEMO_OPPORTUNITY_ID,
        Some(ServiceKind::Quote) => DEMO_QUOTE_ID,
        Some(ServiceKind::Lead) | None => DEMO_LEAD_ID,
    }
}

fn tool_check(tool: &str, body: Option<String>, elapsed_ms: u64) -> SmokeCheck {
    let json = body.as_deref().and_then(|body| serde_json::from_str::<Value>(body).ok());
    let (status, message) = match json {
        Some(json) if json["success"] == Value::Bool(true) => {
            (SmokeStatus::Pass, "tool answered with success".to_string())
        }
        Some(json) => (
            SmokeStatus::Fail,
            json["error"].as_str().unwrap_or("tool answered without an error message").to_string(),
        ),
        None => (SmokeStatus::Fail, "tool produced no JSON body".to_string()),
    };
    SmokeCheck { name: format!("tool:{tool}"), status, elapsed_ms, message }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn skipped(tool: &str) -> SmokeCheck {
    SmokeCheck {
        name: format!("tool:{tool}"),
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            concat!(
                "{{\"command\":\"smoke\",\"status\":\"fail\",",
                "\"summary\":\"serialization failed\",\"error\":\"{}\"}}"
            ),
            escape_json(&error.to_string())
        )
    });

    CommandResult {
        exit_code: if failed { EXIT_SMOKE_FAILURE } else { 0 },
        output: format!("{human}\n{machine}"),
    }
}
