use salesdesk_core::config::{AppConfig, LoadOptions};
use salesdesk_core::CallerIdentity;
use salesdesk_crm::accessor_from_config;
use salesdesk_mcp::services::descriptor;
use salesdesk_mcp::ToolServices;
use serde_json::Value;

use crate::commands::{runtime, CommandResult, EXIT_CONFIG, EXIT_TOOL_FAILURE, EXIT_UNKNOWN_TOOL};

/// Runs one tool through the same envelope the MCP servers use and prints
/// the rendered body unchanged.
pub fn run(tool: &str, argument: &str, bearer_token: Option<String>) -> CommandResult {
    if descriptor(tool).is_none() {
        return CommandResult::failure(
            "call",
            "unknown_tool",
            format!("`{tool}` is not a salesdesk tool; see `salesdesk tools`"),
            EXIT_UNKNOWN_TOOL,
        );
    }

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "call",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    let crm = match accessor_from_config(&config.crm) {
        Ok(crm) => crm,
        Err(error) => {
            return CommandResult::failure(
                "call",
                "crm_configuration",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "call",
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_CONFIG,
            )
        }
    };

    let caller = match bearer_token {
        Some(token) => CallerIdentity::anonymous().with_bearer_token(token),
        None => CallerIdentity::anonymous(),
    };
    let services = ToolServices::new(crm);
    let Some(body) = runtime.block_on(services.call(tool, argument, caller)) else {
        return CommandResult::failure(
            "call",
            "unknown_tool",
            format!("`{tool}` is not registered"),
            EXIT_UNKNOWN_TOOL,
        );
    };

    CommandResult { exit_code: exit_code_for(&body), output: body }
}

fn exit_code_for(body: &str) -> u8 {
    let succeeded = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json.get("success").and_then(Value::as_bool))
        .unwrap_or(false);
    if succeeded {
        0
    } else {
        EXIT_TOOL_FAILURE
    }
}
