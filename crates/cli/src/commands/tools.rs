use std::sync::Arc;

use salesdesk_core::ServiceKind;
use salesdesk_crm::InMemoryCrm;
use salesdesk_mcp::{
    LeadMcpServer, LeadTools, OpportunityMcpServer, OpportunityTools, QuoteMcpServer, QuoteTools,
};
use serde::Serialize;

use crate::commands::{CommandResult, EXIT_CONFIG};

#[derive(Debug, Serialize)]
struct ToolEntry {
    service: &'static str,
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
struct ToolListing {
    command: &'static str,
    total: usize,
    tools: Vec<ToolEntry>,
}

/// Lists tools as registered on the MCP handlers, so names and descriptions
/// match what a client sees in `tools/list`.
pub fn run(service: Option<ServiceKind>) -> CommandResult {
    let services: Vec<ServiceKind> = match service {
        Some(service) => vec![service],
        None => ServiceKind::ALL.to_vec(),
    };

    let tools: Vec<ToolEntry> = services.into_iter().flat_map(registered_tools).collect();
    let listing = ToolListing { command: "tools", total: tools.len(), tools };

    match serde_json::to_string_pretty(&listing) {
        Ok(output) => CommandResult { exit_code: 0, output },
        Err(error) => {
            CommandResult::failure("tools", "serialization", error.to_string(), EXIT_CONFIG)
        }
    }
}

fn registered_tools(service: ServiceKind) -> Vec<ToolEntry> {
    let tools = match service {
        ServiceKind::Lead => LeadMcpServer::new(LeadTools::new()).tool_list(),
        ServiceKind::Opportunity => {
            let crm = Arc::new(InMemoryCrm::seeded());
            OpportunityMcpServer::new(OpportunityTools::new(crm)).tool_list()
        }
        ServiceKind::Quote => QuoteMcpServer::new(QuoteTools::new()).tool_list(),
    };

    let order = salesdesk_mcp::tool_names(service);
    let mut entries: Vec<ToolEntry> = tools
        .into_iter()
        .map(|tool| ToolEntry {
            service: service.as_str(),
            name: tool.name.to_string(),
            description: tool.description.map(|text| text.to_string()).unwrap_or_default(),
        })
        .collect();
    entries.sort_by_key(|entry| {
        order.iter().position(|name| *name == entry.name).unwrap_or(usize::MAX)
    });
    entries
}
