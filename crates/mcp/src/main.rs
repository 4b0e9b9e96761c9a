//! Salesdesk MCP stdio binary
//!
//! Serves one service over stdin/stdout for local MCP hosts. Logs go to
//! stderr so they never mix with protocol frames.
//!
//! ## Usage
//!
//! ```bash
//! # Opportunity tools against the seeded in-memory CRM
//! salesdesk-mcp
//!
//! # Quote tools
//! SALESDESK_SERVER_SERVICE=quote salesdesk-mcp
//!
//! # Settings from ./salesdesk.toml or ./config/salesdesk.toml are picked up
//! SALESDESK_LOG_LEVEL=debug salesdesk-mcp
//! ```
//!
//! Stdio callers carry no bearer token, so Dataverse-backed tools answer with
//! a failure body there; use the HTTP server for delegated CRM access.

use anyhow::Result;
use salesdesk_core::config::{AppConfig, LoadOptions, LogFormat};
use salesdesk_core::ServiceKind;
use salesdesk_crm::accessor_from_config;
use salesdesk_mcp::{
    serve_stdio, LeadMcpServer, LeadTools, OpportunityMcpServer, OpportunityTools, QuoteMcpServer,
    QuoteTools,
};
use tracing::{info, Level};

fn init_logging(config: &AppConfig) {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    match config.logging.format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let service = config.server.service;
    info!(
        event_name = "mcp.stdio.bootstrap",
        correlation_id = "bootstrap",
        service = service.as_str(),
        crm_backend = config.crm.backend.as_str(),
        "starting {} MCP service over stdio",
        service.display_name()
    );

    match service {
        ServiceKind::Lead => serve_stdio(LeadMcpServer::new(LeadTools::new())).await,
        ServiceKind::Opportunity => {
            let crm = accessor_from_config(&config.crm)?;
            serve_stdio(OpportunityMcpServer::new(OpportunityTools::new(crm))).await
        }
        ServiceKind::Quote => serve_stdio(QuoteMcpServer::new(QuoteTools::new())).await,
    }
}
