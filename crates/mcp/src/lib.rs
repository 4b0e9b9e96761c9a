//! Salesdesk MCP (Model Context Protocol) tools
//!
//! This crate exposes the lead, opportunity and quote tools to AI agents.
//! Every tool takes one identifier, runs through the envelope in
//! `salesdesk-core` and answers with a JSON text body carrying `success`,
//! the tool fields or `error`, and `timestamp`.
//!
//! ## Architecture
//!
//! - `services/`: tool implementations per service, transport independent
//! - `server`: rmcp handlers (`LeadMcpServer`, `OpportunityMcpServer`, `QuoteMcpServer`)
//! - `auth`: caller identity from the forwarded `Authorization` header
//! - `tools`: the tool catalogue by service
//!
//! ## Example Usage
//!
//! ```no_run
//! use salesdesk_mcp::{serve_stdio, LeadMcpServer, LeadTools};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     serve_stdio(LeadMcpServer::new(LeadTools::new())).await
//! }
//! ```

pub mod auth;
mod server;
pub mod services;
mod tools;

pub use server::{
    CompanyProfileRequest, LeadMcpServer, LeadRequest, OpportunityMcpServer, OpportunityRequest,
    QuoteMcpServer, QuoteRequest,
};
pub use services::{LeadTools, OpportunityTools, QuoteTools, ToolServices};
pub use tools::*;

use rmcp::{ServerHandler, ServiceExt};
use tracing::info;

/// Serves `handler` over stdin/stdout until the peer disconnects.
pub async fn serve_stdio<S>(handler: S) -> anyhow::Result<()>
where
    S: ServerHandler,
{
    info!(event_name = "mcp.stdio.started", "serving MCP over stdio");

    let service = handler.serve(rmcp::transport::io::stdio()).await?;
    let quit_reason = service.waiting().await?;

    info!(event_name = "mcp.stdio.stopped", reason = ?quit_reason, "MCP stdio session ended");
    Ok(())
}
