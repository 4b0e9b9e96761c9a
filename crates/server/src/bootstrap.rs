use std::sync::Arc;

use axum::Router;
use salesdesk_core::config::AppConfig;
use salesdesk_core::ServiceKind;
use salesdesk_crm::{accessor_from_config, AccessError, CrmAccessor};
use salesdesk_mcp::{
    LeadMcpServer, LeadTools, OpportunityMcpServer, OpportunityTools, QuoteMcpServer, QuoteTools,
};
use thiserror::Error;
use tracing::info;

use crate::health::ServiceStatus;
use crate::http;

/// The MCP handler selected by `server.service`.
#[derive(Clone)]
pub enum ServiceHandler {
    Lead(LeadMcpServer),
    Opportunity(OpportunityMcpServer),
    Quote(QuoteMcpServer),
}

impl ServiceHandler {
    pub fn kind(&self) -> ServiceKind {
        match self {
            Self::Lead(_) => ServiceKind::Lead,
            Self::Opportunity(_) => ServiceKind::Opportunity,
            Self::Quote(_) => ServiceKind::Quote,
        }
    }

    pub fn crm_backend(&self) -> Option<&'static str> {
        match self {
            Self::Opportunity(server) => Some(server.crm_backend()),
            Self::Lead(_) | Self::Quote(_) => None,
        }
    }
}

pub struct Application {
    pub config: AppConfig,
    pub handler: ServiceHandler,
}

impl Application {
    pub fn status(&self) -> ServiceStatus {
        ServiceStatus { service: self.handler.kind(), crm_backend: self.handler.crm_backend() }
    }

    pub fn router(&self) -> Router {
        let status = self.status();
        match &self.handler {
            ServiceHandler::Lead(server) => http::router(server.clone(), status),
            ServiceHandler::Opportunity(server) => http::router(server.clone(), status),
            ServiceHandler::Quote(server) => http::router(server.clone(), status),
        }
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("crm accessor could not be created: {0}")]
    Crm(#[source] AccessError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let service = config.server.service;
    let handler = match service {
        ServiceKind::Lead => ServiceHandler::Lead(LeadMcpServer::new(LeadTools::new())),
        ServiceKind::Opportunity => {
            let crm: Arc<dyn CrmAccessor> =
                accessor_from_config(&config.crm).map_err(BootstrapError::Crm)?;
            info!(
                event_name = "system.bootstrap.crm_ready",
                correlation_id = "bootstrap",
                crm_backend = crm.backend(),
                "crm accessor initialized"
            );
            ServiceHandler::Opportunity(OpportunityMcpServer::new(OpportunityTools::new(crm)))
        }
        ServiceKind::Quote => ServiceHandler::Quote(QuoteMcpServer::new(QuoteTools::new())),
    };

    info!(
        event_name = "system.bootstrap.service_selected",
        correlation_id = "bootstrap",
        service = service.as_str(),
        "{} MCP service selected",
        service.display_name()
    );

    Ok(Application { config, handler })
}
