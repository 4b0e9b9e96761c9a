//! Read-only access to the CRM that backs the opportunity tools.
//!
//! The tools only ever see [`CrmAccessor`]. How credentials are obtained for a
//! call (the Dataverse on-behalf-of exchange, or nothing at all for the
//! in-memory backend) stays behind the trait.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use salesdesk_core::config::{CrmBackend, CrmConfig};
use salesdesk_core::errors::ToolError;
use salesdesk_core::identifier::OpportunityId;
use salesdesk_core::CallContext;

pub mod dataverse;
pub mod fixtures;
pub mod memory;
pub mod records;

pub use dataverse::{DataverseClient, DataverseSettings};
pub use memory::{AccessorMethod, InMemoryCrm};
pub use records::{CrmIdentity, OpportunityProductRecord, OpportunityRecord};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("no bearer token was supplied for the CRM request")]
    MissingCredential,
    #[error("CRM client is misconfigured: {0}")]
    Configuration(String),
    #[error("opportunity id `{0}` is not a valid GUID")]
    InvalidIdentifier(String),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("CRM denied access to {operation} (HTTP {status})")]
    Unauthorized { operation: &'static str, status: u16 },
    #[error("{entity} `{id}` was not found")]
    NotFound { entity: &'static str, id: String },
    #[error("CRM {operation} returned HTTP {status}")]
    Status { operation: &'static str, status: u16 },
    #[error("CRM request failed: {0}")]
    Transport(String),
    #[error("could not decode CRM response: {0}")]
    Decode(String),
}

impl AccessError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::Configuration(_) => "configuration",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::TokenExchange(_) => "token_exchange",
            Self::Unauthorized { .. } => "unauthorized",
            Self::NotFound { .. } => "not_found",
            Self::Status { .. } => "status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
        }
    }
}

impl From<AccessError> for ToolError {
    fn from(error: AccessError) -> Self {
        ToolError::external(error.to_string())
    }
}

#[async_trait]
pub trait CrmAccessor: Send + Sync {
    /// Name of the backend, for health and startup logs.
    fn backend(&self) -> &'static str;

    async fn identity_lookup(&self, context: &CallContext) -> Result<CrmIdentity, AccessError>;

    async fn fetch_opportunity(
        &self,
        context: &CallContext,
        opportunity_id: &OpportunityId,
    ) -> Result<OpportunityRecord, AccessError>;

    async fn fetch_opportunity_products(
        &self,
        context: &CallContext,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunityProductRecord>, AccessError>;
}

/// Builds the accessor selected by `crm.backend`.
pub fn accessor_from_config(config: &CrmConfig) -> Result<Arc<dyn CrmAccessor>, AccessError> {
    match config.backend {
        CrmBackend::Mock => Ok(Arc::new(InMemoryCrm::seeded())),
        CrmBackend::Dataverse => {
            let settings = DataverseSettings::from_config(config)?;
            Ok(Arc::new(DataverseClient::new(settings)?))
        }
    }
}
