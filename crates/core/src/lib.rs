pub mod config;
pub mod context;
pub mod domain;
pub mod envelope;
pub mod errors;
pub mod identifier;

pub use config::{AppConfig, ConfigError, CrmBackend, LoadOptions, ServiceKind};
pub use context::{CallContext, CallerIdentity};
pub use domain::pricing::{LineItem, QuoteTotals};
pub use envelope::{invoke, ToolDescriptor, ToolFailure, ToolResponse};
pub use errors::{ToolError, ValidationError};
pub use identifier::{CompanyName, LeadId, OpportunityId, QuoteId};
