//! MCP handlers, one per service.
//!
//! Handlers are thin: they resolve the caller from the forwarded request
//! head, run the tool through its service and return the rendered envelope as
//! a single text item. Failures are part of the body, so every call result is
//! reported as a success at the protocol level.

use axum::http::request::Parts;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_handler, tool_router, ErrorData, RoleServer, ServerHandler};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use salesdesk_core::envelope::{ToolDescriptor, ToolResponse};
use salesdesk_core::{CallContext, CallerIdentity};

use crate::auth::caller_from_headers;
use crate::services::{lead, opportunity, quote, LeadTools, OpportunityTools, QuoteTools};

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompanyProfileRequest {
    /// Company name to look up.
    pub name: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadRequest {
    /// Lead id (GUID).
    pub lead_id: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OpportunityRequest {
    /// Opportunity id in the CRM.
    pub opportunity_id: String,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Quote id (GUID).
    pub quote_id: String,
}

fn caller(context: &RequestContext<RoleServer>) -> CallerIdentity {
    context
        .extensions
        .get::<Parts>()
        .map(|parts| caller_from_headers(&parts.headers))
        .unwrap_or_else(CallerIdentity::anonymous)
}

fn call_context(tool: &ToolDescriptor, context: &RequestContext<RoleServer>) -> CallContext {
    CallContext::new(tool.name, caller(context))
}

fn reply<T: Serialize>(
    tool: &ToolDescriptor,
    response: ToolResponse<T>,
) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::text(response.render(tool))]))
}

fn server_info(instructions: &str) -> ServerInfo {
    ServerInfo {
        protocol_version: ProtocolVersion::LATEST,
        capabilities: ServerCapabilities::builder().enable_tools().build(),
        server_info: Implementation::from_build_env(),
        instructions: Some(instructions.to_string()),
    }
}

/// Lead qualification service.
#[derive(Clone)]
pub struct LeadMcpServer {
    tools: LeadTools,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl LeadMcpServer {
    pub fn new(tools: LeadTools) -> Self {
        Self { tools, tool_router: Self::tool_router() }
    }

    pub fn tool_list(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    #[tool(
        name = "getCompanyProfile",
        description = "Basic company information for lead qualification."
    )]
    async fn get_company_profile(
        &self,
        Parameters(request): Parameters<CompanyProfileRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &lead::GET_COMPANY_PROFILE;
        let call = call_context(tool, &context);
        reply(tool, self.tools.get_company_profile(&call, &request.name).await)
    }

    #[tool(
        name = "validateLeadData",
        description = "Validates lead data quality and completeness."
    )]
    async fn validate_lead_data(
        &self,
        Parameters(request): Parameters<LeadRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &lead::VALIDATE_LEAD_DATA;
        let call = call_context(tool, &context);
        reply(tool, self.tools.validate_lead_data(&call, &request.lead_id).await)
    }

    #[tool(name = "getEngagementHistory", description = "Engagement history of a lead.")]
    async fn get_engagement_history(
        &self,
        Parameters(request): Parameters<LeadRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &lead::GET_ENGAGEMENT_HISTORY;
        let call = call_context(tool, &context);
        reply(tool, self.tools.get_engagement_history(&call, &request.lead_id).await)
    }

    #[tool(name = "calculateLeadScore", description = "Lead score for a lead.")]
    async fn calculate_lead_score(
        &self,
        Parameters(request): Parameters<LeadRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &lead::CALCULATE_LEAD_SCORE;
        let call = call_context(tool, &context);
        reply(tool, self.tools.calculate_lead_score(&call, &request.lead_id).await)
    }
}

#[tool_handler]
impl ServerHandler for LeadMcpServer {
    fn get_info(&self) -> ServerInfo {
        server_info(
            "Lead qualification tools: company profile, lead validation, engagement history and lead score.",
        )
    }
}

/// Opportunity service. Product listing and insights read the CRM as the
/// calling user.
#[derive(Clone)]
pub struct OpportunityMcpServer {
    tools: OpportunityTools,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl OpportunityMcpServer {
    pub fn new(tools: OpportunityTools) -> Self {
        Self { tools, tool_router: Self::tool_router() }
    }

    pub fn tool_list(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    pub fn crm_backend(&self) -> &'static str {
        self.tools.crm_backend()
    }

    #[tool(
        name = "getPricingInformation",
        description = "Price list and discounts for an opportunity."
    )]
    async fn get_pricing_information(
        &self,
        Parameters(request): Parameters<OpportunityRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &opportunity::GET_PRICING_INFORMATION;
        let call = call_context(tool, &context);
        reply(tool, self.tools.get_pricing_information(&call, &request.opportunity_id).await)
    }

    #[tool(name = "queryProducts", description = "Products attached to an opportunity in the CRM.")]
    async fn query_products(
        &self,
        Parameters(request): Parameters<OpportunityRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &opportunity::QUERY_PRODUCTS;
        let call = call_context(tool, &context);
        reply(tool, self.tools.query_products(&call, &request.opportunity_id).await)
    }

    #[tool(
        name = "searchDocumentsForCustomer",
        description = "Customer documents related to an opportunity."
    )]
    async fn search_documents_for_customer(
        &self,
        Parameters(request): Parameters<OpportunityRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &opportunity::SEARCH_DOCUMENTS_FOR_CUSTOMER;
        let call = call_context(tool, &context);
        reply(tool, self.tools.search_documents_for_customer(&call, &request.opportunity_id).await)
    }

    #[tool(
        name = "getOpportunityInsights",
        description = "Financials, status, activity and recommendations for an opportunity from the CRM."
    )]
    async fn get_opportunity_insights(
        &self,
        Parameters(request): Parameters<OpportunityRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &opportunity::GET_OPPORTUNITY_INSIGHTS;
        let call = call_context(tool, &context);
        reply(tool, self.tools.get_opportunity_insights(&call, &request.opportunity_id).await)
    }
}

#[tool_handler]
impl ServerHandler for OpportunityMcpServer {
    fn get_info(&self) -> ServerInfo {
        server_info(
            "Opportunity tools: pricing, CRM products, customer documents and opportunity insights.",
        )
    }
}

/// Quote preparation service.
#[derive(Clone)]
pub struct QuoteMcpServer {
    tools: QuoteTools,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl QuoteMcpServer {
    pub fn new(tools: QuoteTools) -> Self {
        Self { tools, tool_router: Self::tool_router() }
    }

    pub fn tool_list(&self) -> Vec<Tool> {
        self.tool_router.list_all()
    }

    #[tool(
        name = "getProductAvailability",
        description = "Stock and lead times for the products of a quote."
    )]
    async fn get_product_availability(
        &self,
        Parameters(request): Parameters<QuoteRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &quote::GET_PRODUCT_AVAILABILITY;
        let call = call_context(tool, &context);
        reply(tool, self.tools.get_product_availability(&call, &request.quote_id).await)
    }

    #[tool(name = "calculateDiscountRange", description = "Allowed discount range for a quote.")]
    async fn calculate_discount_range(
        &self,
        Parameters(request): Parameters<QuoteRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &quote::CALCULATE_DISCOUNT_RANGE;
        let call = call_context(tool, &context);
        reply(tool, self.tools.calculate_discount_range(&call, &request.quote_id).await)
    }

    #[tool(
        name = "searchComplianceDocuments",
        description = "Compliance documents and certificates for a quote."
    )]
    async fn search_compliance_documents(
        &self,
        Parameters(request): Parameters<QuoteRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &quote::SEARCH_COMPLIANCE_DOCUMENTS;
        let call = call_context(tool, &context);
        reply(tool, self.tools.search_compliance_documents(&call, &request.quote_id).await)
    }

    #[tool(
        name = "generateQuoteSummary",
        description = "Line items, totals and terms for a quote."
    )]
    async fn generate_quote_summary(
        &self,
        Parameters(request): Parameters<QuoteRequest>,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        let tool = &quote::GENERATE_QUOTE_SUMMARY;
        let call = call_context(tool, &context);
        reply(tool, self.tools.generate_quote_summary(&call, &request.quote_id).await)
    }
}

#[tool_handler]
impl ServerHandler for QuoteMcpServer {
    fn get_info(&self) -> ServerInfo {
        server_info(
            "Quote preparation tools: availability, discount range, compliance documents and quote summary.",
        )
    }
}
