//! Tool catalogue by service.
//!
//! - Lead: company profile, validation, engagement history, score
//! - Opportunity: pricing, CRM products, documents, insights
//! - Quote: availability, discount range, compliance, summary

use salesdesk_core::ServiceKind;

/// Lead tools category
pub struct LeadToolset;

/// Opportunity tools category
pub struct OpportunityToolset;

/// Quote tools category
pub struct QuoteToolset;

/// Tool category trait
pub trait ToolCategory {
    /// Service that hosts the category
    fn service() -> ServiceKind
    where
        Self: Sized;
    /// List of tool names in this category
    fn tool_names() -> &'static [&'static str]
    where
        Self: Sized;
}

impl ToolCategory for LeadToolset {
    fn service() -> ServiceKind {
        ServiceKind::Lead
    }
    fn tool_names() -> &'static [&'static str] {
        &["getCompanyProfile", "validateLeadData", "getEngagementHistory", "calculateLeadScore"]
    }
}

impl ToolCategory for OpportunityToolset {
    fn service() -> ServiceKind {
        ServiceKind::Opportunity
    }
    fn tool_names() -> &'static [&'static str] {
        &[
            "getPricingInformation",
            "queryProducts",
            "searchDocumentsForCustomer",
            "getOpportunityInsights",
        ]
    }
}

impl ToolCategory for QuoteToolset {
    fn service() -> ServiceKind {
        ServiceKind::Quote
    }
    fn tool_names() -> &'static [&'static str] {
        &[
            "getProductAvailability",
            "calculateDiscountRange",
            "searchComplianceDocuments",
            "generateQuoteSummary",
        ]
    }
}

/// Tool names hosted by `service`.
pub fn tool_names(service: ServiceKind) -> &'static [&'static str] {
    match service {
        ServiceKind::Lead => LeadToolset::tool_names(),
        ServiceKind::Opportunity => OpportunityToolset::tool_names(),
        ServiceKind::Quote => QuoteToolset::tool_names(),
    }
}

/// Service hosting the tool called `name`.
pub fn service_for(name: &str) -> Option<ServiceKind> {
    ServiceKind::ALL.into_iter().find(|service| tool_names(*service).contains(&name))
}

/// All tool names
pub const ALL_TOOL_NAMES: &[&str] = &[
    "getCompanyProfile",
    "validateLeadData",
    "getEngagementHistory",
    "calculateLeadScore",
    "getPricingInformation",
    "queryProducts",
    "searchDocumentsForCustomer",
    "getOpportunityInsights",
    "getProductAvailability",
    "calculateDiscountRange",
    "searchComplianceDocuments",
    "generateQuoteSummary",
];

/// Total number of tools
pub const TOTAL_TOOLS: usize = ALL_TOOL_NAMES.len();
