//! Tool implementations grouped by service.
//!
//! Each service method takes the raw argument string, validates it and runs
//! inside the envelope, so transports only deal in names and strings.

use std::sync::Arc;

use salesdesk_core::envelope::ToolDescriptor;
use salesdesk_core::{CallContext, CallerIdentity};
use salesdesk_crm::CrmAccessor;

pub mod lead;
pub mod opportunity;
pub mod quote;

pub use lead::LeadTools;
pub use opportunity::OpportunityTools;
pub use quote::QuoteTools;

/// Every tool descriptor, in listing order.
pub const DESCRIPTORS: [&ToolDescriptor; 12] = [
    &lead::GET_COMPANY_PROFILE,
    &lead::VALIDATE_LEAD_DATA,
    &lead::GET_ENGAGEMENT_HISTORY,
    &lead::CALCULATE_LEAD_SCORE,
    &opportunity::GET_PRICING_INFORMATION,
    &opportunity::QUERY_PRODUCTS,
    &opportunity::SEARCH_DOCUMENTS_FOR_CUSTOMER,
    &opportunity::GET_OPPORTUNITY_INSIGHTS,
    &quote::GET_PRODUCT_AVAILABILITY,
    &quote::CALCULATE_DISCOUNT_RANGE,
    &quote::SEARCH_COMPLIANCE_DOCUMENTS,
    &quote::GENERATE_QUOTE_SUMMARY,
];

pub fn descriptor(tool: &str) -> Option<&'static ToolDescriptor> {
    DESCRIPTORS.into_iter().find(|descriptor| descriptor.name == tool)
}

/// All twelve tools behind one name-based entry point. Used by the CLI and
/// by tests that do not need a transport.
#[derive(Clone)]
pub struct ToolServices {
    pub lead: LeadTools,
    pub opportunity: OpportunityTools,
    pub quote: QuoteTools,
}

impl ToolServices {
    pub fn new(crm: Arc<dyn CrmAccessor>) -> Self {
        Self {
            lead: LeadTools::new(),
            opportunity: OpportunityTools::new(crm),
            quote: QuoteTools::new(),
        }
    }

    /// Runs `tool` with its single argument and returns the rendered envelope,
    /// or `None` for an unknown tool name.
    pub async fn call(&self, tool: &str, argument: &str, caller: CallerIdentity) -> Option<String> {
        let descriptor = descriptor(tool)?;
        let context = CallContext::new(descriptor.name, caller);

        let (lead, opportunity, quote) = (&self.lead, &self.opportunity, &self.quote);
        let body = match descriptor.name {
            "getCompanyProfile" => {
                lead.get_company_profile(&context, argument).await.render(descriptor)
            }
            "validateLeadData" => {
                lead.validate_lead_data(&context, argument).await.render(descriptor)
            }
            "getEngagementHistory" => {
                lead.get_engagement_history(&context, argument).await.render(descriptor)
            }
            "calculateLeadScore" => {
                lead.calculate_lead_score(&context, argument).await.render(descriptor)
            }
            "getPricingInformation" => {
                opportunity.get_pricing_information(&context, argument).await.render(descriptor)
            }
            "queryProducts" => {
                opportunity.query_products(&context, argument).await.render(descriptor)
            }
            "searchDocumentsForCustomer" => {
                opportunity
                    .search_documents_for_customer(&context, argument)
                    .await
                    .render(descriptor)
            }
            "getOpportunityInsights" => {
                opportunity.get_opportunity_insights(&context, argument).await.render(descriptor)
            }
            "getProductAvailability" => {
                quote.get_product_availability(&context, argument).await.render(descriptor)
            }
            "calculateDiscountRange" => {
                quote.calculate_discount_range(&context, argument).await.render(descriptor)
            }
            "searchComplianceDocuments" => {
                quote.search_compliance_documents(&context, argument).await.render(descriptor)
            }
            "generateQuoteSummary" => {
                quote.generate_quote_summary(&context, argument).await.render(descriptor)
            }
            _ => return None,
        };
        Some(body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use salesdesk_core::CallerIdentity;
    use salesdesk_crm::InMemoryCrm;
    use serde_json::Value;

    use super::{descriptor, ToolServices, DESCRIPTORS};

    #[test]
    fn descriptor_names_are_unique() {
        let mut names: Vec<_> = DESCRIPTORS.iter().map(|descriptor| descriptor.name).collect();
        names.sort_unstable();
        names.dedup();

        assert_eq!(names.len(), DESCRIPTORS.len());
        assert!(descriptor("getOpportunityInsights").is_some());
        assert!(descriptor("get_opportunity_insights").is_none());
    }

    #[tokio::test]
    async fn unknown_tool_yields_none() {
        let services = ToolServices::new(Arc::new(InMemoryCrm::seeded()));

        let body = services.call("deleteEverything", "x", CallerIdentity::anonymous()).await;

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn every_tool_answers_an_empty_argument_with_a_failure() {
        let services = ToolServices::new(Arc::new(InMemoryCrm::seeded()));

        for descriptor in DESCRIPTORS {
            let body = services
                .call(descriptor.name, "", CallerIdentity::anonymous())
                .await
                .expect("known tool should render");
            let json: Value = serde_json::from_str(&body).expect("body should be JSON");

            assert_eq!(json["success"], false, "{}", descriptor.name);
            let error = json["error"].as_str().unwrap_or_default();
            assert!(error.starts_with("Invalid parameter:"), "{error}");
            assert!(json["timestamp"].is_string());
        }
    }
}
