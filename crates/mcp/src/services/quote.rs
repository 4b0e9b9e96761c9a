use chrono::Utc;

use salesdesk_core::domain::quote::{
    compliance_documents, quote_line_items, stock_positions, AvailabilityReport, ComplianceReport,
    DiscountRange, QuoteSummary,
};
use salesdesk_core::envelope::{invoke, ToolDescriptor, ToolResponse};
use salesdesk_core::identifier::QuoteId;
use salesdesk_core::CallContext;

pub const GET_PRODUCT_AVAILABILITY: ToolDescriptor =
    ToolDescriptor::new("getProductAvailability", "Error while retrieving availability");
pub const CALCULATE_DISCOUNT_RANGE: ToolDescriptor =
    ToolDescriptor::new("calculateDiscountRange", "Error during discount calculation");
pub const SEARCH_COMPLIANCE_DOCUMENTS: ToolDescriptor =
    ToolDescriptor::new("searchComplianceDocuments", "Error during compliance document search");
pub const GENERATE_QUOTE_SUMMARY: ToolDescriptor =
    ToolDescriptor::new("generateQuoteSummary", "Error while generating the quote summary");

/// Quote preparation tools over mocked ERP, pricing and document data.
#[derive(Clone, Debug, Default)]
pub struct QuoteTools;

impl QuoteTools {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_product_availability(
        &self,
        context: &CallContext,
        quote_id: &str,
    ) -> ToolResponse<AvailabilityReport> {
        let input = QuoteId::parse(quote_id);
        invoke(context, &GET_PRODUCT_AVAILABILITY, quote_id, input, |quote_id| async move {
            Ok(AvailabilityReport::new(quote_id, stock_positions()))
        })
        .await
    }

    pub async fn calculate_discount_range(
        &self,
        context: &CallContext,
        quote_id: &str,
    ) -> ToolResponse<DiscountRange> {
        let input = QuoteId::parse(quote_id);
        invoke(context, &CALCULATE_DISCOUNT_RANGE, quote_id, input, |quote_id| async move {
            Ok(DiscountRange::standard(quote_id))
        })
        .await
    }

    pub async fn search_compliance_documents(
        &self,
        context: &CallContext,
        quote_id: &str,
    ) -> ToolResponse<ComplianceReport> {
        let input = QuoteId::parse(quote_id);
        invoke(context, &SEARCH_COMPLIANCE_DOCUMENTS, quote_id, input, |quote_id| async move {
            let now = Utc::now();
            Ok(ComplianceReport::evaluate(quote_id, compliance_documents(now), now))
        })
        .await
    }

    pub async fn generate_quote_summary(
        &self,
        context: &CallContext,
        quote_id: &str,
    ) -> ToolResponse<QuoteSummary> {
        let input = QuoteId::parse(quote_id);
        invoke(context, &GENERATE_QUOTE_SUMMARY, quote_id, input, |quote_id| async move {
            Ok(QuoteSummary::prepare(quote_id, quote_line_items(), Utc::now()))
        })
        .await
    }
}
