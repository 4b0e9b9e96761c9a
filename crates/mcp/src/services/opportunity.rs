use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use salesdesk_core::domain::opportunity::{
    customer_documents, format_date, format_datetime, price_catalog, product_value,
    recommendations, Activity, CrmUser, DocumentSearch, Financials, OpportunityInsights,
    PricingInformation, ProductLine, ProductListing, StatusSummary, UNDEFINED_PHASE, UNKNOWN,
    UNKNOWN_OPPORTUNITY,
};
use salesdesk_core::domain::pricing::CURRENCY;
use salesdesk_core::envelope::{invoke, ToolDescriptor, ToolResponse};
use salesdesk_core::identifier::OpportunityId;
use salesdesk_core::CallContext;
use salesdesk_crm::{CrmAccessor, CrmIdentity, OpportunityProductRecord, OpportunityRecord};

pub const GET_PRICING_INFORMATION: ToolDescriptor =
    ToolDescriptor::new("getPricingInformation", "Error while retrieving pricing information");
pub const QUERY_PRODUCTS: ToolDescriptor =
    ToolDescriptor::new("queryProducts", "Error while retrieving product data");
pub const SEARCH_DOCUMENTS_FOR_CUSTOMER: ToolDescriptor =
    ToolDescriptor::new("searchDocumentsForCustomer", "Error during document search");
pub const GET_OPPORTUNITY_INSIGHTS: ToolDescriptor =
    ToolDescriptor::new("getOpportunityInsights", "Error while retrieving opportunity insights");

/// Opportunity tools. Product listing and insights read the CRM; pricing and
/// document search are mocked.
#[derive(Clone)]
pub struct OpportunityTools {
    crm: Arc<dyn CrmAccessor>,
}

impl OpportunityTools {
    pub fn new(crm: Arc<dyn CrmAccessor>) -> Self {
        Self { crm }
    }

    pub fn crm_backend(&self) -> &'static str {
        self.crm.backend()
    }

    pub async fn get_pricing_information(
        &self,
        context: &CallContext,
        opportunity_id: &str,
    ) -> ToolResponse<PricingInformation> {
        invoke(
            context,
            &GET_PRICING_INFORMATION,
            opportunity_id,
            OpportunityId::parse(opportunity_id),
            move |id| async move {
                Ok(PricingInformation::from_catalog(id.as_str(), price_catalog()))
            },
        )
        .await
    }

    pub async fn query_products(
        &self,
        context: &CallContext,
        opportunity_id: &str,
    ) -> ToolResponse<ProductListing> {
        invoke(
            context,
            &QUERY_PRODUCTS,
            opportunity_id,
            OpportunityId::parse(opportunity_id),
            move |id| async move {
                let identity = self.crm.identity_lookup(context).await?;
                log_identity(context, &identity);
                let products = self.crm.fetch_opportunity_products(context, &id).await?;

                Ok(ProductListing {
                    opportunity_id: id.as_str().to_string(),
                    crm_user_id: identity.user_id.to_string(),
                    business_unit_id: identity.business_unit_id.to_string(),
                    total_products: products.len(),
                    products: products.iter().map(product_line).collect(),
                })
            },
        )
        .await
    }

    pub async fn search_documents_for_customer(
        &self,
        context: &CallContext,
        opportunity_id: &str,
    ) -> ToolResponse<DocumentSearch> {
        invoke(
            context,
            &SEARCH_DOCUMENTS_FOR_CUSTOMER,
            opportunity_id,
            OpportunityId::parse(opportunity_id),
            move |id| async move {
                Ok(DocumentSearch::new(id.as_str(), customer_documents(Utc::now())))
            },
        )
        .await
    }

    /// Identity, opportunity and product list are fetched one after another.
    pub async fn get_opportunity_insights(
        &self,
        context: &CallContext,
        opportunity_id: &str,
    ) -> ToolResponse<OpportunityInsights> {
        invoke(
            context,
            &GET_OPPORTUNITY_INSIGHTS,
            opportunity_id,
            OpportunityId::parse(opportunity_id),
            move |id| async move {
                let identity = self.crm.identity_lookup(context).await?;
                log_identity(context, &identity);
                let record = self.crm.fetch_opportunity(context, &id).await?;
                let products = self.crm.fetch_opportunity_products(context, &id).await?;

                Ok(build_insights(&id, &identity, &record, &products))
            },
        )
        .await
    }
}

fn product_line(product: &OpportunityProductRecord) -> ProductLine {
    ProductLine::new(product.description.as_deref(), product.price_per_unit, product.quantity)
}

fn log_identity(context: &CallContext, identity: &CrmIdentity) {
    info!(
        event_name = "tool.crm.identity",
        tool = context.tool(),
        correlation_id = %context.correlation_id(),
        crm_user_id = %identity.user_id,
        business_unit_id = %identity.business_unit_id,
        "crm user identified"
    );
}

pub fn build_insights(
    opportunity_id: &OpportunityId,
    identity: &CrmIdentity,
    record: &OpportunityRecord,
    products: &[OpportunityProductRecord],
) -> OpportunityInsights {
    let estimated_value = record.estimated_value.unwrap_or(Decimal::ZERO);
    let close_probability = record.close_probability.unwrap_or(0);

    OpportunityInsights {
        opportunity_id: opportunity_id.as_str().to_string(),
        opportunity_name: record.name.clone().unwrap_or_else(|| UNKNOWN_OPPORTUNITY.to_string()),
        crm_user: CrmUser {
            user_id: identity.user_id.to_string(),
            business_unit_id: identity.business_unit_id.to_string(),
        },
        financials: Financials {
            estimated_value,
            product_value: product_value(products.iter().map(|product| product.base_amount)),
            close_probability,
            currency: CURRENCY.to_string(),
        },
        status: StatusSummary {
            status_code: record.status_text().unwrap_or_else(|| UNKNOWN.to_string()),
            sales_phase: record.step_name.clone().unwrap_or_else(|| UNDEFINED_PHASE.to_string()),
            estimated_close_date: format_date(record.estimated_close_date),
        },
        activity: Activity {
            created_on: format_datetime(record.created_on),
            modified_on: format_datetime(record.modified_on),
            product_count: products.len(),
        },
        recommendations: recommendations(close_probability, estimated_value, products.len()),
    }
}
