use chrono::Utc;

use salesdesk_core::domain::lead::{CompanyProfile, LeadFindings, LeadSummary, LeadValidation};
use salesdesk_core::envelope::{invoke, ToolDescriptor, ToolResponse};
use salesdesk_core::identifier::{CompanyName, LeadId};
use salesdesk_core::CallContext;

pub const GET_COMPANY_PROFILE: ToolDescriptor =
    ToolDescriptor::new("getCompanyProfile", "Error while retrieving company information");
pub const VALIDATE_LEAD_DATA: ToolDescriptor =
    ToolDescriptor::new("validateLeadData", "Error during lead validation")
        .with_failure_flags(&[("isValid", false)]);
pub const GET_ENGAGEMENT_HISTORY: ToolDescriptor =
    ToolDescriptor::new("getEngagementHistory", "Error while retrieving the engagement history");
pub const CALCULATE_LEAD_SCORE: ToolDescriptor =
    ToolDescriptor::new("calculateLeadScore", "Error while calculating the lead score");

/// Lead qualification tools. No external calls; all data is mocked.
#[derive(Clone, Debug, Default)]
pub struct LeadTools;

impl LeadTools {
    pub fn new() -> Self {
        Self
    }

    pub async fn get_company_profile(
        &self,
        context: &CallContext,
        name: &str,
    ) -> ToolResponse<CompanyProfile> {
        invoke(context, &GET_COMPANY_PROFILE, name, CompanyName::parse(name), |name| async move {
            Ok(CompanyProfile::basic(&name, Utc::now()))
        })
        .await
    }

    pub async fn validate_lead_data(
        &self,
        context: &CallContext,
        lead_id: &str,
    ) -> ToolResponse<LeadValidation> {
        invoke(context, &VALIDATE_LEAD_DATA, lead_id, LeadId::parse(lead_id), |lead_id| async move {
            Ok(LeadValidation::assess(lead_id, LeadFindings::default()))
        })
        .await
    }

    pub async fn get_engagement_history(
        &self,
        context: &CallContext,
        lead_id: &str,
    ) -> ToolResponse<LeadSummary> {
        let input = LeadId::parse(lead_id);
        invoke(context, &GET_ENGAGEMENT_HISTORY, lead_id, input, |lead_id| async move {
            Ok(LeadSummary::engagement_history(lead_id))
        })
        .await
    }

    pub async fn calculate_lead_score(
        &self,
        context: &CallContext,
        lead_id: &str,
    ) -> ToolResponse<LeadSummary> {
        let input = LeadId::parse(lead_id);
        invoke(context, &CALCULATE_LEAD_SCORE, lead_id, input, |lead_id| async move {
            Ok(LeadSummary::lead_score(lead_id))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use salesdesk_core::{CallContext, CallerIdentity};
    use serde_json::Value;

    use super::{LeadTools, VALIDATE_LEAD_DATA};

    const LEAD: &str = "6f9619ff-8b86-d011-b42d-00cf4fc964ff";

    fn context(tool: &'static str) -> CallContext {
        CallContext::new(tool, CallerIdentity::anonymous())
    }

    #[tokio::test]
    async fn blank_company_name_is_rejected() {
        let response =
            LeadTools::new().get_company_profile(&context("getCompanyProfile"), "  ").await;

        assert_eq!(response.error_message(), Some("Invalid parameter: name must not be empty."));
    }

    #[tokio::test]
    async fn validation_failures_carry_is_valid_false() {
        let response = LeadTools::new().validate_lead_data(&context("validateLeadData"), "").await;
        let body = response.render(&VALIDATE_LEAD_DATA);
        let json: Value = serde_json::from_str(&body).expect("body should be JSON");

        assert_eq!(json["success"], false);
        assert_eq!(json["isValid"], false);
        assert_eq!(json["error"], "Invalid parameter: leadId must not be empty.");
    }

    #[tokio::test]
    async fn valid_lead_passes_all_criteria() {
        let response =
            LeadTools::new().validate_lead_data(&context("validateLeadData"), LEAD).await;
        let validation = response.payload().expect("lead should validate");

        assert!(validation.is_valid);
        assert_eq!(validation.quality_score, 85);
        assert_eq!(validation.lead_id.to_string(), LEAD);
    }

    #[tokio::test]
    async fn malformed_lead_id_is_rejected() {
        let response =
            LeadTools::new().calculate_lead_score(&context("calculateLeadScore"), "lead-1").await;

        assert_eq!(response.error_message(), Some("Invalid parameter: leadId must be a GUID."));
    }

    #[tokio::test]
    async fn engagement_history_is_enveloped() {
        let response =
            LeadTools::new().get_engagement_history(&context("getEngagementHistory"), LEAD).await;

        assert!(response.is_success());
        assert_eq!(
            response.payload().map(|summary| summary.summary.as_str()),
            Some("Engagement history for lead with ID: 6f9619ff-8b86-d011-b42d-00cf4fc964ff")
        );
    }
}
