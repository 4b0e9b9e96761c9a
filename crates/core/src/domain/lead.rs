//! Lead qualification results. All lead data is mocked; the shapes are what
//! the lead tools render.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identifier::{CompanyName, LeadId};

const QUALITY_SCORE_CLEAN: u32 = 85;
const QUALITY_SCORE_WITH_ERRORS: u32 = 45;

pub const CHECKED_CRITERIA: [&str; 5] = [
    "Contact details complete",
    "Company affiliation present",
    "Email format correct",
    "Phone number plausible",
    "Mandatory fields filled",
];

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: String,
    pub industry: String,
    pub employees: String,
    pub founded_year: u16,
    pub description: String,
    pub sources: Vec<String>,
    pub last_updated: DateTime<Utc>,
    pub confidence: f64,
}

impl CompanyProfile {
    pub fn basic(name: &CompanyName, now: DateTime<Utc>) -> Self {
        Self {
            company_name: name.as_str().to_string(),
            industry: "Technology".to_string(),
            employees: "50-200".to_string(),
            founded_year: 2010,
            description: format!("Basic information for company: {name}"),
            sources: vec!["Internal database".to_string(), "Public registers".to_string()],
            last_updated: now,
            confidence: 0.85,
        }
    }
}

/// Problems found while checking a lead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LeadFindings {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadValidation {
    pub lead_id: LeadId,
    pub is_valid: bool,
    pub quality_score: u32,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub checked_criteria: Vec<String>,
}

impl LeadValidation {
    /// Warnings never affect validity or the score.
    pub fn assess(lead_id: LeadId, findings: LeadFindings) -> Self {
        let is_valid = findings.errors.is_empty();
        Self {
            lead_id,
            is_valid,
            quality_score: if is_valid { QUALITY_SCORE_CLEAN } else { QUALITY_SCORE_WITH_ERRORS },
            errors: findings.errors,
            warnings: findings.warnings,
            checked_criteria: CHECKED_CRITERIA
                .iter()
                .map(|criterion| (*criterion).to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    pub lead_id: LeadId,
    pub summary: String,
}

impl LeadSummary {
    pub fn engagement_history(lead_id: LeadId) -> Self {
        Self { lead_id, summary: format!("Engagement history for lead with ID: {lead_id}") }
    }

    pub fn lead_score(lead_id: LeadId) -> Self {
        Self { lead_id, summary: format!("Lead score for lead with ID: {lead_id}") }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{CompanyProfile, LeadFindings, LeadSummary, LeadValidation};
    use crate::identifier::{CompanyName, LeadId};

    fn lead() -> LeadId {
        LeadId::parse("6f9619ff-8b86-d011-b42d-00cf4fc964ff").expect("fixture id should parse")
    }

    #[test]
    fn clean_lead_scores_high() {
        let validation = LeadValidation::assess(lead(), LeadFindings::default());

        assert!(validation.is_valid);
        assert_eq!(validation.quality_score, 85);
        assert_eq!(validation.checked_criteria.len(), 5);
    }

    #[test]
    fn errors_invalidate_and_lower_the_score() {
        let findings = LeadFindings {
            errors: vec!["Email address missing".to_string()],
            warnings: vec!["Phone number not verified".to_string()],
        };

        let validation = LeadValidation::assess(lead(), findings);

        assert!(!validation.is_valid);
        assert_eq!(validation.quality_score, 45);
        assert_eq!(validation.warnings, vec!["Phone number not verified".to_string()]);
    }

    #[test]
    fn warnings_alone_keep_the_lead_valid() {
        let findings =
            LeadFindings { errors: Vec::new(), warnings: vec!["Stale record".to_string()] };

        assert!(LeadValidation::assess(lead(), findings).is_valid);
    }

    #[test]
    fn profile_echoes_the_company_name() {
        let name = CompanyName::parse("Contoso Ltd").expect("name should parse");
        let profile = CompanyProfile::basic(&name, Utc::now());
        let json = serde_json::to_value(&profile).expect("profile should serialize");

        assert_eq!(json["companyName"], "Contoso Ltd");
        assert_eq!(json["description"], "Basic information for company: Contoso Ltd");
        assert_eq!(json["foundedYear"], 2010);
    }

    #[test]
    fn summaries_embed_the_lead_id() {
        let summary = LeadSummary::lead_score(lead());

        assert_eq!(
            summary.summary,
            "Lead score for lead with ID: 6f9619ff-8b86-d011-b42d-00cf4fc964ff"
        );
        assert!(LeadSummary::engagement_history(lead()).summary.starts_with("Engagement history"));
    }
}
