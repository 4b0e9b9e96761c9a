use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The CRM user the call runs as, resolved from the caller's credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrmIdentity {
    pub user_id: Uuid,
    pub business_unit_id: Uuid,
    pub organization_id: Uuid,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: Uuid,
    pub name: Option<String>,
    pub estimated_value: Option<Decimal>,
    /// Percent, 0..=100.
    pub close_probability: Option<i32>,
    pub step_name: Option<String>,
    pub actual_close_date: Option<NaiveDate>,
    pub estimated_close_date: Option<NaiveDate>,
    pub status_code: Option<i32>,
    /// Localized label for `status_code`, when the CRM supplied one.
    pub status_label: Option<String>,
    pub state_code: Option<i32>,
    pub description: Option<String>,
    pub created_on: Option<DateTime<Utc>>,
    pub modified_on: Option<DateTime<Utc>>,
}

impl OpportunityRecord {
    /// Status label if present, otherwise the raw status code.
    pub fn status_text(&self) -> Option<String> {
        self.status_label
            .clone()
            .or_else(|| self.status_code.map(|code| code.to_string()))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpportunityProductRecord {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub description: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub quantity: Option<Decimal>,
    pub base_amount: Option<Decimal>,
}
