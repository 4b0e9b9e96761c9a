//! Tool identifiers and their validation rules.
//!
//! Opportunity ids are accepted as free-form text (the CRM parses them later),
//! while lead and quote ids must be non-nil GUIDs.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpportunityId(String);

impl OpportunityId {
    pub const FIELD: &'static str = "opportunityId";

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        parse_text(Self::FIELD, raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// GUID form of the id, if it has one.
    pub fn as_guid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.0).ok()
    }
}

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(Uuid);

impl LeadId {
    pub const FIELD: &'static str = "leadId";

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        parse_guid(Self::FIELD, raw).map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(Uuid);

impl QuoteId {
    pub const FIELD: &'static str = "quoteId";

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        parse_guid(Self::FIELD, raw).map(Self)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Free-form company name used by the profile lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyName(String);

impl CompanyName {
    pub const FIELD: &'static str = "name";

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        parse_text(Self::FIELD, raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CompanyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_text(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

fn parse_guid(field: &'static str, raw: &str) -> Result<Uuid, ValidationError> {
    let trimmed = parse_text(field, raw)?;
    let guid = Uuid::parse_str(&trimmed).map_err(|_| ValidationError::Malformed { field })?;
    if guid.is_nil() {
        return Err(ValidationError::Empty { field });
    }
    Ok(guid)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::{CompanyName, LeadId, OpportunityId, QuoteId};
    use crate::errors::ValidationError;

    #[test]
    fn opportunity_id_accepts_any_non_blank_text() {
        let id = OpportunityId::parse("  OPP-42 ").expect("non-blank id should parse");

        assert_eq!(id.as_str(), "OPP-42");
        assert_eq!(id.as_guid(), None);
    }

    #[test]
    fn blank_identifiers_are_rejected() {
        assert_eq!(
            OpportunityId::parse("   "),
            Err(ValidationError::Empty { field: "opportunityId" })
        );
        assert_eq!(CompanyName::parse(""), Err(ValidationError::Empty { field: "name" }));
        assert_eq!(QuoteId::parse("\t"), Err(ValidationError::Empty { field: "quoteId" }));
    }

    #[test]
    fn nil_guid_counts_as_empty() {
        let nil = Uuid::nil().to_string();

        assert_eq!(LeadId::parse(&nil), Err(ValidationError::Empty { field: "leadId" }));
        assert_eq!(QuoteId::parse(&nil), Err(ValidationError::Empty { field: "quoteId" }));
    }

    #[test]
    fn malformed_guid_is_rejected() {
        assert_eq!(LeadId::parse("lead-7"), Err(ValidationError::Malformed { field: "leadId" }));
    }

    #[test]
    fn guid_ids_render_hyphenated_lowercase() {
        let id = QuoteId::parse("3F2504E0-4F89-11D3-9A0C-0305E82C3301").expect("guid should parse");

        assert_eq!(id.to_string(), "3f2504e0-4f89-11d3-9a0c-0305e82c3301");
    }
}
