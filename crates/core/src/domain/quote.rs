//! Quote preparation payloads. Stock, discount and compliance data are
//! mocked; only the aggregates are derived.

use chrono::{DateTime, Datelike, Duration, Months, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::pricing::{LineItem, QuoteTotals};
use crate::identifier::QuoteId;

pub const RECOMMENDED_DISCOUNT: u32 = 12;
pub const MINIMUM_DISCOUNT: u32 = 5;
pub const MAXIMUM_DISCOUNT: u32 = 20;
pub const QUOTE_VALIDITY_DAYS: i64 = 30;
/// Documents expiring within this many months are flagged.
pub const EXPIRY_WARNING_MONTHS: u32 = 3;

pub const PAYMENT_TERMS: &str = "Payment within 30 days net";
pub const DELIVERY_TERMS: &str = "Free delivery for orders from 500 EUR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockPosition {
    pub name: String,
    pub sku: String,
    pub available: u32,
    pub reserved: u32,
    pub lead_time_days: u32,
    pub warehouse: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityReport {
    pub quote_id: QuoteId,
    pub products: Vec<StockPosition>,
    pub total_available: u32,
    pub all_in_stock: bool,
    pub max_lead_time: u32,
}

impl AvailabilityReport {
    pub fn new(quote_id: QuoteId, products: Vec<StockPosition>) -> Self {
        Self {
            quote_id,
            total_available: products.iter().map(|product| product.available).sum(),
            all_in_stock: products.iter().all(|product| product.available > 0),
            max_lead_time: products.iter().map(|product| product.lead_time_days).max().unwrap_or(0),
            products,
        }
    }
}

/// Mocked ERP stock levels.
pub fn stock_positions() -> Vec<StockPosition> {
    let position = |name: &str, sku: &str, available, reserved, lead_time_days, warehouse: &str| {
        StockPosition {
            name: name.to_string(),
            sku: sku.to_string(),
            available,
            reserved,
            lead_time_days,
            warehouse: warehouse.to_string(),
        }
    };

    vec![
        position("Product A", "SKU-001", 50, 10, 2, "Hamburg"),
        position("Product B", "SKU-002", 0, 5, 14, "Munich"),
        position("Product C", "SKU-003", 100, 0, 1, "Berlin"),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountTier {
    pub tier: String,
    pub min_discount: u32,
    pub max_discount: u32,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountFactors {
    pub customer_lifetime_value: String,
    pub order_volume: String,
    pub competitive_pressure: String,
    pub seasonality: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRange {
    pub quote_id: QuoteId,
    pub recommended_discount: u32,
    pub minimum_discount: u32,
    pub maximum_discount: u32,
    pub discount_tiers: Vec<DiscountTier>,
    pub factors: DiscountFactors,
}

impl DiscountRange {
    pub fn standard(quote_id: QuoteId) -> Self {
        let tier = |tier: &str, min_discount, max_discount, reason: &str| DiscountTier {
            tier: tier.to_string(),
            min_discount,
            max_discount,
            reason: reason.to_string(),
        };

        Self {
            quote_id,
            recommended_discount: RECOMMENDED_DISCOUNT,
            minimum_discount: MINIMUM_DISCOUNT,
            maximum_discount: MAXIMUM_DISCOUNT,
            discount_tiers: vec![
                tier("Standard", 5, 10, "Standard discount for new customers"),
                tier("Volume", 10, 15, "Bulk purchase of 10 units or more"),
                tier(
                    "Loyalty",
                    15,
                    20,
                    "Existing customer with a business relationship of more than 3 years",
                ),
            ],
            factors: DiscountFactors {
                customer_lifetime_value: "Medium".to_string(),
                order_volume: "High".to_string(),
                competitive_pressure: "Low".to_string(),
                seasonality: "Normal".to_string(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub mandatory: bool,
    pub valid_until: DateTime<Utc>,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub quote_id: QuoteId,
    pub total_documents: usize,
    pub mandatory_documents: usize,
    pub documents: Vec<ComplianceDocument>,
    pub all_mandatory_present: bool,
    pub expiring_documents: Vec<String>,
}

impl ComplianceReport {
    pub fn evaluate(
        quote_id: QuoteId,
        documents: Vec<ComplianceDocument>,
        now: DateTime<Utc>,
    ) -> Self {
        let warning_horizon = add_months(now, EXPIRY_WARNING_MONTHS);
        let mandatory: Vec<&ComplianceDocument> =
            documents.iter().filter(|document| document.mandatory).collect();

        Self {
            quote_id,
            total_documents: documents.len(),
            mandatory_documents: mandatory.len(),
            all_mandatory_present: mandatory.iter().all(|document| document.valid_until > now),
            expiring_documents: documents
                .iter()
                .filter(|document| document.valid_until < warning_horizon)
                .map(|document| document.name.clone())
                .collect(),
            documents,
        }
    }
}

/// Mocked compliance library, validity relative to `now`.
pub fn compliance_documents(now: DateTime<Utc>) -> Vec<ComplianceDocument> {
    let document = |name: &str, document_type: &str, mandatory, valid_months, url: &str| {
        ComplianceDocument {
            name: name.to_string(),
            document_type: document_type.to_string(),
            mandatory,
            valid_until: add_months(now, valid_months),
            url: url.to_string(),
        }
    };

    let terms = "General terms and conditions";
    vec![
        document("Terms_Standard_2026.pdf", terms, true, 12, "/compliance/terms.pdf"),
        document("GDPR_Compliance.pdf", "Privacy policy", true, 24, "/compliance/gdpr.pdf"),
        document(
            "ISO_9001_Certificate.pdf",
            "Quality certificate",
            false,
            6,
            "/compliance/iso9001.pdf",
        ),
        document("Product_Safety_CE.pdf", "CE marking", true, 36, "/compliance/ce.pdf"),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummary {
    pub quote_id: QuoteId,
    pub quote_number: String,
    pub created_date: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub line_items: Vec<LineItem>,
    pub summary: QuoteTotals,
    pub payment_terms: String,
    pub delivery_terms: String,
}

impl QuoteSummary {
    pub fn prepare(quote_id: QuoteId, line_items: Vec<LineItem>, now: DateTime<Utc>) -> Self {
        Self {
            quote_id,
            quote_number: quote_number(quote_id, now),
            created_date: now,
            valid_until: now + Duration::days(QUOTE_VALIDITY_DAYS),
            summary: QuoteTotals::from_lines(&line_items),
            line_items,
            payment_terms: PAYMENT_TERMS.to_string(),
            delivery_terms: DELIVERY_TERMS.to_string(),
        }
    }
}

/// `Q-{year}-{first 8 characters of the id}`.
pub fn quote_number(quote_id: QuoteId, now: DateTime<Utc>) -> String {
    let id = quote_id.to_string();
    format!("Q-{}-{}", now.year(), &id[..8])
}

/// Mocked quote positions.
pub fn quote_line_items() -> Vec<LineItem> {
    vec![
        LineItem::new(1, "Product A", 10, Decimal::new(10_000, 2), 0),
        LineItem::new(2, "Product B", 5, Decimal::new(20_000, 2), 10),
        LineItem::new(3, "Service package", 1, Decimal::new(50_000, 2), 0),
    ]
}

fn add_months(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_add_months(Months::new(months))
        .unwrap_or_else(|| now + Duration::days(i64::from(months) * 30))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;

    use super::{
        compliance_documents, quote_line_items, quote_number, stock_positions, AvailabilityReport,
        ComplianceReport, DiscountRange, QuoteSummary,
    };
    use crate::identifier::QuoteId;

    fn quote() -> QuoteId {
        QuoteId::parse("3f2504e0-4f89-11d3-9a0c-0305e82c3301").expect("fixture id should parse")
    }

    #[test]
    fn availability_aggregates_stock() {
        let report = AvailabilityReport::new(quote(), stock_positions());

        assert_eq!(report.total_available, 150);
        assert!(!report.all_in_stock);
        assert_eq!(report.max_lead_time, 14);
    }

    #[test]
    fn discount_range_spans_the_tiers() {
        let range = DiscountRange::standard(quote());

        assert_eq!(range.discount_tiers.len(), 3);
        assert_eq!(range.recommended_discount, 12);
        assert_eq!(range.minimum_discount, range.discount_tiers[0].min_discount);
        assert_eq!(range.maximum_discount, range.discount_tiers[2].max_discount);
    }

    #[test]
    fn compliance_flags_documents_expiring_soon() {
        let now = Utc::now();
        let report = ComplianceReport::evaluate(quote(), compliance_documents(now), now);

        assert_eq!(report.total_documents, 4);
        assert_eq!(report.mandatory_documents, 3);
        assert!(report.all_mandatory_present);
        assert!(report.expiring_documents.is_empty());
    }

    #[test]
    fn expired_mandatory_document_fails_the_check() {
        let now = Utc::now();
        let mut documents = compliance_documents(now);
        documents[0].valid_until = now - Duration::days(1);

        let report = ComplianceReport::evaluate(quote(), documents, now);

        assert!(!report.all_mandatory_present);
        assert_eq!(report.expiring_documents, vec!["Terms_Standard_2026.pdf".to_string()]);
    }

    #[test]
    fn quote_number_uses_year_and_id_prefix() {
        let now = Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).single().unwrap_or_else(Utc::now);

        assert_eq!(quote_number(quote(), now), "Q-2026-3f2504e0");
    }

    #[test]
    fn summary_totals_cover_all_positions() {
        let now = Utc::now();
        let summary = QuoteSummary::prepare(quote(), quote_line_items(), now);

        assert_eq!(summary.summary.subtotal, Decimal::from(2500));
        assert_eq!(summary.summary.total_discount, Decimal::from(100));
        assert_eq!(summary.summary.grand_total, Decimal::from(2856));
        assert_eq!(summary.valid_until - summary.created_date, Duration::days(30));
    }
}
