//! Opportunity payloads and the derivations behind the insights tool.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::pricing::CURRENCY;

/// Close probability (percent) at or above which an opportunity is high priority.
pub const HIGH_PROBABILITY_THRESHOLD: i32 = 70;
pub const MEDIUM_PROBABILITY_THRESHOLD: i32 = 40;
/// Estimated value strictly above which management attention is recommended.
pub const HIGH_VALUE_THRESHOLD: i64 = 100_000;

pub const HIGH_VALUE_RECOMMENDATION: &str =
    "High-value opportunity - management attention recommended.";
pub const NO_PRODUCTS_RECOMMENDATION: &str = "No products on file - please complete the quote!";

pub const UNKNOWN_PRODUCT: &str = "Unknown product";
pub const UNKNOWN_OPPORTUNITY: &str = "Unknown opportunity";
pub const UNDEFINED_PHASE: &str = "Not defined";
pub const UNSET_DATE: &str = "Not set";
pub const UNKNOWN: &str = "Unknown";

pub const DOCUMENT_SOURCES: [&str; 2] = ["SharePoint", "D3"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbabilityBand {
    High,
    Medium,
    Low,
}

impl ProbabilityBand {
    pub fn from_probability(close_probability: i32) -> Self {
        if close_probability >= HIGH_PROBABILITY_THRESHOLD {
            Self::High
        } else if close_probability >= MEDIUM_PROBABILITY_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn recommendations(self) -> [&'static str; 2] {
        match self {
            Self::High => [
                "High close probability - prioritize this opportunity!",
                "Recommendation: aim for a timely close and remove all blockers.",
            ],
            Self::Medium => [
                "Medium close probability - closer account management recommended.",
                "Recommendation: intensify customer contact and present a tailored solution.",
            ],
            Self::Low => [
                "Low close probability - critical review required.",
                "Recommendation: re-evaluate customer needs and adjust the offer if necessary.",
            ],
        }
    }
}

/// Recommendation texts in render order: the two band texts, then the
/// high-value note, then the missing-products note.
pub fn recommendations(
    close_probability: i32,
    estimated_value: Decimal,
    product_count: usize,
) -> Vec<String> {
    let mut texts: Vec<String> = ProbabilityBand::from_probability(close_probability)
        .recommendations()
        .iter()
        .map(|text| (*text).to_string())
        .collect();

    if estimated_value > Decimal::from(HIGH_VALUE_THRESHOLD) {
        texts.push(HIGH_VALUE_RECOMMENDATION.to_string());
    }
    if product_count == 0 {
        texts.push(NO_PRODUCTS_RECOMMENDATION.to_string());
    }
    texts
}

/// Sum of the known line amounts; missing amounts count as zero.
pub fn product_value<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Option<Decimal>>,
{
    amounts.into_iter().flatten().sum()
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%Y-%m-%d").to_string()).unwrap_or_else(|| UNSET_DATE.to_string())
}

pub fn format_datetime(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|value| value.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedProduct {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub currency: String,
    pub available: bool,
    pub stock: u32,
    pub discount: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInformation {
    pub opportunity_id: String,
    pub products: Vec<PricedProduct>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_value: Decimal,
}

impl PricingInformation {
    pub fn from_catalog(opportunity_id: &str, products: Vec<PricedProduct>) -> Self {
        let total_value = products.iter().map(|product| product.price).sum();
        Self { opportunity_id: opportunity_id.to_string(), products, total_value }
    }
}

/// Mocked live price list.
pub fn price_catalog() -> Vec<PricedProduct> {
    vec![
        PricedProduct {
            name: "Product A".to_string(),
            price: Decimal::new(10_000, 2),
            currency: CURRENCY.to_string(),
            available: true,
            stock: 50,
            discount: 0,
        },
        PricedProduct {
            name: "Product B".to_string(),
            price: Decimal::new(20_000, 2),
            currency: CURRENCY.to_string(),
            available: false,
            stock: 0,
            discount: 10,
        },
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub name: String,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub quantity: Option<Decimal>,
    pub currency: String,
}

impl ProductLine {
    pub fn new(
        description: Option<&str>,
        price: Option<Decimal>,
        quantity: Option<Decimal>,
    ) -> Self {
        Self {
            name: description.unwrap_or(UNKNOWN_PRODUCT).to_string(),
            price,
            quantity,
            currency: CURRENCY.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListing {
    pub opportunity_id: String,
    pub crm_user_id: String,
    pub business_unit_id: String,
    pub total_products: usize,
    pub products: Vec<ProductLine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerDocument {
    pub name: String,
    #[serde(rename = "type")]
    pub document_type: String,
    pub size: String,
    pub modified: DateTime<Utc>,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSearch {
    pub opportunity_id: String,
    pub total_documents: usize,
    pub documents: Vec<CustomerDocument>,
    pub sources: Vec<String>,
}

impl DocumentSearch {
    pub fn new(opportunity_id: &str, documents: Vec<CustomerDocument>) -> Self {
        Self {
            opportunity_id: opportunity_id.to_string(),
            total_documents: documents.len(),
            documents,
            sources: DOCUMENT_SOURCES.iter().map(|source| (*source).to_string()).collect(),
        }
    }
}

/// Mocked document store hits, dated relative to `now`.
pub fn customer_documents(now: DateTime<Utc>) -> Vec<CustomerDocument> {
    let document = |name: &str, document_type: &str, size: &str, age_days: i64, url: &str| {
        CustomerDocument {
            name: name.to_string(),
            document_type: document_type.to_string(),
            size: size.to_string(),
            modified: now - Duration::days(age_days),
            url: url.to_string(),
        }
    };

    vec![
        document("Offer_2026.pdf", "PDF", "2.5 MB", 5, "/documents/offer.pdf"),
        document("Product_catalog.xlsx", "Excel", "1.2 MB", 10, "/documents/catalog.xlsx"),
        document("Customer_reference.docx", "Word", "0.8 MB", 15, "/documents/reference.docx"),
    ]
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrmUser {
    pub user_id: String,
    pub business_unit_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Financials {
    #[serde(with = "rust_decimal::serde::float")]
    pub estimated_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub product_value: Decimal,
    pub close_probability: i32,
    pub currency: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSummary {
    pub status_code: String,
    pub sales_phase: String,
    pub estimated_close_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub created_on: String,
    pub modified_on: String,
    pub product_count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpportunityInsights {
    pub opportunity_id: String,
    pub opportunity_name: String,
    pub crm_user: CrmUser,
    pub financials: Financials,
    pub status: StatusSummary,
    pub activity: Activity,
    pub recommendations: Vec<String>,
}
