use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const CURRENCY: &str = "EUR";
/// VAT rate applied to quote totals, in percent.
pub const TAX_RATE_PERCENT: u32 = 19;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub position: u32,
    pub product: String,
    pub quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_price: Decimal,
    /// Line discount in percent.
    pub discount: u32,
}

impl LineItem {
    pub fn new(
        position: u32,
        product: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
        discount: u32,
    ) -> Self {
        Self {
            position,
            product: product.into(),
            quantity,
            unit_price,
            total_price: unit_price * Decimal::from(quantity),
            discount,
        }
    }

    pub fn discount_amount(&self) -> Decimal {
        self.total_price * Decimal::from(self.discount) / Decimal::ONE_HUNDRED
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteTotals {
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_total: Decimal,
    pub tax_rate: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    pub currency: String,
}

impl QuoteTotals {
    pub fn from_lines(lines: &[LineItem]) -> Self {
        let subtotal: Decimal = lines.iter().map(|line| line.total_price).sum();
        let total_discount: Decimal = lines.iter().map(LineItem::discount_amount).sum();
        let net_total = subtotal - total_discount;
        let tax_amount = net_total * Decimal::from(TAX_RATE_PERCENT) / Decimal::ONE_HUNDRED;

        Self {
            subtotal,
            total_discount,
            net_total,
            tax_rate: TAX_RATE_PERCENT,
            tax_amount,
            grand_total: net_total + tax_amount,
            currency: CURRENCY.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{LineItem, QuoteTotals};

    #[test]
    fn totals_apply_line_discounts_then_tax() {
        let lines = vec![
            LineItem::new(1, "Product A", 10, Decimal::from(100), 0),
            LineItem::new(2, "Product B", 5, Decimal::from(200), 10),
        ];

        let totals = QuoteTotals::from_lines(&lines);

        assert_eq!(totals.subtotal, Decimal::from(2000));
        assert_eq!(totals.total_discount, Decimal::from(100));
        assert_eq!(totals.net_total, Decimal::from(1900));
        assert_eq!(totals.tax_amount, Decimal::from(361));
        assert_eq!(totals.grand_total, Decimal::from(2261));
        assert_eq!(totals.currency, "EUR");
    }

    #[test]
    fn empty_quote_totals_are_zero() {
        let totals = QuoteTotals::from_lines(&[]);

        assert_eq!(totals.grand_total, Decimal::ZERO);
        assert_eq!(totals.tax_rate, 19);
    }

    #[test]
    fn money_serializes_as_json_numbers() {
        let line = LineItem::new(3, "Service package", 1, Decimal::from(500), 0);
        let json = serde_json::to_value(&line).expect("line should serialize");

        assert_eq!(json["unitPrice"], 500.0);
        assert_eq!(json["totalPrice"], 500.0);
    }
}
