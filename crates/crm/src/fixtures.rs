//! Demo dataset for the mock CRM backend and for tests.

use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::records::{CrmIdentity, OpportunityProductRecord, OpportunityRecord};

pub const DEMO_OPPORTUNITY_ID: &str = "7d3c2b1a-0f9e-4d8c-b7a6-5e4f3d2c1b0a";
/// Seeded opportunity with no product lines and a low close probability.
pub const DEMO_EMPTY_OPPORTUNITY_ID: &str = "0a1b2c3d-4e5f-4a6b-8c7d-9e0f1a2b3c4d";

const DEMO_USER_ID: Uuid = Uuid::from_u128(0x5f1e_2d3c_4b5a_4968_8776_6554_4332_2110);
const DEMO_BUSINESS_UNIT_ID: Uuid = Uuid::from_u128(0x9a8b_7c6d_5e4f_4a3b_8c2d_1e0f_9a8b_7c6d);
const DEMO_ORGANIZATION_ID: Uuid = Uuid::from_u128(0x1234_5678_9abc_4def_8123_4567_89ab_cdef);

pub fn demo_identity() -> CrmIdentity {
    CrmIdentity {
        user_id: DEMO_USER_ID,
        business_unit_id: DEMO_BUSINESS_UNIT_ID,
        organization_id: DEMO_ORGANIZATION_ID,
    }
}

pub fn demo_opportunities() -> Vec<(OpportunityRecord, Vec<OpportunityProductRecord>)> {
    let mut seeded = Vec::new();

    if let Ok(id) = Uuid::parse_str(DEMO_OPPORTUNITY_ID) {
        let record = OpportunityRecord {
            id,
            name: Some("Fleet telematics rollout".to_string()),
            estimated_value: Some(Decimal::new(14_850_000, 2)),
            close_probability: Some(75),
            step_name: Some("3-Propose".to_string()),
            actual_close_date: None,
            estimated_close_date: NaiveDate::from_ymd_opt(2026, 12, 15),
            status_code: Some(1),
            status_label: Some("In Progress".to_string()),
            state_code: Some(0),
            description: Some("Telematics units and onboarding for 120 vehicles".to_string()),
            created_on: Utc.with_ymd_and_hms(2026, 6, 3, 8, 30, 0).single(),
            modified_on: Utc.with_ymd_and_hms(2026, 9, 28, 14, 10, 0).single(),
        };
        let lines = vec![
            product_line(0x01, "Telematics unit", Decimal::from(450), Decimal::from(120)),
            product_line(0x02, "Onboarding workshop", Decimal::from(1500), Decimal::from(2)),
        ];
        seeded.push((record, lines));
    }

    if let Ok(id) = Uuid::parse_str(DEMO_EMPTY_OPPORTUNITY_ID) {
        let record = OpportunityRecord {
            id,
            name: Some("Warehouse scanner pilot".to_string()),
            estimated_value: Some(Decimal::from(18_000)),
            close_probability: Some(20),
            status_code: Some(1),
            ..OpportunityRecord::default()
        };
        seeded.push((record, Vec::new()));
    }

    seeded
}

fn product_line(
    seq: u128,
    description: &str,
    price: Decimal,
    quantity: Decimal,
) -> OpportunityProductRecord {
    OpportunityProductRecord {
        id: Uuid::from_u128(0xc0ff_ee00_0000_4000_8000_0000_0000_0000 + seq),
        product_id: None,
        description: Some(description.to_string()),
        price_per_unit: Some(price),
        quantity: Some(quantity),
        base_amount: Some(price * quantity),
    }
}
