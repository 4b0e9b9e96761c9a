use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use salesdesk_core::identifier::OpportunityId;
use salesdesk_core::CallContext;

use crate::fixtures;
use crate::records::{CrmIdentity, OpportunityProductRecord, OpportunityRecord};
use crate::{AccessError, CrmAccessor};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessorMethod {
    IdentityLookup,
    FetchOpportunity,
    FetchOpportunityProducts,
}

impl AccessorMethod {
    pub const ALL: [AccessorMethod; 3] =
        [Self::IdentityLookup, Self::FetchOpportunity, Self::FetchOpportunityProducts];

    fn index(self) -> usize {
        match self {
            Self::IdentityLookup => 0,
            Self::FetchOpportunity => 1,
            Self::FetchOpportunityProducts => 2,
        }
    }
}

/// CRM accessor over seeded records, with call counters and an optional
/// injected failure returned by every method.
pub struct InMemoryCrm {
    identity: CrmIdentity,
    opportunities: RwLock<HashMap<String, OpportunityRecord>>,
    products: RwLock<HashMap<String, Vec<OpportunityProductRecord>>>,
    failure: RwLock<Option<AccessError>>,
    calls: [AtomicUsize; 3],
}

impl InMemoryCrm {
    pub fn new(identity: CrmIdentity) -> Self {
        Self {
            identity,
            opportunities: RwLock::new(HashMap::new()),
            products: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            calls: Default::default(),
        }
    }

    /// Accessor preloaded with the demo dataset in [`fixtures`].
    pub fn seeded() -> Self {
        let mut opportunities = HashMap::new();
        let mut products = HashMap::new();
        for (record, lines) in fixtures::demo_opportunities() {
            let key = key_for(&record.id.to_string());
            products.insert(key.clone(), lines);
            opportunities.insert(key, record);
        }

        Self {
            opportunities: RwLock::new(opportunities),
            products: RwLock::new(products),
            ..Self::new(fixtures::demo_identity())
        }
    }

    pub async fn insert_opportunity(
        &self,
        opportunity_id: &str,
        record: OpportunityRecord,
        lines: Vec<OpportunityProductRecord>,
    ) {
        let key = key_for(opportunity_id);
        self.products.write().await.insert(key.clone(), lines);
        self.opportunities.write().await.insert(key, record);
    }

    pub async fn fail_with(&self, error: AccessError) {
        *self.failure.write().await = Some(error);
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    pub fn calls(&self, method: AccessorMethod) -> usize {
        self.calls[method.index()].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        AccessorMethod::ALL.iter().map(|method| self.calls(*method)).sum()
    }

    async fn enter(
        &self,
        method: AccessorMethod,
        context: &CallContext,
    ) -> Result<(), AccessError> {
        self.calls[method.index()].fetch_add(1, Ordering::SeqCst);
        debug!(
            event_name = "crm.memory.call",
            correlation_id = %context.correlation_id(),
            method = ?method,
            "in-memory crm call"
        );
        match self.failure.read().await.as_ref() {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn key_for(opportunity_id: &str) -> String {
    opportunity_id.trim().to_ascii_lowercase()
}

#[async_trait]
impl CrmAccessor for InMemoryCrm {
    fn backend(&self) -> &'static str {
        "mock"
    }

    async fn identity_lookup(&self, context: &CallContext) -> Result<CrmIdentity, AccessError> {
        self.enter(AccessorMethod::IdentityLookup, context).await?;
        Ok(self.identity)
    }

    async fn fetch_opportunity(
        &self,
        context: &CallContext,
        opportunity_id: &OpportunityId,
    ) -> Result<OpportunityRecord, AccessError> {
        self.enter(AccessorMethod::FetchOpportunity, context).await?;
        let opportunities = self.opportunities.read().await;
        opportunities
            .get(&key_for(opportunity_id.as_str()))
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                entity: "opportunity",
                id: opportunity_id.as_str().to_string(),
            })
    }

    async fn fetch_opportunity_products(
        &self,
        context: &CallContext,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunityProductRecord>, AccessError> {
        self.enter(AccessorMethod::FetchOpportunityProducts, context).await?;
        let products = self.products.read().await;
        Ok(products.get(&key_for(opportunity_id.as_str())).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use salesdesk_core::identifier::OpportunityId;
    use salesdesk_core::{CallContext, CallerIdentity};

    use super::{AccessorMethod, InMemoryCrm};
    use crate::fixtures::{demo_identity, DEMO_OPPORTUNITY_ID};
    use crate::records::OpportunityRecord;
    use crate::{AccessError, CrmAccessor};

    fn context() -> CallContext {
        CallContext::new("getOpportunityInsights", CallerIdentity::anonymous())
    }

    #[tokio::test]
    async fn seeded_accessor_serves_demo_records() {
        let crm = InMemoryCrm::seeded();
        let id = OpportunityId::parse(&DEMO_OPPORTUNITY_ID.to_uppercase())
            .expect("id should parse");

        let record = crm.fetch_opportunity(&context(), &id).await.expect("demo opportunity exists");
        let products = crm
            .fetch_opportunity_products(&context(), &id)
            .await
            .expect("products load");

        assert_eq!(record.id.to_string(), DEMO_OPPORTUNITY_ID);
        assert!(!products.is_empty());
        assert_eq!(crm.calls(AccessorMethod::FetchOpportunity), 1);
        assert_eq!(crm.calls(AccessorMethod::FetchOpportunityProducts), 1);
        assert_eq!(crm.total_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_opportunity_is_not_found_but_products_are_empty() {
        let crm = InMemoryCrm::new(demo_identity());
        let id = OpportunityId::parse("missing").expect("id should parse");

        let error = crm.fetch_opportunity(&context(), &id).await.err();
        let products = crm.fetch_opportunity_products(&context(), &id).await.expect("empty list");

        let missing = AccessError::NotFound {
            entity: "opportunity",
            id: "missing".to_string(),
        };
        assert_eq!(error, Some(missing));
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn injected_failure_is_returned_and_counted() {
        let crm = InMemoryCrm::seeded();
        crm.fail_with(AccessError::Transport("connection reset".to_string())).await;

        let error = crm.identity_lookup(&context()).await.err();

        assert_eq!(error, Some(AccessError::Transport("connection reset".to_string())));
        assert_eq!(crm.calls(AccessorMethod::IdentityLookup), 1);

        crm.clear_failure().await;
        assert_eq!(crm.identity_lookup(&context()).await.ok(), Some(demo_identity()));
    }

    #[tokio::test]
    async fn inserted_records_are_visible() {
        let crm = InMemoryCrm::new(demo_identity());
        crm.insert_opportunity("OPP-7", OpportunityRecord::default(), Vec::new()).await;
        let id = OpportunityId::parse("opp-7").expect("id should parse");

        assert!(crm.fetch_opportunity(&context(), &id).await.is_ok());
    }
}
