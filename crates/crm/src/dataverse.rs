//! Dataverse Web API accessor.
//!
//! Every accessor method opens its own [`DataverseSession`]: the caller's
//! bearer token is exchanged on-behalf-of the user for a Dataverse token, the
//! request runs with that token, and the session is dropped when the method
//! returns. Tokens are never logged.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use salesdesk_core::config::CrmConfig;
use salesdesk_core::identifier::OpportunityId;
use salesdesk_core::CallContext;

use crate::records::{CrmIdentity, OpportunityProductRecord, OpportunityRecord};
use crate::{AccessError, CrmAccessor};

const OBO_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const FORMATTED_VALUES_PREFERENCE: &str =
    "odata.include-annotations=\"OData.Community.Display.V1.FormattedValue\"";
const OPPORTUNITY_COLUMNS: &str = "opportunityid,name,estimatedvalue,closeprobability,stepname,\
actualclosedate,estimatedclosedate,statuscode,statecode,description,createdon,modifiedon";
const PRODUCT_COLUMNS: &str =
    "opportunityproductid,_productid_value,productdescription,priceperunit,quantity,baseamount";

/// Everything needed to reach one Dataverse environment.
#[derive(Clone, Debug)]
pub struct DataverseSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub base_url: String,
    pub scope: String,
    pub authority_host: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl DataverseSettings {
    pub fn from_config(config: &CrmConfig) -> Result<Self, AccessError> {
        let required = |key: &str, value: Option<&String>| {
            value
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .ok_or_else(|| missing_setting(key))
        };

        let base_url = required("dataverse_url", config.dataverse_url.as_ref())?;
        let scope = config
            .effective_scope()
            .ok_or_else(|| missing_setting("dataverse_scope"))?;

        Ok(Self {
            tenant_id: required("tenant_id", config.tenant_id.as_ref())?,
            client_id: required("client_id", config.client_id.as_ref())?,
            client_secret: config
                .client_secret
                .clone()
                .ok_or_else(|| missing_setting("client_secret"))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            scope,
            authority_host: config.authority_host.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/{}/oauth2/v2.0/token", self.authority_host, self.tenant_id)
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/data/{}/{}", self.base_url, self.api_version, path)
    }
}

fn missing_setting(key: &str) -> AccessError {
    AccessError::Configuration(format!("crm.{key} is not set"))
}

#[derive(Clone)]
pub struct DataverseClient {
    http: Client,
    settings: DataverseSettings,
}

impl DataverseClient {
    pub fn new(settings: DataverseSettings) -> Result<Self, AccessError> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|error| AccessError::Configuration(format!("http client: {error}")))?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &DataverseSettings {
        &self.settings
    }

    async fn open_session(
        &self,
        context: &CallContext,
    ) -> Result<DataverseSession<'_>, AccessError> {
        let assertion = context.caller().bearer_token().ok_or(AccessError::MissingCredential)?;

        debug!(
            event_name = "crm.session.exchange",
            correlation_id = %context.correlation_id(),
            tenant_id = %self.settings.tenant_id,
            client_id = %self.settings.client_id,
            scope = %self.settings.scope,
            "exchanging caller token on behalf of user"
        );

        let response = self
            .http
            .post(self.settings.token_url())
            .form(&[
                ("grant_type", OBO_GRANT_TYPE),
                ("requested_token_use", "on_behalf_of"),
                ("client_id", self.settings.client_id.as_str()),
                ("client_secret", self.settings.client_secret.expose_secret()),
                ("assertion", assertion.expose_secret()),
                ("scope", self.settings.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|error| AccessError::TokenExchange(format!("request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<TokenErrorWire>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "unreadable error body".to_string());
            warn!(
                event_name = "crm.session.rejected",
                correlation_id = %context.correlation_id(),
                status = status.as_u16(),
                error_code = %detail,
                "token exchange rejected"
            );
            return Err(AccessError::TokenExchange(format!("HTTP {}: {detail}", status.as_u16())));
        }

        let token: TokenWire = response
            .json()
            .await
            .map_err(|error| {
                AccessError::TokenExchange(format!("could not decode token response: {error}"))
            })?;
        if token.access_token.trim().is_empty() {
            return Err(AccessError::TokenExchange(
                "token endpoint returned an empty access token".to_string(),
            ));
        }

        Ok(DataverseSession {
            client: self,
            correlation_id: context.correlation_id(),
            access_token: SecretString::from(token.access_token),
        })
    }
}

/// A per-call authenticated handle. Dropping it discards the exchanged token.
struct DataverseSession<'a> {
    client: &'a DataverseClient,
    correlation_id: Uuid,
    access_token: SecretString,
}

impl DataverseSession<'_> {
    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        not_found: Option<(&'static str, &str)>,
    ) -> Result<T, AccessError> {
        let url = self.client.settings.api_url(path);
        debug!(
            event_name = "crm.request",
            correlation_id = %self.correlation_id,
            operation,
            "calling dataverse"
        );

        let response = self
            .client
            .http
            .get(url)
            .bearer_auth(self.access_token.expose_secret())
            .header("Accept", "application/json")
            .header("OData-MaxVersion", "4.0")
            .header("OData-Version", "4.0")
            .header("Prefer", FORMATTED_VALUES_PREFERENCE)
            .send()
            .await
            .map_err(|error| AccessError::Transport(error.to_string()))?;

        let status = response.status();
        match status {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(AccessError::Unauthorized { operation, status: status.as_u16() });
            }
            StatusCode::NOT_FOUND => {
                if let Some((entity, id)) = not_found {
                    return Err(AccessError::NotFound { entity, id: id.to_string() });
                }
                return Err(AccessError::Status { operation, status: status.as_u16() });
            }
            status => return Err(AccessError::Status { operation, status: status.as_u16() }),
        }

        response.json::<T>().await.map_err(|error| AccessError::Decode(error.to_string()))
    }
}

#[async_trait]
impl CrmAccessor for DataverseClient {
    fn backend(&self) -> &'static str {
        "dataverse"
    }

    async fn identity_lookup(&self, context: &CallContext) -> Result<CrmIdentity, AccessError> {
        let session = self.open_session(context).await?;
        let who: WhoAmIWire = session.get_json("WhoAmI", "WhoAmI", None).await?;

        info!(
            event_name = "crm.identity.resolved",
            correlation_id = %context.correlation_id(),
            crm_user_id = %who.user_id,
            business_unit_id = %who.business_unit_id,
            organization_id = %who.organization_id,
            "crm user identified"
        );
        Ok(CrmIdentity {
            user_id: who.user_id,
            business_unit_id: who.business_unit_id,
            organization_id: who.organization_id,
        })
    }

    async fn fetch_opportunity(
        &self,
        context: &CallContext,
        opportunity_id: &OpportunityId,
    ) -> Result<OpportunityRecord, AccessError> {
        let guid = require_guid(opportunity_id)?;
        let session = self.open_session(context).await?;
        let path = format!("opportunities({guid})?$select={OPPORTUNITY_COLUMNS}");
        let wire: OpportunityWire = session
            .get_json("opportunity lookup", &path, Some(("opportunity", opportunity_id.as_str())))
            .await?;

        info!(
            event_name = "crm.opportunity.fetched",
            correlation_id = %context.correlation_id(),
            opportunity_id = %guid,
            "opportunity loaded"
        );
        Ok(wire.into_record())
    }

    async fn fetch_opportunity_products(
        &self,
        context: &CallContext,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<OpportunityProductRecord>, AccessError> {
        let guid = require_guid(opportunity_id)?;
        let session = self.open_session(context).await?;
        let path = format!(
            "opportunityproducts?$select={PRODUCT_COLUMNS}&$filter=_opportunityid_value%20eq%20{guid}"
        );
        let wire: CollectionWire<ProductWire> =
            session.get_json("product query", &path, None).await?;

        let products: Vec<OpportunityProductRecord> =
            wire.value.into_iter().map(ProductWire::into_record).collect();
        info!(
            event_name = "crm.products.fetched",
            correlation_id = %context.correlation_id(),
            opportunity_id = %guid,
            product_count = products.len(),
            "opportunity products loaded"
        );
        Ok(products)
    }
}

fn require_guid(opportunity_id: &OpportunityId) -> Result<Uuid, AccessError> {
    opportunity_id
        .as_guid()
        .ok_or_else(|| AccessError::InvalidIdentifier(opportunity_id.as_str().to_string()))
}

/// Date-only columns come back as `YYYY-MM-DD`; older orgs send a full timestamp.
fn parse_date(raw: Option<String>) -> Option<NaiveDate> {
    let raw = raw?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[derive(Deserialize)]
struct TokenWire {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorWire {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WhoAmIWire {
    user_id: Uuid,
    business_unit_id: Uuid,
    organization_id: Uuid,
}

#[derive(Deserialize)]
struct CollectionWire<T> {
    value: Vec<T>,
}

#[derive(Deserialize)]
struct OpportunityWire {
    opportunityid: Uuid,
    name: Option<String>,
    estimatedvalue: Option<Decimal>,
    closeprobability: Option<i32>,
    stepname: Option<String>,
    actualclosedate: Option<String>,
    estimatedclosedate: Option<String>,
    statuscode: Option<i32>,
    #[serde(rename = "statuscode@OData.Community.Display.V1.FormattedValue")]
    statuscode_label: Option<String>,
    statecode: Option<i32>,
    description: Option<String>,
    createdon: Option<DateTime<Utc>>,
    modifiedon: Option<DateTime<Utc>>,
}

impl OpportunityWire {
    fn into_record(self) -> OpportunityRecord {
        OpportunityRecord {
            id: self.opportunityid,
            name: self.name,
            estimated_value: self.estimatedvalue,
            close_probability: self.closeprobability,
            step_name: self.stepname,
            actual_close_date: parse_date(self.actualclosedate),
            estimated_close_date: parse_date(self.estimatedclosedate),
            status_code: self.statuscode,
            status_label: self.statuscode_label,
            state_code: self.statecode,
            description: self.description,
            created_on: self.createdon,
            modified_on: self.modifiedon,
        }
    }
}

#[derive(Deserialize)]
struct ProductWire {
    opportunityproductid: Uuid,
    #[serde(rename = "_productid_value")]
    productid: Option<Uuid>,
    productdescription: Option<String>,
    priceperunit: Option<Decimal>,
    quantity: Option<Decimal>,
    baseamount: Option<Decimal>,
}

impl ProductWire {
    fn into_record(self) -> OpportunityProductRecord {
        OpportunityProductRecord {
            id: self.opportunityproductid,
            product_id: self.productid,
            description: self.productdescription,
            price_per_unit: self.priceperunit,
            quantity: self.quantity,
            base_amount: self.baseamount,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use salesdesk_core::config::{CrmBackend, CrmConfig};
    use salesdesk_core::identifier::OpportunityId;
    use salesdesk_core::{CallContext, CallerIdentity};
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::{parse_date, DataverseClient, DataverseSettings};
    use crate::{AccessError, CrmAccessor};

    const OPPORTUNITY: &str = "b1d4e0a2-5c3f-4e8a-9d7b-2f6c1a0e9b84";

    #[derive(Default)]
    struct StubCounters {
        token_requests: AtomicUsize,
    }

    async fn token(State(counters): State<Arc<StubCounters>>, body: String) -> impl IntoResponse {
        counters.token_requests.fetch_add(1, Ordering::SeqCst);
        if body.contains("assertion=rejected") {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "invalid_grant" })));
        }
        if !body.contains("requested_token_use=on_behalf_of") {
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": "unsupported_grant_type" })));
        }
        (StatusCode::OK, Json(json!({ "access_token": "dataverse-token", "token_type": "Bearer" })))
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer dataverse-token")
    }

    async fn who_am_i(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, Json(json!({})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "UserId": "11111111-1111-1111-1111-111111111111",
                "BusinessUnitId": "22222222-2222-2222-2222-222222222222",
                "OrganizationId": "33333333-3333-3333-3333-333333333333"
            })),
        )
    }

    async fn opportunity(Path(segment): Path<String>) -> impl IntoResponse {
        if !segment.contains(OPPORTUNITY) {
            return (StatusCode::NOT_FOUND, Json(json!({ "error": { "code": "0x80040217" } })));
        }
        (
            StatusCode::OK,
            Json(json!({
                "opportunityid": OPPORTUNITY,
                "name": "Fleet renewal",
                "estimatedvalue": 125000.5,
                "closeprobability": 72,
                "stepname": "3-Propose",
                "estimatedclosedate": "2026-03-31",
                "statuscode": 1,
                "statuscode@OData.Community.Display.V1.FormattedValue": "In Progress",
                "createdon": "2025-11-02T09:05:00Z"
            })),
        )
    }

    async fn products() -> impl IntoResponse {
        Json(json!({
            "value": [
                {
                    "opportunityproductid": "44444444-4444-4444-4444-444444444444",
                    "_productid_value": null,
                    "productdescription": "Onboarding workshop",
                    "priceperunit": 1500,
                    "quantity": 2,
                    "baseamount": 3000
                }
            ]
        }))
    }

    async fn spawn_stub() -> (SocketAddr, Arc<StubCounters>) {
        let counters = Arc::new(StubCounters::default());
        let app = Router::new()
            .route("/tenant-1/oauth2/v2.0/token", post(token))
            .route("/api/data/v9.2/WhoAmI", get(who_am_i))
            .route("/api/data/v9.2/opportunityproducts", get(products))
            .route("/api/data/v9.2/{segment}", get(opportunity))
            .with_state(counters.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub listener");
        let address = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        (address, counters)
    }

    fn client(address: SocketAddr) -> DataverseClient {
        let base = format!("http://{address}");
        let config = CrmConfig {
            backend: CrmBackend::Dataverse,
            tenant_id: Some("tenant-1".to_string()),
            client_id: Some("client-1".to_string()),
            client_secret: Some("secret-1".to_string().into()),
            dataverse_url: Some(base.clone()),
            dataverse_scope: None,
            authority_host: base,
            api_version: "v9.2".to_string(),
            timeout_secs: 5,
        };
        let settings = DataverseSettings::from_config(&config).expect("settings should build");
        DataverseClient::new(settings).expect("client should build")
    }

    fn context_with_token(token: &str) -> CallContext {
        CallContext::new(
            "getOpportunityInsights",
            CallerIdentity::anonymous().with_bearer_token(token),
        )
    }

    #[test]
    fn settings_derive_scope_and_urls() {
        let config = CrmConfig {
            backend: CrmBackend::Dataverse,
            tenant_id: Some("tenant-1".to_string()),
            client_id: Some("client-1".to_string()),
            client_secret: Some("secret".to_string().into()),
            dataverse_url: Some("https://org.crm4.dynamics.com/".to_string()),
            dataverse_scope: None,
            authority_host: "https://login.microsoftonline.com".to_string(),
            api_version: "v9.2".to_string(),
            timeout_secs: 30,
        };

        let settings = DataverseSettings::from_config(&config).expect("settings should build");

        assert_eq!(settings.scope, "https://org.crm4.dynamics.com/.default");
        assert_eq!(
            settings.token_url(),
            "https://login.microsoftonline.com/tenant-1/oauth2/v2.0/token"
        );
        assert_eq!(
            settings.api_url("WhoAmI"),
            "https://org.crm4.dynamics.com/api/data/v9.2/WhoAmI"
        );
        assert_eq!(settings.timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_settings_are_configuration_errors() {
        let config = CrmConfig {
            backend: CrmBackend::Dataverse,
            tenant_id: None,
            client_id: None,
            client_secret: None,
            dataverse_url: Some("https://org.crm.dynamics.com".to_string()),
            dataverse_scope: None,
            authority_host: "https://login.microsoftonline.com".to_string(),
            api_version: "v9.2".to_string(),
            timeout_secs: 30,
        };

        let error = DataverseSettings::from_config(&config).err();

        assert_eq!(error, Some(AccessError::Configuration("crm.tenant_id is not set".to_string())));
    }

    #[test]
    fn dates_accept_date_only_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 31);

        assert_eq!(parse_date(Some("2026-03-31".to_string())), expected);
        assert_eq!(parse_date(Some("2026-03-31T00:00:00Z".to_string())), expected);
        assert_eq!(parse_date(Some("garbage".to_string())), None);
        assert_eq!(parse_date(None), None);
    }

    #[tokio::test]
    async fn missing_bearer_token_fails_before_any_request() {
        let (address, counters) = spawn_stub().await;
        let context = CallContext::new("queryProducts", CallerIdentity::anonymous());

        let error = client(address).identity_lookup(&context).await.err();

        assert_eq!(error, Some(AccessError::MissingCredential));
        assert_eq!(counters.token_requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identity_lookup_exchanges_then_calls_who_am_i() {
        let (address, counters) = spawn_stub().await;

        let identity = client(address)
            .identity_lookup(&context_with_token("user-token"))
            .await
            .expect("identity lookup should succeed");

        assert_eq!(identity.user_id.to_string(), "11111111-1111-1111-1111-111111111111");
        assert_eq!(identity.business_unit_id.to_string(), "22222222-2222-2222-2222-222222222222");
        assert_eq!(counters.token_requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_exchange_reports_the_error_code() {
        let (address, _) = spawn_stub().await;

        let error = client(address).identity_lookup(&context_with_token("rejected")).await.err();

        assert_eq!(error, Some(AccessError::TokenExchange("HTTP 400: invalid_grant".to_string())));
    }

    #[tokio::test]
    async fn each_call_opens_its_own_session() {
        let (address, counters) = spawn_stub().await;
        let client = client(address);
        let context = context_with_token("user-token");
        let id = OpportunityId::parse(OPPORTUNITY).expect("id should parse");

        let record = client
            .fetch_opportunity(&context, &id)
            .await
            .expect("opportunity should load");
        let products = client
            .fetch_opportunity_products(&context, &id)
            .await
            .expect("products should load");

        assert_eq!(record.name.as_deref(), Some("Fleet renewal"));
        assert_eq!(record.status_text().as_deref(), Some("In Progress"));
        assert_eq!(record.estimated_close_date, NaiveDate::from_ymd_opt(2026, 3, 31));
        assert_eq!(record.estimated_value, Some(Decimal::new(1_250_005, 1)));
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].base_amount, Some(Decimal::from(3000)));
        assert_eq!(counters.token_requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_opportunity_is_not_found() {
        let (address, _) = spawn_stub().await;
        let id = OpportunityId::parse("00000000-0000-0000-0000-0000000000aa")
            .expect("id should parse");
        let context = context_with_token("user-token");

        let error = client(address).fetch_opportunity(&context, &id).await.err();

        assert_eq!(
            error,
            Some(AccessError::NotFound {
                entity: "opportunity",
                id: "00000000-0000-0000-0000-0000000000aa".to_string()
            })
        );
    }

    #[tokio::test]
    async fn non_guid_ids_fail_inside_the_accessor() {
        let (address, counters) = spawn_stub().await;
        let id = OpportunityId::parse("OPP-42").expect("free-form id should parse");

        let context = context_with_token("user-token");

        let error = client(address)
            .fetch_opportunity_products(&context, &id)
            .await
            .err();

        assert_eq!(error, Some(AccessError::InvalidIdentifier("OPP-42".to_string())));
        assert_eq!(counters.token_requests.load(Ordering::SeqCst), 0);
    }
}
