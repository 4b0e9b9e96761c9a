//! Caller identification for MCP requests.
//!
//! The HTTP host forwards the request head to the tool handlers. The
//! `Authorization: Bearer` token is kept for the CRM on-behalf-of exchange and
//! its `name` / `oid` claims are read for logging. Claims are decoded without
//! signature validation; the token is only ever trusted by the identity
//! provider that receives it in the exchange.

use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::Deserialize;
use tracing::debug;

use salesdesk_core::CallerIdentity;

const BEARER_SCHEME: &str = "bearer";

/// Claims of interest in an access token payload.
#[derive(Debug, Default, Deserialize)]
struct TokenClaims {
    name: Option<String>,
    preferred_username: Option<String>,
    oid: Option<String>,
    sub: Option<String>,
}

/// Bearer token from an `Authorization` header, if it carries one.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the caller from request headers. Missing or unreadable
/// credentials yield an anonymous caller.
pub fn caller_from_headers(headers: &HeaderMap) -> CallerIdentity {
    let Some(token) = bearer_token(headers) else {
        return CallerIdentity::anonymous();
    };

    let claims = decode_claims(token).unwrap_or_default();
    let name = claims.name.or(claims.preferred_username);
    let caller = CallerIdentity::new(name, claims.oid.or(claims.sub)).with_bearer_token(token);
    debug!(
        event_name = "mcp.auth.caller_resolved",
        caller = caller.display_name(),
        caller_id = caller.display_id(),
        "bearer caller resolved"
    );
    caller
}

fn decode_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use axum::http::{header, HeaderMap, HeaderValue};
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use secrecy::ExposeSecret;

    use super::{bearer_token, caller_from_headers};

    fn token_with(claims: &str) -> String {
        format!("eyJhbGciOiJub25lIn0.{}.sig", URL_SAFE_NO_PAD.encode(claims))
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn missing_header_is_anonymous() {
        let caller = caller_from_headers(&HeaderMap::new());

        assert_eq!(caller.display_name(), "Anonymous");
        assert!(caller.bearer_token().is_none());
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        assert_eq!(bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&headers("bearer abc.def.ghi")), Some("abc.def.ghi"));
    }

    #[test]
    fn claims_name_the_caller() {
        let token =
            token_with(r#"{"name":"Dana Reyes","oid":"9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d"}"#);

        let caller = caller_from_headers(&headers(&format!("Bearer {token}")));

        assert_eq!(caller.display_name(), "Dana Reyes");
        assert_eq!(caller.display_id(), "9b1deb4d-3b7d-4bad-9bdd-2b0d7b3dcb6d");
        let forwarded = caller.bearer_token().map(|secret| secret.expose_secret().to_string());
        assert_eq!(forwarded, Some(token));
    }

    #[test]
    fn opaque_tokens_are_still_forwarded() {
        let caller = caller_from_headers(&headers("Bearer not-a-jwt"));

        assert_eq!(caller.display_name(), "Anonymous");
        assert_eq!(caller.display_id(), "Unknown");
        assert!(caller.bearer_token().is_some());
    }

    #[test]
    fn fallback_claims_are_used() {
        let token = token_with(r#"{"preferred_username":"dana@contoso.com","sub":"abc123"}"#);

        let caller = caller_from_headers(&headers(&format!("Bearer {token}")));

        assert_eq!(caller.display_name(), "dana@contoso.com");
        assert_eq!(caller.display_id(), "abc123");
    }
}
