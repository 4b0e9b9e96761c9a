use secrecy::SecretString;
use uuid::Uuid;

const ANONYMOUS: &str = "Anonymous";
const UNKNOWN: &str = "Unknown";

/// Who is calling a tool, as far as the transport could tell.
///
/// `name` and `user_id` are informational and only ever logged. The bearer
/// token is forwarded to the CRM credential exchange and never rendered.
#[derive(Clone, Debug, Default)]
pub struct CallerIdentity {
    pub name: Option<String>,
    pub user_id: Option<String>,
    bearer_token: Option<SecretString>,
}

impl CallerIdentity {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(name: Option<String>, user_id: Option<String>) -> Self {
        Self { name, user_id, bearer_token: None }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn bearer_token(&self) -> Option<&SecretString> {
        self.bearer_token.as_ref()
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ANONYMOUS)
    }

    pub fn display_id(&self) -> &str {
        self.user_id.as_deref().unwrap_or(UNKNOWN)
    }
}

/// Per-call context handed to the envelope and to the CRM accessor.
#[derive(Clone, Debug)]
pub struct CallContext {
    tool: &'static str,
    correlation_id: Uuid,
    caller: CallerIdentity,
}

impl CallContext {
    pub fn new(tool: &'static str, caller: CallerIdentity) -> Self {
        Self { tool, correlation_id: Uuid::new_v4(), caller }
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn caller(&self) -> &CallerIdentity {
        &self.caller
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::{CallContext, CallerIdentity};

    #[test]
    fn anonymous_caller_uses_placeholders() {
        let caller = CallerIdentity::anonymous();

        assert_eq!(caller.display_name(), "Anonymous");
        assert_eq!(caller.display_id(), "Unknown");
        assert!(caller.bearer_token().is_none());
    }

    #[test]
    fn bearer_token_is_kept_out_of_debug_output() {
        let caller = CallerIdentity::new(Some("Ada".to_string()), None)
            .with_bearer_token("eyJ.secret.token");

        let token = caller.bearer_token().map(|token| token.expose_secret().to_string());
        assert_eq!(token.as_deref(), Some("eyJ.secret.token"));
        assert!(!format!("{caller:?}").contains("eyJ.secret.token"));
    }

    #[test]
    fn each_context_gets_its_own_correlation_id() {
        let first = CallContext::new("queryProducts", CallerIdentity::anonymous());
        let second = CallContext::new("queryProducts", CallerIdentity::anonymous());

        assert_ne!(first.correlation_id(), second.correlation_id());
        assert_eq!(first.tool(), "queryProducts");
    }
}
