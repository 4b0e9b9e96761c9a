//! Uniform tool-invocation envelope.
//!
//! Every tool runs the same sequence: validate the identifier, run the tool
//! body (external fetches and derivations), then wrap the outcome in a
//! [`ToolResponse`]. Validation failures short-circuit before the body runs.
//! Any error raised by the body is logged and turned into a failure whose
//! message is `"<failure prefix>: <underlying error>"`. Nothing escapes the
//! envelope as an `Err`.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::context::CallContext;
use crate::errors::{ToolError, ValidationError};

/// Static description of a tool as seen by the envelope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    /// Prepended to the underlying error text on catch-all failures.
    pub failure_prefix: &'static str,
    /// Extra boolean fields written into every failure body of this tool.
    pub failure_flags: &'static [(&'static str, bool)],
}

impl ToolDescriptor {
    pub const fn new(name: &'static str, failure_prefix: &'static str) -> Self {
        Self { name, failure_prefix, failure_flags: &[] }
    }

    pub const fn with_failure_flags(mut self, flags: &'static [(&'static str, bool)]) -> Self {
        self.failure_flags = flags;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolFailure {
    pub error: String,
    pub details: Map<String, Value>,
    pub timestamp: DateTime<Utc>,
}

impl ToolFailure {
    pub fn new(tool: &ToolDescriptor, error: impl Into<String>) -> Self {
        let details = tool
            .failure_flags
            .iter()
            .map(|(key, value)| ((*key).to_string(), Value::Bool(*value)))
            .collect();
        Self { error: error.into(), details, timestamp: Utc::now() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ToolResponse<T> {
    Success { payload: T, timestamp: DateTime<Utc> },
    Failure(ToolFailure),
}

impl<T> ToolResponse<T> {
    pub fn success(payload: T) -> Self {
        Self::Success { payload, timestamp: Utc::now() }
    }

    pub fn failure(tool: &ToolDescriptor, error: impl Into<String>) -> Self {
        Self::Failure(ToolFailure::new(tool, error))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(&failure.error),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Success { timestamp, .. } => *timestamp,
            Self::Failure(failure) => failure.timestamp,
        }
    }
}

impl<T: Serialize> ToolResponse<T> {
    /// Renders the indented JSON body. A payload that cannot be serialized is
    /// reported through the same failure shape as any other tool error.
    pub fn render(&self, tool: &ToolDescriptor) -> String {
        match serde_json::to_string_pretty(self) {
            Ok(body) => body,
            Err(source) => {
                let error = ToolError::from(source);
                error!(
                    event_name = "tool.render.failed",
                    tool = tool.name,
                    error = %error,
                    "tool response could not be serialized"
                );
                render_failure(&ToolFailure::new(
                    tool,
                    format!("{}: {error}", tool.failure_prefix),
                ))
            }
        }
    }
}

// Infallible: the failure wire holds only strings, JSON values and a timestamp.
fn render_failure(failure: &ToolFailure) -> String {
    serde_json::to_string_pretty(&FailureWire::from(failure)).unwrap_or_default()
}

#[derive(Serialize)]
struct SuccessWire<'a, T> {
    success: bool,
    #[serde(flatten)]
    payload: &'a T,
    timestamp: &'a DateTime<Utc>,
}

#[derive(Serialize)]
struct FailureWire<'a> {
    success: bool,
    error: &'a str,
    #[serde(flatten)]
    details: &'a Map<String, Value>,
    timestamp: &'a DateTime<Utc>,
}

impl<'a> From<&'a ToolFailure> for FailureWire<'a> {
    fn from(failure: &'a ToolFailure) -> Self {
        Self {
            success: false,
            error: &failure.error,
            details: &failure.details,
            timestamp: &failure.timestamp,
        }
    }
}

impl<T: Serialize> Serialize for ToolResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success { payload, timestamp } => {
                SuccessWire { success: true, payload, timestamp }.serialize(serializer)
            }
            Self::Failure(failure) => FailureWire::from(failure).serialize(serializer),
        }
    }
}

/// Runs one tool call through the envelope.
///
/// `input` is the already-parsed request; `body` performs the fetch and
/// derive steps and is only polled when `input` is `Ok`.
pub async fn invoke<I, T, F, Fut>(
    context: &CallContext,
    tool: &ToolDescriptor,
    identifier: &str,
    input: Result<I, ValidationError>,
    body: F,
) -> ToolResponse<T>
where
    F: FnOnce(I) -> Fut,
    Fut: Future<Output = Result<T, ToolError>>,
{
    let caller = context.caller();
    info!(
        event_name = "tool.invoke.start",
        tool = tool.name,
        correlation_id = %context.correlation_id(),
        identifier,
        caller = caller.display_name(),
        caller_id = caller.display_id(),
        "tool invoked"
    );

    let input = match input {
        Ok(input) => input,
        Err(validation) => {
            warn!(
                event_name = "tool.invoke.rejected",
                tool = tool.name,
                correlation_id = %context.correlation_id(),
                field = validation.field(),
                "tool input failed validation"
            );
            return ToolResponse::failure(tool, validation.to_string());
        }
    };

    match body(input).await {
        Ok(payload) => {
            info!(
                event_name = "tool.invoke.completed",
                tool = tool.name,
                correlation_id = %context.correlation_id(),
                identifier,
                caller = caller.display_name(),
                "tool completed"
            );
            ToolResponse::success(payload)
        }
        Err(failure) => {
            error!(
                event_name = "tool.invoke.failed",
                tool = tool.name,
                correlation_id = %context.correlation_id(),
                identifier,
                error_kind = failure.kind(),
                error = %failure,
                "tool failed"
            );
            ToolResponse::failure(tool, format!("{}: {failure}", tool.failure_prefix))
        }
    }
}
