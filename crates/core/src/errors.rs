use thiserror::Error;

/// Rejected tool input. The rendered text is the user-facing validation message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid parameter: {field} must not be empty.")]
    Empty { field: &'static str },
    #[error("Invalid parameter: {field} must be a GUID.")]
    Malformed { field: &'static str },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::Malformed { field } => field,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{0}")]
    ExternalAccess(String),
    #[error("{0}")]
    Serialization(String),
}

impl ToolError {
    pub fn external(message: impl Into<String>) -> Self {
        Self::ExternalAccess(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ExternalAccess(_) => "external_access",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value.to_string())
    }
}
