use pixela_core::PixelaError;
use pixela_core::types::PixelaResponse;
use thiserror::Error;

/// Why a tool call produced an error envelope instead of a result.
///
/// None of these are JSON-RPC errors: the call itself was understood, it just
/// did not succeed.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("missing required parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: String, reason: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Pixela answered `isSuccess: false`.
    #[error("{action} failed: {message}")]
    Rejected {
        action: &'static str,
        message: String,
    },

    /// A decoded result could not be re-encoded for the structured item.
    #[error("failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{action} failed: {source}")]
    Client {
        action: &'static str,
        #[source]
        source: PixelaError,
    },
}

impl ToolError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::InvalidParameter {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Adapter for `map_err` on client calls.
    pub fn client(action: &'static str) -> impl FnOnce(PixelaError) -> ToolError {
        move |source| ToolError::Client { action, source }
    }

    /// Short label for logs.
    pub fn code(&self) -> &'static str {
        match self {
            ToolError::MissingParameter(_) => "missing_parameter",
            ToolError::InvalidParameter { .. } => "invalid_parameter",
            ToolError::UnknownTool(_) => "unknown_tool",
            ToolError::Rejected { .. } => "rejected",
            ToolError::Encode(_) => "encode_error",
            ToolError::Client { source, .. } => source.code(),
        }
    }
}

/// Turns a body-level `isSuccess: false` into `ToolError::Rejected`.
pub fn accepted(
    action: &'static str,
    response: PixelaResponse,
) -> Result<PixelaResponse, ToolError> {
    if response.is_success {
        Ok(response)
    } else {
        Err(ToolError::Rejected {
            action,
            message: response.message,
        })
    }
}
