use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures of the HTTP transport itself, before the MCP runtime sees a message.
#[derive(Debug, Error)]
pub enum AppError {
    /// Body was not JSON. Answered as a JSON-RPC parse error with a null id.
    #[error("request body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();
        tracing::warn!(request_id = %request_id, error = %self, "rejected mcp request");

        match self {
            AppError::Parse(_) => (
                StatusCode::OK,
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": {
                        "code": -32700,
                        "message": "Parse error",
                        "data": { "request_id": request_id }
                    }
                })),
            )
                .into_response(),
        }
    }
}
