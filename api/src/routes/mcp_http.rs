use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

const MCP_PATH: &str = "/mcp";

pub fn router() -> Router<AppState> {
    Router::new().route(MCP_PATH, post(mcp_post).get(mcp_get))
}

/// No server-initiated stream is offered.
async fn mcp_get() -> Response {
    StatusCode::METHOD_NOT_ALLOWED.into_response()
}

/// Dropping this future (client gone) drops any in-flight Pixela call with it.
async fn mcp_post(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let incoming: Value = serde_json::from_slice(&body)?;

    let mut responses = pixela_mcp_runtime::handle_http_jsonrpc(&state.client, incoming).await;

    if responses.is_empty() {
        return Ok(StatusCode::ACCEPTED.into_response());
    }

    if responses.len() == 1 {
        return Ok((StatusCode::OK, Json(responses.remove(0))).into_response());
    }

    Ok((StatusCode::OK, Json(Value::Array(responses))).into_response())
}

#[cfg(test)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use pixela_core::{ClientConfig, PixelaClient};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::state::AppState;

    fn app() -> axum::Router {
        // Nothing listens here: tool calls fail fast with a transport error.
        let client = PixelaClient::new(&ClientConfig::with_base_url("http://127.0.0.1:9"))
            .expect("client should build");
        super::router().with_state(AppState::new(client))
    }

    async fn post(body: &str) -> (StatusCode, Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, value)
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let (status, body) = post("{not json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["code"], -32700);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn single_request_gets_single_object() {
        let (status, body) = post(r#"{"jsonrpc":"2.0","id":1,"method":"initialize"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"]["serverInfo"]["name"], "pixela-mcp");
    }

    #[tokio::test]
    async fn notification_only_is_accepted_without_body() {
        let (status, body) = post(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn batch_gets_array() {
        let (status, body) = post(
            r#"[{"jsonrpc":"2.0","id":1,"method":"ping"},{"jsonrpc":"2.0","id":2,"method":"nope"}]"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().expect("batch reply should be an array");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["result"], json!({}));
        assert_eq!(items[1]["error"]["code"], -32601);
    }

    #[tokio::test]
    async fn unreachable_remote_is_an_error_envelope() {
        let (status, body) = post(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"delete_user","arguments":{"username":"alice","token":"tok"}}}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["isError"], true);
        let text = body["result"]["content"][0]["text"].as_str().unwrap_or_default();
        assert!(text.starts_with("Error: delete user failed: transport error"), "got {text}");
    }

    #[tokio::test]
    async fn get_is_not_allowed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/mcp")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
