use std::time::Instant;

use clap::Subcommand;
use pixela_core::{ClientConfig, PixelaClient};
use serde_json::{Map, Value, json};
use tokio::io::{self, AsyncBufRead, AsyncWrite, BufReader};

mod args;
mod envelope;
mod error;
mod stdio;
mod tools;

#[cfg(test)]
mod test_support;

pub use envelope::ToolOutput;
pub use error::ToolError;
pub use tools::{ToolDefinition, tool_catalog};

use envelope::{error_envelope, success_envelope};
use stdio::{read_frame, write_frame};

pub const MCP_PROTOCOL_VERSION: &str = "2024-11-05";
pub const MCP_SERVER_NAME: &str = "pixela-mcp";

#[derive(Subcommand, Clone, Debug)]
pub enum McpCommands {
    /// Run the Pixela MCP server over stdio
    Serve,
    /// Print the tool catalog as JSON and exit
    Tools,
}

pub async fn run(config: &ClientConfig, command: McpCommands) -> i32 {
    match command {
        McpCommands::Serve => {
            let client = match PixelaClient::new(config) {
                Ok(client) => client,
                Err(err) => {
                    tracing::error!(error = %err, "failed to build Pixela client");
                    return 1;
                }
            };
            let server = McpServer::new(client);
            let stdin = BufReader::new(io::stdin());
            let mut stdout = io::stdout();
            match server.serve(stdin, &mut stdout).await {
                Ok(()) => 0,
                Err(err) => {
                    tracing::error!(error = %err, "mcp server stopped");
                    1
                }
            }
        }
        McpCommands::Tools => {
            println!("{}", to_pretty_json(&tools_list_payload()));
            0
        }
    }
}

/// Entry point for the HTTP transport: one body in, zero or more replies out.
pub async fn handle_http_jsonrpc(client: &PixelaClient, incoming: Value) -> Vec<Value> {
    McpServer::new(client.clone())
        .handle_incoming_message(incoming)
        .await
}

struct McpServer {
    client: PixelaClient,
}

impl McpServer {
    fn new(client: PixelaClient) -> Self {
        Self { client }
    }

    /// One request at a time until EOF. Unparseable messages are logged and
    /// skipped; only I/O failures end the loop early.
    async fn serve<R, W>(&self, mut reader: R, writer: &mut W) -> Result<(), String>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            server = MCP_SERVER_NAME,
            version = env!("CARGO_PKG_VERSION"),
            base_url = self.client.base_url(),
            "mcp server listening on stdio"
        );

        loop {
            let frame = read_frame(&mut reader)
                .await
                .map_err(|e| format!("Failed to read MCP message: {e}"))?;
            let Some(frame) = frame else {
                break;
            };

            let incoming: Value = match serde_json::from_slice(&frame.body) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unparseable message");
                    continue;
                }
            };

            for response in self.handle_incoming_message(incoming).await {
                write_frame(writer, frame.framing, &response)
                    .await
                    .map_err(|e| format!("Failed to write MCP response: {e}"))?;
            }
        }

        tracing::info!("stdin closed, shutting down");
        Ok(())
    }

    async fn handle_incoming_message(&self, incoming: Value) -> Vec<Value> {
        let mut responses = Vec::new();

        if let Some(batch) = incoming.as_array() {
            if batch.is_empty() {
                responses.push(error_response(
                    Value::Null,
                    RpcError::invalid_request("Batch request must not be empty"),
                ));
                return responses;
            }
            for item in batch {
                if let Some(response) = self.handle_single_message(item.clone()).await {
                    responses.push(response);
                }
            }
            return responses;
        }

        if let Some(response) = self.handle_single_message(incoming).await {
            responses.push(response);
        }
        responses
    }

    async fn handle_single_message(&self, incoming: Value) -> Option<Value> {
        let Some(obj) = incoming.as_object() else {
            return Some(error_response(
                Value::Null,
                RpcError::invalid_request("Request must be a JSON object"),
            ));
        };

        if obj.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
            let id = obj.get("id").cloned().unwrap_or(Value::Null);
            return Some(error_response(
                id,
                RpcError::invalid_request("jsonrpc must be '2.0'"),
            ));
        }

        let Some(method) = obj.get("method").and_then(Value::as_str) else {
            // A client response; this server never sends requests of its own.
            return None;
        };

        let params = obj.get("params").cloned().unwrap_or(Value::Null);
        if let Some(id) = obj.get("id").cloned() {
            let result = self.handle_request(method, params).await;
            Some(match result {
                Ok(payload) => success_response(id, payload),
                Err(err) => error_response(id, err),
            })
        } else {
            tracing::debug!(method, "notification ignored");
            None
        }
    }

    async fn handle_request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(initialize_payload()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(tools_list_payload()),
            "tools/call" => self.handle_tools_call(params).await,
            _ => Err(RpcError::method_not_found(method)),
        }
    }

    /// Tool failures are results with `isError`, never JSON-RPC errors.
    async fn handle_tools_call(&self, params: Value) -> Result<Value, RpcError> {
        let params = params
            .as_object()
            .ok_or_else(|| RpcError::invalid_params("tools/call params must be an object"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| RpcError::invalid_params("tools/call requires string field 'name'"))?;

        let empty = Map::new();
        let arguments = match params.get("arguments") {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => &empty,
            Some(_) => {
                return Err(RpcError::invalid_params(
                    "tools/call field 'arguments' must be an object",
                ));
            }
        };

        let started = Instant::now();
        let outcome = tools::dispatch(&self.client, name, arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        Ok(match outcome {
            Ok(output) => {
                tracing::info!(tool = name, outcome = "ok", elapsed_ms, "tool call");
                success_envelope(output)
            }
            Err(err) => {
                tracing::warn!(
                    tool = name,
                    outcome = err.code(),
                    elapsed_ms,
                    error = %err,
                    "tool call"
                );
                error_envelope(&err)
            }
        })
    }
}

fn initialize_payload() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "capabilities": {
            "tools": {
                "listChanged": false
            }
        },
        "serverInfo": {
            "name": MCP_SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn tools_list_payload() -> Value {
    let tools: Vec<Value> = tool_catalog()
        .iter()
        .map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema,
            })
        })
        .collect();
    json!({ "tools": tools })
}

#[derive(Debug)]
struct RpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

impl RpcError {
    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
            data: None,
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(json!({ "method": method })),
        }
    }

    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
            data: None,
        }
    }
}

fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

fn error_response(id: Value, error: RpcError) -> Value {
    let mut payload = json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": error.code,
            "message": error.message
        }
    });
    if let Some(data) = error.data {
        payload["error"]["data"] = data;
    }
    payload
}

fn to_pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
