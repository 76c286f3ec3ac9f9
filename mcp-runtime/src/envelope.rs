use serde_json::{Value, json};

use crate::error::ToolError;

pub const ERROR_PREFIX: &str = "Error: ";

/// What a successful tool hands back before it is wrapped.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub message: String,
    pub data: Option<Value>,
}

impl ToolOutput {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

pub fn success_envelope(output: ToolOutput) -> Value {
    let mut content = vec![json!({ "type": "text", "text": output.message })];
    if let Some(data) = output.data {
        content.push(json!({ "type": "json", "json": data }));
    }
    json!({ "content": content })
}

/// A single text item; failures never carry structured data.
pub fn error_envelope(err: &ToolError) -> Value {
    json!({
        "isError": true,
        "content": [{ "type": "text", "text": format!("{ERROR_PREFIX}{err}") }]
    })
}
