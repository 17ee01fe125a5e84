//! Request types for the responses gateway

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of a streamed `POST /v1/responses` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsesRequest {
    /// Gateway model id, e.g. `openai@gpt-4.1-mini`
    pub model: String,
    /// Remote tool servers the model may call
    pub tools: Vec<McpTool>,
    /// System instructions for this call
    pub instructions: String,
    /// User input
    pub input: String,
    pub stream: bool,
    pub store: bool,
    /// Correlation id of the previous completed call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,
    /// Structured output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,
}

impl ResponsesRequest {
    /// Create a streamed, stored request
    pub fn new(
        model: impl Into<String>,
        instructions: impl Into<String>,
        input: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            tools: Vec::new(),
            instructions: instructions.into(),
            input: input.into(),
            stream: true,
            store: true,
            previous_response_id: None,
            text: None,
        }
    }

    /// Add a tool server
    pub fn with_tool(mut self, tool: McpTool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Resume from a previous response
    pub fn with_previous_response_id(mut self, id: Option<String>) -> Self {
        self.previous_response_id = id;
        self
    }

    /// Ask for output matching a JSON schema
    pub fn with_json_schema(mut self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.text = Some(TextConfig {
            format: TextFormat::JsonSchema {
                name: name.into(),
                schema,
            },
        });
        self
    }
}

/// An MCP tool server reachable by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpTool {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub server_label: String,
    pub server_url: String,
    pub allowed_tools: Vec<String>,
    /// Extra headers the gateway forwards to the tool server
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl McpTool {
    /// Create an MCP tool entry
    pub fn new(server_label: impl Into<String>, server_url: impl Into<String>) -> Self {
        Self {
            tool_type: "mcp".to_string(),
            server_label: server_label.into(),
            server_url: server_url.into(),
            allowed_tools: Vec::new(),
            headers: BTreeMap::new(),
        }
    }

    /// Allow one more tool on this server
    pub fn allow(mut self, tool: impl Into<String>) -> Self {
        self.allowed_tools.push(tool.into());
        self
    }

    /// Forward a header to the tool server
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Text output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextConfig {
    pub format: TextFormat,
}

/// Output format for text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextFormat {
    /// Plain text
    Text,
    /// Output constrained to a JSON schema
    JsonSchema {
        name: String,
        schema: serde_json::Value,
    },
}
