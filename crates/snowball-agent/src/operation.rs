//! Upstream operations: what each call sends and what it yields

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use snowball_ai::{McpTool, ResponsesRequest};

/// Name of the structured output format sent to the gateway
pub const SCENE_SCHEMA_NAME: &str = "response_schema";

/// The three upstream calls of a shopping journey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Product search
    Search,
    /// Scene generation for the selected product
    Scene,
    /// Payment lookup and order confirmation
    Payment,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Search => "search",
            OperationKind::Scene => "scene",
            OperationKind::Payment => "payment",
        }
    }
}

/// How the streamed text of a call is turned into a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contract {
    /// Deltas are shown live; the final text is the result.
    ///
    /// With `reconcile_done`, done text missing from the buffer is appended.
    FreeText {
        completed_stage: &'static str,
        reconcile_done: bool,
    },
    /// Deltas are hidden; the done text is a JSON scene payload
    Structured,
}

/// When the closing progress stage appears
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizePolicy {
    /// "Finalizing Response" on the first delta once this many tools finished
    AfterTools(usize),
    /// "Processing Response" when the done text arrives
    OnTextDone,
}

/// Everything needed to issue one kind of call
#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub kind: OperationKind,
    pub model: String,
    pub tools: Vec<McpTool>,
    pub instructions: String,
    pub contract: Contract,
    pub finalize: FinalizePolicy,
    /// Chat text shown when the call fails
    pub failure_message: String,
    /// Bearer key for the gateway
    pub api_key: Option<String>,
    /// Whether the previous correlation id is sent along
    pub threads_context: bool,
    /// JSON schema requested for structured output
    pub schema: Option<Value>,
}

impl OperationSpec {
    /// Product search through the shop's catalog server
    pub fn search() -> Self {
        Self {
            kind: OperationKind::Search,
            model: "togetherai@meta-llama/Llama-4-Maverick-17B-128E-Instruct-FP8".to_string(),
            tools: vec![
                McpTool::new("shopify", "https://axzx8j-61.myshopify.com/api/mcp")
                    .allow("search_shop_catalog"),
            ],
            instructions: "Use search_shop_catalog to search the product and then bring complete \
                details of the product including all available images. Do not mention names of \
                tools in the response"
                .to_string(),
            contract: Contract::FreeText {
                completed_stage: "search",
                reconcile_done: false,
            },
            finalize: FinalizePolicy::AfterTools(1),
            failure_message: "Failed to search products. Please try again.".to_string(),
            api_key: None,
            threads_context: true,
            schema: None,
        }
    }

    /// Scene generation through the image server
    pub fn scene() -> Self {
        Self {
            kind: OperationKind::Scene,
            model: "openai@gpt-4.1-mini".to_string(),
            tools: vec![
                McpTool::new("img_mcp", "http://localhost:8086/mcp")
                    .allow("image_to_base64")
                    .allow("img_scene_generator"),
            ],
            instructions: "Use tool image_to_base64 to generate base64encoded String from \
                provided URL of image and then use tool img_scene_generator to generate the \
                image for the scene with input prompt and encodedFilePath returned by the tool \
                image_to_base64 If the image is generated then return the completedStage=select \
                else not_achieved."
                .to_string(),
            contract: Contract::Structured,
            finalize: FinalizePolicy::OnTextDone,
            failure_message: "Failed to generate scene. Please try again.".to_string(),
            api_key: None,
            threads_context: true,
            schema: Some(scene_schema()),
        }
    }

    /// Payment lookup through the payment provider's server
    pub fn payment() -> Self {
        Self {
            kind: OperationKind::Payment,
            model: "claude@claude-sonnet-4-20250514".to_string(),
            tools: vec![
                McpTool::new("razorpay", "https://mcp.razorpay.com/sse")
                    .allow("fetch_payment")
                    .allow("fetch_order"),
            ],
            instructions: "Use fetch_payment tool by passing payment id provided by the user, \
                get the order id from payment details response then fetch order details using \
                fetch_order tool return order details in readable format"
                .to_string(),
            contract: Contract::FreeText {
                completed_stage: "confirm",
                reconcile_done: true,
            },
            finalize: FinalizePolicy::AfterTools(2),
            failure_message: "Failed to confirm payment. Please try again.".to_string(),
            api_key: None,
            threads_context: false,
            schema: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty());
        self
    }

    /// Forward a bearer key to every tool server of this operation
    pub fn with_tool_key(mut self, key: &str) -> Self {
        self.tools = self
            .tools
            .into_iter()
            .map(|tool| tool.header("Authorization", format!("Bearer {}", key)))
            .collect();
        self
    }

    /// Build the gateway request for one call
    pub fn build_request(&self, input: &str, previous_response_id: Option<&str>) -> ResponsesRequest {
        let mut request = ResponsesRequest::new(&self.model, &self.instructions, input)
            .with_previous_response_id(
                previous_response_id
                    .filter(|_| self.threads_context)
                    .map(str::to_string),
            );
        for tool in &self.tools {
            request = request.with_tool(tool.clone());
        }
        if let Some(schema) = &self.schema {
            request = request.with_json_schema(SCENE_SCHEMA_NAME, schema.clone());
        }
        request
    }
}

/// The set of operations a router can issue
#[derive(Debug, Clone)]
pub struct Operations {
    pub search: OperationSpec,
    pub scene: OperationSpec,
    pub payment: OperationSpec,
}

impl Default for Operations {
    fn default() -> Self {
        Self {
            search: OperationSpec::search(),
            scene: OperationSpec::scene(),
            payment: OperationSpec::payment(),
        }
    }
}

impl Operations {
    pub fn get(&self, kind: OperationKind) -> &OperationSpec {
        match kind {
            OperationKind::Search => &self.search,
            OperationKind::Scene => &self.scene,
            OperationKind::Payment => &self.payment,
        }
    }
}

/// JSON schema of the scene payload
pub fn scene_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "situationDescription": {
                "type": "string",
                "description": "description of situation for which image created."
            },
            "image_url": {
                "type": "string",
                "description": "url of the image"
            },
            "completedStage": {
                "type": "string",
                "description": "the stage completed, should be the same as provided in the system instructions"
            }
        },
        "required": ["situationDescription", "image_url", "completedStage"],
        "additionalProperties": false
    })
}

/// Structured result of a scene call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenePayload {
    #[serde(rename = "situationDescription", alias = "description")]
    pub situation_description: String,
    pub image_url: String,
    #[serde(rename = "completedStage")]
    pub completed_stage: String,
}

/// Terminal result of a successful call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Search {
        details: String,
        image_url: String,
        completed_stage: String,
    },
    Scene {
        situation_description: String,
        image_url: String,
        completed_stage: String,
    },
    Payment {
        order_details: String,
        completed_stage: String,
    },
}

impl OperationResult {
    /// Stage the result declares as reached
    pub fn completed_stage(&self) -> &str {
        match self {
            OperationResult::Search { completed_stage, .. }
            | OperationResult::Scene { completed_stage, .. }
            | OperationResult::Payment { completed_stage, .. } => completed_stage,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            OperationResult::Search { image_url, .. } | OperationResult::Scene { image_url, .. } => {
                Some(image_url)
            }
            OperationResult::Payment { .. } => None,
        }
    }

    /// Text to show in the chat for this result
    pub fn text(&self) -> &str {
        match self {
            OperationResult::Search { details, .. } => details,
            OperationResult::Scene {
                situation_description,
                ..
            } => situation_description,
            OperationResult::Payment { order_details, .. } => order_details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_threads_context() {
        let request = OperationSpec::search().build_request("printer", Some("resp_1"));
        assert_eq!(request.previous_response_id.as_deref(), Some("resp_1"));
        assert_eq!(request.tools[0].allowed_tools, vec!["search_shop_catalog"]);
        assert!(request.text.is_none());
        assert!(request.stream && request.store);
    }

    #[test]
    fn test_payment_request_starts_fresh() {
        let request = OperationSpec::payment()
            .with_tool_key("rzp_key")
            .build_request("pay_123", Some("resp_2"));
        assert_eq!(request.previous_response_id, None);
        assert_eq!(
            request.tools[0].headers.get("Authorization").map(String::as_str),
            Some("Bearer rzp_key")
        );
    }

    #[test]
    fn test_scene_request_has_schema() {
        let request = OperationSpec::scene().build_request("on a desk", None);
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["text"]["format"]["type"], "json_schema");
        assert_eq!(value["text"]["format"]["name"], SCENE_SCHEMA_NAME);
        assert_eq!(
            value["text"]["format"]["schema"]["required"],
            json!(["situationDescription", "image_url", "completedStage"])
        );
    }

    #[test]
    fn test_scene_payload_accepts_description_alias() {
        let payload: ScenePayload = serde_json::from_str(
            r#"{"description":"A cozy office","image_url":"https://x/y.png","completedStage":"select"}"#,
        )
        .unwrap();
        assert_eq!(payload.situation_description, "A cozy office");
        assert_eq!(payload.completed_stage, "select");
    }

    #[test]
    fn test_empty_api_key_is_none() {
        let spec = OperationSpec::search().with_api_key(Some(String::new()));
        assert_eq!(spec.api_key, None);
    }

    #[test]
    fn test_result_accessors() {
        let result = OperationResult::Payment {
            order_details: "Order #1".into(),
            completed_stage: "confirm".into(),
        };
        assert_eq!(result.completed_stage(), "confirm");
        assert_eq!(result.image_url(), None);
        assert_eq!(result.text(), "Order #1");
    }
}
