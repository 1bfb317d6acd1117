//! Provider-neutral message model.
//!
//! A conversation is an ordered list of [`Turn`]s. The order is the literal
//! chat history replayed to the vendor on every call, so nothing here ever
//! reorders or deduplicates turns.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Argument mapping of a function call, in the order the vendor produced it
pub type ArgumentMap = IndexMap<String, Value>;

/// Conversation role, independent of any vendor vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Model,
    ToolResult,
}

/// A model-issued request to invoke a named tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: ArgumentMap,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, args: ArgumentMap) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Outcome of executing a function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResult {
    pub name: String,
    pub response: Value,
}

/// Payload carried by a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TurnPayload {
    Text(String),
    FunctionCall(FunctionCall),
    FunctionResult(FunctionResult),
    /// The vendor's own response object, replayed verbatim. The pipeline
    /// never inspects it; only the adapter that produced it can read it.
    VendorNative { provider: String, content: Value },
}

/// One role-tagged unit of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub payload: TurnPayload,
}

impl Turn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            payload: TurnPayload::Text(text.into()),
        }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            payload: TurnPayload::Text(text.into()),
        }
    }

    pub fn tool_result(name: impl Into<String>, response: Value) -> Self {
        Self {
            role: Role::ToolResult,
            payload: TurnPayload::FunctionResult(FunctionResult {
                name: name.into(),
                response,
            }),
        }
    }

    pub fn vendor_native(provider: impl Into<String>, content: Value) -> Self {
        Self {
            role: Role::Model,
            payload: TurnPayload::VendorNative {
                provider: provider.into(),
                content,
            },
        }
    }

    pub fn is_tool_result(&self) -> bool {
        self.role == Role::ToolResult
    }

    /// Plain text of the turn, if it is a text turn
    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            TurnPayload::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Abstract tool declaration as found in scenario files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// JSON-schema shaped parameter specification
    #[serde(default = "empty_parameters")]
    pub parameters: Value,
}

fn empty_parameters() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl ToolDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }
}

/// Token counts reported by the vendor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}
